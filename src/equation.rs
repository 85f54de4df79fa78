use rand::Rng;
use std::fmt;

/// Operand range for addition and subtraction
const ADDITIVE_MAX: i64 = 50;
/// Smaller range for multiplication and division to keep displayed numbers sane
const MULTIPLICATIVE_MAX: i64 = 12;
/// Defensive retry bound; the constructive generation below should never need it
const MAX_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn symbol(&self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '×',
            Op::Div => '÷',
        }
    }
}

/// A solvable integer arithmetic problem. The displayed question is
/// `lhs <op> rhs`; `answer` is its unique non-negative integer solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equation {
    pub lhs: i64,
    pub rhs: i64,
    pub op: Op,
    pub answer: i64,
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.symbol(), self.rhs)
    }
}

impl Equation {
    fn is_valid(&self) -> bool {
        if self.answer < 0 || self.rhs <= 0 || self.lhs <= 0 {
            return false;
        }
        match self.op {
            Op::Add => self.lhs + self.rhs == self.answer,
            Op::Sub => self.lhs - self.rhs == self.answer,
            Op::Mul => self.lhs * self.rhs == self.answer,
            Op::Div => self.lhs % self.rhs == 0 && self.lhs / self.rhs == self.answer,
        }
    }
}

/// Generate a solvable equation. Subtraction operands are ordered so the
/// result is non-negative, and division is exact by construction (the
/// dividend is derived from the product of answer and divisor). Fully
/// deterministic for a seeded rng.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Equation {
    for _ in 0..MAX_ATTEMPTS {
        let equation = draw(rng);
        if equation.is_valid() {
            return equation;
        }
    }

    // Should be unreachable; hand out something trivial rather than fail.
    tracing::warn!("Equation generation exhausted {} attempts", MAX_ATTEMPTS);
    Equation {
        lhs: 1,
        rhs: 1,
        op: Op::Add,
        answer: 2,
    }
}

fn draw<R: Rng + ?Sized>(rng: &mut R) -> Equation {
    match rng.random_range(0..4) {
        0 => {
            let lhs = rng.random_range(1..=ADDITIVE_MAX);
            let rhs = rng.random_range(1..=ADDITIVE_MAX);
            Equation {
                lhs,
                rhs,
                op: Op::Add,
                answer: lhs + rhs,
            }
        }
        1 => {
            let a = rng.random_range(1..=ADDITIVE_MAX);
            let b = rng.random_range(1..=ADDITIVE_MAX);
            // Larger operand first so the result stays non-negative
            let (lhs, rhs) = (a.max(b), a.min(b));
            Equation {
                lhs,
                rhs,
                op: Op::Sub,
                answer: lhs - rhs,
            }
        }
        2 => {
            let lhs = rng.random_range(1..=MULTIPLICATIVE_MAX);
            let rhs = rng.random_range(1..=MULTIPLICATIVE_MAX);
            Equation {
                lhs,
                rhs,
                op: Op::Mul,
                answer: lhs * rhs,
            }
        }
        _ => {
            // Pick the answer and divisor, derive the dividend, so the
            // division is exact without any search.
            let answer = rng.random_range(1..=MULTIPLICATIVE_MAX);
            let rhs = rng.random_range(1..=MULTIPLICATIVE_MAX);
            Equation {
                lhs: answer * rhs,
                rhs,
                op: Op::Div,
                answer,
            }
        }
    }
}
