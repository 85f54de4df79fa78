// Public API for integration tests and the demo binary

pub mod equation;
pub mod error;
pub mod session;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use session::{GameSession, RoomView, ScoreRow};
