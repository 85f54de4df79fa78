//! Race-safe, idempotent answer submission. Submitting is a one-shot
//! action per player per round; anything that would make it a second
//! shot is silently ignored rather than turned into an error. The player
//! list write is a read-modify-write of the whole list, which leaves a
//! documented lost-update window under truly simultaneous submissions.

use super::{GameSession, SessionCore};
use crate::error::{Error, Result};
use crate::store::RoomPatch;
use crate::types::{GameConfig, Phase};
use chrono::Utc;
use std::time::Duration;

impl GameSession {
    /// Submit this client's answer for the current round.
    pub async fn submit_answer(&self, raw: &str) -> Result<()> {
        self.core.submit_answer(raw).await
    }
}

impl SessionCore {
    pub(crate) async fn submit_answer(&self, raw: &str) -> Result<()> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidAnswer(raw.to_string()))?;

        let room = self.store.get(&self.code).await?;
        if room.phase != Phase::Answering {
            return Ok(());
        }
        let Some(elapsed) = room.elapsed(Utc::now()) else {
            return Ok(());
        };
        if elapsed >= self.config.round_duration {
            // Round is over; the host's watcher just hasn't flipped the
            // phase yet.
            return Ok(());
        }
        let me = room.player(&self.player_id).ok_or(Error::NotFound)?;
        if me.has_answered {
            return Ok(());
        }

        let is_correct = value == room.answer;
        let delta = if is_correct {
            points_for(elapsed, &self.config)
        } else {
            0
        };

        let players = room
            .players
            .iter()
            .cloned()
            .map(|mut p| {
                if p.id == self.player_id {
                    p.score += delta;
                    p.has_answered = true;
                    p.is_correct = Some(is_correct);
                }
                p
            })
            .collect();

        self.store
            .update(
                &self.code,
                RoomPatch {
                    players: Some(players),
                    ..Default::default()
                },
            )
            .await?;
        tracing::debug!(
            code = %self.code,
            correct = is_correct,
            points = delta,
            "answer submitted"
        );
        Ok(())
    }
}

/// Points for a correct answer, decaying linearly over the round window
/// as measured from the authoritative round start. Never below the
/// floor: even a last-instant correct answer is worth something.
fn points_for(elapsed: Duration, config: &GameConfig) -> u32 {
    let total = config.round_duration.as_secs_f64();
    let remaining = (total - elapsed.as_secs_f64()).clamp(0.0, total);
    let scaled = (config.max_points as f64 * remaining / total).round() as u32;
    scaled.max(config.min_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn test_points_decay_with_elapsed_time() {
        let cfg = config();
        let early = points_for(Duration::from_secs(2), &cfg);
        let mid = points_for(Duration::from_secs(15), &cfg);
        let late = points_for(Duration::from_secs(28), &cfg);
        assert!(early > mid);
        assert!(mid > late);
    }

    #[test]
    fn test_instant_answer_earns_max_points() {
        let cfg = config();
        assert_eq!(points_for(Duration::ZERO, &cfg), cfg.max_points);
    }

    #[test]
    fn test_last_instant_answer_still_earns_the_floor() {
        let cfg = config();
        assert_eq!(points_for(cfg.round_duration, &cfg), cfg.min_points);
        // Even slightly past the nominal end (clock fuzz) the floor holds
        assert_eq!(
            points_for(cfg.round_duration + Duration::from_millis(200), &cfg),
            cfg.min_points
        );
    }
}
