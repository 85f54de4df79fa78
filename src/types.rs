use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque ID types for type safety
pub type RoomCode = String;
pub type PlayerId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    Answering,
    Revealing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
    pub has_answered: bool,
    /// None until the player answers (or the round times out on them)
    pub is_correct: Option<bool>,
}

impl Player {
    pub fn new(name: &str, is_host: bool) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name: name.to_string(),
            score: 0,
            is_host,
            has_answered: false,
            is_correct: None,
        }
    }
}

/// The shared room document. One of these per 6-digit code; every client
/// reads and writes the same copy through the store. A room that has been
/// deleted simply stops existing — there is no Closed phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: RoomCode,
    pub phase: Phase,
    pub round: u32,
    pub question: String,
    pub answer: i64,
    /// Stamped by the store at write time, never by a client clock
    pub round_started_at: Option<DateTime<Utc>>,
    /// Insertion order is join order; host migration depends on it
    pub players: Vec<Player>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new_lobby(code: RoomCode) -> Self {
        Self {
            code,
            phase: Phase::Lobby,
            round: 0,
            question: String::new(),
            answer: 0,
            round_started_at: None,
            players: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    /// Time since the current round started, saturating at zero if the
    /// local clock is behind the store's stamp.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        let started = self.round_started_at?;
        Some((now - started).to_std().unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub round_duration: Duration,
    pub reveal_delay: Duration,
    /// How often the host-side watcher re-checks the round clock
    pub tick_interval: Duration,
    pub max_points: u32,
    pub min_points: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_duration: Duration::from_secs(30),
            reveal_delay: Duration::from_secs(3),
            tick_interval: Duration::from_secs(1),
            max_points: 100,
            min_points: 5,
        }
    }
}

impl GameConfig {
    /// Load overrides from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_u64("MATHDASH_ROUND_SECONDS") {
            config.round_duration = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("MATHDASH_REVEAL_SECONDS") {
            config.reveal_delay = Duration::from_secs(secs);
        }
        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_room_documents_use_camel_case_fields() {
        let mut room = Room::new_lobby("482913".to_string());
        room.players.push(Player::new("Ava", true));

        let json = serde_json::to_value(&room).unwrap();
        assert!(json.get("roundStartedAt").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["phase"], "LOBBY");

        let player = &json["players"][0];
        assert_eq!(player["isHost"], true);
        assert_eq!(player["hasAnswered"], false);
        assert_eq!(player["isCorrect"], serde_json::Value::Null);
    }

    #[test]
    fn test_elapsed_saturates_on_clock_skew() {
        let mut room = Room::new_lobby("000001".to_string());
        let now = Utc::now();
        room.round_started_at = Some(now + chrono::Duration::seconds(5));
        assert_eq!(room.elapsed(now), Some(Duration::ZERO));

        room.round_started_at = Some(now - chrono::Duration::seconds(5));
        assert_eq!(room.elapsed(now), Some(Duration::from_secs(5)));
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var("MATHDASH_ROUND_SECONDS", "12");
        std::env::set_var("MATHDASH_REVEAL_SECONDS", "1");
        let config = GameConfig::from_env();
        assert_eq!(config.round_duration, Duration::from_secs(12));
        assert_eq!(config.reveal_delay, Duration::from_secs(1));
        std::env::remove_var("MATHDASH_ROUND_SECONDS");
        std::env::remove_var("MATHDASH_REVEAL_SECONDS");
    }

    #[test]
    #[serial]
    fn test_config_ignores_garbage_env() {
        std::env::set_var("MATHDASH_ROUND_SECONDS", "soon");
        let config = GameConfig::from_env();
        assert_eq!(config.round_duration, Duration::from_secs(30));
        std::env::remove_var("MATHDASH_ROUND_SECONDS");
    }
}
