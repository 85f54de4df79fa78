//! Read-side projection of the latest synchronized document. Purely
//! derived; holds no state of its own and issues no writes. The
//! countdown is recomputed against the local clock on every call so the
//! UI can tick smoothly between sync events.

use super::GameSession;
use crate::types::{GameConfig, Phase, PlayerId, Room};
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
    pub has_answered: bool,
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct RoomView {
    pub code: String,
    pub phase: Phase,
    pub round: u32,
    pub question: String,
    pub is_host: bool,
    pub time_remaining: Duration,
    /// Sorted by score descending; ties keep join order
    pub scoreboard: Vec<ScoreRow>,
}

impl GameSession {
    /// Project the current room state for this client, or `None` once
    /// the room is closed.
    pub async fn current_view(&self) -> Option<RoomView> {
        let room = self.core.snapshot().await?;
        Some(project(&room, &self.core.player_id, &self.core.config, Utc::now()))
    }
}

pub(crate) fn project(
    room: &Room,
    player_id: &str,
    config: &GameConfig,
    now: DateTime<Utc>,
) -> RoomView {
    let is_host = room.player(player_id).map(|p| p.is_host).unwrap_or(false);

    let time_remaining = match room.phase {
        Phase::Answering => room
            .elapsed(now)
            .map(|elapsed| config.round_duration.saturating_sub(elapsed))
            .unwrap_or(Duration::ZERO),
        _ => Duration::ZERO,
    };

    let mut scoreboard: Vec<ScoreRow> = room
        .players
        .iter()
        .map(|p| ScoreRow {
            id: p.id.clone(),
            name: p.name.clone(),
            score: p.score,
            is_host: p.is_host,
            has_answered: p.has_answered,
            is_correct: p.is_correct,
        })
        .collect();
    // Stable sort keeps join order between equal scores
    scoreboard.sort_by(|a, b| b.score.cmp(&a.score));

    RoomView {
        code: room.code.clone(),
        phase: room.phase,
        round: room.round,
        question: room.question.clone(),
        is_host,
        time_remaining,
        scoreboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Player;

    fn room_with_players(names_scores: &[(&str, u32)]) -> Room {
        let mut room = Room::new_lobby("482913".to_string());
        for (i, (name, score)) in names_scores.iter().enumerate() {
            let mut p = Player::new(name, i == 0);
            p.score = *score;
            room.players.push(p);
        }
        room
    }

    #[test]
    fn test_scoreboard_sorts_by_score_with_join_order_ties() {
        let room = room_with_players(&[("Ava", 40), ("Ben", 90), ("Cleo", 40)]);
        let view = project(&room, &room.players[0].id, &GameConfig::default(), Utc::now());

        let order: Vec<&str> = view.scoreboard.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["Ben", "Ava", "Cleo"]);
    }

    #[test]
    fn test_is_host_reflects_this_client_only() {
        let room = room_with_players(&[("Ava", 0), ("Ben", 0)]);
        let cfg = GameConfig::default();
        assert!(project(&room, &room.players[0].id, &cfg, Utc::now()).is_host);
        assert!(!project(&room, &room.players[1].id, &cfg, Utc::now()).is_host);
        // A vanished player projects as non-host rather than panicking
        assert!(!project(&room, "missing", &cfg, Utc::now()).is_host);
    }

    #[test]
    fn test_time_remaining_counts_down_and_clamps() {
        let mut room = room_with_players(&[("Ava", 0)]);
        room.phase = Phase::Answering;
        let now = Utc::now();
        room.round_started_at = Some(now - chrono::Duration::seconds(10));

        let cfg = GameConfig::default();
        let view = project(&room, &room.players[0].id, &cfg, now);
        assert_eq!(view.time_remaining, Duration::from_secs(20));

        room.round_started_at = Some(now - chrono::Duration::seconds(45));
        let view = project(&room, &room.players[0].id, &cfg, now);
        assert_eq!(view.time_remaining, Duration::ZERO);
    }

    #[test]
    fn test_lobby_has_no_countdown() {
        let room = room_with_players(&[("Ava", 0)]);
        let view = project(&room, &room.players[0].id, &GameConfig::default(), Utc::now());
        assert_eq!(view.time_remaining, Duration::ZERO);
        assert_eq!(view.round, 0);
    }
}
