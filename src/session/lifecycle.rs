use super::{GameSession, SessionCore};
use crate::error::{Error, Result};
use crate::store::{RoomPatch, RoomStore};
use crate::types::{GameConfig, Player, Room, RoomCode};
use rand::Rng;
use std::sync::Arc;

/// Room codes are exactly six ASCII digits. Collisions against live
/// rooms are not checked; rooms are short-lived and the space is large
/// relative to the number of concurrent rooms.
fn generate_room_code() -> RoomCode {
    format!("{:06}", rand::rng().random_range(0..1_000_000u32))
}

impl GameSession {
    /// Create a fresh lobby and join it as its first player, who becomes
    /// the initial host.
    pub async fn create(
        store: Arc<dyn RoomStore>,
        config: GameConfig,
        name: &str,
    ) -> Result<GameSession> {
        let code = generate_room_code();
        store.create(Room::new_lobby(code.clone())).await?;

        let player = Player::new(name, true);
        let player_id = player.id.clone();
        store.append_player(&code, player).await?;

        tracing::info!(code = %code, name = %name, "created room");
        Self::attach(store, config, code, player_id).await
    }

    /// Join an existing room by code. Display names are unique within a
    /// room, compared case-insensitively at join time only.
    pub async fn join(
        store: Arc<dyn RoomStore>,
        config: GameConfig,
        code: &str,
        name: &str,
    ) -> Result<GameSession> {
        let room = store.get(code).await?;
        let wanted = name.to_lowercase();
        if room.players.iter().any(|p| p.name.to_lowercase() == wanted) {
            return Err(Error::NameTaken(name.to_string()));
        }

        let player = Player::new(name, false);
        let player_id = player.id.clone();
        store.append_player(code, player).await?;

        tracing::info!(code = %code, name = %name, "joined room");
        Self::attach(store, config, code.to_string(), player_id).await
    }

    /// Leave the room and cancel this client's timers. Other clients'
    /// timers keep running; they learn about the departure from the store.
    pub async fn leave(&self) -> Result<()> {
        let result = self.core.leave_room().await;
        self.cancel_tasks();
        *self.core.latest.write().await = None;
        result
    }
}

impl SessionCore {
    pub(crate) async fn leave_room(&self) -> Result<()> {
        // Re-check existence right before writing; the room may already
        // have been closed under us.
        let room = match self.store.get(&self.code).await {
            Ok(room) => room,
            Err(Error::NotFound) => return Ok(()),
            Err(e) => return Err(e),
        };

        let was_host = room
            .player(&self.player_id)
            .map(|p| p.is_host)
            .unwrap_or(false);

        let mut players = room.players;
        players.retain(|p| p.id != self.player_id);

        if players.is_empty() {
            self.store.delete(&self.code).await?;
            tracing::info!(code = %self.code, "last player left, room deleted");
            return Ok(());
        }

        if was_host {
            for p in players.iter_mut() {
                p.is_host = false;
            }
            // First remaining player in join order inherits the room
            players[0].is_host = true;
            tracing::info!(
                code = %self.code,
                new_host = %players[0].name,
                "host left, promoted next player"
            );
        }

        self.store
            .update(
                &self.code,
                RoomPatch {
                    players: Some(players),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_codes_are_six_ascii_digits() {
        for _ in 0..1_000 {
            let code = generate_room_code();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()), "bad code {code}");
        }
    }
}
