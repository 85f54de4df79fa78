use super::{RoomEvent, RoomPatch, RoomStore, RoomSubscription};
use crate::error::{Error, Result};
use crate::types::{Player, Room, RoomCode};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

/// In-process reference store. Keeps every room document behind one lock
/// and fans changes out over a per-room broadcast channel, so it gives
/// subscribers the same "latest document wins" view a hosted document
/// store would.
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<RoomCode, RoomSlot>>,
}

struct RoomSlot {
    room: Room,
    changes: broadcast::Sender<RoomEvent>,
}

impl RoomSlot {
    fn publish(&self) {
        // No receivers connected is fine
        let _ = self.changes.send(RoomEvent::Updated(self.room.clone()));
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create(&self, room: Room) -> Result<()> {
        let mut rooms = self.rooms.write().await;
        let (tx, _rx) = broadcast::channel(100);
        let slot = RoomSlot {
            room,
            changes: tx,
        };
        slot.publish();
        rooms.insert(slot.room.code.clone(), slot);
        Ok(())
    }

    async fn get(&self, code: &str) -> Result<Room> {
        self.rooms
            .read()
            .await
            .get(code)
            .map(|slot| slot.room.clone())
            .ok_or(Error::NotFound)
    }

    async fn update(&self, code: &str, patch: RoomPatch) -> Result<Room> {
        let mut rooms = self.rooms.write().await;
        let slot = rooms.get_mut(code).ok_or(Error::NotFound)?;

        if let Some(phase) = patch.phase {
            slot.room.phase = phase;
        }
        if let Some(round) = patch.round {
            slot.room.round = round;
        }
        if let Some(question) = patch.question {
            slot.room.question = question;
        }
        if let Some(answer) = patch.answer {
            slot.room.answer = answer;
        }
        if let Some(players) = patch.players {
            slot.room.players = players;
        }
        if patch.stamp_round_start {
            // The store's clock, not the writer's
            slot.room.round_started_at = Some(Utc::now());
        }

        slot.publish();
        Ok(slot.room.clone())
    }

    async fn append_player(&self, code: &str, player: Player) -> Result<Room> {
        let mut rooms = self.rooms.write().await;
        let slot = rooms.get_mut(code).ok_or(Error::NotFound)?;
        slot.room.players.push(player);
        slot.publish();
        Ok(slot.room.clone())
    }

    async fn delete(&self, code: &str) -> Result<()> {
        let mut rooms = self.rooms.write().await;
        if let Some(slot) = rooms.remove(code) {
            let _ = slot.changes.send(RoomEvent::Deleted);
        }
        Ok(())
    }

    async fn subscribe(&self, code: &str) -> Result<RoomSubscription> {
        let rooms = self.rooms.read().await;
        let slot = rooms.get(code).ok_or(Error::NotFound)?;
        Ok(RoomSubscription::new(
            RoomEvent::Updated(slot.room.clone()),
            slot.changes.subscribe(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;

    fn room(code: &str) -> Room {
        Room::new_lobby(code.to_string())
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_document_immediately() {
        let store = MemoryStore::new();
        store.create(room("111111")).await.unwrap();

        let mut sub = store.subscribe("111111").await.unwrap();
        match sub.next().await {
            Some(RoomEvent::Updated(r)) => assert_eq!(r.code, "111111"),
            other => panic!("expected initial Updated event, got {:?}", other.is_some()),
        }
    }

    #[tokio::test]
    async fn test_update_merges_and_stamps_round_start() {
        let store = MemoryStore::new();
        store.create(room("222222")).await.unwrap();

        let before = Utc::now();
        let updated = store
            .update(
                "222222",
                RoomPatch {
                    phase: Some(Phase::Answering),
                    round: Some(1),
                    question: Some("2 + 2".to_string()),
                    answer: Some(4),
                    stamp_round_start: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.phase, Phase::Answering);
        assert_eq!(updated.round, 1);
        assert_eq!(updated.answer, 4);
        let stamped = updated.round_started_at.expect("stamp missing");
        assert!(stamped >= before);
        // Untouched fields survive the merge
        assert!(updated.players.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes_and_deletion() {
        let store = MemoryStore::new();
        store.create(room("333333")).await.unwrap();
        let mut sub = store.subscribe("333333").await.unwrap();
        sub.next().await.unwrap(); // initial

        store
            .append_player("333333", Player::new("Ava", true))
            .await
            .unwrap();
        match sub.next().await {
            Some(RoomEvent::Updated(r)) => assert_eq!(r.players.len(), 1),
            _ => panic!("expected Updated after append"),
        }

        store.delete("333333").await.unwrap();
        assert!(matches!(sub.next().await, Some(RoomEvent::Deleted)));
    }

    #[tokio::test]
    async fn test_operations_on_missing_room_fail_with_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.get("999999").await, Err(Error::NotFound)));
        assert!(matches!(
            store.update("999999", RoomPatch::default()).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            store.append_player("999999", Player::new("Ava", false)).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(store.subscribe("999999").await, Err(Error::NotFound)));
        // Deleting a missing key is a no-op, not an error
        assert!(store.delete("999999").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let store = MemoryStore::new();
        store.create(room("444444")).await.unwrap();
        store.delete("444444").await.unwrap();
        assert!(matches!(store.get("444444").await, Err(Error::NotFound)));
    }
}
