//! The shared room store interface. The core never owns the store; it
//! only issues reads, conditional writes and subscriptions against it.
//! Convergence comes from every client reacting identically to the same
//! published document, not from any coordination between clients.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::types::{Phase, Player, Room};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// A merge-style partial update of a room document. `None` fields are
/// left untouched. `stamp_round_start` asks the store to assign
/// `round_started_at` from its own clock at write time, so round timing
/// is immune to client clock skew.
#[derive(Debug, Clone, Default)]
pub struct RoomPatch {
    pub phase: Option<Phase>,
    pub round: Option<u32>,
    pub question: Option<String>,
    pub answer: Option<i64>,
    pub players: Option<Vec<Player>>,
    pub stamp_round_start: bool,
}

#[derive(Debug, Clone)]
pub enum RoomEvent {
    Updated(Room),
    Deleted,
}

/// A live feed of one room's document. Delivers the current document
/// once immediately, then every subsequent change. Dropping it stops
/// delivery. A lagged subscriber skips straight to the newest event;
/// intermediate versions are not replayed (at-least-once, latest-wins).
pub struct RoomSubscription {
    initial: Option<RoomEvent>,
    rx: broadcast::Receiver<RoomEvent>,
}

impl RoomSubscription {
    /// Build a subscription from the document as of subscribe time plus
    /// a feed of later changes. Store drivers call this.
    pub fn new(initial: RoomEvent, rx: broadcast::Receiver<RoomEvent>) -> Self {
        Self {
            initial: Some(initial),
            rx,
        }
    }

    /// Next event, or `None` once the room's channel is gone for good.
    pub async fn next(&mut self) -> Option<RoomEvent> {
        if let Some(event) = self.initial.take() {
            return Some(event);
        }
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Subscription lagged, skipped {} events", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// The document store the room protocol runs on. Implementations are
/// external; [`MemoryStore`] is the in-process reference used by tests
/// and the demo binary.
#[async_trait]
pub trait RoomStore: Send + Sync + 'static {
    /// Write a fresh room document. Overwriting an existing key is
    /// tolerated; 6-digit codes make collisions unlikely enough.
    async fn create(&self, room: Room) -> Result<()>;

    async fn get(&self, code: &str) -> Result<Room>;

    /// Merge `patch` into the existing document. `NotFound` if the key
    /// no longer exists. Returns the document as written.
    async fn update(&self, code: &str, patch: RoomPatch) -> Result<Room>;

    /// Atomic append to the player list; concurrent joins never clobber
    /// each other.
    async fn append_player(&self, code: &str, player: Player) -> Result<Room>;

    async fn delete(&self, code: &str) -> Result<()>;

    async fn subscribe(&self, code: &str) -> Result<RoomSubscription>;
}
