//! One `GameSession` per connected client. The session subscribes to its
//! room document, mirrors the latest version locally, and issues writes
//! in response to user action. All coordination between clients happens
//! through the observed document; sessions never talk to each other.

mod answer;
mod lifecycle;
mod rounds;
mod view;

pub use view::{RoomView, ScoreRow};

use crate::error::Result;
use crate::store::{RoomEvent, RoomStore};
use crate::types::{GameConfig, PlayerId, Room, RoomCode};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Shared guts of a session, reachable from its background tasks.
pub(crate) struct SessionCore {
    pub(crate) store: Arc<dyn RoomStore>,
    pub(crate) config: GameConfig,
    pub(crate) code: RoomCode,
    pub(crate) player_id: PlayerId,
    /// Latest synchronized room document; `None` once the room is gone
    pub(crate) latest: RwLock<Option<Room>>,
}

impl SessionCore {
    pub(crate) async fn snapshot(&self) -> Option<Room> {
        self.latest.read().await.clone()
    }

    /// Whether the locally-cached view says we are the host. Host-only
    /// transitions check this by convention; two clients may briefly both
    /// believe it during migration, which the phase guards absorb.
    pub(crate) async fn is_host(&self) -> bool {
        match self.snapshot().await {
            Some(room) => room
                .player(&self.player_id)
                .map(|p| p.is_host)
                .unwrap_or(false),
            None => false,
        }
    }
}

/// A client's handle on one room. Obtained via [`GameSession::create`] or
/// [`GameSession::join`]; dropped or [`GameSession::leave`]-d when the
/// client navigates away, which also cancels its local timers.
pub struct GameSession {
    core: Arc<SessionCore>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl GameSession {
    pub fn code(&self) -> &str {
        &self.core.code
    }

    pub fn player_id(&self) -> &str {
        &self.core.player_id
    }

    /// Wire up the subscription pump and (potential) host duties after
    /// the player is in the room.
    pub(crate) async fn attach(
        store: Arc<dyn RoomStore>,
        config: GameConfig,
        code: RoomCode,
        player_id: PlayerId,
    ) -> Result<Self> {
        let subscription = store.subscribe(&code).await?;
        let initial = store.get(&code).await?;

        let core = Arc::new(SessionCore {
            store,
            config,
            code,
            player_id,
            latest: RwLock::new(Some(initial)),
        });

        let pump = spawn_sync_pump(core.clone(), subscription);
        let watcher = rounds::spawn_round_watcher(core.clone());

        Ok(Self {
            core,
            tasks: Mutex::new(vec![pump, watcher]),
        })
    }

    fn cancel_tasks(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.cancel_tasks();
    }
}

/// Mirror every published document version into `core.latest`. Collapses
/// the local view to "room closed" on deletion and stops.
fn spawn_sync_pump(
    core: Arc<SessionCore>,
    mut subscription: crate::store::RoomSubscription,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            match event {
                RoomEvent::Updated(room) => {
                    tracing::debug!(
                        code = %core.code,
                        phase = ?room.phase,
                        round = room.round,
                        "room document updated"
                    );
                    *core.latest.write().await = Some(room);
                }
                RoomEvent::Deleted => {
                    tracing::info!(code = %core.code, "room closed");
                    *core.latest.write().await = None;
                    return;
                }
            }
        }
        // Channel gone without an explicit Deleted; treat it the same way
        *core.latest.write().await = None;
    })
}
