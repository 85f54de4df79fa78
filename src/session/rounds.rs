//! The round state machine: Lobby → Answering → Revealing → Answering…
//! Transitions are driven exclusively by the client whose cached view
//! says it is host; everyone else observes them through the store. There
//! is no way back to Lobby — a room ends by being deleted, not by phase.

use super::{GameSession, SessionCore};
use crate::equation;
use crate::error::Result;
use crate::store::RoomPatch;
use crate::types::Phase;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

impl GameSession {
    /// Start round 1. Valid only from the lobby with at least one player;
    /// a non-host (or out-of-phase) call is an ignored no-op.
    pub async fn start_game(&self) -> Result<()> {
        self.core.start_game().await
    }

    /// Close the answering window for the current round. Normally fired
    /// by the host's watcher when the round clock runs out.
    pub async fn end_round(&self) -> Result<()> {
        self.core.end_round().await
    }

    /// Issue the next question. Normally fired by the host's watcher
    /// after the reveal delay.
    pub async fn next_question(&self) -> Result<()> {
        self.core.next_question().await
    }
}

impl SessionCore {
    pub(crate) async fn start_game(&self) -> Result<()> {
        if !self.is_host().await {
            return Ok(());
        }
        let room = self.store.get(&self.code).await?;
        if room.phase != Phase::Lobby || room.players.is_empty() {
            return Ok(());
        }

        let eq = equation::generate(&mut rand::rng());
        let players = room
            .players
            .into_iter()
            .map(|mut p| {
                p.score = 0;
                p.has_answered = false;
                p.is_correct = None;
                p
            })
            .collect();

        self.store
            .update(
                &self.code,
                RoomPatch {
                    phase: Some(Phase::Answering),
                    round: Some(1),
                    question: Some(eq.to_string()),
                    answer: Some(eq.answer),
                    players: Some(players),
                    stamp_round_start: true,
                },
            )
            .await?;
        tracing::info!(code = %self.code, question = %eq, "game started");
        Ok(())
    }

    pub(crate) async fn end_round(&self) -> Result<()> {
        if !self.is_host().await {
            return Ok(());
        }
        let room = self.store.get(&self.code).await?;
        if room.phase != Phase::Answering {
            // Another host transition beat us to it; identical outcome
            // either way, so a double invocation is harmless.
            return Ok(());
        }

        // Whoever didn't answer in time is scored as incorrect, never
        // left unknown.
        let players = room
            .players
            .into_iter()
            .map(|mut p| {
                if !p.has_answered {
                    p.is_correct = Some(false);
                }
                p
            })
            .collect();

        self.store
            .update(
                &self.code,
                RoomPatch {
                    phase: Some(Phase::Revealing),
                    players: Some(players),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(code = %self.code, round = room.round, "round ended");
        Ok(())
    }

    pub(crate) async fn next_question(&self) -> Result<()> {
        if !self.is_host().await {
            return Ok(());
        }
        let room = self.store.get(&self.code).await?;
        // Revealing is the normal entry; Answering is tolerated so a
        // missed end-of-round transition can't wedge the game.
        if room.phase == Phase::Lobby {
            return Ok(());
        }

        let eq = equation::generate(&mut rand::rng());
        let players = room
            .players
            .into_iter()
            .map(|mut p| {
                p.has_answered = false;
                p.is_correct = None;
                p
            })
            .collect();

        self.store
            .update(
                &self.code,
                RoomPatch {
                    phase: Some(Phase::Answering),
                    round: Some(room.round + 1),
                    question: Some(eq.to_string()),
                    answer: Some(eq.answer),
                    players: Some(players),
                    stamp_round_start: true,
                },
            )
            .await?;
        tracing::info!(code = %self.code, round = room.round + 1, question = %eq, "next round");
        Ok(())
    }
}

/// The host's local clock loop. Every tick it re-reads the cached
/// document; while this client is host it fires `end_round` once the
/// authoritative round clock runs out, and `next_question` once the
/// reveal delay has passed. The reveal delay is never persisted: if the
/// host leaves mid-reveal, the promoted host's own watcher picks the
/// round up from its first observation of the Revealing phase.
pub(crate) fn spawn_round_watcher(core: Arc<SessionCore>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(core.config.tick_interval);
        let mut revealing_since: Option<Instant> = None;

        loop {
            ticker.tick().await;

            let Some(room) = core.snapshot().await else {
                return; // room closed, nothing left to watch
            };
            let i_am_host = room
                .player(&core.player_id)
                .map(|p| p.is_host)
                .unwrap_or(false);
            if !i_am_host {
                revealing_since = None;
                continue;
            }

            match room.phase {
                Phase::Lobby => {
                    revealing_since = None;
                }
                Phase::Answering => {
                    revealing_since = None;
                    let Some(elapsed) = room.elapsed(Utc::now()) else {
                        continue;
                    };
                    if elapsed >= core.config.round_duration {
                        if let Err(e) = core.end_round().await {
                            tracing::warn!(code = %core.code, error = %e, "failed to end round");
                        }
                    }
                }
                Phase::Revealing => {
                    let since = *revealing_since.get_or_insert_with(Instant::now);
                    if since.elapsed() >= core.config.reveal_delay {
                        revealing_since = None;
                        if let Err(e) = core.next_question().await {
                            tracing::warn!(
                                code = %core.code,
                                error = %e,
                                "failed to advance to next round"
                            );
                        }
                    }
                }
            }
        }
    })
}
