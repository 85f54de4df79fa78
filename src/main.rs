use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mathdash::session::GameSession;
use mathdash::store::{MemoryStore, RoomStore};
use mathdash::types::GameConfig;

/// Scripted three-client game against the in-memory store, mostly useful
/// for watching the protocol converge in the logs.
#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mathdash=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting mathdash demo...");

    let mut config = GameConfig::from_env();
    // Keep the demo brisk unless the env says otherwise
    if std::env::var("MATHDASH_ROUND_SECONDS").is_err() {
        config.round_duration = Duration::from_secs(5);
    }
    if std::env::var("MATHDASH_REVEAL_SECONDS").is_err() {
        config.reveal_delay = Duration::from_secs(1);
    }
    config.tick_interval = Duration::from_millis(250);

    let store: Arc<dyn RoomStore> = Arc::new(MemoryStore::new());

    let ava = GameSession::create(store.clone(), config.clone(), "Ava")
        .await
        .expect("create room");
    let code = ava.code().to_string();
    tracing::info!(code = %code, "share this code with the other players");

    let ben = GameSession::join(store.clone(), config.clone(), &code, "Ben")
        .await
        .expect("Ben joins");
    let cleo = GameSession::join(store.clone(), config.clone(), &code, "Cleo")
        .await
        .expect("Cleo joins");

    ava.start_game().await.expect("start game");

    // Ava and Ben answer every round; Ben peeks at the document and is
    // always right, Ava guesses a fixed value, Cleo never answers.
    for _ in 0..3 {
        let room = store.get(&code).await.expect("room still open");
        let _ = ben.submit_answer(&room.answer.to_string()).await;
        let _ = ava.submit_answer("42").await;

        // Wait out the rest of the round plus the reveal
        tokio::time::sleep(config.round_duration + config.reveal_delay + Duration::from_millis(500))
            .await;
    }

    if let Ok(room) = store.get(&code).await {
        match serde_json::to_string_pretty(&room) {
            Ok(doc) => tracing::debug!("final room document:\n{doc}"),
            Err(e) => tracing::warn!("could not serialize room document: {e}"),
        }
    }

    if let Some(view) = cleo.current_view().await {
        tracing::info!(round = view.round, "final standings");
        for (rank, row) in view.scoreboard.iter().enumerate() {
            tracing::info!("  #{} {} — {} points", rank + 1, row.name, row.score);
        }
    }

    for session in [&ava, &ben, &cleo] {
        session.leave().await.expect("leave room");
    }
    assert!(store.get(&code).await.is_err(), "room should be deleted");
    tracing::info!("room closed, demo over");
}
