//! Inkwar Game Server
//!
//! Loads configuration from the environment, prepares the match store and
//! serves until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use inkwar::{
    GameServer, JsonLinesStore, MatchStore, MemoryStore, ServerConfig,
    MATCH_DURATION_TICKS, TICK_RATE, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;

    info!("Inkwar Server v{}", VERSION);
    info!("Tick Rate: {} Hz", config.tick_rate);
    info!(
        "Match Duration: {} ticks ({} seconds)",
        MATCH_DURATION_TICKS,
        MATCH_DURATION_TICKS / TICK_RATE
    );

    let store: Arc<dyn MatchStore> = match &config.store_path {
        Some(path) => Arc::new(JsonLinesStore::new(path)),
        None => {
            info!("No INKWAR_STORE_PATH set, keeping match records in memory");
            Arc::new(MemoryStore::new())
        }
    };
    store.ensure_schema().context("failed to prepare match store")?;

    let server = Arc::new(GameServer::new(config, store));
    let running = Arc::clone(&server);
    let mut serve = tokio::spawn(async move { running.run().await });

    tokio::select! {
        result = &mut serve => {
            result.context("server task panicked")??;
            return Ok(());
        }
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("Ctrl-C received, shutting down");
            server.shutdown();
        }
    }

    serve.await.context("server task panicked")??;
    Ok(())
}
