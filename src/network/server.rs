//! TCP Game Server
//!
//! Accept loop and per-connection tasks. Each connection gets a reader task
//! that decodes frames into session commands and a writer task draining the
//! player's bounded outbound queue onto the socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::network::protocol::{read_frame, ClientMessage};
use crate::network::registry::SessionRegistry;
use crate::network::session::{Frame, SessionConfig};
use crate::store::MatchStore;

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

/// Main game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Live sessions.
    registry: Arc<SessionRegistry>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig, store: Arc<dyn MatchStore>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let session_config = SessionConfig {
            tick_rate: config.tick_rate,
            match_config: config.match_config.clone(),
        };

        Self {
            config,
            registry: Arc::new(SessionRegistry::new(session_config, store)),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.registry.close_all().await;
        Ok(())
    }

    /// Handle a new connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let registry = Arc::clone(&self.registry);
        let capacity = self.config.outbound_queue.max(1);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            if let Err(e) = stream.set_nodelay(true) {
                debug!("Failed to set TCP_NODELAY for {}: {}", addr, e);
            }
            let (mut reader, mut writer) = stream.into_split();
            let (frame_tx, mut frame_rx) = mpsc::channel::<Frame>(capacity);

            let (session, key) = match registry.assign(frame_tx).await {
                Ok(seat) => seat,
                Err(e) => {
                    warn!("Could not seat {}: {}", addr, e);
                    return;
                }
            };
            info!(session = %session.short_id(), player = key, %addr, "Player connected");

            // Spawn frame writer task
            let sender_task = tokio::spawn(async move {
                while let Some(framed) = frame_rx.recv().await {
                    if writer.write_all(&framed).await.is_err() {
                        break;
                    }
                }
            });

            // Handle incoming frames
            loop {
                tokio::select! {
                    result = read_frame(&mut reader) => {
                        match result {
                            Ok(payload) => match ClientMessage::decode(&payload) {
                                Ok(message) => session.handle(key, message, Instant::now()).await,
                                Err(e) => debug!(
                                    %addr,
                                    error = %e,
                                    frame = %hex::encode(&payload),
                                    "Dropping malformed frame"
                                ),
                            },
                            Err(e) => {
                                debug!("Client {} disconnected: {}", addr, e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            registry.release(&session, key).await;
            sender_task.abort();
            info!(session = %session.short_id(), player = key, %addr, "Player disconnected");
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        self.registry.session_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn local_config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = GameServer::new(local_config(), Arc::new(MemoryStore::new()));
        assert_eq!(server.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_server_shutdown_stops_serve() {
        let server = Arc::new(GameServer::new(local_config(), Arc::new(MemoryStore::new())));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let running = Arc::clone(&server);
        let handle = tokio::spawn(async move { running.serve(listener).await });

        // Give the accept loop time to subscribe.
        tokio::time::sleep(Duration::from_millis(20)).await;
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
