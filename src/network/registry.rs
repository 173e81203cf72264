//! Session Registry
//!
//! Places new connections into sessions. A connection joins the first room
//! with a free slot; when none exists a new session is created and its tick
//! task started. Sessions are dropped once their last player leaves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::state::PlayerKey;
use crate::network::session::{MatchSession, Outgoing, SessionConfig, SessionError};
use crate::store::MatchStore;

/// Live sessions of one server.
pub struct SessionRegistry {
    sessions: Mutex<Vec<Arc<MatchSession>>>,
    config: SessionConfig,
    store: Arc<dyn MatchStore>,
    next_key: AtomicU64,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new(config: SessionConfig, store: Arc<dyn MatchStore>) -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            config,
            store,
            next_key: AtomicU64::new(1),
        }
    }

    /// Seat a new connection. Returns its session and player key.
    pub async fn assign(
        &self,
        sender: Outgoing,
    ) -> Result<(Arc<MatchSession>, PlayerKey), SessionError> {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.lock().await;

        for session in sessions.iter() {
            match session.join(key, sender.clone()).await {
                Ok(_) => return Ok((Arc::clone(session), key)),
                Err(e) => debug!(session = %session.short_id(), reason = %e, "Session skipped"),
            }
        }

        let session = Arc::new(MatchSession::new(
            *Uuid::new_v4().as_bytes(),
            self.config.clone(),
            Arc::clone(&self.store),
        ));
        session.join(key, sender).await?;
        session.spawn_tick_loop();
        info!(session = %session.short_id(), "Session created");

        sessions.push(Arc::clone(&session));
        Ok((session, key))
    }

    /// Remove a player. An emptied session is closed and forgotten.
    pub async fn release(&self, session: &Arc<MatchSession>, key: PlayerKey) {
        let mut sessions = self.sessions.lock().await;
        if session.leave(key).await > 0 {
            return;
        }

        session.close().await;
        sessions.retain(|s| !Arc::ptr_eq(s, session));
        info!(session = %session.short_id(), "Session closed");
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Close every session.
    pub async fn close_all(&self) {
        let mut sessions = self.sessions.lock().await;
        for session in sessions.drain(..) {
            session.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tokio::sync::mpsc;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(SessionConfig::default(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_fourth_player_opens_second_session() {
        let registry = registry();
        let (tx, _rx) = mpsc::channel(256);

        let (a, _) = registry.assign(tx.clone()).await.unwrap();
        let (b, _) = registry.assign(tx.clone()).await.unwrap();
        let (c, _) = registry.assign(tx.clone()).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b) && Arc::ptr_eq(&b, &c));
        assert_eq!(a.player_count().await, 3);
        assert_eq!(registry.session_count().await, 1);

        let (d, _) = registry.assign(tx).await.unwrap();
        assert!(!Arc::ptr_eq(&a, &d));
        assert_eq!(registry.session_count().await, 2);

        registry.close_all().await;
    }

    #[tokio::test]
    async fn test_keys_are_unique() {
        let registry = registry();
        let (tx, _rx) = mpsc::channel(256);
        let (_, k1) = registry.assign(tx.clone()).await.unwrap();
        let (_, k2) = registry.assign(tx).await.unwrap();
        assert_ne!(k1, k2);
        registry.close_all().await;
    }

    #[tokio::test]
    async fn test_empty_session_is_reaped() {
        let registry = registry();
        let (tx, _rx) = mpsc::channel(256);
        let (session, k1) = registry.assign(tx.clone()).await.unwrap();
        let (_, k2) = registry.assign(tx).await.unwrap();

        registry.release(&session, k1).await;
        assert_eq!(registry.session_count().await, 1);
        assert!(!session.is_closed().await);

        registry.release(&session, k2).await;
        assert_eq!(registry.session_count().await, 0);
        assert!(session.is_closed().await);
    }

    #[tokio::test]
    async fn test_active_session_is_skipped() {
        let registry = registry();
        let (tx, _rx) = mpsc::channel(256);
        let (first, key) = registry.assign(tx.clone()).await.unwrap();
        first
            .handle(
                key,
                crate::network::protocol::ClientMessage::Chat { text: "/start".into() },
                std::time::Instant::now(),
            )
            .await;

        let (second, _) = registry.assign(tx).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        registry.close_all().await;
    }
}
