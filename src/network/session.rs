//! Match Session Management
//!
//! One session owns one `MatchState` behind a single async mutex. The tick
//! task and every reader task take that lock for one step at a time, then
//! push the encoded outbox to each player's bounded outbound queue. Socket
//! I/O never happens under the lock.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::events::{Outbound, Recipient};
use crate::game::state::{MatchState, MatchStatus, PlayerKey, SessionId};
use crate::game::tick::{tick, MatchConfig};
use crate::network::protocol::{encode_event, frame, ClientMessage};
use crate::store::{MatchRecord, MatchStore};
use crate::TICK_RATE;

/// Encoded, length-prefixed frame shared between recipients.
pub type Frame = Arc<[u8]>;

/// Sending half of a player's outbound queue.
pub type Outgoing = mpsc::Sender<Frame>;

/// Configuration for a match session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    /// Game tuning.
    pub match_config: MatchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            match_config: MatchConfig::default(),
        }
    }
}

/// Session errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// Session is full.
    #[error("Session is full")]
    SessionFull,

    /// Player already in session.
    #[error("Already in session")]
    AlreadyInSession,

    /// Match is in progress.
    #[error("Match in progress")]
    MatchInProgress,

    /// Session was closed after its last player left.
    #[error("Session closed")]
    Closed,
}

struct SessionInner {
    state: MatchState,
    links: BTreeMap<PlayerKey, Outgoing>,
    closed: bool,
}

/// One running match and the queues of its players.
pub struct MatchSession {
    id: SessionId,
    tick_rate: u32,
    inner: Mutex<SessionInner>,
    store: Arc<dyn MatchStore>,
}

impl MatchSession {
    /// Create an empty session in the room.
    pub fn new(id: SessionId, config: SessionConfig, store: Arc<dyn MatchStore>) -> Self {
        Self {
            id,
            tick_rate: config.tick_rate.max(1),
            inner: Mutex::new(SessionInner {
                state: MatchState::new(id, config.match_config),
                links: BTreeMap::new(),
                closed: false,
            }),
            store,
        }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Short hex form for logs.
    pub fn short_id(&self) -> String {
        hex::encode(&self.id[..4])
    }

    /// Seat a player. Only a room with a free slot accepts.
    ///
    /// Returns the player's wire id.
    pub async fn join(&self, key: PlayerKey, sender: Outgoing) -> Result<u16, SessionError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(SessionError::Closed);
        }
        if inner.state.status != MatchStatus::Room {
            return Err(SessionError::MatchInProgress);
        }
        if inner.state.is_full() {
            return Err(SessionError::SessionFull);
        }
        if inner.links.contains_key(&key) {
            return Err(SessionError::AlreadyInSession);
        }

        let id = inner.state.add_player(key);
        inner.links.insert(key, sender);
        info!(session = %self.short_id(), player = key, id, "Player joined");
        Ok(id)
    }

    /// Detach a player. Their units keep fighting. Returns how many players
    /// remain.
    pub async fn leave(&self, key: PlayerKey) -> usize {
        let mut inner = self.inner.lock().await;
        inner.links.remove(&key);
        if let Some(player) = inner.state.remove_player(key) {
            info!(
                session = %self.short_id(),
                player = player.display_name(),
                "Player left"
            );
        }
        inner.state.player_count()
    }

    /// Apply one client command, then flush whatever it produced.
    pub async fn handle(&self, key: PlayerKey, message: ClientMessage, now: Instant) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return;
        }

        let opcode = message.opcode();
        let state = &mut inner.state;
        let applied = match message {
            ClientMessage::Join { name } => state.join(key, &name),
            ClientMessage::ChangeTeam { team } => state.change_team(key, team),
            ClientMessage::Chat { text } => state.chat(key, &text),
            ClientMessage::UseCard { hand_slot, x } => state.use_card(key, hand_slot, x),
            ClientMessage::SetDeck { card_ids } => state.set_deck(key, &card_ids),
            ClientMessage::PingResponse => state.answer_ping(key, now),
        };
        if !applied {
            debug!(session = %self.short_id(), player = key, opcode, "Command ignored");
        }

        deliver(&mut inner);
    }

    /// Advance the match one tick. Returns false once the session is closed.
    ///
    /// A finished match is written to the store after the lock is released.
    pub async fn run_tick(&self, now: Instant) -> bool {
        let record = {
            let mut inner = self.inner.lock().await;
            if inner.closed {
                return false;
            }

            let result = tick(&mut inner.state, now);
            deliver(&mut inner);
            result.record
        };

        if let Some(record) = record {
            self.persist(record).await;
        }
        true
    }

    /// Write a match record on the blocking pool.
    async fn persist(&self, record: MatchRecord) {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.record_match(&record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(session = %self.short_id(), error = %e, "Failed to record match"),
            Err(e) => warn!(session = %self.short_id(), error = %e, "Match store task failed"),
        }
    }

    /// Stop the tick loop and refuse new players.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        inner.links.clear();
    }

    /// Whether `close` was called.
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    /// Seated players.
    pub async fn player_count(&self) -> usize {
        self.inner.lock().await.state.player_count()
    }

    /// Room or active.
    pub async fn status(&self) -> MatchStatus {
        self.inner.lock().await.state.status
    }

    /// Spawn the fixed-rate tick task. It exits on its own once the session
    /// is closed.
    pub fn spawn_tick_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        let period = Duration::from_micros(1_000_000 / u64::from(session.tick_rate));

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if !session.run_tick(Instant::now()).await {
                    break;
                }
            }
            debug!(session = %session.short_id(), "Tick loop stopped");
        })
    }
}

/// Encode the outbox once per event and queue the frame for each recipient.
/// A full queue drops the frame for that player only.
fn deliver(inner: &mut SessionInner) {
    for Outbound { to, event } in inner.state.take_outbox() {
        let payload = encode_event(&event);
        let framed: Frame = match frame(&payload) {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                warn!(error = %e, "Dropping oversized event");
                continue;
            }
        };

        match to {
            Recipient::All => {
                for (&key, link) in &inner.links {
                    push(key, link, Arc::clone(&framed));
                }
            }
            Recipient::Player(key) => {
                if let Some(link) = inner.links.get(&key) {
                    push(key, link, framed);
                }
            }
        }
    }
}

fn push(key: PlayerKey, link: &Outgoing, framed: Frame) {
    match link.try_send(framed) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(player = key, "Outbound queue full, dropping frame");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(player = key, "Outbound queue closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEvent;
    use crate::game::state::Team;
    use crate::network::protocol::decode_event;
    use crate::store::MemoryStore;

    fn session_with(store: Arc<MemoryStore>) -> MatchSession {
        MatchSession::new([3; 16], SessionConfig::default(), store)
    }

    fn session() -> MatchSession {
        session_with(Arc::new(MemoryStore::new()))
    }

    fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(framed) = rx.try_recv() {
            // Skip the length prefix.
            events.push(decode_event(&framed[2..]).unwrap());
        }
        events
    }

    #[tokio::test]
    async fn test_join_until_full() {
        let session = session();
        let (tx, _rx) = mpsc::channel(16);

        assert_eq!(session.join(1, tx.clone()).await.unwrap(), 1);
        assert_eq!(session.join(2, tx.clone()).await.unwrap(), 2);
        assert!(matches!(session.join(2, tx.clone()).await, Err(SessionError::AlreadyInSession)));
        assert_eq!(session.join(3, tx.clone()).await.unwrap(), 3);
        assert!(matches!(session.join(4, tx).await, Err(SessionError::SessionFull)));
        assert_eq!(session.player_count().await, 3);
    }

    #[tokio::test]
    async fn test_no_join_into_active_match() {
        let session = session();
        let (tx, _rx) = mpsc::channel(16);
        session.join(1, tx.clone()).await.unwrap();
        session
            .handle(1, ClientMessage::Chat { text: "/start".into() }, Instant::now())
            .await;
        assert_eq!(session.status().await, MatchStatus::Active);
        assert!(matches!(session.join(2, tx).await, Err(SessionError::MatchInProgress)));
    }

    #[tokio::test]
    async fn test_chat_reaches_every_player() {
        let session = session();
        let (tx1, mut rx1) = mpsc::channel(16);
        let (tx2, mut rx2) = mpsc::channel(16);
        session.join(1, tx1).await.unwrap();
        session.join(2, tx2).await.unwrap();

        let now = Instant::now();
        session.handle(1, ClientMessage::Join { name: "ann".into() }, now).await;
        session.handle(1, ClientMessage::Chat { text: "hi".into() }, now).await;

        let expected = GameEvent::Chat("ann: hi".into());
        assert_eq!(drain(&mut rx1), vec![expected.clone()]);
        assert_eq!(drain(&mut rx2), vec![expected]);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let session = session();
        let (slow_tx, mut slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(16);
        session.join(1, slow_tx).await.unwrap();
        session.join(2, fast_tx).await.unwrap();

        let now = Instant::now();
        for text in ["a", "b", "c"] {
            session.handle(2, ClientMessage::Chat { text: text.into() }, now).await;
        }

        assert_eq!(drain(&mut slow_rx).len(), 1);
        assert_eq!(drain(&mut fast_rx).len(), 3);
    }

    #[tokio::test]
    async fn test_leave_reports_remaining() {
        let session = session();
        let (tx, _rx) = mpsc::channel(16);
        session.join(1, tx.clone()).await.unwrap();
        session.join(2, tx).await.unwrap();
        assert_eq!(session.leave(1).await, 1);
        assert_eq!(session.leave(1).await, 1);
        assert_eq!(session.leave(2).await, 0);
    }

    #[tokio::test]
    async fn test_closed_session_stops_ticking() {
        let session = session();
        let (tx, _rx) = mpsc::channel(16);
        session.join(1, tx.clone()).await.unwrap();
        assert!(session.run_tick(Instant::now()).await);

        session.close().await;
        assert!(session.is_closed().await);
        assert!(!session.run_tick(Instant::now()).await);
        assert!(matches!(session.join(2, tx).await, Err(SessionError::Closed)));
    }

    #[tokio::test]
    async fn test_finished_match_is_recorded() {
        let store = Arc::new(MemoryStore::new());
        let config = SessionConfig {
            match_config: MatchConfig { duration_ticks: 2, ..MatchConfig::default() },
            ..SessionConfig::default()
        };
        let session = MatchSession::new([4; 16], config, store.clone());
        let (tx, mut rx) = mpsc::channel(256);
        session.join(1, tx).await.unwrap();

        let now = Instant::now();
        session.handle(1, ClientMessage::Join { name: "solo".into() }, now).await;
        session.handle(1, ClientMessage::Chat { text: "/start".into() }, now).await;
        for _ in 0..3 {
            session.run_tick(now).await;
        }

        assert_eq!(session.status().await, MatchStatus::Room);
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].players[0].name, "solo");

        let events = drain(&mut rx);
        assert!(events.contains(&GameEvent::MatchStarted));
        assert!(events.contains(&GameEvent::MatchEnded(Team::Defender)));
    }

    /// Store that parks every write until released.
    struct GatedStore {
        release: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
        inner: MemoryStore,
    }

    impl MatchStore for GatedStore {
        fn ensure_schema(&self) -> Result<(), crate::store::StoreError> {
            Ok(())
        }

        fn record_match(&self, record: &MatchRecord) -> Result<(), crate::store::StoreError> {
            let gate = self.release.lock().map_err(|_| crate::store::StoreError::Poisoned)?;
            let _ = gate.recv();
            self.inner.record_match(record)
        }
    }

    #[tokio::test]
    async fn test_store_write_does_not_hold_session() {
        let (open, gate) = std::sync::mpsc::channel();
        let store = Arc::new(GatedStore {
            release: std::sync::Mutex::new(gate),
            inner: MemoryStore::new(),
        });
        let config = SessionConfig {
            match_config: MatchConfig { duration_ticks: 2, ..MatchConfig::default() },
            ..SessionConfig::default()
        };
        let session = Arc::new(MatchSession::new([5; 16], config, store.clone()));
        let (tx, _rx) = mpsc::channel(256);
        session.join(1, tx).await.unwrap();

        let now = Instant::now();
        session.handle(1, ClientMessage::Chat { text: "/start".into() }, now).await;

        let ticking = Arc::clone(&session);
        let ticks = tokio::spawn(async move {
            for _ in 0..3 {
                ticking.run_tick(now).await;
            }
        });

        // The write is parked; the session must still answer.
        tokio::time::timeout(Duration::from_secs(2), async {
            while session.status().await != MatchStatus::Room {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("session stayed locked");
        assert_eq!(session.player_count().await, 1);

        open.send(()).unwrap();
        ticks.await.unwrap();
        assert_eq!(store.inner.len(), 1);
    }
}
