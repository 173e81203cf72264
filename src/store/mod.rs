//! Match Persistence
//!
//! Finished matches are handed to a `MatchStore` as a `MatchRecord`. The
//! server only needs two things from a store: make sure it can write, and
//! append one record per finished match.
//!
//! ## Backends
//!
//! - `memory`: records kept in process, for tests and local play
//! - `jsonl`: one JSON object per line in an append-only file

pub mod memory;
pub mod jsonl;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

pub use memory::MemoryStore;
pub use jsonl::JsonLinesStore;

/// Summary of one finished match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Fresh id per match.
    pub match_id: Uuid,
    /// Hex id of the session the match ran in.
    pub session: String,
    /// Winning team index.
    pub winner_team: u8,
    /// Players seated when the match ended.
    pub players: Vec<PlayerRecord>,
    /// Start, card uses and unit deaths, in order.
    pub events: Vec<String>,
    /// When the match ended.
    pub created_at: DateTime<Utc>,
}

/// Player line of a `MatchRecord`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Display name.
    pub name: String,
    /// Team index.
    pub team: u8,
}

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialised.
    #[error("Store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Store lock was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Persistence backend for finished matches.
pub trait MatchStore: Send + Sync {
    /// Prepare the backend. Called once at startup; failure is fatal.
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Persist one finished match.
    fn record_match(&self, record: &MatchRecord) -> Result<(), StoreError>;
}
