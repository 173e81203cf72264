//! In-process store.

use std::sync::Mutex;

use super::{MatchRecord, MatchStore, StoreError};

/// Keeps every record in memory. Used when no store path is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<MatchRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn records(&self) -> Vec<MatchRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Number of recorded matches.
    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MatchStore for MemoryStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn record_match(&self, record: &MatchRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.push(record.clone());
        Ok(())
    }
}
