//! JSON-lines file store.
//!
//! Each finished match becomes one line of JSON appended to the file. The
//! file is opened per write so an external rotation never leaves the
//! server writing to an unlinked inode.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use super::{MatchRecord, MatchStore, StoreError};

/// Append-only JSON-lines store.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    // Serialises appends from concurrent sessions.
    write_lock: Mutex<()>,
}

impl JsonLinesStore {
    /// Store writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back. Blank lines are skipped.
    pub fn load(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let text = fs::read_to_string(&self.path)?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StoreError::from))
            .collect()
    }
}

impl MatchStore for JsonLinesStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(&self.path)?;
        info!("Match store ready at {}", self.path.display());
        Ok(())
    }

    fn record_match(&self, record: &MatchRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&line)?;
        debug!(match_id = %record.match_id, "Match recorded");
        Ok(())
    }
}
