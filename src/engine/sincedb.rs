//! Durable per-file offset store (the since-db).
//!
//! Maps each tracked path to the byte offset of its first unread byte.
//! The mapping lives in memory and is periodically rewritten in full to
//! a human-inspectable YAML snapshot so a restart can resume where the
//! previous run left off.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::error::EngineError;

/// In-memory path→offset mapping with a durable YAML snapshot.
#[derive(Debug)]
pub struct OffsetStore {
    since_db_path: PathBuf,
    offsets: RwLock<HashMap<PathBuf, u64>>,
}

impl OffsetStore {
    /// Create an empty store backed by the given snapshot path.
    #[must_use]
    pub fn new<P: AsRef<Path>>(since_db_path: P) -> Self {
        Self {
            since_db_path: since_db_path.as_ref().to_path_buf(),
            offsets: RwLock::new(HashMap::new()),
        }
    }

    /// Seed the in-memory mapping from the durable snapshot.
    ///
    /// An absent snapshot is a fresh start, not an error. A snapshot
    /// that exists but contains malformed YAML is treated the same way
    /// (logged); only an unreadable file is fatal, since silently
    /// re-reading every tracked file from scratch on an I/O hiccup
    /// would violate the resume contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot file exists but cannot be read.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn load(&self) -> Result<(), EngineError> {
        if !self.since_db_path.exists() {
            tracing::debug!(
                path = %self.since_db_path.display(),
                "No since-db snapshot, starting fresh"
            );
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.since_db_path).map_err(|e| {
            EngineError::SinceDbUnreadable {
                path: self.since_db_path.clone(),
                source: e,
            }
        })?;

        match serde_yaml::from_str::<HashMap<PathBuf, u64>>(&content) {
            Ok(loaded) => {
                tracing::info!(
                    path = %self.since_db_path.display(),
                    entries = loaded.len(),
                    "Loaded since-db snapshot"
                );
                let mut offsets = self.offsets.write().expect("RwLock poisoned");
                offsets.extend(loaded);
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.since_db_path.display(),
                    error = %e,
                    "Malformed since-db snapshot, starting fresh"
                );
            }
        }

        Ok(())
    }

    /// Get the checkpointed offset for a path.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<u64> {
        self.offsets
            .read()
            .expect("RwLock poisoned")
            .get(path)
            .copied()
    }

    /// Checkpoint the offset for a path.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn set(&self, path: &Path, offset: u64) {
        self.offsets
            .write()
            .expect("RwLock poisoned")
            .insert(path.to_path_buf(), offset);
    }

    /// A copy of the current mapping.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<PathBuf, u64> {
        self.offsets.read().expect("RwLock poisoned").clone()
    }

    /// Rewrite the durable snapshot in full.
    ///
    /// Serialization happens under the read lock so concurrent `set`
    /// calls cannot produce a torn snapshot; the file write happens
    /// after the lock is released. A write failure is logged together
    /// with the in-memory state so an operator can recover manually,
    /// and the next interval retries naturally.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn dump(&self) {
        let serialized = {
            let offsets = self.offsets.read().expect("RwLock poisoned");
            serde_yaml::to_string(&*offsets)
        };

        let serialized = match serialized {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize since-db");
                return;
            }
        };

        if let Err(e) = std::fs::write(&self.since_db_path, serialized) {
            tracing::error!(
                path = %self.since_db_path.display(),
                error = %e,
                "Failed to write since-db snapshot"
            );
            tracing::info!(offsets = ?self.snapshot(), "Current in-memory offsets");
        }
    }
}
