//! Last-observed modification time registry.
//!
//! A file finishes a read pass and is "parked" here with the mtime
//! captured before the read began. The change monitor compares the live
//! mtime against the parked value and re-queues files that moved on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// Path → last-observed-modification-time map behind accessor operations.
#[derive(Debug, Default)]
pub struct ModifiedRegistry {
    entries: Mutex<HashMap<PathBuf, SystemTime>>,
}

impl ModifiedRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a path with the mtime observed before its read pass began.
    ///
    /// Recording the pre-read mtime means a write that lands during the
    /// pass leaves the live mtime ahead of the parked value, so the
    /// next scan re-queues the file instead of missing the write.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn record(&self, path: &Path, mtime: SystemTime) {
        self.entries
            .lock()
            .expect("Mutex poisoned")
            .insert(path.to_path_buf(), mtime);
    }

    /// Remove and return every parked path whose file has changed.
    ///
    /// A path whose live mtime is strictly greater than the parked
    /// value is removed from the registry and returned. Paths whose
    /// files no longer exist are warned about and left parked, retried
    /// on every scan until the file reappears.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn take_changed(&self) -> Vec<PathBuf> {
        let mut entries = self.entries.lock().expect("Mutex poisoned");
        let mut changed = Vec::new();

        entries.retain(|path, recorded| {
            let Ok(metadata) = std::fs::metadata(path) else {
                tracing::warn!(path = %path.display(), "Monitored file does not exist");
                return true;
            };
            let Ok(mtime) = metadata.modified() else {
                return true;
            };

            if mtime > *recorded {
                changed.push(path.clone());
                false
            } else {
                true
            }
        });

        changed
    }

    /// Whether a path is currently parked.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries
            .lock()
            .expect("Mutex poisoned")
            .contains_key(path)
    }

    /// Number of parked paths.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("Mutex poisoned").len()
    }

    /// Whether the registry is empty.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().expect("Mutex poisoned").is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_record_and_contains() {
        let registry = ModifiedRegistry::new();
        let path = PathBuf::from("/tmp/a.log");

        assert!(!registry.contains(&path));
        registry.record(&path, SystemTime::now());
        assert!(registry.contains(&path));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unchanged_file_stays_parked() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.log");
        std::fs::write(&file, "x").unwrap();
        let mtime = std::fs::metadata(&file).unwrap().modified().unwrap();

        let registry = ModifiedRegistry::new();
        registry.record(&file, mtime);

        assert!(registry.take_changed().is_empty());
        assert!(registry.contains(&file));
    }

    #[test]
    fn test_changed_file_is_taken() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.log");
        std::fs::write(&file, "x").unwrap();
        let old = std::fs::metadata(&file).unwrap().modified().unwrap() - Duration::from_secs(5);

        let registry = ModifiedRegistry::new();
        registry.record(&file, old);

        assert_eq!(registry.take_changed(), vec![file.clone()]);
        // Taken exactly once; the entry is gone until re-recorded.
        assert!(!registry.contains(&file));
        assert!(registry.take_changed().is_empty());
    }

    #[test]
    fn test_missing_file_is_retained() {
        let registry = ModifiedRegistry::new();
        let gone = PathBuf::from("/tmp/nonexistent-file-98765.log");
        registry.record(&gone, SystemTime::now());

        assert!(registry.take_changed().is_empty());
        assert!(registry.contains(&gone));
    }

    #[test]
    fn test_pre_read_mtime_catches_write_during_pass() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.log");
        std::fs::write(&file, "x").unwrap();
        let pre_read = std::fs::metadata(&file).unwrap().modified().unwrap();

        // A write lands "during the pass"; the pass still parks the
        // pre-read mtime afterwards.
        std::thread::sleep(Duration::from_millis(20));
        std::fs::write(&file, "xy").unwrap();

        let registry = ModifiedRegistry::new();
        registry.record(&file, pre_read);

        // The next scan must pick the file up again.
        let changed = registry.take_changed();
        assert_eq!(changed, vec![file]);
    }
}
