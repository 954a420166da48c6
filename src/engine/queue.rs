//! Deduplicated pending-work queue.
//!
//! FIFO of file paths awaiting a read pass. A path is held in at most
//! one place at a time: either queued (pending) or leased to an active
//! reader, never both and never twice. Duplicate pushes are dropped,
//! which keeps two workers from racing on the same file's offset.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct QueueState {
    queue: VecDeque<PathBuf>,
    pending: HashSet<PathBuf>,
    active: HashSet<PathBuf>,
}

/// Multi-producer queue with timed, cancellable consumption and
/// per-path leases.
#[derive(Debug, Default)]
pub struct PendingQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl PendingQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a path for a read pass.
    ///
    /// Returns `false` without enqueuing when the path is already
    /// pending or currently leased to a reader. Dropping the enqueue is
    /// safe: content that arrives while a pass runs advances the file's
    /// mtime past the pre-read value parked in the modified registry,
    /// so the change monitor re-queues the path on its next scan.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn push(&self, path: &Path) -> bool {
        let mut state = self.state.lock().expect("Mutex poisoned");
        if state.pending.contains(path) || state.active.contains(path) {
            return false;
        }
        state.pending.insert(path.to_path_buf());
        state.queue.push_back(path.to_path_buf());
        drop(state);
        self.notify.notify_one();
        true
    }

    /// Dequeue the next path, waiting up to `timeout`.
    ///
    /// The returned path is leased: further pushes of it are dropped
    /// until [`complete`](Self::complete) releases the lease. Returns
    /// `None` on timeout or cancellation so the caller can re-check the
    /// run state.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub async fn pop(&self, timeout: Duration, token: &CancellationToken) -> Option<PathBuf> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            // Register interest before checking the queue so a push
            // between the check and the wait is not lost.
            let notified = self.notify.notified();

            {
                let mut state = self.state.lock().expect("Mutex poisoned");
                if let Some(path) = state.queue.pop_front() {
                    state.pending.remove(&path);
                    state.active.insert(path.clone());
                    return Some(path);
                }
            }

            tokio::select! {
                () = token.cancelled() => return None,
                () = tokio::time::sleep_until(deadline) => return None,
                () = notified => {}
            }
        }
    }

    /// Release the lease on a path after its read pass finishes.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    pub fn complete(&self, path: &Path) {
        let mut state = self.state.lock().expect("Mutex poisoned");
        state.active.remove(path);
    }

    /// Number of paths waiting (leased paths not included).
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().expect("Mutex poisoned").queue.len()
    }

    /// Whether no paths are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
