//! Change and discovery polling loops.
//!
//! Both monitors feed the pending queue: one by watching modification
//! times of files already read, one by rescanning configured
//! directories for files that appeared after startup.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::queue::PendingQueue;
use super::registry::ModifiedRegistry;
use super::resolver::PathResolver;
use super::sleep::sleep_cancellable;

/// Re-queues tracked files whose modification time advanced.
pub struct ChangeMonitor {
    registry: Arc<ModifiedRegistry>,
    queue: Arc<PendingQueue>,
    interval: Duration,
    slice: Duration,
    token: CancellationToken,
}

impl ChangeMonitor {
    /// Create a change monitor.
    #[must_use]
    pub fn new(
        registry: Arc<ModifiedRegistry>,
        queue: Arc<PendingQueue>,
        interval: Duration,
        slice: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            registry,
            queue,
            interval,
            slice,
            token,
        }
    }

    /// Poll the registry until cancelled.
    pub async fn run(self) {
        loop {
            if !sleep_cancellable(self.interval, self.slice, &self.token).await {
                break;
            }

            for path in self.registry.take_changed() {
                if self.queue.push(&path) {
                    tracing::debug!(path = %path.display(), "File changed, queued for read");
                }
            }
        }

        tracing::debug!("Change monitor stopped");
    }
}

/// Enqueues files that appear in configured directories after startup.
pub struct DiscoveryMonitor {
    resolver: Arc<PathResolver>,
    queue: Arc<PendingQueue>,
    interval: Duration,
    slice: Duration,
    token: CancellationToken,
}

impl DiscoveryMonitor {
    /// Create a discovery monitor.
    #[must_use]
    pub fn new(
        resolver: Arc<PathResolver>,
        queue: Arc<PendingQueue>,
        interval: Duration,
        slice: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            resolver,
            queue,
            interval,
            slice,
            token,
        }
    }

    /// Rescan configured directories until cancelled.
    ///
    /// If no configured entry is a directory at startup, no new files
    /// can ever appear and the monitor stops permanently. Queueing a
    /// file that is already fully read is harmless: its read pass
    /// consumes zero records.
    pub async fn run(self) {
        if self.resolver.directory_entries().is_empty() {
            tracing::info!("No configured directory entries, discovery monitor stopping");
            return;
        }

        loop {
            if !sleep_cancellable(self.interval, self.slice, &self.token).await {
                break;
            }

            for path in self.resolver.rescan_directories() {
                if self.queue.push(&path) {
                    tracing::debug!(path = %path.display(), "Discovered file, queued for read");
                }
            }
        }

        tracing::debug!("Discovery monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::SystemTime;

    use tempfile::TempDir;

    use crate::config::TailConfig;

    use super::*;

    fn short(duration_ms: u64) -> Duration {
        Duration::from_millis(duration_ms)
    }

    #[tokio::test]
    async fn test_change_monitor_requeues_modified_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.log");
        std::fs::write(&file, "x").unwrap();

        let registry = Arc::new(ModifiedRegistry::new());
        let queue = Arc::new(PendingQueue::new());
        let token = CancellationToken::new();

        // Park the file with an mtime in the past.
        registry.record(&file, SystemTime::now() - Duration::from_secs(60));

        let monitor = ChangeMonitor::new(
            Arc::clone(&registry),
            Arc::clone(&queue),
            short(20),
            short(10),
            token.clone(),
        );
        let handle = tokio::spawn(monitor.run());

        let popped = queue.pop(Duration::from_secs(2), &token).await;
        assert_eq!(popped, Some(file.clone()));
        assert!(!registry.contains(&file));

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_change_monitor_stops_on_cancellation() {
        let registry = Arc::new(ModifiedRegistry::new());
        let queue = Arc::new(PendingQueue::new());
        let token = CancellationToken::new();

        let monitor = ChangeMonitor::new(
            registry,
            queue,
            Duration::from_secs(3600),
            short(10),
            token.clone(),
        );
        let handle = tokio::spawn(monitor.run());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop promptly")
            .unwrap();
    }

    #[tokio::test]
    async fn test_discovery_monitor_finds_new_file() {
        let dir = TempDir::new().unwrap();
        let config = TailConfig::for_paths(vec![dir.path().to_path_buf()]);
        let resolver = Arc::new(PathResolver::new(&config));
        let queue = Arc::new(PendingQueue::new());
        let token = CancellationToken::new();

        let monitor = DiscoveryMonitor::new(
            resolver,
            Arc::clone(&queue),
            short(20),
            short(10),
            token.clone(),
        );
        let handle = tokio::spawn(monitor.run());

        let late = dir.path().join("late.log");
        std::fs::write(&late, "new\n").unwrap();

        let popped = queue.pop(Duration::from_secs(2), &token).await;
        assert_eq!(popped, Some(late));

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_discovery_monitor_stops_without_directories() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("only.log");
        std::fs::write(&file, "x").unwrap();

        let config = TailConfig::for_paths(vec![file]);
        let resolver = Arc::new(PathResolver::new(&config));
        let queue = Arc::new(PendingQueue::new());
        let token = CancellationToken::new();

        let monitor = DiscoveryMonitor::new(
            resolver,
            queue,
            Duration::from_secs(3600),
            short(10),
            token,
        );

        // Returns immediately, no cancellation needed.
        tokio::time::timeout(Duration::from_secs(1), monitor.run())
            .await
            .expect("monitor should stop on its own");
    }

    #[tokio::test]
    async fn test_discovery_monitor_skips_queued_duplicate() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.log");
        std::fs::write(&file, "x").unwrap();

        let config = TailConfig::for_paths(vec![dir.path().to_path_buf()]);
        let resolver = Arc::new(PathResolver::new(&config));
        let queue = Arc::new(PendingQueue::new());
        let token = CancellationToken::new();

        // Already pending from the initial seed.
        queue.push(Path::new(&file));

        let monitor = DiscoveryMonitor::new(
            resolver,
            Arc::clone(&queue),
            short(20),
            short(10),
            token.clone(),
        );
        let handle = tokio::spawn(monitor.run());

        // Give it a few cycles; the duplicate must not pile up.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(queue.len(), 1);

        token.cancel();
        handle.await.unwrap();
    }
}
