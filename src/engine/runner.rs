//! Engine wiring and lifecycle.
//!
//! Startup: resolve paths, seed the queue, load the since-db, then
//! spawn the monitors, the worker pool, and the checkpoint timer.
//! Shutdown: cancel, join every loop, dump the since-db once more.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::TailConfig;
use crate::decode::RecordDecoder;
use crate::sink::EventSink;

use super::error::EngineError;
use super::monitors::{ChangeMonitor, DiscoveryMonitor};
use super::queue::PendingQueue;
use super::registry::ModifiedRegistry;
use super::resolver::PathResolver;
use super::sincedb::OffsetStore;
use super::sleep::sleep_cancellable;
use super::worker::TailWorker;

/// The tailing engine, ready to start.
pub struct Engine {
    config: Arc<TailConfig>,
    decoder: Arc<dyn RecordDecoder>,
    sink: Arc<dyn EventSink>,
}

impl Engine {
    /// Create an engine from a configuration and its collaborators.
    #[must_use]
    pub fn new(
        config: TailConfig,
        decoder: Arc<dyn RecordDecoder>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            decoder,
            sink,
        }
    }

    /// Start the engine.
    ///
    /// Must be called within a tokio runtime. Fails fast: no loop is
    /// spawned until the configuration, path resolution, and since-db
    /// load have all succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration, a missing configured
    /// or strict-exclusion path, a resolved set exceeding
    /// `max_open_files`, or an unreadable since-db.
    pub fn start(self) -> Result<EngineHandle, EngineError> {
        self.config.validate()?;

        let resolver = Arc::new(PathResolver::new(&self.config));
        let files = resolver.resolve()?;

        let offsets = Arc::new(OffsetStore::new(&self.config.since_db_path));
        offsets.load()?;

        let queue = Arc::new(PendingQueue::new());
        for file in &files {
            queue.push(file);
        }

        let registry = Arc::new(ModifiedRegistry::new());
        let token = CancellationToken::new();
        let slice = Duration::from_millis(self.config.poll.shutdown_slice_ms);

        let mut tasks = JoinSet::new();

        tasks.spawn(
            ChangeMonitor::new(
                Arc::clone(&registry),
                Arc::clone(&queue),
                Duration::from_millis(self.config.poll.change_interval_ms),
                slice,
                token.clone(),
            )
            .run(),
        );

        tasks.spawn(
            DiscoveryMonitor::new(
                Arc::clone(&resolver),
                Arc::clone(&queue),
                Duration::from_millis(self.config.poll.discovery_interval_ms),
                slice,
                token.clone(),
            )
            .run(),
        );

        for _ in 0..self.config.workers {
            tasks.spawn(
                TailWorker::new(
                    Arc::clone(&self.config),
                    Arc::clone(&queue),
                    Arc::clone(&offsets),
                    Arc::clone(&registry),
                    Arc::clone(&self.decoder),
                    Arc::clone(&self.sink),
                    token.clone(),
                )
                .run(),
            );
        }

        {
            let offsets = Arc::clone(&offsets);
            let interval = Duration::from_secs(self.config.since_db_write_interval);
            let token = token.clone();
            tasks.spawn(async move {
                loop {
                    if !sleep_cancellable(interval, slice, &token).await {
                        break;
                    }
                    offsets.dump();
                }
                tracing::debug!("Checkpoint timer stopped");
            });
        }

        tracing::info!(
            files = files.len(),
            workers = self.config.workers,
            since_db = %self.config.since_db_path.display(),
            "Tailing engine started"
        );

        Ok(EngineHandle {
            token,
            tasks,
            offsets,
            queue,
            registry,
        })
    }
}

/// Handle to a running engine.
pub struct EngineHandle {
    token: CancellationToken,
    tasks: JoinSet<()>,
    offsets: Arc<OffsetStore>,
    queue: Arc<PendingQueue>,
    registry: Arc<ModifiedRegistry>,
}

impl EngineHandle {
    /// Stop the engine gracefully.
    ///
    /// Cancels every loop, waits for in-flight passes to finish, then
    /// writes one final since-db snapshot so a clean stop never loses
    /// checkpointed offsets.
    pub async fn shutdown(mut self) {
        tracing::info!("Stopping tailing engine");
        self.token.cancel();

        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Engine task ended abnormally");
            }
        }

        self.offsets.dump();
        tracing::info!("Tailing engine stopped");
    }

    /// The offset store, for inspection.
    #[must_use]
    pub fn offsets(&self) -> Arc<OffsetStore> {
        Arc::clone(&self.offsets)
    }

    /// The pending queue, for inspection.
    #[must_use]
    pub fn queue(&self) -> Arc<PendingQueue> {
        Arc::clone(&self.queue)
    }

    /// The modified-time registry, for inspection.
    #[must_use]
    pub fn registry(&self) -> Arc<ModifiedRegistry> {
        Arc::clone(&self.registry)
    }

    /// A clone of the engine's cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}
