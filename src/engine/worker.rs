//! Tail worker: drains the pending queue one read pass at a time.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{StartPosition, TailConfig};
use crate::decode::RecordDecoder;
use crate::sink::EventSink;

use super::queue::PendingQueue;
use super::reader::RecordReader;
use super::registry::ModifiedRegistry;
use super::sincedb::OffsetStore;

/// Dequeues paths and runs read passes against them.
///
/// A pass resumes from the checkpointed offset (or the configured start
/// position for a never-seen file), emits each complete record through
/// the decoder to the sink, and checkpoints the offset every N records
/// plus once at the end. One bad file never halts tailing of others.
pub struct TailWorker {
    config: Arc<TailConfig>,
    queue: Arc<PendingQueue>,
    offsets: Arc<OffsetStore>,
    registry: Arc<ModifiedRegistry>,
    decoder: Arc<dyn RecordDecoder>,
    sink: Arc<dyn EventSink>,
    token: CancellationToken,
}

impl TailWorker {
    /// Create a tail worker.
    #[must_use]
    pub fn new(
        config: Arc<TailConfig>,
        queue: Arc<PendingQueue>,
        offsets: Arc<OffsetStore>,
        registry: Arc<ModifiedRegistry>,
        decoder: Arc<dyn RecordDecoder>,
        sink: Arc<dyn EventSink>,
        token: CancellationToken,
    ) -> Self {
        Self {
            config,
            queue,
            offsets,
            registry,
            decoder,
            sink,
            token,
        }
    }

    /// Drain the queue until cancelled.
    ///
    /// The timed dequeue keeps the loop responsive to cancellation even
    /// when the queue stays empty.
    pub async fn run(self) {
        let timeout = Duration::from_millis(self.config.poll.dequeue_timeout_ms);

        while !self.token.is_cancelled() {
            let Some(path) = self.queue.pop(timeout, &self.token).await else {
                continue;
            };

            if let Err(e) = self.read_pass(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Read pass failed");
            }
            self.queue.complete(&path);
        }

        tracing::debug!("Tail worker stopped");
    }

    /// Run one read pass against a single file.
    async fn read_pass(&self, path: &Path) -> std::io::Result<()> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // The monitors will re-discover the file if it returns.
                tracing::warn!(path = %path.display(), "File no longer exists, skipping pass");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        // Captured before reading: a write landing mid-pass keeps the
        // live mtime ahead of this value, so the change monitor will
        // queue the file again.
        let mtime = metadata.modified()?;
        let file_len = metadata.len();

        let start = match self.offsets.get(path) {
            Some(offset) => {
                if offset > file_len {
                    tracing::warn!(
                        path = %path.display(),
                        offset,
                        file_len,
                        "File shrank below its checkpoint, no records to read"
                    );
                }
                offset
            }
            None => match self.config.start_position {
                StartPosition::Beginning => 0,
                StartPosition::End => file_len,
            },
        };

        let mut reader = RecordReader::open(path, start, self.config.delimiter_byte()).await?;
        let checkpoint_every = self.config.checkpoint_every_records.max(1);
        let mut consumed = 0usize;

        while let Some(record) = reader.next_record().await? {
            consumed += 1;

            match self.decoder.decode(&record) {
                Ok(Some(event)) if !event.is_empty() => {
                    if let Err(e) = self.sink.deliver(event).await {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to deliver event"
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to decode record"
                    );
                }
            }

            if consumed % checkpoint_every == 0 {
                self.offsets.set(path, reader.offset());
            }
        }

        self.offsets.set(path, reader.offset());
        self.registry.record(path, mtime);

        tracing::debug!(
            path = %path.display(),
            records = consumed,
            offset = reader.offset(),
            "Read pass complete"
        );
        Ok(())
    }
}
