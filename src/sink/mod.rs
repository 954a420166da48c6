//! Event sinks.
//!
//! A sink accepts decoded events one at a time. Back-pressure is the
//! sink's own concern; the bundled channel sink accepts unboundedly.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::decode::Event;

/// Errors produced while delivering an event.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    /// The downstream consumer is gone.
    #[error("Sink channel closed")]
    Closed,
}

/// Accepts one structured event at a time.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event downstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be accepted.
    async fn deliver(&self, event: Event) -> Result<(), SinkError>;
}

/// Sink backed by an unbounded in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn deliver(&self, event: Event) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Closed)
    }
}
