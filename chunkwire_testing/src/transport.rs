//! In-memory [`Transport`] implementations.

use std::sync::{
    Arc,
    Mutex,
    PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chunkwire::transport::{Transport, TransportError};
use tokio::{sync::mpsc, time::Instant};

/// One call observed by [`RecordingTransport`].
#[derive(Clone, Debug)]
pub struct SentMessage {
    pub at: Instant,
    pub text: String,
}

/// Records every message with the Tokio clock reading at the time of the call.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingTransport {
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Just the message texts, in call order.
    #[must_use]
    pub fn texts(&self) -> Vec<String> { self.sent().into_iter().map(|m| m.text).collect() }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, message: String) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                at: Instant::now(),
                text: message,
            });
        Ok(())
    }
}

/// Rejects the first `failures` calls, then records like
/// [`RecordingTransport`].
#[derive(Clone, Debug)]
pub struct FailingTransport {
    remaining: Arc<AtomicUsize>,
    inner: RecordingTransport,
}

impl FailingTransport {
    #[must_use]
    pub fn new(failures: usize) -> Self {
        Self {
            remaining: Arc::new(AtomicUsize::new(failures)),
            inner: RecordingTransport::default(),
        }
    }

    /// A transport that never accepts a message.
    #[must_use]
    pub fn always() -> Self { Self::new(usize::MAX) }

    #[must_use]
    pub fn delivered(&self) -> Vec<String> { self.inner.texts() }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn send(&self, message: String) -> Result<(), TransportError> {
        let failed = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(TransportError::new("simulated transport failure"));
        }
        self.inner.send(message).await
    }
}

/// Forwards every message to a channel, linking a sender to a receiver.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, message: String) -> Result<(), TransportError> {
        self.tx
            .send(message)
            .map_err(|_| TransportError::new("peer hung up"))
    }
}
