//! Outbound path: frame, lease an id, fragment and enqueue.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::{
    config::{ChunkwireConfig, ConfigError},
    fragment::{FragmentationError, Fragmenter, PayloadId, PayloadIdAllocator, PayloadIdExhausted},
    frame::{FrameError, PayloadFramer},
    send_queue::{EnqueueError, SendHandle},
};

/// Errors returned by [`PayloadSender::send`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    PayloadIdExhausted(#[from] PayloadIdExhausted),
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    #[error(transparent)]
    Enqueue(#[from] EnqueueError),
}

/// Turns `(topic, body)` pairs into paced packets on a [`SendHandle`].
///
/// Each call leases a fresh payload id. The lease travels with the batch and
/// is released once the pump has handed the last packet to the transport.
#[derive(Clone, Debug)]
pub struct PayloadSender {
    framer: PayloadFramer,
    fragmenter: Fragmenter,
    ids: Arc<PayloadIdAllocator>,
    queue: SendHandle,
}

impl PayloadSender {
    /// Create a sender with its own payload id allocator.
    #[must_use]
    pub fn new(framer: PayloadFramer, fragmenter: Fragmenter, queue: SendHandle) -> Self {
        Self {
            framer,
            fragmenter,
            ids: PayloadIdAllocator::new(),
            queue,
        }
    }

    /// Create a sender from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BudgetTooSmall`] if the transport budget cannot
    /// carry a packet.
    pub fn from_config(config: &ChunkwireConfig, queue: SendHandle) -> Result<Self, ConfigError> {
        Ok(Self::new(config.framer(), config.fragmenter()?, queue))
    }

    /// Share `ids` with other senders feeding the same peer.
    #[must_use]
    pub fn with_allocator(mut self, ids: Arc<PayloadIdAllocator>) -> Self {
        self.ids = ids;
        self
    }

    /// Frame, fragment and enqueue `body` under `topic`.
    ///
    /// Returns the payload id carried by every packet of this payload.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Frame`] if the topic is too long,
    /// [`SendError::PayloadIdExhausted`] if every id is still in flight,
    /// [`SendError::Fragmentation`] if the frame needs more than `u16::MAX`
    /// packets and [`SendError::Enqueue`] if the pump has stopped.
    pub fn send(&self, topic: &str, body: &[u8]) -> Result<PayloadId, SendError> {
        let frame = self.framer.frame(topic, body)?;
        let lease = self.ids.allocate()?;
        let payload_id = lease.id();
        let batch = self.fragmenter.fragment(payload_id, &frame)?;
        let fragment_count = batch.len();
        let wire_len = batch.wire_len();
        self.queue.enqueue_leased(batch, lease)?;
        debug!(
            payload_id = payload_id.get(),
            topic,
            frame_len = frame.len(),
            fragment_count,
            wire_len,
            "payload queued"
        );
        Ok(payload_id)
    }

    /// Payload ids currently leased by this sender's allocator.
    #[must_use]
    pub fn in_flight(&self) -> usize { self.ids.in_flight() }

    #[must_use]
    pub fn queue(&self) -> &SendHandle { &self.queue }
}
