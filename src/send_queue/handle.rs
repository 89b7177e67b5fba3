//! Cloneable handle used by producers to enqueue packet batches.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use tokio::sync::mpsc;
use tracing::debug;

use super::{Command, EnqueueError, Outbound};
use crate::fragment::{PacketBatch, PayloadIdLease};

/// Counters shared between handles and the pump.
#[derive(Debug, Default)]
pub(crate) struct QueueState {
    pub(crate) pending: AtomicUsize,
    pub(crate) draining: AtomicBool,
}

impl QueueState {
    /// Take `packets` off the pending count, stopping at zero.
    ///
    /// The pump zeroes the count when it stops, which can race with a
    /// handle backing out of a failed enqueue.
    pub(crate) fn release(&self, packets: usize) {
        let _ = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(packets))
            });
    }
}

/// Cloneable handle used by producers to feed the send pump.
///
/// Enqueueing never waits: batches land on an unbounded channel owned by the
/// single pump task, which is the only place packets leave the queue.
#[derive(Clone, Debug)]
pub struct SendHandle {
    tx: mpsc::UnboundedSender<Command>,
    state: Arc<QueueState>,
}

impl SendHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Command>, state: Arc<QueueState>) -> Self {
        Self { tx, state }
    }

    /// Append `batch` to the queue as one contiguous block.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Closed`] if the pump has stopped.
    pub fn enqueue(&self, batch: PacketBatch) -> Result<(), EnqueueError> {
        self.push(Outbound { batch, lease: None })
    }

    /// Append `batch` and hold `lease` until its last packet has been handed
    /// to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Closed`] if the pump has stopped. The lease is
    /// released immediately in that case.
    pub fn enqueue_leased(
        &self,
        batch: PacketBatch,
        lease: PayloadIdLease,
    ) -> Result<(), EnqueueError> {
        self.push(Outbound {
            batch,
            lease: Some(lease),
        })
    }

    fn push(&self, outbound: Outbound) -> Result<(), EnqueueError> {
        let packets = outbound.batch.len();
        let payload_id = outbound.batch.payload_id();
        self.state.pending.fetch_add(packets, Ordering::AcqRel);
        if self.tx.send(Command::Send(outbound)).is_err() {
            self.state.release(packets);
            return Err(EnqueueError::Closed);
        }
        debug!(payload_id = payload_id.get(), packets, "enqueued payload");
        Ok(())
    }

    /// Ask the pump to stop once everything enqueued so far has been sent.
    pub(crate) fn request_close(&self) -> bool { self.tx.send(Command::Close).is_ok() }

    /// Packets enqueued but not yet handed to the transport.
    #[must_use]
    pub fn pending_packets(&self) -> usize { self.state.pending.load(Ordering::Acquire) }

    /// Whether the pump is currently working through queued packets.
    #[must_use]
    pub fn is_draining(&self) -> bool { self.state.draining.load(Ordering::Acquire) }

    /// Whether the pump has stopped accepting packets.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.tx.is_closed() }
}
