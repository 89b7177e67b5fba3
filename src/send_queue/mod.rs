//! Paced outbound packet queue.
//!
//! Producers append whole [`PacketBatch`]es through a [`SendHandle`]. A single
//! [`SendPump`] removes packets from the head and hands them to the
//! [`Transport`](crate::transport::Transport), waiting at least the configured
//! interval between calls. Batches are contiguous on the wire: the pump never
//! interleaves packets from different payloads, and packets leave in the order
//! they were enqueued.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::fragment::{PacketBatch, PayloadIdLease};

mod builder;
mod errors;
mod handle;
mod pump;

pub use builder::SendQueueBuilder;
pub use errors::{EnqueueError, SendQueueConfigError};
pub use handle::SendHandle;
pub use pump::SendPump;

/// Spacing between transport calls used when none is configured.
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_millis(30);

pub(crate) struct Outbound {
    pub(crate) batch: PacketBatch,
    pub(crate) lease: Option<PayloadIdLease>,
}

pub(crate) enum Command {
    Send(Outbound),
    Close,
}

/// A send queue whose pump runs on a spawned Tokio task.
#[derive(Debug)]
pub struct SendQueue {
    handle: SendHandle,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SendQueue {
    /// Start configuring a new queue.
    #[must_use]
    pub fn builder() -> SendQueueBuilder { SendQueueBuilder::default() }

    /// Producer handle for this queue.
    #[must_use]
    pub fn handle(&self) -> SendHandle { self.handle.clone() }

    /// Send every batch enqueued before this call, then stop the pump and
    /// wait for it to finish.
    pub async fn close(self) {
        self.handle.request_close();
        if let Err(err) = self.task.await {
            error!(error = %err, "send pump task failed");
        }
    }

    /// Stop the pump immediately, dropping anything still queued.
    pub async fn abort(self) {
        self.shutdown.cancel();
        if let Err(err) = self.task.await {
            error!(error = %err, "send pump task failed");
        }
    }
}
