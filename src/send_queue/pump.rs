//! The single task that drains the send queue into the transport.

use std::{
    fmt,
    sync::{Arc, atomic::Ordering},
};

use leaky_bucket::RateLimiter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Command, Outbound, handle::QueueState};
use crate::{
    metrics::{self, Direction, ErrorKind},
    transport::Transport,
};

/// Consumer side of a send queue.
///
/// Exactly one pump exists per queue because it owns the only receiver. Run
/// it with [`SendPump::run`], either on a spawned task (see
/// [`SendQueueBuilder::spawn`](super::SendQueueBuilder::spawn)) or inline.
pub struct SendPump<T> {
    rx: mpsc::UnboundedReceiver<Command>,
    transport: T,
    limiter: Option<RateLimiter>,
    state: Arc<QueueState>,
    shutdown: CancellationToken,
}

impl<T> fmt::Debug for SendPump<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendPump")
            .field("pending", &self.state.pending.load(Ordering::Acquire))
            .field("paced", &self.limiter.is_some())
            .field("cancelled", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

enum Delivery {
    Finished,
    Cancelled,
}

impl<T: Transport> SendPump<T> {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<Command>,
        transport: T,
        limiter: Option<RateLimiter>,
        state: Arc<QueueState>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            rx,
            transport,
            limiter,
            state,
            shutdown,
        }
    }

    /// Drain the queue until it is closed or the shutdown token fires.
    pub async fn run(mut self) {
        loop {
            let command = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                command = self.rx.recv() => command,
            };
            let Some(Command::Send(outbound)) = command else {
                break;
            };

            self.state.draining.store(true, Ordering::Release);
            if let Delivery::Cancelled = self.deliver(outbound).await {
                break;
            }
            if self.rx.is_empty() {
                self.state.draining.store(false, Ordering::Release);
            }
        }

        self.rx.close();
        self.state.draining.store(false, Ordering::Release);
        let abandoned = self.state.pending.swap(0, Ordering::AcqRel);
        if abandoned > 0 {
            warn!(abandoned, "send pump stopped with packets still queued");
        } else {
            debug!("send pump stopped");
        }
    }

    async fn deliver(&self, outbound: Outbound) -> Delivery {
        let Outbound { batch, lease } = outbound;
        let payload_id = batch.payload_id();
        let fragment_count = batch.len();

        for packet in batch {
            if let Some(limiter) = &self.limiter {
                tokio::select! {
                    biased;
                    () = self.shutdown.cancelled() => return Delivery::Cancelled,
                    () = limiter.acquire_one() => {}
                }
            }

            let fragment_index = packet.header().fragment_index().get();
            match self.transport.send(packet.to_text()).await {
                Ok(()) => {
                    metrics::inc_packets(Direction::Outbound);
                    debug!(
                        payload_id = payload_id.get(),
                        fragment_index, fragment_count, "packet sent"
                    );
                }
                Err(err) => {
                    metrics::inc_errors(ErrorKind::Transport);
                    warn!(
                        payload_id = payload_id.get(),
                        fragment_index,
                        fragment_count,
                        error = %err,
                        "transport rejected packet"
                    );
                }
            }
            self.state.release(1);
        }

        metrics::inc_payloads(Direction::Outbound);
        drop(lease);
        Delivery::Finished
    }
}
