//! Builder for configuring a send queue.

use std::{sync::Arc, time::Duration};

use leaky_bucket::RateLimiter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{
    DEFAULT_SEND_INTERVAL,
    SendHandle,
    SendPump,
    SendQueue,
    SendQueueConfigError,
    handle::QueueState,
};
use crate::transport::Transport;

/// Builder for [`SendQueue`].
///
/// By default the pump waits [`DEFAULT_SEND_INTERVAL`] between consecutive
/// transport calls. Pass `None` to [`interval`](Self::interval) to send as
/// fast as the transport accepts packets.
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use async_trait::async_trait;
/// use chunkwire::{
///     send_queue::SendQueue,
///     transport::{Transport, TransportError},
/// };
///
/// struct Discard;
///
/// #[async_trait]
/// impl Transport for Discard {
///     async fn send(&self, _message: String) -> Result<(), TransportError> { Ok(()) }
/// }
///
/// # async fn demo() {
/// let queue = SendQueue::builder()
///     .interval(Some(Duration::from_millis(50)))
///     .spawn(Discard)
///     .expect("valid interval");
/// queue.close().await;
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SendQueueBuilder {
    interval: Option<Duration>,
    shutdown: Option<CancellationToken>,
}

impl Default for SendQueueBuilder {
    fn default() -> Self {
        Self {
            interval: Some(DEFAULT_SEND_INTERVAL),
            shutdown: None,
        }
    }
}

impl SendQueueBuilder {
    /// Set the minimum spacing between transport calls.
    #[must_use]
    pub fn interval(mut self, interval: Option<Duration>) -> Self {
        self.interval = interval;
        self
    }

    /// Tie the pump to an external shutdown token.
    ///
    /// Cancelling the token stops the pump without draining.
    #[must_use]
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    /// Build the handle and the pump without spawning anything.
    ///
    /// # Errors
    ///
    /// Returns [`SendQueueConfigError::ZeroInterval`] if the interval is zero.
    pub fn build<T: Transport>(
        self,
        transport: T,
    ) -> Result<(SendHandle, SendPump<T>), SendQueueConfigError> {
        let (handle, pump, _) = self.assemble(transport)?;
        Ok((handle, pump))
    }

    /// Build the queue and spawn its pump on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SendQueueConfigError::ZeroInterval`] if the interval is zero.
    pub fn spawn<T: Transport>(self, transport: T) -> Result<SendQueue, SendQueueConfigError> {
        let (handle, pump, shutdown) = self.assemble(transport)?;
        let task = tokio::spawn(pump.run());
        Ok(SendQueue {
            handle,
            shutdown,
            task,
        })
    }

    fn assemble<T: Transport>(
        self,
        transport: T,
    ) -> Result<(SendHandle, SendPump<T>, CancellationToken), SendQueueConfigError> {
        if self.interval.is_some_and(|interval| interval.is_zero()) {
            return Err(SendQueueConfigError::ZeroInterval);
        }
        let limiter = self.interval.map(|interval| {
            RateLimiter::builder()
                .initial(1)
                .refill(1)
                .interval(interval)
                .max(1)
                .build()
        });
        let shutdown = self.shutdown.unwrap_or_default();
        let state = Arc::new(QueueState::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SendHandle::new(tx, Arc::clone(&state));
        let pump = SendPump::new(rx, transport, limiter, state, shutdown.clone());
        Ok((handle, pump, shutdown))
    }
}
