//! Error types for send queue operations and configuration.

use thiserror::Error;

/// Errors that can occur when enqueueing a batch.
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    /// The pump has stopped and no longer accepts packets.
    #[error("send queue closed")]
    Closed,
}

/// Errors returned when building a send queue.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendQueueConfigError {
    /// The inter-send interval was zero; use `None` to disable throttling.
    #[error("send interval must be non-zero; disable throttling instead")]
    ZeroInterval,
}
