//! Boundary to the underlying message transport.
//!
//! The transport moves one text argument per call from sender to receiver.
//! It is assumed reliable and ordered; `chunkwire` only needs a way to hand it
//! encoded packets.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a [`Transport`] for a single call.
#[derive(Debug, Error)]
#[error("transport call failed: {message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create an error carrying a description of the failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outbound half of the remote-command channel.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use chunkwire::transport::{Transport, TransportError};
///
/// struct Stdout;
///
/// #[async_trait]
/// impl Transport for Stdout {
///     async fn send(&self, message: String) -> Result<(), TransportError> {
///         println!("{message}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Deliver one encoded packet.
    async fn send(&self, message: String) -> Result<(), TransportError>;
}
