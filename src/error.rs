//! Crate-level error and result types.
//!
//! Each subsystem reports its own error enum. [`Error`] gathers them for
//! callers, such as the `chunkwire` binary, that drive several at once.

use thiserror::Error;

use crate::{
    config::ConfigError,
    fragment::ReassemblyError,
    frame::FrameError,
    receiver::ReceiveError,
    send_queue::SendQueueConfigError,
    sender::SendError,
};

/// Top-level error type exposed by `chunkwire`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    SendQueue(#[from] SendQueueConfigError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Receive(#[from] ReceiveError),
    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// Some packet lines were skipped while joining. Payloads carried by the
    /// other lines were still delivered.
    #[error("{rejected} packet line(s) could not be processed")]
    RejectedPackets { rejected: usize },
    /// Reading or writing local files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Canonical result alias used by `chunkwire` entry points.
pub type Result<T> = std::result::Result<T, Error>;
