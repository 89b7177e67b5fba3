//! Errors raised while framing and unframing payloads.

use std::str::Utf8Error;

use thiserror::Error;

use crate::compression::DecompressionFailed;

/// Structural problems found while parsing a frame.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MalformedFrame {
    /// The frame contained no bytes at all.
    #[error("frame is empty")]
    Empty,
    /// The format tag is not one of the known values.
    #[error("unknown format tag {0:#04x}")]
    UnknownFormat(u8),
    /// The frame ended before the two-byte topic length.
    #[error("frame ends before the topic length prefix")]
    MissingTopicLength,
    /// The topic length prefix points past the end of the frame.
    #[error("topic declares {declared} bytes but only {available} remain")]
    TruncatedTopic { declared: usize, available: usize },
    /// The topic bytes are not valid UTF-8.
    #[error("topic is not valid UTF-8: {0}")]
    InvalidTopic(#[from] Utf8Error),
}

/// Errors produced by [`PayloadFramer`](crate::frame::PayloadFramer).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FrameError {
    /// The topic cannot be described by the two-byte length prefix.
    #[error("topic is {len} bytes; the limit is {max}", max = u16::MAX)]
    TopicTooLong { len: usize },
    /// The frame bytes do not follow the frame layout.
    #[error("malformed frame: {0}")]
    Malformed(#[from] MalformedFrame),
    /// The frame is tagged as compressed but could not be inflated.
    #[error(transparent)]
    DecompressionFailed(#[from] DecompressionFailed),
}
