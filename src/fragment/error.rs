//! Error types emitted by the fragmentation layer.
//!
//! Packet-level errors never touch reassembly state; reassembly errors name
//! the single payload whose buffer was discarded.

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

use super::{FragmentIndex, PayloadId, ReservedPayloadId};

/// Reasons a packet could not be parsed. Every variant is a malformed packet.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PacketError {
    /// The transport text was not valid base64.
    #[error("packet text is not valid base64: {0}")]
    Text(#[from] base64::DecodeError),
    /// Fewer bytes than a packet header.
    #[error("packet is {len} bytes; a header needs {}", super::PACKET_HEADER_LEN)]
    TooShort { len: usize },
    /// The header bytes could not be decoded.
    #[error("failed to decode packet header: {0}")]
    Header(#[from] DecodeError),
    /// The header used the reserved payload id.
    #[error(transparent)]
    ReservedPayloadId(#[from] ReservedPayloadId),
    /// The header declared a payload of zero fragments.
    #[error("payload {payload_id} declares zero fragments")]
    ZeroFragmentCount { payload_id: PayloadId },
    /// The fragment index does not fall inside `0..count`.
    #[error("payload {payload_id} fragment {index} is outside 0..{count}")]
    IndexOutOfRange {
        payload_id: PayloadId,
        index: FragmentIndex,
        count: u16,
    },
}

/// Errors produced while fragmenting outbound frames.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FragmentationError {
    /// Header encoding failed.
    #[error("failed to encode packet header: {0}")]
    Encode(#[from] EncodeError),
    /// The frame needs more fragments than a 16-bit count can describe.
    #[error(
        "{data_len} bytes need more than {max} fragments of {max_fragment_payload} bytes",
        max = u16::MAX
    )]
    TooManyFragments {
        data_len: usize,
        max_fragment_payload: usize,
    },
    /// Header construction rejected the computed position.
    #[error(transparent)]
    Packet(#[from] PacketError),
}

/// Errors produced by [`ReassemblyStore`](crate::fragment::ReassemblyStore).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReassemblyError {
    /// The packet could not be parsed; no buffer was touched.
    #[error("malformed packet: {0}")]
    MalformedPacket(#[from] PacketError),
    /// The packet disagrees with the buffer already open for its payload id.
    /// The buffer is discarded.
    #[error("payload {payload_id} expected {expected} fragments but a packet declared {found}")]
    CountMismatch {
        payload_id: PayloadId,
        expected: u16,
        found: u16,
    },
}
