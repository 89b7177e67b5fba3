//! Metric helpers for `chunkwire`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking packets sent or received.
pub const PACKETS_PROCESSED: &str = "chunkwire_packets_processed_total";
/// Name of the counter tracking payloads enqueued or dispatched.
pub const PAYLOADS_PROCESSED: &str = "chunkwire_payloads_processed_total";
/// Name of the counter tracking error occurrences.
pub const ERRORS_TOTAL: &str = "chunkwire_errors_total";
/// Name of the counter tracking evicted partial payloads.
pub const BUFFERS_EVICTED: &str = "chunkwire_buffers_evicted_total";

/// Direction of processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Packets or payloads arriving from a peer.
    Inbound,
    /// Packets or payloads leaving for a peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(
        not(feature = "metrics"),
        expect(dead_code, reason = "labels need the metrics feature")
    )]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Category recorded in the `kind` label of [`ERRORS_TOTAL`].
#[derive(Clone, Copy, Debug)]
pub enum ErrorKind {
    /// A packet could not be parsed.
    MalformedPacket,
    /// A reassembled frame could not be parsed.
    MalformedFrame,
    /// A compressed frame body failed to inflate.
    Decompression,
    /// A packet disagreed with the open buffer for its payload id.
    CountMismatch,
    /// The transport rejected a packet.
    Transport,
}

impl ErrorKind {
    #[cfg_attr(
        not(feature = "metrics"),
        expect(dead_code, reason = "labels need the metrics feature")
    )]
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedPacket => "malformed_packet",
            ErrorKind::MalformedFrame => "malformed_frame",
            ErrorKind::Decompression => "decompression",
            ErrorKind::CountMismatch => "count_mismatch",
            ErrorKind::Transport => "transport",
        }
    }
}

/// Record a processed packet for the given direction.
pub fn inc_packets(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(PACKETS_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a processed payload for the given direction.
pub fn inc_payloads(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(PAYLOADS_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an error occurrence.
pub fn inc_errors(kind: ErrorKind) {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL, "kind" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record an evicted partial payload.
pub fn inc_evictions() {
    #[cfg(feature = "metrics")]
    counter!(BUFFERS_EVICTED).increment(1);
}
