//! Stateless DEFLATE compression used by the payload framer.
//!
//! [`CompressionCodec`] wraps raw DEFLATE (no zlib or gzip container) from
//! `flate2`. Compression failures are reported as `None` so callers can fall
//! back to the uncompressed form; decompression failures are hard errors
//! because a frame that claims to be compressed must inflate cleanly.
//! Inflated output is capped at [`CompressionCodec::max_inflated_len`].

use std::io::{self, Read, Write};

use flate2::{Compression, read::DeflateDecoder, write::DeflateEncoder};
use thiserror::Error;
use tracing::debug;

/// Highest DEFLATE level accepted by [`CompressionCodec::new`].
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Level used when none is configured.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Largest body [`CompressionCodec::decompress`] will produce by default.
pub const DEFAULT_MAX_INFLATED_LEN: usize = 64 * 1024 * 1024;

/// Raised when inflating a compressed frame body fails.
#[derive(Debug, Error)]
#[error("failed to decompress {input_len} byte body: {source}")]
pub struct DecompressionFailed {
    /// Length of the compressed input.
    pub input_len: usize,
    #[source]
    source: io::Error,
}

/// Compress and decompress byte sequences with raw DEFLATE.
///
/// # Examples
///
/// ```
/// use chunkwire::compression::CompressionCodec;
///
/// let codec = CompressionCodec::default();
/// let packed = codec.compress(&[0_u8; 256]).expect("compression succeeds");
/// assert!(packed.len() < 256);
/// assert_eq!(codec.decompress(&packed).expect("inflate"), vec![0_u8; 256]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionCodec {
    level: u32,
    max_inflated_len: usize,
}

impl Default for CompressionCodec {
    fn default() -> Self { Self::new(DEFAULT_COMPRESSION_LEVEL) }
}

impl CompressionCodec {
    /// Create a codec with the given DEFLATE level, clamped to
    /// [`MAX_COMPRESSION_LEVEL`].
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(MAX_COMPRESSION_LEVEL),
            max_inflated_len: DEFAULT_MAX_INFLATED_LEN,
        }
    }

    /// Cap the size of decompressed output at `len` bytes.
    #[must_use]
    pub const fn with_max_inflated_len(mut self, len: usize) -> Self {
        self.max_inflated_len = len;
        self
    }

    /// Return the configured compression level.
    #[must_use]
    pub const fn level(&self) -> u32 { self.level }

    /// Largest body [`decompress`](Self::decompress) will return.
    #[must_use]
    pub const fn max_inflated_len(&self) -> usize { self.max_inflated_len }

    /// Compress `input`, returning `None` if the encoder fails.
    #[must_use]
    pub fn compress(&self, input: &[u8]) -> Option<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(
            Vec::with_capacity(input.len() / 2),
            Compression::new(self.level),
        );
        let result = encoder.write_all(input).and_then(|()| encoder.finish());
        match result {
            Ok(compressed) => Some(compressed),
            Err(err) => {
                debug!(input_len = input.len(), error = %err, "compression produced no result");
                None
            }
        }
    }

    /// Inflate `input`.
    ///
    /// # Errors
    ///
    /// Returns [`DecompressionFailed`] if `input` is not a valid DEFLATE
    /// stream or inflates to more than
    /// [`max_inflated_len`](Self::max_inflated_len) bytes.
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, DecompressionFailed> {
        let limit = self.max_inflated_len;
        // One byte past the limit is enough to detect an oversized body.
        let read_cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
        let mut decoder = DeflateDecoder::new(input).take(read_cap);
        let mut output = Vec::with_capacity(input.len().saturating_mul(2).min(limit));
        let failed = |source: io::Error| DecompressionFailed {
            input_len: input.len(),
            source,
        };
        decoder.read_to_end(&mut output).map_err(failed)?;
        if output.len() > limit {
            return Err(failed(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("inflated body exceeds {limit} bytes"),
            )));
        }
        Ok(output)
    }
}
