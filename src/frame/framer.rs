//! Wrap `(topic, body)` pairs into self-describing frames.
//!
//! The frame layout is:
//! `[1 byte format][u16 LE topic length][topic UTF-8][content bytes]`.
//! Content is the DEFLATE-compressed body when that is strictly shorter than
//! the body itself, otherwise the body verbatim.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use super::{FrameError, FrameFormat, MalformedFrame};
use crate::{
    byte_order::{split_le_u16, write_le_u16},
    compression::CompressionCodec,
};

/// Bytes taken by the format tag and topic length prefix.
pub const FRAME_PREAMBLE_LEN: usize = 1 + std::mem::size_of::<u16>();

/// Frame contents recovered by [`PayloadFramer::unframe`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnframedPayload {
    format: FrameFormat,
    topic: String,
    body: Bytes,
}

impl UnframedPayload {
    /// Format the frame was encoded with.
    #[must_use]
    pub const fn format(&self) -> FrameFormat { self.format }

    /// Topic the payload was sent under.
    #[must_use]
    pub fn topic(&self) -> &str { &self.topic }

    /// Original, uncompressed body.
    #[must_use]
    pub fn body(&self) -> &[u8] { &self.body }

    /// Consume the payload, returning the topic and body.
    #[must_use]
    pub fn into_parts(self) -> (String, Bytes) { (self.topic, self.body) }
}

/// Encodes and decodes frames, optionally compressing the body.
///
/// # Examples
///
/// ```
/// use chunkwire::frame::{FrameFormat, PayloadFramer};
///
/// let framer = PayloadFramer::default();
/// let frame = framer.frame("greeting", &[0_u8; 512]).expect("topic fits");
/// let payload = framer.unframe(&frame).expect("well formed");
/// assert_eq!(payload.format(), FrameFormat::CompressedDeflate);
/// assert_eq!(payload.topic(), "greeting");
/// assert_eq!(payload.body(), &[0_u8; 512][..]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayloadFramer {
    codec: CompressionCodec,
    compress: bool,
}

impl Default for PayloadFramer {
    fn default() -> Self { Self::new(CompressionCodec::default()) }
}

impl PayloadFramer {
    /// Create a framer that attempts compression with `codec`.
    #[must_use]
    pub const fn new(codec: CompressionCodec) -> Self {
        Self {
            codec,
            compress: true,
        }
    }

    /// Create a framer that always writes [`FrameFormat::Raw`] frames.
    ///
    /// Such a framer still unframes compressed frames from other peers.
    #[must_use]
    pub fn uncompressed() -> Self {
        Self {
            codec: CompressionCodec::default(),
            compress: false,
        }
    }

    /// Enable or disable compression of outbound bodies. Compressed frames
    /// are still unframed either way.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Whether [`frame`](Self::frame) attempts compression.
    #[must_use]
    pub const fn compresses(&self) -> bool { self.compress }

    /// Frame `body` under `topic`.
    ///
    /// A compression failure is not an error: the frame falls back to
    /// [`FrameFormat::Raw`].
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TopicTooLong`] if the topic's UTF-8 encoding is
    /// longer than `u16::MAX` bytes.
    pub fn frame(&self, topic: &str, body: &[u8]) -> Result<Bytes, FrameError> {
        let topic_len =
            u16::try_from(topic.len()).map_err(|_| FrameError::TopicTooLong { len: topic.len() })?;

        let compressed = if self.compress {
            self.codec
                .compress(body)
                .filter(|packed| packed.len() < body.len())
        } else {
            None
        };
        let (format, content) = match compressed.as_deref() {
            Some(packed) => (FrameFormat::CompressedDeflate, packed),
            None => (FrameFormat::Raw, body),
        };

        let mut buf = BytesMut::with_capacity(FRAME_PREAMBLE_LEN + topic.len() + content.len());
        buf.put_u8(format.tag());
        buf.put_slice(&write_le_u16(topic_len));
        buf.put_slice(topic.as_bytes());
        buf.put_slice(content);

        debug!(
            topic,
            %format,
            body_len = body.len(),
            frame_len = buf.len(),
            "framed payload"
        );
        Ok(buf.freeze())
    }

    /// Parse `frame`, inflating the body if required.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Malformed`] if the tag is unknown or the topic is
    /// truncated or not UTF-8, and [`FrameError::DecompressionFailed`] if a
    /// compressed body cannot be inflated.
    pub fn unframe(&self, frame: &[u8]) -> Result<UnframedPayload, FrameError> {
        let (&tag, rest) = frame.split_first().ok_or(MalformedFrame::Empty)?;
        let format = FrameFormat::try_from(tag)?;
        let (topic_len, rest) = split_le_u16(rest).ok_or(MalformedFrame::MissingTopicLength)?;
        let topic_len = usize::from(topic_len);
        if rest.len() < topic_len {
            return Err(MalformedFrame::TruncatedTopic {
                declared: topic_len,
                available: rest.len(),
            }
            .into());
        }
        let (topic, content) = rest.split_at(topic_len);
        let topic = std::str::from_utf8(topic).map_err(MalformedFrame::from)?;

        let body = match format {
            FrameFormat::Raw => Bytes::copy_from_slice(content),
            FrameFormat::CompressedDeflate => Bytes::from(self.codec.decompress(content)?),
        };

        Ok(UnframedPayload {
            format,
            topic: topic.to_owned(),
            body,
        })
    }
}
