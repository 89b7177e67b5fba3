//! Format tag written as the first byte of every frame.

use derive_more::Display;

use super::MalformedFrame;

/// Encoding applied to a frame's content.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameFormat {
    /// Content is the body verbatim.
    #[display("raw")]
    Raw = 0x00,
    /// Content is the body compressed with raw DEFLATE.
    #[display("deflate")]
    CompressedDeflate = 0x01,
}

impl FrameFormat {
    /// Return the on-wire tag byte.
    #[must_use]
    pub const fn tag(self) -> u8 { self as u8 }
}

impl TryFrom<u8> for FrameFormat {
    type Error = MalformedFrame;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0x00 => Ok(Self::Raw),
            0x01 => Ok(Self::CompressedDeflate),
            other => Err(MalformedFrame::UnknownFormat(other)),
        }
    }
}

impl From<FrameFormat> for u8 {
    fn from(format: FrameFormat) -> Self { format.tag() }
}
