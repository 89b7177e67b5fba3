//! Bounded-size packets: a [`PacketHeader`] followed by fragment bytes.
//!
//! A [`Packet`] keeps its complete wire image so the send pump only has to
//! apply the text encoding, and the receive side can slice fragment data out
//! without copying.

use bytes::{BufMut, Bytes, BytesMut};

use super::{FragmentationError, PACKET_HEADER_LEN, PacketError, PacketHeader};
use crate::text;

/// One unit placed on the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    header: PacketHeader,
    wire: Bytes,
}

impl Packet {
    /// Build a packet from a header and its fragment bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::Encode`] if the header cannot be encoded.
    pub fn new(header: PacketHeader, data: &[u8]) -> Result<Self, FragmentationError> {
        let mut wire = BytesMut::with_capacity(PACKET_HEADER_LEN + data.len());
        wire.put_slice(&header.encode()?);
        wire.put_slice(data);
        Ok(Self {
            header,
            wire: wire.freeze(),
        })
    }

    /// Parse a packet from its wire bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`PacketError`] when the bytes are too short for a header or
    /// the header is invalid.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, PacketError> {
        let wire = bytes.into();
        let (header, _) = PacketHeader::decode(&wire)?;
        Ok(Self { header, wire })
    }

    /// Parse a packet from transport text.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::Text`] for invalid base64 and any error from
    /// [`Packet::from_bytes`].
    pub fn from_text(encoded: &str) -> Result<Self, PacketError> {
        Self::from_bytes(text::decode(encoded)?)
    }

    /// The packet header.
    #[must_use]
    pub const fn header(&self) -> &PacketHeader { &self.header }

    /// Fragment bytes following the header.
    #[must_use]
    pub fn data(&self) -> &[u8] { &self.wire[PACKET_HEADER_LEN..] }

    /// Complete wire image, header included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.wire }

    /// Encode the wire image as transport text.
    #[must_use]
    pub fn to_text(&self) -> String { text::encode(&self.wire) }

    /// Consume the packet, returning the header and a zero-copy view of the
    /// fragment bytes.
    #[must_use]
    pub fn into_parts(self) -> (PacketHeader, Bytes) {
        let data = self.wire.slice(PACKET_HEADER_LEN..);
        (self.header, data)
    }
}
