//! Five-byte header carried at the front of every packet.
//!
//! Layout: `[payload id: u8][fragment index: u16 LE][fragment count: u16 LE]`.
//! The header is encoded with `bincode` using fixed-width little-endian
//! integers, which yields exactly the wire layout above.

use bincode::{
    Decode,
    Encode,
    config::{self, Configuration, Fixint, LittleEndian, NoLimit},
    decode_from_slice,
    encode_into_slice,
    error::EncodeError,
};
use static_assertions::const_assert_eq;

use super::{FragmentIndex, PacketError, PayloadId};

/// Encoded size of [`PacketHeader`].
pub const PACKET_HEADER_LEN: usize = 5;

const_assert_eq!(
    PACKET_HEADER_LEN,
    std::mem::size_of::<u8>() + 2 * std::mem::size_of::<u16>()
);

type WireConfig = Configuration<LittleEndian, Fixint, NoLimit>;

const fn wire_config() -> WireConfig {
    config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

#[derive(Encode, Decode)]
struct WireHeader {
    payload_id: u8,
    fragment_index: u16,
    fragment_count: u16,
}

/// Header describing a single packet.
///
/// # Examples
///
/// ```
/// use chunkwire::fragment::{FragmentIndex, PacketHeader, PayloadId};
///
/// let id = PayloadId::new(7).expect("not reserved");
/// let header = PacketHeader::new(id, FragmentIndex::new(1), 3).expect("index < count");
/// assert_eq!(header.encode().expect("encode"), [7, 1, 0, 3, 0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PacketHeader {
    payload_id: PayloadId,
    fragment_index: FragmentIndex,
    fragment_count: u16,
}

impl PacketHeader {
    /// Create a header, validating that `fragment_index < fragment_count`.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::ZeroFragmentCount`] or
    /// [`PacketError::IndexOutOfRange`] for inconsistent positions.
    pub fn new(
        payload_id: PayloadId,
        fragment_index: FragmentIndex,
        fragment_count: u16,
    ) -> Result<Self, PacketError> {
        if fragment_count == 0 {
            return Err(PacketError::ZeroFragmentCount { payload_id });
        }
        if fragment_index.get() >= fragment_count {
            return Err(PacketError::IndexOutOfRange {
                payload_id,
                index: fragment_index,
                count: fragment_count,
            });
        }
        Ok(Self {
            payload_id,
            fragment_index,
            fragment_count,
        })
    }

    /// Identifier of the payload this packet belongs to.
    #[must_use]
    pub const fn payload_id(&self) -> PayloadId { self.payload_id }

    /// Position of this packet within its payload.
    #[must_use]
    pub const fn fragment_index(&self) -> FragmentIndex { self.fragment_index }

    /// Total number of packets making up the payload.
    #[must_use]
    pub const fn fragment_count(&self) -> u16 { self.fragment_count }

    /// Whether this packet carries the final fragment.
    #[must_use]
    pub const fn is_last_fragment(&self) -> bool {
        self.fragment_index.get() + 1 == self.fragment_count
    }

    /// Encode the header into its wire form.
    ///
    /// # Errors
    ///
    /// Returns any [`EncodeError`] raised by `bincode`.
    pub fn encode(&self) -> Result<[u8; PACKET_HEADER_LEN], EncodeError> {
        let wire = WireHeader {
            payload_id: self.payload_id.get(),
            fragment_index: self.fragment_index.get(),
            fragment_count: self.fragment_count,
        };
        let mut buf = [0_u8; PACKET_HEADER_LEN];
        let written = encode_into_slice(wire, &mut buf, wire_config())?;
        debug_assert_eq!(written, PACKET_HEADER_LEN, "header must encode to fixed width");
        Ok(buf)
    }

    /// Parse a header from the front of `bytes`, returning the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::TooShort`] if fewer than
    /// [`PACKET_HEADER_LEN`] bytes are supplied, and a validation error if the
    /// header carries the reserved payload id or an inconsistent position.
    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), PacketError> {
        if bytes.len() < PACKET_HEADER_LEN {
            return Err(PacketError::TooShort { len: bytes.len() });
        }
        let (head, rest) = bytes.split_at(PACKET_HEADER_LEN);
        let (wire, _): (WireHeader, usize) = decode_from_slice(head, wire_config())?;
        let payload_id = PayloadId::try_from(wire.payload_id)?;
        let header = Self::new(
            payload_id,
            FragmentIndex::new(wire.fragment_index),
            wire.fragment_count,
        )?;
        Ok((header, rest))
    }
}
