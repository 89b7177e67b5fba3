//! Outbound helper that splits frames into transport packets.
//!
//! [`Fragmenter`] chunks a frame into slices of at most
//! `max_fragment_payload` bytes and tags each slice with a [`PacketHeader`]
//! naming the payload id, the slice position and the total slice count.

use std::num::NonZeroUsize;

use super::{
    FragmentIndex,
    FragmentationConfig,
    FragmentationError,
    Packet,
    PacketHeader,
    PayloadId,
};

/// Splits frames into packet-sized fragments.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use chunkwire::fragment::{Fragmenter, PayloadId};
///
/// let fragmenter = Fragmenter::new(NonZeroUsize::new(4).expect("non-zero"));
/// let id = PayloadId::new(1).expect("not reserved");
/// let batch = fragmenter.fragment(id, b"abcdefghij").expect("fragment");
/// assert_eq!(batch.len(), 3);
/// assert_eq!(batch.packets()[2].data(), b"ij");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragmenter {
    max_fragment_payload: NonZeroUsize,
}

impl Fragmenter {
    /// Create a fragmenter that caps fragment data at `max_fragment_payload`
    /// bytes.
    #[must_use]
    pub const fn new(max_fragment_payload: NonZeroUsize) -> Self {
        Self {
            max_fragment_payload,
        }
    }

    /// Create a fragmenter from a derived [`FragmentationConfig`].
    #[must_use]
    pub const fn from_config(config: &FragmentationConfig) -> Self {
        Self::new(config.max_fragment_payload())
    }

    /// Return the maximum fragment data size in bytes.
    #[must_use]
    pub const fn max_fragment_payload(&self) -> NonZeroUsize { self.max_fragment_payload }

    /// Number of fragments required for `data_len` bytes.
    ///
    /// Empty input still needs one (empty) fragment.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::TooManyFragments`] when the count does not
    /// fit in a `u16`.
    pub fn fragment_count(&self, data_len: usize) -> Result<u16, FragmentationError> {
        let max = self.max_fragment_payload.get();
        let count = data_len.div_ceil(max).max(1);
        u16::try_from(count).map_err(|_| FragmentationError::TooManyFragments {
            data_len,
            max_fragment_payload: max,
        })
    }

    /// Split `data` into packets tagged with `payload_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::TooManyFragments`] if more than
    /// `u16::MAX` fragments are required and [`FragmentationError::Encode`] if
    /// a header cannot be encoded.
    pub fn fragment(
        &self,
        payload_id: PayloadId,
        data: impl AsRef<[u8]>,
    ) -> Result<PacketBatch, FragmentationError> {
        let data = data.as_ref();
        let count = self.fragment_count(data.len())?;
        let max = self.max_fragment_payload.get();

        let mut packets = Vec::with_capacity(usize::from(count));
        let mut index = FragmentIndex::zero();
        let mut offset = 0usize;
        loop {
            let end = (offset + max).min(data.len());
            let header = PacketHeader::new(payload_id, index, count)?;
            packets.push(Packet::new(header, &data[offset..end])?);

            if header.is_last_fragment() {
                break;
            }
            offset = end;
            index = index
                .checked_increment()
                .ok_or(FragmentationError::TooManyFragments {
                    data_len: data.len(),
                    max_fragment_payload: max,
                })?;
        }

        Ok(PacketBatch::new(payload_id, packets))
    }
}

/// Packets produced for a single payload, in fragment-index order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacketBatch {
    payload_id: PayloadId,
    packets: Vec<Packet>,
}

impl PacketBatch {
    fn new(payload_id: PayloadId, packets: Vec<Packet>) -> Self {
        debug_assert!(!packets.is_empty(), "packet batches must not be empty");
        Self {
            payload_id,
            packets,
        }
    }

    /// Return the [`PayloadId`] shared by all packets.
    #[must_use]
    pub const fn payload_id(&self) -> PayloadId { self.payload_id }

    /// Return the packets as a slice.
    #[must_use]
    pub fn packets(&self) -> &[Packet] { self.packets.as_slice() }

    /// Number of packets in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.packets.len() }

    /// Whether the payload required more than one packet.
    #[must_use]
    pub fn is_fragmented(&self) -> bool { self.len() > 1 }

    /// Total bytes on the wire before text encoding.
    #[must_use]
    pub fn wire_len(&self) -> usize { self.packets.iter().map(|p| p.as_bytes().len()).sum() }

    /// Consume the batch, returning all packets.
    #[must_use]
    pub fn into_packets(self) -> Vec<Packet> { self.packets }
}

impl IntoIterator for PacketBatch {
    type Item = Packet;
    type IntoIter = std::vec::IntoIter<Packet>;

    fn into_iter(self) -> Self::IntoIter { self.packets.into_iter() }
}
