//! Helpers for explicit little-endian conversions.
//!
//! Packet headers and topic prefixes are little-endian on the wire. These
//! helpers keep Clippy expectations scoped to the conversion points so
//! protocol code can remain explicit about wire endianness without repeating
//! lint annotations.

/// Serialise a `u16` in little-endian byte order.
///
/// # Examples
///
/// ```
/// use chunkwire::byte_order::write_le_u16;
///
/// assert_eq!(write_le_u16(0x1234), [0x34, 0x12]);
/// ```
#[must_use]
pub fn write_le_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "The wire format stores multi-byte integers little-endian."
    )]
    value.to_le_bytes()
}

/// Parse a little-endian `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use chunkwire::byte_order::read_le_u16;
///
/// assert_eq!(read_le_u16([0x34, 0x12]), 0x1234);
/// ```
#[must_use]
pub fn read_le_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "The wire format stores multi-byte integers little-endian."
    )]
    u16::from_le_bytes(bytes)
}

/// Split a little-endian `u16` off the front of `bytes`.
///
/// Returns the decoded value and the remaining slice, or `None` when fewer
/// than two bytes are available.
///
/// # Examples
///
/// ```
/// use chunkwire::byte_order::split_le_u16;
///
/// assert_eq!(split_le_u16(&[0x02, 0x00, 0xAA]), Some((2, &[0xAA][..])));
/// assert_eq!(split_le_u16(&[0x02]), None);
/// ```
#[must_use]
pub fn split_le_u16(bytes: &[u8]) -> Option<(u16, &[u8])> {
    let (prefix, rest) = bytes.split_first_chunk::<2>()?;
    Some((read_le_u16(*prefix), rest))
}
