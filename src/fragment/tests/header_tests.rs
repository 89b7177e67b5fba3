//! Tests for packet header layout, validation and packet parsing.

use rstest::rstest;

use crate::fragment::*;

fn payload_id(value: u8) -> PayloadId { PayloadId::new(value).expect("not reserved") }

#[test]
fn header_exposes_fields() {
    let header = PacketHeader::new(payload_id(9), FragmentIndex::new(2), 3).expect("valid");
    assert_eq!(header.payload_id(), payload_id(9));
    assert_eq!(header.fragment_index(), FragmentIndex::new(2));
    assert_eq!(header.fragment_count(), 3);
    assert!(header.is_last_fragment());
}

#[test]
fn header_encodes_to_five_little_endian_bytes() {
    let header =
        PacketHeader::new(payload_id(0xFE), FragmentIndex::new(0x1234), 0xABCD).expect("valid");
    assert_eq!(
        header.encode().expect("encode"),
        [0xFE, 0x34, 0x12, 0xCD, 0xAB]
    );
}

#[test]
fn header_decode_splits_off_remainder() {
    let (header, rest) = PacketHeader::decode(&[3, 1, 0, 2, 0, b'h', b'i']).expect("decode");
    assert_eq!(header.payload_id(), payload_id(3));
    assert_eq!(header.fragment_index(), FragmentIndex::new(1));
    assert_eq!(header.fragment_count(), 2);
    assert_eq!(rest, b"hi");
}

#[rstest]
#[case::empty(&[])]
#[case::one(&[1])]
#[case::four(&[1, 0, 0, 1])]
fn short_input_is_rejected(#[case] bytes: &[u8]) {
    let err = PacketHeader::decode(bytes).expect_err("too short");
    assert!(matches!(err, PacketError::TooShort { len } if len == bytes.len()));
}

#[test]
fn reserved_payload_id_is_rejected() {
    let err = PacketHeader::decode(&[255, 0, 0, 1, 0]).expect_err("reserved id");
    assert!(matches!(err, PacketError::ReservedPayloadId(_)));
}

#[rstest]
#[case::zero_count(&[1, 0, 0, 0, 0])]
#[case::index_equals_count(&[1, 2, 0, 2, 0])]
#[case::index_beyond_count(&[1, 9, 0, 2, 0])]
fn inconsistent_positions_are_rejected(#[case] bytes: &[u8]) {
    let err = PacketHeader::decode(bytes).expect_err("invalid position");
    assert!(matches!(
        err,
        PacketError::ZeroFragmentCount { .. } | PacketError::IndexOutOfRange { .. }
    ));
}

#[test]
fn packet_text_round_trips() {
    let header = PacketHeader::new(payload_id(7), FragmentIndex::zero(), 1).expect("valid");
    let packet = Packet::new(header, b"data").expect("encode");
    let text = packet.to_text();
    assert_eq!(Packet::from_text(&text).expect("decode"), packet);
}

#[test]
fn packet_from_invalid_text_is_malformed() {
    let err = Packet::from_text("%%%").expect_err("not base64");
    assert!(matches!(err, PacketError::Text(_)));
}

#[test]
fn packet_into_parts_returns_fragment_data() {
    let packet = Packet::from_bytes(vec![2, 0, 0, 1, 0, 0xAA, 0xBB]).expect("decode");
    let (header, data) = packet.into_parts();
    assert_eq!(header.payload_id(), payload_id(2));
    assert_eq!(data.as_ref(), &[0xAA, 0xBB]);
}
