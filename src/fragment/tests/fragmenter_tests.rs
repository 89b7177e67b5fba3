//! Tests for outbound fragmentation and packet batch helpers.

use std::num::NonZeroUsize;

use rstest::rstest;

use crate::fragment::{
    FragmentIndex,
    FragmentationConfig,
    FragmentationError,
    Fragmenter,
    PACKET_HEADER_LEN,
    PacketBatch,
    PayloadId,
};

fn payload_id(value: u8) -> PayloadId { PayloadId::new(value).expect("not reserved") }

fn fragmenter(max: usize) -> Fragmenter {
    Fragmenter::new(NonZeroUsize::new(max).expect("non-zero"))
}

fn assert_packet(batch: &PacketBatch, index: u16, data: &[u8], count: u16) {
    let packet = batch
        .packets()
        .get(usize::from(index))
        .expect("packet missing at requested index");
    assert_eq!(packet.data(), data);
    assert_eq!(packet.header().fragment_index(), FragmentIndex::new(index));
    assert_eq!(packet.header().fragment_count(), count);
    assert_eq!(packet.header().payload_id(), batch.payload_id());
}

#[test]
fn fragmenter_splits_payload_into_multiple_packets() {
    let payload: Vec<u8> = (0..8).collect();
    let batch = fragmenter(3)
        .fragment(payload_id(4), payload)
        .expect("fragment payload");

    assert_eq!(batch.len(), 3);
    assert!(batch.is_fragmented());
    assert_eq!(batch.payload_id(), payload_id(4));

    assert_packet(&batch, 0, &[0, 1, 2], 3);
    assert_packet(&batch, 1, &[3, 4, 5], 3);
    assert_packet(&batch, 2, &[6, 7], 3);
}

#[test]
fn fragmenter_writes_little_endian_header() {
    let data = vec![0xAB_u8; 300];
    let batch = fragmenter(1).fragment(payload_id(9), &data).expect("fragment");
    let packet = &batch.packets()[258];
    assert_eq!(&packet.as_bytes()[..5], &[9, 0x02, 0x01, 0x2C, 0x01]);
    assert_eq!(packet.data(), &[0xAB]);
}

#[rstest]
#[case(0, 4, 1)]
#[case(4, 4, 1)]
#[case(10, 4, 3)]
#[case(9, 1, 9)]
fn wire_len_counts_headers_and_data(
    #[case] data_len: usize,
    #[case] max: usize,
    #[case] packets: usize,
) {
    let batch = fragmenter(max).fragment(payload_id(3), vec![7; data_len]).expect("fragment");
    assert_eq!(batch.len(), packets);
    assert_eq!(batch.wire_len(), data_len + packets * PACKET_HEADER_LEN);
}

#[test]
fn fragmenter_handles_empty_payload() {
    let batch = fragmenter(8).fragment(payload_id(0), []).expect("fragment empty");

    assert_eq!(batch.len(), 1);
    assert!(!batch.is_fragmented());
    let packet = batch.packets().first().expect("one packet");
    assert!(packet.data().is_empty());
    assert!(packet.header().is_last_fragment());
    assert_eq!(packet.as_bytes(), &[0, 0, 0, 1, 0]);
}

#[rstest]
#[case(1, 64, 1)]
#[case(64, 64, 1)]
#[case(65, 64, 2)]
#[case(128, 64, 2)]
#[case(129, 64, 3)]
fn fragment_count_is_ceiling_of_length_over_max(
    #[case] len: usize,
    #[case] max: usize,
    #[case] expected: u16,
) {
    let fragmenter = fragmenter(max);
    assert_eq!(fragmenter.fragment_count(len).expect("count fits"), expected);
    let batch = fragmenter
        .fragment(payload_id(1), vec![0_u8; len])
        .expect("fragment");
    assert_eq!(batch.len(), usize::from(expected));
    assert!(batch.packets().iter().all(|p| p.data().len() <= max));
}

#[test]
fn fragmenter_rejects_payloads_needing_too_many_fragments() {
    let err = fragmenter(1)
        .fragment(payload_id(1), vec![0_u8; usize::from(u16::MAX) + 1])
        .expect_err("count overflows u16");
    assert!(matches!(
        err,
        FragmentationError::TooManyFragments {
            data_len: 65_536,
            max_fragment_payload: 1,
        }
    ));
}

#[test]
fn fragmenter_accepts_exactly_u16_max_fragments() {
    let batch = fragmenter(1)
        .fragment(payload_id(1), vec![0_u8; usize::from(u16::MAX)])
        .expect("count fits");
    assert_eq!(batch.len(), usize::from(u16::MAX));
    let last = batch.packets().last().expect("non-empty");
    assert!(last.header().is_last_fragment());
}

#[test]
fn batch_concatenation_restores_input() {
    let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
    let batch = fragmenter(37).fragment(payload_id(2), &data).expect("fragment");
    let rebuilt: Vec<u8> = batch
        .into_iter()
        .flat_map(|packet| packet.data().to_vec())
        .collect();
    assert_eq!(rebuilt, data);
}

#[rstest]
#[case(505, 373)]
#[case(255, 184)]
#[case(12, 4)]
fn config_derives_fragment_cap_from_transport_budget(#[case] budget: usize, #[case] cap: usize) {
    let config = FragmentationConfig::for_transport_budget(budget).expect("budget fits header");
    assert_eq!(config.max_fragment_payload().get(), cap);
    assert!(config.encoded_packet_ceiling() <= budget);
    assert_eq!(Fragmenter::from_config(&config).max_fragment_payload().get(), cap);
}

#[rstest]
#[case(0)]
#[case(7)]
fn config_rejects_budgets_without_room_for_data(#[case] budget: usize) {
    assert!(FragmentationConfig::for_transport_budget(budget).is_none());
}
