//! Tests for inbound reassembly ordering, completion and eviction.

use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use rstest::{fixture, rstest};

use crate::fragment::{
    EvictionPolicy,
    FragmentIndex,
    Fragmenter,
    Packet,
    PacketBatch,
    PacketError,
    PacketHeader,
    PayloadId,
    ReassemblyError,
    ReassemblyStore,
};

fn payload_id(value: u8) -> PayloadId { PayloadId::new(value).expect("not reserved") }

fn packet(id: u8, index: u16, count: u16, data: &[u8]) -> Packet {
    let header =
        PacketHeader::new(payload_id(id), FragmentIndex::new(index), count).expect("valid header");
    Packet::new(header, data).expect("encode packet")
}

fn batch(id: u8, data: &[u8], max: usize) -> PacketBatch {
    Fragmenter::new(NonZeroUsize::new(max).expect("non-zero"))
        .fragment(payload_id(id), data)
        .expect("fragment")
}

#[fixture]
fn store() -> ReassemblyStore { ReassemblyStore::default() }

#[rstest]
fn single_fragment_completes_immediately(mut store: ReassemblyStore) {
    let complete = store
        .push(packet(1, 0, 1, &[1, 2, 3, 4]))
        .expect("accepted")
        .expect("single fragment completes");

    assert_eq!(complete.payload_id(), payload_id(1));
    assert_eq!(complete.fragment_count(), 1);
    assert_eq!(complete.frame(), &[1, 2, 3, 4]);
    assert_eq!(store.buffered_len(), 0);
}

#[rstest]
fn ordered_fragments_complete_on_last(mut store: ReassemblyStore) {
    assert!(store.push(packet(2, 0, 3, &[5, 6])).expect("accepted").is_none());
    assert!(store.push(packet(2, 1, 3, &[7])).expect("accepted").is_none());
    assert_eq!(store.progress(payload_id(2)), Some((2, 3)));

    let complete = store
        .push(packet(2, 2, 3, &[8, 9]))
        .expect("accepted")
        .expect("complete");
    assert_eq!(complete.frame(), &[5, 6, 7, 8, 9]);
    assert_eq!(store.buffered_len(), 0);
}

#[rstest]
#[case::reversed(vec![2, 1, 0])]
#[case::middle_first(vec![1, 0, 2])]
#[case::last_first(vec![2, 0, 1])]
fn arrival_order_does_not_matter(mut store: ReassemblyStore, #[case] order: Vec<usize>) {
    let packets = batch(3, b"abcdefgh", 3).into_packets();
    let mut completed = None;
    for (step, index) in order.iter().enumerate() {
        let result = store.push(packets[*index].clone()).expect("accepted");
        if step + 1 < order.len() {
            assert!(result.is_none(), "completed early at step {step}");
        }
        completed = result;
    }
    assert_eq!(completed.expect("complete").frame(), b"abcdefgh");
}

#[rstest]
fn duplicate_index_overwrites_earlier_bytes(mut store: ReassemblyStore) {
    assert!(store.push(packet(4, 0, 2, &[1, 1])).expect("accepted").is_none());
    assert!(store.push(packet(4, 0, 2, &[2, 2])).expect("accepted").is_none());
    assert_eq!(store.progress(payload_id(4)), Some((1, 2)));

    let complete = store
        .push(packet(4, 1, 2, &[3]))
        .expect("accepted")
        .expect("complete");
    assert_eq!(complete.frame(), &[2, 2, 3]);
}

#[rstest]
fn completion_is_reported_once_and_id_starts_fresh(mut store: ReassemblyStore) {
    assert!(store.push(packet(5, 0, 2, b"ab")).expect("accepted").is_none());
    assert!(store.push(packet(5, 1, 2, b"cd")).expect("accepted").is_some());

    // A later payload reusing the id opens a new buffer.
    assert!(store.push(packet(5, 1, 2, b"zz")).expect("accepted").is_none());
    assert_eq!(store.progress(payload_id(5)), Some((1, 2)));
    let complete = store
        .push(packet(5, 0, 2, b"yy"))
        .expect("accepted")
        .expect("complete");
    assert_eq!(complete.frame(), b"yyzz");
}

#[rstest]
fn interleaved_payloads_are_kept_apart(mut store: ReassemblyStore) {
    let first = batch(6, b"first payload", 4).into_packets();
    let second = batch(7, b"second payload", 4).into_packets();
    let mut done = Vec::new();
    for (a, b) in first.into_iter().zip(second) {
        done.extend(store.push(a).expect("accepted"));
        done.extend(store.push(b).expect("accepted"));
    }
    let frames: Vec<&[u8]> = done.iter().map(|f| f.frame()).collect();
    assert_eq!(frames, vec![&b"first payload"[..], &b"second payload"[..]]);
}

#[rstest]
fn short_text_packet_is_malformed_and_leaves_buffers(mut store: ReassemblyStore) {
    assert!(store.push(packet(8, 0, 2, b"partial")).expect("accepted").is_none());

    let short = crate::text::encode(&[8, 0, 0, 2]);
    let err = store.receive(&short).expect_err("too short");
    assert!(matches!(
        err,
        ReassemblyError::MalformedPacket(PacketError::TooShort { len: 4 })
    ));
    assert_eq!(store.buffered_len(), 1);
    assert_eq!(store.progress(payload_id(8)), Some((1, 2)));
}

#[rstest]
fn count_mismatch_discards_only_that_payload(mut store: ReassemblyStore) {
    assert!(store.push(packet(9, 0, 3, b"x")).expect("accepted").is_none());
    assert!(store.push(packet(10, 0, 2, b"y")).expect("accepted").is_none());

    let err = store
        .push(packet(9, 1, 4, b"z"))
        .expect_err("count disagrees with open buffer");
    assert!(matches!(
        err,
        ReassemblyError::CountMismatch {
            expected: 3,
            found: 4,
            ..
        }
    ));
    assert_eq!(store.progress(payload_id(9)), None);
    assert_eq!(store.progress(payload_id(10)), Some((1, 2)));
}

#[test]
fn expired_buffers_are_purged() {
    let mut store =
        ReassemblyStore::new(EvictionPolicy::unbounded().with_max_age(Duration::from_secs(2)));
    let now = Instant::now();
    assert!(
        store
            .push_at(packet(11, 0, 2, b"a"), now)
            .expect("accepted")
            .is_none()
    );
    assert!(store.purge_expired_at(now + Duration::from_secs(1)).is_empty());

    let evicted = store.purge_expired_at(now + Duration::from_secs(3));
    assert_eq!(evicted, vec![payload_id(11)]);
    assert_eq!(store.buffered_len(), 0);
}

#[test]
fn unbounded_policy_never_purges() {
    let mut store = ReassemblyStore::default();
    let now = Instant::now();
    assert!(
        store
            .push_at(packet(12, 0, 2, b"a"), now)
            .expect("accepted")
            .is_none()
    );
    assert!(
        store
            .purge_expired_at(now + Duration::from_secs(86_400))
            .is_empty()
    );
    assert_eq!(store.buffered_len(), 1);
}

#[test]
fn buffer_limit_evicts_oldest_partial() {
    let mut store = ReassemblyStore::new(
        EvictionPolicy::unbounded().with_max_buffers(NonZeroUsize::new(2).expect("non-zero")),
    );
    let now = Instant::now();
    for (offset, id) in [13_u8, 14, 15].into_iter().enumerate() {
        let at = now + Duration::from_millis(u64::try_from(offset).expect("small"));
        assert!(store.push_at(packet(id, 0, 2, b"p"), at).expect("accepted").is_none());
    }
    assert_eq!(store.buffered_len(), 2);
    assert_eq!(store.progress(payload_id(13)), None);
    assert!(store.progress(payload_id(14)).is_some());
    assert!(store.progress(payload_id(15)).is_some());
}

#[rstest]
fn discard_drops_partial_buffer(mut store: ReassemblyStore) {
    assert!(store.push(packet(16, 0, 2, b"a")).expect("accepted").is_none());
    assert!(store.discard(payload_id(16)));
    assert!(!store.discard(payload_id(16)));
    assert_eq!(store.buffered_len(), 0);
}
