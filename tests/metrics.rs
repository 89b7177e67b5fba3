#![cfg(feature = "metrics")]
//! Tests for `chunkwire` metrics.
//!
//! Counters are observed through `metrics_util::debugging::DebuggingRecorder`
//! installed as a thread-local recorder, so each test sees only its own
//! increments.

use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use chunkwire::{
    EvictionPolicy,
    Fragmenter,
    PayloadFramer,
    PayloadId,
    PayloadReceiver,
    PeerId,
    ReassemblyStore,
    metrics::{
        BUFFERS_EVICTED,
        Direction,
        ERRORS_TOTAL,
        ErrorKind,
        PACKETS_PROCESSED,
        PAYLOADS_PROCESSED,
        inc_errors,
        inc_packets,
    },
    text,
};
use chunkwire_testing::{
    CounterSnapshot,
    RecordingDispatcher,
    counter_value,
    debugging_recorder_setup,
};
use rstest::rstest;

fn fragmenter(max: usize) -> Fragmenter {
    Fragmenter::new(NonZeroUsize::new(max).expect("non-zero"))
}

fn payload_id(value: u8) -> PayloadId { PayloadId::new(value).expect("not reserved") }

#[rstest]
#[case(Direction::Inbound, "inbound")]
#[case(Direction::Outbound, "outbound")]
fn packet_counter_is_labelled_by_direction(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || inc_packets(direction));

    assert_eq!(
        counter_value(&snapshotter, PACKETS_PROCESSED, &[("direction", label)]),
        1
    );
}

#[rstest]
#[case(ErrorKind::MalformedPacket, "malformed_packet")]
#[case(ErrorKind::Decompression, "decompression")]
#[case(ErrorKind::Transport, "transport")]
fn error_counter_is_labelled_by_kind(#[case] kind: ErrorKind, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        inc_errors(kind);
        inc_errors(kind);
    });

    assert_eq!(counter_value(&snapshotter, ERRORS_TOTAL, &[("kind", label)]), 2);
}

#[test]
fn receiving_a_payload_counts_packets_and_payloads() {
    let frame = PayloadFramer::uncompressed().frame("m", b"metrics body").expect("frame");
    let batch = fragmenter(5).fragment(payload_id(1), &frame).expect("fragment");
    let (snapshotter, recorder) = debugging_recorder_setup();

    metrics::with_local_recorder(&recorder, || {
        let mut receiver = PayloadReceiver::new(RecordingDispatcher::default());
        let peer = PeerId::new("p");
        for packet in batch.packets() {
            receiver.receive(&packet.to_text(), &peer).expect("valid");
        }
        let _ = receiver.receive(&text::encode(&[1, 2]), &peer);
    });

    let counters = CounterSnapshot::take(&snapshotter);
    let inbound = [("direction", "inbound")];
    assert_eq!(
        counters.value(PACKETS_PROCESSED, &inbound),
        u64::try_from(batch.len()).expect("fits")
    );
    assert_eq!(counters.value(PAYLOADS_PROCESSED, &inbound), 1);
    assert_eq!(counters.value(ERRORS_TOTAL, &[("kind", "malformed_packet")]), 1);
}

#[test]
fn count_mismatch_and_eviction_are_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let policy = EvictionPolicy::default().with_max_age(Duration::from_secs(5));
    let start = Instant::now();

    metrics::with_local_recorder(&recorder, || {
        let mut store = ReassemblyStore::new(policy);
        let three = fragmenter(2).fragment(payload_id(2), b"abcdef").expect("fragment");
        let four = fragmenter(2).fragment(payload_id(2), b"abcdefgh").expect("fragment");
        store.push_at(three.packets()[0].clone(), start).expect("first packet");
        assert!(store.push_at(four.packets()[1].clone(), start).is_err());

        store.push_at(three.packets()[0].clone(), start).expect("reopen");
        let evicted = store.purge_expired_at(start + Duration::from_secs(6));
        assert_eq!(evicted, vec![payload_id(2)]);
    });

    let counters = CounterSnapshot::take(&snapshotter);
    assert_eq!(counters.value(ERRORS_TOTAL, &[("kind", "count_mismatch")]), 1);
    assert_eq!(counters.value(BUFFERS_EVICTED, &[]), 1);
}

#[test]
fn one_snapshot_answers_repeated_queries() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        inc_packets(Direction::Outbound);
        inc_errors(ErrorKind::Transport);
    });

    let counters = CounterSnapshot::take(&snapshotter);
    let outbound = [("direction", "outbound")];
    assert_eq!(counters.value(PACKETS_PROCESSED, &outbound), 1);
    assert_eq!(counters.value(PACKETS_PROCESSED, &outbound), 1);
    assert_eq!(counters.value(ERRORS_TOTAL, &[("kind", "transport")]), 1);
    assert_eq!(counters.value(PAYLOADS_PROCESSED, &[]), 0);
}
