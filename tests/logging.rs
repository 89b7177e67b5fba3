//! Log output for discarded payloads, evictions and transport failures.
//!
//! `tracing` forwards events to the `log` facade, where `logtest` captures
//! them.

use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use chunkwire::{
    EvictionPolicy,
    Fragmenter,
    PayloadId,
    PayloadReceiver,
    PeerId,
    ReassemblyStore,
    SendQueue,
    text,
};
use chunkwire_testing::{FailingTransport, LoggerHandle, RecordingDispatcher, logger};
use log::Level;
use rstest::rstest;

fn fragmenter(max: usize) -> Fragmenter {
    Fragmenter::new(NonZeroUsize::new(max).expect("non-zero"))
}

fn payload_id(value: u8) -> PayloadId { PayloadId::new(value).expect("not reserved") }

fn assert_logged(logger: &mut LoggerHandle, level: Level, needle: &str, fields: &[&str]) {
    let records = logger.drain();
    let found = records.iter().find(|(_, message)| message.contains(needle));
    let Some((found_level, message)) = found else {
        panic!("no log containing {needle:?}; captured {records:#?}");
    };
    assert_eq!(*found_level, level, "unexpected level for {message}");
    for field in fields {
        assert!(message.contains(field), "log missing {field}: {message}");
    }
}

#[rstest]
fn count_mismatch_is_logged_with_payload_id(mut logger: LoggerHandle) {
    let mut store = ReassemblyStore::default();
    let three = fragmenter(2).fragment(payload_id(8), b"abcdef").expect("fragment");
    let four = fragmenter(2).fragment(payload_id(8), b"abcdefgh").expect("fragment");
    store.push(three.packets()[0].clone()).expect("first packet");
    let _ = store.push(four.packets()[1].clone());

    assert_logged(
        &mut logger,
        Level::Warn,
        "fragment count mismatch",
        &["payload_id=8", "expected=3", "found=4"],
    );
}

#[rstest]
fn eviction_is_logged(mut logger: LoggerHandle) {
    let policy = EvictionPolicy::default().with_max_age(Duration::from_secs(1));
    let mut store = ReassemblyStore::new(policy);
    let batch = fragmenter(2).fragment(payload_id(4), b"abcd").expect("fragment");
    let start = Instant::now();
    store.push_at(batch.packets()[0].clone(), start).expect("buffer");
    store.purge_expired_at(start + Duration::from_secs(2));

    assert_logged(
        &mut logger,
        Level::Warn,
        "evicted expired partial payload",
        &["payload_id=4", "received=1", "fragment_count=2"],
    );
}

#[rstest]
fn malformed_packet_names_the_sender(mut logger: LoggerHandle) {
    let mut receiver = PayloadReceiver::new(RecordingDispatcher::default());
    let _ = receiver.receive(&text::encode(&[0, 1]), &PeerId::new("mallory"));

    assert_logged(
        &mut logger,
        Level::Warn,
        "dropped malformed packet",
        &["sender=mallory"],
    );
}

#[rstest]
fn unreadable_frame_is_logged_with_lengths(mut logger: LoggerHandle) {
    let frame = [0x07, 0x00, 0x00, 0xAA];
    let batch = fragmenter(16).fragment(payload_id(12), frame).expect("fragment");
    let mut receiver = PayloadReceiver::new(RecordingDispatcher::default());
    let _ = receiver.receive(&batch.packets()[0].to_text(), &PeerId::new("p"));

    assert_logged(
        &mut logger,
        Level::Warn,
        "discarded payload with unreadable frame",
        &["payload_id=12", "frame_len=4"],
    );
}

#[rstest]
#[tokio::test]
async fn transport_failures_are_logged(mut logger: LoggerHandle) {
    let queue = SendQueue::builder()
        .interval(None)
        .spawn(FailingTransport::always())
        .expect("queue");
    queue
        .handle()
        .enqueue(fragmenter(4).fragment(payload_id(3), b"xy").expect("fragment"))
        .expect("enqueue");
    queue.close().await;

    assert_logged(
        &mut logger,
        Level::Warn,
        "transport rejected packet",
        &["payload_id=3", "fragment_index=0"],
    );
}
