//! Helpers for asserting on `chunkwire` counters.
//!
//! `DebuggingRecorder` resets counters each time it is snapshotted, so a test
//! takes one [`CounterSnapshot`] after exercising the code and queries it as
//! often as it likes.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

/// Creates a debugging recorder and snapshotter for metrics testing.
#[must_use]
pub fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

#[derive(Debug)]
struct CounterEntry {
    name: String,
    labels: Vec<(String, String)>,
    value: u64,
}

/// Counter values captured from a single snapshot.
#[derive(Debug, Default)]
pub struct CounterSnapshot {
    counters: Vec<CounterEntry>,
}

impl CounterSnapshot {
    /// Snapshot every counter recorded so far.
    #[must_use]
    pub fn take(snapshotter: &Snapshotter) -> Self {
        let counters = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter_map(|(key, _, _, value)| match value {
                DebugValue::Counter(value) => Some(CounterEntry {
                    name: key.key().name().to_owned(),
                    labels: key
                        .key()
                        .labels()
                        .map(|label| (label.key().to_owned(), label.value().to_owned()))
                        .collect(),
                    value,
                }),
                _ => None,
            })
            .collect();
        Self { counters }
    }

    /// Sum of every counter named `name` whose labels include all of `labels`.
    #[must_use]
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .iter()
            .filter(|entry| {
                entry.name == name
                    && labels.iter().all(|(k, v)| {
                        entry.labels.iter().any(|(key, value)| key == k && value == v)
                    })
            })
            .map(|entry| entry.value)
            .sum()
    }
}

/// Snapshot the recorder and read a single counter.
///
/// Taking the snapshot resets the recorder, so use [`CounterSnapshot::take`]
/// when a test checks more than one counter.
#[must_use]
pub fn counter_value(snapshotter: &Snapshotter, name: &str, labels: &[(&str, &str)]) -> u64 {
    CounterSnapshot::take(snapshotter).value(name, labels)
}
