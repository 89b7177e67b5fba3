//! Inbound store that stitches packets back into complete frames.
//!
//! [`ReassemblyStore`] mirrors the outbound [`Fragmenter`](crate::fragment::Fragmenter)
//! by collecting fragment data keyed by [`PayloadId`]. Fragments are indexed
//! explicitly, so arrival order does not matter. A buffer completes once it
//! holds one fragment for every index below the declared count, at which
//! point it is removed and its fragments are concatenated in index order.
//!
//! An [`EvictionPolicy`] can bound how long and how many partial buffers are
//! kept; by default they are kept until completed.

use std::{
    collections::{HashMap, hash_map::Entry},
    time::Instant,
};

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use super::{EvictionPolicy, Packet, PayloadId, ReassemblyError};
use crate::metrics;

#[derive(Debug)]
struct PartialPayload {
    fragment_count: u16,
    fragments: Vec<Option<Bytes>>,
    received: usize,
    buffered_bytes: usize,
    started_at: Instant,
}

impl PartialPayload {
    fn new(fragment_count: u16, started_at: Instant) -> Self {
        Self {
            fragment_count,
            fragments: vec![None; usize::from(fragment_count)],
            received: 0,
            buffered_bytes: 0,
            started_at,
        }
    }

    /// Store `data` at `index`; a repeated index replaces the earlier bytes.
    fn insert(&mut self, index: usize, data: Bytes) {
        let added = data.len();
        match self.fragments[index].replace(data) {
            Some(previous) => {
                self.buffered_bytes = self.buffered_bytes - previous.len() + added;
            }
            None => {
                self.received += 1;
                self.buffered_bytes += added;
            }
        }
    }

    fn is_complete(&self) -> bool { self.received == self.fragments.len() }

    fn concatenate(self) -> Bytes {
        let mut frame = BytesMut::with_capacity(self.buffered_bytes);
        for fragment in self.fragments.into_iter().flatten() {
            frame.extend_from_slice(&fragment);
        }
        frame.freeze()
    }
}

/// Frame bytes rebuilt from every fragment of one payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReassembledFrame {
    payload_id: PayloadId,
    fragment_count: u16,
    frame: Bytes,
}

impl ReassembledFrame {
    /// Identifier shared by the packets that formed this frame.
    #[must_use]
    pub const fn payload_id(&self) -> PayloadId { self.payload_id }

    /// Number of packets the frame arrived in.
    #[must_use]
    pub const fn fragment_count(&self) -> u16 { self.fragment_count }

    /// Borrow the frame bytes.
    #[must_use]
    pub fn frame(&self) -> &[u8] { &self.frame }

    /// Consume the value, returning the frame bytes.
    #[must_use]
    pub fn into_frame(self) -> Bytes { self.frame }
}

/// Per-payload reassembly buffers.
///
/// Buffers are keyed by [`PayloadId`] alone. Ids are only unique within one
/// sender's allocator, so a store must only ever see packets from a single
/// peer.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use chunkwire::fragment::{Fragmenter, PayloadId, ReassemblyStore};
///
/// let fragmenter = Fragmenter::new(NonZeroUsize::new(2).expect("non-zero"));
/// let batch = fragmenter
///     .fragment(PayloadId::new(3).expect("not reserved"), b"hello")
///     .expect("fragment");
/// let mut store = ReassemblyStore::default();
/// let mut completed = None;
/// for packet in batch.packets().iter().rev() {
///     completed = store.receive(&packet.to_text()).expect("valid packet");
/// }
/// assert_eq!(completed.expect("complete").frame(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct ReassemblyStore {
    policy: EvictionPolicy,
    buffers: HashMap<PayloadId, PartialPayload>,
}

impl ReassemblyStore {
    /// Create a store that applies `policy` to partial buffers.
    #[must_use]
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            policy,
            buffers: HashMap::new(),
        }
    }

    /// Return the active eviction policy.
    #[must_use]
    pub const fn policy(&self) -> &EvictionPolicy { &self.policy }

    /// Decode one packet from transport text and add it to its buffer.
    ///
    /// Returns `Ok(Some(_))` when the packet completes its payload and
    /// `Ok(None)` while more packets are needed.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::MalformedPacket`] without touching any
    /// buffer if the text or header is invalid, and
    /// [`ReassemblyError::CountMismatch`] (discarding that payload's buffer)
    /// if the packet disagrees with the open buffer for its id.
    pub fn receive(&mut self, text: &str) -> Result<Option<ReassembledFrame>, ReassemblyError> {
        self.receive_at(text, Instant::now())
    }

    /// [`receive`](Self::receive) with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`receive`](Self::receive).
    pub fn receive_at(
        &mut self,
        text: &str,
        now: Instant,
    ) -> Result<Option<ReassembledFrame>, ReassemblyError> {
        let packet = Packet::from_text(text).inspect_err(|err| {
            debug!(text_len = text.len(), error = %err, "rejected malformed packet");
        })?;
        self.push_at(packet, now)
    }

    /// Add an already parsed packet using the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::CountMismatch`] if the packet disagrees with
    /// the open buffer for its payload id.
    pub fn push(&mut self, packet: Packet) -> Result<Option<ReassembledFrame>, ReassemblyError> {
        self.push_at(packet, Instant::now())
    }

    /// Add an already parsed packet using an explicit clock reading.
    ///
    /// Accepting an explicit `now` keeps eviction deterministic in tests and
    /// lets callers coordinate sweeps with their own timers.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::CountMismatch`] if the packet disagrees with
    /// the open buffer for its payload id.
    pub fn push_at(
        &mut self,
        packet: Packet,
        now: Instant,
    ) -> Result<Option<ReassembledFrame>, ReassemblyError> {
        self.purge_expired_at(now);

        let (header, data) = packet.into_parts();
        let payload_id = header.payload_id();
        let count = header.fragment_count();

        if !self.buffers.contains_key(&payload_id) {
            if count == 1 {
                return Ok(Some(ReassembledFrame {
                    payload_id,
                    fragment_count: 1,
                    frame: data,
                }));
            }
            self.make_room();
        }

        let partial = match self.buffers.entry(payload_id) {
            Entry::Occupied(occupied) => {
                let expected = occupied.get().fragment_count;
                if expected != count {
                    occupied.remove();
                    warn!(
                        payload_id = payload_id.get(),
                        expected,
                        found = count,
                        "discarded payload after fragment count mismatch"
                    );
                    metrics::inc_errors(metrics::ErrorKind::CountMismatch);
                    return Err(ReassemblyError::CountMismatch {
                        payload_id,
                        expected,
                        found: count,
                    });
                }
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(PartialPayload::new(count, now)),
        };

        partial.insert(header.fragment_index().as_usize(), data);
        debug!(
            payload_id = payload_id.get(),
            fragment_index = header.fragment_index().get(),
            fragment_count = count,
            received = partial.received,
            "buffered fragment"
        );
        if !partial.is_complete() {
            return Ok(None);
        }

        let Some(partial) = self.buffers.remove(&payload_id) else {
            return Ok(None);
        };
        Ok(Some(ReassembledFrame {
            payload_id,
            fragment_count: count,
            frame: partial.concatenate(),
        }))
    }

    /// Remove partial buffers older than the policy's maximum age.
    ///
    /// Returns the identifiers of evicted payloads.
    pub fn purge_expired(&mut self) -> Vec<PayloadId> { self.purge_expired_at(Instant::now()) }

    /// Remove partial buffers older than the policy's maximum age, using an
    /// explicit clock reading.
    ///
    /// Returns the identifiers of evicted payloads.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<PayloadId> {
        let Some(max_age) = self.policy.max_age else {
            return Vec::new();
        };
        let mut evicted = Vec::new();
        self.buffers.retain(|payload_id, partial| {
            let expired = now.saturating_duration_since(partial.started_at) >= max_age;
            if expired {
                warn!(
                    payload_id = payload_id.get(),
                    received = partial.received,
                    fragment_count = partial.fragment_count,
                    buffered_bytes = partial.buffered_bytes,
                    "evicted expired partial payload"
                );
                evicted.push(*payload_id);
            }
            !expired
        });
        for _ in &evicted {
            metrics::inc_evictions();
        }
        evicted
    }

    /// Drop the partial buffer for `payload_id`, returning whether one existed.
    pub fn discard(&mut self, payload_id: PayloadId) -> bool {
        self.buffers.remove(&payload_id).is_some()
    }

    /// Number of partial payloads currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffers.len() }

    /// Fragments received so far and the declared count for `payload_id`.
    #[must_use]
    pub fn progress(&self, payload_id: PayloadId) -> Option<(usize, u16)> {
        self.buffers
            .get(&payload_id)
            .map(|partial| (partial.received, partial.fragment_count))
    }

    /// Evict the oldest partial buffer if opening another would exceed the
    /// policy's buffer limit.
    fn make_room(&mut self) {
        let Some(limit) = self.policy.max_buffers else {
            return;
        };
        while self.buffers.len() >= limit.get() {
            let Some(oldest) = self
                .buffers
                .iter()
                .min_by_key(|(_, partial)| partial.started_at)
                .map(|(payload_id, _)| *payload_id)
            else {
                return;
            };
            if let Some(partial) = self.buffers.remove(&oldest) {
                warn!(
                    payload_id = oldest.get(),
                    received = partial.received,
                    fragment_count = partial.fragment_count,
                    limit = limit.get(),
                    "evicted oldest partial payload to respect buffer limit"
                );
                metrics::inc_evictions();
            }
        }
    }
}
