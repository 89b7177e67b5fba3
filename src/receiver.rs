//! Inbound path: reassemble packets, unframe and dispatch.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::ChunkwireConfig,
    dispatch::{Delivery, Dispatcher, PeerId},
    fragment::{EvictionPolicy, PayloadId, ReassemblyError, ReassemblyStore},
    frame::{FrameError, PayloadFramer},
    metrics::{self, Direction, ErrorKind},
};

/// Errors returned by [`PayloadReceiver::receive`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// The packet was rejected by the reassembly store.
    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),
    /// A payload reassembled but its frame could not be read. The payload is
    /// dropped.
    #[error("payload {payload_id} could not be unframed: {source}")]
    Frame {
        payload_id: PayloadId,
        #[source]
        source: FrameError,
    },
}

/// Receiving endpoint for one peer.
///
/// `receive` runs to completion without suspending: it buffers the packet
/// and, when that packet completes a payload, unframes it and hands the
/// result to the dispatcher before returning.
///
/// Payload ids are allocated per sender, so two peers can have the same id
/// in flight at once. Partial buffers are keyed by id only and the `sender`
/// argument is passed through to the [`Delivery`] without being used to
/// separate them. Use one receiver per peer or connection. Receivers can
/// still feed one [`TopicRouter`](crate::dispatch::TopicRouter) through
/// closures that hold it in an `Arc`.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use chunkwire::{
///     dispatch::{Delivery, PeerId},
///     fragment::{Fragmenter, PayloadId},
///     frame::PayloadFramer,
///     receiver::PayloadReceiver,
/// };
///
/// let frame = PayloadFramer::default().frame("greeting", b"hello").expect("frame");
/// let batch = Fragmenter::new(NonZeroUsize::new(4).expect("non-zero"))
///     .fragment(PayloadId::new(0).expect("not reserved"), &frame)
///     .expect("fragment");
///
/// let mut receiver = PayloadReceiver::new(|d: Delivery| {
///     assert_eq!(d.event(), "received.greeting");
///     assert_eq!(&d.payload()[..], b"hello");
/// });
/// let peer = PeerId::new("peer");
/// for packet in batch.packets() {
///     receiver.receive(&packet.to_text(), &peer).expect("valid packet");
/// }
/// ```
#[derive(Debug)]
pub struct PayloadReceiver<D> {
    store: ReassemblyStore,
    framer: PayloadFramer,
    dispatcher: D,
}

impl<D: Dispatcher> PayloadReceiver<D> {
    /// Create a receiver with default framing and no eviction.
    #[must_use]
    pub fn new(dispatcher: D) -> Self {
        Self {
            store: ReassemblyStore::default(),
            framer: PayloadFramer::default(),
            dispatcher,
        }
    }

    /// Create a receiver honouring `config`'s compression level and eviction
    /// policy.
    #[must_use]
    pub fn from_config(config: &ChunkwireConfig, dispatcher: D) -> Self {
        Self::new(dispatcher)
            .with_framer(config.framer())
            .with_eviction(config.eviction)
    }

    #[must_use]
    pub fn with_framer(mut self, framer: PayloadFramer) -> Self {
        self.framer = framer;
        self
    }

    /// Replace the reassembly store with an empty one using `policy`.
    #[must_use]
    pub fn with_eviction(mut self, policy: EvictionPolicy) -> Self {
        self.store = ReassemblyStore::new(policy);
        self
    }

    /// Accept one transport message from `sender`.
    ///
    /// Returns the payload id when this packet completed and dispatched a
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiveError::Reassembly`] for malformed packets or fragment
    /// count mismatches and [`ReceiveError::Frame`] when a completed payload
    /// cannot be unframed.
    pub fn receive(
        &mut self,
        text: &str,
        sender: &PeerId,
    ) -> Result<Option<PayloadId>, ReceiveError> {
        self.receive_at(text, sender, Instant::now())
    }

    /// [`receive`](Self::receive) with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// See [`receive`](Self::receive).
    pub fn receive_at(
        &mut self,
        text: &str,
        sender: &PeerId,
        now: Instant,
    ) -> Result<Option<PayloadId>, ReceiveError> {
        let completed = match self.store.receive_at(text, now) {
            Ok(completed) => completed,
            Err(err) => {
                if let ReassemblyError::MalformedPacket(_) = err {
                    metrics::inc_errors(ErrorKind::MalformedPacket);
                    warn!(%sender, text_len = text.len(), error = %err, "dropped malformed packet");
                }
                return Err(err.into());
            }
        };
        metrics::inc_packets(Direction::Inbound);
        let Some(reassembled) = completed else {
            return Ok(None);
        };

        let payload_id = reassembled.payload_id();
        let frame_len = reassembled.frame().len();
        let unframed = match self.framer.unframe(reassembled.frame()) {
            Ok(unframed) => unframed,
            Err(source) => {
                let kind = match &source {
                    FrameError::DecompressionFailed(_) => ErrorKind::Decompression,
                    _ => ErrorKind::MalformedFrame,
                };
                metrics::inc_errors(kind);
                warn!(
                    payload_id = payload_id.get(),
                    fragment_count = reassembled.fragment_count(),
                    frame_len,
                    %sender,
                    error = %source,
                    "discarded payload with unreadable frame"
                );
                return Err(ReceiveError::Frame { payload_id, source });
            }
        };

        let (topic, body) = unframed.into_parts();
        debug!(
            payload_id = payload_id.get(),
            topic = %topic,
            frame_len,
            body_len = body.len(),
            %sender,
            "dispatching payload"
        );
        metrics::inc_payloads(Direction::Inbound);
        self.dispatcher.dispatch(Delivery::new(topic, body, sender.clone()));
        Ok(Some(payload_id))
    }

    /// Evict partial payloads older than the policy allows.
    pub fn purge_expired(&mut self) -> Vec<PayloadId> { self.store.purge_expired() }

    #[must_use]
    pub fn store(&self) -> &ReassemblyStore { &self.store }

    #[must_use]
    pub fn dispatcher(&self) -> &D { &self.dispatcher }
}
