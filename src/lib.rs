#![doc(html_root_url = "https://docs.rs/chunkwire/latest")]
//! Chunked store-and-forward payload transport.
//!
//! `chunkwire` carries arbitrary `(topic, body)` payloads over a transport
//! that only moves short text messages at a limited rate. A payload is
//! framed (optionally compressed), split into numbered packets that each fit
//! one transport call, and paced out by a single send pump. The receiving
//! side buffers packets per payload id, reassembles the frame once every
//! fragment has arrived, and dispatches it as `received.<topic>`.
//!
//! ```text
//! PayloadSender -> PayloadFramer -> Fragmenter -> SendQueue -> Transport
//! Transport -> ReassemblyStore -> PayloadFramer -> Dispatcher
//! ```

pub mod byte_order;
pub mod compression;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fragment;
pub mod frame;
pub mod metrics;
pub mod receiver;
pub mod send_queue;
pub mod sender;
pub mod text;
pub mod transport;

pub use compression::{CompressionCodec, DecompressionFailed};
pub use config::{ChunkwireConfig, ConfigError};
pub use dispatch::{Delivery, Dispatcher, EVENT_NAMESPACE, PeerId, TopicRouter};
pub use error::{Error, Result};
pub use fragment::{
    EvictionPolicy,
    FragmentIndex,
    FragmentationConfig,
    FragmentationError,
    Fragmenter,
    Packet,
    PacketBatch,
    PacketError,
    PacketHeader,
    PayloadId,
    PayloadIdAllocator,
    PayloadIdExhausted,
    ReassembledFrame,
    ReassemblyError,
    ReassemblyStore,
};
pub use frame::{FrameError, FrameFormat, MalformedFrame, PayloadFramer, UnframedPayload};
pub use metrics::{BUFFERS_EVICTED, Direction, ERRORS_TOTAL, PACKETS_PROCESSED, PAYLOADS_PROCESSED};
pub use receiver::{PayloadReceiver, ReceiveError};
pub use send_queue::{EnqueueError, SendHandle, SendPump, SendQueue};
pub use sender::{PayloadSender, SendError};
pub use transport::{Transport, TransportError};
