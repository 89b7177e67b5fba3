//! Fragmentation and reassembly of frames into bounded-size packets.
//!
//! This module collects the domain types used by the packet layer. Each
//! sub-module focuses on a single concept to keep the code small and easy to
//! audit while still providing a cohesive API at the crate root.
//!
//! Payload identifiers occupy one header byte and are recycled. At most
//! [`PAYLOAD_ID_CAPACITY`] payloads may be undelivered at once; the
//! [`PayloadIdAllocator`] refuses further allocations rather than reusing an
//! identifier that may still be in flight.

pub mod config;
pub mod error;
pub mod fragmenter;
pub mod header;
pub mod id;
pub mod index;
pub mod packet;
pub mod reassembler;

pub use config::{EvictionPolicy, FragmentationConfig};
pub use error::{FragmentationError, PacketError, ReassemblyError};
pub use fragmenter::{Fragmenter, PacketBatch};
pub use header::{PACKET_HEADER_LEN, PacketHeader};
pub use id::{
    PAYLOAD_ID_CAPACITY,
    PayloadId,
    PayloadIdAllocator,
    PayloadIdExhausted,
    PayloadIdLease,
    RESERVED_PAYLOAD_ID,
    ReservedPayloadId,
};
pub use index::FragmentIndex;
pub use packet::Packet;
pub use reassembler::{ReassembledFrame, ReassemblyStore};
