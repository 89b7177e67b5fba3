//! Payload framing: format tag, length-prefixed topic and content.
//!
//! A frame is the unit handed to the fragmenter. It records whether its
//! content was compressed so the receiving side can restore the original body
//! without any out-of-band negotiation.

pub mod error;
pub mod format;
pub mod framer;

pub use error::{FrameError, MalformedFrame};
pub use format::FrameFormat;
pub use framer::{FRAME_PREAMBLE_LEN, PayloadFramer, UnframedPayload};
