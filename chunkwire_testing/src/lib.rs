//! Test doubles and fixtures for exercising `chunkwire` without a real
//! transport.
//!
//! ```rust
//! use chunkwire::SendQueue;
//! use chunkwire_testing::RecordingTransport;
//!
//! # async fn example() {
//! let transport = RecordingTransport::default();
//! let queue = SendQueue::builder()
//!     .interval(None)
//!     .spawn(transport.clone())
//!     .unwrap();
//! # }
//! ```

pub mod dispatch;
pub mod logging;
pub mod metrics;
pub mod transport;

pub use dispatch::RecordingDispatcher;
pub use logging::{LoggerHandle, logger};
pub use metrics::{CounterSnapshot, counter_value, debugging_recorder_setup};
pub use transport::{ChannelTransport, FailingTransport, RecordingTransport, SentMessage};
