//! Sizing and resource settings used by fragmentation and reassembly.

use std::{num::NonZeroUsize, time::Duration};

use serde::{Deserialize, Serialize};

use super::PACKET_HEADER_LEN;
use crate::text;

/// Fragment sizing derived from the transport's text budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentationConfig {
    max_fragment_payload: NonZeroUsize,
}

impl FragmentationConfig {
    /// Use an explicit fragment data cap.
    #[must_use]
    pub const fn new(max_fragment_payload: NonZeroUsize) -> Self {
        Self {
            max_fragment_payload,
        }
    }

    /// Derive the fragment data cap from the text length a single transport
    /// call may carry.
    ///
    /// The raw byte budget is `floor(transport_max / 4) * 3` to absorb the
    /// base64 expansion, then the packet header is subtracted.
    ///
    /// Returns `None` when the budget leaves no room for fragment data.
    ///
    /// # Examples
    ///
    /// ```
    /// use chunkwire::fragment::FragmentationConfig;
    ///
    /// let config = FragmentationConfig::for_transport_budget(505).expect("fits");
    /// assert_eq!(config.max_fragment_payload().get(), 373);
    /// assert!(FragmentationConfig::for_transport_budget(7).is_none());
    /// ```
    #[must_use]
    pub fn for_transport_budget(transport_max: usize) -> Option<Self> {
        let raw_budget = text::raw_budget(transport_max);
        let available = raw_budget.checked_sub(PACKET_HEADER_LEN)?;
        NonZeroUsize::new(available).map(Self::new)
    }

    /// Maximum fragment data bytes per packet.
    #[must_use]
    pub const fn max_fragment_payload(&self) -> NonZeroUsize { self.max_fragment_payload }

    /// Length of the text produced for a full-size packet.
    #[must_use]
    pub const fn encoded_packet_ceiling(&self) -> usize {
        text::encoded_len(self.max_fragment_payload.get() + PACKET_HEADER_LEN)
    }
}

/// Optional limits on partial reassembly buffers.
///
/// Both limits are disabled by default, in which case a payload whose
/// fragments never all arrive stays buffered for the lifetime of the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvictionPolicy {
    /// Evict a partial buffer once it has been open this long.
    pub max_age: Option<Duration>,
    /// Evict the oldest partial buffer when opening one more would exceed
    /// this many.
    pub max_buffers: Option<NonZeroUsize>,
}

impl EvictionPolicy {
    /// A policy that never evicts.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_age: None,
            max_buffers: None,
        }
    }

    /// Set the maximum age of a partial buffer.
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Set the maximum number of concurrent partial buffers.
    #[must_use]
    pub const fn with_max_buffers(mut self, max_buffers: NonZeroUsize) -> Self {
        self.max_buffers = Some(max_buffers);
        self
    }
}
