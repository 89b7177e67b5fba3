//! Runtime configuration for senders and receivers.
//!
//! [`ChunkwireConfig`] groups the transport budget, compression settings and
//! reassembly eviction policy. It deserializes from JSON with every field
//! optional, and [`ChunkwireConfig::builder`] offers validated construction
//! in code.

use std::{io::Read, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    compression::{
        CompressionCodec,
        DEFAULT_COMPRESSION_LEVEL,
        DEFAULT_MAX_INFLATED_LEN,
        MAX_COMPRESSION_LEVEL,
    },
    fragment::{EvictionPolicy, FragmentationConfig, Fragmenter},
    frame::PayloadFramer,
    send_queue::{SendQueue, SendQueueBuilder},
};

/// Longest text a single transport call carries by default.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 505;
/// Milliseconds between transport calls by default.
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 30;

/// Errors raised while loading or validating configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The transport budget leaves no room for fragment data.
    #[error(
        "transport budget of {max_message_len} chars minus {message_overhead} overhead cannot \
         carry a packet"
    )]
    BudgetTooSmall {
        max_message_len: usize,
        message_overhead: usize,
    },
    /// Compression levels run from 0 to 9.
    #[error("compression level {0} is outside 0..={MAX_COMPRESSION_LEVEL}")]
    InvalidCompressionLevel(u32),
    /// A zero send interval; omit the interval to disable pacing.
    #[error("send interval must be non-zero")]
    ZeroSendInterval,
    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Limits imposed by the underlying transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Longest text one transport call may carry.
    pub max_message_len: usize,
    /// Characters the transport reserves from each call for its own use.
    pub message_overhead: usize,
    /// Milliseconds between transport calls; `None` disables pacing.
    pub send_interval_ms: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            message_overhead: 0,
            send_interval_ms: Some(DEFAULT_SEND_INTERVAL_MS),
        }
    }
}

impl TransportConfig {
    /// Text available for one encoded packet.
    #[must_use]
    pub fn text_budget(&self) -> usize {
        self.max_message_len.saturating_sub(self.message_overhead)
    }

    #[must_use]
    pub fn send_interval(&self) -> Option<Duration> {
        self.send_interval_ms.map(Duration::from_millis)
    }
}

/// Frame body compression settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub level: u32,
    /// Largest body a compressed frame may inflate to. Applies whether or not
    /// outbound compression is enabled.
    pub max_inflated_len: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: DEFAULT_COMPRESSION_LEVEL,
            max_inflated_len: DEFAULT_MAX_INFLATED_LEN,
        }
    }
}

/// Complete configuration for a `chunkwire` endpoint.
///
/// # Examples
///
/// ```
/// use chunkwire::config::ChunkwireConfig;
///
/// let config = ChunkwireConfig::from_json_str(r#"{"transport": {"max_message_len": 100}}"#)
///     .expect("valid config");
/// assert_eq!(config.fragmentation().expect("budget").max_fragment_payload().get(), 70);
/// assert!(config.compression.enabled);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkwireConfig {
    pub transport: TransportConfig,
    pub compression: CompressionConfig,
    pub eviction: EvictionPolicy,
}

impl ChunkwireConfig {
    /// Start building a configuration from the defaults.
    #[must_use]
    pub fn builder() -> ChunkwireConfigBuilder { ChunkwireConfigBuilder::default() }

    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid JSON and any validation
    /// error from [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document from a reader.
    ///
    /// # Errors
    ///
    /// See [`from_json_str`](Self::from_json_str).
    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting for consistency.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression.level > MAX_COMPRESSION_LEVEL {
            return Err(ConfigError::InvalidCompressionLevel(self.compression.level));
        }
        if self.transport.send_interval_ms == Some(0) {
            return Err(ConfigError::ZeroSendInterval);
        }
        self.fragmentation().map(drop)
    }

    /// Fragment sizing for the configured transport budget.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BudgetTooSmall`] if a packet cannot carry any
    /// fragment data.
    pub fn fragmentation(&self) -> Result<FragmentationConfig, ConfigError> {
        FragmentationConfig::for_transport_budget(self.transport.text_budget()).ok_or(
            ConfigError::BudgetTooSmall {
                max_message_len: self.transport.max_message_len,
                message_overhead: self.transport.message_overhead,
            },
        )
    }

    /// Fragmenter sized for the transport budget.
    ///
    /// # Errors
    ///
    /// See [`fragmentation`](Self::fragmentation).
    pub fn fragmenter(&self) -> Result<Fragmenter, ConfigError> {
        Ok(Fragmenter::from_config(&self.fragmentation()?))
    }

    /// Framer using the configured compression settings.
    #[must_use]
    pub fn framer(&self) -> PayloadFramer {
        let codec = CompressionCodec::new(self.compression.level)
            .with_max_inflated_len(self.compression.max_inflated_len);
        PayloadFramer::new(codec).with_compression(self.compression.enabled)
    }

    /// Send queue builder paced by the configured interval.
    #[must_use]
    pub fn send_queue(&self) -> SendQueueBuilder {
        SendQueue::builder().interval(self.transport.send_interval())
    }
}

/// Validated construction of [`ChunkwireConfig`].
#[derive(Clone, Debug, Default)]
pub struct ChunkwireConfigBuilder {
    config: ChunkwireConfig,
}

impl ChunkwireConfigBuilder {
    #[must_use]
    pub fn max_message_len(mut self, len: usize) -> Self {
        self.config.transport.max_message_len = len;
        self
    }

    #[must_use]
    pub fn message_overhead(mut self, overhead: usize) -> Self {
        self.config.transport.message_overhead = overhead;
        self
    }

    /// Set the spacing between transport calls, rounded down to whole
    /// milliseconds. `None` disables pacing.
    #[must_use]
    pub fn send_interval(mut self, interval: Option<Duration>) -> Self {
        self.config.transport.send_interval_ms =
            interval.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn compression(mut self, enabled: bool) -> Self {
        self.config.compression.enabled = enabled;
        self
    }

    #[must_use]
    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.compression.level = level;
        self
    }

    /// Cap the size a compressed frame body may inflate to.
    #[must_use]
    pub fn max_inflated_len(mut self, len: usize) -> Self {
        self.config.compression.max_inflated_len = len;
        self
    }

    #[must_use]
    pub fn eviction(mut self, policy: EvictionPolicy) -> Self {
        self.config.eviction = policy;
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// See [`ChunkwireConfig::validate`].
    pub fn build(self) -> Result<ChunkwireConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
