//! # Client Configuration
//!
//! Settings for a protocol connection, loadable from TOML.
//!
//! ```toml
//! protocol_version = "1.12.2"   # number or release name
//! compression_threshold = -1    # <= 0 disables compression
//! max_frame_length = 2097151
//!
//! [receive]
//! probe_interval = 26
//! backoff_divisor = 2
//! ```
//!
//! Every key is optional.

use crate::{
    protocol::{
        framing::{CompressionThreshold, FrameCodec, MAX_FRAME_LENGTH},
        version::{Breakpoint, ProtocolVersion},
    },
    receive::ReliableReceiver,
};
use serde::Deserialize;
use std::{io, path::Path};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("receive.probe_interval must be at least 1")]
    ZeroProbeInterval,
    #[error("receive.backoff_divisor must be at least 2 (got {0})")]
    BackoffDivisor(u32),
    #[error("invalid configuration")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Version announced in the handshake and used to pick packet layouts.
    ///
    /// # Default
    /// 1.12.2 (protocol 340)
    pub protocol_version: ProtocolVersion,

    /// Compression threshold in bytes, as the server would send it.
    ///
    /// # Default
    /// `-1` (disabled)
    pub compression_threshold: i32,

    /// Largest frame accepted or sent.
    ///
    /// # Default
    /// 2097151, the largest length a three-byte VarInt can hold
    pub max_frame_length: usize,

    pub receive: ReceiveConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: Breakpoint::V1_12_2.protocol(),
            compression_threshold: -1,
            max_frame_length: MAX_FRAME_LENGTH,
            receive: ReceiveConfig::default(),
        }
    }
}

/// Liveness probing of stalled reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReceiveConfig {
    /// Read attempts without completing before the connection is probed.
    pub probe_interval: u32,
    /// Divides the attempt counter after a probe finds the connection alive.
    pub backoff_divisor: u32,
}

impl Default for ReceiveConfig {
    fn default() -> Self {
        Self {
            probe_interval: 26,
            backoff_divisor: 2,
        }
    }
}

impl ReceiveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_interval == 0 {
            return Err(ConfigError::ZeroProbeInterval);
        }
        if self.backoff_divisor < 2 {
            return Err(ConfigError::BackoffDivisor(self.backoff_divisor));
        }
        Ok(())
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs_err::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.receive.validate()?;
        Ok(config)
    }

    pub fn compression_threshold(&self) -> Option<CompressionThreshold> {
        CompressionThreshold::from_raw(self.compression_threshold)
    }

    /// A codec with this configuration's compression and frame limit.
    pub fn frame_codec(&self) -> FrameCodec {
        let mut codec = FrameCodec::new();
        codec.set_compression(self.compression_threshold());
        codec.set_max_frame_length(self.max_frame_length);
        codec
    }

    pub fn receiver(&self) -> ReliableReceiver {
        ReliableReceiver::new(&self.receive)
    }
}
