//! Configuration type definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use crate::queue::QUEUE_CAPACITY;
pub use ddpico_protocol::MAX_FRAME_SIZE;

/// Maximum LED outputs per controller (one per destination id)
pub const MAX_OUTPUTS: usize = 8;

/// Default interval between statistics reports
pub const DEFAULT_STATS_INTERVAL_MS: u32 = 5000;

/// Window for the receive-rate summary
pub const RECEIVE_RATE_INTERVAL_MS: u32 = 1000;

/// Number of parse failures logged in detail before going quiet
pub const DEFAULT_LOG_FIRST_FAILURES: u32 = 5;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `min_scale` is above `max_scale`
    InvertedScale,
    /// Driver reports zero LEDs
    ZeroLengthStrip,
    /// Another output already listens on this destination id
    DuplicateDestination(u8),
    /// All output slots are in use
    TooManyOutputs,
}

/// Brightness limiter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LimiterConfig {
    /// Scale with few LEDs lit (255 = 100%)
    pub max_scale: u8,
    /// Scale with every LED lit (102 ≈ 40%)
    pub min_scale: u8,
    /// Lit-pixel count up to which `max_scale` applies
    pub threshold: u16,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_scale: 255,
            min_scale: 102,
            threshold: 4,
        }
    }
}

impl LimiterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_scale > self.max_scale {
            return Err(ConfigError::InvertedScale);
        }
        Ok(())
    }
}

/// One LED output addressed by a DDP destination id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputConfig {
    /// DDP destination id this output answers to
    pub dest_id: u8,
    /// Brightness limiting for this strip
    pub limiter: LimiterConfig,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dest_id: ddpico_protocol::packet::DEST_ID_DEFAULT,
            limiter: LimiterConfig::default(),
        }
    }
}

impl OutputConfig {
    /// Output on `dest_id` with the default limiter
    pub fn new(dest_id: u8) -> Self {
        Self {
            dest_id,
            ..Default::default()
        }
    }
}

/// Controller behavior settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControllerConfig {
    /// Interval between statistics reports (ms)
    pub stats_interval_ms: u32,
    /// Detailed log lines for the first N parse failures
    pub log_first_failures: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            stats_interval_ms: DEFAULT_STATS_INTERVAL_MS,
            log_first_failures: DEFAULT_LOG_FIRST_FAILURES,
        }
    }
}
