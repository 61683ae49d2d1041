//! Engine configuration.
//!
//! [`EngineConfig`] is plain data, deserializable from JSON with every field
//! optional:
//!
//! ```
//! use kraken_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "fixed_dt": 0.02 }"#).unwrap();
//! assert_eq!(config.fixed_dt, 0.02);
//! assert_eq!(config.log_capacity, 1024);
//! ```

use std::path::Path;

use anyhow::Context;
use kraken_ecs::log::DEFAULT_LOG_CAPACITY;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors from parsing or validating an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A time step that is zero, negative, or not finite.
    #[error("{field} must be positive and finite, got {value}")]
    InvalidTimeStep { field: &'static str, value: f64 },

    #[error("log_capacity must be at least 1")]
    ZeroLogCapacity,

    #[error("max_delta_time ({max}) is smaller than fixed_dt ({fixed})")]
    ClampBelowStep { max: f64, fixed: f64 },
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Seconds per [`FrameLoop::tick`](crate::frame::FrameLoop::tick).
    pub fixed_dt: f64,
    /// Upper bound applied to externally supplied frame deltas, so a stall
    /// (debugger, window drag) does not turn into one huge step.
    pub max_delta_time: f64,
    /// Records kept by the world's log book before the oldest are dropped.
    pub log_capacity: usize,
    /// Default `tracing` filter directive; `RUST_LOG` overrides it.
    pub log_filter: String,
}

impl Default for EngineConfig {
    /// 60 Hz, 0.25 s clamp, 1024 log records, `warn`.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_delta_time: 0.25,
            log_capacity: DEFAULT_LOG_CAPACITY,
            log_filter: "warn".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("fixed_dt", self.fixed_dt),
            ("max_delta_time", self.max_delta_time),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidTimeStep { field, value });
            }
        }
        if self.max_delta_time < self.fixed_dt {
            return Err(ConfigError::ClampBelowStep {
                max: self.max_delta_time,
                fixed: self.fixed_dt,
            });
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::ZeroLogCapacity);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
