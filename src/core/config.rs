//! Tracker configuration with documented constants
//!
//! Every tunable of the telemetry engine lives here. Values can be loaded from
//! a TOML file; keys that are absent keep their defaults.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::error::{Result, TrackerError};

/// Configuration for the telemetry engine and its producers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    // === STORE ===
    /// Base URL of the persistence service queried once at startup
    ///
    /// The bulk load issues `GET {api_url}/animals`.
    pub api_url: String,

    // === STREAM CHANNEL ===
    /// Address of the TCP publisher (`host:port`)
    ///
    /// When unset the binary runs against an in-process demo publisher.
    pub stream_addr: Option<String>,

    /// The single topic carrying animal updates
    ///
    /// Frames on any other topic (chat traffic, for instance) are ignored.
    pub topic: String,

    /// Delay before the first reconnect attempt after a channel failure (ms)
    ///
    /// Doubles after every failed attempt up to `reconnect_max_ms`.
    pub reconnect_initial_ms: u64,

    /// Upper bound for the reconnect backoff (ms)
    pub reconnect_max_ms: u64,

    /// Capacity of the per-session frame queue between transport and channel
    pub frame_buffer: usize,

    // === MOTION SIMULATOR ===
    /// Period of the simulated-motion timer (ms)
    ///
    /// At 5000 every entity jitters once every five seconds while the
    /// blinking option is on and playback is running.
    pub motion_period_ms: u64,

    /// Maximum jitter per axis (degrees)
    ///
    /// Offsets are drawn uniformly from `[-motion_jitter_deg, motion_jitter_deg]`
    /// independently for latitude and longitude. 0.005° is roughly 550 m.
    pub motion_jitter_deg: f64,

    /// Seed for the jitter RNG; a random seed is drawn when unset
    pub seed: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:4000".into(),

            stream_addr: None,
            topic: "animalData".into(),
            reconnect_initial_ms: 500,
            reconnect_max_ms: 10_000,
            frame_buffer: 256,

            motion_period_ms: 5000,
            motion_jitter_deg: 0.005,
            seed: None,
        }
    }
}

impl TrackerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TrackerConfig =
            toml::from_str(content).map_err(|e| TrackerError::Config(e.to_string()))?;
        config.validate().map_err(TrackerError::Config)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.motion_period_ms == 0 {
            return Err("motion_period_ms must be positive".into());
        }

        if !self.motion_jitter_deg.is_finite() || self.motion_jitter_deg < 0.0 {
            return Err(format!(
                "motion_jitter_deg ({}) must be a non-negative number",
                self.motion_jitter_deg
            ));
        }

        if self.reconnect_initial_ms == 0 || self.reconnect_initial_ms > self.reconnect_max_ms {
            return Err(format!(
                "reconnect_initial_ms ({}) should be in 1..=reconnect_max_ms ({})",
                self.reconnect_initial_ms, self.reconnect_max_ms
            ));
        }

        if self.frame_buffer == 0 {
            return Err("frame_buffer must be positive".into());
        }

        if self.topic.trim().is_empty() {
            return Err("topic must not be empty".into());
        }

        Ok(())
    }

    pub fn motion_period(&self) -> Duration {
        Duration::from_millis(self.motion_period_ms)
    }

    pub fn reconnect_initial(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_ms)
    }

    pub fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.motion_period(), Duration::from_secs(5));
        assert_eq!(config.motion_jitter_deg, 0.005);
        assert_eq!(config.topic, "animalData");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TrackerConfig::from_toml_str(
            r#"
            stream_addr = "127.0.0.1:7400"
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.stream_addr.as_deref(), Some("127.0.0.1:7400"));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.motion_period_ms, 5000);
        assert_eq!(config.api_url, "http://localhost:4000");
    }

    #[test]
    fn test_invalid_backoff_rejected() {
        let result = TrackerConfig::from_toml_str(
            r#"
            reconnect_initial_ms = 20000
            reconnect_max_ms = 1000
            "#,
        );
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = TrackerConfig {
            motion_period_ms: 0,
            ..TrackerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_garbage_toml_rejected() {
        let result = TrackerConfig::from_toml_str("motion_period_ms = \"soon\"");
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }
}
