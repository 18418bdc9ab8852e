//! Game configuration: loading, defaults and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use umbra_detect::DetectionConfig;
use umbra_round::RoundConfig;
use umbra_tick::{FrameConfig, FramePolicy};

/// Errors from reading or validating a [`GameConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The config parsed but a value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything tunable about a simulation.
///
/// Every field has a default, so `{}` is a complete config:
///
/// ```json
/// {
///   "tick_rate_hz": 30,
///   "round": { "intermission_secs": 10, "round_secs": 120 },
///   "detection": { "exposure_threshold_secs": 0.5, "light": { "range": 30 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Simulation frames per second.
    pub tick_rate_hz: u32,

    /// Round phase timings.
    pub round: RoundConfig,

    /// Lights and exposure.
    pub detection: DetectionConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            round: RoundConfig::default(),
            detection: DetectionConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=FrameConfig::MAX_RATE_HZ).contains(&self.tick_rate_hz) {
            return Err(ConfigError::Invalid(format!(
                "tick_rate_hz must be in 1..={}, got {}",
                FrameConfig::MAX_RATE_HZ,
                self.tick_rate_hz
            )));
        }
        self.round.validate().map_err(ConfigError::Invalid)?;
        self.detection.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Frame pacing derived from the tick rate.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            rate_hz: self.tick_rate_hz,
            policy: FramePolicy::Skip,
            ..FrameConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = GameConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_partial_nested_config() {
        let config = GameConfig::from_json_str(
            r#"{ "tick_rate_hz": 60, "round": { "round_secs": 90 }, "detection": { "light": { "speed": 2.5 } } }"#,
        )
        .unwrap();
        assert_eq!(config.tick_rate_hz, 60);
        assert_eq!(config.round.round_length(), Duration::from_secs(90));
        assert_eq!(config.round.intermission(), Duration::from_secs(10));
        assert_eq!(config.detection.light.speed, 2.5);
        assert_eq!(config.detection.light.range, 30.0);
    }

    #[test]
    fn test_tick_rate_out_of_range() {
        let err = GameConfig::from_json_str(r#"{ "tick_rate_hz": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = GameConfig::from_json_str(r#"{ "tick_rate_hz": 500 }"#).unwrap_err();
        assert!(err.to_string().contains("tick_rate_hz"));
    }

    #[test]
    fn test_nested_validation_errors_surface() {
        let err = GameConfig::from_json_str(r#"{ "detection": { "exposure_threshold_secs": -1 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("exposure_threshold_secs")));
    }

    #[test]
    fn test_malformed_json() {
        let err = GameConfig::from_json_str("{ tick_rate_hz: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = GameConfig::load("/definitely/not/here/umbra.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_frame_config_follows_tick_rate() {
        let config = GameConfig {
            tick_rate_hz: 20,
            ..GameConfig::default()
        };
        assert_eq!(config.frame_config().frame_duration(), Duration::from_millis(50));
    }
}
