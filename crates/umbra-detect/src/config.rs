//! Detection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shape and motion of every light spawned for a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Maximum detection distance.
    pub range: f64,

    /// Half of the cone's opening angle, in degrees.
    pub half_angle_deg: f64,

    /// Travel speed along the light's path, units per second.
    pub speed: f64,

    /// Radius of the fixture sphere a line-of-sight ray has to reach.
    pub fixture_radius: f64,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            range: 30.0,
            half_angle_deg: 30.0,
            speed: 8.0,
            fixture_radius: 0.5,
        }
    }
}

impl LightConfig {
    /// Half-angle in radians.
    pub fn half_angle(&self) -> f64 {
        self.half_angle_deg.to_radians()
    }
}

/// Detection engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Continuous exposure that eliminates a player, in seconds.
    pub exposure_threshold_secs: f64,

    /// Light parameters.
    pub light: LightConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            exposure_threshold_secs: 0.5,
            light: LightConfig::default(),
        }
    }
}

impl DetectionConfig {
    /// Exposure threshold as a `Duration`.
    pub fn exposure_threshold(&self) -> Duration {
        Duration::try_from_secs_f64(self.exposure_threshold_secs).unwrap_or(Duration::ZERO)
    }

    /// Rejects settings under which detection is meaningless.
    pub fn validate(&self) -> Result<(), String> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(format!("detection.{name} must be positive, got {value}"))
            }
        };
        positive("exposure_threshold_secs", self.exposure_threshold_secs)?;
        positive("light.range", self.light.range)?;

        let half_angle = self.light.half_angle_deg;
        if !(half_angle > 0.0 && half_angle <= 180.0) {
            return Err(format!(
                "detection.light.half_angle_deg must be in (0, 180], got {half_angle}"
            ));
        }
        for (name, value) in [
            ("light.speed", self.light.speed),
            ("light.fixture_radius", self.light.fixture_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("detection.{name} must be non-negative, got {value}"));
            }
        }
        Ok(())
    }
}
