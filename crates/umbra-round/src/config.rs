//! Round timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoundConfig
// ---------------------------------------------------------------------------

/// How long each phase of a round lasts.
///
/// Durations are plain seconds so the struct reads naturally from JSON.
/// Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Wait between rounds before play starts.
    pub intermission_secs: f64,

    /// Maximum length of the Playing phase.
    pub round_secs: f64,

    /// Pause on the results before looping back to intermission.
    pub round_end_secs: f64,

    /// Delay between elimination and the character coming back.
    pub respawn_delay_secs: f64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            intermission_secs: 10.0,
            round_secs: 120.0,
            round_end_secs: 5.0,
            respawn_delay_secs: 3.0,
        }
    }
}

impl RoundConfig {
    /// Intermission length.
    pub fn intermission(&self) -> Duration {
        secs(self.intermission_secs)
    }

    /// Playing phase length.
    pub fn round_length(&self) -> Duration {
        secs(self.round_secs)
    }

    /// RoundEnd phase length.
    pub fn round_end(&self) -> Duration {
        secs(self.round_end_secs)
    }

    /// Respawn delay.
    pub fn respawn_delay(&self) -> Duration {
        secs(self.respawn_delay_secs)
    }

    /// Checks that every duration is a finite, non-negative number.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("intermission_secs", self.intermission_secs),
            ("round_secs", self.round_secs),
            ("round_end_secs", self.round_end_secs),
            ("respawn_delay_secs", self.respawn_delay_secs),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("round.{name} must be a non-negative number, got {value}"));
            }
        }
        Ok(())
    }
}

/// Negative or non-finite values clamp to zero; `validate` rejects them
/// before a config is used.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
