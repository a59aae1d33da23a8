//! Analysis loop configuration, stored as RON.
//!
//! ```ron
//! (
//!     cycle_period_ms: 33,
//!     shutdown_timeout_ms: 500,
//!     thresholds: (
//!         neck_low: 0.95,
//!         shoulder_low: 0.92,
//!         neck_vert_low: 0.85,
//!         bad_severity: 0.85,
//!     ),
//! )
//! ```

use crate::error::{PostureError, PostureResult};
use cu_posture::Thresholds;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Target period of one analysis cycle, 0 lets the loop run as fast as the source delivers.
    pub cycle_period_ms: u64,
    /// Upper bound on the wait for the worker to exit once a stop was requested.
    pub shutdown_timeout_ms: u64,
    pub thresholds: Thresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cycle_period_ms: 33,
            shutdown_timeout_ms: 500,
            thresholds: Thresholds::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn cycle_period(&self) -> Option<Duration> {
        match self.cycle_period_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn validate(&self) -> PostureResult<()> {
        self.thresholds.validate()?;
        Ok(())
    }

    pub fn deserialize_ron(ron: &str) -> PostureResult<Self> {
        let config: AnalysisConfig =
            ron::from_str(ron).map_err(|e| PostureError::Config(format!("Syntax error in config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn serialize_ron(&self) -> PostureResult<String> {
        let pretty = ron::ser::PrettyConfig::default();
        ron::ser::to_string_pretty(self, pretty)
            .map_err(|e| PostureError::Config(format!("Could not serialize config: {e}")))
    }
}

/// Reads and validates a configuration file.
pub fn read_configuration(config_filename: impl AsRef<Path>) -> PostureResult<AnalysisConfig> {
    let path = config_filename.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| PostureError::Config(format!("Failed to read {}: {e}", path.display())))?;
    AnalysisConfig::deserialize_ron(&content)
}
