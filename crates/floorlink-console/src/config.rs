/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed console configuration
[POS]:    Configuration layer - station setup
[UPDATE]: When adding new configuration options
*/

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the operator console
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleConfig {
    /// Base URL of the floor task service
    pub server_url: String,
    /// Station this console runs on
    pub station_id: String,
    /// Operator logged in at the station
    pub operator_id: String,
    /// Bearer token issued by the auth service
    pub auth_token: String,
    /// Tuning knobs, all optional
    #[serde(default)]
    pub tuning: TuningConfig,
}

/// Timing overrides. Defaults match the hardware on the floor; override only
/// for slow scanners or test rigs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TuningConfig {
    /// Scanner burst debounce in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub scan_debounce_ms: u64,
    /// Pause between a matched step and the next prompt, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub step_settle_ms: u64,
    /// Gap between settled backlog polls, in seconds
    #[serde(default = "default_poll_secs")]
    pub poll_interval_secs: u64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            scan_debounce_ms: default_debounce_ms(),
            step_settle_ms: default_settle_ms(),
            poll_interval_secs: default_poll_secs(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    120
}

fn default_settle_ms() -> u64 {
    400
}

fn default_poll_secs() -> u64 {
    3
}

impl ConsoleConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.server_url.trim().is_empty() {
            anyhow::bail!("server_url must not be empty");
        }
        if self.station_id.trim().is_empty() {
            anyhow::bail!("station_id must not be empty");
        }
        if self.operator_id.trim().is_empty() {
            anyhow::bail!("operator_id must not be empty");
        }
        Ok(())
    }
}

impl TuningConfig {
    pub fn scan_debounce(&self) -> Duration {
        Duration::from_millis(self.scan_debounce_ms)
    }

    pub fn step_settle(&self) -> Duration {
        Duration::from_millis(self.step_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
