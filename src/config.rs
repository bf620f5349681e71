use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::time::Duration;

use crate::error::NotifierError;

/// Timing configuration for staged runs
///
/// Defaults match the dashboard's observed behavior: the banner
/// appears with its first step half a second after the trigger, steps
/// advance just under once a second, and a completed banner lingers
/// for five seconds before a short exit animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Delay before the first step publishes
    pub initial_delay_ms: u64,
    /// Delay between consecutive steps
    pub step_interval_ms: u64,
    /// How long a completed banner stays visible
    pub auto_close_ms: u64,
    /// Delay between hiding the banner and clearing its message,
    /// leaving room for an exit animation
    pub exit_animation_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            step_interval_ms: 900,
            auto_close_ms: 5000,
            exit_animation_ms: 300,
        }
    }
}

impl NotifierConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    pub fn auto_close(&self) -> Duration {
        Duration::from_millis(self.auto_close_ms)
    }

    pub fn exit_animation(&self) -> Duration {
        Duration::from_millis(self.exit_animation_ms)
    }

    /// Load timings from a TOML file; missing keys keep their defaults
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NotifierError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}
