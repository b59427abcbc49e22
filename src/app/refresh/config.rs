//! Refresh scheduler configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::refresh;

/// Timing for the periodic refresh loop; the `[refresh]` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Fixed period between ticks
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// How long `stop` waits for the loop to confirm exit
    #[serde(with = "humantime_serde")]
    pub stop_timeout: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: refresh::DEFAULT_INTERVAL,
            stop_timeout: refresh::STOP_TIMEOUT,
        }
    }
}

impl RefreshConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }
}
