//! Polling configuration.

use bigdeal_core::DEFAULT_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by every subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between poll cycles (ms)
    pub interval_ms: u64,
    /// Threshold for recipients that never set their own
    pub default_threshold: i64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl PollConfig {
    /// Poll interval; never zero.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}
