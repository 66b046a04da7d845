use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::SettingsError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RefreshConfig {
    /// Upper bound for each ledger read (unit: milliseconds)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Period of the background refresh loop (unit: milliseconds).
    /// 0 disables automatic refresh.
    #[serde(default = "default_auto_refresh_interval_ms")]
    pub auto_refresh_interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
            auto_refresh_interval_ms: default_auto_refresh_interval_ms(),
        }
    }
}

impl RefreshConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// `None` when automatic refresh is disabled
    pub fn auto_refresh_interval(&self) -> Option<Duration> {
        (self.auto_refresh_interval_ms > 0).then(|| Duration::from_millis(self.auto_refresh_interval_ms))
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.read_timeout_ms == 0 {
            return Err(SettingsError::Invalid(
                "refresh.read_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.auto_refresh_interval_ms > 0 && self.auto_refresh_interval_ms < self.read_timeout_ms {
            return Err(SettingsError::Invalid(format!(
                "refresh.auto_refresh_interval_ms ({}) must not be shorter than refresh.read_timeout_ms ({})",
                self.auto_refresh_interval_ms, self.read_timeout_ms
            )));
        }

        Ok(())
    }
}

fn default_read_timeout_ms() -> u64 {
    10_000
}
fn default_auto_refresh_interval_ms() -> u64 {
    30_000
}
