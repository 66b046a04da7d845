use serde::Deserialize;
use serde::Serialize;

use crate::SettingsError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Reconcile with the ledger after every confirmed write
    #[serde(default = "default_refresh_after_action")]
    pub refresh_after_action: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            refresh_after_action: default_refresh_after_action(),
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<(), SettingsError> {
        Ok(())
    }
}

fn default_refresh_after_action() -> bool {
    true
}
