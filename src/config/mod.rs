//! Configuration management for the reconciliation engine and dispatcher.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH` or explicit override file)
//! - Environment variable overrides (`LEDGER_ACCESS__SECTION__KEY`)
//! - Component-wise validation

mod dispatch;
mod refresh;
pub use dispatch::*;
pub use refresh::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::CONFIG_ENV_SEPARATOR;
use crate::SettingsError;

type Result<T> = std::result::Result<T, SettingsError>;

/// Top-level settings.
///
/// Merge order (later sources override earlier):
/// 1. Type defaults
/// 2. File named by the `CONFIG_PATH` environment variable, if set
/// 3. `LEDGER_ACCESS__*` environment variables
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Settings {
    /// Snapshot refresh behaviour
    #[serde(default)]
    pub refresh: RefreshConfig,
    /// Write action behaviour
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Settings {
    /// Loads settings from defaults, `CONFIG_PATH` and the environment.
    ///
    /// Does NOT validate; call [`Settings::validate`] once every override is
    /// applied.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        let settings: Self = builder.add_source(env_source()).build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Applies an override file on top of the current values. Environment
    /// variables are re-applied last so they keep the highest priority.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Convenience for hosts: `new()`, optional override file, `validate()`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let settings = Self::new()?;
        let settings = match path {
            Some(path) => settings.with_override_config(path)?,
            None => settings,
        };
        settings.validate()
    }

    pub fn validate(self) -> Result<Self> {
        self.refresh.validate()?;
        self.dispatch.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator(CONFIG_ENV_SEPARATOR)
        .ignore_empty(true)
        .try_parsing(true)
}
