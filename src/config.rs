//! Tuning knobs read from `<root>/config.toml` and `VSTORE_*` variables.
//!
//! ```toml
//! author_name = "vstore"
//! author_email = "vstore@localhost"
//! remote_name = "origin"
//! select_attempts = 3
//! ```
//!
//! Environment variables win over the file, e.g. `VSTORE_AUTHOR_NAME=bot`.

use crate::error::{Result, VstoreError};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

pub const ENV_PREFIX: &str = "VSTORE";

// Other VSTORE_* variables (password, root, log filter) stay out of the config map
const TUNING_VARS: [&str; 4] = [
    "VSTORE_AUTHOR_NAME",
    "VSTORE_AUTHOR_EMAIL",
    "VSTORE_REMOTE_NAME",
    "VSTORE_SELECT_ATTEMPTS",
];

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Author and committer name on every commit
    #[serde(default = "default_author_name")]
    pub author_name: String,
    #[serde(default = "default_author_email")]
    pub author_email: String,
    /// Remote pulled from and pushed to
    #[serde(default = "default_remote_name")]
    pub remote_name: String,
    /// How many times an unreadable selection is asked again
    #[serde(default = "default_select_attempts")]
    pub select_attempts: u32,
}

fn default_author_name() -> String {
    "vstore".into()
}

fn default_author_email() -> String {
    "vstore@localhost".into()
}

fn default_remote_name() -> String {
    "origin".into()
}

fn default_select_attempts() -> u32 {
    3
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            author_name: default_author_name(),
            author_email: default_author_email(),
            remote_name: default_remote_name(),
            select_attempts: default_select_attempts(),
        }
    }
}

impl StoreConfig {
    /// Load from `config_path` (optional) with environment overrides
    pub fn load(config_path: &Path) -> Result<Self> {
        let path = config_path
            .to_str()
            .ok_or_else(|| VstoreError::Config("Invalid config path".into()))?;

        let cfg = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(Some(tuning_env())),
            )
            .build()
            .map_err(|err| VstoreError::Config(format!("Failed to load config: {err}")))?;

        let store_config: StoreConfig = cfg
            .try_deserialize()
            .map_err(|err| VstoreError::Config(format!("Invalid config: {err}")))?;
        store_config.validate()?;
        Ok(store_config)
    }

    fn validate(&self) -> Result<()> {
        if self.author_name.trim().is_empty() {
            return Err(VstoreError::Config("author_name must not be empty".into()));
        }
        if self.remote_name.trim().is_empty() {
            return Err(VstoreError::Config("remote_name must not be empty".into()));
        }
        if self.select_attempts == 0 {
            return Err(VstoreError::Config(
                "select_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn tuning_env() -> config::Map<String, String> {
    std::env::vars()
        .filter(|(key, _)| TUNING_VARS.contains(&key.as_str()))
        .collect()
}
