//! # Settings Bootstrap
//!
//! `settings.json.enc` holds the remote URL and the master key. It is
//! unlocked with the user's password; the master key then encrypts every
//! secret object. Because the two secrets differ, the password can be
//! changed ([`change_password`]) without re-encrypting the store.
//!
//! Plaintext format:
//!
//! ```json
//! {"remote": "git@host:repo.git", "master_key": "..."}
//! ```

use crate::crypto;
use crate::error::{Result, VstoreError};
use crate::paths::{write_private, StorePaths};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Settings {
    pub remote: String,
    pub master_key: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("remote", &self.remote)
            .field("master_key", &"[REDACTED]")
            .finish()
    }
}

impl Settings {
    pub fn new(remote: impl Into<String>, master_key: impl Into<String>) -> Result<Self> {
        let settings = Self {
            remote: remote.into().trim().to_string(),
            master_key: master_key.into(),
        };
        if settings.remote.is_empty() {
            return Err(VstoreError::InvalidSettings("remote must not be empty".into()));
        }
        if settings.master_key.is_empty() {
            return Err(VstoreError::InvalidSettings(
                "master key must not be empty".into(),
            ));
        }
        Ok(settings)
    }
}

/// Asks the user for the values of a brand new settings file
pub trait SettingsPrompt {
    fn master_key(&mut self) -> Result<String>;
    fn remote(&mut self) -> Result<String>;
}

/// Decrypt the settings file, creating it interactively when absent
pub fn load_or_create(
    paths: &StorePaths,
    password: &str,
    prompt: &mut dyn SettingsPrompt,
) -> Result<Settings> {
    match load(paths, password)? {
        Some(settings) => Ok(settings),
        None => {
            info!(path = %paths.settings_file().display(), "no settings file, creating one");
            let master_key = prompt.master_key()?;
            let remote = prompt.remote()?;
            let settings = Settings::new(remote, master_key)?;
            save(paths, &settings, password)?;
            Ok(settings)
        }
    }
}

/// Decrypt the settings file, `None` if it doesn't exist
pub fn load(paths: &StorePaths, password: &str) -> Result<Option<Settings>> {
    let blob = match fs::read(paths.settings_file()) {
        Ok(blob) => blob,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let plaintext = crypto::open(&blob, password.as_bytes())?;
    let settings: Settings = serde_json::from_slice(&plaintext)
        .map_err(|e| VstoreError::InvalidSettings(e.to_string()))?;
    Ok(Some(settings))
}

/// Encrypt `settings` under `password` with a fresh salt and write them
pub fn save(paths: &StorePaths, settings: &Settings, password: &str) -> Result<()> {
    paths.ensure_root()?;
    let plaintext = Zeroizing::new(serde_json::to_vec(settings)?);
    let blob = crypto::seal(&plaintext, password.as_bytes())?;
    write_private(&paths.settings_file(), &blob)
}

/// Re-encrypt the settings under a new password; the master key is unchanged
pub fn change_password(paths: &StorePaths, old_password: &str, new_password: &str) -> Result<()> {
    let settings = load(paths, old_password)?.ok_or_else(|| {
        VstoreError::InvalidSettings("no settings file to re-encrypt".into())
    })?;
    save(paths, &settings, new_password)?;
    info!("settings re-encrypted under the new password");
    Ok(())
}
