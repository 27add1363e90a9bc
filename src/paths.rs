//! # Store Layout
//!
//! Everything vstore keeps on disk lives under one root directory:
//!
//! ```text
//! <root>/
//! ├── settings.json.enc   encrypted settings (remote + master key)
//! ├── config.toml         optional tuning, see [`crate::config`]
//! ├── .lock               advisory lock held while a command runs
//! └── repo/               git working tree cloned from the remote
//!     └── store/          secret objects, one encrypted file each
//! ```
//!
//! The default root is `<user cache dir>/vstore`.

use crate::error::{Result, VstoreError};
use std::fs;
use std::path::{Path, PathBuf};

pub const ROOT_FOLDER_NAME: &str = "vstore";
pub const SETTINGS_FILE: &str = "settings.json.enc";
pub const CONFIG_FILE: &str = "config.toml";
pub const LOCK_FILE: &str = ".lock";
pub const REPO_FOLDER_NAME: &str = "repo";
pub const STORE_FOLDER_NAME: &str = "store";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Use `root` when given, the platform cache directory otherwise
    pub fn discover(root: Option<&Path>) -> Result<Self> {
        match root {
            Some(root) => Ok(Self::new(root)),
            None => dirs::cache_dir()
                .map(|dir| Self::new(dir.join(ROOT_FOLDER_NAME)))
                .ok_or(VstoreError::RootUnavailable),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.root.join(REPO_FOLDER_NAME)
    }

    pub fn store_dir(&self) -> PathBuf {
        self.repo_dir().join(STORE_FOLDER_NAME)
    }

    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Delete the root directory and everything in it
    pub fn reset(&self) -> Result<bool> {
        if !self.root.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.root)?;
        Ok(true)
    }
}

/// Write `contents` to `path`, owner read/write only on Unix
pub fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let temp = TempDir::new().unwrap();
        let paths = StorePaths::new(temp.path());

        assert_eq!(paths.settings_file(), temp.path().join("settings.json.enc"));
        assert_eq!(paths.repo_dir(), temp.path().join("repo"));
        assert_eq!(paths.store_dir(), temp.path().join("repo").join("store"));
        assert_eq!(paths.lock_file(), temp.path().join(".lock"));
    }

    #[test]
    fn test_discover_prefers_explicit_root() {
        let paths = StorePaths::discover(Some(Path::new("/tmp/somewhere"))).unwrap();
        assert_eq!(paths.root(), Path::new("/tmp/somewhere"));
    }

    #[test]
    fn test_discover_defaults_to_cache_dir() {
        if let Some(cache) = dirs::cache_dir() {
            let paths = StorePaths::discover(None).unwrap();
            assert_eq!(paths.root(), cache.join("vstore"));
        }
    }

    #[test]
    fn test_reset_removes_everything() {
        let temp = TempDir::new().unwrap();
        let paths = StorePaths::new(temp.path().join("root"));

        assert!(!paths.reset().unwrap());

        fs::create_dir_all(paths.store_dir().join("svc")).unwrap();
        fs::write(paths.settings_file(), b"x").unwrap();
        assert!(paths.reset().unwrap());
        assert!(!paths.root().exists());
    }

    #[test]
    fn test_write_private_permissions_unix() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let temp = TempDir::new().unwrap();
            let path = temp.path().join("nested").join("file");
            write_private(&path, b"secret").unwrap();

            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
            assert_eq!(fs::read(&path).unwrap(), b"secret");
        }
    }
}
