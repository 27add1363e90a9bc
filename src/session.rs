//! One command's view of the store: settings unlocked, repository synced,
//! root directory locked against other vstore processes.

use crate::config::StoreConfig;
use crate::document::DocumentAccessor;
use crate::error::Result;
use crate::paths::StorePaths;
use crate::resolver::{self, Disambiguator, ResolvedPath};
use crate::settings::{self, Settings, SettingsPrompt};
use crate::store::{GitStore, SourceRepository, StoreLock};
use std::path::PathBuf;
use tracing::debug;

pub struct Session<R: SourceRepository = GitStore> {
    paths: StorePaths,
    config: StoreConfig,
    settings: Settings,
    repo: R,
    _lock: StoreLock,
}

impl Session<GitStore> {
    /// Lock the root, unlock the settings with `password` and sync the repository.
    ///
    /// Nothing is mutated if syncing fails.
    pub fn open(
        paths: StorePaths,
        password: &str,
        prompt: &mut dyn SettingsPrompt,
    ) -> Result<Self> {
        let config = StoreConfig::load(&paths.config_file())?;
        paths.ensure_root()?;
        let lock = StoreLock::acquire(paths.lock_file())?;

        let settings = settings::load_or_create(&paths, password, prompt)?;
        let repo = GitStore::new(paths.repo_dir(), config.clone());
        repo.ensure_synced(&settings.remote)?;
        debug!(root = %paths.root().display(), "session ready");

        Ok(Self {
            paths,
            config,
            settings,
            repo,
            _lock: lock,
        })
    }
}

impl<R: SourceRepository> Session<R> {
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Password for secret objects
    pub fn master_key(&self) -> &str {
        &self.settings.master_key
    }

    pub fn store_dir(&self) -> PathBuf {
        self.paths.store_dir()
    }

    pub fn documents(&self) -> DocumentAccessor<'_, R> {
        DocumentAccessor::new(&self.repo)
    }

    pub fn resolve(
        &self,
        query: &str,
        disambiguator: &mut dyn Disambiguator,
    ) -> Result<ResolvedPath> {
        resolver::resolve_path(&self.store_dir(), query, disambiguator)
    }
}
