#![allow(dead_code)]

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use git2::{Repository, Signature};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PASSWORD: &str = "hunter2";
pub const MASTER_KEY: &str = "mk";

/// A scratch root directory plus a bare remote seeded with one commit.
pub struct Fixture {
    _temp: TempDir,
    pub root: PathBuf,
    pub remote_dir: PathBuf,
    pub remote: String,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path().join("vstore");
        let remote_dir = temp.path().join("remote.git");
        let remote = seeded_remote(&remote_dir);
        Self {
            _temp: temp,
            root,
            remote_dir,
            remote,
        }
    }

    /// vstore bound to this fixture's root and password
    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("vstore");
        cmd.env("VSTORE_ROOT", &self.root)
            .env("VSTORE_PASSWORD", PASSWORD)
            .env_remove("VSTORE_NEW_PASSWORD")
            .env_remove("VSTORE_LOG");
        cmd
    }

    /// Answers to the first-run questions: master key, then remote URL
    pub fn first_run_answers(&self) -> String {
        format!("{MASTER_KEY}\n{}\n", self.remote)
    }

    /// Create the settings and clone the remote
    pub fn bootstrap(&self) {
        self.cmd()
            .arg("ls")
            .write_stdin(self.first_run_answers())
            .assert()
            .success();
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root.join("repo").join("store")
    }

    pub fn remote_head_message(&self) -> String {
        let repo = Repository::open_bare(&self.remote_dir).expect("failed to open remote");
        let commit = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .expect("remote has no commits");
        commit.message().unwrap_or_default().to_string()
    }
}

/// Create a bare repository at `dir` whose `main` branch holds a README.
pub fn seeded_remote(dir: &Path) -> String {
    let repo = Repository::init_bare(dir).expect("failed to init bare repo");
    let blob = repo.blob(b"# secrets\n").expect("failed to write blob");
    let mut builder = repo.treebuilder(None).expect("failed to build tree");
    builder
        .insert("README.md", blob, 0o100644)
        .expect("failed to insert README");
    let tree = repo
        .find_tree(builder.write().expect("failed to write tree"))
        .expect("failed to find tree");
    let sig = Signature::now("seed", "seed@example.com").expect("failed to build signature");
    repo.commit(Some("refs/heads/main"), &sig, &sig, "seed", &tree, &[])
        .expect("failed to seed commit");
    repo.set_head("refs/heads/main").expect("failed to set HEAD");
    dir.to_str().expect("non-UTF-8 temp path").to_string()
}
