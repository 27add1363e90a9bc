//! # Synchronized Object Store
//!
//! Secret objects are plain files under `store/` in a git working tree
//! cloned from the user's remote. The store keeps two disciplines:
//!
//! - **Pull before read**: [`SourceRepository::ensure_synced`] clones the
//!   remote on first use and pulls on every later run.
//! - **Commit and push after write**: [`SourceRepository::persist_write`]
//!   and [`SourceRepository::persist_remove`] stage exactly one path,
//!   commit it with a fixed author, and push.
//!
//! A failed push leaves the local commit in place. Callers must read a
//! [`VstoreError::PushFailure`] as "saved locally, remote state uncertain".
//!
//! Authentication is delegated to the ambient git setup: SSH agent,
//! credential helpers, or libgit2 defaults.

use crate::config::StoreConfig;
use crate::error::{Result, VstoreError};
use crate::paths::{write_private, STORE_FOLDER_NAME};
use fs2::FileExt;
use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    AnnotatedCommit, Cred, CredentialType, ErrorCode, FetchOptions, PushOptions,
    RemoteCallbacks, Repository, Signature,
};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Version-controlled storage for secret objects.
///
/// Object paths are relative to the `store/` folder of the working tree.
pub trait SourceRepository {
    /// Clone the remote if there is no local copy yet, pull otherwise
    fn ensure_synced(&self, remote: &str) -> Result<()>;

    /// Current content of an object, `None` if it doesn't exist
    fn read_object(&self, object: &Path) -> Result<Option<Vec<u8>>>;

    /// Replace an object's content, then commit and push
    fn persist_write(&self, object: &Path, contents: &[u8]) -> Result<()>;

    /// Delete an object, then commit and push
    fn persist_remove(&self, object: &Path) -> Result<()>;
}

/// [`SourceRepository`] backed by a git working tree
pub struct GitStore {
    repo_dir: PathBuf,
    config: StoreConfig,
}

impl GitStore {
    pub fn new(repo_dir: impl AsRef<Path>, config: StoreConfig) -> Self {
        Self {
            repo_dir: repo_dir.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    pub fn store_dir(&self) -> PathBuf {
        self.repo_dir.join(STORE_FOLDER_NAME)
    }

    /// Path of an object relative to the repository root, as git stages it
    pub fn staged_path(object: &Path) -> PathBuf {
        Path::new(STORE_FOLDER_NAME).join(object)
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.repo_dir).map_err(|e| {
            VstoreError::SyncFailure(format!(
                "Couldn't open the repository at {}: {e}",
                self.repo_dir.display()
            ))
        })
    }

    fn clone_remote(&self, remote: &str) -> Result<()> {
        info!(remote, path = %self.repo_dir.display(), "cloning store repository");

        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_options());
        match builder.clone(remote, &self.repo_dir) {
            Ok(_) => Ok(()),
            Err(e) => {
                // A half-written clone would be mistaken for a usable repository next run
                if self.repo_dir.exists() {
                    let _ = fs::remove_dir_all(&self.repo_dir);
                }
                Err(VstoreError::SyncFailure(format!(
                    "Couldn't clone the repository from {remote}: {e}"
                )))
            }
        }
    }

    fn pull(&self) -> Result<()> {
        let repo = self.open()?;
        let remote_name = &self.config.remote_name;

        let mut remote = repo.find_remote(remote_name).map_err(|e| {
            VstoreError::SyncFailure(format!("Couldn't find remote {remote_name}: {e}"))
        })?;
        remote
            .fetch::<&str>(&[], Some(&mut fetch_options()), None)
            .map_err(|e| VstoreError::SyncFailure(format!("Couldn't fetch from remote: {e}")))?;
        drop(remote);

        let branch = head_branch(&repo)?;
        let tracking = format!("refs/remotes/{remote_name}/{branch}");
        let upstream = match repo.find_reference(&tracking) {
            Ok(reference) => repo.reference_to_annotated_commit(&reference)?,
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!(branch, "remote has no such branch yet, nothing to pull");
                return Ok(());
            }
            Err(e) => return Err(sync_error(e)),
        };

        merge_upstream(&repo, &branch, &upstream, &self.signature()?)
    }

    fn signature(&self) -> Result<Signature<'static>> {
        Ok(Signature::now(
            &self.config.author_name,
            &self.config.author_email,
        )?)
    }

    fn commit_and_push(&self, repo: &Repository, staged: &Path, message: &str) -> Result<()> {
        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let signature = self.signature()?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if is_unborn(&e) => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<_> = parent.iter().collect();

        let commit_id = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        info!(commit = %commit_id, path = %staged.display(), "committed store change");

        self.push(repo)
    }

    fn push(&self, repo: &Repository) -> Result<()> {
        let branch = head_branch(repo)?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let mut remote = repo
            .find_remote(&self.config.remote_name)
            .map_err(|e| VstoreError::PushFailure(e.to_string()))?;

        let mut rejection: Option<String> = None;
        {
            let mut callbacks = remote_callbacks();
            callbacks.push_update_reference(|reference, status| {
                if let Some(message) = status {
                    rejection = Some(format!("{reference}: {message}"));
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(|e| {
                    warn!(error = %e, "push failed, local commit kept");
                    VstoreError::PushFailure(e.to_string())
                })?;
        }

        if let Some(message) = rejection {
            warn!(%message, "remote rejected push, local commit kept");
            return Err(VstoreError::PushFailure(message));
        }

        info!(branch, remote = %self.config.remote_name, "pushed store change");
        Ok(())
    }
}

impl SourceRepository for GitStore {
    fn ensure_synced(&self, remote: &str) -> Result<()> {
        if !self.repo_dir.exists() {
            return self.clone_remote(remote);
        }
        debug!(path = %self.repo_dir.display(), "pulling store repository");
        self.pull()
    }

    fn read_object(&self, object: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(self.store_dir().join(object)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn persist_write(&self, object: &Path, contents: &[u8]) -> Result<()> {
        let repo = self.open()?;
        write_private(&self.store_dir().join(object), contents)?;

        let staged = Self::staged_path(object);
        let mut index = repo.index()?;
        index.add_path(&staged)?;
        index.write()?;

        let message = format!("Update content at {}", display_object(&staged));
        self.commit_and_push(&repo, &staged, &message)
    }

    fn persist_remove(&self, object: &Path) -> Result<()> {
        let repo = self.open()?;
        let absolute = self.store_dir().join(object);
        if !absolute.is_file() {
            return Err(VstoreError::ObjectNotFound(display_object(object)));
        }
        fs::remove_file(&absolute)?;

        let staged = Self::staged_path(object);
        let mut index = repo.index()?;
        index.remove_path(&staged)?;
        index.write()?;

        let message = format!("Remove content at {}", display_object(&staged));
        self.commit_and_push(&repo, &staged, &message)
    }
}

/// Advisory lock serializing vstore processes on one root directory.
///
/// Released when dropped.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Take the lock, failing with [`VstoreError::StoreLocked`] if it is held
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| VstoreError::StoreLocked(path.clone()))?;
        debug!(path = %path.display(), "acquired store lock");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn merge_upstream(
    repo: &Repository,
    branch: &str,
    upstream: &AnnotatedCommit<'_>,
    signature: &Signature<'_>,
) -> Result<()> {
    let (analysis, _) = repo.merge_analysis(&[upstream]).map_err(sync_error)?;
    let local_ref = format!("refs/heads/{branch}");

    if analysis.is_up_to_date() {
        debug!(branch, "store already up to date");
        return Ok(());
    }

    if analysis.is_unborn() {
        info!(branch, "checking out remote branch into empty repository");
        repo.reference(&local_ref, upstream.id(), true, "vstore: initial pull")
            .map_err(sync_error)?;
        repo.set_head(&local_ref).map_err(sync_error)?;
        return checkout_head(repo);
    }

    if analysis.is_fast_forward() {
        info!(branch, target = %upstream.id(), "fast-forwarding store");
        let mut reference = repo.find_reference(&local_ref).map_err(sync_error)?;
        reference
            .set_target(upstream.id(), "vstore: fast-forward")
            .map_err(sync_error)?;
        repo.set_head(&local_ref).map_err(sync_error)?;
        return checkout_head(repo);
    }

    // Diverged: merge in memory first so conflicts never touch the working tree
    let local = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .map_err(sync_error)?;
    let theirs = repo.find_commit(upstream.id()).map_err(sync_error)?;
    let mut merged = repo
        .merge_commits(&local, &theirs, None)
        .map_err(sync_error)?;
    if merged.has_conflicts() {
        return Err(VstoreError::SyncFailure(format!(
            "local and remote changes to {branch} conflict; resolve them in {}",
            repo.workdir().unwrap_or_else(|| repo.path()).display()
        )));
    }

    let tree_id = merged.write_tree_to(repo).map_err(sync_error)?;
    let tree = repo.find_tree(tree_id).map_err(sync_error)?;
    let message = format!("Merge remote changes into {branch}");
    let merge_id = repo
        .commit(Some("HEAD"), signature, signature, &message, &tree, &[&local, &theirs])
        .map_err(sync_error)?;
    info!(commit = %merge_id, "merged remote changes");
    checkout_head(repo)
}

fn checkout_head(repo: &Repository) -> Result<()> {
    repo.checkout_head(Some(CheckoutBuilder::new().force()))
        .map_err(sync_error)
}

/// Name of the branch HEAD points to, even when it has no commits yet
fn head_branch(repo: &Repository) -> Result<String> {
    let head = repo.find_reference("HEAD")?;
    let target = match head.symbolic_target() {
        Some(target) => target.to_string(),
        None => {
            return Err(VstoreError::SyncFailure(
                "HEAD is detached; check out a branch in the store repository".into(),
            ))
        }
    };
    Ok(target
        .strip_prefix("refs/heads/")
        .unwrap_or(&target)
        .to_string())
}

fn is_unborn(err: &git2::Error) -> bool {
    matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

fn sync_error(err: git2::Error) -> VstoreError {
    VstoreError::SyncFailure(err.message().to_string())
}

fn display_object(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut options = FetchOptions::new();
    options.remote_callbacks(remote_callbacks());
    options
}

fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;
    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(
                "no working credentials found (ssh-agent, credential helper)",
            ));
        }
        let user = username.unwrap_or("git");
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(user);
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let config = git2::Config::open_default()?;
            return Cred::credential_helper(&config, url, username);
        }
        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(user);
        }
        Cred::default()
    });
    callbacks
}
