use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VstoreError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not enough entropy available: {0}")]
    EntropyFailure(String),

    #[error("Malformed ciphertext")]
    MalformedCiphertext,

    #[error("Authentication failed: wrong password or corrupted data")]
    AuthenticationFailure,

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Invalid JSON pointer: {0}")]
    PointerInvalid(String),

    #[error("Nothing found at JSON pointer {0}")]
    PointerNotFound(String),

    #[error("Type mismatch at {pointer}: expected {expected}, found {found}")]
    TypeMismatch {
        pointer: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Couldn't synchronize with remote: {0}")]
    SyncFailure(String),

    #[error("Push failed, changes are committed locally only: {0}")]
    PushFailure(String),

    #[error("Couldn't resolve object path: {0}")]
    PathResolutionFailure(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store is locked by another process ({})", .0.display())]
    StoreLocked(PathBuf),

    #[error("Couldn't determine the store root directory")]
    RootUnavailable,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, VstoreError>;
