//! # vstore
//!
//! A personal secret store: structured secrets kept as individually
//! encrypted JSON documents inside a git repository, synchronized with a
//! remote on every run.
//!
//! ## Features
//!
//! - **Per-object encryption**: every object is AES-256-GCM encrypted under a key derived with PBKDF2 from a fresh salt
//! - **Synchronized store**: pull before every read, commit and push after every write
//! - **Fuzzy paths**: `vstore get gh /token` finds `work/github`
//! - **Field access**: read or write one field through an RFC 6901 pointer
//! - **Two-level secrets**: a password unlocks the settings, the master key inside them encrypts objects
//!
//! ## Quick Start
//!
//! ```bash
//! # First run asks for a master key and the remote URL
//! export VSTORE_PASSWORD=hunter2
//! vstore create svc/db
//!
//! # Write and read a field
//! vstore set svc/db /password --value s3cr3t
//! vstore get db /password
//!
//! # Whole document
//! vstore get db
//! ```
//!
//! ## How It Works
//!
//! ```text
//! <root>/
//! ├── settings.json.enc   remote URL + master key, sealed with the password
//! ├── config.toml         optional tuning
//! └── repo/               git clone of the remote
//!     └── store/          one encrypted file per secret object
//! ```
//!
//! A mutating command runs end to end in one process:
//!
//! ```text
//! unlock settings → pull → resolve path → decrypt → pointer set
//!                 → new salt + key → encrypt → write → commit → push
//! ```
//!
//! A failed push keeps the local commit; the command reports the error and
//! the remote must be reconciled by hand.
//!
//! ## Module Overview
//!
//! - [`crypto`] - Key derivation and AES-256-GCM envelopes
//! - [`pointer`] - RFC 6901 JSON pointer get and set
//! - [`resolver`] - Fuzzy object path resolution
//! - [`store`] - Git-backed synchronized object store
//! - [`document`] - Encrypted document field access
//! - [`settings`] - Encrypted settings bootstrap
//! - [`session`] - Per-command context tying the above together
//! - [`paths`], [`config`] - Root directory layout and tuning
//! - [`error`] - Error types and unified error handling
//!
//! ## Cryptography Details
//!
//! - **KDF**: PBKDF2-HMAC-SHA512, 4096 rounds, 32-byte key
//! - **Cipher**: AES-256-GCM, random 12-byte nonce per encryption, 16-byte tag
//!
//! ### Encrypted File Format
//!
//! ```text
//! [32-byte salt][12-byte nonce][ciphertext][16-byte GCM tag]
//! ```
//!
//! The salt is stored in the clear so the password alone opens the file.

pub mod config;
pub mod crypto;
pub mod document;
pub mod error;
pub mod paths;
pub mod pointer;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod store;

pub use config::StoreConfig;
pub use crypto::DerivedKey;
pub use document::{Document, DocumentAccessor};
pub use error::{Result, VstoreError};
pub use paths::StorePaths;
pub use pointer::JsonPointer;
pub use resolver::{Disambiguator, FuzzyMatch, ResolvedPath};
pub use session::Session;
pub use settings::{Settings, SettingsPrompt};
pub use store::{GitStore, SourceRepository, StoreLock};
