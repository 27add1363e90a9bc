//! # Envelope Cryptography
//!
//! Password-based authenticated encryption for every blob vstore writes.
//!
//! ## Algorithm
//!
//! - **Key derivation**: PBKDF2 over HMAC-SHA-512, 4096 rounds, 32-byte output
//! - **Cipher**: AES-256-GCM (Galois/Counter Mode)
//! - **Salt size**: 256 bits (32 bytes), fresh for every write
//! - **Nonce size**: 96 bits (12 bytes), fresh for every encryption
//! - **Authentication**: Built into GCM mode (16-byte tag), no associated data
//!
//! ## Stored Blob Format
//!
//! ```text
//! [32-byte salt][12-byte nonce][variable-length ciphertext + 16-byte GCM tag]
//! ```
//!
//! The salt is not secret. It travels in cleartext next to the envelope so
//! that the password alone is enough to decrypt.
//!
//! ## Unit Tests
//!
//! ```bash
//! cargo test crypto::
//! ```

use crate::error::{Result, VstoreError};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hmac::Hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub const KEY_SIZE: usize = 32; // 256 bits
pub const SALT_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12; // 96 bits for GCM
pub const TAG_SIZE: usize = 16;
pub const PBKDF2_ROUNDS: u32 = 4096;

/// A key derived from a password and a salt. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Derive a key with PBKDF2-HMAC-SHA512
    pub fn derive(password: &[u8], salt: &[u8]) -> Result<Self> {
        let mut key = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, PBKDF2_ROUNDS, &mut key)
            .map_err(|e| VstoreError::Crypto(e.to_string()))?;
        Ok(Self { key })
    }

    /// Create a key from existing bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(VstoreError::Crypto(format!(
                "key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Encrypt data, producing `nonce || ciphertext || tag`
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| VstoreError::Crypto(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        fill_random(&mut nonce_bytes)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| VstoreError::Crypto(e.to_string()))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Decrypt a `nonce || ciphertext || tag` envelope
    pub fn decrypt(&self, envelope: &[u8]) -> Result<Vec<u8>> {
        if envelope.len() < NONCE_SIZE {
            return Err(VstoreError::MalformedCiphertext);
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| VstoreError::Crypto(e.to_string()))?;

        let (nonce_bytes, encrypted_data) = envelope.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher
            .decrypt(nonce, encrypted_data)
            .map_err(|_| VstoreError::AuthenticationFailure)
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive the 32-byte key for `password` and `salt`
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    DerivedKey::derive(password, salt)
}

/// Generate a fresh random salt from the OS random source
pub fn generate_salt() -> Result<[u8; SALT_SIZE]> {
    let mut salt = [0u8; SALT_SIZE];
    fill_random(&mut salt)?;
    Ok(salt)
}

/// Encrypt `plaintext` under a key derived from `password` and a new salt.
///
/// Returns `salt || nonce || ciphertext || tag`.
pub fn seal(plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    let salt = generate_salt()?;
    let key = derive_key(password, &salt)?;
    let envelope = key.encrypt(plaintext)?;

    let mut blob = Vec::with_capacity(SALT_SIZE + envelope.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&envelope);
    Ok(blob)
}

/// Decrypt a blob produced by [`seal`] using the salt embedded in it
pub fn open(blob: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if blob.len() < SALT_SIZE {
        return Err(VstoreError::MalformedCiphertext);
    }
    let (salt, envelope) = blob.split_at(SALT_SIZE);
    let key = derive_key(password, salt)?;
    key.decrypt(envelope).map(Zeroizing::new)
}

fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| VstoreError::EntropyFailure(e.to_string()))
}
