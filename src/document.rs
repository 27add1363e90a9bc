//! # Document Access
//!
//! Every secret object decrypts to a JSON object. Reads and writes go
//! through [`DocumentAccessor`]:
//!
//! ```text
//! read:  blob → split salt → derive key → decrypt → parse JSON → pointer get
//! write: document → pointer set → serialize → new salt → new key → encrypt
//!        → salt || envelope → persist (commit + push)
//! ```
//!
//! Each write rewrites the whole object under a freshly derived key, so no
//! key is ever used for two writes, even of the same object.

use crate::crypto;
use crate::error::{Result, VstoreError};
use crate::pointer::{scalar_to_string, type_name, JsonPointer};
use crate::store::SourceRepository;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;
use zeroize::Zeroizing;

/// A decrypted secret object
pub type Document = Map<String, Value>;

pub struct DocumentAccessor<'r, R: SourceRepository + ?Sized> {
    repo: &'r R,
}

impl<'r, R: SourceRepository + ?Sized> DocumentAccessor<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Decrypted JSON bytes of an existing object
    pub fn read_raw(&self, object: &Path, password: &str) -> Result<Zeroizing<Vec<u8>>> {
        let blob = self
            .repo
            .read_object(object)?
            .ok_or_else(|| VstoreError::ObjectNotFound(object.display().to_string()))?;
        crypto::open(&blob, password.as_bytes())
    }

    /// Decrypt and parse an object; a missing object is an empty document
    pub fn read_document(&self, object: &Path, password: &str) -> Result<Document> {
        match self.read_raw(object, password) {
            Ok(plaintext) => parse_document(&plaintext),
            Err(VstoreError::ObjectNotFound(_)) => {
                debug!(object = %object.display(), "object does not exist yet");
                Ok(Document::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Value at `pointer` rendered as a string
    pub fn get_field(&self, object: &Path, pointer: &str, password: &str) -> Result<String> {
        let pointer = JsonPointer::parse(pointer)?;
        let document = Value::Object(self.read_document(object, password)?);
        let value = pointer.get(&document)?;
        scalar_to_string(&pointer, value)
    }

    /// Assign `value` at `pointer` and persist the re-encrypted object
    pub fn set_field(&self, object: &Path, pointer: &str, value: &str, password: &str) -> Result<()> {
        let pointer = JsonPointer::parse(pointer)?;
        let mut document = Value::Object(self.read_document(object, password)?);
        pointer.set(&mut document, Value::String(value.to_string()))?;
        debug!(object = %object.display(), pointer = %pointer, "updated field");
        self.write_document(object, &document, password)
    }

    /// Persist an object with no fields, or rekey it if it already exists
    pub fn create_empty(&self, object: &Path, password: &str) -> Result<()> {
        let document = Value::Object(self.read_document(object, password)?);
        self.write_document(object, &document, password)
    }

    /// Delete an object and persist the deletion
    pub fn remove(&self, object: &Path) -> Result<()> {
        self.repo.persist_remove(object)
    }

    fn write_document(&self, object: &Path, document: &Value, password: &str) -> Result<()> {
        let plaintext = Zeroizing::new(serde_json::to_vec(document)?);
        let blob = crypto::seal(&plaintext, password.as_bytes())?;
        self.repo.persist_write(object, &blob)
    }
}

fn parse_document(plaintext: &[u8]) -> Result<Document> {
    match serde_json::from_slice::<Value>(plaintext)? {
        Value::Object(map) => Ok(map),
        other => Err(VstoreError::InvalidDocument(format!(
            "expected a JSON object, found {}",
            type_name(&other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SALT_SIZE;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// In-memory repository recording every persisted write
    #[derive(Default)]
    struct MemoryRepository {
        objects: RefCell<HashMap<PathBuf, Vec<u8>>>,
        writes: RefCell<Vec<PathBuf>>,
    }

    impl SourceRepository for MemoryRepository {
        fn ensure_synced(&self, _remote: &str) -> Result<()> {
            Ok(())
        }

        fn read_object(&self, object: &Path) -> Result<Option<Vec<u8>>> {
            Ok(self.objects.borrow().get(object).cloned())
        }

        fn persist_write(&self, object: &Path, contents: &[u8]) -> Result<()> {
            self.objects
                .borrow_mut()
                .insert(object.to_path_buf(), contents.to_vec());
            self.writes.borrow_mut().push(object.to_path_buf());
            Ok(())
        }

        fn persist_remove(&self, object: &Path) -> Result<()> {
            self.objects
                .borrow_mut()
                .remove(object)
                .map(|_| ())
                .ok_or_else(|| VstoreError::ObjectNotFound(object.display().to_string()))
        }
    }

    const MK: &str = "mk";

    fn db() -> &'static Path {
        Path::new("svc/db")
    }

    #[test]
    fn missing_object_reads_as_empty_document() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);
        assert!(docs.read_document(db(), MK).unwrap().is_empty());
    }

    #[test]
    fn set_then_get_returns_value() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);

        docs.set_field(db(), "/password", "s3cr3t", MK).unwrap();

        assert_eq!(docs.get_field(db(), "/password", MK).unwrap(), "s3cr3t");
        assert_eq!(*repo.writes.borrow(), [PathBuf::from("svc/db")]);
    }

    #[test]
    fn every_write_rekeys_the_object() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);

        docs.set_field(db(), "/user", "alice", MK).unwrap();
        let before = repo.objects.borrow()[db()].clone();
        docs.set_field(db(), "/user", "alice", MK).unwrap();
        let after = repo.objects.borrow()[db()].clone();

        assert_ne!(before[..SALT_SIZE], after[..SALT_SIZE]);
        assert_ne!(before[SALT_SIZE..], after[SALT_SIZE..]);
        assert_eq!(docs.get_field(db(), "/user", MK).unwrap(), "alice");
    }

    #[test]
    fn set_keeps_other_fields() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);

        docs.set_field(db(), "/user", "alice", MK).unwrap();
        docs.set_field(db(), "/nested/field", "x", MK).unwrap();

        let document = docs.read_document(db(), MK).unwrap();
        assert_eq!(
            Value::Object(document),
            json!({"user": "alice", "nested": {"field": "x"}})
        );
    }

    #[test]
    fn get_missing_field_does_not_create_it() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);
        docs.set_field(db(), "/user", "alice", MK).unwrap();
        let writes = repo.writes.borrow().len();

        let result = docs.get_field(db(), "/password", MK);

        assert!(matches!(result, Err(VstoreError::PointerNotFound(_))));
        assert_eq!(repo.writes.borrow().len(), writes);
        assert!(!docs.read_document(db(), MK).unwrap().contains_key("password"));
    }

    #[test]
    fn get_non_scalar_is_type_mismatch() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);
        docs.set_field(db(), "/nested/field", "x", MK).unwrap();

        assert!(matches!(
            docs.get_field(db(), "/nested", MK),
            Err(VstoreError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn failed_set_persists_nothing() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);
        docs.set_field(db(), "/user", "alice", MK).unwrap();
        let stored = repo.objects.borrow()[db()].clone();

        let result = docs.set_field(db(), "/user/name", "bob", MK);
        assert!(matches!(result, Err(VstoreError::TypeMismatch { .. })));

        let result = docs.set_field(db(), "no-slash", "bob", MK);
        assert!(matches!(result, Err(VstoreError::PointerInvalid(_))));

        assert_eq!(repo.objects.borrow()[db()], stored);
        assert_eq!(repo.writes.borrow().len(), 1);
    }

    #[test]
    fn wrong_password_fails_authentication() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);
        docs.set_field(db(), "/user", "alice", MK).unwrap();

        assert!(matches!(
            docs.get_field(db(), "/user", "not-mk"),
            Err(VstoreError::AuthenticationFailure)
        ));
        assert!(matches!(
            docs.set_field(db(), "/user", "mallory", "not-mk"),
            Err(VstoreError::AuthenticationFailure)
        ));
    }

    #[test]
    fn create_empty_writes_empty_object() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);

        docs.create_empty(db(), MK).unwrap();

        assert_eq!(docs.read_raw(db(), MK).unwrap().as_slice(), b"{}");
        assert_eq!(repo.writes.borrow().len(), 1);
    }

    #[test]
    fn create_empty_keeps_existing_fields() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);
        docs.set_field(db(), "/user", "alice", MK).unwrap();
        let before = repo.objects.borrow()[db()].clone();

        docs.create_empty(db(), MK).unwrap();

        assert_ne!(repo.objects.borrow()[db()], before);
        assert_eq!(docs.get_field(db(), "/user", MK).unwrap(), "alice");
    }

    #[test]
    fn read_raw_missing_object_fails() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);
        assert!(matches!(
            docs.read_raw(db(), MK),
            Err(VstoreError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn non_object_document_is_invalid() {
        let repo = MemoryRepository::default();
        let blob = crypto::seal(b"[1,2,3]", MK.as_bytes()).unwrap();
        repo.persist_write(db(), &blob).unwrap();

        let docs = DocumentAccessor::new(&repo);
        assert!(matches!(
            docs.read_document(db(), MK),
            Err(VstoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn remove_deletes_object() {
        let repo = MemoryRepository::default();
        let docs = DocumentAccessor::new(&repo);
        docs.set_field(db(), "/user", "alice", MK).unwrap();

        docs.remove(db()).unwrap();

        assert!(repo.read_object(db()).unwrap().is_none());
        assert!(matches!(docs.remove(db()), Err(VstoreError::ObjectNotFound(_))));
    }
}
