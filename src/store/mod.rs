//! Persistence, binary storage and identity.
//!
//! The workshop talks to its backend through three capabilities:
//! [`DocumentStore`] for JSON documents, [`BlobStore`] for generated images
//! and [`IdentityProvider`] for the signed-in participant. In-memory and
//! file-backed implementations are provided. [`ProjectStore`] owns the
//! project state on top of them.

mod file;
mod memory;
mod project;

pub use file::{FileBlobStore, FileDocumentStore};
pub use memory::{MemoryBlobStore, MemoryDocumentStore, SessionIdentity};
pub use project::{Notice, NoticeKind, ProjectStore, SaveOutcome};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

/// A stored JSON object.
pub type Document = Map<String, Value>;

/// Collection holding participant profiles.
pub const USERS: &str = "users";

/// Collection holding project state.
pub const PROJECTS: &str = "projects";

/// Persistence error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Keyed JSON document persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, PersistenceError>;

    /// Write a document. With `merge`, top-level fields are merged into the
    /// existing document instead of replacing it.
    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Document,
        merge: bool,
    ) -> Result<(), PersistenceError>;
}

/// Binary object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes at `path` and return a URL they can be read back from.
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, PersistenceError>;
}

/// An authenticated participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into(), display_name: None }
    }
}

/// Source of the current identity.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in identity, if any.
    fn current(&self) -> Option<Identity>;

    /// Watch identity changes.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Shallow merge: every top-level field of `patch` replaces the target's.
pub fn merge_document(target: &mut Document, patch: Document) {
    for (field, value) in patch {
        target.insert(field, value);
    }
}

/// Reject keys and paths that could escape their collection.
pub(crate) fn validate_segment(segment: &str) -> Result<(), PersistenceError> {
    let bad = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if bad {
        return Err(PersistenceError::InvalidKey(segment.to_string()));
    }
    Ok(())
}

/// Storage path for a generated image.
///
/// `projects/{uid}/{artifact}/{variant}_{index}_{timestamp}.png`
pub fn image_path(
    uid: &str,
    artifact: &str,
    variant: &str,
    index: usize,
    timestamp: i64,
) -> String {
    format!("{PROJECTS}/{uid}/{artifact}/{variant}_{index}_{timestamp}.png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_merge_document_is_shallow() {
        let mut target = doc(json!({"a": 1, "nested": {"x": 1, "y": 2}}));
        merge_document(&mut target, doc(json!({"nested": {"x": 5}, "b": null})));
        assert_eq!(Value::Object(target), json!({"a": 1, "nested": {"x": 5}, "b": null}));
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("user-1").is_ok());
        assert!(validate_segment("v0_3_1700000000.png").is_ok());
        assert!(validate_segment("..").is_err());
        assert!(validate_segment("a/b").is_err());
        assert!(validate_segment("").is_err());
    }

    #[test]
    fn test_image_path_layout() {
        assert_eq!(
            image_path("u1", "sketches", "v2", 1, 1_700_000_000_000),
            "projects/u1/sketches/v2_1_1700000000000.png"
        );
    }
}
