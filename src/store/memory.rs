//! In-memory backends and the session identity provider.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::watch;

use super::{
    merge_document, validate_segment, BlobStore, Document, DocumentStore, Identity,
    IdentityProvider, PersistenceError,
};

/// Process-local document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(String, String), Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, PersistenceError> {
        validate_segment(key)?;
        Ok(self.documents.read().get(&(collection.to_string(), key.to_string())).cloned())
    }

    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Document,
        merge: bool,
    ) -> Result<(), PersistenceError> {
        validate_segment(key)?;
        let mut documents = self.documents.write();
        let entry = documents.entry((collection.to_string(), key.to_string())).or_default();
        if merge {
            merge_document(entry, document);
        } else {
            *entry = document;
        }
        Ok(())
    }
}

/// Process-local blob store returning `mem://` URLs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a stored blob back by URL or path.
    pub fn get(&self, url_or_path: &str) -> Option<Vec<u8>> {
        let path = url_or_path.strip_prefix("mem://").unwrap_or(url_or_path);
        self.blobs.read().get(path).map(|(_, bytes)| bytes.clone())
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, PersistenceError> {
        for segment in path.split('/') {
            validate_segment(segment)?;
        }
        self.blobs.write().insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(format!("mem://{path}"))
    }
}

/// Identity held for the lifetime of a session.
#[derive(Debug)]
pub struct SessionIdentity {
    sender: watch::Sender<Option<Identity>>,
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdentity {
    /// Signed-out session.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Create a session for `uid`.
    pub fn sign_in(&self, uid: impl Into<String>) -> Identity {
        let identity = Identity::new(uid);
        self.sender.send_replace(Some(identity.clone()));
        tracing::debug!(uid = %identity.uid, "Signed in");
        identity
    }

    /// End the session.
    pub fn sign_out(&self) {
        self.sender.send_replace(None);
        tracing::debug!("Signed out");
    }
}

impl IdentityProvider for SessionIdentity {
    fn current(&self) -> Option<Identity> {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.sender.subscribe()
    }
}
