//! File-backed storage.
//!
//! Documents live at `{root}/{collection}/{key}.json`, blobs at
//! `{root}/blobs/{path}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{merge_document, validate_segment, BlobStore, Document, DocumentStore, PersistenceError};

/// Document store writing one JSON file per document.
#[derive(Debug)]
pub struct FileDocumentStore {
    root: PathBuf,
    // Serializes read-merge-write cycles.
    write_lock: Mutex<()>,
}

impl FileDocumentStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), write_lock: Mutex::new(()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, collection: &str, key: &str) -> Result<PathBuf, PersistenceError> {
        validate_segment(collection)?;
        validate_segment(key)?;
        Ok(self.root.join(collection).join(format!("{key}.json")))
    }
}

async fn read_document(path: &Path) -> Result<Option<Document>, PersistenceError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write through a temporary file so readers never see a partial document.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, PersistenceError> {
        let path = self.document_path(collection, key)?;
        read_document(&path).await
    }

    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Document,
        merge: bool,
    ) -> Result<(), PersistenceError> {
        let path = self.document_path(collection, key)?;
        let _guard = self.write_lock.lock().await;

        let document = if merge {
            let mut existing = read_document(&path).await?.unwrap_or_default();
            merge_document(&mut existing, document);
            existing
        } else {
            document
        };

        let bytes = serde_json::to_vec_pretty(&document)?;
        write_atomic(&path, &bytes).await?;
        tracing::debug!(path = %path.display(), "Document written");
        Ok(())
    }
}

/// Blob store writing files and returning `file://` URLs.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, path: &str) -> Result<PathBuf, PersistenceError> {
        let mut full = self.root.join("blobs");
        for segment in path.split('/') {
            validate_segment(segment)?;
            full.push(segment);
        }
        Ok(full)
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, PersistenceError> {
        let full = self.blob_path(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, &bytes).await?;
        tracing::debug!(path = %full.display(), content_type, size = bytes.len(), "Blob stored");

        let absolute = std::path::absolute(&full)?;
        Ok(format!("file://{}", absolute.display()))
    }
}
