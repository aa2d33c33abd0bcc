//! Renderer that generates an image and uploads it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::batch::{ImageRenderer, RenderError};
use super::target::{Artifact, GenerationTarget};
use crate::ai::GenerationClient;
use crate::store::{image_path, BlobStore};

/// Generates each image with the client and stores it in blob storage.
pub struct StoredImageRenderer {
    client: Arc<dyn GenerationClient>,
    blobs: Arc<dyn BlobStore>,
    uid: String,
    artifact: Artifact,
}

impl StoredImageRenderer {
    pub fn new(
        client: Arc<dyn GenerationClient>,
        blobs: Arc<dyn BlobStore>,
        uid: impl Into<String>,
        artifact: Artifact,
    ) -> Self {
        Self { client, blobs, uid: uid.into(), artifact }
    }
}

#[async_trait]
impl ImageRenderer for StoredImageRenderer {
    async fn render(&self, target: &GenerationTarget) -> Result<String, RenderError> {
        let image = self.client.generate_image(&target.prompt).await?;
        let path = image_path(
            &self.uid,
            self.artifact.as_str(),
            &target.key.variant,
            target.key.index,
            Utc::now().timestamp_millis(),
        );
        let url = self.blobs.put(&path, image.bytes, &image.mime_type).await?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GenerationError, ImagePayload, StructuredRequest};
    use crate::store::MemoryBlobStore;
    use serde_json::Value;

    struct OneImage;

    #[async_trait]
    impl GenerationClient for OneImage {
        async fn generate_structured(
            &self,
            _: &StructuredRequest,
        ) -> Result<Value, GenerationError> {
            Err(GenerationError::EmptyResponse)
        }

        async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, GenerationError> {
            if prompt.contains("forbidden") {
                return Err(GenerationError::Blocked { reason: "SAFETY".into() });
            }
            Ok(ImagePayload { mime_type: "image/png".into(), bytes: vec![7] })
        }

        fn name(&self) -> &str {
            "one-image"
        }
    }

    #[tokio::test]
    async fn test_render_uploads_under_project_path() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let artifact = Artifact::Storyboards;
        let renderer = StoredImageRenderer::new(Arc::new(OneImage), blobs.clone(), "u1", artifact);

        let url = renderer.render(&GenerationTarget::new("v1", 3, "panel")).await.unwrap();
        assert!(url.starts_with("mem://projects/u1/storyboards/v1_3_"));
        assert!(url.ends_with(".png"));
        assert_eq!(blobs.get(&url), Some(vec![7]));
    }

    #[tokio::test]
    async fn test_generation_error_is_not_uploaded() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let renderer =
            StoredImageRenderer::new(Arc::new(OneImage), blobs.clone(), "u1", Artifact::Ideas);

        let target = GenerationTarget::new("ideas", 0, "forbidden");
        let err = renderer.render(&target).await.unwrap_err();
        assert!(matches!(err, RenderError::Generation(GenerationError::Blocked { .. })));
        assert!(blobs.is_empty());
    }
}
