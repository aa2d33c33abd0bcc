//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use ideaflow::ai::{GenerationClient, GenerationError, ImagePayload, StructuredRequest};
use ideaflow::core::PipelineConfig;
use ideaflow::store::{Document, DocumentStore, MemoryDocumentStore, PersistenceError};

/// Generation client answering every workshop prompt with fixed content.
#[derive(Default)]
pub struct FakeClient {
    /// Image prompts containing any of these fail
    pub failing_images: Vec<&'static str>,
    pub prompts: Mutex<Vec<String>>,
    pub images: AtomicUsize,
}

impl FakeClient {
    pub fn failing(prompts: Vec<&'static str>) -> Self {
        Self { failing_images: prompts, ..Default::default() }
    }

    pub fn structured_calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn image_calls(&self) -> usize {
        self.images.load(Ordering::SeqCst)
    }
}

fn entries(prefix: &str, n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "title": format!("{prefix} {}", i + 1),
                "description": format!("{prefix} description"),
                "imagePrompt": format!("{prefix} image {}", i + 1),
                "details": {"layout": "stacked", "components": ["header", "cta"]}
            })
        })
        .collect()
}

#[async_trait]
impl GenerationClient for FakeClient {
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> Result<Value, GenerationError> {
        let prompt = request.prompt_text();
        self.prompts.lock().push(prompt.clone());

        if prompt.contains("16 innovative business ideas") {
            let ideas: Vec<Value> = (1..=5)
                .map(|i| {
                    json!({
                        "title": format!("Idea {i}"),
                        "description": format!("• benefit {i}"),
                        "sketchPrompt": format!("idea sketch {i}")
                    })
                })
                .collect();
            Ok(json!({ "ideas": ideas }))
        } else if prompt.contains("3-step user flow") {
            Ok(json!([entries("step", 3), entries("alt step", 3), entries("third step", 3)]))
        } else if prompt.contains("8-panel storyboard") {
            Ok(json!([entries("panel", 8), entries("alt panel", 8)]))
        } else if prompt.contains("interview questions") {
            Ok(json!({"questions": [
                {"category": "Problems and needs", "question": "How do you shop today?", "intent": "baseline", "followUp": ["Why?"]},
                {"category": "Solution validation", "question": "Would you use this?", "intent": "fit", "followUp": []}
            ]}))
        } else if prompt.contains("analyzing a collection of user interview") {
            Ok(json!({
                "summary": "Participants liked the concept",
                "keyPatterns": [{"pattern": "Price", "description": "Worried about cost", "count": 2}],
                "insights": ["Trust drives adoption"],
                "actionItems": [{"priority": "High", "item": "Publish pricing", "category": "Content"}]
            }))
        } else if prompt.contains("Google Stitch") {
            Ok(json!({"title": "Shop", "description": "Catalog site", "optimizedPrompt": "Create a catalog"}))
        } else {
            Err(GenerationError::EmptyResponse)
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, GenerationError> {
        self.images.fetch_add(1, Ordering::SeqCst);
        if self.failing_images.iter().any(|f| prompt.contains(f)) {
            return Err(GenerationError::Blocked { reason: "SAFETY".into() });
        }
        Ok(ImagePayload { mime_type: "image/png".into(), bytes: prompt.as_bytes().to_vec() })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Document store whose writes always fail.
#[derive(Default)]
pub struct BrokenDocumentStore;

#[async_trait]
impl DocumentStore for BrokenDocumentStore {
    async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, PersistenceError> {
        Ok(None)
    }

    async fn upsert(
        &self,
        _: &str,
        _: &str,
        _: Document,
        _: bool,
    ) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("backend offline".into()))
    }
}

/// In-memory document store that records every write.
#[derive(Default)]
pub struct CountingDocumentStore {
    inner: MemoryDocumentStore,
    /// Collection of every upsert, in order
    writes: Mutex<Vec<String>>,
}

impl CountingDocumentStore {
    /// Number of upserts into `collection`.
    pub fn upserts(&self, collection: &str) -> usize {
        self.writes.lock().iter().filter(|c| c.as_str() == collection).count()
    }
}

#[async_trait]
impl DocumentStore for CountingDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>, PersistenceError> {
        self.inner.get(collection, key).await
    }

    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Document,
        merge: bool,
    ) -> Result<(), PersistenceError> {
        self.writes.lock().push(collection.to_string());
        self.inner.upsert(collection, key, document, merge).await
    }
}

/// Pipeline settings without retry delays.
pub fn fast_pipeline() -> PipelineConfig {
    PipelineConfig { retry_delay_ms: 0, ..Default::default() }
}
