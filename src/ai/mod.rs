//! Generative API integration.
//!
//! Turns workshop requests into single request/response cycles against a
//! generative model and validates what comes back.
//!
//! ## Features
//!
//! - Structured JSON generation against a response schema
//! - Single image generation
//! - Typed workshop operations (ideas, sketches, storyboards, questions,
//!   design prompts, feedback analysis)
//!
//! Clients never retry. Retry policy belongs to the image pipeline.

#[cfg(feature = "ai")]
mod gemini;
mod prompts;
mod schema;
mod workshop;

#[cfg(feature = "ai")]
pub use gemini::GeminiClient;
pub use prompts::flow_summary;
pub use workshop::WorkshopGenerator;

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::Value;

use crate::core::Message;

/// Trait for generative API clients.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate JSON matching the request's schema.
    async fn generate_structured(&self, request: &StructuredRequest)
        -> Result<Value, GenerationError>;

    /// Generate a single image from a text prompt.
    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, GenerationError>;

    /// Get the client name.
    fn name(&self) -> &str;
}

/// Generation error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Blocked for safety reasons: {reason}")]
    Blocked { reason: String },

    #[error("No content was returned from the API")]
    EmptyResponse,

    #[error("No image data found in the API response")]
    NoImage,

    #[error("Response did not match the expected schema: {0}")]
    SchemaMismatch(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Generation client not configured: {0}")]
    NotConfigured(String),
}

impl GenerationError {
    /// Whether a safety filter refused the request.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Localized message key for this failure.
    pub fn message(&self) -> Message {
        if self.is_blocked() {
            Message::GenerationBlocked
        } else {
            Message::GenerationFailed
        }
    }
}

/// Which model a request should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelTier {
    /// Fast text model
    #[default]
    Standard,
    /// Stronger model for multimodal analysis
    Analysis,
}

/// One part of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Plain text
    Text(String),
    /// Binary data sent inline (audio, images)
    Inline { mime_type: String, bytes: Vec<u8> },
}

/// A structured generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub tier: ModelTier,
    pub parts: Vec<ContentPart>,
    pub schema: Value,
}

impl StructuredRequest {
    /// Single text prompt on the standard tier.
    pub fn text(prompt: impl Into<String>, schema: Value) -> Self {
        Self { tier: ModelTier::Standard, parts: vec![ContentPart::Text(prompt.into())], schema }
    }

    /// Run on a different model tier.
    pub fn with_tier(mut self, tier: ModelTier) -> Self {
        self.tier = tier;
        self
    }

    /// Append a prompt part.
    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Concatenated text parts.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(t) => Some(t.as_str()),
                ContentPart::Inline { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Build from base64 data as returned inline by the API.
    pub fn from_base64(mime_type: impl Into<String>, data: &str) -> Result<Self, GenerationError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| GenerationError::SchemaMismatch(format!("invalid image data: {e}")))?;
        if bytes.is_empty() {
            return Err(GenerationError::NoImage);
        }
        Ok(Self { mime_type: mime_type.into(), bytes })
    }

    /// Render as a `data:` URL.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Client standing in when generation is unavailable.
///
/// Every call fails with [`GenerationError::NotConfigured`], so flow
/// preconditions still report their own errors first.
#[derive(Debug, Clone)]
pub struct DisabledClient {
    reason: String,
}

impl DisabledClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl GenerationClient for DisabledClient {
    async fn generate_structured(&self, _: &StructuredRequest) -> Result<Value, GenerationError> {
        Err(GenerationError::NotConfigured(self.reason.clone()))
    }

    async fn generate_image(&self, _: &str) -> Result<ImagePayload, GenerationError> {
        Err(GenerationError::NotConfigured(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Parse model text output as JSON, tolerating markdown code fences.
pub fn parse_json_text(text: &str) -> Result<Value, GenerationError> {
    let trimmed = strip_code_fence(text.trim());
    if trimmed.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    serde_json::from_str(trimmed).map_err(|e| GenerationError::SchemaMismatch(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip an optional language tag on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
