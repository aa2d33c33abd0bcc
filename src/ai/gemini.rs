//! Gemini API integration.
//!
//! Implements the GenerationClient trait over the `generateContent` REST
//! endpoint.

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    parse_json_text, ContentPart, GenerationClient, GenerationError, ImagePayload, ModelTier,
    StructuredRequest,
};
use crate::core::AiConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Finish reasons that mean the output was withheld by a safety filter.
const BLOCKED_FINISH_REASONS: &[&str] =
    &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII", "IMAGE_SAFETY"];

/// Gemini API client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    analysis_model: String,
    image_model: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// Reads the API key from GEMINI_API_KEY, falling back to API_KEY.
    pub fn new() -> Result<Self, GenerationError> {
        Self::from_env_var("GEMINI_API_KEY")
    }

    /// Create a client from configuration.
    pub fn from_config(config: &AiConfig) -> Result<Self, GenerationError> {
        let mut client = Self::from_env_var(&config.api_key_env)?;
        client.text_model.clone_from(&config.text_model);
        client.analysis_model.clone_from(&config.analysis_model);
        client.image_model.clone_from(&config.image_model);
        if let Some(ref base_url) = config.base_url {
            client = client.with_base_url(base_url.clone());
        }
        Ok(client)
    }

    fn from_env_var(var: &str) -> Result<Self, GenerationError> {
        let api_key = std::env::var(var)
            .or_else(|_| std::env::var("API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GenerationError::NotConfigured(format!("{var} not set")))?;

        let defaults = AiConfig::default();
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: defaults.text_model,
            analysis_model: defaults.analysis_model,
            image_model: defaults.image_model,
        })
    }

    /// Point at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Standard => &self.text_model,
            ModelTier::Analysis => &self.analysis_model,
        }
    }

    /// Make a request to the generateContent endpoint.
    async fn request(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, body });
        }

        response.json().await.map_err(|e| GenerationError::SchemaMismatch(e.to_string()))
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate_structured(
        &self,
        request: &StructuredRequest,
    ) -> Result<Value, GenerationError> {
        let model = self.model_for(request.tier);
        tracing::debug!(model, parts = request.parts.len(), "Structured generation");

        let body = GenerateContentRequest {
            contents: vec![Content { parts: request.parts.iter().map(Part::from).collect() }],
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(request.schema.clone()),
                response_modalities: None,
            },
        };

        let response = self.request(model, &body).await?;
        let text = extract_text(&response)?;
        parse_json_text(&text)
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, GenerationError> {
        tracing::debug!(model = %self.image_model, "Image generation");

        let body = GenerateContentRequest {
            contents: vec![Content { parts: vec![Part::text(prompt)] }],
            generation_config: GenerationConfig {
                response_mime_type: None,
                response_schema: None,
                response_modalities: Some(vec!["IMAGE".to_string()]),
            },
        };

        let response = self.request(&self.image_model, &body).await?;
        extract_image(&response)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Fail with `Blocked` if the prompt or the first candidate was filtered.
fn check_blocked(response: &GenerateContentResponse) -> Result<(), GenerationError> {
    if let Some(reason) = response.prompt_feedback.as_ref().and_then(|f| f.block_reason.clone()) {
        return Err(GenerationError::Blocked { reason });
    }

    let finish = response.candidates.first().and_then(|c| c.finish_reason.as_deref());
    if let Some(reason) = finish.filter(|r| BLOCKED_FINISH_REASONS.contains(r)) {
        return Err(GenerationError::Blocked { reason: reason.to_string() });
    }

    Ok(())
}

fn first_parts(response: &GenerateContentResponse) -> Result<&[Part], GenerationError> {
    check_blocked(response)?;
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.as_slice())
        .filter(|parts| !parts.is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

/// Concatenated text of the first candidate.
fn extract_text(response: &GenerateContentResponse) -> Result<String, GenerationError> {
    let text: String =
        first_parts(response)?.iter().filter_map(|p| p.text.as_deref()).collect::<String>();
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

/// First inline image of the first candidate.
fn extract_image(response: &GenerateContentResponse) -> Result<ImagePayload, GenerationError> {
    let inline = first_parts(response)?
        .iter()
        .find_map(|p| p.inline_data.as_ref())
        .ok_or(GenerationError::NoImage)?;
    ImagePayload::from_base64(inline.mime_type.clone(), &inline.data)
}

/// generateContent request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

/// Output controls of a request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

/// Content block in a request or a candidate.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

/// Text or inline data part.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self { text: Some(text.to_string()), inline_data: None }
    }
}

impl From<&ContentPart> for Part {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Self::text(text),
            ContentPart::Inline { mime_type, bytes } => Self {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(bytes),
                }),
            },
        }
    }
}

/// Base64 payload with its MIME type.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// generateContent response body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

/// One generated candidate.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

/// Prompt-level safety feedback.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}
