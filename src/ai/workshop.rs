//! Typed workshop operations over a generation client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{
    prompts, schema, ContentPart, GenerationClient, GenerationError, ModelTier, StructuredRequest,
};
use crate::core::{
    variant_key, BusinessIdea, FeedbackAnalysis, FeedbackInput, IdeaBrief, InterviewQuestion,
    Language, SketchStep, SketchStyle, StitchPrompt, StitchPromptOptions, StoryboardPage,
    VariantMap,
};

/// Workshop content generator.
///
/// Each operation builds a prompt in the configured language, attaches a
/// response schema and decodes the reply into workshop types. Image slots of
/// decoded items start out pending.
#[derive(Clone)]
pub struct WorkshopGenerator {
    client: Arc<dyn GenerationClient>,
    language: Language,
}

#[derive(Deserialize)]
struct IdeasEnvelope {
    ideas: Vec<BusinessIdea>,
}

#[derive(Deserialize)]
struct QuestionsEnvelope {
    questions: Vec<InterviewQuestion>,
}

impl WorkshopGenerator {
    /// Create a generator answering in `language`.
    pub fn new(client: Arc<dyn GenerationClient>, language: Language) -> Self {
        Self { client, language }
    }

    /// Switch the response language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// The underlying client.
    pub fn client(&self) -> &Arc<dyn GenerationClient> {
        &self.client
    }

    /// Sixteen business ideas for the participant's brief.
    pub async fn business_ideas(
        &self,
        brief: &IdeaBrief,
        style: SketchStyle,
    ) -> Result<Vec<BusinessIdea>, GenerationError> {
        let prompt = prompts::business_ideas(brief, style, self.language);
        let value =
            self.structured(StructuredRequest::text(prompt, schema::business_ideas())).await?;
        let envelope: IdeasEnvelope = decode(value)?;
        non_empty(envelope.ideas)
    }

    /// Three variations of a 3-step user flow, keyed `v0..v2`.
    pub async fn three_step_sketches(
        &self,
        idea: &BusinessIdea,
        style: SketchStyle,
    ) -> Result<VariantMap<SketchStep>, GenerationError> {
        let prompt = prompts::three_step_sketches(idea, style, self.language);
        let value =
            self.structured(StructuredRequest::text(prompt, schema::sketch_variations())).await?;
        into_variants(decode(value)?)
    }

    /// Two variations of an 8-panel storyboard for the selected sketch.
    ///
    /// `custom_description` replaces the summary derived from the sketch.
    pub async fn storyboard_pages(
        &self,
        idea: &BusinessIdea,
        sketch: &[SketchStep],
        custom_description: Option<&str>,
    ) -> Result<VariantMap<StoryboardPage>, GenerationError> {
        let summary = match custom_description.map(str::trim).filter(|d| !d.is_empty()) {
            Some(custom) => custom.to_string(),
            None => prompts::flow_summary(sketch),
        };
        let prompt = prompts::storyboard_pages(idea, &summary, self.language);
        let request = StructuredRequest::text(prompt, schema::storyboard_variations());
        let value = self.structured(request).await?;
        into_variants(decode(value)?)
    }

    /// Ten user-interview questions for the idea.
    pub async fn interview_questions(
        &self,
        idea: &BusinessIdea,
    ) -> Result<Vec<InterviewQuestion>, GenerationError> {
        let prompt = prompts::interview_questions(idea, self.language);
        let value =
            self.structured(StructuredRequest::text(prompt, schema::interview_questions())).await?;
        let envelope: QuestionsEnvelope = decode(value)?;
        non_empty(envelope.questions)
    }

    /// Design-tool prompt from the given options.
    pub async fn stitch_prompt(
        &self,
        options: &StitchPromptOptions,
    ) -> Result<StitchPrompt, GenerationError> {
        let prompt = prompts::stitch_prompt(options, self.language);
        let value =
            self.structured(StructuredRequest::text(prompt, schema::stitch_prompt())).await?;
        decode(value)
    }

    /// Synthesize interview feedback on the analysis tier.
    pub async fn analyze_feedback(
        &self,
        input: &FeedbackInput,
    ) -> Result<FeedbackAnalysis, GenerationError> {
        if input.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "no records provided for analysis".to_string(),
            ));
        }

        let request = match input {
            FeedbackInput::Transcripts(transcripts) => {
                let transcripts: Vec<String> =
                    transcripts.iter().filter(|t| !t.trim().is_empty()).cloned().collect();
                StructuredRequest::text(
                    prompts::feedback_transcripts(&transcripts, self.language),
                    schema::feedback_analysis(),
                )
            }
            FeedbackInput::Audio(clips) => clips.iter().filter(|c| !c.bytes.is_empty()).fold(
                StructuredRequest::text(
                    prompts::feedback_audio(self.language),
                    schema::feedback_analysis(),
                ),
                |request, clip| {
                    request.with_part(ContentPart::Inline {
                        mime_type: clip.mime_type.clone(),
                        bytes: clip.bytes.clone(),
                    })
                },
            ),
        };

        self.structured(request.with_tier(ModelTier::Analysis)).await.and_then(decode)
    }

    async fn structured(&self, request: StructuredRequest) -> Result<Value, GenerationError> {
        self.client.generate_structured(&request).await
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, GenerationError> {
    serde_json::from_value(value).map_err(|e| GenerationError::SchemaMismatch(e.to_string()))
}

fn non_empty<T>(items: Vec<T>) -> Result<Vec<T>, GenerationError> {
    if items.is_empty() {
        Err(GenerationError::EmptyResponse)
    } else {
        Ok(items)
    }
}

/// Key variations in generation order, dropping empty ones.
fn into_variants<T>(variations: Vec<Vec<T>>) -> Result<VariantMap<T>, GenerationError> {
    let map: VariantMap<T> = variations
        .into_iter()
        .filter(|v| !v.is_empty())
        .enumerate()
        .map(|(i, items)| (variant_key(i), items))
        .collect();
    if map.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ImagePayload;
    use crate::core::{AudioClip, ImageSlot, Priority};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Returns a canned value and records requests.
    struct CannedClient {
        reply: Result<Value, GenerationError>,
        requests: Mutex<Vec<StructuredRequest>>,
    }

    impl CannedClient {
        fn new(reply: Result<Value, GenerationError>) -> Arc<Self> {
            Arc::new(Self { reply, requests: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl GenerationClient for CannedClient {
        async fn generate_structured(
            &self,
            request: &StructuredRequest,
        ) -> Result<Value, GenerationError> {
            self.requests.lock().push(request.clone());
            self.reply.clone()
        }

        async fn generate_image(&self, _prompt: &str) -> Result<ImagePayload, GenerationError> {
            Err(GenerationError::NoImage)
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn idea() -> BusinessIdea {
        BusinessIdea {
            title: "Leather Lab".into(),
            description: "• Workshops".into(),
            sketch_prompt: "child's drawing of bag".into(),
            sketch: ImageSlot::Pending,
        }
    }

    #[tokio::test]
    async fn test_business_ideas_decode_with_pending_sketches() {
        let client = CannedClient::new(Ok(json!({
            "ideas": [
                {"title": "A", "description": "• a", "sketchPrompt": "draw a"},
                {"title": "B", "description": "• b", "sketchPrompt": "draw b"}
            ]
        })));
        let generator = WorkshopGenerator::new(client.clone(), Language::En);

        let ideas =
            generator.business_ideas(&IdeaBrief::default(), SketchStyle::Simple).await.unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[1].sketch_prompt, "draw b");
        assert!(ideas.iter().all(|i| i.sketch == ImageSlot::Pending));
        assert_eq!(client.requests.lock()[0].tier, ModelTier::Standard);
    }

    #[tokio::test]
    async fn test_empty_ideas_is_empty_response() {
        let client = CannedClient::new(Ok(json!({"ideas": []})));
        let generator = WorkshopGenerator::new(client, Language::En);
        let err = generator.business_ideas(&IdeaBrief::default(), SketchStyle::Simple).await;
        assert_eq!(err.unwrap_err(), GenerationError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_schema_mismatch() {
        let client = CannedClient::new(Ok(json!({"ideas": [{"title": 3}]})));
        let generator = WorkshopGenerator::new(client, Language::En);
        let err = generator.business_ideas(&IdeaBrief::default(), SketchStyle::Simple).await;
        assert!(matches!(err, Err(GenerationError::SchemaMismatch(_))));
    }

    #[tokio::test]
    async fn test_sketch_variations_are_keyed_in_order() {
        let step = |t: &str| {
            json!({"title": t, "description": "d", "imagePrompt": format!("sketch {t}")})
        };
        let client = CannedClient::new(Ok(json!([
            [step("a1"), step("a2"), step("a3")],
            [],
            [step("c1"), step("c2"), step("c3")]
        ])));
        let generator = WorkshopGenerator::new(client, Language::En);

        let sketches = generator.three_step_sketches(&idea(), SketchStyle::Simple).await.unwrap();
        assert_eq!(sketches.keys().cloned().collect::<Vec<_>>(), vec!["v0", "v1"]);
        assert_eq!(sketches["v1"][0].title, "c1");
        assert_eq!(sketches["v0"][2].image_prompt, "sketch a3");
    }

    #[tokio::test]
    async fn test_storyboard_uses_custom_description() {
        let client = CannedClient::new(Ok(json!([[
            {"title": "p", "description": "d", "imagePrompt": "i"}
        ]])));
        let generator = WorkshopGenerator::new(client.clone(), Language::En);

        generator.storyboard_pages(&idea(), &[], Some("my own journey")).await.unwrap();
        let prompt = client.requests.lock()[0].prompt_text();
        assert!(prompt.contains("the user flow: \"my own journey\""));
    }

    #[tokio::test]
    async fn test_analyze_feedback_uses_analysis_tier_and_audio_parts() {
        let client = CannedClient::new(Ok(json!({
            "summary": "Mostly positive",
            "keyPatterns": [{"pattern": "Speed", "description": "Wants faster checkout", "count": 3}],
            "insights": ["Trust matters"],
            "actionItems": [{"priority": "High", "item": "Shorten checkout", "category": "UI"}]
        })));
        let generator = WorkshopGenerator::new(client.clone(), Language::Ko);

        let input = FeedbackInput::Audio(vec![
            AudioClip { mime_type: "audio/webm".into(), bytes: vec![1, 2] },
            AudioClip { mime_type: "audio/webm".into(), bytes: vec![] },
        ]);
        let analysis = generator.analyze_feedback(&input).await.unwrap();
        assert_eq!(analysis.action_items[0].priority, Priority::High);

        let request = client.requests.lock()[0].clone();
        assert_eq!(request.tier, ModelTier::Analysis);
        assert_eq!(request.parts.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_feedback_refuses_empty_input() {
        let client = CannedClient::new(Ok(json!({})));
        let generator = WorkshopGenerator::new(client.clone(), Language::En);

        let err = generator.analyze_feedback(&FeedbackInput::Transcripts(vec![])).await;
        assert!(matches!(err, Err(GenerationError::InvalidRequest(_))));
        assert!(client.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_blocked_passes_through() {
        let client =
            CannedClient::new(Err(GenerationError::Blocked { reason: "SAFETY".to_string() }));
        let generator = WorkshopGenerator::new(client, Language::En);
        let err = generator.interview_questions(&idea()).await.unwrap_err();
        assert!(err.is_blocked());
    }
}
