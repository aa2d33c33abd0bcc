//! Workshop artifact types.
//!
//! Everything the workshop generates or collects: ideas, sketch steps,
//! storyboard pages, interview questions, feedback analysis and the design
//! prompt. Field names serialize in camelCase to match the stored documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key of one variation within a generated artifact (`v0`, `v1`, ...).
pub type VariantKey = String;

/// Parallel variations of one artifact, keyed by variant.
pub type VariantMap<T> = BTreeMap<VariantKey, Vec<T>>;

/// Build the variant key for the variation at `index`.
pub fn variant_key(index: usize) -> VariantKey {
    format!("v{index}")
}

/// Image slot of a generated item.
///
/// Starts as `Pending` when the text is generated and transitions exactly
/// once, to `Ready` or `Failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageSlot {
    /// No image yet.
    #[default]
    Pending,
    /// Image stored at the given URL.
    Ready { url: String },
    /// Generation gave up after exhausting its attempts.
    Failed,
}

impl ImageSlot {
    /// Whether the slot has settled (ready or failed).
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// URL of the image, if present.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Ready { url } => Some(url),
            _ => None,
        }
    }
}

/// Illustration style for idea sketches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SketchStyle {
    /// Child-like drawing
    #[default]
    Simple,
    /// Hand-drawn professional sketch
    Professional,
}

/// What the participant brings to the ideation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaBrief {
    /// Skills and experience
    pub skills: String,
    /// Target customers
    pub target: String,
    /// Needs in the participant's environment
    pub needs: String,
}

/// A generated business idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessIdea {
    pub title: String,
    pub description: String,
    pub sketch_prompt: String,
    #[serde(default)]
    pub sketch: ImageSlot,
}

impl BusinessIdea {
    /// Whether two ideas describe the same thing, ignoring their sketches.
    pub fn same_content(&self, other: &Self) -> bool {
        self.title == other.title && self.description == other.description
    }
}

/// Technical breakdown of one sketched screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchStepDetails {
    pub layout: String,
    pub components: Vec<String>,
    pub interactions: String,
    pub visuals: String,
    pub tips: String,
}

/// One step of a 3-step user flow sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchStep {
    pub title: String,
    pub description: String,
    pub image_prompt: String,
    #[serde(default)]
    pub details: SketchStepDetails,
    #[serde(default)]
    pub image: ImageSlot,
}

/// One panel of a storyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardPage {
    pub title: String,
    pub description: String,
    pub image_prompt: String,
    #[serde(default)]
    pub image: ImageSlot,
}

/// A user-interview question with its intent and follow-ups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuestion {
    pub category: String,
    pub question: String,
    pub intent: String,
    #[serde(default)]
    pub follow_up: Vec<String>,
}

/// Recurring theme found in interview feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPattern {
    pub pattern: String,
    pub description: String,
    pub count: f64,
}

/// Priority of a follow-up action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Prioritized follow-up action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub priority: Priority,
    pub item: String,
    pub category: String,
}

/// Synthesis of user-testing feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAnalysis {
    pub summary: String,
    pub key_patterns: Vec<KeyPattern>,
    pub insights: Vec<String>,
    pub action_items: Vec<ActionItem>,
}

/// Recorded audio interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// MIME type, e.g. `audio/webm`
    pub mime_type: String,
    /// Raw audio bytes
    pub bytes: Vec<u8>,
}

/// Interview records to analyze. One kind per analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackInput {
    /// Typed interview transcripts
    Transcripts(Vec<String>),
    /// Audio recordings
    Audio(Vec<AudioClip>),
}

impl FeedbackInput {
    /// Whether there is nothing to analyze.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Transcripts(items) => items.iter().all(|t| t.trim().is_empty()),
            Self::Audio(clips) => clips.iter().all(|c| c.bytes.is_empty()),
        }
    }
}

/// Final prompt for a generative web-design tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StitchPrompt {
    pub title: String,
    pub description: String,
    pub optimized_prompt: String,
}

/// Kind of site the design prompt describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    #[default]
    LandingPage,
    WebApp,
    Ecommerce,
    Portfolio,
}

impl ProjectType {
    /// Identifier used inside prompts.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LandingPage => "landing_page",
            Self::WebApp => "web_app",
            Self::Ecommerce => "ecommerce",
            Self::Portfolio => "portfolio",
        }
    }
}

/// One page of the designed site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfiguration {
    pub id: String,
    pub purpose: String,
    pub content: String,
    pub enabled: bool,
}

impl PageConfiguration {
    /// Placeholder page at position `index`.
    pub fn placeholder(index: usize) -> Self {
        Self {
            id: format!("page-{index}"),
            purpose: format!("Page {} Purpose", index + 1),
            content: format!("Page {} Content", index + 1),
            enabled: true,
        }
    }
}

/// Options for design prompt generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StitchPromptOptions {
    pub problem: String,
    pub solution: String,
    pub project_type: ProjectType,
    pub ui_language: String,
    pub design_style: String,
    pub color_palette: String,
    pub layout: String,
    pub typography: String,
    pub components: Vec<String>,
    pub additional_requirements: String,
    pub pages: Vec<PageConfiguration>,
}

impl StitchPromptOptions {
    /// Maximum number of pages a prompt may describe.
    pub const MAX_PAGES: usize = 6;

    /// Defaults pre-filled from the selected idea.
    pub fn for_idea(idea: &BusinessIdea) -> Self {
        Self {
            problem: "Customers are having trouble finding our products easily.".to_string(),
            solution: format!(
                "A website with intuitive product catalog and search functionality. (Based on: {})",
                idea.title
            ),
            ..Self::default()
        }
    }

    /// Pages that will be described in the prompt.
    pub fn enabled_pages(&self) -> impl Iterator<Item = &PageConfiguration> {
        self.pages.iter().filter(|p| p.enabled)
    }

    /// Resize the page list, keeping existing pages and adding placeholders.
    pub fn set_page_count(&mut self, count: usize) {
        let count = count.min(Self::MAX_PAGES);
        if count < self.pages.len() {
            self.pages.truncate(count);
        } else {
            let start = self.pages.len();
            self.pages.extend((start..count).map(PageConfiguration::placeholder));
        }
    }
}

impl Default for StitchPromptOptions {
    fn default() -> Self {
        Self {
            problem: String::new(),
            solution: String::new(),
            project_type: ProjectType::LandingPage,
            ui_language: "English".to_string(),
            design_style: "modern_minimalist".to_string(),
            color_palette: "blue_professional".to_string(),
            layout: "grid".to_string(),
            typography: "inter".to_string(),
            components: vec![
                "hero_section".to_string(),
                "navigation_menu".to_string(),
                "contact_form".to_string(),
            ],
            additional_requirements: String::new(),
            pages: (0..5).map(PageConfiguration::placeholder).collect(),
        }
    }
}

/// Participant's self-reported AI experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiExperience {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Workshop participant profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    pub affiliation: String,
    pub ai_experience: AiExperience,
    /// Creation time, Unix epoch milliseconds
    pub created_at: i64,
}

/// Partial profile update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_experience: Option<AiExperience>,
}

impl ProfilePatch {
    /// Apply the patch to a profile.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(ref name) = self.name {
            profile.name.clone_from(name);
        }
        if let Some(ref affiliation) = self.affiliation {
            profile.affiliation.clone_from(affiliation);
        }
        if let Some(experience) = self.ai_experience {
            profile.ai_experience = experience;
        }
    }
}
