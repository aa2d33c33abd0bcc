//! Core types and functionality for ideaflow.
//!
//! This module contains the fundamental data structures used throughout
//! the application: workshop artifacts, the project aggregate with its
//! invalidation rules, configuration, localization and the retry policy.

mod config;
mod error;
mod i18n;
mod model;
mod project;
mod retry;

pub use config::{AiConfig, Config, GeneralConfig, PipelineConfig, StorageBackend, StorageConfig};
pub use error::PreconditionError;
pub use i18n::{describe_save_age, Language, Message};
pub use model::{
    variant_key, ActionItem, AiExperience, AudioClip, BusinessIdea, FeedbackAnalysis,
    FeedbackInput, IdeaBrief, ImageSlot, InterviewQuestion, KeyPattern, PageConfiguration,
    Priority, ProfilePatch, ProjectType, SketchStep, SketchStepDetails, SketchStyle,
    StitchPrompt, StitchPromptOptions, StoryboardPage, UserProfile, VariantKey, VariantMap,
};
pub use project::{
    downstream_of, Applied, ProjectField, ProjectPatch, ProjectState, INVALIDATION_RULES,
};
pub use retry::{retry_async, RetryConfig, RetryResult};
