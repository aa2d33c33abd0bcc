#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

//! # Ideaflow
//!
//! Guided 3-day ideation-to-prototype workshop backed by a generative API.
//!
//! A participant describes their skills, customers and needs; ideaflow
//! generates business ideas with sketches, 3-step user-flow sketches and
//! 8-panel storyboards, interview questions for user testing, a synthesis of
//! the interview feedback, and finally a prompt for a generative web-design
//! tool.
//!
//! ## Features
//!
//! - **Selection Cascade**: Changing an upstream choice clears everything derived from it
//! - **Batch Images**: Image slots fill in concurrent batches with per-item retry
//! - **Optimistic Saves**: Every change is applied at once and written through to storage
//! - **Localized**: English, Korean and Amharic prompts and notices
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! ideaflow login
//! ideaflow profile create --name "Ada" --affiliation "Makers Lab"
//! ideaflow ideas --skills "leather crafts" --target "tourists" --needs "souvenirs"
//! ideaflow select-idea 3
//! ideaflow sketch
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::uninlined_format_args)]

pub mod ai;
pub mod core;
pub mod flow;
pub mod pipeline;
pub mod store;

// Re-export commonly used types
pub use ai::{GenerationClient, GenerationError, WorkshopGenerator};
pub use core::{Config, Language, PreconditionError, ProjectPatch, ProjectState};
pub use flow::{FlowError, ProgressEvent, WorkshopFlow};
pub use pipeline::{Artifact, BatchImagePipeline, PipelineReport};
pub use store::{ProjectStore, SaveOutcome};

#[cfg(feature = "ai")]
pub use ai::GeminiClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ideaflow";
