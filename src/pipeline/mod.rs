//! Batch image pipeline.
//!
//! Fills the image slots of generated items: targets are rendered in
//! fixed-size concurrent batches with per-item retry, and each finished batch
//! is handed to a sink that merges it into the project and persists it.

mod batch;
mod renderer;
mod target;

pub use batch::{
    BatchImagePipeline, BatchSink, ImageRenderer, PipelineReport, Progress, RenderError,
};
pub use renderer::StoredImageRenderer;
pub use target::{
    Artifact, GenerationResult, GenerationTarget, Illustrated, Outcome, TargetKey, IDEAS_VARIANT,
};
