//! Workshop flow controller.
//!
//! Drives the participant through the workshop: generating and selecting
//! ideas, sketches and storyboards on Day 1, interview questions and feedback
//! analysis on Day 2, and the design prompt on Day 3. Every operation checks
//! its preconditions before any network call, and each kind of generation
//! runs at most once at a time.

mod guard;
mod stage;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

pub use guard::{InFlight, InFlightGuard, Operation};
pub use stage::{Day1Stage, Day1Step};

use crate::ai::{GenerationClient, GenerationError, WorkshopGenerator};
use crate::core::{
    BusinessIdea, FeedbackAnalysis, FeedbackInput, IdeaBrief, InterviewQuestion, Language,
    Message, PipelineConfig, PreconditionError, ProjectPatch, SketchStep, SketchStyle,
    StitchPrompt, StitchPromptOptions, VariantKey,
};
use crate::pipeline::{
    Artifact, BatchImagePipeline, BatchSink, GenerationResult, PipelineReport, Progress,
    StoredImageRenderer,
};
use crate::store::{BlobStore, Identity, ProjectStore, SaveOutcome};

/// Why a flow operation did not run to completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("{0} generation is already running")]
    Busy(Operation),
}

impl FlowError {
    /// Localized message key.
    pub fn message(&self) -> Message {
        match self {
            Self::Precondition(e) => e.message(),
            Self::Generation(e) => e.message(),
            Self::Busy(_) => Message::AlreadyRunning,
        }
    }

    /// Text to show the participant.
    pub fn localized(&self, lang: Language) -> String {
        let text = self.message().text(lang);
        match self {
            Self::Generation(GenerationError::Blocked { reason }) => format!("{text}: {reason}"),
            _ => text.to_string(),
        }
    }
}

/// Image progress of one artifact, sent after every batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub artifact: Artifact,
    pub completed: usize,
    pub total: usize,
}

/// Workshop flow controller.
pub struct WorkshopFlow {
    store: Arc<ProjectStore>,
    client: Arc<dyn GenerationClient>,
    blobs: Arc<dyn BlobStore>,
    pipeline: PipelineConfig,
    in_flight: InFlight,
    progress: Option<UnboundedSender<ProgressEvent>>,
}

impl WorkshopFlow {
    pub fn new(
        store: Arc<ProjectStore>,
        client: Arc<dyn GenerationClient>,
        blobs: Arc<dyn BlobStore>,
        pipeline: PipelineConfig,
    ) -> Self {
        Self { store, client, blobs, pipeline, in_flight: InFlight::default(), progress: None }
    }

    /// Report image progress on `sender`.
    pub fn with_progress(mut self, sender: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn store(&self) -> &Arc<ProjectStore> {
        &self.store
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Current Day 1 stage.
    pub fn stage(&self) -> Day1Stage {
        self.store.with_state(Day1Stage::of)
    }

    /// Generator speaking the store's current language.
    fn generator(&self) -> WorkshopGenerator {
        WorkshopGenerator::new(Arc::clone(&self.client), self.store.language())
    }

    fn begin(&self, op: Operation) -> Result<InFlightGuard, FlowError> {
        self.in_flight.try_begin(op).ok_or(FlowError::Busy(op))
    }

    fn require_identity(&self) -> Result<Identity, PreconditionError> {
        self.store.ready_identity().ok_or(PreconditionError::NotSignedIn)
    }

    fn require_selected_idea(&self) -> Result<BusinessIdea, PreconditionError> {
        self.store
            .with_state(|s| s.selected_idea().cloned())
            .ok_or(PreconditionError::NoIdeaSelected)
    }

    fn require_selected_sketch(&self) -> Result<(VariantKey, Vec<SketchStep>), PreconditionError> {
        self.store
            .with_state(|s| s.selected_sketch.clone().zip(s.selected_sketch().map(<[_]>::to_vec)))
            .ok_or(PreconditionError::NoSketchSelected)
    }

    // Day 1: ideas

    /// Generate ideas, then fill their sketches batch by batch.
    ///
    /// Replaces any existing ideas and clears the idea selection.
    pub async fn generate_ideas(
        &self,
        brief: &IdeaBrief,
        style: SketchStyle,
    ) -> Result<PipelineReport, FlowError> {
        let _guard = self.begin(Operation::Ideas)?;
        self.require_identity()?;
        self.run_ideas(brief, style).await
    }

    /// Drop the current ideas and everything downstream, then generate anew.
    pub async fn regenerate_ideas(
        &self,
        brief: &IdeaBrief,
        style: SketchStyle,
    ) -> Result<PipelineReport, FlowError> {
        let _guard = self.begin(Operation::Ideas)?;
        self.require_identity()?;
        let cleared = ProjectPatch::new().selected_idea(None).business_ideas(Vec::new());
        self.store.update(cleared).await?;
        self.run_ideas(brief, style).await
    }

    async fn run_ideas(
        &self,
        brief: &IdeaBrief,
        style: SketchStyle,
    ) -> Result<PipelineReport, FlowError> {
        let ideas = self.generator().business_ideas(brief, style).await?;
        tracing::info!(count = ideas.len(), "Generated business ideas");
        self.store.update(ProjectPatch::new().business_ideas(ideas).selected_idea(None)).await?;
        self.fill_images(Artifact::Ideas).await
    }

    /// Select the idea at `index`.
    pub async fn select_idea(&self, index: usize) -> Result<SaveOutcome, FlowError> {
        self.require_identity()?;
        Ok(self.store.update(ProjectPatch::new().selected_idea(Some(index))).await?)
    }

    /// Edit the title and description of the selected idea.
    ///
    /// A real change invalidates sketches and storyboards derived from it.
    pub async fn edit_selected_idea(
        &self,
        title: &str,
        description: &str,
    ) -> Result<SaveOutcome, FlowError> {
        self.require_identity()?;
        let index = self
            .store
            .with_state(|s| s.selected_idea)
            .ok_or(PreconditionError::NoIdeaSelected)?;
        let (title, description) = (title.trim().to_string(), description.trim().to_string());

        Ok(self
            .store
            .update_with(move |state| {
                let mut ideas = state.business_ideas.clone();
                let idea = ideas.get_mut(index)?;
                if idea.title == title && idea.description == description {
                    return None;
                }
                idea.title = title;
                idea.description = description;
                Some(ProjectPatch::new().business_ideas(ideas))
            })
            .await?)
    }

    // Day 1: sketches

    /// Generate sketch variations for the selected idea and fill their images.
    pub async fn generate_sketches(
        &self,
        style: SketchStyle,
    ) -> Result<PipelineReport, FlowError> {
        let _guard = self.begin(Operation::Sketches)?;
        self.require_identity()?;
        self.run_sketches(style).await
    }

    /// Drop the current sketches and storyboards, then generate anew.
    pub async fn regenerate_sketches(
        &self,
        style: SketchStyle,
    ) -> Result<PipelineReport, FlowError> {
        let _guard = self.begin(Operation::Sketches)?;
        self.require_identity()?;
        self.require_selected_idea()?;
        self.store.update(ProjectPatch::new().sketches(None).selected_sketch(None)).await?;
        self.run_sketches(style).await
    }

    async fn run_sketches(&self, style: SketchStyle) -> Result<PipelineReport, FlowError> {
        let idea = self.require_selected_idea()?;
        let sketches = self.generator().three_step_sketches(&idea, style).await?;
        tracing::info!(variants = sketches.len(), idea = %idea.title, "Generated sketches");

        let outcome = self
            .store
            .update_with(|state| {
                // The selection may have moved on while the request was in flight.
                state.selected_idea().filter(|current| current.same_content(&idea))?;
                Some(ProjectPatch::new().sketches(Some(sketches)).selected_sketch(None))
            })
            .await?;
        if outcome == SaveOutcome::Unchanged {
            tracing::warn!("Idea selection changed during generation, sketches discarded");
            return Ok(PipelineReport::default());
        }
        self.fill_images(Artifact::Sketches).await
    }

    /// Select a sketch variation.
    pub async fn select_sketch(&self, key: &str) -> Result<SaveOutcome, FlowError> {
        self.require_identity()?;
        Ok(self.store.update(ProjectPatch::new().selected_sketch(Some(key.to_string()))).await?)
    }

    // Day 1: storyboards

    /// Generate storyboard variations for the selected idea and sketch.
    ///
    /// `custom_description` replaces the flow summary derived from the sketch.
    pub async fn generate_storyboards(
        &self,
        custom_description: Option<&str>,
    ) -> Result<PipelineReport, FlowError> {
        let _guard = self.begin(Operation::Storyboards)?;
        self.require_identity()?;
        self.run_storyboards(custom_description).await
    }

    /// Drop the current storyboards, then generate anew.
    pub async fn regenerate_storyboards(
        &self,
        custom_description: Option<&str>,
    ) -> Result<PipelineReport, FlowError> {
        let _guard = self.begin(Operation::Storyboards)?;
        self.require_identity()?;
        self.require_selected_idea()?;
        self.require_selected_sketch()?;
        self.store.update(ProjectPatch::new().storyboards(None).selected_storyboard(None)).await?;
        self.run_storyboards(custom_description).await
    }

    async fn run_storyboards(
        &self,
        custom_description: Option<&str>,
    ) -> Result<PipelineReport, FlowError> {
        let idea = self.require_selected_idea()?;
        let (key, steps) = self.require_selected_sketch()?;
        let storyboards =
            self.generator().storyboard_pages(&idea, &steps, custom_description).await?;
        tracing::info!(variants = storyboards.len(), sketch = %key, "Generated storyboards");

        let outcome = self
            .store
            .update_with(|state| {
                (state.selected_sketch.as_ref() == Some(&key)).then(|| {
                    ProjectPatch::new().storyboards(Some(storyboards)).selected_storyboard(None)
                })
            })
            .await?;
        if outcome == SaveOutcome::Unchanged {
            tracing::warn!("Sketch selection changed during generation, storyboards discarded");
            return Ok(PipelineReport::default());
        }
        self.fill_images(Artifact::Storyboards).await
    }

    /// Select a storyboard variation.
    pub async fn select_storyboard(&self, key: &str) -> Result<SaveOutcome, FlowError> {
        self.require_identity()?;
        Ok(self.store.update(ProjectPatch::new().selected_storyboard(Some(key.to_string()))).await?)
    }

    // Images

    /// Fill image slots still pending, e.g. after an interrupted run.
    pub async fn resume_images(&self, artifact: Artifact) -> Result<PipelineReport, FlowError> {
        let op = match artifact {
            Artifact::Ideas => Operation::Ideas,
            Artifact::Sketches => Operation::Sketches,
            Artifact::Storyboards => Operation::Storyboards,
        };
        let _guard = self.begin(op)?;
        self.fill_images(artifact).await
    }

    async fn fill_images(&self, artifact: Artifact) -> Result<PipelineReport, FlowError> {
        let identity = self.require_identity()?;
        let targets = self.store.with_state(|s| artifact.pending_targets(s));
        let batch_size = match artifact {
            Artifact::Ideas => self.pipeline.idea_batch_size,
            Artifact::Sketches => self.pipeline.sketch_batch_size,
            Artifact::Storyboards => self.pipeline.storyboard_batch_size,
        };

        let pipeline = BatchImagePipeline::new(batch_size, self.pipeline.retry());
        let renderer = StoredImageRenderer::new(
            Arc::clone(&self.client),
            Arc::clone(&self.blobs),
            identity.uid,
            artifact,
        );
        let mut sink = StoreSink { store: &self.store, artifact, progress: self.progress.as_ref() };
        let report = pipeline.run(targets, &renderer, &mut sink).await;
        tracing::info!(
            %artifact,
            succeeded = report.succeeded,
            failed = report.failed,
            batches = report.batches,
            "Image generation finished"
        );
        Ok(report)
    }

    // Day 2

    /// Generate interview questions for the selected idea.
    pub async fn generate_interview_questions(&self) -> Result<Vec<InterviewQuestion>, FlowError> {
        let _guard = self.begin(Operation::InterviewQuestions)?;
        self.require_identity()?;
        let idea = self.require_selected_idea()?;

        let questions = self.generator().interview_questions(&idea).await?;
        self.store.update(ProjectPatch::new().interview_questions(questions.clone())).await?;
        Ok(questions)
    }

    /// Analyze interview transcripts or recordings.
    pub async fn analyze_feedback(
        &self,
        input: &FeedbackInput,
    ) -> Result<FeedbackAnalysis, FlowError> {
        if input.is_empty() {
            return Err(PreconditionError::NoRecords.into());
        }
        let _guard = self.begin(Operation::FeedbackAnalysis)?;
        self.require_identity()?;

        let analysis = self.generator().analyze_feedback(input).await?;
        self.store.update(ProjectPatch::new().feedback_analysis(Some(analysis.clone()))).await?;
        Ok(analysis)
    }

    // Day 3

    /// Prompt options pre-filled from the selected idea.
    pub fn stitch_options(&self) -> StitchPromptOptions {
        self.store
            .with_state(|s| s.selected_idea().map(StitchPromptOptions::for_idea))
            .unwrap_or_default()
    }

    /// Generate the design-tool prompt. The previous prompt is cleared first.
    pub async fn generate_stitch_prompt(
        &self,
        options: &StitchPromptOptions,
    ) -> Result<StitchPrompt, FlowError> {
        let _guard = self.begin(Operation::StitchPrompt)?;
        self.require_identity()?;
        self.store.update(ProjectPatch::new().stitch_prompt(None)).await?;

        let prompt = self.generator().stitch_prompt(options).await?;
        self.store.update(ProjectPatch::new().stitch_prompt(Some(prompt.clone()))).await?;
        Ok(prompt)
    }
}

/// Merges finished batches into the project store.
struct StoreSink<'a> {
    store: &'a ProjectStore,
    artifact: Artifact,
    progress: Option<&'a UnboundedSender<ProgressEvent>>,
}

#[async_trait]
impl BatchSink for StoreSink<'_> {
    async fn accept(&mut self, results: Vec<GenerationResult>, progress: Progress) {
        let artifact = self.artifact;
        match self.store.update_with(|state| artifact.merge_patch(state, &results)).await {
            Ok(SaveOutcome::Unchanged) => {
                tracing::debug!(%artifact, "Batch results no longer apply");
            }
            Ok(outcome) => {
                tracing::debug!(
                    %artifact,
                    ?outcome,
                    completed = progress.completed,
                    "Batch merged"
                );
            }
            Err(e) => tracing::warn!(%artifact, error = %e, "Batch results could not be merged"),
        }
        if progress.is_done() {
            tracing::info!(%artifact, total = progress.total, "All images settled");
        }

        if let Some(sender) = self.progress {
            let _ = sender.send(ProgressEvent {
                artifact,
                completed: progress.completed,
                total: progress.total,
            });
        }
    }
}
