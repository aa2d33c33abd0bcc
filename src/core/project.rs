//! Project state, partial updates and cascading invalidation.
//!
//! [`ProjectState`] is the whole workshop aggregate. It only changes through
//! [`ProjectState::apply`], which merges a [`ProjectPatch`] field by field and
//! then clears whatever a changed selection invalidates, as listed in
//! [`INVALIDATION_RULES`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::PreconditionError;
use super::model::{
    BusinessIdea, FeedbackAnalysis, InterviewQuestion, SketchStep, StitchPrompt, StoryboardPage,
    VariantKey, VariantMap,
};

/// Top-level fields of the project aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProjectField {
    BusinessIdeas,
    SelectedIdea,
    Sketches,
    SelectedSketch,
    Storyboards,
    SelectedStoryboard,
    InterviewQuestions,
    FeedbackAnalysis,
    StitchPrompt,
}

/// Selection → fields that become stale when that selection changes.
pub const INVALIDATION_RULES: &[(ProjectField, &[ProjectField])] = &[
    (
        ProjectField::SelectedIdea,
        &[
            ProjectField::Sketches,
            ProjectField::SelectedSketch,
            ProjectField::Storyboards,
            ProjectField::SelectedStoryboard,
        ],
    ),
    (ProjectField::SelectedSketch, &[ProjectField::Storyboards, ProjectField::SelectedStoryboard]),
];

/// Fields invalidated when `field` changes.
pub fn downstream_of(field: ProjectField) -> &'static [ProjectField] {
    INVALIDATION_RULES.iter().find(|(f, _)| *f == field).map(|(_, deps)| *deps).unwrap_or(&[])
}

/// The user's workshop progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectState {
    pub business_ideas: Vec<BusinessIdea>,
    /// Index into `business_ideas`
    pub selected_idea: Option<usize>,
    pub three_step_sketches: Option<VariantMap<SketchStep>>,
    /// Key into `three_step_sketches`
    pub selected_sketch: Option<VariantKey>,
    pub storyboards: Option<VariantMap<StoryboardPage>>,
    /// Key into `storyboards`
    pub selected_storyboard: Option<VariantKey>,
    pub interview_questions: Vec<InterviewQuestion>,
    pub feedback_analysis: Option<FeedbackAnalysis>,
    pub stitch_prompt: Option<StitchPrompt>,
}

/// Result of applying a patch.
#[derive(Debug, Clone)]
pub struct Applied {
    /// The merged state
    pub state: ProjectState,
    /// Fields cleared by cascading invalidation
    pub cleared: Vec<ProjectField>,
}

impl ProjectState {
    /// The selected idea.
    pub fn selected_idea(&self) -> Option<&BusinessIdea> {
        self.selected_idea.and_then(|i| self.business_ideas.get(i))
    }

    /// Steps of the selected sketch variation.
    pub fn selected_sketch(&self) -> Option<&[SketchStep]> {
        let key = self.selected_sketch.as_ref()?;
        self.three_step_sketches.as_ref()?.get(key).map(Vec::as_slice)
    }

    /// Pages of the selected storyboard variation.
    pub fn selected_storyboard(&self) -> Option<&[StoryboardPage]> {
        let key = self.selected_storyboard.as_ref()?;
        self.storyboards.as_ref()?.get(key).map(Vec::as_slice)
    }

    /// Merge `patch` into a copy of this state.
    ///
    /// Collections are replaced wholesale. When a selection resolves to a
    /// different item than before, its downstream fields are cleared in the
    /// same step unless the patch sets them explicitly. A result whose
    /// selections point at missing items is refused.
    pub fn apply(&self, patch: &ProjectPatch) -> Result<Applied, PreconditionError> {
        let mut next = self.clone();
        patch.write_into(&mut next);

        let explicit: BTreeSet<ProjectField> = patch.fields().into_iter().collect();
        let mut cleared = Vec::new();

        for (selection, downstream) in INVALIDATION_RULES {
            if !selection_changed(*selection, self, &next) {
                continue;
            }
            for field in *downstream {
                if !explicit.contains(field) && next.clear(*field) {
                    cleared.push(*field);
                }
            }
        }

        next.validate_selections()?;
        Ok(Applied { state: next, cleared })
    }

    /// Reset a field to its initial value. Returns whether anything changed.
    fn clear(&mut self, field: ProjectField) -> bool {
        let before_empty = self.is_cleared(field);
        match field {
            ProjectField::BusinessIdeas => self.business_ideas.clear(),
            ProjectField::SelectedIdea => self.selected_idea = None,
            ProjectField::Sketches => self.three_step_sketches = None,
            ProjectField::SelectedSketch => self.selected_sketch = None,
            ProjectField::Storyboards => self.storyboards = None,
            ProjectField::SelectedStoryboard => self.selected_storyboard = None,
            ProjectField::InterviewQuestions => self.interview_questions.clear(),
            ProjectField::FeedbackAnalysis => self.feedback_analysis = None,
            ProjectField::StitchPrompt => self.stitch_prompt = None,
        }
        !before_empty
    }

    fn is_cleared(&self, field: ProjectField) -> bool {
        match field {
            ProjectField::BusinessIdeas => self.business_ideas.is_empty(),
            ProjectField::SelectedIdea => self.selected_idea.is_none(),
            ProjectField::Sketches => self.three_step_sketches.is_none(),
            ProjectField::SelectedSketch => self.selected_sketch.is_none(),
            ProjectField::Storyboards => self.storyboards.is_none(),
            ProjectField::SelectedStoryboard => self.selected_storyboard.is_none(),
            ProjectField::InterviewQuestions => self.interview_questions.is_empty(),
            ProjectField::FeedbackAnalysis => self.feedback_analysis.is_none(),
            ProjectField::StitchPrompt => self.stitch_prompt.is_none(),
        }
    }

    fn validate_selections(&self) -> Result<(), PreconditionError> {
        if let Some(index) = self.selected_idea {
            if index >= self.business_ideas.len() {
                return Err(PreconditionError::IdeaOutOfRange {
                    index,
                    len: self.business_ideas.len(),
                });
            }
        }

        if let Some(ref key) = self.selected_sketch {
            let exists = self.three_step_sketches.as_ref().is_some_and(|m| m.contains_key(key));
            if !exists {
                return Err(PreconditionError::UnknownVariant {
                    artifact: "sketch",
                    key: key.clone(),
                });
            }
        }

        if let Some(ref key) = self.selected_storyboard {
            let exists = self.storyboards.as_ref().is_some_and(|m| m.contains_key(key));
            if !exists {
                return Err(PreconditionError::UnknownVariant {
                    artifact: "storyboard",
                    key: key.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Whether a selection now refers to something different.
///
/// Ideas compare by content so that merging sketches into the idea list does
/// not count as a new selection, while editing the selected idea does.
fn selection_changed(field: ProjectField, before: &ProjectState, after: &ProjectState) -> bool {
    match field {
        ProjectField::SelectedIdea => match (before.selected_idea(), after.selected_idea()) {
            (None, None) => false,
            (Some(a), Some(b)) => !a.same_content(b),
            _ => true,
        },
        ProjectField::SelectedSketch => before.selected_sketch != after.selected_sketch,
        ProjectField::SelectedStoryboard => before.selected_storyboard != after.selected_storyboard,
        _ => false,
    }
}

/// Partial update of [`ProjectState`].
///
/// `None` leaves a field untouched. Nullable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub business_ideas: Option<Vec<BusinessIdea>>,
    pub selected_idea: Option<Option<usize>>,
    pub three_step_sketches: Option<Option<VariantMap<SketchStep>>>,
    pub selected_sketch: Option<Option<VariantKey>>,
    pub storyboards: Option<Option<VariantMap<StoryboardPage>>>,
    pub selected_storyboard: Option<Option<VariantKey>>,
    pub interview_questions: Option<Vec<InterviewQuestion>>,
    pub feedback_analysis: Option<Option<FeedbackAnalysis>>,
    pub stitch_prompt: Option<Option<StitchPrompt>>,
}

impl ProjectPatch {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn business_ideas(mut self, ideas: Vec<BusinessIdea>) -> Self {
        self.business_ideas = Some(ideas);
        self
    }

    pub fn selected_idea(mut self, index: Option<usize>) -> Self {
        self.selected_idea = Some(index);
        self
    }

    pub fn sketches(mut self, sketches: Option<VariantMap<SketchStep>>) -> Self {
        self.three_step_sketches = Some(sketches);
        self
    }

    pub fn selected_sketch(mut self, key: Option<VariantKey>) -> Self {
        self.selected_sketch = Some(key);
        self
    }

    pub fn storyboards(mut self, storyboards: Option<VariantMap<StoryboardPage>>) -> Self {
        self.storyboards = Some(storyboards);
        self
    }

    pub fn selected_storyboard(mut self, key: Option<VariantKey>) -> Self {
        self.selected_storyboard = Some(key);
        self
    }

    pub fn interview_questions(mut self, questions: Vec<InterviewQuestion>) -> Self {
        self.interview_questions = Some(questions);
        self
    }

    pub fn feedback_analysis(mut self, analysis: Option<FeedbackAnalysis>) -> Self {
        self.feedback_analysis = Some(analysis);
        self
    }

    pub fn stitch_prompt(mut self, prompt: Option<StitchPrompt>) -> Self {
        self.stitch_prompt = Some(prompt);
        self
    }

    /// Fields this patch sets.
    pub fn fields(&self) -> Vec<ProjectField> {
        let mut fields = Vec::new();
        if self.business_ideas.is_some() {
            fields.push(ProjectField::BusinessIdeas);
        }
        if self.selected_idea.is_some() {
            fields.push(ProjectField::SelectedIdea);
        }
        if self.three_step_sketches.is_some() {
            fields.push(ProjectField::Sketches);
        }
        if self.selected_sketch.is_some() {
            fields.push(ProjectField::SelectedSketch);
        }
        if self.storyboards.is_some() {
            fields.push(ProjectField::Storyboards);
        }
        if self.selected_storyboard.is_some() {
            fields.push(ProjectField::SelectedStoryboard);
        }
        if self.interview_questions.is_some() {
            fields.push(ProjectField::InterviewQuestions);
        }
        if self.feedback_analysis.is_some() {
            fields.push(ProjectField::FeedbackAnalysis);
        }
        if self.stitch_prompt.is_some() {
            fields.push(ProjectField::StitchPrompt);
        }
        fields
    }

    /// Whether the patch sets nothing.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    fn write_into(&self, state: &mut ProjectState) {
        if let Some(ref v) = self.business_ideas {
            state.business_ideas.clone_from(v);
        }
        if let Some(v) = self.selected_idea {
            state.selected_idea = v;
        }
        if let Some(ref v) = self.three_step_sketches {
            state.three_step_sketches.clone_from(v);
        }
        if let Some(ref v) = self.selected_sketch {
            state.selected_sketch.clone_from(v);
        }
        if let Some(ref v) = self.storyboards {
            state.storyboards.clone_from(v);
        }
        if let Some(ref v) = self.selected_storyboard {
            state.selected_storyboard.clone_from(v);
        }
        if let Some(ref v) = self.interview_questions {
            state.interview_questions.clone_from(v);
        }
        if let Some(ref v) = self.feedback_analysis {
            state.feedback_analysis.clone_from(v);
        }
        if let Some(ref v) = self.stitch_prompt {
            state.stitch_prompt.clone_from(v);
        }
    }
}
