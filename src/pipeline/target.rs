//! Generation targets, results and how they map onto project artifacts.

use std::fmt;

use crate::core::{
    BusinessIdea, ImageSlot, ProjectPatch, ProjectState, SketchStep, StoryboardPage, VariantKey,
    VariantMap,
};

/// Variant key used for idea sketches.
pub const IDEAS_VARIANT: &str = "ideas";

/// Position of an item inside an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    pub variant: VariantKey,
    pub index: usize,
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.variant, self.index)
    }
}

/// An item waiting for its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTarget {
    pub key: TargetKey,
    pub prompt: String,
}

impl GenerationTarget {
    pub fn new(variant: impl Into<VariantKey>, index: usize, prompt: impl Into<String>) -> Self {
        Self { key: TargetKey { variant: variant.into(), index }, prompt: prompt.into() }
    }
}

/// Final state of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Image stored at this URL
    Ready(String),
    /// All attempts failed
    Failed,
}

impl Outcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    fn to_slot(&self) -> ImageSlot {
        match self {
            Self::Ready(url) => ImageSlot::Ready { url: url.clone() },
            Self::Failed => ImageSlot::Failed,
        }
    }
}

/// A target with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub target: GenerationTarget,
    pub outcome: Outcome,
}

/// Items that carry an image slot rendered from a prompt.
pub trait Illustrated {
    fn image_prompt(&self) -> &str;
    fn image_slot(&self) -> &ImageSlot;
    fn image_slot_mut(&mut self) -> &mut ImageSlot;
}

impl Illustrated for BusinessIdea {
    fn image_prompt(&self) -> &str {
        &self.sketch_prompt
    }

    fn image_slot(&self) -> &ImageSlot {
        &self.sketch
    }

    fn image_slot_mut(&mut self) -> &mut ImageSlot {
        &mut self.sketch
    }
}

impl Illustrated for SketchStep {
    fn image_prompt(&self) -> &str {
        &self.image_prompt
    }

    fn image_slot(&self) -> &ImageSlot {
        &self.image
    }

    fn image_slot_mut(&mut self) -> &mut ImageSlot {
        &mut self.image
    }
}

impl Illustrated for StoryboardPage {
    fn image_prompt(&self) -> &str {
        &self.image_prompt
    }

    fn image_slot(&self) -> &ImageSlot {
        &self.image
    }

    fn image_slot_mut(&mut self) -> &mut ImageSlot {
        &mut self.image
    }
}

/// Artifacts whose items get images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Ideas,
    Sketches,
    Storyboards,
}

impl Artifact {
    /// Name used in storage paths and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ideas => "ideas",
            Self::Sketches => "sketches",
            Self::Storyboards => "storyboards",
        }
    }

    /// Targets for every item still waiting for its image.
    pub fn pending_targets(self, state: &ProjectState) -> Vec<GenerationTarget> {
        match self {
            Self::Ideas => pending_in(IDEAS_VARIANT, &state.business_ideas),
            Self::Sketches => {
                state.three_step_sketches.as_ref().map_or_else(Vec::new, variant_targets)
            }
            Self::Storyboards => state.storyboards.as_ref().map_or_else(Vec::new, variant_targets),
        }
    }

    /// Patch writing `results` into the current artifact.
    ///
    /// Results whose target no longer matches (item regenerated, removed or
    /// already settled) are dropped. Returns `None` when nothing applies.
    pub fn merge_patch(
        self,
        state: &ProjectState,
        results: &[GenerationResult],
    ) -> Option<ProjectPatch> {
        match self {
            Self::Ideas => {
                let mut ideas = state.business_ideas.clone();
                let applied = results
                    .iter()
                    .filter(|r| r.target.key.variant == IDEAS_VARIANT)
                    .filter(|r| settle(ideas.get_mut(r.target.key.index), r))
                    .count();
                (applied > 0).then(|| ProjectPatch::new().business_ideas(ideas))
            }
            Self::Sketches => {
                let mut sketches = state.three_step_sketches.clone()?;
                (merge_variants(&mut sketches, results) > 0)
                    .then(|| ProjectPatch::new().sketches(Some(sketches)))
            }
            Self::Storyboards => {
                let mut storyboards = state.storyboards.clone()?;
                (merge_variants(&mut storyboards, results) > 0)
                    .then(|| ProjectPatch::new().storyboards(Some(storyboards)))
            }
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn pending_in<T: Illustrated>(variant: &str, items: &[T]) -> Vec<GenerationTarget> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| !item.image_slot().is_settled())
        .map(|(i, item)| GenerationTarget::new(variant, i, item.image_prompt()))
        .collect()
}

fn variant_targets<T: Illustrated>(map: &VariantMap<T>) -> Vec<GenerationTarget> {
    map.iter().flat_map(|(variant, items)| pending_in(variant, items)).collect()
}

fn merge_variants<T: Illustrated>(map: &mut VariantMap<T>, results: &[GenerationResult]) -> usize {
    results
        .iter()
        .filter(|r| {
            let item =
                map.get_mut(&r.target.key.variant).and_then(|v| v.get_mut(r.target.key.index));
            settle(item, r)
        })
        .count()
}

/// Settle one item's slot. Returns whether the result applied.
fn settle<T: Illustrated>(item: Option<&mut T>, result: &GenerationResult) -> bool {
    let Some(item) = item else {
        tracing::debug!(target_key = %result.target.key, "Dropping result for missing item");
        return false;
    };
    if item.image_prompt() != result.target.prompt || item.image_slot().is_settled() {
        tracing::debug!(target_key = %result.target.key, "Dropping stale result");
        return false;
    }
    *item.image_slot_mut() = result.outcome.to_slot();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{variant_key, SketchStepDetails};

    fn idea(n: usize) -> BusinessIdea {
        BusinessIdea {
            title: format!("Idea {n}"),
            description: String::new(),
            sketch_prompt: format!("draw {n}"),
            sketch: ImageSlot::Pending,
        }
    }

    fn step(prompt: &str) -> SketchStep {
        SketchStep {
            title: String::new(),
            description: String::new(),
            image_prompt: prompt.to_string(),
            details: SketchStepDetails::default(),
            image: ImageSlot::Pending,
        }
    }

    fn ready(target: GenerationTarget, url: &str) -> GenerationResult {
        GenerationResult { target, outcome: Outcome::Ready(url.to_string()) }
    }

    #[test]
    fn test_pending_targets_skip_settled_items() {
        let mut state =
            ProjectState { business_ideas: (0..3).map(idea).collect(), ..Default::default() };
        state.business_ideas[1].sketch = ImageSlot::Failed;

        let targets = Artifact::Ideas.pending_targets(&state);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1], GenerationTarget::new(IDEAS_VARIANT, 2, "draw 2"));
    }

    #[test]
    fn test_variant_targets_in_key_order() {
        let mut sketches = VariantMap::new();
        sketches.insert(variant_key(1), vec![step("b0")]);
        sketches.insert(variant_key(0), vec![step("a0"), step("a1")]);
        let state = ProjectState { three_step_sketches: Some(sketches), ..Default::default() };

        let keys: Vec<String> =
            Artifact::Sketches.pending_targets(&state).iter().map(|t| t.key.to_string()).collect();
        assert_eq!(keys, vec!["v0[0]", "v0[1]", "v1[0]"]);
        assert!(Artifact::Storyboards.pending_targets(&state).is_empty());
    }

    #[test]
    fn test_merge_ideas() {
        let state =
            ProjectState { business_ideas: (0..2).map(idea).collect(), ..Default::default() };
        let results = vec![
            ready(GenerationTarget::new(IDEAS_VARIANT, 0, "draw 0"), "mem://0.png"),
            GenerationResult {
                target: GenerationTarget::new(IDEAS_VARIANT, 1, "draw 1"),
                outcome: Outcome::Failed,
            },
        ];

        let patch = Artifact::Ideas.merge_patch(&state, &results).unwrap();
        let ideas = patch.business_ideas.unwrap();
        assert_eq!(ideas[0].sketch.url(), Some("mem://0.png"));
        assert_eq!(ideas[1].sketch, ImageSlot::Failed);
    }

    #[test]
    fn test_stale_results_are_dropped() {
        let mut sketches = VariantMap::new();
        sketches.insert(variant_key(0), vec![step("fresh")]);
        let state = ProjectState { three_step_sketches: Some(sketches), ..Default::default() };

        let results = vec![
            ready(GenerationTarget::new("v0", 0, "old prompt"), "mem://old.png"),
            ready(GenerationTarget::new("v0", 5, "fresh"), "mem://missing.png"),
            ready(GenerationTarget::new("v9", 0, "fresh"), "mem://gone.png"),
        ];
        assert!(Artifact::Sketches.merge_patch(&state, &results).is_none());
        assert!(Artifact::Storyboards.merge_patch(&state, &results).is_none());
    }

    #[test]
    fn test_settled_slot_transitions_once() {
        let mut state = ProjectState { business_ideas: vec![idea(0)], ..Default::default() };
        state.business_ideas[0].sketch = ImageSlot::Ready { url: "mem://first.png".into() };
        let results =
            vec![ready(GenerationTarget::new(IDEAS_VARIANT, 0, "draw 0"), "mem://second.png")];
        assert!(Artifact::Ideas.merge_patch(&state, &results).is_none());
    }
}
