//! Day 1 navigation: ideas, sketches, storyboard.

use std::fmt;

use crate::core::ProjectState;

/// Tabs of Day 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Day1Step {
    Idea,
    Sketch,
    Storyboard,
}

impl Day1Step {
    pub const ALL: [Self; 3] = [Self::Idea, Self::Sketch, Self::Storyboard];

    /// Whether the tab may be entered with the given state.
    ///
    /// Sketch needs a selected idea, storyboard additionally a selected sketch.
    pub fn can_enter(self, state: &ProjectState) -> bool {
        match self {
            Self::Idea => true,
            Self::Sketch => state.selected_idea().is_some(),
            Self::Storyboard => {
                state.selected_idea().is_some() && state.selected_sketch().is_some()
            }
        }
    }
}

impl fmt::Display for Day1Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idea => "idea",
            Self::Sketch => "sketch",
            Self::Storyboard => "storyboard",
        })
    }
}

/// Position in the Day 1 state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Day1Stage {
    pub step: Day1Step,
    /// Whether this step's artifact has been selected
    pub selected: bool,
}

impl Day1Stage {
    /// Derive the stage from the project state.
    pub fn of(state: &ProjectState) -> Self {
        let (step, selected) = if state.selected_storyboard().is_some() {
            (Day1Step::Storyboard, true)
        } else if state.storyboards.is_some() {
            (Day1Step::Storyboard, false)
        } else if state.selected_sketch().is_some() {
            (Day1Step::Sketch, true)
        } else if state.three_step_sketches.is_some() {
            (Day1Step::Sketch, false)
        } else {
            (Day1Step::Idea, state.selected_idea().is_some())
        };
        Self { step, selected }
    }

    /// Furthest tab that may be entered.
    pub fn furthest_step(state: &ProjectState) -> Day1Step {
        Day1Step::ALL.into_iter().rev().find(|s| s.can_enter(state)).unwrap_or(Day1Step::Idea)
    }
}

impl fmt::Display for Day1Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selection = if self.selected { "selected" } else { "none" };
        write!(f, "{}({selection})", self.step)
    }
}
