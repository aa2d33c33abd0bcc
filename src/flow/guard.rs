//! In-flight tracking for generation operations.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Operations that may run at most once at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ideas,
    Sketches,
    Storyboards,
    InterviewQuestions,
    FeedbackAnalysis,
    StitchPrompt,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ideas => "ideas",
            Self::Sketches => "sketches",
            Self::Storyboards => "storyboards",
            Self::InterviewQuestions => "interview questions",
            Self::FeedbackAnalysis => "feedback analysis",
            Self::StitchPrompt => "design prompt",
        })
    }
}

/// Set of running operations.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<Operation>>>,
}

impl InFlight {
    /// Mark `op` as running. Returns `None` if it already is.
    pub fn try_begin(&self, op: Operation) -> Option<InFlightGuard> {
        if !self.active.lock().insert(op) {
            return None;
        }
        Some(InFlightGuard { active: Arc::clone(&self.active), op })
    }

    pub fn is_running(&self, op: Operation) -> bool {
        self.active.lock().contains(&op)
    }
}

/// Releases its operation when dropped, on success, error or cancellation.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<Operation>>>,
    op: Operation,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.op);
    }
}
