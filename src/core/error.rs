//! Precondition failures shared by the store and the flow controller.

use super::i18n::Message;

/// An action was refused before any network call was made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("No authenticated identity")]
    NotSignedIn,

    #[error("No business idea selected")]
    NoIdeaSelected,

    #[error("No sketch selected")]
    NoSketchSelected,

    #[error("No interview records to analyze")]
    NoRecords,

    #[error("Idea index {index} out of range ({len} ideas)")]
    IdeaOutOfRange { index: usize, len: usize },

    #[error("Unknown {artifact} variant: {key}")]
    UnknownVariant { artifact: &'static str, key: String },
}

impl PreconditionError {
    /// Localized message key for this refusal.
    pub fn message(&self) -> Message {
        match self {
            Self::NotSignedIn => Message::NotSignedIn,
            Self::NoIdeaSelected => Message::NoIdeaSelected,
            Self::NoSketchSelected => Message::NoSketchSelected,
            Self::NoRecords => Message::NoRecords,
            Self::IdeaOutOfRange { .. } | Self::UnknownVariant { .. } => Message::InvalidSelection,
        }
    }
}
