use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::outline::{ChapterId, SectionId};

/// The entity an operation was addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    Chapter(ChapterId),
    Section(SectionId),
    /// A section exists but has no content entry.
    Content(SectionId),
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chapter(id) => write!(f, "chapter '{id}'"),
            Self::Section(id) => write!(f, "section '{id}'"),
            Self::Content(id) => write!(f, "content for section '{id}'"),
        }
    }
}

/// Failures returned by outline operations.
///
/// A failed operation never mutates the outline, the content map or the edit
/// session. Moving past the first or last position is not an error; see
/// [`MoveOutcome::BoundaryNoop`](crate::reorder::MoveOutcome::BoundaryNoop).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
    #[error("{0} not found")]
    NotFound(ItemRef),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl OutlineError {
    pub fn chapter_not_found(id: &ChapterId) -> Self {
        Self::NotFound(ItemRef::Chapter(id.clone()))
    }

    pub fn section_not_found(id: &SectionId) -> Self {
        Self::NotFound(ItemRef::Section(id.clone()))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, OutlineError>;
