use guidebook_core::{ChapterId, Direction, SectionId};
use serde::{Deserialize, Serialize};

/// Title and description, for the guide itself or one of its chapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveInput {
    pub direction: Direction,
}

/// Set the completion flag. Omitting `completed` toggles it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletedInput {
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationInput {
    pub duration: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeginEditInput {
    pub section_id: SectionId,
}

/// Draft changes. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftInput {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Expand a chapter in the outline view. `None` collapses all chapters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveChapterInput {
    pub chapter_id: Option<ChapterId>,
}
