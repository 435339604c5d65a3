use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored guide.
///
/// The guide row only carries the top-level metadata. Chapters, sections and
/// their content are stored alongside it and replaced as a whole on publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guide {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// When the outline was last published, `None` for a guide that has never
    /// been published.
    pub published_at: Option<DateTime<Utc>>,
}

/// Input for creating a new, empty guide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGuideInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A guide with its chapter and section counts, used for list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideSummary {
    #[serde(flatten)]
    pub guide: Guide,
    pub chapter_count: usize,
    pub section_count: usize,
}
