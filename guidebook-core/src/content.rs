use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ItemRef, OutlineError, Result};
use crate::outline::{SectionId, PLACEHOLDER_SECTION_TITLE};

/// The editable payload of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub section_id: SectionId,
    /// May differ from the section's display title while a draft is open.
    pub title: String,
    pub body: String,
}

impl ContentEntry {
    pub fn new(
        section_id: impl Into<SectionId>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            section_id: section_id.into(),
            title: title.into(),
            body: body.into(),
        }
    }

    /// The entry created alongside a freshly added section.
    pub fn placeholder(section_id: SectionId) -> Self {
        Self::new(section_id, PLACEHOLDER_SECTION_TITLE, "")
    }
}

/// Section content keyed by section id, independent of outline order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentMap {
    entries: BTreeMap<SectionId, ContentEntry>,
}

impl ContentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from loaded entries. Later duplicates win.
    pub fn from_entries(entries: impl IntoIterator<Item = ContentEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.section_id.clone(), e))
                .collect(),
        }
    }

    pub fn get(&self, section_id: &SectionId) -> Result<&ContentEntry> {
        self.entries
            .get(section_id)
            .ok_or_else(|| OutlineError::NotFound(ItemRef::Content(section_id.clone())))
    }

    pub fn contains(&self, section_id: &SectionId) -> bool {
        self.entries.contains_key(section_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentEntry> {
        self.entries.values()
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &SectionId> {
        self.entries.keys()
    }

    /// Upsert. Only reached through session commit, section creation and
    /// cascade deletion.
    pub(crate) fn set(&mut self, section_id: SectionId, title: String, body: String) {
        self.entries.insert(
            section_id.clone(),
            ContentEntry {
                section_id,
                title,
                body,
            },
        );
    }

    pub(crate) fn remove(&mut self, section_id: &SectionId) -> Option<ContentEntry> {
        self.entries.remove(section_id)
    }
}
