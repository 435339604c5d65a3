//! The seam between the editor and whatever stores guides.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use uuid::Uuid;

use crate::content::{ContentEntry, ContentMap};
use crate::invariants::InvariantViolation;
use crate::outline::{Outline, SectionId};

/// Where an editing session loads its starting point from.
pub trait OutlineSource {
    type Error;

    fn load_outline(&self, guide: Uuid) -> Result<Outline, Self::Error>;

    /// `None` if the section has no stored content.
    fn load_content(
        &self,
        guide: Uuid,
        section_id: &SectionId,
    ) -> Result<Option<ContentEntry>, Self::Error>;

    /// Bulk load. The default asks for each section of `outline` in turn.
    fn load_all_content(&self, guide: Uuid, outline: &Outline) -> Result<ContentMap, Self::Error> {
        let mut entries = Vec::new();
        for id in outline.section_ids() {
            if let Some(entry) = self.load_content(guide, id)? {
                entries.push(entry);
            }
        }
        Ok(ContentMap::from_entries(entries))
    }
}

/// Where a finished outline is handed off to. Implementations must replace
/// the stored guide atomically.
pub trait OutlineSink {
    type Error;

    fn publish(&self, guide: Uuid, outline: &Outline, content: &ContentMap)
        -> Result<(), Self::Error>;
}

#[derive(Error, Debug)]
pub enum MemoryStoreError {
    #[error("guide {0} not found")]
    UnknownGuide(Uuid),

    #[error(transparent)]
    Invalid(#[from] InvariantViolation),
}

/// A process-local store, handy for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    guides: Mutex<HashMap<Uuid, (Outline, ContentMap)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, guide: Uuid, outline: Outline, content: ContentMap) {
        self.guides
            .lock()
            .expect("memory store lock poisoned")
            .insert(guide, (outline, content));
    }
}

impl OutlineSource for MemoryStore {
    type Error = MemoryStoreError;

    fn load_outline(&self, guide: Uuid) -> Result<Outline, Self::Error> {
        self.guides
            .lock()
            .expect("memory store lock poisoned")
            .get(&guide)
            .map(|(outline, _)| outline.clone())
            .ok_or(MemoryStoreError::UnknownGuide(guide))
    }

    fn load_content(
        &self,
        guide: Uuid,
        section_id: &SectionId,
    ) -> Result<Option<ContentEntry>, Self::Error> {
        let guides = self.guides.lock().expect("memory store lock poisoned");
        let (_, content) = guides
            .get(&guide)
            .ok_or(MemoryStoreError::UnknownGuide(guide))?;
        Ok(content.get(section_id).ok().cloned())
    }
}

impl OutlineSink for MemoryStore {
    type Error = MemoryStoreError;

    fn publish(
        &self,
        guide: Uuid,
        outline: &Outline,
        content: &ContentMap,
    ) -> Result<(), Self::Error> {
        self.insert(guide, outline.clone(), content.clone());
        Ok(())
    }
}
