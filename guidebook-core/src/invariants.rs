use std::collections::HashSet;

use thiserror::Error;

use crate::content::ContentMap;
use crate::outline::{Chapter, ChapterId, Outline, SectionId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("chapter '{0}' appears more than once")]
    DuplicateChapter(ChapterId),

    #[error("section '{0}' appears more than once")]
    DuplicateSection(SectionId),

    #[error("content entry '{0}' has no section")]
    OrphanContent(SectionId),

    #[error("content entry keyed '{key}' belongs to section '{found}'")]
    MismatchedContent { key: SectionId, found: SectionId },
}

/// Chapter ids unique; every section id appears exactly once across chapters.
pub fn check_structure(chapters: &[Chapter]) -> Result<(), InvariantViolation> {
    let mut chapter_ids = HashSet::new();
    let mut section_ids = HashSet::new();
    for chapter in chapters {
        if !chapter_ids.insert(&chapter.id) {
            return Err(InvariantViolation::DuplicateChapter(chapter.id.clone()));
        }
        for id in chapter.section_ids() {
            if !section_ids.insert(id) {
                return Err(InvariantViolation::DuplicateSection(id.clone()));
            }
        }
    }
    Ok(())
}

/// Structure checks plus: every content entry belongs to a live section and
/// is filed under its own id.
pub fn check(outline: &Outline, content: &ContentMap) -> Result<(), InvariantViolation> {
    check_structure(outline.chapters())?;

    let live: HashSet<&SectionId> = outline.section_ids().collect();
    for (key, entry) in content.section_ids().zip(content.iter()) {
        if key != &entry.section_id {
            return Err(InvariantViolation::MismatchedContent {
                key: key.clone(),
                found: entry.section_id.clone(),
            });
        }
        if !live.contains(key) {
            return Err(InvariantViolation::OrphanContent(key.clone()));
        }
    }
    Ok(())
}
