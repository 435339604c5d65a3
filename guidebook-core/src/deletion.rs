//! Cascading deletes.
//!
//! Both operations check existence before touching anything, then remove the
//! structural entry, its content entries and any edit session pointing at it
//! from the same working copy. The editor installs that copy only on success.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::editor::Working;
use crate::error::{OutlineError, Result};
use crate::outline::{ChapterId, SectionId};
use crate::session::DiscardedDraft;

/// What a chapter deletion removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedChapter {
    pub chapter_id: ChapterId,
    pub section_ids: Vec<SectionId>,
    pub content_removed: usize,
    pub discarded_draft: Option<DiscardedDraft>,
}

/// What a section deletion removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedSection {
    pub section_id: SectionId,
    pub chapter_id: ChapterId,
    pub content_removed: bool,
    pub discarded_draft: Option<DiscardedDraft>,
}

pub(crate) fn delete_chapter(working: &mut Working, id: &ChapterId) -> Result<DeletedChapter> {
    if working.outline.chapter(id).is_none() {
        return Err(OutlineError::chapter_not_found(id));
    }

    let chapter = Arc::make_mut(&mut working.outline).remove_chapter(id)?;
    let section_ids: Vec<SectionId> = chapter.section_ids().cloned().collect();

    let mut content_removed = 0;
    if section_ids.iter().any(|s| working.content.contains(s)) {
        let content = Arc::make_mut(&mut working.content);
        content_removed = section_ids
            .iter()
            .filter(|s| content.remove(s).is_some())
            .count();
    }

    let discarded_draft = working.session.close_if(|s| section_ids.contains(s));
    if working.active_chapter.as_ref() == Some(id) {
        working.active_chapter = None;
    }

    Ok(DeletedChapter {
        chapter_id: chapter.id,
        section_ids,
        content_removed,
        discarded_draft,
    })
}

pub(crate) fn delete_section(working: &mut Working, id: &SectionId) -> Result<DeletedSection> {
    let chapter_id = working
        .outline
        .find_section(id)
        .map(|(chapter, _)| chapter.id.clone())
        .ok_or_else(|| OutlineError::section_not_found(id))?;

    Arc::make_mut(&mut working.outline).remove_section(id)?;

    let content_removed =
        working.content.contains(id) && Arc::make_mut(&mut working.content).remove(id).is_some();
    let discarded_draft = working.session.close_if(|s| s == id);

    Ok(DeletedSection {
        section_id: id.clone(),
        chapter_id,
        content_removed,
        discarded_draft,
    })
}
