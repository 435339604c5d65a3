//! The editing context a presentation layer talks to.
//!
//! [`OutlineEditor`] owns the current [`Snapshot`]. Every operation works on a
//! copy of it and installs the copy only when the operation succeeds, so a
//! failed call leaves everything exactly as it was. Outline and content are
//! shared behind `Arc`s and copied on write: a snapshot whose outline `Arc` is
//! pointer-equal to an earlier one has an unchanged outline.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::content::{ContentEntry, ContentMap};
use crate::deletion::{self, DeletedChapter, DeletedSection};
use crate::error::{OutlineError, Result};
use crate::invariants::{self, InvariantViolation};
use crate::outline::{
    Chapter, ChapterId, Outline, OutlineProgress, Section, SectionId, PLACEHOLDER_SECTION_TITLE,
};
use crate::persistence::{OutlineSink, OutlineSource};
use crate::reorder::{self, Direction, MoveOutcome};
use crate::session::{DiscardedDraft, Draft, SessionState};

/// An immutable view of the editor after some operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Bumped by every operation that changed something; no-op calls keep it.
    pub revision: u64,
    pub outline: Arc<Outline>,
    pub content: Arc<ContentMap>,
    pub session: SessionState,
    /// The expanded chapter in the outline view.
    pub active_chapter: Option<ChapterId>,
}

impl Snapshot {
    pub fn progress(&self) -> OutlineProgress {
        self.outline.progress()
    }

    pub fn outline_changed_since(&self, earlier: &Snapshot) -> bool {
        !Arc::ptr_eq(&self.outline, &earlier.outline)
    }

    pub fn content_changed_since(&self, earlier: &Snapshot) -> bool {
        !Arc::ptr_eq(&self.content, &earlier.content)
    }
}

/// The value an operation produced, with the snapshot it produced it in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied<T> {
    pub value: T,
    pub snapshot: Snapshot,
}

/// Mutable working copy of a snapshot.
pub(crate) struct Working {
    pub(crate) outline: Arc<Outline>,
    pub(crate) content: Arc<ContentMap>,
    pub(crate) session: SessionState,
    pub(crate) active_chapter: Option<ChapterId>,
}

#[derive(Debug, Clone)]
pub struct OutlineEditor {
    current: Snapshot,
}

impl OutlineEditor {
    /// Start editing a loaded outline. Content entries must all belong to
    /// sections of `outline`.
    pub fn new(outline: Outline, content: ContentMap) -> std::result::Result<Self, InvariantViolation> {
        invariants::check(&outline, &content)?;
        Ok(Self {
            current: Snapshot {
                revision: 0,
                outline: Arc::new(outline),
                content: Arc::new(content),
                session: SessionState::Idle,
                active_chapter: None,
            },
        })
    }

    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            current: Snapshot {
                revision: 0,
                outline: Arc::new(Outline::new(title, "")),
                content: Arc::new(ContentMap::new()),
                session: SessionState::Idle,
                active_chapter: None,
            },
        }
    }

    /// Load a guide from `source` and start editing it.
    pub fn open<S>(source: &S, guide: Uuid) -> std::result::Result<Self, S::Error>
    where
        S: OutlineSource,
        S::Error: From<InvariantViolation>,
    {
        let outline = source.load_outline(guide)?;
        let content = source.load_all_content(guide, &outline)?;
        tracing::debug!(
            %guide,
            chapters = outline.chapters().len(),
            sections = outline.section_count(),
            "opened outline"
        );
        Ok(Self::new(outline, content)?)
    }

    /// Hand the committed outline and content to `sink`. Open drafts are not
    /// included.
    pub fn publish<S: OutlineSink>(&self, sink: &S, guide: Uuid) -> std::result::Result<(), S::Error> {
        sink.publish(guide, &self.current.outline, &self.current.content)?;
        tracing::info!(%guide, revision = self.current.revision, "published outline");
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.current.clone()
    }

    pub fn outline(&self) -> &Outline {
        &self.current.outline
    }

    pub fn content(&self) -> &ContentMap {
        &self.current.content
    }

    pub fn session(&self) -> &SessionState {
        &self.current.session
    }

    pub fn active_chapter(&self) -> Option<&ChapterId> {
        self.current.active_chapter.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.current.revision
    }

    /// Content of an existing section.
    pub fn get_content(&self, section_id: &SectionId) -> Result<&ContentEntry> {
        if !self.current.outline.contains_section(section_id) {
            return Err(OutlineError::section_not_found(section_id));
        }
        self.current.content.get(section_id)
    }

    // ============================================================
    // Outline structure
    // ============================================================

    /// Append a placeholder chapter and make it the active chapter.
    pub fn add_chapter(&mut self) -> Applied<ChapterId> {
        let mut working = self.working();
        let id = Arc::make_mut(&mut working.outline).push_chapter();
        working.active_chapter = Some(id.clone());
        tracing::debug!(chapter = %id, "added chapter");
        self.applied(working, id)
    }

    /// Append a placeholder section and its placeholder content entry.
    pub fn add_section(&mut self, chapter_id: &ChapterId) -> Result<Applied<SectionId>> {
        if self.current.outline.chapter(chapter_id).is_none() {
            return Err(OutlineError::chapter_not_found(chapter_id));
        }
        let mut working = self.working();
        let id = Arc::make_mut(&mut working.outline).push_section(chapter_id)?;
        Arc::make_mut(&mut working.content).set(
            id.clone(),
            PLACEHOLDER_SECTION_TITLE.to_string(),
            String::new(),
        );
        tracing::debug!(chapter = %chapter_id, section = %id, "added section");
        Ok(self.applied(working, id))
    }

    pub fn update_outline_meta(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Snapshot {
        let (title, description) = (title.into(), description.into());
        if self.current.outline.title == title && self.current.outline.description == description {
            return self.snapshot();
        }
        let mut working = self.working();
        let outline = Arc::make_mut(&mut working.outline);
        outline.title = title;
        outline.description = description;
        self.install(working)
    }

    /// Replace a chapter's title and description. Order and sections are
    /// untouched.
    pub fn update_chapter_meta(
        &mut self,
        chapter_id: &ChapterId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Snapshot> {
        self.with_chapter(chapter_id, |chapter| {
            chapter.title = title.into();
            chapter.description = description.into();
        })
    }

    pub fn set_chapter_completed(&mut self, chapter_id: &ChapterId, completed: bool) -> Result<Snapshot> {
        self.with_chapter(chapter_id, |chapter| chapter.completed = completed)
    }

    pub fn toggle_chapter_completed(&mut self, chapter_id: &ChapterId) -> Result<Snapshot> {
        self.with_chapter(chapter_id, |chapter| chapter.completed = !chapter.completed)
    }

    pub fn set_section_completed(&mut self, section_id: &SectionId, completed: bool) -> Result<Snapshot> {
        self.with_section(section_id, |section| section.completed = completed)
    }

    pub fn toggle_section_completed(&mut self, section_id: &SectionId) -> Result<Snapshot> {
        self.with_section(section_id, |section| section.completed = !section.completed)
    }

    pub fn set_section_duration(
        &mut self,
        section_id: &SectionId,
        duration: impl Into<String>,
    ) -> Result<Snapshot> {
        self.with_section(section_id, |section| section.duration = duration.into())
    }

    /// Expand `chapter_id`, or collapse everything with `None`.
    pub fn set_active_chapter(&mut self, chapter_id: Option<&ChapterId>) -> Result<Snapshot> {
        if let Some(id) = chapter_id {
            if self.current.outline.chapter(id).is_none() {
                return Err(OutlineError::chapter_not_found(id));
            }
        }
        if self.current.active_chapter.as_ref() == chapter_id {
            return Ok(self.snapshot());
        }
        let mut working = self.working();
        working.active_chapter = chapter_id.cloned();
        Ok(self.install(working))
    }

    // ============================================================
    // Reordering
    // ============================================================

    pub fn move_chapter(
        &mut self,
        chapter_id: &ChapterId,
        direction: Direction,
    ) -> Result<Applied<MoveOutcome>> {
        let outcome = reorder::plan_move(self.current.outline.chapters(), chapter_id, direction)
            .ok_or_else(|| OutlineError::chapter_not_found(chapter_id))?;
        if outcome == MoveOutcome::BoundaryNoop {
            return Ok(self.unchanged(outcome));
        }

        let mut working = self.working();
        reorder::move_item(
            Arc::make_mut(&mut working.outline).chapters_mut(),
            chapter_id,
            direction,
        );
        tracing::debug!(chapter = %chapter_id, direction = direction.as_str(), "moved chapter");
        Ok(self.applied(working, outcome))
    }

    /// Move a section within its chapter. The section must belong to
    /// `chapter_id`.
    pub fn move_section(
        &mut self,
        chapter_id: &ChapterId,
        section_id: &SectionId,
        direction: Direction,
    ) -> Result<Applied<MoveOutcome>> {
        let chapter = self
            .current
            .outline
            .chapter(chapter_id)
            .ok_or_else(|| OutlineError::chapter_not_found(chapter_id))?;
        let outcome = reorder::plan_move(&chapter.sections, section_id, direction)
            .ok_or_else(|| OutlineError::section_not_found(section_id))?;
        if outcome == MoveOutcome::BoundaryNoop {
            return Ok(self.unchanged(outcome));
        }

        let mut working = self.working();
        let chapter = Arc::make_mut(&mut working.outline).chapter_mut(chapter_id)?;
        reorder::move_item(&mut chapter.sections, section_id, direction);
        tracing::debug!(section = %section_id, direction = direction.as_str(), "moved section");
        Ok(self.applied(working, outcome))
    }

    // ============================================================
    // Deletion
    // ============================================================

    /// Remove a chapter, its sections' content, and any edit session on one
    /// of its sections.
    pub fn delete_chapter(&mut self, chapter_id: &ChapterId) -> Result<Applied<DeletedChapter>> {
        let mut working = self.working();
        let deleted = deletion::delete_chapter(&mut working, chapter_id)?;
        tracing::debug!(
            chapter = %chapter_id,
            sections = deleted.section_ids.len(),
            content_removed = deleted.content_removed,
            "deleted chapter"
        );
        warn_if_lost(deleted.discarded_draft.as_ref());
        Ok(self.applied(working, deleted))
    }

    pub fn delete_section(&mut self, section_id: &SectionId) -> Result<Applied<DeletedSection>> {
        let mut working = self.working();
        let deleted = deletion::delete_section(&mut working, section_id)?;
        tracing::debug!(section = %section_id, "deleted section");
        warn_if_lost(deleted.discarded_draft.as_ref());
        Ok(self.applied(working, deleted))
    }

    // ============================================================
    // Edit session
    // ============================================================

    /// Open `section_id` for editing with its current content as the draft.
    ///
    /// Any session already open is discarded without being committed and is
    /// returned so the caller can tell the user.
    pub fn begin_edit(&mut self, section_id: &SectionId) -> Result<Applied<Option<DiscardedDraft>>> {
        let (_, section) = self
            .current
            .outline
            .find_section(section_id)
            .ok_or_else(|| OutlineError::section_not_found(section_id))?;
        let draft = match self.current.content.get(section_id) {
            Ok(entry) => Draft::from(entry),
            Err(_) => Draft {
                title: section.title.clone(),
                body: String::new(),
            },
        };

        let mut working = self.working();
        let discarded = working.session.begin(section_id.clone(), draft);
        tracing::debug!(section = %section_id, "began edit");
        warn_if_lost(discarded.as_ref());
        Ok(self.applied(working, discarded))
    }

    /// Change the draft title and/or body. Marks the session dirty.
    pub fn update_draft(&mut self, title: Option<String>, body: Option<String>) -> Result<Snapshot> {
        let mut working = self.working();
        working.session.update(title, body)?;
        if working.session == self.current.session {
            return Ok(self.snapshot());
        }
        Ok(self.install(working))
    }

    /// Write the draft to the content map and the section's display title,
    /// then close the session. Does nothing when idle.
    pub fn commit_edit(&mut self) -> Snapshot {
        if self.current.session.is_idle() {
            return self.snapshot();
        }

        let mut working = self.working();
        let Some(closed) = working.session.close() else {
            return self.snapshot();
        };
        if let Ok(section) = Arc::make_mut(&mut working.outline).section_mut(&closed.section_id) {
            section.title = closed.draft.title.clone();
        }
        Arc::make_mut(&mut working.content).set(
            closed.section_id.clone(),
            closed.draft.title,
            closed.draft.body,
        );
        tracing::debug!(section = %closed.section_id, dirty = closed.dirty, "committed edit");
        self.install(working)
    }

    /// Close the session without touching content. Does nothing when idle.
    pub fn cancel_edit(&mut self) -> Snapshot {
        if self.current.session.is_idle() {
            return self.snapshot();
        }

        let mut working = self.working();
        if let Some(closed) = working.session.close() {
            tracing::debug!(section = %closed.section_id, dirty = closed.dirty, "cancelled edit");
        }
        self.install(working)
    }

    // ============================================================
    // Internals
    // ============================================================

    /// Apply `f` to a copy of the chapter and install it only if it differs.
    fn with_chapter(
        &mut self,
        chapter_id: &ChapterId,
        f: impl FnOnce(&mut Chapter),
    ) -> Result<Snapshot> {
        let Some(chapter) = self.current.outline.chapter(chapter_id) else {
            return Err(OutlineError::chapter_not_found(chapter_id));
        };
        let mut edited = chapter.clone();
        f(&mut edited);
        if edited == *chapter {
            return Ok(self.snapshot());
        }

        let mut working = self.working();
        *Arc::make_mut(&mut working.outline).chapter_mut(chapter_id)? = edited;
        Ok(self.install(working))
    }

    fn with_section(
        &mut self,
        section_id: &SectionId,
        f: impl FnOnce(&mut Section),
    ) -> Result<Snapshot> {
        let Some((_, section)) = self.current.outline.find_section(section_id) else {
            return Err(OutlineError::section_not_found(section_id));
        };
        let mut edited = section.clone();
        f(&mut edited);
        if edited == *section {
            return Ok(self.snapshot());
        }

        let mut working = self.working();
        *Arc::make_mut(&mut working.outline).section_mut(section_id)? = edited;
        Ok(self.install(working))
    }

    fn working(&self) -> Working {
        Working {
            outline: Arc::clone(&self.current.outline),
            content: Arc::clone(&self.current.content),
            session: self.current.session.clone(),
            active_chapter: self.current.active_chapter.clone(),
        }
    }

    fn install(&mut self, working: Working) -> Snapshot {
        debug_assert_eq!(
            invariants::check(&working.outline, &working.content),
            Ok(()),
            "outline invariants broken"
        );
        self.current = Snapshot {
            revision: self.current.revision + 1,
            outline: working.outline,
            content: working.content,
            session: working.session,
            active_chapter: working.active_chapter,
        };
        self.snapshot()
    }

    fn applied<T>(&mut self, working: Working, value: T) -> Applied<T> {
        Applied {
            value,
            snapshot: self.install(working),
        }
    }

    fn unchanged<T>(&self, value: T) -> Applied<T> {
        Applied {
            value,
            snapshot: self.snapshot(),
        }
    }
}

fn warn_if_lost(discarded: Option<&DiscardedDraft>) {
    if let Some(draft) = discarded.filter(|d| d.dirty) {
        tracing::warn!(section = %draft.section_id, "discarded unsaved draft");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{PLACEHOLDER_CHAPTER_DESCRIPTION, PLACEHOLDER_CHAPTER_TITLE};

    #[test]
    fn test_noop_updates_keep_revision_and_outline() {
        let mut editor = OutlineEditor::empty("Guide");
        let chapter = editor.add_chapter().value;
        let section = editor.add_section(&chapter).unwrap().value;
        editor.begin_edit(&section).unwrap();
        let before = editor.snapshot();

        let snapshots = [
            editor.update_draft(None, None).unwrap(),
            editor.update_outline_meta("Guide", ""),
            editor.set_chapter_completed(&chapter, false).unwrap(),
            editor.set_section_completed(&section, false).unwrap(),
            editor.set_section_duration(&section, "").unwrap(),
            editor
                .update_chapter_meta(&chapter, PLACEHOLDER_CHAPTER_TITLE, PLACEHOLDER_CHAPTER_DESCRIPTION)
                .unwrap(),
        ];

        for snapshot in &snapshots {
            assert_eq!(snapshot.revision, before.revision);
            assert!(!snapshot.outline_changed_since(&before));
        }
        assert_eq!(editor.snapshot(), before);
    }

    #[test]
    fn test_repeated_draft_text_keeps_revision() {
        let mut editor = OutlineEditor::empty("Guide");
        let chapter = editor.add_chapter().value;
        let section = editor.add_section(&chapter).unwrap().value;
        editor.begin_edit(&section).unwrap();
        let first = editor.update_draft(None, Some("typing".into())).unwrap();

        let again = editor.update_draft(None, Some("typing".into())).unwrap();

        assert_eq!(again.revision, first.revision);
    }

    #[test]
    fn test_failed_operation_keeps_revision() {
        let mut editor = OutlineEditor::empty("Guide");
        editor.add_chapter();
        let before = editor.snapshot();

        assert!(editor.add_section(&"missing".into()).is_err());
        assert!(editor.delete_section(&"missing".into()).is_err());
        assert!(editor.update_draft(Some("x".into()), None).is_err());

        assert_eq!(editor.snapshot(), before);
    }

    #[test]
    fn test_session_only_change_shares_outline() {
        let mut editor = OutlineEditor::empty("Guide");
        let chapter = editor.add_chapter().value;
        let section = editor.add_section(&chapter).unwrap().value;
        let before = editor.begin_edit(&section).unwrap().snapshot;

        let after = editor.update_draft(None, Some("typing".into())).unwrap();

        assert!(!after.outline_changed_since(&before));
        assert!(!after.content_changed_since(&before));
        assert_eq!(after.revision, before.revision + 1);
    }

    #[test]
    fn test_begin_edit_without_content_uses_section_title() {
        let outline = Outline::from_parts(
            "Guide",
            "",
            vec![Chapter::new("chapter1", "One", "").with_section(Section::new("c1s1", "Loaded title"))],
        )
        .unwrap();
        let mut editor = OutlineEditor::new(outline, ContentMap::new()).unwrap();

        let snapshot = editor.begin_edit(&"c1s1".into()).unwrap().snapshot;

        assert_eq!(snapshot.session.draft().unwrap().title, "Loaded title");
    }

    #[test]
    fn test_new_rejects_orphan_content() {
        let content = ContentMap::from_entries([ContentEntry::placeholder("c1s1".into())]);
        let err = OutlineEditor::new(Outline::new("Guide", ""), content).unwrap_err();
        assert_eq!(err, InvariantViolation::OrphanContent("c1s1".into()));
    }
}
