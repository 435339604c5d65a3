use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OutlineError, Result};
use crate::invariants::{self, InvariantViolation};

pub const PLACEHOLDER_CHAPTER_TITLE: &str = "New Chapter";
pub const PLACEHOLDER_CHAPTER_DESCRIPTION: &str = "Describe what this chapter covers";
pub const PLACEHOLDER_SECTION_TITLE: &str = "New Section";

const CHAPTER_PREFIX: &str = "chapter";

/// Identifier of a chapter, e.g. `chapter3`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(String);

impl ChapterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `n` in `chapter{n}`, if the id follows the generated scheme.
    fn number(&self) -> Option<u64> {
        self.0.strip_prefix(CHAPTER_PREFIX)?.parse().ok()
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChapterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ChapterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a section, unique across the whole outline, e.g. `c3s2`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The leaf unit of a guide.
///
/// A section carries only structural metadata. Its editable body lives in the
/// [`ContentMap`](crate::content::ContentMap) under the same identifier, so
/// reordering never touches content and content edits never touch position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    /// Display title shown in the outline. Updated when an edit is committed.
    pub title: String,
    pub completed: bool,
    /// Reading time estimate, e.g. "5 min". Never parsed.
    #[serde(default)]
    pub duration: String,
}

impl Section {
    pub fn new(id: impl Into<SectionId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
            duration: String::new(),
        }
    }
}

/// An ordered group of sections. Position in `sections` is the display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub description: String,
    /// Set explicitly; not derived from the sections.
    pub completed: bool,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Chapter {
    pub fn new(
        id: impl Into<ChapterId>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            completed: false,
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &SectionId> {
        self.sections.iter().map(|s| &s.id)
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.sections.iter().filter(|s| s.completed).count(),
            total: self.sections.len(),
        }
    }
}

/// Completed/total counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }
}

/// Progress of a whole outline, by chapter and by section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineProgress {
    pub chapters: Progress,
    pub sections: Progress,
}

/// Hands out identifiers that have never been used in this editing session.
///
/// Every id seen (loaded or generated) is remembered, including ids of
/// deleted entities, so nothing is ever reassigned.
#[derive(Debug, Clone, Default)]
struct IdAllocator {
    next_chapter: u64,
    issued: BTreeSet<String>,
}

impl IdAllocator {
    fn from_chapters(chapters: &[Chapter]) -> Self {
        let mut allocator = Self::default();
        for chapter in chapters {
            if let Some(n) = chapter.id.number() {
                allocator.next_chapter = allocator.next_chapter.max(n);
            }
            allocator.issued.insert(chapter.id.to_string());
            for section in &chapter.sections {
                allocator.issued.insert(section.id.to_string());
            }
        }
        allocator
    }

    fn chapter(&mut self) -> ChapterId {
        loop {
            // Past u64::MAX, start over from 1 and let `issued` skip taken ids.
            self.next_chapter = self.next_chapter.checked_add(1).unwrap_or(1);
            let candidate = format!("{CHAPTER_PREFIX}{}", self.next_chapter);
            if self.issued.insert(candidate.clone()) {
                return ChapterId(candidate);
            }
        }
    }

    /// `c{n}s{k}` for `chapter{n}`, `{chapter_id}s{k}` otherwise. `k` starts
    /// past the current section count and skips anything already issued.
    fn section(&mut self, parent: &ChapterId, existing: usize) -> SectionId {
        let prefix = match parent.number() {
            Some(n) => format!("c{n}s"),
            None => format!("{parent}s"),
        };
        let mut k = existing + 1;
        loop {
            let candidate = format!("{prefix}{k}");
            if self.issued.insert(candidate.clone()) {
                return SectionId(candidate);
            }
            k += 1;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OutlineData {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    chapters: Vec<Chapter>,
}

/// The guide being edited: title, description and ordered chapters.
///
/// Structural mutation is crate-private; callers go through
/// [`OutlineEditor`](crate::editor::OutlineEditor), which keeps the outline
/// and the content map consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "OutlineData", into = "OutlineData")]
pub struct Outline {
    pub title: String,
    pub description: String,
    chapters: Vec<Chapter>,
    allocator: IdAllocator,
}

/// Outlines compare by content. Two outlines with the same chapters are equal
/// even if one of them has handed out ids that were later deleted.
impl PartialEq for Outline {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.description == other.description
            && self.chapters == other.chapters
    }
}

impl Eq for Outline {}

impl TryFrom<OutlineData> for Outline {
    type Error = InvariantViolation;

    fn try_from(data: OutlineData) -> std::result::Result<Self, Self::Error> {
        Self::from_parts(data.title, data.description, data.chapters)
    }
}

impl From<Outline> for OutlineData {
    fn from(outline: Outline) -> Self {
        Self {
            title: outline.title,
            description: outline.description,
            chapters: outline.chapters,
        }
    }
}

impl Outline {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            chapters: Vec::new(),
            allocator: IdAllocator::default(),
        }
    }

    /// Build an outline from loaded chapters, rejecting duplicate ids.
    pub fn from_parts(
        title: impl Into<String>,
        description: impl Into<String>,
        chapters: Vec<Chapter>,
    ) -> std::result::Result<Self, InvariantViolation> {
        invariants::check_structure(&chapters)?;
        let allocator = IdAllocator::from_chapters(&chapters);
        Ok(Self {
            title: title.into(),
            description: description.into(),
            chapters,
            allocator,
        })
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, id: &ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| &c.id == id)
    }

    pub fn chapter_ids(&self) -> impl Iterator<Item = &ChapterId> {
        self.chapters.iter().map(|c| &c.id)
    }

    /// Locate a section and its parent chapter.
    pub fn find_section(&self, id: &SectionId) -> Option<(&Chapter, &Section)> {
        self.chapters
            .iter()
            .find_map(|c| c.section(id).map(|s| (c, s)))
    }

    pub fn contains_section(&self, id: &SectionId) -> bool {
        self.find_section(id).is_some()
    }

    /// All section ids in display order.
    pub fn section_ids(&self) -> impl Iterator<Item = &SectionId> {
        self.chapters.iter().flat_map(|c| c.section_ids())
    }

    pub fn section_count(&self) -> usize {
        self.chapters.iter().map(|c| c.sections.len()).sum()
    }

    pub fn progress(&self) -> OutlineProgress {
        let sections = self
            .chapters
            .iter()
            .map(Chapter::progress)
            .fold(Progress::default(), |acc, p| Progress {
                completed: acc.completed + p.completed,
                total: acc.total + p.total,
            });
        OutlineProgress {
            chapters: Progress {
                completed: self.chapters.iter().filter(|c| c.completed).count(),
                total: self.chapters.len(),
            },
            sections,
        }
    }

    // ============================================================
    // Structural mutation
    // ============================================================

    pub(crate) fn push_chapter(&mut self) -> ChapterId {
        let id = self.allocator.chapter();
        self.chapters.push(Chapter::new(
            id.clone(),
            PLACEHOLDER_CHAPTER_TITLE,
            PLACEHOLDER_CHAPTER_DESCRIPTION,
        ));
        id
    }

    pub(crate) fn push_section(&mut self, chapter_id: &ChapterId) -> Result<SectionId> {
        let index = self.chapter_index(chapter_id)?;
        let existing = self.chapters[index].sections.len();
        let id = self.allocator.section(chapter_id, existing);
        self.chapters[index]
            .sections
            .push(Section::new(id.clone(), PLACEHOLDER_SECTION_TITLE));
        Ok(id)
    }

    pub(crate) fn chapter_mut(&mut self, id: &ChapterId) -> Result<&mut Chapter> {
        self.chapters
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| OutlineError::chapter_not_found(id))
    }

    pub(crate) fn section_mut(&mut self, id: &SectionId) -> Result<&mut Section> {
        self.chapters
            .iter_mut()
            .flat_map(|c| c.sections.iter_mut())
            .find(|s| &s.id == id)
            .ok_or_else(|| OutlineError::section_not_found(id))
    }

    pub(crate) fn chapters_mut(&mut self) -> &mut Vec<Chapter> {
        &mut self.chapters
    }

    pub(crate) fn remove_chapter(&mut self, id: &ChapterId) -> Result<Chapter> {
        let index = self.chapter_index(id)?;
        Ok(self.chapters.remove(index))
    }

    pub(crate) fn remove_section(&mut self, id: &SectionId) -> Result<Section> {
        for chapter in &mut self.chapters {
            if let Some(index) = chapter.sections.iter().position(|s| &s.id == id) {
                return Ok(chapter.sections.remove(index));
            }
        }
        Err(OutlineError::section_not_found(id))
    }

    fn chapter_index(&self, id: &ChapterId) -> Result<usize> {
        self.chapters
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| OutlineError::chapter_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_id_at_numeric_limit_does_not_overflow() {
        let chapters = vec![
            Chapter::new("chapter1", "First", ""),
            Chapter::new(format!("{CHAPTER_PREFIX}{}", u64::MAX), "Last", ""),
        ];
        let mut outline = Outline::from_parts("Guide", "", chapters).unwrap();

        let added = outline.push_chapter();
        assert_eq!(added.as_str(), "chapter2");
        assert_eq!(outline.chapters().len(), 3);
    }

    #[test]
    fn test_chapter_ids_are_sequential() {
        let mut outline = Outline::new("Guide", "");
        assert_eq!(outline.push_chapter().as_str(), "chapter1");
        assert_eq!(outline.push_chapter().as_str(), "chapter2");
    }

    #[test]
    fn test_section_ids_derive_from_parent() {
        let mut outline = Outline::new("Guide", "");
        let chapter = outline.push_chapter();
        let first = outline.push_section(&chapter).unwrap();
        let second = outline.push_section(&chapter).unwrap();
        assert_eq!(first.as_str(), "c1s1");
        assert_eq!(second.as_str(), "c1s2");
    }

    #[test]
    fn test_section_id_not_reused_after_removal() {
        let mut outline = Outline::new("Guide", "");
        let chapter = outline.push_chapter();
        let first = outline.push_section(&chapter).unwrap();
        let second = outline.push_section(&chapter).unwrap();
        outline.remove_section(&first).unwrap();

        // One section left, so the naive candidate is c1s2, which is taken.
        let third = outline.push_section(&chapter).unwrap();
        assert_ne!(third, first);
        assert_ne!(third, second);
        assert_eq!(third.as_str(), "c1s3");
    }

    #[test]
    fn test_chapter_id_not_reused_after_removal() {
        let mut outline = Outline::new("Guide", "");
        let first = outline.push_chapter();
        outline.remove_chapter(&first).unwrap();
        assert_eq!(outline.push_chapter().as_str(), "chapter2");
    }

    #[test]
    fn test_allocator_continues_after_loaded_ids() {
        let chapters = vec![
            Chapter::new("chapter7", "Loaded", "").with_section(Section::new("c7s1", "Intro")),
            Chapter::new("appendix", "Appendix", ""),
        ];
        let mut outline = Outline::from_parts("Guide", "", chapters).unwrap();

        assert_eq!(outline.push_chapter().as_str(), "chapter8");
        assert_eq!(
            outline.push_section(&ChapterId::from("chapter7")).unwrap().as_str(),
            "c7s2"
        );
        assert_eq!(
            outline.push_section(&ChapterId::from("appendix")).unwrap().as_str(),
            "appendixs1"
        );
    }

    #[test]
    fn test_from_parts_rejects_duplicate_sections() {
        let chapters = vec![
            Chapter::new("chapter1", "One", "").with_section(Section::new("x", "A")),
            Chapter::new("chapter2", "Two", "").with_section(Section::new("x", "B")),
        ];
        let err = Outline::from_parts("Guide", "", chapters).unwrap_err();
        assert_eq!(err, InvariantViolation::DuplicateSection(SectionId::from("x")));
    }

    #[test]
    fn test_push_section_to_missing_chapter() {
        let mut outline = Outline::new("Guide", "");
        let err = outline.push_section(&ChapterId::from("nope")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_progress_counts() {
        let mut done = Section::new("c1s1", "Done");
        done.completed = true;
        let mut chapter = Chapter::new("chapter1", "One", "")
            .with_section(done)
            .with_section(Section::new("c1s2", "Todo"));
        chapter.completed = true;
        let outline = Outline::from_parts("Guide", "", vec![
            chapter,
            Chapter::new("chapter2", "Two", ""),
        ])
        .unwrap();

        let progress = outline.progress();
        assert_eq!(progress.chapters, Progress { completed: 1, total: 2 });
        assert_eq!(progress.sections, Progress { completed: 1, total: 2 });
        assert_eq!(progress.sections.percent(), 50);
        assert_eq!(Progress::default().percent(), 0);
    }

    #[test]
    fn test_serde_round_trip_rebuilds_allocator() {
        let mut outline = Outline::new("Guide", "About");
        let chapter = outline.push_chapter();
        outline.push_section(&chapter).unwrap();

        let json = serde_json::to_string(&outline).unwrap();
        let mut restored: Outline = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.chapters(), outline.chapters());
        assert_eq!(restored.push_chapter().as_str(), "chapter2");
    }
}
