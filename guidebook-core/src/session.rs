//! The edit session state machine.
//!
//! ```text
//!   Idle ──begin──▶ Editing ──commit/cancel──▶ Idle
//!                    │  ▲
//!                    └──┘ update_draft (dirty = true)
//! ```
//!
//! Beginning an edit while another is open replaces the open session. The
//! replaced draft is never written to the content map; it is handed back as a
//! [`DiscardedDraft`] so the caller can warn about lost work.

use serde::{Deserialize, Serialize};

use crate::content::ContentEntry;
use crate::error::{OutlineError, Result};
use crate::outline::SectionId;

/// Working copy of a section's title and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    pub body: String,
}

impl From<&ContentEntry> for Draft {
    fn from(entry: &ContentEntry) -> Self {
        Self {
            title: entry.title.clone(),
            body: entry.body.clone(),
        }
    }
}

/// At most one section is being edited at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Editing {
        section_id: SectionId,
        draft: Draft,
        dirty: bool,
    },
}

/// A session that was closed without being committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedDraft {
    pub section_id: SectionId,
    pub draft: Draft,
    pub dirty: bool,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn editing_section(&self) -> Option<&SectionId> {
        match self {
            Self::Editing { section_id, .. } => Some(section_id),
            Self::Idle => None,
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            Self::Editing { draft, .. } => Some(draft),
            Self::Idle => None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Editing { dirty: true, .. })
    }

    /// Whether a commit control should be enabled. Commits themselves are
    /// accepted regardless.
    pub fn can_commit(&self) -> bool {
        self.is_dirty()
    }

    pub(crate) fn begin(&mut self, section_id: SectionId, draft: Draft) -> Option<DiscardedDraft> {
        let previous = self.close();
        *self = Self::Editing {
            section_id,
            draft,
            dirty: false,
        };
        previous
    }

    pub(crate) fn update(&mut self, title: Option<String>, body: Option<String>) -> Result<()> {
        let Self::Editing { draft, dirty, .. } = self else {
            return Err(OutlineError::InvalidState(
                "no section is being edited".to_string(),
            ));
        };

        if title.is_none() && body.is_none() {
            return Ok(());
        }
        if let Some(title) = title {
            draft.title = title;
        }
        if let Some(body) = body {
            draft.body = body;
        }
        *dirty = true;
        Ok(())
    }

    /// Leave the session, returning what was open. Idle stays Idle.
    pub(crate) fn close(&mut self) -> Option<DiscardedDraft> {
        match std::mem::take(self) {
            Self::Editing {
                section_id,
                draft,
                dirty,
            } => Some(DiscardedDraft {
                section_id,
                draft,
                dirty,
            }),
            Self::Idle => None,
        }
    }

    /// Close the session only if it is editing a section matching `doomed`.
    pub(crate) fn close_if(&mut self, doomed: impl Fn(&SectionId) -> bool) -> Option<DiscardedDraft> {
        match self.editing_section() {
            Some(id) if doomed(id) => self.close(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> Draft {
        Draft {
            title: title.to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn test_begin_from_idle() {
        let mut state = SessionState::Idle;
        assert!(state.begin("c1s1".into(), draft("A")).is_none());
        assert_eq!(state.editing_section(), Some(&SectionId::from("c1s1")));
        assert!(!state.is_dirty());
        assert!(!state.can_commit());
    }

    #[test]
    fn test_begin_replaces_open_session() {
        let mut state = SessionState::Idle;
        state.begin("c1s1".into(), draft("A"));
        state.update(Some("A edited".into()), None).unwrap();

        let discarded = state.begin("c1s2".into(), draft("B")).unwrap();

        assert_eq!(discarded.section_id, SectionId::from("c1s1"));
        assert_eq!(discarded.draft.title, "A edited");
        assert!(discarded.dirty);
        assert_eq!(state.editing_section(), Some(&SectionId::from("c1s2")));
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_update_sets_dirty() {
        let mut state = SessionState::Idle;
        state.begin("c1s1".into(), draft("A"));
        state.update(None, Some("body".into())).unwrap();

        assert!(state.can_commit());
        assert_eq!(state.draft().unwrap().body, "body");
        assert_eq!(state.draft().unwrap().title, "A");
    }

    #[test]
    fn test_empty_update_keeps_clean() {
        let mut state = SessionState::Idle;
        state.begin("c1s1".into(), draft("A"));
        state.update(None, None).unwrap();
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_update_while_idle_is_invalid() {
        let mut state = SessionState::Idle;
        let err = state.update(Some("x".into()), None).unwrap_err();
        assert!(matches!(err, OutlineError::InvalidState(_)));
    }

    #[test]
    fn test_close_while_idle_is_noop() {
        let mut state = SessionState::Idle;
        assert!(state.close().is_none());
        assert!(state.is_idle());
    }

    #[test]
    fn test_close_if_only_matching() {
        let mut state = SessionState::Idle;
        state.begin("c1s1".into(), draft("A"));

        assert!(state.close_if(|id| id.as_str() == "c2s1").is_none());
        assert!(!state.is_idle());

        assert!(state.close_if(|id| id.as_str() == "c1s1").is_some());
        assert!(state.is_idle());
    }

    #[test]
    fn test_serializes_with_state_tag() {
        let json = serde_json::to_value(SessionState::Idle).unwrap();
        assert_eq!(json["state"], "idle");
    }
}
