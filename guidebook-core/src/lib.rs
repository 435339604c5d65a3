//! Outline editing engine for guidebook.
//!
//! # Core Concepts
//!
//! - [`Outline`]: a guide's title, description and ordered [`Chapter`]s. Each
//!   chapter holds an ordered list of [`Section`]s.
//! - [`ContentMap`]: the editable title/body of each section, keyed by
//!   [`SectionId`] and kept apart from the outline so that moving a section
//!   never touches its text.
//! - [`SessionState`]: at most one section is open for editing. Drafts only
//!   reach the content map on commit.
//! - [`OutlineEditor`]: the editing context. Every operation either succeeds
//!   and yields a new [`Snapshot`], or fails and changes nothing.
//!
//! Loading and publishing go through the [`OutlineSource`] and
//! [`OutlineSink`] traits; the core itself does no I/O.

pub mod content;
pub mod deletion;
pub mod editor;
pub mod error;
pub mod invariants;
pub mod outline;
pub mod persistence;
pub mod reorder;
pub mod session;

pub use content::*;
pub use deletion::{DeletedChapter, DeletedSection};
pub use editor::*;
pub use error::{ItemRef, OutlineError};
pub use invariants::InvariantViolation;
pub use outline::*;
pub use persistence::*;
pub use reorder::{Direction, MoveOutcome};
pub use session::*;
