//! Storage and request models for guidebook.
//!
//! The outline itself ([`Outline`](guidebook_core::Outline), chapters,
//! sections, content) lives in `guidebook-core`. This module only adds what
//! the server needs around it:
//!
//! - [`Guide`]: the stored record an outline belongs to.
//! - Request bodies for the editor endpoints.

mod guide;
mod requests;

pub use guide::*;
pub use requests::*;
