//! Domain model for pages, outline notes and synthesized calendar events.
//!
//! # Responsibility
//! - Define canonical data structures used by the outline engine.
//! - Keep derived fields (`linked_page_titles`) next to their source.
//!
//! # Invariants
//! - Every note and page is identified by a stable UUID.
//! - Pages own their notes as one flat ordered list; parents are ids.

pub mod calendar;
pub mod note;
pub mod page;
