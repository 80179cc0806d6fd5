//! Outline engine: flat note storage, tree projection and structural edits.
//!
//! # Responsibility
//! - Keep one page outline consistent as a tree while storing it flat.
//! - Expose copy-on-write snapshots for readers.
//!
//! # Invariants
//! - Parents are referenced by id; no nested owning pointers.
//! - The projector only reads; only the store mutates.

pub mod editor;
pub mod projector;
pub mod store;

pub use editor::{clamp_caret, delete_merge, indent, outdent, split, EditOutcome, OrphanPolicy};
pub use projector::{normalize, to_flat, to_forest, OutlineNode};
pub use store::{OutlineError, OutlineResult, OutlineStore, OutlineTx};
