//! Page domain model.
//!
//! # Responsibility
//! - Define the named container owning one flat outline.
//! - Check structural outline invariants on demand.
//!
//! # Invariants
//! - Note order is document order and a valid pre-order of the implied tree.
//! - An initialized page holds at least one note.
//! - `title` is unique across pages.

use crate::model::note::{Note, NoteId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one page.
pub type PageId = Uuid;

/// Structural invariant violations reported by [`Page::validate_outline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineValidationError {
    /// Page has no notes.
    EmptyPage,
    /// Two notes share one id.
    DuplicateNote(NoteId),
    /// Parent id does not reference any note on the page.
    DanglingParent { note: NoteId, parent: NoteId },
    /// Parent exists but is not placed before the child.
    ParentAfterChild { note: NoteId, parent: NoteId },
    /// Cached depth disagrees with the parent chain.
    DepthMismatch {
        note: NoteId,
        expected: u32,
        actual: u32,
    },
}

impl Display for OutlineValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPage => write!(f, "page must contain at least one note"),
            Self::DuplicateNote(id) => write!(f, "duplicate note id: {id}"),
            Self::DanglingParent { note, parent } => {
                write!(f, "note {note} references missing parent {parent}")
            }
            Self::ParentAfterChild { note, parent } => {
                write!(f, "note {note} appears before its parent {parent}")
            }
            Self::DepthMismatch {
                note,
                expected,
                actual,
            } => write!(
                f,
                "note {note} has depth {actual}, expected {expected}"
            ),
        }
    }
}

impl Error for OutlineValidationError {}

/// Named container of an ordered flat outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    /// Flat outline in document (pre-order) order.
    pub notes: Vec<Note>,
    /// Epoch ms of the last structural or text change.
    pub last_modified_at: i64,
}

impl Page {
    /// Creates a page seeded with one empty root note.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Creates a seeded page with a caller-provided id.
    pub fn with_id(id: PageId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            notes: vec![Note::new(id, "")],
            last_modified_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Returns the position of a note in flat order.
    pub fn index_of(&self, note_id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == note_id)
    }

    /// Looks up one note.
    pub fn note(&self, note_id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    /// Bumps the modification timestamp.
    pub fn touch(&mut self) {
        self.last_modified_at = chrono::Utc::now().timestamp_millis();
    }

    /// Checks invariants: non-empty, unique ids, parents placed earlier with
    /// depth exactly one less, root notes at depth zero.
    ///
    /// Parents placed earlier also rule out cycles.
    pub fn validate_outline(&self) -> Result<(), OutlineValidationError> {
        if self.notes.is_empty() {
            return Err(OutlineValidationError::EmptyPage);
        }

        let all_ids: HashSet<NoteId> = self.notes.iter().map(|note| note.id).collect();
        let mut seen: HashMap<NoteId, u32> = HashMap::with_capacity(self.notes.len());
        for note in &self.notes {
            let expected = match note.parent_id {
                None => 0,
                Some(parent) => match seen.get(&parent) {
                    Some(parent_depth) => parent_depth + 1,
                    None if all_ids.contains(&parent) => {
                        return Err(OutlineValidationError::ParentAfterChild {
                            note: note.id,
                            parent,
                        });
                    }
                    None => {
                        return Err(OutlineValidationError::DanglingParent {
                            note: note.id,
                            parent,
                        });
                    }
                },
            };
            if note.depth != expected {
                return Err(OutlineValidationError::DepthMismatch {
                    note: note.id,
                    expected,
                    actual: note.depth,
                });
            }
            if seen.insert(note.id, note.depth).is_some() {
                return Err(OutlineValidationError::DuplicateNote(note.id));
            }
        }
        Ok(())
    }
}
