//! Outline note domain model.
//!
//! # Responsibility
//! - Define the single bullet record stored in a page's flat outline.
//! - Keep derived link titles in lockstep with note text.
//!
//! # Invariants
//! - `id` is stable for the note lifetime and never reused.
//! - `linked_page_titles` always equals the link titles present in `text`.
//! - `done` is only meaningful for checkable kinds.

use crate::model::page::PageId;
use crate::trigger::extract_linked_titles;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one outline note.
pub type NoteId = Uuid;

/// Bullet category of a note.
///
/// The kind decides whether a `done` flag applies and whether resolving a
/// command of this kind synthesizes a calendar event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    #[default]
    Plain,
    Todo,
    Travel,
    Meeting,
    Event,
    Birthday,
    Shopping,
    Followup,
    Email,
    Message,
    Call,
    Reminder,
}

impl NoteKind {
    /// Every kind, in catalog order.
    pub const ALL: [NoteKind; 12] = [
        NoteKind::Plain,
        NoteKind::Todo,
        NoteKind::Travel,
        NoteKind::Meeting,
        NoteKind::Event,
        NoteKind::Birthday,
        NoteKind::Shopping,
        NoteKind::Followup,
        NoteKind::Email,
        NoteKind::Message,
        NoteKind::Call,
        NoteKind::Reminder,
    ];

    /// Returns whether a `done` checkbox is meaningful for this kind.
    pub fn is_checkable(self) -> bool {
        matches!(
            self,
            NoteKind::Todo | NoteKind::Shopping | NoteKind::Followup | NoteKind::Reminder
        )
    }

    /// Returns whether resolving this kind tries to create a calendar event.
    pub fn produces_calendar_event(self) -> bool {
        matches!(
            self,
            NoteKind::Event | NoteKind::Meeting | NoteKind::Travel | NoteKind::Birthday
        )
    }

    /// Storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            NoteKind::Plain => "plain",
            NoteKind::Todo => "todo",
            NoteKind::Travel => "travel",
            NoteKind::Meeting => "meeting",
            NoteKind::Event => "event",
            NoteKind::Birthday => "birthday",
            NoteKind::Shopping => "shopping",
            NoteKind::Followup => "followup",
            NoteKind::Email => "email",
            NoteKind::Message => "message",
            NoteKind::Call => "call",
            NoteKind::Reminder => "reminder",
        }
    }

    /// Parses a storage/wire name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for NoteKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    pub kind: NoteKind,
    /// Meaningful only when `kind.is_checkable()`.
    pub done: bool,
    /// `None` means root-level.
    pub parent_id: Option<NoteId>,
    /// Cached indent level, `parent.depth + 1` or `0` at root.
    pub depth: u32,
    pub page_id: PageId,
    /// Derived from `text`; use [`Note::set_text`] to keep it current.
    pub linked_page_titles: BTreeSet<String>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

impl Note {
    /// Creates a root-level plain note with a generated id.
    pub fn new(page_id: PageId, text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), page_id, text)
    }

    /// Creates a root-level plain note with a caller-provided id.
    ///
    /// Used by load paths where identity already exists in storage.
    pub fn with_id(id: NoteId, page_id: PageId, text: impl Into<String>) -> Self {
        let text = text.into();
        let linked_page_titles = extract_linked_titles(&text);
        Self {
            id,
            text,
            kind: NoteKind::Plain,
            done: false,
            parent_id: None,
            depth: 0,
            page_id,
            linked_page_titles,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Creates an empty note placed as a sibling of `self`.
    pub fn sibling(&self, text: impl Into<String>) -> Self {
        let mut note = Note::new(self.page_id, text);
        note.parent_id = self.parent_id;
        note.depth = self.depth;
        note
    }

    /// Replaces the text and recomputes linked page titles.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.linked_page_titles = extract_linked_titles(&self.text);
    }

    /// Changes the kind. The `done` flag restarts unchecked, and stays
    /// cleared for kinds where it carries no meaning.
    pub fn set_kind(&mut self, kind: NoteKind) {
        self.kind = kind;
        self.done = false;
    }

    /// Returns whether the note sits at root level.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteKind};
    use uuid::Uuid;

    #[test]
    fn kind_names_round_trip() {
        for kind in NoteKind::ALL {
            assert_eq!(NoteKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NoteKind::parse("unknown"), None);
    }

    #[test]
    fn set_kind_resets_done_flag() {
        let mut note = Note::new(Uuid::new_v4(), "buy milk");
        note.set_kind(NoteKind::Todo);
        note.done = true;
        note.set_kind(NoteKind::Shopping);
        assert!(!note.done);
        note.done = true;
        note.set_kind(NoteKind::Plain);
        assert!(!note.done);
    }

    #[test]
    fn set_text_recomputes_links() {
        let mut note = Note::new(Uuid::new_v4(), "see [[Alpha]]");
        assert!(note.linked_page_titles.contains("Alpha"));
        note.set_text("nothing linked");
        assert!(note.linked_page_titles.is_empty());
    }
}
