//! Calendar event handed to the calendar collaborator.
//!
//! # Invariants
//! - `end` is never earlier than `start`.
//! - `source_note_id` is the back-reference used to avoid duplicate events.

use crate::model::note::{NoteId, NoteKind};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Event synthesized from a calendar-kind note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    /// Local wall-clock start.
    pub start: NaiveDateTime,
    /// Local wall-clock end.
    pub end: NaiveDateTime,
    pub kind: NoteKind,
    pub description: String,
    /// Note this event was synthesized from.
    pub source_note_id: NoteId,
}
