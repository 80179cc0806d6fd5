//! Outline store for the active page.
//!
//! # Responsibility
//! - Own the flat ordered note list of one page.
//! - Apply mutations copy-on-write and hand out immutable `Arc<Page>`
//!   snapshots.
//! - Group multi-step edits into one all-or-nothing transaction.
//!
//! # Invariants
//! - A failed operation leaves the current snapshot untouched.
//! - The page never drops to zero notes through this API.
//! - Snapshots handed out are never mutated afterwards.

use crate::model::note::{Note, NoteId, NoteKind};
use crate::model::page::{Page, PageId};
use log::{debug, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::sync::Arc;

/// Result type used by outline store and editor operations.
pub type OutlineResult<T> = Result<T, OutlineError>;

/// Errors from outline operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
    /// Referenced note id does not exist on the active page.
    NotFound(NoteId),
    /// Refused to delete the only remaining note of a page.
    LastNoteViolation(PageId),
}

impl Display for OutlineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::LastNoteViolation(page_id) => {
                write!(f, "refusing to delete the last note of page {page_id}")
            }
        }
    }
}

impl Error for OutlineError {}

/// Single source of truth for the active page outline.
#[derive(Debug, Clone)]
pub struct OutlineStore {
    page: Arc<Page>,
}

impl OutlineStore {
    /// Wraps a loaded page. An empty page is seeded with one root note.
    pub fn new(mut page: Page) -> Self {
        if page.notes.is_empty() {
            debug!(
                "event=outline_seed module=outline status=ok page_id={}",
                page.id
            );
            page.notes.push(Note::new(page.id, ""));
        }
        Self {
            page: Arc::new(page),
        }
    }

    /// Returns the current immutable snapshot.
    pub fn snapshot(&self) -> Arc<Page> {
        Arc::clone(&self.page)
    }

    pub fn page_id(&self) -> PageId {
        self.page.id
    }

    pub fn get(&self, note_id: NoteId) -> Option<&Note> {
        self.page.note(note_id)
    }

    pub fn all(&self) -> &[Note] {
        &self.page.notes
    }

    pub fn len(&self) -> usize {
        self.page.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page.notes.is_empty()
    }

    pub fn index_of(&self, note_id: NoteId) -> Option<usize> {
        self.page.index_of(note_id)
    }

    /// Note immediately before `note_id` in flat order.
    pub fn previous(&self, note_id: NoteId) -> Option<&Note> {
        let index = self.index_of(note_id)?;
        index.checked_sub(1).map(|prev| &self.page.notes[prev])
    }

    /// Inserts `note` immediately after `anchor_id`.
    pub fn insert_after(&mut self, anchor_id: NoteId, note: Note) -> OutlineResult<Arc<Page>> {
        self.transaction("insert_after", |tx| tx.insert_after(anchor_id, note))
            .map(|(page, _)| page)
    }

    /// Inserts `note` as the last child of `parent_id`.
    pub fn insert_as_last_child(
        &mut self,
        parent_id: NoteId,
        note: Note,
    ) -> OutlineResult<Arc<Page>> {
        self.transaction("insert_as_last_child", |tx| {
            tx.insert_as_last_child(parent_id, note)
        })
        .map(|(page, _)| page)
    }

    /// Removes one note. Children keep their (now dangling) parent id.
    pub fn remove(&mut self, note_id: NoteId) -> OutlineResult<Arc<Page>> {
        self.transaction("remove", |tx| tx.remove(note_id).map(|_| ()))
            .map(|(page, _)| page)
    }

    /// Replaces note text and recomputes linked page titles.
    pub fn update_text(
        &mut self,
        note_id: NoteId,
        text: impl Into<String>,
    ) -> OutlineResult<Arc<Page>> {
        let text = text.into();
        self.transaction("update_text", |tx| tx.update_text(note_id, text))
            .map(|(page, _)| page)
    }

    /// Updates structural fields of one note without moving it.
    pub fn reparent(
        &mut self,
        note_id: NoteId,
        new_parent_id: Option<NoteId>,
        new_depth: u32,
    ) -> OutlineResult<Arc<Page>> {
        self.transaction("reparent", |tx| {
            tx.reparent(note_id, new_parent_id, new_depth)
        })
        .map(|(page, _)| page)
    }

    /// Changes note kind; `done` restarts unchecked.
    pub fn set_kind(&mut self, note_id: NoteId, kind: NoteKind) -> OutlineResult<Arc<Page>> {
        self.transaction("set_kind", |tx| tx.set_kind(note_id, kind))
            .map(|(page, _)| page)
    }

    /// Sets the checkbox state of a note.
    pub fn set_done(&mut self, note_id: NoteId, done: bool) -> OutlineResult<Arc<Page>> {
        self.transaction("set_done", |tx| tx.set_done(note_id, done))
            .map(|(page, _)| page)
    }

    /// Runs several edits against a working copy and publishes one snapshot.
    ///
    /// On error the working copy is discarded and the error is logged.
    pub fn transaction<T>(
        &mut self,
        op: &'static str,
        apply: impl FnOnce(&mut OutlineTx<'_>) -> OutlineResult<T>,
    ) -> OutlineResult<(Arc<Page>, T)> {
        let mut working = Page::clone(&self.page);
        let mut tx = OutlineTx { page: &mut working };
        match apply(&mut tx) {
            Ok(value) => {
                working.touch();
                self.page = Arc::new(working);
                debug!(
                    "event=outline_tx module=outline status=ok op={} page_id={} note_count={}",
                    op,
                    self.page.id,
                    self.page.notes.len()
                );
                Ok((self.snapshot(), value))
            }
            Err(err) => {
                warn!(
                    "event=outline_tx module=outline status=error op={} page_id={} error={}",
                    op, self.page.id, err
                );
                Err(err)
            }
        }
    }
}

/// Mutable view over the working copy of one store transaction.
pub struct OutlineTx<'a> {
    page: &'a mut Page,
}

impl OutlineTx<'_> {
    pub fn notes(&self) -> &[Note] {
        &self.page.notes
    }

    pub fn get(&self, note_id: NoteId) -> OutlineResult<&Note> {
        self.page.note(note_id).ok_or(OutlineError::NotFound(note_id))
    }

    pub fn index_of(&self, note_id: NoteId) -> OutlineResult<usize> {
        self.page
            .index_of(note_id)
            .ok_or(OutlineError::NotFound(note_id))
    }

    fn get_mut(&mut self, note_id: NoteId) -> OutlineResult<&mut Note> {
        self.page
            .notes
            .iter_mut()
            .find(|note| note.id == note_id)
            .ok_or(OutlineError::NotFound(note_id))
    }

    pub fn insert_after(&mut self, anchor_id: NoteId, mut note: Note) -> OutlineResult<()> {
        let index = self.index_of(anchor_id)?;
        note.page_id = self.page.id;
        self.page.notes.insert(index + 1, note);
        Ok(())
    }

    /// Places `note` right after the parent's last descendant.
    pub fn insert_as_last_child(&mut self, parent_id: NoteId, mut note: Note) -> OutlineResult<()> {
        let index = self.index_of(parent_id)?;
        let end = self.descendant_range(index).end;
        note.page_id = self.page.id;
        note.parent_id = Some(parent_id);
        note.depth = self.page.notes[index].depth + 1;
        self.page.notes.insert(end, note);
        Ok(())
    }

    /// Removes one note and returns it.
    pub fn remove(&mut self, note_id: NoteId) -> OutlineResult<Note> {
        let index = self.index_of(note_id)?;
        if self.page.notes.len() <= 1 {
            return Err(OutlineError::LastNoteViolation(self.page.id));
        }
        Ok(self.page.notes.remove(index))
    }

    pub fn update_text(&mut self, note_id: NoteId, text: impl Into<String>) -> OutlineResult<()> {
        self.get_mut(note_id)?.set_text(text);
        Ok(())
    }

    pub fn reparent(
        &mut self,
        note_id: NoteId,
        new_parent_id: Option<NoteId>,
        new_depth: u32,
    ) -> OutlineResult<()> {
        if let Some(parent_id) = new_parent_id {
            self.get(parent_id)?;
        }
        let note = self.get_mut(note_id)?;
        note.parent_id = new_parent_id;
        note.depth = new_depth;
        Ok(())
    }

    pub fn set_kind(&mut self, note_id: NoteId, kind: NoteKind) -> OutlineResult<()> {
        self.get_mut(note_id)?.set_kind(kind);
        Ok(())
    }

    pub fn set_done(&mut self, note_id: NoteId, done: bool) -> OutlineResult<()> {
        self.get_mut(note_id)?.done = done;
        Ok(())
    }

    /// Contiguous run of descendants following `index`.
    ///
    /// Forward scan that stops at the first note that is not deeper than the
    /// anchor or whose parent lies outside the run. The parent check keeps a
    /// split sibling from claiming the children of the note it was split from.
    pub fn descendant_range(&self, index: usize) -> Range<usize> {
        let start = index + 1;
        let Some(anchor) = self.page.notes.get(index) else {
            return start..start;
        };
        let mut members: HashSet<NoteId> = HashSet::from([anchor.id]);
        let mut end = start;
        while let Some(note) = self.page.notes.get(end) {
            let inside = note.depth > anchor.depth
                && note.parent_id.is_some_and(|parent| members.contains(&parent));
            if !inside {
                break;
            }
            members.insert(note.id);
            end += 1;
        }
        start..end
    }

    /// Shifts cached depth of every note in `range` by `delta`, floored at 0.
    pub fn shift_depths(&mut self, range: Range<usize>, delta: i64) {
        let end = range.end.min(self.page.notes.len());
        for note in &mut self.page.notes[range.start.min(end)..end] {
            note.depth = (i64::from(note.depth) + delta).max(0) as u32;
        }
    }
}
