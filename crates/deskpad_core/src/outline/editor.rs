//! Structural editing keys: split, indent, outdent and delete-merge.
//!
//! # Responsibility
//! - Translate one structural key press into one outline store transaction.
//! - Report which note receives focus next and where the caret lands.
//!
//! # Invariants
//! - Unreachable structural requests (indent first note, outdent a root,
//!   delete the only note) are no-ops, never errors.
//! - Descendants move with their ancestor and keep sibling order.
//! - Caret offsets are byte offsets on char boundaries.

use crate::model::note::NoteId;
use crate::model::page::Page;
use crate::outline::store::{OutlineError, OutlineResult, OutlineStore};
use crate::trigger::TriggerSession;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What happens to the children of a deleted note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Children keep pointing at the removed id; the tree projector shows
    /// them at root level.
    #[default]
    Dangling,
    /// Children move up to the deleted note's own parent.
    Reparent,
}

/// Result of one structural edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// Snapshot after the edit (unchanged snapshot for no-ops).
    pub page: Arc<Page>,
    /// Note that should receive input focus.
    pub focus: NoteId,
    /// Caret offset inside the focused note.
    pub caret: usize,
    /// Whether the outline changed and needs persisting.
    pub changed: bool,
}

impl EditOutcome {
    fn unchanged(store: &OutlineStore, focus: NoteId, caret: usize) -> Self {
        Self {
            page: store.snapshot(),
            focus,
            caret,
            changed: false,
        }
    }
}

/// Splits a note at `caret` (Enter).
///
/// Text after the caret moves into a new sibling inserted right after the
/// note. Consumed by the trigger menu while a session is active.
pub fn split(
    store: &mut OutlineStore,
    note_id: NoteId,
    caret: usize,
    session: &TriggerSession,
) -> OutlineResult<EditOutcome> {
    let note = locate(store, note_id, "split")?;
    if session.is_active() {
        debug!("event=outline_edit module=editor op=split status=skip reason=trigger_active");
        return Ok(EditOutcome::unchanged(store, note_id, caret));
    }

    let text = note.text.clone();
    let cut = clamp_caret(&text, caret);
    let sibling = note.sibling(&text[cut..]);
    let sibling_id = sibling.id;

    let (page, ()) = store.transaction("split", |tx| {
        tx.update_text(note_id, &text[..cut])?;
        tx.insert_after(note_id, sibling)
    })?;
    Ok(EditOutcome {
        page,
        focus: sibling_id,
        caret: 0,
        changed: true,
    })
}

/// Indents a note under the note right before it (Tab).
pub fn indent(
    store: &mut OutlineStore,
    note_id: NoteId,
    caret: usize,
) -> OutlineResult<EditOutcome> {
    let note = locate(store, note_id, "indent")?;
    let Some(prev) = store.previous(note_id) else {
        debug!("event=outline_edit module=editor op=indent status=skip reason=first_note");
        return Ok(EditOutcome::unchanged(store, note_id, caret));
    };
    if note.parent_id == Some(prev.id) && note.depth == prev.depth + 1 {
        debug!("event=outline_edit module=editor op=indent status=skip reason=already_child");
        return Ok(EditOutcome::unchanged(store, note_id, caret));
    }

    let new_parent = prev.id;
    let new_depth = prev.depth + 1;
    let delta = i64::from(new_depth) - i64::from(note.depth);
    move_with_descendants(store, "indent", note_id, Some(new_parent), new_depth, delta, caret)
}

/// Moves a note up one level, next to its former parent (Shift+Tab).
///
/// A note whose parent no longer exists is moved to root level.
pub fn outdent(
    store: &mut OutlineStore,
    note_id: NoteId,
    caret: usize,
) -> OutlineResult<EditOutcome> {
    let note = locate(store, note_id, "outdent")?;
    if note.depth == 0 {
        debug!("event=outline_edit module=editor op=outdent status=skip reason=root_note");
        return Ok(EditOutcome::unchanged(store, note_id, caret));
    }

    let (new_parent, new_depth) = match note.parent_id.and_then(|id| store.get(id)) {
        Some(parent) => (parent.parent_id, parent.depth),
        None => (None, 0),
    };
    let delta = i64::from(new_depth) - i64::from(note.depth);
    move_with_descendants(store, "outdent", note_id, new_parent, new_depth, delta, caret)
}

fn move_with_descendants(
    store: &mut OutlineStore,
    op: &'static str,
    note_id: NoteId,
    new_parent: Option<NoteId>,
    new_depth: u32,
    delta: i64,
    caret: usize,
) -> OutlineResult<EditOutcome> {
    let (page, ()) = store.transaction(op, |tx| {
        let index = tx.index_of(note_id)?;
        let descendants = tx.descendant_range(index);
        tx.reparent(note_id, new_parent, new_depth)?;
        tx.shift_depths(descendants, delta);
        Ok(())
    })?;
    Ok(EditOutcome {
        page,
        focus: note_id,
        caret,
        changed: true,
    })
}

/// Deletes a note and merges any remaining text into the previous note
/// (Backspace on an empty note).
///
/// Focus moves to the previous note with the caret where the two texts
/// meet. Deleting the first note focuses the new first note at offset 0;
/// the first note is only deleted when empty since there is nothing to
/// merge into.
pub fn delete_merge(
    store: &mut OutlineStore,
    note_id: NoteId,
    policy: OrphanPolicy,
) -> OutlineResult<EditOutcome> {
    let note = locate(store, note_id, "delete_merge")?;
    let end_of_note = note.text.len();
    if store.len() <= 1 {
        debug!("event=outline_edit module=editor op=delete_merge status=skip reason=last_note");
        return Ok(EditOutcome::unchanged(store, note_id, end_of_note));
    }

    let index = store.index_of(note_id).ok_or(OutlineError::NotFound(note_id))?;
    let removed_text = note.text.clone();
    let (focus, caret, merged) = match store.previous(note_id) {
        Some(prev) => (
            prev.id,
            prev.text.len(),
            (!removed_text.is_empty()).then(|| format!("{}{}", prev.text, removed_text)),
        ),
        None if removed_text.is_empty() => (store.all()[index + 1].id, 0, None),
        None => {
            debug!(
                "event=outline_edit module=editor op=delete_merge status=skip reason=first_note_not_empty"
            );
            return Ok(EditOutcome::unchanged(store, note_id, 0));
        }
    };

    let (page, ()) = store.transaction("delete_merge", |tx| {
        let descendants = tx.descendant_range(index);
        let removed = tx.remove(note_id)?;
        if policy == OrphanPolicy::Reparent {
            let shifted = descendants.start - 1..descendants.end - 1;
            let grandparent = removed
                .parent_id
                .filter(|parent| tx.get(*parent).is_ok());
            let direct_children: Vec<NoteId> = tx.notes()[shifted.clone()]
                .iter()
                .filter(|child| child.parent_id == Some(removed.id))
                .map(|child| child.id)
                .collect();
            tx.shift_depths(shifted, -1);
            for child in direct_children {
                tx.reparent(child, grandparent, removed.depth)?;
            }
        }
        if let Some(text) = merged {
            tx.update_text(focus, text)?;
        }
        Ok(())
    })?;

    Ok(EditOutcome {
        page,
        focus,
        caret,
        changed: true,
    })
}

fn locate<'s>(
    store: &'s OutlineStore,
    note_id: NoteId,
    op: &'static str,
) -> OutlineResult<&'s crate::model::note::Note> {
    store.get(note_id).ok_or_else(|| {
        warn!(
            "event=outline_edit module=editor op={} status=error error_code=note_not_found note_id={}",
            op, note_id
        );
        OutlineError::NotFound(note_id)
    })
}

/// Clamps a caret to the text length and back to a char boundary.
pub fn clamp_caret(text: &str, caret: usize) -> usize {
    let mut caret = caret.min(text.len());
    while caret > 0 && !text.is_char_boundary(caret) {
        caret -= 1;
    }
    caret
}
