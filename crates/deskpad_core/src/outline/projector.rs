//! Pure conversions between the flat outline and a nested forest.
//!
//! # Invariants
//! - Functions never mutate their input.
//! - A dangling parent reference places the note at root level.
//! - `to_flat` output always satisfies the page outline invariants.

use crate::model::note::{Note, NoteId};
use std::collections::HashMap;

/// One note with its nested children, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub note: Note,
    pub children: Vec<OutlineNode>,
}

/// Builds the forest implied by `parent_id` references.
///
/// Sibling order follows flat order. Notes whose parent is missing become
/// roots; notes trapped in a parent cycle are unreachable and dropped.
pub fn to_forest(flat: &[Note]) -> Vec<OutlineNode> {
    let index_by_id: HashMap<NoteId, usize> = flat
        .iter()
        .enumerate()
        .map(|(index, note)| (note.id, index))
        .collect();

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); flat.len()];
    for (index, note) in flat.iter().enumerate() {
        match note.parent_id.and_then(|parent| index_by_id.get(&parent)) {
            Some(&parent_index) => children[parent_index].push(index),
            None => roots.push(index),
        }
    }

    roots
        .into_iter()
        .map(|index| build_node(flat, &children, index))
        .collect()
}

fn build_node(flat: &[Note], children: &[Vec<usize>], index: usize) -> OutlineNode {
    OutlineNode {
        note: flat[index].clone(),
        children: children[index]
            .iter()
            .map(|&child| build_node(flat, children, child))
            .collect(),
    }
}

/// Flattens a forest in pre-order.
///
/// `depth` and `parent_id` are rewritten from the traversal position.
pub fn to_flat(forest: &[OutlineNode]) -> Vec<Note> {
    let mut flat = Vec::new();
    for node in forest {
        push_flat(node, None, 0, &mut flat);
    }
    flat
}

fn push_flat(node: &OutlineNode, parent_id: Option<NoteId>, depth: u32, out: &mut Vec<Note>) {
    let mut note = node.note.clone();
    note.parent_id = parent_id;
    note.depth = depth;
    let id = note.id;
    out.push(note);
    for child in &node.children {
        push_flat(child, Some(id), depth + 1, out);
    }
}

/// Normalizes a flat list through the forest and back.
pub fn normalize(flat: &[Note]) -> Vec<Note> {
    to_flat(&to_forest(flat))
}
