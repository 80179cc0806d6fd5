use deskpad_core::outline::{delete_merge, indent, normalize, outdent, split, to_forest};
use deskpad_core::{
    Note, NoteId, OrphanPolicy, OutlineError, OutlineStore, OutlineValidationError, Page,
    TriggerSession,
};

fn store_with(texts: &[&str]) -> (OutlineStore, Vec<NoteId>) {
    let mut page = Page::new("Scratch");
    page.notes.clear();
    for text in texts {
        page.notes.push(Note::new(page.id, *text));
    }
    let ids = page.notes.iter().map(|note| note.id).collect();
    (OutlineStore::new(page), ids)
}

fn parent_and_depth(store: &OutlineStore, id: NoteId) -> (Option<NoteId>, u32) {
    let note = store.get(id).unwrap();
    (note.parent_id, note.depth)
}

#[test]
fn indent_chain_then_outdent() {
    let (mut store, ids) = store_with(&["A", "B", "C"]);
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    indent(&mut store, b, 0).unwrap();
    assert_eq!(parent_and_depth(&store, b), (Some(a), 1));

    indent(&mut store, c, 0).unwrap();
    assert_eq!(parent_and_depth(&store, c), (Some(b), 2));

    outdent(&mut store, c, 0).unwrap();
    assert_eq!(parent_and_depth(&store, c), (Some(a), 1));
    assert!(store.snapshot().validate_outline().is_ok());
}

#[test]
fn indenting_first_note_and_outdenting_root_are_noops() {
    let (mut store, ids) = store_with(&["A", "B"]);
    let before = store.snapshot();

    let first = indent(&mut store, ids[0], 0).unwrap();
    assert!(!first.changed);
    let root = outdent(&mut store, ids[1], 0).unwrap();
    assert!(!root.changed);
    assert_eq!(*store.snapshot(), *before);
}

#[test]
fn split_moves_tail_into_new_sibling() {
    let (mut store, ids) = store_with(&["A", "hello world"]);
    indent(&mut store, ids[1], 0).unwrap();

    let outcome = split(&mut store, ids[1], 5, &TriggerSession::Idle).unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.caret, 0);
    let page = outcome.page;
    assert_eq!(page.notes.len(), 3);
    assert_eq!(page.notes[1].text, "hello");
    assert_eq!(page.notes[2].id, outcome.focus);
    assert_eq!(page.notes[2].text, " world");
    assert_eq!(page.notes[2].parent_id, Some(ids[0]));
    assert_eq!(page.notes[2].depth, 1);
}

#[test]
fn split_at_end_creates_empty_sibling_and_clamps_caret() {
    let (mut store, ids) = store_with(&["café"]);

    let outcome = split(&mut store, ids[0], 99, &TriggerSession::Idle).unwrap();

    assert_eq!(outcome.page.notes[0].text, "café");
    assert_eq!(outcome.page.notes[1].text, "");
}

#[test]
fn indent_then_outdent_restores_sibling() {
    let (mut store, ids) = store_with(&["A", "B", "C"]);
    let root_before = parent_and_depth(&store, ids[1]);
    indent(&mut store, ids[1], 0).unwrap();
    outdent(&mut store, ids[1], 0).unwrap();
    assert_eq!(parent_and_depth(&store, ids[1]), root_before);

    indent(&mut store, ids[1], 0).unwrap();
    indent(&mut store, ids[2], 0).unwrap();
    outdent(&mut store, ids[2], 0).unwrap();
    let nested_before = parent_and_depth(&store, ids[2]);
    assert_eq!(nested_before, (Some(ids[0]), 1));

    indent(&mut store, ids[2], 0).unwrap();
    assert_eq!(parent_and_depth(&store, ids[2]), (Some(ids[1]), 2));
    outdent(&mut store, ids[2], 0).unwrap();
    assert_eq!(parent_and_depth(&store, ids[2]), nested_before);
}

#[test]
fn descendants_follow_indent_and_outdent() {
    let (mut store, ids) = store_with(&["A", "B", "B1", "B2", "D"]);
    let (a, b, b1, b2, d) = (ids[0], ids[1], ids[2], ids[3], ids[4]);
    indent(&mut store, b1, 0).unwrap();
    indent(&mut store, b2, 0).unwrap();
    outdent(&mut store, b2, 0).unwrap();
    assert_eq!(parent_and_depth(&store, b2), (Some(b), 1));

    indent(&mut store, b, 0).unwrap();
    assert_eq!(parent_and_depth(&store, b), (Some(a), 1));
    assert_eq!(parent_and_depth(&store, b1), (Some(b), 2));
    assert_eq!(parent_and_depth(&store, b2), (Some(b), 2));
    assert_eq!(parent_and_depth(&store, d), (None, 0));

    outdent(&mut store, b, 0).unwrap();
    assert_eq!(parent_and_depth(&store, b), (None, 0));
    assert_eq!(parent_and_depth(&store, b1), (Some(b), 1));
    assert!(store.snapshot().validate_outline().is_ok());
}

#[test]
fn delete_merge_never_empties_page() {
    let (mut store, ids) = store_with(&[""]);

    let outcome = delete_merge(&mut store, ids[0], OrphanPolicy::Dangling).unwrap();

    assert!(!outcome.changed);
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.remove(ids[0]).unwrap_err(),
        OutlineError::LastNoteViolation(store.page_id())
    );
}

#[test]
fn delete_merge_joins_text_into_previous_note() {
    let (mut store, ids) = store_with(&["abc", "def"]);

    let outcome = delete_merge(&mut store, ids[1], OrphanPolicy::Dangling).unwrap();

    assert_eq!(outcome.focus, ids[0]);
    assert_eq!(outcome.caret, 3);
    assert_eq!(outcome.page.notes.len(), 1);
    assert_eq!(outcome.page.notes[0].text, "abcdef");
}

#[test]
fn deleting_empty_first_note_focuses_next() {
    let (mut store, ids) = store_with(&["", "next"]);

    let outcome = delete_merge(&mut store, ids[0], OrphanPolicy::Dangling).unwrap();

    assert_eq!(outcome.focus, ids[1]);
    assert_eq!(outcome.caret, 0);
    assert_eq!(store.len(), 1);
}

#[test]
fn dangling_policy_leaves_children_pointing_at_removed_note() {
    let (mut store, ids) = store_with(&["A", "", "C"]);
    indent(&mut store, ids[1], 0).unwrap();
    indent(&mut store, ids[2], 0).unwrap();

    let page = delete_merge(&mut store, ids[1], OrphanPolicy::Dangling)
        .unwrap()
        .page;

    assert_eq!(page.notes[1].parent_id, Some(ids[1]));
    assert!(matches!(
        page.validate_outline(),
        Err(OutlineValidationError::DanglingParent { .. })
    ));
    assert_eq!(to_forest(&page.notes).len(), 2);
    let healed = normalize(&page.notes);
    assert_eq!(healed[1].parent_id, None);
    assert_eq!(healed[1].depth, 0);
}

#[test]
fn reparent_policy_lifts_children_to_grandparent() {
    let (mut store, ids) = store_with(&["A", "", "C", "C1"]);
    indent(&mut store, ids[1], 0).unwrap();
    indent(&mut store, ids[2], 0).unwrap();
    indent(&mut store, ids[3], 0).unwrap();

    let page = delete_merge(&mut store, ids[1], OrphanPolicy::Reparent)
        .unwrap()
        .page;

    assert_eq!(page.notes.len(), 3);
    assert_eq!(page.note(ids[2]).unwrap().parent_id, Some(ids[0]));
    assert_eq!(page.note(ids[2]).unwrap().depth, 1);
    assert_eq!(page.note(ids[3]).unwrap().parent_id, Some(ids[2]));
    assert_eq!(page.note(ids[3]).unwrap().depth, 2);
    assert!(page.validate_outline().is_ok());
}

#[test]
fn unknown_note_is_reported_without_mutation() {
    let (mut store, _) = store_with(&["A"]);
    let before = store.snapshot();
    let missing = uuid::Uuid::new_v4();

    assert_eq!(
        indent(&mut store, missing, 0).unwrap_err(),
        OutlineError::NotFound(missing)
    );
    assert!(std::sync::Arc::ptr_eq(&before, &store.snapshot()));
}
