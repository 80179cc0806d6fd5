use deskpad_core::db::open_db_in_memory;
use deskpad_core::resolver::{resolve_command, resolve_link};
use deskpad_core::trigger::{
    extract_linked_titles, find_command, scan, COMMAND_OPENER, LINK_OPENER,
};
use deskpad_core::{
    EventTiming, NoteId, NoteKind, OutlineStore, PageRepository, ResolveError,
    SqliteCalendarRepository, SqlitePageRepository, TriggerSession,
};
use rusqlite::Connection;

/// Feeds `text` one character at a time through the scanner.
fn type_text(text: &str) -> TriggerSession {
    let mut session = TriggerSession::Idle;
    for (offset, ch) in text.char_indices() {
        session = scan(&session, &text[..offset + ch.len_utf8()]);
    }
    session
}

fn open_inbox(conn: &Connection, text: &str) -> (OutlineStore, NoteId) {
    let pages = SqlitePageRepository::try_new(conn).unwrap();
    let mut store = OutlineStore::new(pages.ensure_page("Inbox").unwrap());
    let note_id = store.all()[0].id;
    store.update_text(note_id, text).unwrap();
    (store, note_id)
}

#[test]
fn call_command_strips_trigger_and_retypes() {
    let conn = open_db_in_memory().unwrap();
    let calendar = SqliteCalendarRepository::try_new(&conn).unwrap();
    let text = "Call John /call";
    let mut session = type_text(text);
    assert_eq!(
        session,
        TriggerSession::Command {
            start: 10,
            query: "call".to_string()
        }
    );
    let (mut store, note_id) = open_inbox(&conn, text);

    let resolution = resolve_command(
        &mut store,
        note_id,
        &mut session,
        find_command("call").unwrap(),
        &calendar,
        &EventTiming::default(),
        "Inbox",
    )
    .unwrap();

    let note = resolution.page.note(note_id).unwrap();
    assert_eq!(note.text, "Call John");
    assert_eq!(note.kind, NoteKind::Call);
    assert_eq!(session, TriggerSession::Idle);
    assert!(calendar.list_events().unwrap().is_empty());
}

#[test]
fn todo_command_resets_done_flag() {
    let conn = open_db_in_memory().unwrap();
    let calendar = SqliteCalendarRepository::try_new(&conn).unwrap();
    let text = "water plants /to";
    let mut session = type_text(text);
    let (mut store, note_id) = open_inbox(&conn, text);
    store.set_done(note_id, true).unwrap();

    let resolution = resolve_command(
        &mut store,
        note_id,
        &mut session,
        find_command("todo").unwrap(),
        &calendar,
        &EventTiming::default(),
        "Inbox",
    )
    .unwrap();

    let note = resolution.page.note(note_id).unwrap();
    assert_eq!(note.text, "water plants");
    assert_eq!(note.kind, NoteKind::Todo);
    assert!(!note.done);
}

#[test]
fn meeting_command_emits_single_event() {
    let conn = open_db_in_memory().unwrap();
    let calendar = SqliteCalendarRepository::try_new(&conn).unwrap();
    let text = "Meeting 12/25/25 3:30pm /meeting";
    let (mut store, note_id) = open_inbox(&conn, text);
    let meeting = find_command("meeting").unwrap();

    let mut session = type_text(text);
    let first = resolve_command(
        &mut store,
        note_id,
        &mut session,
        meeting,
        &calendar,
        &EventTiming::default(),
        "Inbox",
    )
    .unwrap();
    let event = first.event.unwrap();
    assert_eq!(event.start.format("%Y-%m-%dT%H:%M").to_string(), "2025-12-25T15:30");
    assert_eq!(event.end.format("%Y-%m-%dT%H:%M").to_string(), "2025-12-25T16:30");
    assert_eq!(event.source_note_id, note_id);

    store.update_text(note_id, text).unwrap();
    let mut session = type_text(text);
    let second = resolve_command(
        &mut store,
        note_id,
        &mut session,
        meeting,
        &calendar,
        &EventTiming::default(),
        "Inbox",
    )
    .unwrap();
    assert!(second.event.is_none());
    assert_eq!(calendar.list_events().unwrap().len(), 1);
}

#[test]
fn calendar_kind_without_date_emits_nothing() {
    let conn = open_db_in_memory().unwrap();
    let calendar = SqliteCalendarRepository::try_new(&conn).unwrap();
    let text = "Trip to Lisbon /travel";
    let mut session = type_text(text);
    let (mut store, note_id) = open_inbox(&conn, text);

    let resolution = resolve_command(
        &mut store,
        note_id,
        &mut session,
        find_command("travel").unwrap(),
        &calendar,
        &EventTiming::default(),
        "Inbox",
    )
    .unwrap();

    assert_eq!(resolution.page.note(note_id).unwrap().kind, NoteKind::Travel);
    assert!(resolution.event.is_none());
}

#[test]
fn link_resolution_creates_page_and_places_caret() {
    let conn = open_db_in_memory().unwrap();
    let pages = SqlitePageRepository::try_new(&conn).unwrap();
    let text = "see [[Proj";
    let mut session = type_text(text);
    assert_eq!(
        session,
        TriggerSession::Link {
            start: 4,
            query: "Proj".to_string()
        }
    );
    let (mut store, note_id) = open_inbox(&conn, text);

    let resolution = resolve_link(&mut store, note_id, &mut session, "Project X", &pages).unwrap();

    let note = resolution.page.note(note_id).unwrap();
    assert_eq!(note.text, "see [[Project X]]");
    assert_eq!(resolution.caret, note.text.len());
    assert!(note.linked_page_titles.contains("Project X"));
    assert_eq!(resolution.linked_page.title, "Project X");
    assert_eq!(pages.list_page_titles().unwrap(), vec!["Inbox", "Project X"]);
    assert_eq!(session, TriggerSession::Idle);
}

#[test]
fn link_resolution_reuses_existing_page() {
    let conn = open_db_in_memory().unwrap();
    let pages = SqlitePageRepository::try_new(&conn).unwrap();
    let existing = pages.ensure_page("Groceries").unwrap();
    let text = "[[gro";
    let mut session = type_text(text);
    let (mut store, note_id) = open_inbox(&conn, text);

    let resolution = resolve_link(&mut store, note_id, &mut session, "Groceries", &pages).unwrap();

    assert_eq!(resolution.linked_page.id, existing.id);
    assert_eq!(pages.list_page_titles().unwrap().len(), 2);
}

#[test]
fn stale_session_is_rejected_without_changes() {
    let conn = open_db_in_memory().unwrap();
    let pages = SqlitePageRepository::try_new(&conn).unwrap();
    let mut session = type_text("see [[Proj");
    let (mut store, note_id) = open_inbox(&conn, "something else");

    let err = resolve_link(&mut store, note_id, &mut session, "Project X", &pages).unwrap_err();

    assert!(matches!(err, ResolveError::SessionMismatch { expected: "link", .. }));
    assert_eq!(store.get(note_id).unwrap().text, "something else");
    assert_eq!(pages.list_page_titles().unwrap(), vec!["Inbox"]);
}

#[test]
fn deleting_opener_character_returns_to_idle() {
    let session = type_text("abc[[");
    assert!(matches!(session, TriggerSession::Link { start: 3, .. }));
    assert_eq!(scan(&session, "abc["), TriggerSession::Idle);
}

#[test]
fn mid_word_slashes_never_open_commands() {
    assert_eq!(type_text("a/b/c"), TriggerSession::Idle);
    assert_eq!(type_text("see http://example.com"), TriggerSession::Idle);
    assert_eq!(type_text("12/25/25"), TriggerSession::Idle);
}

#[test]
fn whitespace_ends_command_session() {
    let session = type_text("/call");
    assert!(session.is_active());
    assert_eq!(scan(&session, "/call "), TriggerSession::Idle);
}

#[test]
fn link_extraction_collapses_duplicates() {
    let titles = extract_linked_titles("[[A]] and [[B]] and [[A]]");
    assert_eq!(titles.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
}

#[test]
fn session_starts_record_opener_offsets() {
    assert_eq!(
        type_text("see [["),
        TriggerSession::Link {
            start: "see ".len(),
            query: String::new(),
        }
    );
    assert_eq!(LINK_OPENER.len(), 2);
    let text = format!("Call {COMMAND_OPENER}");
    assert_eq!(
        type_text(&text),
        TriggerSession::Command {
            start: text.len() - COMMAND_OPENER.len_utf8(),
            query: String::new(),
        }
    );
}
