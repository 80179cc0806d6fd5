//! Command and link resolution for completed trigger sessions.
//!
//! # Responsibility
//! - Rewrite note text for a chosen link title or slash command.
//! - Run the resolution side effects: ensure the linked page, retype the
//!   note, synthesize a calendar event.
//!
//! # Invariants
//! - A session that does not match the request or no longer fits the note
//!   text is rejected before anything changes.
//! - A successful resolution always leaves the session `Idle`.
//! - At most one calendar event is emitted per note back-reference.

pub mod datetime;

pub use datetime::{extract_event_window, EventTiming, EventWindow, ExtractionFailure};

use crate::model::calendar::CalendarEvent;
use crate::model::note::{Note, NoteId};
use crate::model::page::Page;
use crate::outline::store::{OutlineError, OutlineStore};
use crate::repo::{CalendarSink, PageRepository, RepoError, RepoResult};
use crate::trigger::{link_syntax, CommandSpec, TriggerSession, COMMAND_OPENER, LINK_OPENER};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::sync::Arc;

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors from link and command resolution.
#[derive(Debug)]
pub enum ResolveError {
    Outline(OutlineError),
    /// Session type differs from the request or its span no longer fits.
    SessionMismatch {
        note_id: NoteId,
        expected: &'static str,
    },
    /// Link title is empty after trimming.
    EmptyTitle,
    Repo(RepoError),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline(err) => write!(f, "{err}"),
            Self::SessionMismatch { note_id, expected } => {
                write!(f, "no matching {expected} session on note {note_id}")
            }
            Self::EmptyTitle => write!(f, "link title must not be empty"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Outline(err) => Some(err),
            Self::SessionMismatch { .. } => None,
            Self::EmptyTitle => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<OutlineError> for ResolveError {
    fn from(value: OutlineError) -> Self {
        Self::Outline(value)
    }
}

impl From<RepoError> for ResolveError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Outcome of a link resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResolution {
    pub page: Arc<Page>,
    pub focus: NoteId,
    /// Right after the inserted link.
    pub caret: usize,
    /// The page the link points at, possibly just created.
    pub linked_page: Page,
}

/// Outcome of a command resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResolution {
    pub page: Arc<Page>,
    pub focus: NoteId,
    /// End of the rewritten text.
    pub caret: usize,
    /// Event emitted by this resolution, if any.
    pub event: Option<CalendarEvent>,
}

/// Replaces the active link span with `[[title]]` and ensures the page.
pub fn resolve_link<P: PageRepository>(
    store: &mut OutlineStore,
    note_id: NoteId,
    session: &mut TriggerSession,
    title: &str,
    pages: &P,
) -> ResolveResult<LinkResolution> {
    let note = store.get(note_id).ok_or(OutlineError::NotFound(note_id))?;
    let TriggerSession::Link { start, query } = &*session else {
        return Err(mismatch(note_id, "link"));
    };
    let span = session_span(&note.text, *start, LINK_OPENER, query)
        .ok_or_else(|| mismatch(note_id, "link"))?;
    let title = title.trim();
    if title.is_empty() {
        return Err(ResolveError::EmptyTitle);
    }

    let linked_page = pages.ensure_page(title)?;
    let link = link_syntax(title);
    let caret = span.start + link.len();
    let text = format!("{}{}{}", &note.text[..span.start], link, &note.text[span.end..]);
    let page = store.update_text(note_id, text)?;
    *session = TriggerSession::Idle;

    info!(
        "event=trigger_resolve module=resolver status=ok type=link note_id={} page_id={}",
        note_id, linked_page.id
    );
    Ok(LinkResolution {
        page,
        focus: note_id,
        caret,
        linked_page,
    })
}

/// Removes the active command span, retypes the note and, for calendar
/// kinds, emits one event extracted from the remaining text.
///
/// Calendar collaborator failures are logged and do not undo the retype.
pub fn resolve_command<C: CalendarSink>(
    store: &mut OutlineStore,
    note_id: NoteId,
    session: &mut TriggerSession,
    command: &CommandSpec,
    calendar: &C,
    timing: &EventTiming,
    page_title: &str,
) -> ResolveResult<CommandResolution> {
    let note = store.get(note_id).ok_or(OutlineError::NotFound(note_id))?;
    let TriggerSession::Command { start, query } = &*session else {
        return Err(mismatch(note_id, "command"));
    };
    let opener = COMMAND_OPENER.to_string();
    let span = session_span(&note.text, *start, &opener, query)
        .ok_or_else(|| mismatch(note_id, "command"))?;

    let text = format!("{}{}", &note.text[..span.start], &note.text[span.end..])
        .trim_end()
        .to_string();
    let caret = text.len();
    let kind = command.kind;
    let (page, ()) = store.transaction("resolve_command", |tx| {
        tx.update_text(note_id, text)?;
        tx.set_kind(note_id, kind)
    })?;
    *session = TriggerSession::Idle;
    info!(
        "event=trigger_resolve module=resolver status=ok type=command note_id={} kind={}",
        note_id, kind
    );

    let event = match page.note(note_id) {
        Some(note) => match sync_calendar_event(note, page_title, calendar, timing) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    "event=calendar_sync module=resolver status=error note_id={} error={}",
                    note_id, err
                );
                None
            }
        },
        None => None,
    };

    Ok(CommandResolution {
        page,
        focus: note_id,
        caret,
        event,
    })
}

/// Emits the calendar event for a calendar-kind note unless one with the
/// same back-reference already exists.
///
/// Extraction failures are not errors: no event is produced.
pub fn sync_calendar_event<C: CalendarSink>(
    note: &Note,
    page_title: &str,
    calendar: &C,
    timing: &EventTiming,
) -> RepoResult<Option<CalendarEvent>> {
    if !note.kind.produces_calendar_event() {
        return Ok(None);
    }
    if calendar.find_event_for_note(note.id)?.is_some() {
        debug!(
            "event=calendar_sync module=resolver status=skip reason=already_emitted note_id={}",
            note.id
        );
        return Ok(None);
    }

    let window = match extract_event_window(&note.text, timing) {
        Ok(window) => window,
        Err(failure) => {
            debug!(
                "event=calendar_sync module=resolver status=skip reason=extraction note_id={} detail={}",
                note.id, failure
            );
            return Ok(None);
        }
    };

    let event = CalendarEvent {
        title: note.text.trim().to_string(),
        start: window.start,
        end: window.end,
        kind: note.kind,
        description: format!("From page {page_title}"),
        source_note_id: note.id,
    };
    calendar.emit_calendar_event(&event)?;
    Ok(Some(event))
}

/// Byte span `[start, end)` of an active session, if it still fits `text`.
fn session_span(text: &str, start: usize, opener: &str, query: &str) -> Option<Range<usize>> {
    let end = start + opener.len() + query.len();
    let typed = text.get(start..end)?;
    (typed.strip_prefix(opener)? == query).then_some(start..end)
}

fn mismatch(note_id: NoteId, expected: &'static str) -> ResolveError {
    warn!(
        "event=trigger_resolve module=resolver status=error error_code=session_mismatch note_id={} expected={}",
        note_id, expected
    );
    ResolveError::SessionMismatch { note_id, expected }
}
