//! Outline editing facade.
//!
//! # Responsibility
//! - Own the outline store of one open page, the per-note trigger sessions
//!   and the deferred calendar analysis timers.
//! - Translate text input, key signals and menu selections into store,
//!   editor and resolver calls.
//! - Persist the page after every mutating operation.
//!
//! # Invariants
//! - A note has an entry in the session map only while a session is active.
//! - Save failures surface as errors; the in-memory snapshot stays current.

use crate::config::{ConfigError, EngineConfig};
use crate::model::calendar::CalendarEvent;
use crate::model::note::NoteId;
use crate::model::page::{Page, PageId};
use crate::outline::editor::{self, EditOutcome, OrphanPolicy};
use crate::outline::projector::{to_forest, OutlineNode};
use crate::outline::store::{OutlineError, OutlineStore};
use crate::repo::{CalendarSink, PageRepository, RepoError};
use crate::resolver::{
    resolve_command, resolve_link, sync_calendar_event, CommandResolution, EventTiming,
    LinkResolution, ResolveError,
};
use crate::service::debounce::Debouncer;
use crate::trigger::{
    cancel, filter_commands, filter_page_titles, find_command, find_existing_title,
    link_create_candidate, scan, CommandSpec, TriggerSession,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from outline service operations.
#[derive(Debug)]
pub enum ServiceError {
    Outline(OutlineError),
    Resolve(ResolveError),
    Repo(RepoError),
    Config(ConfigError),
    /// No catalog command has this keyword.
    UnknownCommand(String),
    /// Note kind carries no checkbox.
    NotCheckable(NoteId),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline(err) => write!(f, "{err}"),
            Self::Resolve(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::UnknownCommand(keyword) => write!(f, "unknown command: {keyword}"),
            Self::NotCheckable(id) => write!(f, "note is not checkable: {id}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Outline(err) => Some(err),
            Self::Resolve(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OutlineError> for ServiceError {
    fn from(value: OutlineError) -> Self {
        Self::Outline(value)
    }
}

impl From<ResolveError> for ServiceError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::Outline(err) => Self::Outline(err),
            ResolveError::Repo(err) => Self::Repo(err),
            other => Self::Resolve(other),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ConfigError> for ServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Structural key presses the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySignal {
    Enter,
    Tab,
    ShiftTab,
    /// Backspace pressed on an empty note (or at offset 0 for merge).
    BackspaceOnEmpty,
    Escape,
}

/// Result of one text input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUpdate {
    pub page: Arc<Page>,
    pub session: TriggerSession,
}

/// Link menu contents for an active link session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSuggestions {
    pub titles: Vec<String>,
    /// Title offered as "create page" when no title matches exactly.
    pub create: Option<String>,
}

/// Editing facade over one open page.
pub struct OutlineService<R: PageRepository, C: CalendarSink> {
    pages: R,
    calendar: C,
    store: OutlineStore,
    sessions: HashMap<NoteId, TriggerSession>,
    analysis: Debouncer<NoteId>,
    timing: EventTiming,
    orphan_policy: OrphanPolicy,
}

impl<R: PageRepository, C: CalendarSink> OutlineService<R, C> {
    /// Opens an existing page by id.
    pub fn open(
        pages: R,
        calendar: C,
        page_id: PageId,
        config: &EngineConfig,
    ) -> ServiceResult<Self> {
        let page = pages.load_page(page_id)?;
        Self::with_page(pages, calendar, page, config)
    }

    /// Opens the page titled `title`, creating it when absent.
    pub fn open_by_title(
        pages: R,
        calendar: C,
        title: &str,
        config: &EngineConfig,
    ) -> ServiceResult<Self> {
        let page = pages.ensure_page(title)?;
        Self::with_page(pages, calendar, page, config)
    }

    fn with_page(pages: R, calendar: C, page: Page, config: &EngineConfig) -> ServiceResult<Self> {
        let timing = config.event_timing()?;
        info!(
            "event=page_open module=service status=ok page_id={} note_count={}",
            page.id,
            page.notes.len()
        );
        Ok(Self {
            pages,
            calendar,
            store: OutlineStore::new(page),
            sessions: HashMap::new(),
            analysis: Debouncer::new(config.analysis_debounce()),
            timing,
            orphan_policy: config.orphan_policy,
        })
    }

    /// Current page snapshot.
    pub fn snapshot(&self) -> Arc<Page> {
        self.store.snapshot()
    }

    /// Current outline as a nested forest.
    pub fn forest(&self) -> Vec<OutlineNode> {
        to_forest(&self.store.snapshot().notes)
    }

    /// Trigger session of one note (`Idle` when none is active).
    pub fn session(&self, note_id: NoteId) -> TriggerSession {
        self.sessions.get(&note_id).cloned().unwrap_or_default()
    }

    /// Number of notes with pending calendar analysis.
    pub fn pending_analysis(&self) -> usize {
        self.analysis.pending_count()
    }

    /// Applies one keystroke's resulting text to a note.
    ///
    /// Updates the trigger session and, for calendar kinds, restarts the
    /// analysis timer.
    pub fn on_text_input(
        &mut self,
        note_id: NoteId,
        text: impl Into<String>,
        now: Instant,
    ) -> ServiceResult<TextUpdate> {
        let text = text.into();
        let session = scan(&self.session(note_id), &text);
        let page = self.store.update_text(note_id, text)?;
        if page
            .note(note_id)
            .is_some_and(|note| note.kind.produces_calendar_event())
        {
            self.analysis.schedule(note_id, now);
        }
        self.remember_session(note_id, session.clone());
        self.persist(&page)?;
        Ok(TextUpdate { page, session })
    }

    /// Handles one structural key press at `caret` in `note_id`.
    pub fn on_key(
        &mut self,
        note_id: NoteId,
        key: KeySignal,
        caret: usize,
    ) -> ServiceResult<EditOutcome> {
        let outcome = match key {
            KeySignal::Enter => {
                let session = self.session(note_id);
                editor::split(&mut self.store, note_id, caret, &session)?
            }
            KeySignal::Tab => editor::indent(&mut self.store, note_id, caret)?,
            KeySignal::ShiftTab => editor::outdent(&mut self.store, note_id, caret)?,
            KeySignal::BackspaceOnEmpty => {
                editor::delete_merge(&mut self.store, note_id, self.orphan_policy)?
            }
            KeySignal::Escape => {
                let session = cancel(&self.session(note_id));
                self.remember_session(note_id, session);
                EditOutcome {
                    page: self.store.snapshot(),
                    focus: note_id,
                    caret,
                    changed: false,
                }
            }
        };

        if outcome.page.note(note_id).is_none() {
            self.sessions.remove(&note_id);
            self.analysis.cancel(note_id);
        }
        if outcome.changed {
            self.persist(&outcome.page)?;
        }
        Ok(outcome)
    }

    /// Page titles matching the active link query of a note.
    pub fn link_suggestions(&self, note_id: NoteId) -> ServiceResult<LinkSuggestions> {
        let TriggerSession::Link { query, .. } = self.session(note_id) else {
            return Ok(LinkSuggestions::default());
        };
        let titles = self.pages.list_page_titles()?;
        Ok(LinkSuggestions {
            create: link_create_candidate(&query, &titles),
            titles: filter_page_titles(&query, &titles)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }

    /// Catalog commands matching the active command query of a note.
    pub fn command_suggestions(&self, note_id: NoteId) -> Vec<&'static CommandSpec> {
        match self.session(note_id) {
            TriggerSession::Command { query, .. } => filter_commands(&query),
            _ => Vec::new(),
        }
    }

    /// Resolves the active link session of a note with `title`.
    pub fn select_link(&mut self, note_id: NoteId, title: &str) -> ServiceResult<LinkResolution> {
        let mut session = self.sessions.remove(&note_id).unwrap_or_default();
        let result = resolve_link(&mut self.store, note_id, &mut session, title, &self.pages);
        self.remember_session(note_id, session);
        let resolution = result?;
        self.persist(&resolution.page)?;
        Ok(resolution)
    }

    /// Resolves the active link session with the typed query as a new title.
    ///
    /// A query naming an existing page up to case links that page instead.
    pub fn create_linked_page(&mut self, note_id: NoteId) -> ServiceResult<LinkResolution> {
        let TriggerSession::Link { query, .. } = self.session(note_id) else {
            return Err(ResolveError::SessionMismatch {
                note_id,
                expected: "link",
            }
            .into());
        };
        let titles = self.pages.list_page_titles()?;
        let title = match link_create_candidate(&query, &titles) {
            Some(candidate) => candidate,
            None => find_existing_title(&query, &titles)
                .map(str::to_string)
                .unwrap_or(query),
        };
        self.select_link(note_id, &title)
    }

    /// Resolves the active command session of a note with `keyword`.
    pub fn select_command(
        &mut self,
        note_id: NoteId,
        keyword: &str,
    ) -> ServiceResult<CommandResolution> {
        let command =
            find_command(keyword).ok_or_else(|| ServiceError::UnknownCommand(keyword.to_string()))?;
        let page_title = self.store.snapshot().title.clone();
        let mut session = self.sessions.remove(&note_id).unwrap_or_default();
        let result = resolve_command(
            &mut self.store,
            note_id,
            &mut session,
            command,
            &self.calendar,
            &self.timing,
            &page_title,
        );
        self.remember_session(note_id, session);
        let resolution = result?;
        self.analysis.cancel(note_id);
        self.persist(&resolution.page)?;
        Ok(resolution)
    }

    /// Flips the checkbox of a checkable note.
    pub fn toggle_done(&mut self, note_id: NoteId) -> ServiceResult<Arc<Page>> {
        let note = self
            .store
            .get(note_id)
            .ok_or(OutlineError::NotFound(note_id))?;
        if !note.kind.is_checkable() {
            return Err(ServiceError::NotCheckable(note_id));
        }
        let done = !note.done;
        let page = self.store.set_done(note_id, done)?;
        self.persist(&page)?;
        Ok(page)
    }

    /// Runs calendar analysis for every note whose typing pause elapsed.
    ///
    /// Returns the events emitted by this flush. A calendar failure on one
    /// note is logged and the remaining due notes are still analyzed.
    pub fn flush_due(&mut self, now: Instant) -> ServiceResult<Vec<CalendarEvent>> {
        let page = self.store.snapshot();
        let mut emitted = Vec::new();
        for note_id in self.analysis.take_due(now) {
            let Some(note) = page.note(note_id) else {
                continue;
            };
            match sync_calendar_event(note, &page.title, &self.calendar, &self.timing) {
                Ok(Some(event)) => emitted.push(event),
                Ok(None) => {}
                Err(err) => warn!(
                    "event=analysis_flush module=service status=error note_id={} error={}",
                    note_id, err
                ),
            }
        }
        debug!(
            "event=analysis_flush module=service status=ok emitted={} pending={}",
            emitted.len(),
            self.analysis.pending_count()
        );
        Ok(emitted)
    }

    fn remember_session(&mut self, note_id: NoteId, session: TriggerSession) {
        if session.is_active() {
            self.sessions.insert(note_id, session);
        } else {
            self.sessions.remove(&note_id);
        }
    }

    fn persist(&self, page: &Page) -> ServiceResult<()> {
        self.pages.save_page(page)?;
        debug!(
            "event=page_save module=service status=ok page_id={} note_count={}",
            page.id,
            page.notes.len()
        );
        Ok(())
    }
}
