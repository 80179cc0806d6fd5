//! Calendar sink contract and SQLite implementation.
//!
//! # Invariants
//! - At most one event exists per source note (`source_note_uuid UNIQUE`).
//! - Date-times are stored as local naive ISO-8601 text.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::calendar::CalendarEvent;
use crate::model::note::{NoteId, NoteKind};
use chrono::NaiveDateTime;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Calendar collaborator receiving synthesized events.
pub trait CalendarSink {
    /// Returns the event carrying this note's back-reference, if any.
    fn find_event_for_note(&self, note_id: NoteId) -> RepoResult<Option<CalendarEvent>>;
    /// Accepts one synthesized event.
    fn emit_calendar_event(&self, event: &CalendarEvent) -> RepoResult<()>;
}

/// SQLite-backed calendar event store.
pub struct SqliteCalendarRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCalendarRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["calendar_events"])?;
        Ok(Self { conn })
    }

    /// Lists all events ordered by start time.
    pub fn list_events(&self) -> RepoResult<Vec<CalendarEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_note_uuid, title, kind, description, start_at, end_at
             FROM calendar_events
             ORDER BY start_at ASC, event_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }
}

impl CalendarSink for SqliteCalendarRepository<'_> {
    fn find_event_for_note(&self, note_id: NoteId) -> RepoResult<Option<CalendarEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_note_uuid, title, kind, description, start_at, end_at
             FROM calendar_events
             WHERE source_note_uuid = ?1;",
        )?;
        stmt.query_row([note_id.to_string()], |row| Ok(parse_event_row(row)))
            .optional()?
            .transpose()
    }

    fn emit_calendar_event(&self, event: &CalendarEvent) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO calendar_events (
                source_note_uuid,
                title,
                kind,
                description,
                start_at,
                end_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                event.source_note_id.to_string(),
                event.title,
                event.kind.as_str(),
                event.description,
                event.start.format(DATETIME_FORMAT).to_string(),
                event.end.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        info!(
            "event=calendar_emit module=repo status=ok note_id={} kind={}",
            event.source_note_id, event.kind
        );
        Ok(())
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<CalendarEvent> {
    let source: String = row.get(0)?;
    let kind: String = row.get(2)?;
    let start: String = row.get(4)?;
    let end: String = row.get(5)?;
    Ok(CalendarEvent {
        title: row.get(1)?,
        start: parse_datetime(&start, "calendar_events.start_at")?,
        end: parse_datetime(&end, "calendar_events.end_at")?,
        kind: NoteKind::parse(&kind)
            .ok_or_else(|| RepoError::InvalidData(format!("unknown event kind `{kind}`")))?,
        description: row.get(3)?,
        source_note_id: parse_uuid(&source, "calendar_events.source_note_uuid")?,
    })
}

fn parse_datetime(value: &str, column: &'static str) -> RepoResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid datetime `{value}` in {column}")))
}
