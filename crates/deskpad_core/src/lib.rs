//! Core outline engine for Deskpad.
//! Pages are flat note lists edited as indentable trees, with inline page
//! links and slash commands recognized while typing.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod outline;
pub mod repo;
pub mod resolver;
pub mod service;
pub mod trigger;

pub use config::{ConfigError, EngineConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::calendar::CalendarEvent;
pub use model::note::{Note, NoteId, NoteKind};
pub use model::page::{OutlineValidationError, Page, PageId};
pub use outline::{EditOutcome, OrphanPolicy, OutlineError, OutlineNode, OutlineStore};
pub use repo::{
    CalendarSink, PageRepository, RepoError, RepoResult, SqliteCalendarRepository,
    SqlitePageRepository,
};
pub use resolver::{CommandResolution, EventTiming, LinkResolution, ResolveError};
pub use service::{KeySignal, LinkSuggestions, OutlineService, ServiceError, TextUpdate};
pub use trigger::{CommandSpec, TriggerSession};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
