//! Inline trigger recognition during live typing.
//!
//! # Responsibility
//! - Track page-link (`[[`) and slash-command (`/`) sessions per note.
//! - Provide suggestion filters and the fixed command catalog.

pub mod commands;
pub mod scanner;

pub use commands::{filter_commands, find_command, CommandSpec, COMMAND_CATALOG};
pub use scanner::{
    cancel, extract_linked_titles, filter_page_titles, find_existing_title, link_create_candidate,
    link_syntax, scan, TriggerSession, COMMAND_OPENER, LINK_OPENER,
};
