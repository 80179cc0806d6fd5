//! Fixed slash-command catalog.

use crate::model::note::NoteKind;

/// One selectable slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Word typed after the slash.
    pub keyword: &'static str,
    /// Menu label.
    pub label: &'static str,
    /// Kind assigned to the note on resolution.
    pub kind: NoteKind,
}

const fn command(keyword: &'static str, label: &'static str, kind: NoteKind) -> CommandSpec {
    CommandSpec {
        keyword,
        label,
        kind,
    }
}

/// Catalog in menu order.
pub const COMMAND_CATALOG: &[CommandSpec] = &[
    command("text", "Plain text", NoteKind::Plain),
    command("todo", "To-do", NoteKind::Todo),
    command("travel", "Travel", NoteKind::Travel),
    command("meeting", "Meeting", NoteKind::Meeting),
    command("event", "Event", NoteKind::Event),
    command("birthday", "Birthday", NoteKind::Birthday),
    command("shopping", "Shopping", NoteKind::Shopping),
    command("followup", "Follow up", NoteKind::Followup),
    command("email", "Email", NoteKind::Email),
    command("message", "Message", NoteKind::Message),
    command("call", "Call", NoteKind::Call),
    command("reminder", "Reminder", NoteKind::Reminder),
];

/// Case-insensitive substring match against keyword and label.
pub fn filter_commands(query: &str) -> Vec<&'static CommandSpec> {
    let needle = query.trim().to_lowercase();
    COMMAND_CATALOG
        .iter()
        .filter(|spec| {
            spec.keyword.contains(&needle) || spec.label.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Exact keyword lookup.
pub fn find_command(keyword: &str) -> Option<&'static CommandSpec> {
    let keyword = keyword.trim();
    COMMAND_CATALOG
        .iter()
        .find(|spec| spec.keyword.eq_ignore_ascii_case(keyword))
}
