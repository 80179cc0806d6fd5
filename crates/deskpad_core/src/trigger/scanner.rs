//! Live-typing trigger detection for page links and slash commands.
//!
//! # Responsibility
//! - Reduce (session, text) into the next trigger session after a keystroke.
//! - Extract every completed `[[title]]` link from note text.
//! - Filter page-title suggestions for an active link query.
//!
//! # Invariants
//! - Offsets are byte offsets into UTF-8 text and always sit on an opener.
//! - A command opener only starts a session at text start or after whitespace.
//! - Link extraction is independent from session state.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Two-character opener of a page link.
pub const LINK_OPENER: &str = "[[";
/// Two-character closer of a page link.
pub const LINK_CLOSER: &str = "]]";
/// Single-character opener of a slash command.
pub const COMMAND_OPENER: char = '/';

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]]*)\]\]").expect("valid link regex"));

/// Trigger session state of one note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TriggerSession {
    #[default]
    Idle,
    /// Page-link entry; `start` is the offset of `[[`.
    Link { start: usize, query: String },
    /// Slash-command entry; `start` is the offset of `/`.
    Command { start: usize, query: String },
}

impl TriggerSession {
    /// Returns whether a link or command session is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, TriggerSession::Idle)
    }

    /// Returns the current query of an active session.
    pub fn query(&self) -> Option<&str> {
        match self {
            TriggerSession::Idle => None,
            TriggerSession::Link { query, .. } | TriggerSession::Command { query, .. } => {
                Some(query.as_str())
            }
        }
    }

    /// Returns the opener offset of an active session.
    pub fn start(&self) -> Option<usize> {
        match self {
            TriggerSession::Idle => None,
            TriggerSession::Link { start, .. } | TriggerSession::Command { start, .. } => {
                Some(*start)
            }
        }
    }
}

/// Computes the session after one keystroke produced `text`.
///
/// A collapsed session re-evaluates the same text from `Idle`, so deleting
/// one opener and typing another in one edit still starts a session.
pub fn scan(session: &TriggerSession, text: &str) -> TriggerSession {
    let continued = match session {
        TriggerSession::Idle => None,
        TriggerSession::Link { start, .. } => continue_link(*start, text),
        TriggerSession::Command { start, .. } => continue_command(*start, text),
    };
    continued.unwrap_or_else(|| detect_opener(text))
}

/// Returns `Idle`; used for explicit cancel (Escape).
pub fn cancel(_session: &TriggerSession) -> TriggerSession {
    TriggerSession::Idle
}

fn detect_opener(text: &str) -> TriggerSession {
    if text.ends_with(LINK_OPENER) {
        return TriggerSession::Link {
            start: text.len() - LINK_OPENER.len(),
            query: String::new(),
        };
    }

    if text.ends_with(COMMAND_OPENER) {
        let start = text.len() - COMMAND_OPENER.len_utf8();
        let at_word_start = text[..start]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        if at_word_start {
            return TriggerSession::Command {
                start,
                query: String::new(),
            };
        }
    }

    TriggerSession::Idle
}

fn continue_link(start: usize, text: &str) -> Option<TriggerSession> {
    if text.get(start..start + LINK_OPENER.len())? != LINK_OPENER {
        return None;
    }
    let query = &text[start + LINK_OPENER.len()..];
    if query.contains(LINK_CLOSER) {
        return None;
    }
    Some(TriggerSession::Link {
        start,
        query: query.to_string(),
    })
}

fn continue_command(start: usize, text: &str) -> Option<TriggerSession> {
    let opener_end = start + COMMAND_OPENER.len_utf8();
    if !text.get(start..opener_end)?.starts_with(COMMAND_OPENER) {
        return None;
    }
    let query = &text[opener_end..];
    if query.chars().any(char::is_whitespace) {
        return None;
    }
    Some(TriggerSession::Command {
        start,
        query: query.to_string(),
    })
}

/// Extracts the distinct, trimmed, non-empty titles of every completed link.
pub fn extract_linked_titles(text: &str) -> BTreeSet<String> {
    LINK_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .collect()
}

/// Formats the canonical link syntax for a title.
pub fn link_syntax(title: &str) -> String {
    format!("{LINK_OPENER}{title}{LINK_CLOSER}")
}

/// Case-insensitive substring filter over existing page titles.
pub fn filter_page_titles<'a>(query: &str, titles: &'a [String]) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    titles
        .iter()
        .map(String::as_str)
        .filter(|title| title.to_lowercase().contains(&needle))
        .collect()
}

/// Returns the title for the implicit "create page" affordance.
///
/// `Some` only when the trimmed query is non-empty and no existing title
/// matches it exactly (ignoring case).
pub fn link_create_candidate(query: &str, titles: &[String]) -> Option<String> {
    let candidate = query.trim();
    if candidate.is_empty() {
        return None;
    }
    if find_existing_title(candidate, titles).is_some() {
        return None;
    }
    Some(candidate.to_string())
}

/// Existing title equal to `query` ignoring case, if any.
pub fn find_existing_title<'a>(query: &str, titles: &'a [String]) -> Option<&'a str> {
    let lowered = query.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    titles
        .iter()
        .find(|title| title.to_lowercase() == lowered)
        .map(String::as_str)
}
