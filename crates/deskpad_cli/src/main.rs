//! Command-line outline printer.
//!
//! # Responsibility
//! - Open a Deskpad database and print one existing page as an indented
//!   outline. A missing page is an error; nothing is written.
//! - Optionally list the calendar events synthesized from notes.
//!
//! Usage: `deskpad_cli <db-path> <page-title> [--events]`

use deskpad_core::outline::to_forest;
use deskpad_core::{
    core_version, open_db, Note, NoteKind, OutlineNode, PageRepository, SqliteCalendarRepository,
    SqlitePageRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (Some(db_path), Some(title)) = (args.first(), args.get(1)) else {
        eprintln!("deskpad_cli {}", core_version());
        eprintln!("usage: deskpad_cli <db-path> <page-title> [--events]");
        return ExitCode::from(2);
    };
    let with_events = args.iter().skip(2).any(|arg| arg == "--events");

    match run(db_path, title, with_events) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: &str, title: &str, with_events: bool) -> Result<(), Box<dyn Error>> {
    let conn = open_db(db_path)?;
    let pages = SqlitePageRepository::try_new(&conn)?;
    let Some(page) = pages.find_page_by_title(title)? else {
        return Err(format!("no page titled `{}`", title.trim()).into());
    };

    println!("# {}", page.title);
    for node in to_forest(&page.notes) {
        print_node(&node, 0);
    }

    if with_events {
        let calendar = SqliteCalendarRepository::try_new(&conn)?;
        println!();
        for event in calendar.list_events()? {
            println!(
                "{} - {}  [{}] {}",
                event.start.format("%Y-%m-%d %H:%M"),
                event.end.format("%H:%M"),
                event.kind,
                event.title
            );
        }
    }
    Ok(())
}

fn print_node(node: &OutlineNode, level: usize) {
    println!("{}- {}", "  ".repeat(level), render_note(&node.note));
    for child in &node.children {
        print_node(child, level + 1);
    }
}

fn render_note(note: &Note) -> String {
    let checkbox = match (note.kind.is_checkable(), note.done) {
        (true, true) => "[x] ",
        (true, false) => "[ ] ",
        (false, _) => "",
    };
    if note.kind.is_checkable() || note.kind == NoteKind::Plain {
        format!("{checkbox}{}", note.text)
    } else {
        format!("({}) {}", note.kind, note.text)
    }
}
