//! Page repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load and save one page's flat outline as an ordered set of rows.
//! - Create pages by title on demand for link resolution.
//!
//! # Invariants
//! - `sort_order` mirrors flat order; loads return notes in that order.
//! - A save replaces the page's note rows atomically.
//! - `linked_page_titles` is never stored; loads recompute it from text.
//! - Titles are unique; lookups match the trimmed title exactly.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::note::{Note, NoteKind};
use crate::model::page::{Page, PageId};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

/// Persistence collaborator for pages.
pub trait PageRepository {
    /// Loads one page with its outline.
    fn load_page(&self, page_id: PageId) -> RepoResult<Page>;
    /// Looks up a page by title, ignoring ASCII case.
    fn find_page_by_title(&self, title: &str) -> RepoResult<Option<Page>>;
    /// Persists the page row and replaces its notes.
    fn save_page(&self, page: &Page) -> RepoResult<()>;
    /// Returns the page with `title`, creating a seeded page when absent.
    fn ensure_page(&self, title: &str) -> RepoResult<Page>;
    /// Lists all page titles in ascending order.
    fn list_page_titles(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed page repository.
pub struct SqlitePageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePageRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["pages", "notes"])?;
        Ok(Self { conn })
    }

    fn load_notes(&self, page_id: PageId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT note_uuid, parent_uuid, depth, kind, text, done, created_at
             FROM notes
             WHERE page_uuid = ?1
             ORDER BY sort_order ASC;",
        )?;
        let mut rows = stmt.query([page_id.to_string()])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row, page_id)?);
        }
        Ok(notes)
    }

    fn page_from_row(&self, page_uuid: String, title: String, updated_at: i64) -> RepoResult<Page> {
        let id = parse_uuid(&page_uuid, "pages.page_uuid")?;
        let mut notes = self.load_notes(id)?;
        if notes.is_empty() {
            notes.push(Note::new(id, ""));
        }
        Ok(Page {
            id,
            title,
            notes,
            last_modified_at: updated_at,
        })
    }
}

impl PageRepository for SqlitePageRepository<'_> {
    fn load_page(&self, page_id: PageId) -> RepoResult<Page> {
        let row: Option<(String, String, i64)> = self
            .conn
            .query_row(
                "SELECT page_uuid, title, updated_at FROM pages WHERE page_uuid = ?1;",
                [page_id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let (page_uuid, title, updated_at) = row.ok_or(RepoError::NotFound(page_id))?;
        self.page_from_row(page_uuid, title, updated_at)
    }

    fn find_page_by_title(&self, title: &str) -> RepoResult<Option<Page>> {
        let row: Option<(String, String, i64)> = self
            .conn
            .query_row(
                "SELECT page_uuid, title, updated_at FROM pages WHERE title = ?1 COLLATE NOCASE;",
                [title.trim()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(|(page_uuid, title, updated_at)| self.page_from_row(page_uuid, title, updated_at))
            .transpose()
    }

    fn save_page(&self, page: &Page) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let page_uuid = page.id.to_string();
        tx.execute(
            "INSERT INTO pages (page_uuid, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(page_uuid) DO UPDATE SET
                 title = excluded.title,
                 updated_at = excluded.updated_at;",
            params![page_uuid, page.title, page.last_modified_at],
        )?;
        tx.execute("DELETE FROM notes WHERE page_uuid = ?1;", [&page_uuid])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO notes (
                    note_uuid,
                    page_uuid,
                    parent_uuid,
                    depth,
                    sort_order,
                    kind,
                    text,
                    done,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            )?;
            for (sort_order, note) in page.notes.iter().enumerate() {
                insert.execute(params![
                    note.id.to_string(),
                    page_uuid,
                    note.parent_id.map(|value| value.to_string()),
                    note.depth,
                    sort_order as i64,
                    note.kind.as_str(),
                    note.text,
                    note.done,
                    note.created_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn ensure_page(&self, title: &str) -> RepoResult<Page> {
        let title = title.trim();
        if title.is_empty() {
            return Err(RepoError::InvalidTitle);
        }
        if let Some(page) = self.find_page_by_title(title)? {
            return Ok(page);
        }

        let page = Page::new(title);
        self.save_page(&page)?;
        info!(
            "event=page_ensure module=repo status=created page_id={} title_len={}",
            page.id,
            title.chars().count()
        );
        Ok(page)
    }

    fn list_page_titles(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title FROM pages ORDER BY title ASC;")?;
        let titles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(titles)
    }
}

fn parse_note_row(row: &Row<'_>, page_id: PageId) -> RepoResult<Note> {
    let note_uuid: String = row.get(0)?;
    let parent_uuid: Option<String> = row.get(1)?;
    let depth: i64 = row.get(2)?;
    let kind: String = row.get(3)?;
    let text: String = row.get(4)?;
    let done: bool = row.get(5)?;
    let created_at: i64 = row.get(6)?;

    let mut note = Note::with_id(parse_uuid(&note_uuid, "notes.note_uuid")?, page_id, text);
    note.kind = NoteKind::parse(&kind)
        .ok_or_else(|| RepoError::InvalidData(format!("unknown note kind `{kind}`")))?;
    note.done = done;
    note.parent_id = parent_uuid
        .map(|value| parse_uuid(&value, "notes.parent_uuid"))
        .transpose()?;
    note.depth = u32::try_from(depth)
        .map_err(|_| RepoError::InvalidData(format!("invalid note depth {depth}")))?;
    note.created_at = created_at;
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::{PageRepository, SqlitePageRepository};
    use crate::db::open_db_in_memory;
    use crate::model::note::{Note, NoteKind};
    use crate::model::page::Page;
    use crate::repo::RepoError;

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = SqlitePageRepository::try_new(&conn).err().unwrap();
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn save_then_load_restores_outline_and_links() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqlitePageRepository::try_new(&conn).unwrap();

        let mut page = Page::new("Inbox");
        page.notes[0].set_text("see [[Project X]]");
        let mut child = Note::new(page.id, "buy milk");
        child.parent_id = Some(page.notes[0].id);
        child.depth = 1;
        child.set_kind(NoteKind::Shopping);
        child.done = true;
        page.notes.push(child);
        repo.save_page(&page).unwrap();

        let loaded = repo.load_page(page.id).unwrap();
        assert_eq!(loaded, page);
        assert!(loaded.notes[0].linked_page_titles.contains("Project X"));
    }

    #[test]
    fn save_replaces_removed_notes() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqlitePageRepository::try_new(&conn).unwrap();

        let mut page = Page::new("Inbox");
        page.notes.push(Note::new(page.id, "second"));
        repo.save_page(&page).unwrap();
        page.notes.pop();
        repo.save_page(&page).unwrap();

        assert_eq!(repo.load_page(page.id).unwrap().notes.len(), 1);
    }

    #[test]
    fn ensure_page_is_idempotent_and_rejects_blank_titles() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqlitePageRepository::try_new(&conn).unwrap();

        let first = repo.ensure_page("Project X").unwrap();
        let second = repo.ensure_page("  Project X ").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.notes.len(), 1);
        assert!(matches!(repo.ensure_page("   "), Err(RepoError::InvalidTitle)));
        assert_eq!(repo.list_page_titles().unwrap(), vec!["Project X"]);
    }

    #[test]
    fn ensure_page_matches_titles_regardless_of_case() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqlitePageRepository::try_new(&conn).unwrap();

        let existing = repo.ensure_page("Groceries").unwrap();
        let found = repo.ensure_page("groceries").unwrap();
        assert_eq!(found.id, existing.id);
        assert_eq!(found.title, "Groceries");
        assert_eq!(
            repo.find_page_by_title("GROCERIES").unwrap().map(|page| page.id),
            Some(existing.id)
        );
        assert_eq!(repo.list_page_titles().unwrap(), vec!["Groceries"]);
    }
}
