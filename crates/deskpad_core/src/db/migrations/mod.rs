//! Deskpad schema history.
//!
//! Each entry upgrades the page store by one version; a database opened by
//! this binary is walked forward from its `PRAGMA user_version` to the
//! newest entry inside a single transaction, so a failed step leaves the
//! file at its previous version.
//!
//! # Schema
//! - v1: `pages` (titles unique ignoring ASCII case) and `notes` (flat
//!   outline rows keyed by `sort_order`, parent ids allowed to dangle).
//! - v2: `calendar_events`, unique per source note back-reference.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        sql: include_str!("0001_outline.sql"),
    },
    SchemaStep {
        version: 2,
        sql: include_str!("0002_calendar_events.sql"),
    },
];

/// Schema version the page and calendar repositories expect.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Upgrades the page store to `latest_version()`.
///
/// Returns how many schema steps ran. A database written by a newer
/// binary is refused untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let from_version = stored_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        from_version,
        latest,
        pending.len()
    );
    Ok(pending.len())
}

fn stored_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}
