//! Ordered schema migrations for the index store.
//!
//! Each step is a plain SQL script; the applied step is mirrored to
//! `PRAGMA user_version`, so a store opened by an older binary is upgraded in
//! place and a store written by a newer binary is refused.
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one per step.
//! - All pending steps run inside one transaction; a failing step leaves the
//!   store at its previous version.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "terms_and_references",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "books_and_exclusions",
        sql: include_str!("0002_books.sql"),
    },
    Migration {
        version: 3,
        name: "custom_properties",
        sql: include_str!("0003_custom_properties.sql"),
    },
    Migration {
        version: 4,
        name: "term_enrichment",
        sql: include_str!("0004_term_enrichment.sql"),
    },
];

/// Schema version written by the newest migration this binary knows.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the store up to [`latest_version`].
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the store is newer than this
///   binary.
/// - [`DbError::Sqlite`] when a step fails; nothing is applied in that case.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from_version, latest
    );
    Ok(())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, MIGRATIONS};

    #[test]
    fn versions_are_contiguous_from_one() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, index + 1, "{}", migration.name);
        }
        assert_eq!(latest_version() as usize, MIGRATIONS.len());
    }
}
