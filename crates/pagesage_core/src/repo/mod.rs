//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the index store.
//! - Isolate SQLite query details from service orchestration.
//! - Make every multi-statement logical mutation atomic.
//!
//! # Invariants
//! - Uniqueness collisions surface as `WriteOutcome::Duplicate`, never as
//!   errors.
//! - Repository constructors reject connections missing required schema.

use crate::db::DbError;
use rusqlite::{Connection, ErrorCode};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod book_repo;
pub mod property_repo;
pub mod reference_repo;
pub mod settings_repo;
pub mod term_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted index data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "index repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "index repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Outcome of one logical mutation.
///
/// Validation failures are reported through `Err`; everything that is a
/// legitimate "nothing to do" answer is reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The mutation changed the store.
    Applied,
    /// The write collided with an existing unique row; nothing changed.
    Duplicate,
    /// The targeted record does not exist; nothing changed.
    NotFound,
}

impl WriteOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }

    pub(crate) fn from_changed(changed: usize) -> Self {
        if changed > 0 {
            Self::Applied
        } else {
            Self::NotFound
        }
    }
}

/// Returns whether `err` is a UNIQUE / PRIMARY KEY collision.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

/// Maps a write result to `Duplicate` on uniqueness collision.
pub(crate) fn unique_or_err(result: rusqlite::Result<usize>) -> RepoResult<WriteOutcome> {
    match result {
        Ok(changed) => Ok(WriteOutcome::from_changed(changed)),
        Err(err) if is_unique_violation(&err) => Ok(WriteOutcome::Duplicate),
        Err(err) => Err(err.into()),
    }
}

/// Verifies that `table` exists and has every column in `columns`.
pub(crate) fn ensure_table(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }
    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Converts a stored integer into a positive page/book number.
pub(crate) fn positive_u32(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|number| *number > 0)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid value `{value}` in {column}")))
}
