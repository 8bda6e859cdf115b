//! Term repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Case-insensitive term lookup and create-on-first-use.
//! - Note storage and orphan-term cleanup.
//!
//! # Invariants
//! - Lookups go through `term_key`, never through the display name.
//! - A note cleared to empty on a term without references deletes the term
//!   in the same transaction.

use crate::model::entry::NoteEntry;
use crate::model::term::{term_key, Term, TermEnrichment, TermId};
use crate::repo::{ensure_table, RepoError, RepoResult, WriteOutcome};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const TERM_SELECT_SQL: &str = "SELECT
    id,
    term,
    note,
    ai_description,
    ai_flagged,
    ai_enriched_at,
    created_at
FROM terms";

/// Repository interface for term lifecycle and notes.
pub trait TermRepository {
    /// Loads one term by any casing of its name.
    fn find_term(&self, name: &str) -> RepoResult<Option<Term>>;
    /// Returns the id of the named term, creating it when absent.
    fn upsert_term(&self, name: &str) -> RepoResult<TermId>;
    /// Stores `note` on the named term.
    ///
    /// A non-empty note creates the term when absent. An empty note on a
    /// missing term is `NotFound`.
    fn set_note(&self, name: &str, note: &str) -> RepoResult<WriteOutcome>;
    /// Lists terms with a non-empty note, ordered case-insensitively.
    fn list_with_notes(&self) -> RepoResult<Vec<NoteEntry>>;
    /// Replaces the opaque enrichment fields of an existing term.
    fn set_enrichment(&self, name: &str, enrichment: &TermEnrichment)
        -> RepoResult<WriteOutcome>;
    /// Deletes every term with no references and an empty note.
    fn purge_orphans(&self) -> RepoResult<usize>;
    /// Deletes every term and reference. Books, settings and properties stay.
    fn clear_all(&self) -> RepoResult<()>;
}

/// SQLite-backed term repository.
pub struct SqliteTermRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTermRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(
            conn,
            "terms",
            &["id", "term", "term_key", "note", "ai_description", "ai_flagged"],
        )?;
        Ok(Self { conn })
    }
}

impl TermRepository for SqliteTermRepository<'_> {
    fn find_term(&self, name: &str) -> RepoResult<Option<Term>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TERM_SELECT_SQL} WHERE term_key = ?1;"))?;
        let mut rows = stmt.query([term_key(name)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_term_row(row)?));
        }
        Ok(None)
    }

    fn upsert_term(&self, name: &str) -> RepoResult<TermId> {
        upsert_term_id(self.conn, name)
    }

    fn set_note(&self, name: &str, note: &str) -> RepoResult<WriteOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let outcome = if note.is_empty() {
            let key = term_key(name);
            let changed = tx.execute(
                "UPDATE terms SET note = '' WHERE term_key = ?1;",
                [key.as_str()],
            )?;
            delete_term_if_orphan(&tx, &key)?;
            WriteOutcome::from_changed(changed)
        } else {
            let term_id = upsert_term_id(&tx, name)?;
            tx.execute(
                "UPDATE terms SET note = ?2 WHERE id = ?1;",
                params![term_id, note],
            )?;
            WriteOutcome::Applied
        };
        tx.commit()?;
        Ok(outcome)
    }

    fn list_with_notes(&self) -> RepoResult<Vec<NoteEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT term, note
             FROM terms
             WHERE note != ''
             ORDER BY term_key ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(NoteEntry {
                term: row.get("term")?,
                note: row.get("note")?,
            });
        }
        Ok(notes)
    }

    fn set_enrichment(
        &self,
        name: &str,
        enrichment: &TermEnrichment,
    ) -> RepoResult<WriteOutcome> {
        let changed = self.conn.execute(
            "UPDATE terms
             SET
                ai_description = ?2,
                ai_flagged = ?3,
                ai_enriched_at = ?4
             WHERE term_key = ?1;",
            params![
                term_key(name),
                enrichment.description.as_deref(),
                enrichment.flagged,
                enrichment.enriched_at,
            ],
        )?;
        Ok(WriteOutcome::from_changed(changed))
    }

    fn purge_orphans(&self) -> RepoResult<usize> {
        purge_orphan_terms(self.conn)
    }

    fn clear_all(&self) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM page_references;", [])?;
        tx.execute("DELETE FROM terms;", [])?;
        tx.commit()?;
        Ok(())
    }
}

/// Resolves a term id by case-folded name.
pub(crate) fn find_term_id(conn: &Connection, name: &str) -> RepoResult<Option<TermId>> {
    let id = conn
        .query_row(
            "SELECT id FROM terms WHERE term_key = ?1;",
            [term_key(name)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Resolves a term id, inserting the term with its given casing when absent.
pub(crate) fn upsert_term_id(conn: &Connection, name: &str) -> RepoResult<TermId> {
    let display = name.trim();
    let key = term_key(display);
    conn.execute(
        "INSERT INTO terms (term, term_key) VALUES (?1, ?2)
         ON CONFLICT(term_key) DO NOTHING;",
        params![display, key.as_str()],
    )?;
    let id = conn.query_row(
        "SELECT id FROM terms WHERE term_key = ?1;",
        [key.as_str()],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Deletes all terms that have no references and an empty note.
pub(crate) fn purge_orphan_terms(conn: &Connection) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM terms
         WHERE note = ''
           AND NOT EXISTS (
               SELECT 1 FROM page_references r WHERE r.term_id = terms.id
           );",
        [],
    )?;
    Ok(removed)
}

fn delete_term_if_orphan(conn: &Connection, key: &str) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM terms
         WHERE term_key = ?1
           AND note = ''
           AND NOT EXISTS (
               SELECT 1 FROM page_references r WHERE r.term_id = terms.id
           );",
        [key],
    )?;
    Ok(removed)
}

fn parse_term_row(row: &Row<'_>) -> RepoResult<Term> {
    let flagged = match row.get::<_, i64>("ai_flagged")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid ai_flagged value `{other}` in terms.ai_flagged"
            )));
        }
    };

    Ok(Term {
        id: row.get("id")?,
        name: row.get("term")?,
        note: row.get("note")?,
        enrichment: TermEnrichment {
            description: row.get("ai_description")?,
            flagged,
            enriched_at: row.get("ai_enriched_at")?,
        },
        created_at: row.get("created_at")?,
    })
}
