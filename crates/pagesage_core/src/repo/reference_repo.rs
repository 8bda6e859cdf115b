//! Page reference repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Insert/delete/update references with set semantics per term.
//! - Retract gap exclusions covered by a newly placed reference.
//! - Provide ordered listing and per-book scans for analysis.
//!
//! # Invariants
//! - `(term, book, page_start, page_end)` is unique; NULL end equals NULL end.
//! - Reference removal always runs orphan-term cleanup in the same
//!   transaction.
//! - A failed insert leaves exclusions untouched.

use crate::model::entry::{IndexEntry, RecentReference};
use crate::model::reference::PageRef;
use crate::model::term::term_key;
use crate::repo::term_repo::{find_term_id, purge_orphan_terms, upsert_term_id};
use crate::repo::{
    ensure_table, is_unique_violation, positive_u32, RepoError, RepoResult, WriteOutcome,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for page references.
pub trait ReferenceRepository {
    /// Adds `reference` to the named term, creating the term when needed.
    fn insert_reference(&self, term: &str, reference: &PageRef) -> RepoResult<WriteOutcome>;
    /// Deletes one exact reference, or every reference of the term when
    /// `reference` is `None`.
    fn delete_references(&self, term: &str, reference: Option<&PageRef>)
        -> RepoResult<WriteOutcome>;
    /// Rewrites one exact reference of the term to `new`.
    fn update_reference(&self, term: &str, old: &PageRef, new: &PageRef)
        -> RepoResult<WriteOutcome>;
    /// Lists terms with at least one reference, optionally filtered by a
    /// case-insensitive name substring.
    fn list_entries(&self, name_filter: Option<&str>) -> RepoResult<Vec<IndexEntry>>;
    /// Lists reference rows, newest insertion first.
    fn recent(&self, limit: u32) -> RepoResult<Vec<RecentReference>>;
    /// Every reference placed on `book`, ordered by start page.
    fn references_for_book(&self, book: u32) -> RepoResult<Vec<PageRef>>;
    /// Number of distinct terms with at least one reference on `book`.
    fn distinct_term_count(&self, book: u32) -> RepoResult<u64>;
}

/// SQLite-backed reference repository.
pub struct SqliteReferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReferenceRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "terms", &["id", "term", "term_key", "note"])?;
        ensure_table(
            conn,
            "page_references",
            &["id", "term_id", "book_number", "page_start", "page_end"],
        )?;
        ensure_table(
            conn,
            "gap_exclusions",
            &["book_number", "page_start", "page_end"],
        )?;
        Ok(Self { conn })
    }
}

impl ReferenceRepository for SqliteReferenceRepository<'_> {
    fn insert_reference(&self, term: &str, reference: &PageRef) -> RepoResult<WriteOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let term_id = upsert_term_id(&tx, term)?;

        let inserted = tx.execute(
            "INSERT INTO page_references (term_id, book_number, page_start, page_end)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                term_id,
                reference.book,
                reference.page_start,
                reference.page_end
            ],
        );
        if let Err(err) = inserted {
            // Dropping `tx` rolls back the term insert as well.
            if is_unique_violation(&err) {
                return Ok(WriteOutcome::Duplicate);
            }
            return Err(err.into());
        }

        retract_exclusions(&tx, reference)?;
        tx.commit()?;
        Ok(WriteOutcome::Applied)
    }

    fn delete_references(
        &self,
        term: &str,
        reference: Option<&PageRef>,
    ) -> RepoResult<WriteOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(term_id) = find_term_id(&tx, term)? else {
            return Ok(WriteOutcome::NotFound);
        };

        let deleted = match reference {
            Some(reference) => tx.execute(
                "DELETE FROM page_references
                 WHERE term_id = ?1
                   AND book_number = ?2
                   AND page_start = ?3
                   AND page_end IS ?4;",
                params![
                    term_id,
                    reference.book,
                    reference.page_start,
                    reference.page_end
                ],
            )?,
            None => tx.execute(
                "DELETE FROM page_references WHERE term_id = ?1;",
                [term_id],
            )?,
        };

        purge_orphan_terms(&tx)?;
        tx.commit()?;
        Ok(WriteOutcome::from_changed(deleted))
    }

    fn update_reference(
        &self,
        term: &str,
        old: &PageRef,
        new: &PageRef,
    ) -> RepoResult<WriteOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(term_id) = find_term_id(&tx, term)? else {
            return Ok(WriteOutcome::NotFound);
        };

        let updated = tx.execute(
            "UPDATE page_references
             SET book_number = ?5, page_start = ?6, page_end = ?7
             WHERE term_id = ?1
               AND book_number = ?2
               AND page_start = ?3
               AND page_end IS ?4;",
            params![
                term_id,
                old.book,
                old.page_start,
                old.page_end,
                new.book,
                new.page_start,
                new.page_end
            ],
        );
        let changed = match updated {
            Ok(changed) => changed,
            Err(err) if is_unique_violation(&err) => return Ok(WriteOutcome::Duplicate),
            Err(err) => return Err(err.into()),
        };
        if changed == 0 {
            return Ok(WriteOutcome::NotFound);
        }

        retract_exclusions(&tx, new)?;
        tx.commit()?;
        Ok(WriteOutcome::Applied)
    }

    fn list_entries(&self, name_filter: Option<&str>) -> RepoResult<Vec<IndexEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id AS term_id, t.term AS term, r.book_number, r.page_start, r.page_end
             FROM terms t
             INNER JOIN page_references r ON r.term_id = t.id
             WHERE (?1 IS NULL OR instr(t.term_key, ?1) > 0)
             ORDER BY t.term_key ASC, t.id ASC, r.book_number ASC, r.page_start ASC,
                      COALESCE(r.page_end, r.page_start) ASC;",
        )?;
        let filter_key = name_filter.map(term_key);
        let mut rows = stmt.query([filter_key])?;

        let mut entries: Vec<IndexEntry> = Vec::new();
        let mut current_term_id: Option<i64> = None;
        while let Some(row) = rows.next()? {
            let term_id: i64 = row.get("term_id")?;
            let reference = parse_reference_row(row)?.to_string();
            match entries.last_mut() {
                Some(entry) if current_term_id == Some(term_id) => {
                    entry.references.push(reference);
                }
                _ => {
                    current_term_id = Some(term_id);
                    entries.push(IndexEntry {
                        term: row.get("term")?,
                        references: vec![reference],
                    });
                }
            }
        }

        Ok(entries)
    }

    fn recent(&self, limit: u32) -> RepoResult<Vec<RecentReference>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id AS id, t.term AS term, r.book_number, r.page_start, r.page_end
             FROM page_references r
             INNER JOIN terms t ON t.id = r.term_id
             ORDER BY r.id DESC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut recent = Vec::new();
        while let Some(row) = rows.next()? {
            recent.push(RecentReference {
                term: row.get("term")?,
                reference: parse_reference_row(row)?.to_string(),
                reference_id: row.get("id")?,
            });
        }
        Ok(recent)
    }

    fn references_for_book(&self, book: u32) -> RepoResult<Vec<PageRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT book_number, page_start, page_end
             FROM page_references
             WHERE book_number = ?1
             ORDER BY page_start ASC, COALESCE(page_end, page_start) ASC;",
        )?;
        let mut rows = stmt.query([book])?;
        let mut references = Vec::new();
        while let Some(row) = rows.next()? {
            references.push(parse_reference_row(row)?);
        }
        Ok(references)
    }

    fn distinct_term_count(&self, book: u32) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT term_id) FROM page_references WHERE book_number = ?1;",
            [book],
            |row| row.get(0),
        )?;
        Ok(count.unsigned_abs())
    }
}

/// Deletes every exclusion row on the reference's book that shares a page
/// with the reference.
fn retract_exclusions(conn: &Connection, reference: &PageRef) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM gap_exclusions
         WHERE book_number = ?1
           AND page_start <= ?3
           AND page_end >= ?2;",
        params![
            reference.book.to_string(),
            reference.page_start,
            reference.last_page()
        ],
    )?;
    Ok(removed)
}

fn parse_reference_row(row: &Row<'_>) -> RepoResult<PageRef> {
    let book = positive_u32(row.get("book_number")?, "page_references.book_number")?;
    let page_start = positive_u32(row.get("page_start")?, "page_references.page_start")?;
    let page_end = match row.get::<_, Option<i64>>("page_end")? {
        Some(value) => Some(positive_u32(value, "page_references.page_end")?),
        None => None,
    };
    PageRef::new(book, page_start, page_end)
        .map_err(|err| RepoError::InvalidData(format!("invalid stored reference: {err}")))
}
