//! Book and gap-exclusion repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Book registry with cascading delete and renumbering.
//! - Per-book gap exclusions.
//!
//! # Invariants
//! - Deleting a book removes its references, exclusions, book-scoped
//!   properties and any term left orphaned, in one transaction.
//! - Books are listed numerically by book number, then textually.

use crate::model::book::{Book, BookUsage, GapExclusion};
use crate::model::reference::PageRange;
use crate::repo::term_repo::purge_orphan_terms;
use crate::repo::{
    ensure_table, is_unique_violation, positive_u32, unique_or_err, RepoError, RepoResult,
    WriteOutcome,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for books and gap exclusions.
pub trait BookRepository {
    fn add_book(&self, book: &Book) -> RepoResult<WriteOutcome>;
    fn get_book(&self, book_number: &str) -> RepoResult<Option<Book>>;
    fn list_books(&self) -> RepoResult<Vec<Book>>;
    /// Replaces the book stored under `old_number`, re-keying everything
    /// that points at the old number.
    fn update_book(&self, old_number: &str, book: &Book) -> RepoResult<WriteOutcome>;
    fn book_usage(&self, book_number: &str) -> RepoResult<BookUsage>;
    /// Deletes the book and cascades to everything keyed by its number.
    fn delete_book(&self, book_number: &str) -> RepoResult<WriteOutcome>;
    fn add_exclusion(&self, book_number: &str, range: PageRange) -> RepoResult<WriteOutcome>;
    fn remove_exclusion(&self, book_number: &str, range: PageRange)
        -> RepoResult<WriteOutcome>;
    /// Exclusions of one book ordered by start page.
    fn list_exclusions(&self, book_number: &str) -> RepoResult<Vec<GapExclusion>>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "books", &["book_number", "book_name", "page_count"])?;
        ensure_table(
            conn,
            "gap_exclusions",
            &["id", "book_number", "page_start", "page_end"],
        )?;
        ensure_table(conn, "book_custom_properties", &["book_number"])?;
        ensure_table(conn, "page_references", &["term_id", "book_number"])?;
        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn add_book(&self, book: &Book) -> RepoResult<WriteOutcome> {
        let inserted = self.conn.execute(
            "INSERT INTO books (book_number, book_name, page_count) VALUES (?1, ?2, ?3);",
            params![book.book_number, book.name, book.page_count],
        );
        unique_or_err(inserted)
    }

    fn get_book(&self, book_number: &str) -> RepoResult<Option<Book>> {
        let mut stmt = self.conn.prepare(
            "SELECT book_number, book_name, page_count FROM books WHERE book_number = ?1;",
        )?;
        let mut rows = stmt.query([book_number])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_book_row(row)?));
        }
        Ok(None)
    }

    fn list_books(&self) -> RepoResult<Vec<Book>> {
        let mut stmt = self.conn.prepare(
            "SELECT book_number, book_name, page_count
             FROM books
             ORDER BY CAST(book_number AS INTEGER) ASC, book_number ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut books = Vec::new();
        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }
        Ok(books)
    }

    fn update_book(&self, old_number: &str, book: &Book) -> RepoResult<WriteOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let updated = tx.execute(
            "UPDATE books
             SET book_number = ?2, book_name = ?3, page_count = ?4
             WHERE book_number = ?1;",
            params![old_number, book.book_number, book.name, book.page_count],
        );
        match unique_or_err(updated)? {
            WriteOutcome::Applied => {}
            other => return Ok(other),
        }

        if old_number != book.book_number {
            if let Err(err) = rekey_book(&tx, old_number, &book.book_number) {
                // Dropping `tx` undoes the book row update too.
                if is_unique_violation(&err) {
                    return Ok(WriteOutcome::Duplicate);
                }
                return Err(err.into());
            }
        }

        tx.commit()?;
        Ok(WriteOutcome::Applied)
    }

    fn book_usage(&self, book_number: &str) -> RepoResult<BookUsage> {
        let reference_count: i64 = match reference_book_number(book_number) {
            Some(number) => self.conn.query_row(
                "SELECT COUNT(*) FROM page_references WHERE book_number = ?1;",
                [number],
                |row| row.get(0),
            )?,
            None => 0,
        };
        let exclusion_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM gap_exclusions WHERE book_number = ?1;",
            [book_number],
            |row| row.get(0),
        )?;
        Ok(BookUsage {
            reference_count: reference_count.unsigned_abs(),
            exclusion_count: exclusion_count.unsigned_abs(),
        })
    }

    fn delete_book(&self, book_number: &str) -> RepoResult<WriteOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM books WHERE book_number = ?1);",
            [book_number],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(WriteOutcome::NotFound);
        }

        if let Some(number) = reference_book_number(book_number) {
            tx.execute(
                "DELETE FROM page_references WHERE book_number = ?1;",
                [number],
            )?;
        }
        tx.execute(
            "DELETE FROM gap_exclusions WHERE book_number = ?1;",
            [book_number],
        )?;
        tx.execute(
            "DELETE FROM book_custom_properties WHERE book_number = ?1;",
            [book_number],
        )?;
        purge_orphan_terms(&tx)?;
        let deleted = tx.execute("DELETE FROM books WHERE book_number = ?1;", [book_number])?;
        tx.commit()?;
        Ok(WriteOutcome::from_changed(deleted))
    }

    fn add_exclusion(&self, book_number: &str, range: PageRange) -> RepoResult<WriteOutcome> {
        let inserted = self.conn.execute(
            "INSERT INTO gap_exclusions (book_number, page_start, page_end) VALUES (?1, ?2, ?3);",
            params![book_number, range.start, range.end],
        );
        unique_or_err(inserted)
    }

    fn remove_exclusion(
        &self,
        book_number: &str,
        range: PageRange,
    ) -> RepoResult<WriteOutcome> {
        let deleted = self.conn.execute(
            "DELETE FROM gap_exclusions
             WHERE book_number = ?1 AND page_start = ?2 AND page_end = ?3;",
            params![book_number, range.start, range.end],
        )?;
        Ok(WriteOutcome::from_changed(deleted))
    }

    fn list_exclusions(&self, book_number: &str) -> RepoResult<Vec<GapExclusion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, book_number, page_start, page_end
             FROM gap_exclusions
             WHERE book_number = ?1
             ORDER BY page_start ASC, page_end ASC;",
        )?;
        let mut rows = stmt.query([book_number])?;
        let mut exclusions = Vec::new();
        while let Some(row) = rows.next()? {
            let start = positive_u32(row.get("page_start")?, "gap_exclusions.page_start")?;
            let end = positive_u32(row.get("page_end")?, "gap_exclusions.page_end")?;
            let range = PageRange::new(start, end).map_err(|err| {
                RepoError::InvalidData(format!("invalid stored exclusion: {err}"))
            })?;
            exclusions.push(GapExclusion {
                id: row.get("id")?,
                book_number: row.get("book_number")?,
                range,
            });
        }
        Ok(exclusions)
    }
}

/// Points every book-keyed row at `new_number`.
fn rekey_book(conn: &Connection, old_number: &str, new_number: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE gap_exclusions SET book_number = ?2 WHERE book_number = ?1;",
        [old_number, new_number],
    )?;
    conn.execute(
        "UPDATE book_custom_properties SET book_number = ?2 WHERE book_number = ?1;",
        [old_number, new_number],
    )?;
    if let (Some(old), Some(new)) = (
        reference_book_number(old_number),
        reference_book_number(new_number),
    ) {
        conn.execute(
            "UPDATE page_references SET book_number = ?2 WHERE book_number = ?1;",
            [old, new],
        )?;
    }
    Ok(())
}

/// Integer book number used by reference rows, when the book has one.
fn reference_book_number(book_number: &str) -> Option<u32> {
    book_number.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    Ok(Book {
        book_number: row.get("book_number")?,
        name: row.get("book_name")?,
        page_count: row.get("page_count")?,
    })
}
