//! Book and gap-exclusion use-case service.
//!
//! # Responsibility
//! - Validate book input and delegate book CRUD with cascade semantics.
//! - Manage per-book gap exclusions from page-range text.
//!
//! # Invariants
//! - Book numbers and names are trimmed and never blank. Numeric book numbers
//!   are stored without leading zeros, so `"01"` and `"1"` name one book.
//! - Page counts written through this service lie in `0..=MAX_PAGE_COUNT`.

use crate::model::book::{Book, BookUsage, GapExclusion, MAX_PAGE_COUNT};
use crate::model::reference::parse_page_range;
use crate::repo::book_repo::BookRepository;
use crate::repo::WriteOutcome;
use crate::service::{
    canonical_book_number, normalize_book_number, IndexServiceError, ServiceResult,
};
use log::info;

/// Book service facade over repository implementations.
pub struct BookService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a book. `Duplicate` when the number is taken.
    pub fn add_book(
        &self,
        book_number: &str,
        name: &str,
        page_count: Option<i64>,
    ) -> ServiceResult<WriteOutcome> {
        let book = validated_book(book_number, name, page_count)?;
        let outcome = self.repo.add_book(&book)?;
        info!(
            "event=book_add module=service status=ok outcome={:?} book={}",
            outcome, book.book_number
        );
        Ok(outcome)
    }

    pub fn get_book(&self, book_number: &str) -> ServiceResult<Option<Book>> {
        Ok(self.repo.get_book(&canonical_book_number(book_number))?)
    }

    /// All books, numerically ordered by book number.
    pub fn list_books(&self) -> ServiceResult<Vec<Book>> {
        Ok(self.repo.list_books()?)
    }

    /// Replaces the book stored under `old_number`.
    ///
    /// Renumbering moves the book's exclusions and properties along, and its
    /// references when both numbers are integers.
    pub fn update_book(
        &self,
        old_number: &str,
        book_number: &str,
        name: &str,
        page_count: Option<i64>,
    ) -> ServiceResult<WriteOutcome> {
        let old_number = normalize_book_number(old_number)?;
        let book = validated_book(book_number, name, page_count)?;
        let outcome = self.repo.update_book(&old_number, &book)?;
        info!(
            "event=book_update module=service status=ok outcome={:?} old_book={} book={}",
            outcome, old_number, book.book_number
        );
        Ok(outcome)
    }

    /// Reference and exclusion counts attached to a book number, e.g. for a
    /// delete confirmation.
    pub fn book_usage(&self, book_number: &str) -> ServiceResult<BookUsage> {
        Ok(self.repo.book_usage(&canonical_book_number(book_number))?)
    }

    /// Deletes a book with its references, exclusions, book-scoped
    /// properties and newly orphaned terms.
    pub fn delete_book(&self, book_number: &str) -> ServiceResult<WriteOutcome> {
        let book_number = normalize_book_number(book_number)?;
        let outcome = self.repo.delete_book(&book_number)?;
        info!(
            "event=book_delete module=service status=ok outcome={:?} book={}",
            outcome, book_number
        );
        Ok(outcome)
    }

    /// Marks pages (`"10"` or `"10-15"`) as intentionally not indexed.
    pub fn add_exclusion(&self, book_number: &str, pages: &str) -> ServiceResult<WriteOutcome> {
        let book_number = normalize_book_number(book_number)?;
        let range = parse_page_range(pages)?;
        let outcome = self.repo.add_exclusion(&book_number, range)?;
        info!(
            "event=exclusion_add module=service status=ok outcome={:?} book={} pages={}",
            outcome, book_number, range
        );
        Ok(outcome)
    }

    /// Removes an exclusion matching the exact page range.
    pub fn remove_exclusion(
        &self,
        book_number: &str,
        pages: &str,
    ) -> ServiceResult<WriteOutcome> {
        let book_number = normalize_book_number(book_number)?;
        let range = parse_page_range(pages)?;
        let outcome = self.repo.remove_exclusion(&book_number, range)?;
        info!(
            "event=exclusion_remove module=service status=ok outcome={:?} book={} pages={}",
            outcome, book_number, range
        );
        Ok(outcome)
    }

    pub fn list_exclusions(&self, book_number: &str) -> ServiceResult<Vec<GapExclusion>> {
        Ok(self.repo.list_exclusions(&canonical_book_number(book_number))?)
    }
}

fn validated_book(book_number: &str, name: &str, page_count: Option<i64>) -> ServiceResult<Book> {
    let book_number = normalize_book_number(book_number)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(IndexServiceError::InvalidInput(
            "book name must not be blank".to_string(),
        ));
    }
    if let Some(count) = page_count.filter(|count| !(0..=MAX_PAGE_COUNT).contains(count)) {
        return Err(IndexServiceError::InvalidInput(format!(
            "page count must be between 0 and {MAX_PAGE_COUNT}, got {count}"
        )));
    }
    Ok(Book {
        book_number,
        name: name.to_string(),
        page_count,
    })
}
