//! Gap analysis use-case service.
//!
//! # Responsibility
//! - Load a book's references and exclusions and run the pure gap algorithm.
//! - Produce one report per book for the whole-index view.
//!
//! # Invariants
//! - A book without a positive page count reports `([], [], 0)`; it is
//!   still included in the whole-index report.
//! - References are matched to a book through its integer book number.

use crate::analysis::gap::{analyze_pages, render_runs, BookGapReport};
use crate::model::book::Book;
use crate::model::reference::PageRange;
use crate::repo::book_repo::BookRepository;
use crate::repo::reference_repo::ReferenceRepository;
use crate::service::{canonical_book_number, ServiceResult};
use log::debug;
use std::time::Instant;

/// Gap analysis facade over book and reference repositories.
pub struct GapService<B: BookRepository, R: ReferenceRepository> {
    books: B,
    references: R,
}

impl<B: BookRepository, R: ReferenceRepository> GapService<B, R> {
    /// Creates a service using the provided repository implementations.
    pub fn new(books: B, references: R) -> Self {
        Self { books, references }
    }

    /// Analyzes one book; `None` when the book is not registered.
    pub fn analyze_book(&self, book_number: &str) -> ServiceResult<Option<BookGapReport>> {
        match self.books.get_book(&canonical_book_number(book_number))? {
            Some(book) => Ok(Some(self.analyze(&book)?)),
            None => Ok(None),
        }
    }

    /// Analyzes every registered book in book order.
    pub fn analyze_all(&self) -> ServiceResult<Vec<BookGapReport>> {
        let started_at = Instant::now();
        let reports = self
            .books
            .list_books()?
            .iter()
            .map(|book| self.analyze(book))
            .collect::<ServiceResult<Vec<_>>>()?;
        debug!(
            "event=gap_analysis module=service status=ok books={} duration_ms={}",
            reports.len(),
            started_at.elapsed().as_millis()
        );
        Ok(reports)
    }

    fn analyze(&self, book: &Book) -> ServiceResult<BookGapReport> {
        let mut report = BookGapReport {
            book_number: book.book_number.clone(),
            book_name: book.name.clone(),
            page_count: book.page_count,
            gaps: Vec::new(),
            excluded: Vec::new(),
            term_count: 0,
        };
        let Some(page_count) = book.usable_page_count() else {
            return Ok(report);
        };

        let (covered, term_count) = match book.reference_number() {
            Some(number) => {
                let covered: Vec<PageRange> = self
                    .references
                    .references_for_book(number)?
                    .iter()
                    .map(|reference| reference.page_range())
                    .collect();
                (covered, self.references.distinct_term_count(number)?)
            }
            None => (Vec::new(), 0),
        };
        let excluded: Vec<PageRange> = self
            .books
            .list_exclusions(&book.book_number)?
            .into_iter()
            .map(|exclusion| exclusion.range)
            .collect();

        let result = analyze_pages(page_count, &covered, &excluded);
        report.gaps = render_runs(&result.gaps);
        report.excluded = render_runs(&result.excluded);
        report.term_count = term_count;
        Ok(report)
    }
}
