//! Demo runner over `pagesage_core`.
//!
//! # Responsibility
//! - Seed a store (in-memory, or the file given as the only argument) with a
//!   small sample index.
//! - Print the gap report and a plain-text export.
//!
//! Logging is enabled when `PAGESAGE_LOG_DIR` is set.

use log::warn;
use pagesage_core::export::source::index_document;
use pagesage_core::logging::{init_with, LogConfig};
use pagesage_core::repo::book_repo::SqliteBookRepository;
use pagesage_core::repo::reference_repo::SqliteReferenceRepository;
use pagesage_core::{
    open_db, open_db_in_memory, render, BookService, ExportFormat, GapService, ReferenceService,
    WriteOutcome,
};
use std::error::Error;

const SAMPLE_BOOKS: [(&str, &str, i64); 4] = [
    ("1", "Foundations", 30),
    ("2", "Data Structures", 32),
    ("3", "Trees and Recursion", 14),
    ("4", "Learning Systems", 16),
];

const SAMPLE_REFERENCES: [(&str, &str); 19] = [
    ("algorithm", "1:5"),
    ("algorithm", "1:12-15"),
    ("algorithm", "2:3"),
    ("array", "1:20"),
    ("array", "1:25-28"),
    ("binary search", "2:10-12"),
    ("binary tree", "3:5"),
    ("big O notation", "1:8"),
    ("complexity analysis", "1:8-10"),
    ("data structure", "1:18"),
    ("hash table", "2:30"),
    ("linked list", "2:15-20"),
    ("machine learning", "4:1-5"),
    ("neural network", "4:10-15"),
    ("queue", "2:25"),
    ("recursion", "3:1-8"),
    ("stack", "2:22-24"),
    ("sorting", "2:5-9"),
    ("tree traversal", "3:8-12"),
];

fn main() -> Result<(), Box<dyn Error>> {
    match LogConfig::from_env() {
        Ok(Some(config)) => init_with(config)?,
        Ok(None) => {}
        Err(err) => eprintln!("logging disabled: {err}"),
    }

    let conn = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };

    let books = BookService::new(SqliteBookRepository::try_new(&conn)?);
    for (number, name, pages) in SAMPLE_BOOKS {
        books.add_book(number, name, Some(pages))?;
    }

    let references = ReferenceService::new(SqliteReferenceRepository::try_new(&conn)?);
    let (mut added, mut skipped) = (0, 0);
    for (term, reference) in SAMPLE_REFERENCES {
        match references.add(term, reference)? {
            WriteOutcome::Applied => added += 1,
            WriteOutcome::Duplicate => skipped += 1,
            WriteOutcome::NotFound => warn!("event=demo_seed module=cli status=unexpected"),
        }
    }
    println!("seeded references: added={added} skipped={skipped}");
    println!();

    let gaps = GapService::new(
        SqliteBookRepository::try_new(&conn)?,
        SqliteReferenceRepository::try_new(&conn)?,
    );
    println!("Gap analysis");
    for report in gaps.analyze_all()? {
        if report.is_no_data() {
            println!("  Book {} ({}): no page count", report.book_number, report.book_name);
            continue;
        }
        println!(
            "  Book {} ({}): {} terms, gaps [{}]",
            report.book_number,
            report.book_name,
            report.term_count,
            report.gaps.join(", ")
        );
    }
    println!();

    let document = index_document(&conn)?;
    if let Some(text) = render(ExportFormat::PlainText, &document)?.as_text() {
        print!("{text}");
    }
    Ok(())
}
