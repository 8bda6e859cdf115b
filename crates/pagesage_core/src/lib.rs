//! Core engine for pagesage, a book index: terms mapped to page references
//! across numbered books, with gap analysis and multi-format export.
//!
//! Every operation takes an explicit store handle (`rusqlite::Connection`);
//! there is no process-wide active store.

pub mod analysis;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use analysis::gap::{analyze_pages, BookGapReport, PageGaps};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use export::{
    export_to_path, export_to_writer, render, BookSummary, ExportBody, ExportDocument,
    ExportError, ExportFormat, ExportMetadata, ExportOutput,
};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::book::{
    Book, BookUsage, CustomProperty, GapExclusion, PropertyScope, MAX_PAGE_COUNT,
};
pub use model::entry::{IndexEntry, NoteEntry, RecentReference};
pub use model::reference::{parse_page_range, PageRange, PageRef, ReferenceParseError};
pub use model::term::{Term, TermEnrichment, TermId};
pub use repo::book_repo::{BookRepository, SqliteBookRepository};
pub use repo::property_repo::{PropertyRepository, SqlitePropertyRepository};
pub use repo::reference_repo::{ReferenceRepository, SqliteReferenceRepository};
pub use repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
pub use repo::term_repo::{SqliteTermRepository, TermRepository};
pub use repo::{RepoError, RepoResult, WriteOutcome};
pub use service::book_service::BookService;
pub use service::gap_service::GapService;
pub use service::property_service::PropertyService;
pub use service::reference_service::{ImportReport, ImportRowError, ReferenceService};
pub use service::term_service::TermService;
pub use service::{IndexServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
