//! Reference set use-case service.
//!
//! # Responsibility
//! - Parse reference text and apply add/remove/update with set semantics.
//! - Provide listing, search and recent-activity views.
//! - Bulk CSV import that keeps going past bad rows.
//!
//! # Invariants
//! - Parse failures are surfaced before the store is touched.
//! - Adding an existing reference is `Duplicate`, never an error.

use crate::model::entry::{IndexEntry, RecentReference};
use crate::model::reference::PageRef;
use crate::repo::reference_repo::ReferenceRepository;
use crate::repo::WriteOutcome;
use crate::service::{normalize_term_name, IndexServiceError, ServiceResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};

const RECENT_DEFAULT_LIMIT: u32 = 5;

/// One rejected reference (or line) from a bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    /// 1-based line number in the imported text.
    pub line: usize,
    /// Offending reference text, when the line itself was well formed.
    pub reference: Option<String>,
    pub message: String,
}

/// Summary of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    /// References that already existed.
    pub skipped: usize,
    pub errors: Vec<ImportRowError>,
}

/// Reference service facade over repository implementations.
pub struct ReferenceService<R: ReferenceRepository> {
    repo: R,
}

impl<R: ReferenceRepository> ReferenceService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds one reference to a term, creating the term on first use.
    ///
    /// On `Applied`, every gap exclusion sharing a page with the new
    /// reference has been removed.
    pub fn add(&self, term: &str, reference: &str) -> ServiceResult<WriteOutcome> {
        let term = normalize_term_name(term)?;
        let reference = PageRef::parse(reference)?;
        let outcome = self.repo.insert_reference(term, &reference)?;
        info!(
            "event=reference_add module=service status=ok outcome={:?} book={} pages={}",
            outcome,
            reference.book,
            reference.page_range()
        );
        Ok(outcome)
    }

    /// Removes one exact reference, or all references of the term when
    /// `reference` is `None`. Orphaned terms are cleaned up afterwards.
    pub fn remove(&self, term: &str, reference: Option<&str>) -> ServiceResult<WriteOutcome> {
        let term = normalize_term_name(term)?;
        let reference = reference.map(PageRef::parse).transpose()?;
        let outcome = self.repo.delete_references(term, reference.as_ref())?;
        info!(
            "event=reference_remove module=service status=ok outcome={:?} scope={}",
            outcome,
            if reference.is_some() { "single" } else { "all" }
        );
        Ok(outcome)
    }

    /// Rewrites one reference of a term.
    ///
    /// # Contract
    /// - `NotFound` when the term or the old reference does not exist.
    /// - `Duplicate` when the new value equals another existing reference of
    ///   the term; nothing changes in that case.
    pub fn update(&self, term: &str, old: &str, new: &str) -> ServiceResult<WriteOutcome> {
        let term = normalize_term_name(term)?;
        let old = PageRef::parse(old)?;
        let new = PageRef::parse(new)?;
        let outcome = self.repo.update_reference(term, &old, &new)?;
        info!("event=reference_update module=service status=ok outcome={outcome:?}");
        Ok(outcome)
    }

    /// Every term with at least one reference, terms case-insensitively
    /// ordered, references ordered by `(book, page_start)`.
    pub fn list_all(&self) -> ServiceResult<Vec<IndexEntry>> {
        Ok(self.repo.list_entries(None)?)
    }

    /// Like [`Self::list_all`] restricted to names containing `substring`,
    /// case-insensitively.
    pub fn search(&self, substring: &str) -> ServiceResult<Vec<IndexEntry>> {
        Ok(self.repo.list_entries(Some(substring.trim()))?)
    }

    /// Most recently inserted references first, at most `limit` rows
    /// (5 when `limit` is missing or zero).
    pub fn recent(&self, limit: Option<u32>) -> ServiceResult<Vec<RecentReference>> {
        Ok(self.repo.recent(normalize_recent_limit(limit))?)
    }

    /// Imports `term,ref1,ref2,...` lines.
    ///
    /// Bad lines and bad references are collected in the report; only store
    /// failures abort the import.
    pub fn import_csv(&self, text: &str) -> ServiceResult<ImportReport> {
        let mut report = ImportReport::default();

        for (index, raw_line) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw_line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let mut fields = trimmed.split(',').map(str::trim);
            let term = fields.next().unwrap_or_default();
            let references: Vec<&str> = fields.collect();

            let line_error = if references.is_empty() {
                Some("invalid format (expected: term,reference1,reference2,...)")
            } else if term.is_empty() {
                Some("missing term")
            } else if references.iter().all(|reference| reference.is_empty()) {
                Some("missing references")
            } else {
                None
            };
            if let Some(message) = line_error {
                report.errors.push(ImportRowError {
                    line,
                    reference: None,
                    message: message.to_string(),
                });
                continue;
            }

            for reference in references.into_iter().filter(|r| !r.is_empty()) {
                match self.add(term, reference) {
                    Ok(WriteOutcome::Applied) => report.imported += 1,
                    Ok(_) => report.skipped += 1,
                    Err(IndexServiceError::Repo(err)) => return Err(err.into()),
                    Err(err) => report.errors.push(ImportRowError {
                        line,
                        reference: Some(reference.to_string()),
                        message: err.to_string(),
                    }),
                }
            }
        }

        if report.errors.is_empty() {
            info!(
                "event=reference_import module=service status=ok imported={} skipped={}",
                report.imported, report.skipped
            );
        } else {
            warn!(
                "event=reference_import module=service status=partial imported={} skipped={} errors={}",
                report.imported,
                report.skipped,
                report.errors.len()
            );
        }
        Ok(report)
    }
}

/// Normalizes the recent-list limit: missing or zero means 5, any other
/// value is used as given.
pub fn normalize_recent_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => RECENT_DEFAULT_LIMIT,
        Some(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_recent_limit;

    #[test]
    fn recent_limit_defaults_when_missing_or_zero() {
        assert_eq!(normalize_recent_limit(None), 5);
        assert_eq!(normalize_recent_limit(Some(0)), 5);
        assert_eq!(normalize_recent_limit(Some(12)), 12);
        assert_eq!(normalize_recent_limit(Some(5000)), 5000);
        assert_eq!(normalize_recent_limit(Some(u32::MAX)), u32::MAX);
    }
}
