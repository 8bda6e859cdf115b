//! Term and note use-case service.
//!
//! # Responsibility
//! - Case-insensitive term registry operations.
//! - Note set/delete with orphan cleanup.
//!
//! # Invariants
//! - A term's display casing is fixed by the first write that created it.
//! - Notes are trimmed; a blank note is treated as "no note".

use crate::model::entry::NoteEntry;
use crate::model::term::{Term, TermEnrichment, TermId};
use crate::repo::term_repo::TermRepository;
use crate::repo::WriteOutcome;
use crate::service::{normalize_term_name, ServiceResult};
use log::info;

/// Term service facade over repository implementations.
pub struct TermService<R: TermRepository> {
    repo: R,
}

impl<R: TermRepository> TermService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the id of the named term, creating it when absent.
    ///
    /// Idempotent across casings of the same name.
    pub fn upsert_term(&self, name: &str) -> ServiceResult<TermId> {
        let name = normalize_term_name(name)?;
        Ok(self.repo.upsert_term(name)?)
    }

    /// Loads one term by any casing of its name.
    pub fn get_term(&self, name: &str) -> ServiceResult<Option<Term>> {
        let name = normalize_term_name(name)?;
        Ok(self.repo.find_term(name)?)
    }

    /// Sets the note of a term.
    ///
    /// # Contract
    /// - Non-empty text creates the term when absent and returns `Applied`.
    /// - Empty text behaves like [`Self::delete_note`].
    pub fn set_note(&self, name: &str, text: &str) -> ServiceResult<WriteOutcome> {
        let name = normalize_term_name(name)?;
        let note = text.trim();
        let outcome = self.repo.set_note(name, note)?;
        info!(
            "event=note_set module=service status=ok outcome={:?} note_chars={}",
            outcome,
            note.chars().count()
        );
        Ok(outcome)
    }

    /// Clears the note of a term; the term is deleted when it has no
    /// references left.
    ///
    /// Returns `NotFound` when the term does not exist.
    pub fn delete_note(&self, name: &str) -> ServiceResult<WriteOutcome> {
        let name = normalize_term_name(name)?;
        let outcome = self.repo.set_note(name, "")?;
        info!("event=note_delete module=service status=ok outcome={outcome:?}");
        Ok(outcome)
    }

    /// Returns the note of a term, or `None` when the term does not exist.
    pub fn get_note(&self, name: &str) -> ServiceResult<Option<String>> {
        Ok(self.get_term(name)?.map(|term| term.note))
    }

    /// Lists terms with a non-empty note, ordered case-insensitively.
    pub fn list_with_notes(&self) -> ServiceResult<Vec<NoteEntry>> {
        Ok(self.repo.list_with_notes()?)
    }

    /// Stores opaque enrichment fields on an existing term.
    pub fn set_enrichment(
        &self,
        name: &str,
        enrichment: &TermEnrichment,
    ) -> ServiceResult<WriteOutcome> {
        let name = normalize_term_name(name)?;
        Ok(self.repo.set_enrichment(name, enrichment)?)
    }

    /// Deletes terms left with no references and no note. Returns how many
    /// were removed.
    pub fn purge_orphans(&self) -> ServiceResult<usize> {
        let removed = self.repo.purge_orphans()?;
        info!("event=orphan_purge module=service status=ok removed={removed}");
        Ok(removed)
    }

    /// Removes every term and reference, keeping books, settings and
    /// custom properties.
    pub fn clear_all(&self) -> ServiceResult<()> {
        self.repo.clear_all()?;
        info!("event=index_clear module=service status=ok");
        Ok(())
    }
}
