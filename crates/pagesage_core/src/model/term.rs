//! Term model.
//!
//! # Invariants
//! - The identity key (`term_key`) is fixed by the first name that created
//!   the term; later writes never change the display casing.
//! - A term with no references and an empty note is an orphan and is removed
//!   by the next cleanup pass.

use serde::{Deserialize, Serialize};

/// Store-assigned term identifier.
pub type TermId = i64;

/// Opaque AI-enrichment fields. The core stores and returns them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEnrichment {
    pub description: Option<String>,
    pub flagged: bool,
    /// Unix epoch milliseconds.
    pub enriched_at: Option<i64>,
}

/// One index term as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    /// Display name, in the casing first used.
    pub name: String,
    /// Free-text note; empty string means "no note".
    pub note: String,
    pub enrichment: TermEnrichment,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Term {
    pub fn has_note(&self) -> bool {
        !self.note.is_empty()
    }
}

/// Unicode full case folding, e.g. `"Straße"` and `"STRASSE"` fold alike.
pub fn fold_case(text: &str) -> String {
    caseless::default_case_fold_str(text)
}

/// Case-folded identity key for a term name.
///
/// Two names address the same term iff their keys are equal.
pub fn term_key(name: &str) -> String {
    fold_case(name.trim())
}

#[cfg(test)]
mod tests {
    use super::term_key;

    #[test]
    fn key_folds_case_including_non_ascii() {
        assert_eq!(term_key("Algorithm"), term_key("aLGORITHM"));
        assert_eq!(term_key("ÉCOLE"), term_key("école"));
        assert_ne!(term_key("tree"), term_key("trees"));
    }

    #[test]
    fn key_uses_full_case_folding() {
        assert_eq!(term_key("Straße"), term_key("STRASSE"));
        assert_eq!(term_key("Straße"), "strasse");
        assert_eq!(term_key("ΟΔΟΣ"), term_key("οδος"));
        assert_eq!(term_key("ΟΔΟΣ"), term_key("οδοσ"));
        assert_eq!(term_key("  Mixed Case "), "mixed case");
    }
}
