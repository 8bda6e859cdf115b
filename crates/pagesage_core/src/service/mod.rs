//! Core use-case services.
//!
//! # Responsibility
//! - Validate caller input and orchestrate repository calls into the
//!   operations exposed to CLI/web callers.
//! - Keep callers decoupled from storage details.
//!
//! # Invariants
//! - Reference text is always parsed before any store access.
//! - Every mutation reports a `WriteOutcome`; only invalid input and store
//!   failures are errors.

use crate::model::reference::ReferenceParseError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod book_service;
pub mod gap_service;
pub mod property_service;
pub mod reference_service;
pub mod term_service;

pub type ServiceResult<T> = Result<T, IndexServiceError>;

/// Service error for index use-cases.
#[derive(Debug)]
pub enum IndexServiceError {
    /// Reference text is malformed or its range is inverted.
    InvalidReference(ReferenceParseError),
    /// Other caller input is unusable (blank term, blank book number...).
    InvalidInput(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for IndexServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReference(err) => write!(f, "{err}"),
            Self::InvalidInput(detail) => write!(f, "invalid input: {detail}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IndexServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidReference(err) => Some(err),
            Self::InvalidInput(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for IndexServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ReferenceParseError> for IndexServiceError {
    fn from(value: ReferenceParseError) -> Self {
        Self::InvalidReference(value)
    }
}

/// Trims a term name and rejects blank input.
pub(crate) fn normalize_term_name(name: &str) -> ServiceResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(IndexServiceError::InvalidInput(
            "term must not be blank".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Stored form of a book number: trimmed, and a positive integer written
/// without sign or leading zeros so it matches the book of reference text.
pub(crate) fn canonical_book_number(book_number: &str) -> String {
    let trimmed = book_number.trim();
    match trimmed.parse::<u32>() {
        Ok(number) if number > 0 => number.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Canonicalizes a book number and rejects blank input.
pub(crate) fn normalize_book_number(book_number: &str) -> ServiceResult<String> {
    let canonical = canonical_book_number(book_number);
    if canonical.is_empty() {
        return Err(IndexServiceError::InvalidInput(
            "book number must not be blank".to_string(),
        ));
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::{canonical_book_number, normalize_book_number};

    #[test]
    fn numeric_book_numbers_lose_padding() {
        assert_eq!(canonical_book_number(" 01 "), "1");
        assert_eq!(canonical_book_number("+7"), "7");
        assert_eq!(canonical_book_number("12"), "12");
    }

    #[test]
    fn other_book_numbers_are_only_trimmed() {
        assert_eq!(canonical_book_number(" A-2 "), "A-2");
        assert_eq!(canonical_book_number("0"), "0");
        assert_eq!(canonical_book_number("007b"), "007b");
        assert!(normalize_book_number("   ").is_err());
    }
}
