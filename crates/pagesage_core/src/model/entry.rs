//! Read models returned by listing queries and consumed by exporters.

use serde::{Deserialize, Serialize};

/// One term with its formatted references, sorted by `(book, page_start)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub term: String,
    pub references: Vec<String>,
}

/// One term with a non-empty note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub term: String,
    pub note: String,
}

/// One reference row, newest first in `recent` listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentReference {
    pub term: String,
    pub reference: String,
    /// Monotonic insertion id.
    pub reference_id: i64,
}
