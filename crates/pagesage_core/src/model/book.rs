//! Book, exclusion and custom property models.
//!
//! Books are referenced by number from references, exclusions and book-scoped
//! properties. Integrity is kept by cascading delete, not foreign keys.

use crate::model::reference::PageRange;
use serde::{Deserialize, Serialize};

/// Largest page count accepted for a book. Gap analysis walks every page,
/// so counts beyond any printed volume are refused.
pub const MAX_PAGE_COUNT: i64 = 100_000;

/// Page count usable for gap analysis: present, positive and at most
/// [`MAX_PAGE_COUNT`]. Anything else means "no data".
pub fn usable_page_count(page_count: Option<i64>) -> Option<u32> {
    page_count
        .filter(|count| (1..=MAX_PAGE_COUNT).contains(count))
        .and_then(|count| u32::try_from(count).ok())
}

/// One book in the indexed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// String-typed so non-numeric numbering schemes can be stored.
    pub book_number: String,
    pub name: String,
    /// Declared page count. See [`usable_page_count`] for what gap analysis
    /// accepts.
    pub page_count: Option<i64>,
}

impl Book {
    /// Book number as used by reference text, if it is numeric.
    pub fn reference_number(&self) -> Option<u32> {
        self.book_number.trim().parse::<u32>().ok()
    }

    /// Page count usable for gap analysis.
    pub fn usable_page_count(&self) -> Option<u32> {
        usable_page_count(self.page_count)
    }
}

/// Page span on a book explicitly marked "not a gap".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapExclusion {
    pub id: i64,
    pub book_number: String,
    pub range: PageRange,
}

/// Where a custom property lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyScope {
    Global,
    Book(String),
}

/// Ordered name/value pair shown on export title pages and in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomProperty {
    pub id: i64,
    pub scope: PropertyScope,
    pub name: String,
    pub value: String,
    /// Unique within its scope; used only for ordering.
    pub display_order: i64,
}

/// Reference and exclusion counts attached to one book number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUsage {
    pub reference_count: u64,
    pub exclusion_count: u64,
}
