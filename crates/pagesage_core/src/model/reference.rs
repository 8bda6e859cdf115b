//! Page reference grammar.
//!
//! # Responsibility
//! - Parse and validate `book:page` / `book:start-end` reference text.
//! - Render references back into the same canonical grammar.
//! - Parse bare page ranges (`10`, `10-15`) used by gap exclusions.
//!
//! # Invariants
//! - Book and page numbers are positive.
//! - `start-start` is normalized to a single-page reference, so
//!   `parse(text).to_string()` is the canonical form of `text`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::str::FromStr;

static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+):([0-9]+)(?:-([0-9]+))?$").expect("valid reference regex")
});
static PAGE_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)(?:-([0-9]+))?$").expect("valid page range regex"));

/// Reference text validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceParseError {
    /// Text does not match the grammar, or a number is zero/out of range.
    InvalidFormat(String),
    /// End page precedes start page.
    InvalidRange { start: u32, end: u32 },
}

impl Display for ReferenceParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat(text) => {
                write!(f, "invalid reference format `{text}`; use b:p or b:p-p")
            }
            Self::InvalidRange { start, end } => {
                write!(f, "end page {end} cannot be less than start page {start}")
            }
        }
    }
}

impl Error for ReferenceParseError {}

/// One location pointer: a page or page range inside a numbered book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageRef {
    pub book: u32,
    pub page_start: u32,
    /// `None` means a single-page reference.
    pub page_end: Option<u32>,
}

impl PageRef {
    /// Builds a normalized reference.
    ///
    /// # Errors
    /// - `InvalidFormat` when the book or the start page is zero.
    /// - `InvalidRange` when `page_end < page_start`, including an end page
    ///   of zero.
    pub fn new(book: u32, page_start: u32, page_end: Option<u32>) -> Result<Self, ReferenceParseError> {
        if book == 0 || page_start == 0 {
            return Err(ReferenceParseError::InvalidFormat(render(book, page_start, page_end)));
        }
        let page_end = match page_end {
            Some(end) if end < page_start => {
                return Err(ReferenceParseError::InvalidRange {
                    start: page_start,
                    end,
                })
            }
            Some(end) if end == page_start => None,
            other => other,
        };

        Ok(Self {
            book,
            page_start,
            page_end,
        })
    }

    /// Parses reference text; surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self, ReferenceParseError> {
        let trimmed = text.trim();
        let invalid = || ReferenceParseError::InvalidFormat(trimmed.to_string());
        let caps = REFERENCE_RE.captures(trimmed).ok_or_else(invalid)?;

        let book = parse_number(&caps[1]).ok_or_else(invalid)?;
        let page_start = parse_number(&caps[2]).ok_or_else(invalid)?;
        let page_end = match caps.get(3) {
            Some(value) => Some(parse_number(value.as_str()).ok_or_else(invalid)?),
            None => None,
        };

        Self::new(book, page_start, page_end)
    }

    /// Last page covered by this reference.
    pub fn last_page(&self) -> u32 {
        self.page_end.unwrap_or(self.page_start)
    }

    /// Every page covered by this reference.
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.page_start..=self.last_page()
    }

    /// Covered pages as a bare range (book number dropped).
    pub fn page_range(&self) -> PageRange {
        PageRange {
            start: self.page_start,
            end: self.last_page(),
        }
    }
}

impl Display for PageRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render(self.book, self.page_start, self.page_end))
    }
}

impl FromStr for PageRef {
    type Err = ReferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Inclusive page span without a book, e.g. an exclusion or a gap run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Builds a validated range; pages are positive and `end >= start`.
    pub fn new(start: u32, end: u32) -> Result<Self, ReferenceParseError> {
        if start == 0 {
            return Err(ReferenceParseError::InvalidFormat(format!("{start}-{end}")));
        }
        if end < start {
            return Err(ReferenceParseError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(page: u32) -> Result<Self, ReferenceParseError> {
        Self::new(page, page)
    }

    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }

    pub fn intersects(&self, other: &PageRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn is_single_page(&self) -> bool {
        self.start == self.end
    }
}

impl Display for PageRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_single_page() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Parses a bare page range: `"10"` or `"10-15"`.
pub fn parse_page_range(text: &str) -> Result<PageRange, ReferenceParseError> {
    let trimmed = text.trim();
    let invalid = || ReferenceParseError::InvalidFormat(trimmed.to_string());
    let caps = PAGE_RANGE_RE.captures(trimmed).ok_or_else(invalid)?;

    let start = parse_number(&caps[1]).ok_or_else(invalid)?;
    let end = match caps.get(2) {
        Some(value) => parse_number(value.as_str()).ok_or_else(invalid)?,
        None => start,
    };

    PageRange::new(start, end)
}

fn parse_number(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok()
}

fn render(book: u32, page_start: u32, page_end: Option<u32>) -> String {
    match page_end {
        Some(end) => format!("{book}:{page_start}-{end}"),
        None => format!("{book}:{page_start}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_page_range, PageRange, PageRef, ReferenceParseError};

    #[test]
    fn parses_single_page_and_range() {
        let single = PageRef::parse("1:3").unwrap();
        assert_eq!(single, PageRef::new(1, 3, None).unwrap());

        let range = PageRef::parse("  2:10-15 ").unwrap();
        assert_eq!(range.book, 2);
        assert_eq!(range.page_start, 10);
        assert_eq!(range.page_end, Some(15));
    }

    #[test]
    fn canonical_text_survives_parse_and_display() {
        for text in ["1:3", "12:100-140", "3:9-10"] {
            assert_eq!(PageRef::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn degenerate_range_collapses_to_single_page() {
        let parsed = PageRef::parse("3:10-10").unwrap();
        assert_eq!(parsed.page_end, None);
        assert_eq!(parsed.to_string(), "3:10");
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["", "1", "1:", ":3", "1 :3", "1:3 - 4", "a:b", "1:3-", "1:3-4-5", "-1:3"] {
            let err = PageRef::parse(text).unwrap_err();
            assert!(
                matches!(err, ReferenceParseError::InvalidFormat(_)),
                "`{text}` should be an invalid format"
            );
        }
    }

    #[test]
    fn rejects_zero_and_overflowing_numbers() {
        assert!(matches!(
            PageRef::parse("0:3"),
            Err(ReferenceParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            PageRef::parse("1:0"),
            Err(ReferenceParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            PageRef::parse("1:99999999999"),
            Err(ReferenceParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_backwards_range() {
        let err = PageRef::parse("1:20-10").unwrap_err();
        assert_eq!(err, ReferenceParseError::InvalidRange { start: 20, end: 10 });
    }

    #[test]
    fn zero_end_page_is_a_backwards_range() {
        assert_eq!(
            PageRef::parse("1:3-0").unwrap_err(),
            ReferenceParseError::InvalidRange { start: 3, end: 0 }
        );
        assert_eq!(
            PageRef::new(1, 3, Some(0)).unwrap_err(),
            ReferenceParseError::InvalidRange { start: 3, end: 0 }
        );
        assert_eq!(
            parse_page_range("3-0").unwrap_err(),
            ReferenceParseError::InvalidRange { start: 3, end: 0 }
        );
        assert!(matches!(
            PageRef::parse("1:0-0"),
            Err(ReferenceParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn page_range_parsing_and_rendering() {
        assert_eq!(parse_page_range("7").unwrap(), PageRange::single(7).unwrap());
        assert_eq!(parse_page_range(" 5-9 ").unwrap().to_string(), "5-9");
        assert_eq!(parse_page_range("4-4").unwrap().to_string(), "4");
        assert!(parse_page_range("9-5").is_err());
        assert!(parse_page_range("1:5").is_err());
    }

    #[test]
    fn ranges_intersect_when_sharing_a_page() {
        let a = PageRange::new(3, 6).unwrap();
        assert!(a.intersects(&PageRange::single(6).unwrap()));
        assert!(!a.intersects(&PageRange::new(7, 9).unwrap()));
        assert_eq!(a.page_count(), 4);
    }
}
