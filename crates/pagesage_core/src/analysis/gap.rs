//! Gap analysis: pages of a book not covered by any reference and not
//! explicitly excluded.
//!
//! # Invariants
//! - Only pages `1..=page_count` are considered; spans reaching past the end
//!   are clamped.
//! - Exclusions only suppress gaps; they never create one.
//! - Output runs are maximal, disjoint and ascending.

use crate::model::book::usable_page_count;
use crate::model::reference::PageRange;
use serde::{Deserialize, Serialize};

/// Gap and exclusion runs of one book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGaps {
    pub gaps: Vec<PageRange>,
    pub excluded: Vec<PageRange>,
}

/// Gap report row for one book, with ranges rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookGapReport {
    pub book_number: String,
    pub book_name: String,
    pub page_count: Option<i64>,
    pub gaps: Vec<String>,
    pub excluded: Vec<String>,
    /// Distinct terms with at least one reference on the book.
    pub term_count: u64,
}

impl BookGapReport {
    pub fn gap_count(&self) -> usize {
        self.gaps.len()
    }

    /// Whether the book lacked a usable page count.
    pub fn is_no_data(&self) -> bool {
        usable_page_count(self.page_count).is_none()
    }
}

/// Computes gap runs for a book with `page_count` pages.
///
/// `excluded` in the result lists the exclusion spans as given, in the order
/// given, so callers can display them next to the gaps.
pub fn analyze_pages(page_count: u32, covered: &[PageRange], excluded: &[PageRange]) -> PageGaps {
    let pages = gap_pages(page_count, covered, excluded);
    PageGaps {
        gaps: consolidate_runs(&pages),
        excluded: excluded.to_vec(),
    }
}

/// Pages in `1..=page_count` outside every covered and excluded span,
/// ascending.
pub fn gap_pages(page_count: u32, covered: &[PageRange], excluded: &[PageRange]) -> Vec<u32> {
    if page_count == 0 {
        return Vec::new();
    }

    // Index 0 is unused so page numbers index directly.
    let mut marked = vec![false; page_count as usize + 1];
    for span in covered.iter().chain(excluded) {
        if span.start > page_count {
            continue;
        }
        let end = span.end.min(page_count);
        for page in span.start..=end {
            marked[page as usize] = true;
        }
    }

    (1..=page_count)
        .filter(|page| !marked[*page as usize])
        .collect()
}

/// Merges ascending page numbers into maximal contiguous runs.
pub fn consolidate_runs(pages: &[u32]) -> Vec<PageRange> {
    let mut runs = Vec::new();
    let mut iter = pages.iter().copied();
    let Some(first) = iter.next() else {
        return runs;
    };

    let mut current = PageRange {
        start: first,
        end: first,
    };
    for page in iter {
        if current.end.checked_add(1) == Some(page) {
            current.end = page;
        } else {
            runs.push(current);
            current = PageRange {
                start: page,
                end: page,
            };
        }
    }
    runs.push(current);
    runs
}

/// Renders runs as `"p"` / `"start-end"` strings.
pub fn render_runs(runs: &[PageRange]) -> Vec<String> {
    runs.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::{analyze_pages, consolidate_runs, gap_pages, render_runs, BookGapReport};
    use crate::model::book::MAX_PAGE_COUNT;
    use crate::model::reference::PageRange;

    fn span(start: u32, end: u32) -> PageRange {
        PageRange::new(start, end).unwrap()
    }

    #[test]
    fn consolidates_scattered_pages_into_runs() {
        let runs = consolidate_runs(&[1, 2, 4, 5, 6, 9, 10]);
        assert_eq!(render_runs(&runs), vec!["1-2", "4-6", "9-10"]);
    }

    #[test]
    fn single_pages_render_without_dash() {
        let runs = consolidate_runs(&[3, 7]);
        assert_eq!(render_runs(&runs), vec!["3", "7"]);
        assert!(consolidate_runs(&[]).is_empty());
    }

    #[test]
    fn gaps_skip_covered_and_excluded_pages() {
        let covered = [span(3, 3), span(7, 8)];
        let result = analyze_pages(10, &covered, &[]);
        assert_eq!(render_runs(&result.gaps), vec!["1-2", "4-6", "9-10"]);

        let excluded = [span(1, 2)];
        let result = analyze_pages(10, &covered, &excluded);
        assert_eq!(render_runs(&result.gaps), vec!["4-6", "9-10"]);
        assert_eq!(render_runs(&result.excluded), vec!["1-2"]);
    }

    #[test]
    fn overlapping_spans_do_not_double_count() {
        let covered = [span(2, 6), span(4, 9), span(5, 5)];
        assert_eq!(gap_pages(10, &covered, &[]), vec![1, 10]);
    }

    #[test]
    fn spans_past_the_last_page_are_clamped() {
        let covered = [span(4, 4_000_000), span(50, 60)];
        assert_eq!(gap_pages(5, &covered, &[]), vec![1, 2, 3]);
    }

    #[test]
    fn fully_covered_book_has_no_gaps() {
        let result = analyze_pages(4, &[span(1, 4)], &[]);
        assert!(result.gaps.is_empty());
        assert!(gap_pages(0, &[], &[]).is_empty());
    }

    #[test]
    fn no_data_matches_the_usable_page_count_bounds() {
        let report = |page_count| BookGapReport {
            book_number: "1".to_string(),
            book_name: "Book".to_string(),
            page_count,
            gaps: Vec::new(),
            excluded: Vec::new(),
            term_count: 0,
        };

        assert!(report(None).is_no_data());
        assert!(report(Some(0)).is_no_data());
        assert!(report(Some(-4)).is_no_data());
        assert!(report(Some(MAX_PAGE_COUNT + 1)).is_no_data());
        assert!(report(Some(5_000_000_000)).is_no_data());
        assert!(!report(Some(1)).is_no_data());
        assert!(!report(Some(MAX_PAGE_COUNT)).is_no_data());
    }
}
