//! Page layout for the PDF exporter.
//!
//! # Responsibility
//! - Place the title page and the body on landscape Letter pages.
//! - Flow the body continuously through fixed columns (4 for the index,
//!   2 for notes), wrapping long entries and breaking columns and pages.
//!
//! # Invariants
//! - Coordinates are PDF points with the origin at the bottom-left corner.
//! - A letter heading is never the last line of a column.
//! - Every page carries a footer with the index name and its page number.
//!
//! Text widths are estimated from the font size; this module knows nothing
//! about font metrics or the PDF backend.

use crate::export::grouping::group_rows;
use crate::export::{ExportBody, ExportDocument, ExportMetadata};

pub const PAGE_WIDTH: f32 = 792.0;
pub const PAGE_HEIGHT: f32 = 612.0;
pub const MARGIN: f32 = 36.0;
pub const INDEX_COLUMNS: usize = 4;
pub const NOTES_COLUMNS: usize = 2;

const COLUMN_GAP: f32 = 12.0;
const FOOTER_Y: f32 = 21.6;
const CONTENT_TOP: f32 = PAGE_HEIGHT - MARGIN;
const CONTENT_BOTTOM: f32 = MARGIN + 12.0;
const CONTINUATION_INDENT: f32 = 10.0;
const GROUP_SPACING: f32 = 7.0;
const ENTRY_SPACING: f32 = 2.0;
/// Average Helvetica glyph width as a fraction of the font size.
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

/// Visual role of a placed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Subtitle,
    SectionHeading,
    Body,
    LetterHeading,
    Entry,
    Footer,
}

impl TextStyle {
    pub fn font_size(self) -> f32 {
        match self {
            Self::Title => 28.0,
            Self::SectionHeading | Self::LetterHeading => 14.0,
            Self::Subtitle | Self::Body => 10.0,
            Self::Entry | Self::Footer => 9.0,
        }
    }

    /// Vertical advance after the line.
    pub fn leading(self) -> f32 {
        match self {
            Self::Title => 36.0,
            Self::SectionHeading => 20.0,
            Self::LetterHeading => 22.0,
            Self::Subtitle | Self::Body => 13.0,
            Self::Entry | Self::Footer => 11.0,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(
            self,
            Self::Title | Self::SectionHeading | Self::LetterHeading
        )
    }

    /// Drawn in the accent colour instead of black.
    pub fn is_accent(self) -> bool {
        matches!(self, Self::SectionHeading | Self::LetterHeading)
    }
}

/// One line of text at a baseline position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub x: f32,
    pub y: f32,
    pub style: TextStyle,
    pub text: String,
}

/// Filled background rectangle behind a letter heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub bands: Vec<Band>,
    pub texts: Vec<PlacedText>,
}

/// Lays out the whole document: title page(s), body pages, then footers.
pub fn layout_document(document: &ExportDocument) -> Vec<PageLayout> {
    let mut pages = title_pages(&document.metadata);
    pages.extend(body_pages(document));

    for (index, page) in pages.iter_mut().enumerate() {
        let number = (index + 1).to_string();
        let number_width = estimate_width(&number, TextStyle::Footer.font_size());
        page.texts.push(PlacedText {
            x: MARGIN,
            y: FOOTER_Y,
            style: TextStyle::Footer,
            text: document.metadata.index_name.clone(),
        });
        page.texts.push(PlacedText {
            x: PAGE_WIDTH - MARGIN - number_width,
            y: FOOTER_Y,
            style: TextStyle::Footer,
            text: number,
        });
    }
    pages
}

fn title_pages(metadata: &ExportMetadata) -> Vec<PageLayout> {
    let mut flow = ColumnFlow::new(1);
    flow.cursor -= PAGE_HEIGHT / 5.0;
    flow.push_centered(TextStyle::Title, &metadata.index_name);
    flow.push_centered(
        TextStyle::Subtitle,
        &format!("Generated: {}", metadata.generated_label()),
    );
    flow.push_space(30.0);

    if !metadata.books.is_empty() {
        flow.push_heading(TextStyle::SectionHeading, "Books", TextStyle::Body.leading());
        for book in &metadata.books {
            flow.push_wrapped(TextStyle::Body, &book.display_line());
        }
        flow.push_space(GROUP_SPACING * 2.0);
    }
    if !metadata.custom_properties.is_empty() {
        flow.push_heading(
            TextStyle::SectionHeading,
            "Properties",
            TextStyle::Body.leading(),
        );
        for (name, value) in &metadata.custom_properties {
            flow.push_wrapped(TextStyle::Body, &format!("{name}: {value}"));
        }
    }
    flow.finish()
}

fn body_pages(document: &ExportDocument) -> Vec<PageLayout> {
    let columns = match document.body {
        ExportBody::Index(_) => INDEX_COLUMNS,
        ExportBody::Notes(_) => NOTES_COLUMNS,
    };
    let mut flow = ColumnFlow::new(columns);
    if document.is_empty() {
        flow.push_wrapped(TextStyle::Body, document.labels().empty);
        return flow.finish();
    }

    for (index, group) in group_rows(document.rows()).iter().enumerate() {
        if index > 0 {
            flow.push_space(GROUP_SPACING);
        }
        flow.push_heading(
            TextStyle::LetterHeading,
            &group.letter.to_string(),
            TextStyle::Entry.leading(),
        );
        for row in &group.rows {
            flow.push_wrapped(TextStyle::Entry, &format!("{}: {}", row.term, row.detail));
            flow.push_space(ENTRY_SPACING);
        }
    }
    flow.finish()
}

/// Cursor over fixed-width columns; full columns advance to the next one and
/// the last column advances to a new page.
struct ColumnFlow {
    columns: usize,
    column_width: f32,
    pages: Vec<PageLayout>,
    column: usize,
    /// Top of the next line.
    cursor: f32,
}

impl ColumnFlow {
    fn new(columns: usize) -> Self {
        let columns = columns.max(1);
        let usable = PAGE_WIDTH - 2.0 * MARGIN - COLUMN_GAP * (columns - 1) as f32;
        Self {
            columns,
            column_width: usable / columns as f32,
            pages: vec![PageLayout::default()],
            column: 0,
            cursor: CONTENT_TOP,
        }
    }

    fn column_x(&self) -> f32 {
        MARGIN + self.column as f32 * (self.column_width + COLUMN_GAP)
    }

    fn at_column_top(&self) -> bool {
        self.cursor >= CONTENT_TOP
    }

    fn advance_column(&mut self) {
        self.column += 1;
        if self.column == self.columns {
            self.column = 0;
            self.pages.push(PageLayout::default());
        }
        self.cursor = CONTENT_TOP;
    }

    /// Moves to the next column unless `height` fits below the cursor.
    fn reserve(&mut self, height: f32) {
        if self.cursor - height < CONTENT_BOTTOM && !self.at_column_top() {
            self.advance_column();
        }
    }

    fn page(&mut self) -> &mut PageLayout {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn place(&mut self, style: TextStyle, x: f32, text: String) {
        self.reserve(style.leading());
        let y = self.cursor - style.font_size();
        self.page().texts.push(PlacedText { x, y, style, text });
        self.cursor -= style.leading();
    }

    fn push_space(&mut self, height: f32) {
        if self.at_column_top() {
            return;
        }
        if self.cursor - height < CONTENT_BOTTOM {
            self.advance_column();
        } else {
            self.cursor -= height;
        }
    }

    fn push_centered(&mut self, style: TextStyle, text: &str) {
        for line in wrap_text(text, self.max_chars(style, 0.0)) {
            let width = estimate_width(&line, style.font_size());
            let x = self.column_x() + ((self.column_width - width) / 2.0).max(0.0);
            self.place(style, x, line);
        }
    }

    /// Heading with a background band, kept together with `next_height` of
    /// following content.
    fn push_heading(&mut self, style: TextStyle, text: &str, next_height: f32) {
        self.reserve(style.leading() + next_height);
        let x = self.column_x();
        let band = Band {
            x,
            y: self.cursor - style.leading() + 2.0,
            width: self.column_width,
            height: style.leading() - 2.0,
        };
        self.page().bands.push(band);
        self.place(style, x + 6.0, text.to_string());
    }

    /// Wrapped paragraph; continuation lines are indented.
    fn push_wrapped(&mut self, style: TextStyle, text: &str) {
        let first_width = self.max_chars(style, 0.0);
        let rest_width = self.max_chars(style, CONTINUATION_INDENT);
        for (index, line) in wrap_lines(text, first_width, rest_width).into_iter().enumerate() {
            let indent = if index == 0 { 0.0 } else { CONTINUATION_INDENT };
            let x = self.column_x() + indent;
            self.place(style, x, line);
        }
    }

    fn max_chars(&self, style: TextStyle, indent: f32) -> usize {
        let glyph = style.font_size() * AVERAGE_GLYPH_WIDTH;
        (((self.column_width - indent) / glyph).floor() as usize).max(1)
    }

    fn finish(self) -> Vec<PageLayout> {
        self.pages
    }
}

/// Estimated rendered width of `text` in points.
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVERAGE_GLYPH_WIDTH
}

/// Greedy word wrap to `max_chars` per line. Explicit newlines start a new
/// line and words longer than a line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    wrap_lines(text, max_chars, max_chars)
}

fn wrap_lines(text: &str, first_width: usize, rest_width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let width_for = |lines: &Vec<String>| {
        if lines.is_empty() {
            first_width.max(1)
        } else {
            rest_width.max(1)
        }
    };

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            loop {
                let width = width_for(&lines);
                let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
                if needed <= width {
                    if current_len > 0 {
                        current.push(' ');
                    }
                    current.extend(word.iter());
                    current_len = needed;
                    break;
                }
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                    continue;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
                if word.is_empty() {
                    break;
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// Parses `#rrggbb` into RGB components in `0.0..=1.0`.
pub fn parse_hex_color(text: &str) -> Option<(f32, f32, f32)> {
    let hex = text.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .ok()
            .map(|value| f32::from(value) / 255.0)
    };
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::{
        layout_document, parse_hex_color, wrap_text, TextStyle, CONTENT_BOTTOM, PAGE_WIDTH,
    };
    use crate::export::{ExportDocument, ExportMetadata};
    use crate::model::entry::{IndexEntry, NoteEntry};

    fn entries(count: usize) -> Vec<IndexEntry> {
        (0..count)
            .map(|index| IndexEntry {
                term: format!("term {index:04}"),
                references: vec!["1:1".to_string(), format!("2:{}", index + 1)],
            })
            .collect()
    }

    #[test]
    fn wraps_on_words_and_splits_long_words() {
        assert_eq!(wrap_text("alpha beta gamma", 10), vec!["alpha beta", "gamma"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("one\ntwo", 20), vec!["one", "two"]);
        assert_eq!(wrap_text("", 20), vec![""]);
    }

    #[test]
    fn empty_index_has_title_and_body_page() {
        let document = ExportDocument::index(ExportMetadata::new("Empty"), Vec::new());
        let pages = layout_document(&document);
        assert_eq!(pages.len(), 2);
        assert!(pages[1].texts.iter().any(|text| text.text == "Empty index"));
    }

    #[test]
    fn long_index_flows_across_columns_and_pages() {
        let document = ExportDocument::index(ExportMetadata::new("Big"), entries(400));
        let pages = layout_document(&document);
        assert!(pages.len() > 2);

        let body = &pages[1];
        let mut columns: Vec<i32> = body
            .texts
            .iter()
            .filter(|text| text.style == TextStyle::Entry)
            .map(|text| text.x.round() as i32)
            .collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), 4);

        for page in &pages {
            for text in page.texts.iter().filter(|text| text.style != TextStyle::Footer) {
                assert!(text.y >= CONTENT_BOTTOM - TextStyle::Title.font_size());
                assert!(text.x < PAGE_WIDTH);
            }
        }
    }

    #[test]
    fn every_page_is_numbered_in_the_footer() {
        let document = ExportDocument::index(ExportMetadata::new("Big"), entries(400));
        let pages = layout_document(&document);
        for (index, page) in pages.iter().enumerate() {
            let footer: Vec<&str> = page
                .texts
                .iter()
                .filter(|text| text.style == TextStyle::Footer)
                .map(|text| text.text.as_str())
                .collect();
            let number = (index + 1).to_string();
            assert_eq!(footer, vec!["Big", number.as_str()]);
        }
    }

    #[test]
    fn notes_use_two_columns() {
        let notes = (0..200)
            .map(|index| NoteEntry {
                term: format!("note {index:03}"),
                note: "a reasonably long note body that wraps over several lines".to_string(),
            })
            .collect();
        let document = ExportDocument::notes(ExportMetadata::new("Notes"), notes);
        let pages = layout_document(&document);
        let mut columns: Vec<i32> = pages[1]
            .texts
            .iter()
            .filter(|text| text.style == TextStyle::Entry && text.text.starts_with("note"))
            .map(|text| text.x.round() as i32)
            .collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn headings_are_not_stranded_at_column_bottom() {
        let document = ExportDocument::index(ExportMetadata::new("Big"), entries(400));
        for page in layout_document(&document) {
            for heading in page.texts.iter().filter(|text| text.style == TextStyle::LetterHeading) {
                assert!(heading.y - TextStyle::Entry.leading() >= CONTENT_BOTTOM - 14.0);
            }
        }
    }

    #[test]
    fn parses_hex_colours() {
        assert_eq!(parse_hex_color("#ff0000"), Some((1.0, 0.0, 0.0)));
        assert_eq!(parse_hex_color("f2849e"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }
}
