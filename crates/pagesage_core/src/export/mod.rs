//! Index and notes export.
//!
//! # Responsibility
//! - Hold the logical export document (metadata + index or notes body).
//! - Dispatch rendering over [`ExportFormat`] and write finished output to a
//!   path or stream.
//!
//! # Invariants
//! - Every format applies the same grouping and sort order (see
//!   [`grouping`]), with the `#` group last.
//! - A missing binary backend is reported as
//!   [`ExportError::RenderingUnavailable`], never as a data error.

pub mod csv;
pub mod escape;
pub mod grouping;
pub mod latex;
pub mod layout;
pub mod markdown;
pub mod pdf;
pub mod source;
pub mod text;
pub mod xlsx;

use crate::model::book::Book;
use crate::model::entry::{IndexEntry, NoteEntry};
use crate::repo::settings_repo::{DEFAULT_COLOR_SCHEME, DEFAULT_INDEX_NAME};
use chrono::{Local, NaiveDateTime};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

/// Timestamp layout used by every header block.
pub(crate) const GENERATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    PlainText,
    Markdown,
    Latex,
    Csv,
    Spreadsheet,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 6] = [
        Self::PlainText,
        Self::Markdown,
        Self::Latex,
        Self::Csv,
        Self::Spreadsheet,
        Self::Pdf,
    ];

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::Markdown => "md",
            Self::Latex => "tex",
            Self::Csv => "csv",
            Self::Spreadsheet => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Markdown => "text/markdown",
            Self::Latex => "application/x-tex",
            Self::Csv => "text/csv",
            Self::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            Self::Pdf => "application/pdf",
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self, Self::Spreadsheet | Self::Pdf)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Markdown => "markdown",
            Self::Latex => "latex",
            Self::Csv => "csv",
            Self::Spreadsheet => "xlsx",
            Self::Pdf => "pdf",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    /// Accepts the display name or the file extension, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted || format.extension() == wanted)
            .ok_or_else(|| ExportError::UnknownFormat(s.trim().to_string()))
    }
}

/// Book line shown in export header blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub book_number: String,
    pub name: String,
    pub page_count: Option<i64>,
}

impl BookSummary {
    /// `Book 1: Name (300 pages)`; the page suffix is omitted without a
    /// positive page count.
    pub fn display_line(&self) -> String {
        format!("Book {}: {}{}", self.book_number, self.name, self.page_suffix())
    }

    pub(crate) fn page_suffix(&self) -> String {
        match self.page_count.filter(|count| *count > 0) {
            Some(count) => format!(" ({count} pages)"),
            None => String::new(),
        }
    }
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            book_number: book.book_number.clone(),
            name: book.name.clone(),
            page_count: book.page_count,
        }
    }
}

/// Header block data shared by every format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub index_name: String,
    pub generated_at: NaiveDateTime,
    pub books: Vec<BookSummary>,
    /// Ordered `(name, value)` pairs.
    pub custom_properties: Vec<(String, String)>,
    /// `#rrggbb` accent used by binary formats for headings.
    pub accent_color: String,
}

impl ExportMetadata {
    /// Metadata stamped with the current local time and no books/properties.
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            generated_at: Local::now().naive_local(),
            books: Vec::new(),
            custom_properties: Vec::new(),
            accent_color: DEFAULT_COLOR_SCHEME.to_string(),
        }
    }

    /// Replaces the timestamp, e.g. for reproducible output.
    pub fn with_generated_at(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn generated_label(&self) -> String {
        self.generated_at.format(GENERATED_FORMAT).to_string()
    }

    pub fn generated_date(&self) -> String {
        self.generated_at.format("%Y-%m-%d").to_string()
    }
}

impl Default for ExportMetadata {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}

/// What an export lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportBody {
    Index(Vec<IndexEntry>),
    Notes(Vec<NoteEntry>),
}

/// The logical document every format renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub body: ExportBody,
}

impl ExportDocument {
    pub fn index(metadata: ExportMetadata, entries: Vec<IndexEntry>) -> Self {
        Self {
            metadata,
            body: ExportBody::Index(entries),
        }
    }

    pub fn notes(metadata: ExportMetadata, notes: Vec<NoteEntry>) -> Self {
        Self {
            metadata,
            body: ExportBody::Notes(notes),
        }
    }

    pub fn entry_count(&self) -> usize {
        match &self.body {
            ExportBody::Index(entries) => entries.len(),
            ExportBody::Notes(notes) => notes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    pub(crate) fn labels(&self) -> &'static BodyLabels {
        match self.body {
            ExportBody::Index(_) => &INDEX_LABELS,
            ExportBody::Notes(_) => &NOTES_LABELS,
        }
    }

    /// Body rows flattened to `(term, detail)`; references are comma-joined.
    pub(crate) fn rows(&self) -> Vec<ExportRow<'_>> {
        match &self.body {
            ExportBody::Index(entries) => entries
                .iter()
                .map(|entry| ExportRow {
                    term: &entry.term,
                    detail: entry.references.join(", "),
                })
                .collect(),
            ExportBody::Notes(notes) => notes
                .iter()
                .map(|note| ExportRow {
                    term: &note.term,
                    detail: note.note.clone(),
                })
                .collect(),
        }
    }
}

/// One body line before format-specific rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExportRow<'a> {
    pub term: &'a str,
    pub detail: String,
}

/// Body-dependent wording.
#[derive(Debug)]
pub(crate) struct BodyLabels {
    /// Section title, e.g. `Index`.
    pub section: &'static str,
    /// Second column header in tabular formats.
    pub column: &'static str,
    /// Trailing summary prefix.
    pub total: &'static str,
    /// Marker written instead of groups when the body is empty.
    pub empty: &'static str,
}

static INDEX_LABELS: BodyLabels = BodyLabels {
    section: "Index",
    column: "References",
    total: "Total entries",
    empty: "Empty index",
};

static NOTES_LABELS: BodyLabels = BodyLabels {
    section: "Notes",
    column: "Notes",
    total: "Total notes",
    empty: "Empty notes",
};

/// Rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutput {
    Text(String),
    Binary(Vec<u8>),
}

impl ExportOutput {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }
}

/// Export failure.
#[derive(Debug)]
pub enum ExportError {
    /// The backend for a binary format is not compiled in.
    RenderingUnavailable {
        format: ExportFormat,
        backend: &'static str,
    },
    /// Writing to the destination failed.
    Io(std::io::Error),
    /// The backend rejected the document.
    Render(String),
    /// A format name or extension that matches no [`ExportFormat`].
    UnknownFormat(String),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RenderingUnavailable { format, backend } => write!(
                f,
                "{format} export is unavailable; rebuild with the `{backend}` feature enabled"
            ),
            Self::Io(err) => write!(f, "{err}"),
            Self::Render(message) => write!(f, "render failed: {message}"),
            Self::UnknownFormat(name) => write!(f, "unknown export format `{name}`"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::RenderingUnavailable { .. } | Self::Render(_) | Self::UnknownFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Renders `document` in `format`.
pub fn render(format: ExportFormat, document: &ExportDocument) -> Result<ExportOutput, ExportError> {
    let started_at = Instant::now();
    let result = match format {
        ExportFormat::PlainText => Ok(ExportOutput::Text(text::render(document))),
        ExportFormat::Markdown => Ok(ExportOutput::Text(markdown::render(document))),
        ExportFormat::Latex => Ok(ExportOutput::Text(latex::render(document))),
        ExportFormat::Csv => Ok(ExportOutput::Text(csv::render(document))),
        ExportFormat::Spreadsheet => xlsx::render(document).map(ExportOutput::Binary),
        ExportFormat::Pdf => pdf::render(document).map(ExportOutput::Binary),
    };

    match &result {
        Ok(output) => info!(
            "event=export_render module=export status=ok format={} entries={} bytes={} duration_ms={}",
            format,
            document.entry_count(),
            output.as_bytes().len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=export_render module=export status=error format={} error={}",
            format, err
        ),
    }
    result
}

/// Renders and writes to `writer`.
pub fn export_to_writer<W: Write>(
    format: ExportFormat,
    document: &ExportDocument,
    writer: &mut W,
) -> Result<(), ExportError> {
    let output = render(format, document)?;
    writer.write_all(output.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Renders and writes to a file at `path`, replacing it.
pub fn export_to_path(
    format: ExportFormat,
    document: &ExportDocument,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let output = render(format, document)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(output.as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{BookSummary, ExportError, ExportFormat};

    #[test]
    fn formats_parse_from_name_or_extension() {
        assert_eq!("md".parse::<ExportFormat>().ok(), Some(ExportFormat::Markdown));
        assert_eq!("TEXT".parse::<ExportFormat>().ok(), Some(ExportFormat::PlainText));
        assert_eq!("xlsx".parse::<ExportFormat>().ok(), Some(ExportFormat::Spreadsheet));
        assert!(matches!(
            " DOCX ".parse::<ExportFormat>(),
            Err(ExportError::UnknownFormat(name)) if name == "DOCX"
        ));
    }

    #[test]
    fn only_pdf_and_spreadsheet_are_binary() {
        let binary: Vec<_> = ExportFormat::ALL
            .into_iter()
            .filter(|format| format.is_binary())
            .collect();
        assert_eq!(binary, vec![ExportFormat::Spreadsheet, ExportFormat::Pdf]);
    }

    #[test]
    fn book_line_omits_missing_page_count() {
        let mut book = BookSummary {
            book_number: "2".to_string(),
            name: "Networking".to_string(),
            page_count: Some(120),
        };
        assert_eq!(book.display_line(), "Book 2: Networking (120 pages)");
        book.page_count = None;
        assert_eq!(book.display_line(), "Book 2: Networking");
    }
}
