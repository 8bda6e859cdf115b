//! PDF exporter.
//!
//! Draws the pages produced by [`crate::export::layout`] with the standard
//! Helvetica fonts through `lopdf`. Without the `pdf` feature the exporter
//! reports [`ExportError::RenderingUnavailable`].

use crate::export::{ExportDocument, ExportError};

/// Renders `document` into PDF bytes.
#[cfg(feature = "pdf")]
pub fn render(document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
    backend::render(document)
}

#[cfg(not(feature = "pdf"))]
pub fn render(_document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::RenderingUnavailable {
        format: crate::export::ExportFormat::Pdf,
        backend: "pdf",
    })
}

#[cfg(feature = "pdf")]
mod backend {
    use crate::export::layout::{
        layout_document, parse_hex_color, Band, PageLayout, PlacedText, PAGE_HEIGHT, PAGE_WIDTH,
    };
    use crate::export::{ExportDocument, ExportError};
    use crate::repo::settings_repo::DEFAULT_COLOR_SCHEME;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    const REGULAR_FONT: &str = "F1";
    const BOLD_FONT: &str = "F2";
    type Rgb = (f32, f32, f32);
    const BAND_FILL: Rgb = (0.945, 0.961, 0.976);
    const TEXT_FILL: Rgb = (0.0, 0.0, 0.0);

    pub(super) fn render(document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
        let accent = parse_hex_color(&document.metadata.accent_color)
            .or_else(|| parse_hex_color(DEFAULT_COLOR_SCHEME))
            .unwrap_or(TEXT_FILL);

        let mut pdf = Document::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let regular_id = pdf.add_object(font_dictionary("Helvetica"));
        let bold_id = pdf.add_object(font_dictionary("Helvetica-Bold"));
        let resources_id = pdf.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR_FONT => regular_id,
                BOLD_FONT => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in layout_document(document) {
            let content = Content {
                operations: page_operations(&page, accent),
            };
            let encoded = content.encode().map_err(render_error)?;
            let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = pdf.add_object(dictionary! {
            "Title" => Object::string_literal(win_ansi(&document.metadata.index_name)),
            "Producer" => Object::string_literal("pagesage"),
        });
        pdf.trailer.set("Root", catalog_id);
        pdf.trailer.set("Info", info_id);
        pdf.compress();

        let mut bytes = Vec::new();
        pdf.save_to(&mut bytes).map_err(render_error)?;
        Ok(bytes)
    }

    fn font_dictionary(base_font: &str) -> lopdf::Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
            "Encoding" => "WinAnsiEncoding",
        }
    }

    fn page_operations(page: &PageLayout, accent: Rgb) -> Vec<Operation> {
        let mut operations = Vec::new();
        for band in &page.bands {
            push_band(&mut operations, band);
        }
        for text in &page.texts {
            push_text(&mut operations, text, accent);
        }
        operations
    }

    fn push_band(operations: &mut Vec<Operation>, band: &Band) {
        operations.push(fill_color(BAND_FILL));
        operations.push(Operation::new(
            "re",
            vec![
                band.x.into(),
                band.y.into(),
                band.width.into(),
                band.height.into(),
            ],
        ));
        operations.push(Operation::new("f", vec![]));
    }

    fn push_text(operations: &mut Vec<Operation>, text: &PlacedText, accent: Rgb) {
        let font = if text.style.is_bold() {
            BOLD_FONT
        } else {
            REGULAR_FONT
        };
        let color = if text.style.is_accent() {
            accent
        } else {
            TEXT_FILL
        };
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(font.as_bytes().to_vec()),
                text.style.font_size().into(),
            ],
        ));
        operations.push(fill_color(color));
        operations.push(Operation::new("Td", vec![text.x.into(), text.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(&text.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    fn fill_color((red, green, blue): Rgb) -> Operation {
        Operation::new("rg", vec![red.into(), green.into(), blue.into()])
    }

    fn render_error(err: impl std::fmt::Display) -> ExportError {
        ExportError::Render(err.to_string())
    }

    /// Encodes text for the standard fonts' WinAnsi encoding; characters
    /// outside it become `?`.
    pub(super) fn win_ansi(text: &str) -> Vec<u8> {
        text.chars()
            .map(|ch| match ch {
                '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => ch as u8,
                '€' => 0x80,
                '…' => 0x85,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '\t' => b' ',
                _ => b'?',
            })
            .collect()
    }

}
