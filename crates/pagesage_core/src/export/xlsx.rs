//! Spreadsheet (.xlsx) exporter.
//!
//! Writes a minimal SpreadsheetML package with inline strings: an
//! `Index Info` sheet with the header block and an `Index` (or `Notes`)
//! sheet with a bold header row, merged letter-heading rows and one row per
//! entry. Without the `xlsx` feature the exporter reports
//! [`ExportError::RenderingUnavailable`].

use crate::export::{ExportDocument, ExportError};

/// Renders `document` into .xlsx bytes.
#[cfg(feature = "xlsx")]
pub fn render(document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
    backend::render(document)
}

#[cfg(not(feature = "xlsx"))]
pub fn render(_document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::RenderingUnavailable {
        format: crate::export::ExportFormat::Spreadsheet,
        backend: "xlsx",
    })
}

#[cfg(feature = "xlsx")]
mod backend {
    use crate::export::escape::escape_markup;
    use crate::export::grouping::group_rows;
    use crate::export::layout::parse_hex_color;
    use crate::export::{ExportBody, ExportDocument, ExportError};
    use crate::repo::settings_repo::DEFAULT_COLOR_SCHEME;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const STYLE_DEFAULT: u8 = 0;
    const STYLE_TITLE: u8 = 1;
    const STYLE_SECTION: u8 = 2;
    const STYLE_HEADER: u8 = 3;
    const STYLE_LETTER: u8 = 4;
    const STYLE_WRAPPED: u8 = 5;

    const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
    const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

    const CONTENT_TYPES: &str = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;
    const ROOT_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
    const WORKBOOK_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

    pub(super) fn render(document: &ExportDocument) -> Result<Vec<u8>, ExportError> {
        let labels = document.labels();
        let parts: [(&str, String); 7] = [
            ("[Content_Types].xml", xml_part(CONTENT_TYPES)),
            ("_rels/.rels", xml_part(ROOT_RELS)),
            ("xl/workbook.xml", workbook_xml(labels.section)),
            ("xl/_rels/workbook.xml.rels", xml_part(WORKBOOK_RELS)),
            ("xl/styles.xml", styles_xml(&document.metadata.accent_color)),
            ("xl/worksheets/sheet1.xml", info_sheet(document).to_xml()),
            ("xl/worksheets/sheet2.xml", body_sheet(document).to_xml()),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, xml) in &parts {
            zip.start_file(*name, deflated).map_err(render_error)?;
            zip.write_all(xml.as_bytes())?;
        }
        let cursor = zip.finish().map_err(render_error)?;
        Ok(cursor.into_inner())
    }

    fn render_error(err: impl std::fmt::Display) -> ExportError {
        ExportError::Render(err.to_string())
    }

    fn xml_part(body: &str) -> String {
        format!("{XML_DECL}\n{body}")
    }

    fn workbook_xml(body_sheet_name: &str) -> String {
        xml_part(&format!(
            r#"<workbook xmlns="{MAIN_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Index Info" sheetId="1" r:id="rId1"/><sheet name="{}" sheetId="2" r:id="rId2"/></sheets></workbook>"#,
            escape_markup(body_sheet_name)
        ))
    }

    fn styles_xml(accent_color: &str) -> String {
        let accent = argb(accent_color);
        xml_part(&format!(
            concat!(
                r#"<styleSheet xmlns="{ns}">"#,
                r#"<fonts count="5">"#,
                r#"<font><sz val="11"/><name val="Calibri"/></font>"#,
                r#"<font><b/><sz val="16"/><name val="Calibri"/></font>"#,
                r#"<font><b/><sz val="12"/><name val="Calibri"/></font>"#,
                r#"<font><b/><sz val="11"/><name val="Calibri"/></font>"#,
                r#"<font><b/><sz val="14"/><color rgb="{accent}"/><name val="Calibri"/></font>"#,
                r#"</fonts>"#,
                r#"<fills count="4">"#,
                r#"<fill><patternFill patternType="none"/></fill>"#,
                r#"<fill><patternFill patternType="gray125"/></fill>"#,
                r#"<fill><patternFill patternType="solid"><fgColor rgb="FFE2E8F0"/><bgColor indexed="64"/></patternFill></fill>"#,
                r#"<fill><patternFill patternType="solid"><fgColor rgb="FFF1F5F9"/><bgColor indexed="64"/></patternFill></fill>"#,
                r#"</fills>"#,
                r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
                r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
                r#"<cellXfs count="6">"#,
                r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
                r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
                r#"<xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
                r#"<xf numFmtId="0" fontId="3" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/>"#,
                r#"<xf numFmtId="0" fontId="4" fillId="3" borderId="0" xfId="0" applyFont="1" applyFill="1"/>"#,
                r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment wrapText="1" vertical="top"/></xf>"#,
                r#"</cellXfs>"#,
                r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
                r#"</styleSheet>"#
            ),
            ns = MAIN_NS,
            accent = accent
        ))
    }

    /// `#rrggbb` to an opaque `FFRRGGBB` colour, falling back to the default
    /// accent.
    pub(super) fn argb(color: &str) -> String {
        let valid = if parse_hex_color(color).is_some() {
            color
        } else {
            DEFAULT_COLOR_SCHEME
        };
        format!("FF{}", valid.trim().trim_start_matches('#').to_ascii_uppercase())
    }

    fn info_sheet(document: &ExportDocument) -> Sheet {
        let metadata = &document.metadata;
        let mut sheet = Sheet::new(vec![60.0]);
        sheet.push_row(&[(metadata.index_name.as_str(), STYLE_TITLE)]);
        sheet.push_row(&[(
            format!("Generated: {}", metadata.generated_label()).as_str(),
            STYLE_DEFAULT,
        )]);
        sheet.push_blank();

        if !metadata.books.is_empty() {
            sheet.push_row(&[("Books", STYLE_SECTION)]);
            for book in &metadata.books {
                sheet.push_row(&[(book.display_line().as_str(), STYLE_DEFAULT)]);
            }
            sheet.push_blank();
        }
        if !metadata.custom_properties.is_empty() {
            sheet.push_row(&[("Properties", STYLE_SECTION)]);
            for (name, value) in &metadata.custom_properties {
                sheet.push_row(&[(format!("{name}: {value}").as_str(), STYLE_DEFAULT)]);
            }
        }
        sheet
    }

    fn body_sheet(document: &ExportDocument) -> Sheet {
        let labels = document.labels();
        let (widths, detail_style) = match document.body {
            ExportBody::Index(_) => (vec![40.0, 60.0], STYLE_DEFAULT),
            ExportBody::Notes(_) => (vec![30.0, 80.0], STYLE_WRAPPED),
        };
        let mut sheet = Sheet::new(widths);
        sheet.push_row(&[("Term", STYLE_HEADER), (labels.column, STYLE_HEADER)]);

        if document.is_empty() {
            sheet.push_row(&[(labels.empty, STYLE_DEFAULT)]);
            return sheet;
        }
        for group in group_rows(document.rows()) {
            let row = sheet.push_row(&[(group.letter.to_string().as_str(), STYLE_LETTER)]);
            sheet.merge_across(row, 2);
            for entry in &group.rows {
                sheet.push_row(&[(entry.term, STYLE_DEFAULT), (entry.detail.as_str(), detail_style)]);
            }
        }
        sheet
    }

    /// Worksheet under construction; rows are 1-based.
    struct Sheet {
        widths: Vec<f32>,
        rows: Vec<String>,
        merges: Vec<String>,
    }

    impl Sheet {
        fn new(widths: Vec<f32>) -> Self {
            Self {
                widths,
                rows: Vec::new(),
                merges: Vec::new(),
            }
        }

        fn push_blank(&mut self) -> usize {
            self.push_row(&[])
        }

        fn push_row(&mut self, cells: &[(&str, u8)]) -> usize {
            let row = self.rows.len() + 1;
            let mut xml = format!(r#"<row r="{row}">"#);
            for (index, (text, style)) in cells.iter().enumerate() {
                xml.push_str(&format!(
                    r#"<c r="{}{row}" t="inlineStr" s="{style}"><is><t xml:space="preserve">{}</t></is></c>"#,
                    column_name(index),
                    escape_markup(&xml_text(text))
                ));
            }
            xml.push_str("</row>");
            self.rows.push(xml);
            row
        }

        fn merge_across(&mut self, row: usize, columns: usize) {
            let last = column_name(columns.saturating_sub(1));
            self.merges.push(format!("A{row}:{last}{row}"));
        }

        fn to_xml(&self) -> String {
            let mut xml = format!(r#"<worksheet xmlns="{MAIN_NS}">"#);
            xml.push_str("<cols>");
            for (index, width) in self.widths.iter().enumerate() {
                let column = index + 1;
                xml.push_str(&format!(
                    r#"<col min="{column}" max="{column}" width="{width}" customWidth="1"/>"#
                ));
            }
            xml.push_str("</cols><sheetData>");
            for row in &self.rows {
                xml.push_str(row);
            }
            xml.push_str("</sheetData>");
            if !self.merges.is_empty() {
                xml.push_str(&format!(r#"<mergeCells count="{}">"#, self.merges.len()));
                for merge in &self.merges {
                    xml.push_str(&format!(r#"<mergeCell ref="{merge}"/>"#));
                }
                xml.push_str("</mergeCells>");
            }
            xml.push_str("</worksheet>");
            xml_part(&xml)
        }
    }

    /// Zero-based column index to its letter; exports use at most two
    /// columns.
    fn column_name(index: usize) -> char {
        char::from(b'A' + (index % 26) as u8)
    }

    /// Drops control characters XML 1.0 cannot carry.
    fn xml_text(text: &str) -> String {
        text.chars()
            .filter(|&ch| !ch.is_control() || matches!(ch, '\t' | '\n' | '\r'))
            .collect()
    }

}
