//! CSV renderer (RFC 4180: minimal quoting, CRLF records).

use crate::export::grouping::group_rows;
use crate::export::ExportDocument;

const RECORD_END: &str = "\r\n";

/// Header row `Term,References` (`Term,Notes`), then one record per entry in
/// export order. Letter headings are not emitted as records.
pub fn render(document: &ExportDocument) -> String {
    let mut out = String::new();
    push_record(&mut out, &["Term", document.labels().column]);
    for group in group_rows(document.rows()) {
        for row in &group.rows {
            push_record(&mut out, &[row.term, row.detail.as_str()]);
        }
    }
    out
}

fn push_record(out: &mut String, fields: &[&str]) {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&quote_field(field));
    }
    out.push_str(RECORD_END);
}

/// Quotes a field containing a delimiter, quote or line break; embedded
/// quotes are doubled.
pub fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::quote_field;

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(quote_field("Kernel"), "Kernel");
    }

    #[test]
    fn delimiters_quotes_and_newlines_force_quoting() {
        assert_eq!(quote_field("1:5, 2:7"), "\"1:5, 2:7\"");
        assert_eq!(quote_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_field("line\nbreak"), "\"line\nbreak\"");
    }
}
