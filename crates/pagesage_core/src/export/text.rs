//! Plain-text renderer.

use crate::export::grouping::group_rows;
use crate::export::ExportDocument;

const WIDTH: usize = 60;
const GROUP_RULE: usize = 40;

/// Renders banners, header sections, letter groups and the trailing total.
pub fn render(document: &ExportDocument) -> String {
    let metadata = &document.metadata;
    let labels = document.labels();
    let banner = "=".repeat(WIDTH);
    let mut out: Vec<String> = Vec::new();

    out.push(banner.clone());
    out.push(centered(&metadata.index_name));
    out.push(banner.clone());
    out.push(format!("Generated: {}", metadata.generated_label()));
    out.push(banner.clone());
    out.push(String::new());

    if !metadata.books.is_empty() {
        out.push("Books:".to_string());
        out.push("-".repeat(WIDTH));
        out.extend(
            metadata
                .books
                .iter()
                .map(|book| format!("  {}", book.display_line())),
        );
        out.push(String::new());
    }
    if !metadata.custom_properties.is_empty() {
        out.push("Properties:".to_string());
        out.push("-".repeat(WIDTH));
        out.extend(
            metadata
                .custom_properties
                .iter()
                .map(|(name, value)| format!("  {name}: {value}")),
        );
        out.push(String::new());
    }

    out.push(banner.clone());
    out.push(centered(&labels.section.to_uppercase()));
    out.push(banner.clone());
    out.push(String::new());

    if document.is_empty() {
        out.push(labels.empty.to_string());
    } else {
        for (index, group) in group_rows(document.rows()).iter().enumerate() {
            if index > 0 {
                out.push(String::new());
            }
            out.push(group.letter.to_string());
            out.push("-".repeat(GROUP_RULE));
            for row in &group.rows {
                out.push(format!("  {}: {}", row.term, row.detail));
            }
        }
    }

    out.push(String::new());
    out.push(banner.clone());
    out.push(format!("{}: {}", labels.total, document.entry_count()));
    out.push(banner);

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn centered(text: &str) -> String {
    format!("{text:^WIDTH$}").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::centered;

    #[test]
    fn centred_titles_have_no_trailing_padding() {
        let line = centered("INDEX");
        assert_eq!(line.trim_start(), "INDEX");
        assert_eq!(line.len(), 27 + "INDEX".len());
    }
}
