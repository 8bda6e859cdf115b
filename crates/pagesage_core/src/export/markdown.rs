//! Markdown renderer.

use crate::export::grouping::group_rows;
use crate::export::ExportDocument;

pub fn render(document: &ExportDocument) -> String {
    let metadata = &document.metadata;
    let labels = document.labels();
    let mut out: Vec<String> = Vec::new();

    out.push(format!("# {}", metadata.index_name));
    out.push(String::new());
    out.push(format!("*Generated: {}*", metadata.generated_label()));
    out.push(String::new());

    if !metadata.books.is_empty() {
        out.push("## Books".to_string());
        out.push(String::new());
        for book in &metadata.books {
            out.push(format!(
                "- **Book {}**: {}{}",
                book.book_number,
                book.name,
                book.page_suffix()
            ));
        }
        out.push(String::new());
    }
    if !metadata.custom_properties.is_empty() {
        out.push("## Properties".to_string());
        out.push(String::new());
        for (name, value) in &metadata.custom_properties {
            out.push(format!("- **{name}**: {value}"));
        }
        out.push(String::new());
    }

    out.push("---".to_string());
    out.push(String::new());
    out.push(format!("# {}", labels.section));
    out.push(String::new());

    if document.is_empty() {
        out.push(format!("*{}*", labels.empty));
    } else {
        for (index, group) in group_rows(document.rows()).iter().enumerate() {
            if index > 0 {
                out.push(String::new());
            }
            out.push(format!("## {}", group.letter));
            out.push(String::new());
            for row in &group.rows {
                out.push(format!("- **{}**: {}", row.term, row.detail));
            }
        }
    }

    out.push(String::new());
    out.push("---".to_string());
    out.push(format!("*{}: {}*", labels.total, document.entry_count()));

    let mut text = out.join("\n");
    text.push('\n');
    text
}
