//! LaTeX renderer: a title page followed by a `theindex` environment.

use crate::export::escape::escape_latex;
use crate::export::grouping::group_rows;
use crate::export::ExportDocument;

pub fn render(document: &ExportDocument) -> String {
    let metadata = &document.metadata;
    let mut out: Vec<String> = Vec::new();

    // Comment lines are not escaped; a newline would end the comment.
    out.push(format!("% {}", single_line(&metadata.index_name)));
    out.push(format!("% Generated: {}", metadata.generated_label()));
    out.push(String::new());

    out.push(r"\begin{titlepage}".to_string());
    out.push(r"\centering".to_string());
    out.push(String::new());
    out.push(r"\vspace*{2cm}".to_string());
    out.push(format!(
        r"{{\Huge \textbf{{{}}}\par}}",
        escape_latex(&metadata.index_name)
    ));
    out.push(r"\vspace{2cm}".to_string());
    out.push(String::new());

    if !metadata.books.is_empty() {
        out.push(r"\textbf{Books:}\\[0.5cm]".to_string());
        for book in &metadata.books {
            out.push(format!(r"{}\\", escape_latex(&book.display_line())));
        }
        out.push(r"\vspace{1cm}".to_string());
    }
    if !metadata.custom_properties.is_empty() {
        out.push(r"\textbf{Properties:}\\[0.5cm]".to_string());
        for (name, value) in &metadata.custom_properties {
            out.push(format!(r"{}: {}\\", escape_latex(name), escape_latex(value)));
        }
        out.push(r"\vspace{1cm}".to_string());
    }

    out.push(r"\vfill".to_string());
    out.push(format!(r"{{\small Generated: {}}}", metadata.generated_date()));
    out.push(r"\end{titlepage}".to_string());
    out.push(String::new());

    if document.is_empty() {
        out.push(format!("% {}", document.labels().empty));
    } else {
        out.push(r"\begin{theindex}".to_string());
        out.push(String::new());
        for (index, group) in group_rows(document.rows()).iter().enumerate() {
            if index > 0 {
                out.push(String::new());
            }
            out.push(r"  \indexspace".to_string());
            out.push(format!(
                r"  \textbf{{{}}}",
                escape_latex(&group.letter.to_string())
            ));
            out.push(String::new());
            for row in &group.rows {
                out.push(format!(
                    r"  \item {}, {}",
                    escape_latex(row.term),
                    escape_latex(&row.detail)
                ));
            }
        }
        out.push(String::new());
        out.push(r"\end{theindex}".to_string());
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
