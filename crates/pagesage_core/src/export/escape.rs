//! Format-specific escaping. Pure functions, no state.

/// Escapes LaTeX special characters: `& % $ # _ { } ~ ^ \`.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            '\\' => escaped.push_str(r"\textbackslash{}"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escapes `& < >` for text embedded in XML-style markup.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_latex, escape_markup};

    #[test]
    fn latex_specials_are_escaped_once() {
        assert_eq!(escape_latex("R&D 100% $5 #1 a_b {x}"), r"R\&D 100\% \$5 \#1 a\_b \{x\}");
        assert_eq!(
            escape_latex(r"~^\"),
            r"\textasciitilde{}\textasciicircum{}\textbackslash{}"
        );
        assert_eq!(escape_latex("plain"), "plain");
    }

    #[test]
    fn markup_escapes_ampersand_and_angle_brackets() {
        assert_eq!(escape_markup("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }
}
