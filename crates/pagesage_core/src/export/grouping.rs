//! First-letter grouping shared by every exporter.
//!
//! Rows are stably sorted by `(group is '#', case-folded term)` and then cut
//! into runs of equal group key, so each heading appears once, right before
//! its first member.

use crate::export::ExportRow;
use crate::model::term::fold_case;

/// Group key for terms not starting with an ASCII letter.
pub const OTHER_GROUP: char = '#';

/// Group key of `text`: its uppercased first character when that is `A-Z`,
/// otherwise [`OTHER_GROUP`].
pub fn normalize_first_letter(text: &str) -> char {
    match text.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => first.to_ascii_uppercase(),
        _ => OTHER_GROUP,
    }
}

/// Sort key placing lettered groups before `#`, then case-folded term.
pub fn sort_key(term: &str) -> (bool, String) {
    (normalize_first_letter(term) == OTHER_GROUP, fold_case(term))
}

/// Sorts terms in export order.
pub fn sort_terms<T>(items: &mut [T], term: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| sort_key(term(item)));
}

/// Rows of one heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LetterGroup<'a> {
    pub letter: char,
    pub rows: Vec<ExportRow<'a>>,
}

/// Sorts `rows` and splits them into consecutive letter groups.
pub(crate) fn group_rows(mut rows: Vec<ExportRow<'_>>) -> Vec<LetterGroup<'_>> {
    sort_terms(&mut rows, |row| row.term);

    let mut groups: Vec<LetterGroup<'_>> = Vec::new();
    for row in rows {
        let letter = normalize_first_letter(row.term);
        match groups.last_mut() {
            Some(group) if group.letter == letter => group.rows.push(row),
            _ => groups.push(LetterGroup {
                letter,
                rows: vec![row],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::{group_rows, normalize_first_letter, sort_key, OTHER_GROUP};
    use crate::export::ExportRow;

    fn row(term: &str) -> ExportRow<'_> {
        ExportRow {
            term,
            detail: String::new(),
        }
    }

    #[test]
    fn letters_group_by_uppercase_and_everything_else_is_other() {
        assert_eq!(normalize_first_letter("apple"), 'A');
        assert_eq!(normalize_first_letter("Zebra"), 'Z');
        assert_eq!(normalize_first_letter("7-Up"), OTHER_GROUP);
        assert_eq!(normalize_first_letter("_private"), OTHER_GROUP);
        assert_eq!(normalize_first_letter("Ärger"), OTHER_GROUP);
        assert_eq!(normalize_first_letter(""), OTHER_GROUP);
    }

    #[test]
    fn other_group_sorts_after_letters() {
        let groups = group_rows(vec![row("Zebra"), row("apple"), row("7-Up"), row("Banana")]);
        let layout: Vec<(char, Vec<&str>)> = groups
            .iter()
            .map(|group| (group.letter, group.rows.iter().map(|row| row.term).collect()))
            .collect();
        assert_eq!(
            layout,
            vec![
                ('A', vec!["apple"]),
                ('B', vec!["Banana"]),
                ('Z', vec!["Zebra"]),
                ('#', vec!["7-Up"]),
            ]
        );
    }

    #[test]
    fn terms_sort_case_insensitively_within_a_group() {
        let groups = group_rows(vec![row("beta"), row("Alpha"), row("alps")]);
        let terms: Vec<&str> = groups.iter().flat_map(|group| group.rows.iter().map(|row| row.term)).collect();
        assert_eq!(terms, vec!["Alpha", "alps", "beta"]);
    }

    #[test]
    fn sorting_uses_full_case_folding() {
        assert_eq!(sort_key("Straße"), sort_key("STRASSE"));
        assert_eq!(sort_key("ΟΔΟΣ"), sort_key("οδος"));

        let groups = group_rows(vec![row("Strasse"), row("Straßburg")]);
        let terms: Vec<&str> = groups.iter().flat_map(|group| group.rows.iter().map(|row| row.term)).collect();
        assert_eq!(terms, vec!["Straßburg", "Strasse"]);
    }
}
