use pagesage_core::db::open_db_in_memory;
use pagesage_core::{
    IndexEntry, IndexServiceError, ReferenceParseError, ReferenceService,
    SqliteReferenceRepository, SqliteTermRepository, TermService, WriteOutcome,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> ReferenceService<SqliteReferenceRepository<'_>> {
    ReferenceService::new(SqliteReferenceRepository::try_new(conn).unwrap())
}

fn entry(term: &str, references: &[&str]) -> IndexEntry {
    IndexEntry {
        term: term.to_string(),
        references: references.iter().map(|r| r.to_string()).collect(),
    }
}

fn reference_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM page_references;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn adding_same_reference_twice_reports_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    assert_eq!(references.add("algorithm", "1:5").unwrap(), WriteOutcome::Applied);
    assert_eq!(references.add("Algorithm", " 1:5 ").unwrap(), WriteOutcome::Duplicate);
    assert_eq!(reference_count(&conn), 1);
}

#[test]
fn single_page_and_range_with_same_start_are_distinct() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    references.add("array", "1:20").unwrap();
    assert_eq!(references.add("array", "1:20-22").unwrap(), WriteOutcome::Applied);
    assert_eq!(references.add("array", "1:20-22").unwrap(), WriteOutcome::Duplicate);
    assert_eq!(reference_count(&conn), 2);
}

#[test]
fn degenerate_range_is_stored_as_single_page() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    references.add("queue", "2:25-25").unwrap();
    assert_eq!(references.add("queue", "2:25").unwrap(), WriteOutcome::Duplicate);
    assert_eq!(references.list_all().unwrap(), vec![entry("queue", &["2:25"])]);
}

#[test]
fn malformed_reference_is_rejected_before_store_access() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    let err = references.add("stack", "2-22").unwrap_err();
    assert!(matches!(
        err,
        IndexServiceError::InvalidReference(ReferenceParseError::InvalidFormat(_))
    ));
    let err = references.add("stack", "2:24-22").unwrap_err();
    assert!(matches!(
        err,
        IndexServiceError::InvalidReference(ReferenceParseError::InvalidRange { start: 24, end: 22 })
    ));
    let err = references.add("stack", "2:24-0").unwrap_err();
    assert!(matches!(
        err,
        IndexServiceError::InvalidReference(ReferenceParseError::InvalidRange { start: 24, end: 0 })
    ));
    let terms: i64 = conn
        .query_row("SELECT COUNT(*) FROM terms;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(terms, 0);
}

#[test]
fn list_all_sorts_terms_and_references() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    references.add("tree", "3:8-12").unwrap();
    references.add("Algorithm", "2:3").unwrap();
    references.add("algorithm", "1:12-15").unwrap();
    references.add("algorithm", "1:5").unwrap();
    references.add("binary search", "2:10-12").unwrap();

    assert_eq!(
        references.list_all().unwrap(),
        vec![
            entry("Algorithm", &["1:5", "1:12-15", "2:3"]),
            entry("binary search", &["2:10-12"]),
            entry("tree", &["3:8-12"]),
        ]
    );
}

#[test]
fn list_all_skips_note_only_terms() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);
    let terms = TermService::new(SqliteTermRepository::try_new(&conn).unwrap());

    terms.set_note("idea", "no pages yet").unwrap();
    references.add("sorting", "2:5-9").unwrap();

    assert_eq!(references.list_all().unwrap(), vec![entry("sorting", &["2:5-9"])]);
}

#[test]
fn search_matches_substring_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    references.add("binary tree", "3:5").unwrap();
    references.add("Tree traversal", "3:8-12").unwrap();
    references.add("stack", "2:22-24").unwrap();

    let found: Vec<String> = references
        .search("TREE")
        .unwrap()
        .into_iter()
        .map(|entry| entry.term)
        .collect();
    assert_eq!(found, vec!["binary tree", "Tree traversal"]);
    assert!(references.search("heap").unwrap().is_empty());
}

#[test]
fn removing_exact_reference_matches_null_end_exactly() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    references.add("array", "1:20").unwrap();
    references.add("array", "1:20-22").unwrap();

    assert_eq!(references.remove("array", Some("1:20")).unwrap(), WriteOutcome::Applied);
    assert_eq!(references.list_all().unwrap(), vec![entry("array", &["1:20-22"])]);
    assert_eq!(references.remove("array", Some("1:20")).unwrap(), WriteOutcome::NotFound);
}

#[test]
fn removing_last_reference_deletes_orphan_term() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);
    let terms = TermService::new(SqliteTermRepository::try_new(&conn).unwrap());

    references.add("hash table", "2:30").unwrap();
    references.remove("hash table", Some("2:30")).unwrap();
    assert!(terms.get_term("hash table").unwrap().is_none());
}

#[test]
fn term_with_note_survives_reference_removal() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);
    let terms = TermService::new(SqliteTermRepository::try_new(&conn).unwrap());

    references.add("recursion", "3:1-8").unwrap();
    terms.set_note("recursion", "see recursion").unwrap();
    references.remove("recursion", None).unwrap();

    let stored = terms.get_term("recursion").unwrap().unwrap();
    assert_eq!(stored.note, "see recursion");
    assert!(references.list_all().unwrap().is_empty());
}

#[test]
fn removing_all_references_of_term() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    references.add("algorithm", "1:5").unwrap();
    references.add("algorithm", "2:3").unwrap();
    references.add("array", "1:20").unwrap();

    assert_eq!(references.remove("ALGORITHM", None).unwrap(), WriteOutcome::Applied);
    assert_eq!(references.list_all().unwrap(), vec![entry("array", &["1:20"])]);
    assert_eq!(references.remove("algorithm", None).unwrap(), WriteOutcome::NotFound);
}

#[test]
fn update_rewrites_matching_reference() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    references.add("linked list", "2:15-20").unwrap();
    assert_eq!(
        references.update("linked list", "2:15-20", "2:16-21").unwrap(),
        WriteOutcome::Applied
    );
    assert_eq!(
        references.list_all().unwrap(),
        vec![entry("linked list", &["2:16-21"])]
    );
    assert_eq!(
        references.update("linked list", "2:15-20", "2:1").unwrap(),
        WriteOutcome::NotFound
    );
    assert_eq!(
        references.update("nobody", "2:15-20", "2:1").unwrap(),
        WriteOutcome::NotFound
    );
}

#[test]
fn update_onto_existing_reference_is_duplicate_and_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    references.add("stack", "2:22").unwrap();
    references.add("stack", "2:24").unwrap();

    assert_eq!(
        references.update("stack", "2:22", "2:24").unwrap(),
        WriteOutcome::Duplicate
    );
    assert_eq!(references.list_all().unwrap(), vec![entry("stack", &["2:22", "2:24"])]);
}

#[test]
fn recent_lists_newest_rows_first() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    for page in 1..=7 {
        references.add("algorithm", &format!("1:{page}")).unwrap();
    }
    references.add("zeta", "9:9").unwrap();

    let recent = references.recent(None).unwrap();
    let shown: Vec<(&str, &str)> = recent
        .iter()
        .map(|row| (row.term.as_str(), row.reference.as_str()))
        .collect();
    assert_eq!(
        shown,
        vec![
            ("zeta", "9:9"),
            ("algorithm", "1:7"),
            ("algorithm", "1:6"),
            ("algorithm", "1:5"),
            ("algorithm", "1:4"),
        ]
    );
    assert!(recent.windows(2).all(|pair| pair[0].reference_id > pair[1].reference_id));
    assert_eq!(references.recent(Some(500)).unwrap().len(), 8);
}

#[test]
fn recent_honors_limits_above_one_hundred() {
    let conn = open_db_in_memory().unwrap();
    let references = service(&conn);

    for page in 1..=160 {
        references.add("algorithm", &format!("1:{page}")).unwrap();
    }

    let recent = references.recent(Some(150)).unwrap();
    assert_eq!(recent.len(), 150);
    assert_eq!(recent[0].reference, "1:160");
    assert_eq!(recent[149].reference, "1:11");
    assert_eq!(references.recent(Some(u32::MAX)).unwrap().len(), 160);
}
