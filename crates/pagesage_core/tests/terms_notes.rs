use pagesage_core::db::open_db_in_memory;
use pagesage_core::{
    IndexServiceError, ReferenceService, SqliteReferenceRepository, SqliteTermRepository,
    TermEnrichment, TermService, WriteOutcome,
};
use rusqlite::Connection;

fn term_service(conn: &Connection) -> TermService<SqliteTermRepository<'_>> {
    TermService::new(SqliteTermRepository::try_new(conn).unwrap())
}

fn reference_service(conn: &Connection) -> ReferenceService<SqliteReferenceRepository<'_>> {
    ReferenceService::new(SqliteReferenceRepository::try_new(conn).unwrap())
}

fn term_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM terms;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn upsert_is_case_insensitive_and_keeps_first_casing() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);

    let first = terms.upsert_term("Binary Tree").unwrap();
    let second = terms.upsert_term("  binary TREE ").unwrap();
    assert_eq!(first, second);
    assert_eq!(term_count(&conn), 1);

    let stored = terms.get_term("BINARY tree").unwrap().unwrap();
    assert_eq!(stored.name, "Binary Tree");
    assert!(!stored.has_note());
}

#[test]
fn upsert_applies_full_unicode_case_folding() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);

    let street = terms.upsert_term("Straße").unwrap();
    assert_eq!(terms.upsert_term("STRASSE").unwrap(), street);
    assert_eq!(terms.upsert_term("strasse").unwrap(), street);

    let road = terms.upsert_term("ΟΔΟΣ").unwrap();
    assert_eq!(terms.upsert_term("οδος").unwrap(), road);
    assert_eq!(terms.upsert_term("Οδοσ").unwrap(), road);

    assert_eq!(term_count(&conn), 2);
    assert_eq!(terms.get_term("STRASSE").unwrap().unwrap().name, "Straße");

    let references = reference_service(&conn);
    references.add("STRASSE", "1:4").unwrap();
    let found: Vec<String> = references
        .search("straß")
        .unwrap()
        .into_iter()
        .map(|entry| entry.term)
        .collect();
    assert_eq!(found, vec!["Straße"]);
}

#[test]
fn blank_term_names_are_invalid_input() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);

    let err = terms.upsert_term("   ").unwrap_err();
    assert!(matches!(err, IndexServiceError::InvalidInput(_)));
}

#[test]
fn set_note_creates_term_without_references() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);

    assert_eq!(
        terms.set_note("Recursion", "  see also: induction ").unwrap(),
        WriteOutcome::Applied
    );
    assert_eq!(
        terms.get_note("recursion").unwrap().as_deref(),
        Some("see also: induction")
    );
    assert!(reference_service(&conn).list_all().unwrap().is_empty());
}

#[test]
fn deleting_note_of_unreferenced_term_deletes_term() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);

    terms.set_note("queue", "FIFO").unwrap();
    assert_eq!(terms.delete_note("Queue").unwrap(), WriteOutcome::Applied);
    assert!(terms.get_term("queue").unwrap().is_none());
    assert_eq!(term_count(&conn), 0);
}

#[test]
fn empty_note_behaves_like_delete() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);

    terms.set_note("stack", "LIFO").unwrap();
    assert_eq!(terms.set_note("stack", "   ").unwrap(), WriteOutcome::Applied);
    assert!(terms.get_term("stack").unwrap().is_none());
}

#[test]
fn deleting_note_keeps_referenced_term() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);
    let references = reference_service(&conn);

    references.add("hash table", "2:30").unwrap();
    terms.set_note("hash table", "open addressing").unwrap();
    terms.delete_note("hash table").unwrap();

    let stored = terms.get_term("hash table").unwrap().unwrap();
    assert_eq!(stored.note, "");
    assert_eq!(references.list_all().unwrap().len(), 1);
}

#[test]
fn deleting_note_of_missing_term_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);

    assert_eq!(terms.delete_note("ghost").unwrap(), WriteOutcome::NotFound);
    assert_eq!(terms.get_note("ghost").unwrap(), None);
}

#[test]
fn list_with_notes_orders_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);

    terms.set_note("zebra", "striped").unwrap();
    terms.set_note("Apple", "fruit").unwrap();
    terms.set_note("banana", "yellow").unwrap();
    terms.upsert_term("no note").unwrap();

    let listed: Vec<(String, String)> = terms
        .list_with_notes()
        .unwrap()
        .into_iter()
        .map(|entry| (entry.term, entry.note))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("Apple".to_string(), "fruit".to_string()),
            ("banana".to_string(), "yellow".to_string()),
            ("zebra".to_string(), "striped".to_string()),
        ]
    );
}

#[test]
fn enrichment_fields_round_trip_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);
    reference_service(&conn).add("neural network", "4:10-15").unwrap();

    let enrichment = TermEnrichment {
        description: Some("layered function approximator".to_string()),
        flagged: true,
        enriched_at: Some(1_700_000_000_000),
    };
    assert_eq!(
        terms.set_enrichment("Neural Network", &enrichment).unwrap(),
        WriteOutcome::Applied
    );
    assert_eq!(
        terms.get_term("neural network").unwrap().unwrap().enrichment,
        enrichment
    );
    assert_eq!(
        terms.set_enrichment("missing", &enrichment).unwrap(),
        WriteOutcome::NotFound
    );
}

#[test]
fn clear_all_keeps_books_and_settings() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);
    conn.execute(
        "INSERT INTO books (book_number, book_name, page_count) VALUES ('1', 'Intro', 10);",
        [],
    )
    .unwrap();
    reference_service(&conn).add("algorithm", "1:5").unwrap();
    terms.set_note("loner", "only a note").unwrap();

    terms.clear_all().unwrap();

    assert_eq!(term_count(&conn), 0);
    let books: i64 = conn
        .query_row("SELECT COUNT(*) FROM books;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(books, 1);
    let settings: i64 = conn
        .query_row("SELECT COUNT(*) FROM settings;", [], |row| row.get(0))
        .unwrap();
    assert!(settings >= 2);
}

#[test]
fn purge_orphans_removes_bare_terms_only() {
    let conn = open_db_in_memory().unwrap();
    let terms = term_service(&conn);
    reference_service(&conn).add("kept", "1:1").unwrap();
    terms.set_note("noted", "still here").unwrap();
    terms.upsert_term("bare").unwrap();

    assert_eq!(terms.purge_orphans().unwrap(), 1);
    assert!(terms.get_term("bare").unwrap().is_none());
    assert!(terms.get_term("kept").unwrap().is_some());
    assert!(terms.get_term("noted").unwrap().is_some());
}
