use pagesage_core::db::migrations::latest_version;
use pagesage_core::db::{open_db, open_db_in_memory, DbError};
use pagesage_core::{RepoError, SqliteReferenceRepository, SqliteSettingsRepository, SettingsRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "terms",
        "page_references",
        "settings",
        "books",
        "gap_exclusions",
        "custom_properties",
        "book_custom_properties",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn migrations_seed_default_settings() {
    let conn = open_db_in_memory().unwrap();
    let settings = SqliteSettingsRepository::try_new(&conn).unwrap();

    assert_eq!(settings.index_name().unwrap(), "Book Index");
    assert_eq!(settings.color_scheme().unwrap(), "#f2849e");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("UPDATE settings SET value = 'History' WHERE key = 'index_name';", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let settings = SqliteSettingsRepository::try_new(&conn_second).unwrap();
    assert_eq!(settings.index_name().unwrap(), "History");
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO page_references (term_id, book_number, page_start) VALUES (42, 1, 1);",
        [],
    );
    assert!(orphan.is_err());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteReferenceRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable(_)));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
