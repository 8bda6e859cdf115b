//! Custom property repository (global and book-scoped).
//!
//! Display order is unique within a scope; new properties are appended.

use crate::model::book::{CustomProperty, PropertyScope};
use crate::repo::{ensure_table, RepoResult, WriteOutcome};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for ordered custom properties.
pub trait PropertyRepository {
    /// Appends a property at the end of its scope.
    fn add_property(&self, scope: &PropertyScope, name: &str, value: &str)
        -> RepoResult<CustomProperty>;
    /// Lists properties of a scope by display order.
    fn list_properties(&self, scope: &PropertyScope) -> RepoResult<Vec<CustomProperty>>;
    fn update_property(
        &self,
        scope: &PropertyScope,
        id: i64,
        name: &str,
        value: &str,
    ) -> RepoResult<WriteOutcome>;
    fn delete_property(&self, scope: &PropertyScope, id: i64) -> RepoResult<WriteOutcome>;
}

/// SQLite-backed property repository.
pub struct SqlitePropertyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePropertyRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(
            conn,
            "custom_properties",
            &["id", "name", "value", "display_order"],
        )?;
        ensure_table(
            conn,
            "book_custom_properties",
            &["id", "book_number", "name", "value", "display_order"],
        )?;
        Ok(Self { conn })
    }
}

/// Table name plus the scope filter clause and bind values for one scope.
fn scope_filter(scope: &PropertyScope) -> (&'static str, &'static str, Vec<Value>) {
    match scope {
        PropertyScope::Global => ("custom_properties", "1 = 1", Vec::new()),
        PropertyScope::Book(book_number) => (
            "book_custom_properties",
            "book_number = ?",
            vec![Value::Text(book_number.clone())],
        ),
    }
}

impl PropertyRepository for SqlitePropertyRepository<'_> {
    fn add_property(
        &self,
        scope: &PropertyScope,
        name: &str,
        value: &str,
    ) -> RepoResult<CustomProperty> {
        let (table, filter, scope_values) = scope_filter(scope);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let next_order: i64 = tx.query_row(
            &format!("SELECT COALESCE(MAX(display_order), -1) + 1 FROM {table} WHERE {filter};"),
            params_from_iter(scope_values.iter()),
            |row| row.get(0),
        )?;

        match scope {
            PropertyScope::Global => tx.execute(
                "INSERT INTO custom_properties (name, value, display_order) VALUES (?1, ?2, ?3);",
                params![name, value, next_order],
            )?,
            PropertyScope::Book(book_number) => tx.execute(
                "INSERT INTO book_custom_properties (book_number, name, value, display_order)
                 VALUES (?1, ?2, ?3, ?4);",
                params![book_number, name, value, next_order],
            )?,
        };
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(CustomProperty {
            id,
            scope: scope.clone(),
            name: name.to_string(),
            value: value.to_string(),
            display_order: next_order,
        })
    }

    fn list_properties(&self, scope: &PropertyScope) -> RepoResult<Vec<CustomProperty>> {
        let (table, filter, scope_values) = scope_filter(scope);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name, value, display_order
             FROM {table}
             WHERE {filter}
             ORDER BY display_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(scope_values.iter()))?;
        let mut properties = Vec::new();
        while let Some(row) = rows.next()? {
            properties.push(parse_property_row(row, scope)?);
        }
        Ok(properties)
    }

    fn update_property(
        &self,
        scope: &PropertyScope,
        id: i64,
        name: &str,
        value: &str,
    ) -> RepoResult<WriteOutcome> {
        let (table, filter, scope_values) = scope_filter(scope);
        let mut bind_values = vec![
            Value::Text(name.to_string()),
            Value::Text(value.to_string()),
            Value::Integer(id),
        ];
        bind_values.extend(scope_values);
        let changed = self.conn.execute(
            &format!("UPDATE {table} SET name = ?, value = ? WHERE id = ? AND {filter};"),
            params_from_iter(bind_values),
        )?;
        Ok(WriteOutcome::from_changed(changed))
    }

    fn delete_property(&self, scope: &PropertyScope, id: i64) -> RepoResult<WriteOutcome> {
        let (table, filter, scope_values) = scope_filter(scope);
        let mut bind_values = vec![Value::Integer(id)];
        bind_values.extend(scope_values);
        let changed = self.conn.execute(
            &format!("DELETE FROM {table} WHERE id = ? AND {filter};"),
            params_from_iter(bind_values),
        )?;
        Ok(WriteOutcome::from_changed(changed))
    }
}

fn parse_property_row(row: &Row<'_>, scope: &PropertyScope) -> RepoResult<CustomProperty> {
    Ok(CustomProperty {
        id: row.get("id")?,
        scope: scope.clone(),
        name: row.get("name")?,
        value: row.get("value")?,
        display_order: row.get("display_order")?,
    })
}
