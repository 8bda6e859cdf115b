//! Flat key/value settings store.
//!
//! Values are opaque to the core except for the keys exporters read.

use crate::repo::{ensure_table, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

/// Display name used as export title.
pub const SETTING_INDEX_NAME: &str = "index_name";
/// Accent colour (`#rrggbb`) for PDF and spreadsheet headings.
pub const SETTING_COLOR_SCHEME: &str = "color_scheme";

pub const DEFAULT_INDEX_NAME: &str = "Book Index";
pub const DEFAULT_COLOR_SCHEME: &str = "#f2849e";

/// Repository interface for settings.
pub trait SettingsRepository {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>>;
    /// Inserts or replaces one setting.
    fn set_setting(&self, key: &str, value: &str) -> RepoResult<()>;
    fn all_settings(&self) -> RepoResult<BTreeMap<String, String>>;

    /// Index display name, falling back to the default.
    fn index_name(&self) -> RepoResult<String> {
        Ok(self
            .get_setting(SETTING_INDEX_NAME)?
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()))
    }

    /// Accent colour, falling back to the default.
    fn color_scheme(&self) -> RepoResult<String> {
        Ok(self
            .get_setting(SETTING_COLOR_SCHEME)?
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COLOR_SCHEME.to_string()))
    }
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table(conn, "settings", &["key", "value"])?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }

    fn all_settings(&self) -> RepoResult<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM settings ORDER BY key ASC;")?;
        let mut rows = stmt.query([])?;
        let mut settings = BTreeMap::new();
        while let Some(row) = rows.next()? {
            settings.insert(row.get("key")?, row.get("value")?);
        }
        Ok(settings)
    }
}
