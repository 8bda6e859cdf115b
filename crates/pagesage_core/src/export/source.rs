//! Builds export documents from a store handle.

use crate::export::{BookSummary, ExportDocument, ExportMetadata};
use crate::model::book::PropertyScope;
use crate::repo::book_repo::{BookRepository, SqliteBookRepository};
use crate::repo::property_repo::{PropertyRepository, SqlitePropertyRepository};
use crate::repo::reference_repo::{ReferenceRepository, SqliteReferenceRepository};
use crate::repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
use crate::repo::term_repo::{SqliteTermRepository, TermRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;

/// Header metadata: index name, accent colour, books and global properties.
pub fn load_metadata<B, P, S>(books: &B, properties: &P, settings: &S) -> RepoResult<ExportMetadata>
where
    B: BookRepository,
    P: PropertyRepository,
    S: SettingsRepository,
{
    let mut metadata = ExportMetadata::new(settings.index_name()?);
    metadata.accent_color = settings.color_scheme()?;
    metadata.books = books.list_books()?.iter().map(BookSummary::from).collect();
    metadata.custom_properties = properties
        .list_properties(&PropertyScope::Global)?
        .into_iter()
        .map(|property| (property.name, property.value))
        .collect();
    Ok(metadata)
}

/// Index export of every term with references.
pub fn index_document(conn: &Connection) -> RepoResult<ExportDocument> {
    let metadata = metadata_for(conn)?;
    let entries = SqliteReferenceRepository::try_new(conn)?.list_entries(None)?;
    Ok(ExportDocument::index(metadata, entries))
}

/// Notes export of every term with a non-empty note.
pub fn notes_document(conn: &Connection) -> RepoResult<ExportDocument> {
    let metadata = metadata_for(conn)?;
    let notes = SqliteTermRepository::try_new(conn)?.list_with_notes()?;
    Ok(ExportDocument::notes(metadata, notes))
}

fn metadata_for(conn: &Connection) -> RepoResult<ExportMetadata> {
    load_metadata(
        &SqliteBookRepository::try_new(conn)?,
        &SqlitePropertyRepository::try_new(conn)?,
        &SqliteSettingsRepository::try_new(conn)?,
    )
}
