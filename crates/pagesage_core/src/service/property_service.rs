//! Custom property use-case service.

use crate::model::book::{CustomProperty, PropertyScope};
use crate::repo::property_repo::PropertyRepository;
use crate::repo::WriteOutcome;
use crate::service::{
    canonical_book_number, normalize_book_number, IndexServiceError, ServiceResult,
};

/// Property service facade over repository implementations.
pub struct PropertyService<R: PropertyRepository> {
    repo: R,
}

impl<R: PropertyRepository> PropertyService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Appends a property to the end of its scope.
    pub fn add_property(
        &self,
        scope: &PropertyScope,
        name: &str,
        value: &str,
    ) -> ServiceResult<CustomProperty> {
        let scope = normalized_scope(scope)?;
        let name = normalize_property_name(name)?;
        Ok(self.repo.add_property(&scope, name, value.trim())?)
    }

    pub fn list_properties(&self, scope: &PropertyScope) -> ServiceResult<Vec<CustomProperty>> {
        Ok(self.repo.list_properties(&lookup_scope(scope))?)
    }

    pub fn update_property(
        &self,
        scope: &PropertyScope,
        id: i64,
        name: &str,
        value: &str,
    ) -> ServiceResult<WriteOutcome> {
        let scope = normalized_scope(scope)?;
        let name = normalize_property_name(name)?;
        Ok(self.repo.update_property(&scope, id, name, value.trim())?)
    }

    pub fn delete_property(&self, scope: &PropertyScope, id: i64) -> ServiceResult<WriteOutcome> {
        Ok(self.repo.delete_property(&lookup_scope(scope), id)?)
    }
}

/// Book scopes are keyed by the stored form of the book number.
fn normalized_scope(scope: &PropertyScope) -> ServiceResult<PropertyScope> {
    match scope {
        PropertyScope::Global => Ok(PropertyScope::Global),
        PropertyScope::Book(book_number) => {
            Ok(PropertyScope::Book(normalize_book_number(book_number)?))
        }
    }
}

fn lookup_scope(scope: &PropertyScope) -> PropertyScope {
    match scope {
        PropertyScope::Global => PropertyScope::Global,
        PropertyScope::Book(book_number) => PropertyScope::Book(canonical_book_number(book_number)),
    }
}

fn normalize_property_name(name: &str) -> ServiceResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(IndexServiceError::InvalidInput(
            "property name must not be blank".to_string(),
        ));
    }
    Ok(trimmed)
}
