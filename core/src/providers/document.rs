//! Document store trait.

use super::{BoxFuture, ServiceResult};
use serde_json::{Map, Value};

/// Field map of a stored record.
pub type Fields = Map<String, Value>;

/// A record as returned by the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id within its collection.
    pub id: String,
    /// Stored fields.
    pub fields: Fields,
}

impl Document {
    /// Create a document.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Keyed document database.
///
/// Writes are atomic per document and nothing more: there are no cross-record
/// transactions, and a just-written record may not be visible to an immediate
/// `query` (eventual consistency).
pub trait DocumentStore: Send + Sync {
    /// Fetch one document. A missing document is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn get<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, ServiceResult<Option<Document>>>;

    /// Fetch every document whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn query<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a Value,
    ) -> BoxFuture<'a, ServiceResult<Vec<Document>>>;

    /// Create or replace a whole document.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails, or `ServiceError::AlreadyExists` if a
    /// store-level uniqueness constraint rejects the write.
    fn set<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        fields: Fields,
    ) -> BoxFuture<'a, ServiceResult<()>>;

    /// Delete a document. Deleting a missing document succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> BoxFuture<'a, ServiceResult<()>>;
}
