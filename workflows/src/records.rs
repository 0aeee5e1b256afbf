//! Typed reads and writes over the document store.
//!
//! Every helper wraps a [`ServiceError`](coursehub_core::ServiceError) with the
//! stage it happened in.

use coursehub_core::providers::DocumentStore;
use coursehub_core::{Error, Result, Stage, StoredRecord};
use serde_json::Value;

/// Fetch and decode one record. A missing document is `Ok(None)`.
pub(crate) async fn load<T: StoredRecord>(
    documents: &dyn DocumentStore,
    collection: &str,
    id: &str,
    stage: Stage,
) -> Result<Option<T>> {
    let document = documents
        .get(collection, id)
        .await
        .map_err(|e| Error::remote(stage, &e))?;
    document.map(T::from_document).transpose()
}

/// Fetch and decode one record that must exist.
pub(crate) async fn require<T: StoredRecord>(
    documents: &dyn DocumentStore,
    collection: &str,
    id: &str,
    stage: Stage,
) -> Result<T> {
    load(documents, collection, id, stage)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
}

/// Encode and write a whole record under its own id.
pub(crate) async fn save<T: StoredRecord>(
    documents: &dyn DocumentStore,
    collection: &str,
    record: &T,
    stage: Stage,
) -> Result<()> {
    let fields = record.to_fields()?;
    documents
        .set(collection, record.id(), fields)
        .await
        .map_err(|e| Error::remote(stage, &e))
}

/// Query by field equality and decode the hits.
///
/// Hits that do not decode are logged and skipped.
pub(crate) async fn find<T: StoredRecord>(
    documents: &dyn DocumentStore,
    collection: &str,
    field: &str,
    value: &Value,
    stage: Stage,
) -> Result<Vec<T>> {
    let hits = documents
        .query(collection, field, value)
        .await
        .map_err(|e| Error::remote(stage, &e))?;

    Ok(hits
        .into_iter()
        .filter_map(|document| match T::from_document(document) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(collection, error = %err, "Skipping undecodable record");
                None
            }
        })
        .collect())
}
