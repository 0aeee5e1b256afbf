//! Playlist aggregation.
//!
//! Resolves a collection's ordered item ids into full content items. One
//! fetch is issued per id, all of them concurrently; the join re-sorts the
//! results into the collection's order and silently drops any id whose fetch
//! failed or found nothing. A single broken reference never hides the rest of
//! the playlist, so the operation has no error path.

use crate::environment::ServiceEnvironment;
use coursehub_core::constants::CONTENT_ITEMS;
use coursehub_core::{Collection, ContentItem, Error, Stage, StoredRecord};
use coursehub_runtime::fanout::{FetchFailure, join_ordered};
use coursehub_runtime::metrics::AggregationMetrics;
use std::collections::HashSet;
use std::sync::Arc;

/// Playlist aggregation.
#[derive(Debug, Clone)]
pub struct PlaylistAggregator {
    env: ServiceEnvironment,
}

impl PlaylistAggregator {
    /// Create the aggregator.
    #[must_use]
    pub const fn new(env: ServiceEnvironment) -> Self {
        Self { env }
    }

    /// The collection's items in display order, unavailable ones elided.
    #[tracing::instrument(skip(self, collection), fields(collection_id = %collection.id))]
    pub async fn resolve_ordered_items(&self, collection: &Collection) -> Vec<ContentItem> {
        self.resolve::<ContentItem>(
            CONTENT_ITEMS,
            Stage::ReadContent,
            &collection.ordered_item_ids,
        )
        .await
    }

    /// Fetch `ids` from `collection_name` concurrently, keeping their order.
    ///
    /// Repeated ids are fetched once, at their first position.
    pub async fn resolve<T>(
        &self,
        collection_name: &'static str,
        stage: Stage,
        ids: &[String],
    ) -> Vec<T>
    where
        T: StoredRecord + Send + 'static,
    {
        let mut seen = HashSet::new();
        let keys: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        if keys.is_empty() {
            return Vec::new();
        }

        let joined = join_ordered(&keys, |id| {
            let documents = Arc::clone(&self.env.documents);
            async move {
                match documents.get(collection_name, &id).await {
                    Ok(Some(document)) => T::from_document(document).map(Some),
                    Ok(None) => Ok(None),
                    Err(err) => Err(Error::remote(stage, &err)),
                }
            }
        })
        .await;

        for (id, failure) in &joined.failures {
            match failure {
                FetchFailure::Missing => {
                    tracing::warn!(item_id = %id, "Referenced record not found, eliding");
                }
                FetchFailure::Failed(err) => {
                    tracing::warn!(item_id = %id, error = %err, "Fetch failed, eliding");
                }
                FetchFailure::Aborted => {
                    tracing::warn!(item_id = %id, "Fetch task aborted, eliding");
                }
            }
        }
        AggregationMetrics::record_elided(joined.failures.len());

        tracing::debug!(
            requested = keys.len(),
            resolved = joined.items.len(),
            "Aggregation joined"
        );
        joined.items
    }
}
