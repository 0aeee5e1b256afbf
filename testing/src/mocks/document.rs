//! In-memory document store.

use coursehub_core::providers::{BoxFuture, Document, DocumentStore, Fields, ServiceResult};
use coursehub_core::ServiceError;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Document store operation, used to target injected failures and delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `get`
    Get,
    /// `query`
    Query,
    /// `set`
    Set,
    /// `delete`
    Delete,
}

#[derive(Debug, Clone)]
struct Rule<T> {
    op: Op,
    collection: String,
    id: Option<String>,
    value: T,
}

impl<T> Rule<T> {
    fn matches(&self, op: Op, collection: &str, id: Option<&str>) -> bool {
        self.op == op
            && self.collection == collection
            && self.id.as_deref().is_none_or(|rule_id| Some(rule_id) == id)
    }
}

type Collections = HashMap<String, BTreeMap<String, Fields>>;

#[derive(Debug, Default)]
struct Inner {
    collections: Collections,
    unique: Vec<(String, String)>,
    failures: Vec<Rule<ServiceError>>,
    delays: Vec<Rule<Duration>>,
    calls: Vec<(Op, String)>,
}

/// In-memory document store.
///
/// Documents are kept per collection in id order, so `query` results are
/// deterministic. Optional unique indexes reject a `set` whose field value is
/// already held by another document of the same collection, which lets tests
/// exercise store-level uniqueness rejections.
///
/// # Example
///
/// ```
/// use coursehub_testing::InMemoryDocumentStore;
/// use coursehub_core::providers::DocumentStore;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryDocumentStore::new().with_unique_index("users", "username");
/// let fields = json!({ "username": "alice" }).as_object().cloned().unwrap_or_default();
/// store.set("users", "acct-1", fields.clone()).await?;
/// assert!(store.set("users", "acct-2", fields).await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would give two documents the same `field` value.
    #[must_use]
    pub fn with_unique_index(self, collection: &str, field: &str) -> Self {
        self.write()
            .unique
            .push((collection.to_string(), field.to_string()));
        self
    }

    /// Make `op` on `collection` (optionally only for document `id`) fail.
    ///
    /// Rules persist until [`clear_failures`](Self::clear_failures).
    pub fn fail_on(&self, op: Op, collection: &str, id: Option<&str>, error: ServiceError) {
        self.write().failures.push(Rule {
            op,
            collection: collection.to_string(),
            id: id.map(ToString::to_string),
            value: error,
        });
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.write().failures.clear();
    }

    /// Delay `op` on `collection` (optionally only for document `id`).
    pub fn delay_on(&self, op: Op, collection: &str, id: Option<&str>, delay: Duration) {
        self.write().delays.push(Rule {
            op,
            collection: collection.to_string(),
            id: id.map(ToString::to_string),
            value: delay,
        });
    }

    /// Insert a document directly, bypassing indexes and failure rules.
    pub fn seed(&self, collection: &str, id: &str, fields: Fields) {
        self.write()
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Read a document directly, bypassing failure rules.
    #[must_use]
    pub fn snapshot(&self, collection: &str, id: &str) -> Option<Fields> {
        self.read()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in `collection`.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.read().collections.get(collection).map_or(0, BTreeMap::len)
    }

    /// Whether `collection` holds no documents.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Number of `op` calls made against `collection`, failed ones included.
    #[must_use]
    pub fn call_count(&self, op: Op, collection: &str) -> usize {
        self.read()
            .calls
            .iter()
            .filter(|(o, c)| *o == op && c == collection)
            .count()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log the call and return the injected delay and failure, if any.
    fn intercept(
        &self,
        op: Op,
        collection: &str,
        id: Option<&str>,
    ) -> (Option<Duration>, Option<ServiceError>) {
        let mut inner = self.write();
        inner.calls.push((op, collection.to_string()));
        let delay = inner
            .delays
            .iter()
            .find(|rule| rule.matches(op, collection, id))
            .map(|rule| rule.value);
        let failure = inner
            .failures
            .iter()
            .find(|rule| rule.matches(op, collection, id))
            .map(|rule| rule.value.clone());
        (delay, failure)
    }

    fn apply_set(&self, collection: &str, id: &str, fields: Fields) -> ServiceResult<()> {
        let mut inner = self.write();
        let indexed: Vec<String> = inner
            .unique
            .iter()
            .filter(|(c, _)| c == collection)
            .map(|(_, field)| field.clone())
            .collect();

        if let Some(docs) = inner.collections.get(collection) {
            for field in &indexed {
                let Some(value) = fields.get(field).filter(|v| !v.is_null()) else {
                    continue;
                };
                let taken = docs
                    .iter()
                    .any(|(other_id, other)| other_id != id && other.get(field) == Some(value));
                if taken {
                    return Err(ServiceError::AlreadyExists(format!(
                        "{collection}.{field} = {value}"
                    )));
                }
            }
        }

        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, ServiceResult<Option<Document>>> {
        Box::pin(async move {
            let (delay, failure) = self.intercept(Op::Get, collection, Some(id));
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = failure {
                return Err(err);
            }
            Ok(self
                .snapshot(collection, id)
                .map(|fields| Document::new(id, fields)))
        })
    }

    fn query<'a>(
        &'a self,
        collection: &'a str,
        field: &'a str,
        value: &'a Value,
    ) -> BoxFuture<'a, ServiceResult<Vec<Document>>> {
        Box::pin(async move {
            let (delay, failure) = self.intercept(Op::Query, collection, None);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = failure {
                return Err(err);
            }
            Ok(self
                .read()
                .collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|(_, fields)| fields.get(field) == Some(value))
                        .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    fn set<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        fields: Fields,
    ) -> BoxFuture<'a, ServiceResult<()>> {
        Box::pin(async move {
            let (delay, failure) = self.intercept(Op::Set, collection, Some(id));
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = failure {
                return Err(err);
            }
            self.apply_set(collection, id, fields)
        })
    }

    fn delete<'a>(&'a self, collection: &'a str, id: &'a str) -> BoxFuture<'a, ServiceResult<()>> {
        Box::pin(async move {
            let (delay, failure) = self.intercept(Op::Delete, collection, Some(id));
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = failure {
                return Err(err);
            }
            if let Some(docs) = self.write().collections.get_mut(collection) {
                docs.remove(id);
            }
            Ok(())
        })
    }
}
