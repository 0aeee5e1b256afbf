//! Shared fixtures for the workflow integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use coursehub_core::constants::{CONTENT_ITEMS, USERS};
use coursehub_core::providers::{Document, Fields};
use coursehub_core::{ContentItem, EpochMillis, Locator, Profile, StoredRecord, WorkflowConfig};
use coursehub_testing::{
    FixedClock, InMemoryBlobStore, InMemoryDocumentStore, InMemoryIdentityService,
    ScriptedCodeGenerator, SequentialIdGenerator, test_clock,
};
use coursehub_workflows::{ServiceEnvironment, UploadProgress};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// In-memory services plus an environment wired to them.
pub struct Harness {
    pub identity: InMemoryIdentityService,
    pub documents: InMemoryDocumentStore,
    pub blobs: InMemoryBlobStore,
    pub clock: FixedClock,
    pub env: ServiceEnvironment,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_documents(InMemoryDocumentStore::new())
    }

    pub fn with_documents(documents: InMemoryDocumentStore) -> Self {
        coursehub_testing::init_tracing();
        coursehub_runtime::metrics::register_metrics();
        let identity = InMemoryIdentityService::new();
        let blobs = InMemoryBlobStore::new();
        let clock = test_clock();
        let env = ServiceEnvironment::new(
            Arc::new(identity.clone()),
            Arc::new(documents.clone()),
            Arc::new(blobs.clone()),
        )
        .with_clock(Arc::new(clock.clone()))
        .with_ids(Arc::new(SequentialIdGenerator::new("id")));

        Self {
            identity,
            documents,
            blobs,
            clock,
            env,
        }
    }

    pub fn with_codes(mut self, codes: ScriptedCodeGenerator) -> Self {
        self.env = self.env.with_codes(Arc::new(codes));
        self
    }

    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.env = self.env.with_config(config);
        self
    }

    pub fn seed<T: StoredRecord>(&self, collection: &str, record: &T) {
        self.documents
            .seed(collection, record.id(), record.to_fields().unwrap());
    }

    pub fn seed_profile(&self, id: &str, username: &str) -> Profile {
        let profile = Profile {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            created_at: EpochMillis::new(0),
        };
        self.seed(USERS, &profile);
        profile
    }

    pub fn seed_item(&self, item: &ContentItem) {
        self.seed(CONTENT_ITEMS, item);
    }

    pub fn stored_item(&self, id: &str) -> Option<ContentItem> {
        self.documents
            .snapshot(CONTENT_ITEMS, id)
            .map(|fields| ContentItem::from_document(Document::new(id, fields)).unwrap())
    }
}

/// A public content item with both locators set.
pub fn content_item(id: &str, created_at: i64) -> ContentItem {
    ContentItem {
        id: id.to_string(),
        title: format!("Course {id}"),
        short_summary: format!("Summary of {id}"),
        long_summary: String::new(),
        owner_id: "owner-1".to_string(),
        owner_username: "ada".to_string(),
        preview_locator: Some(Locator::new(format!("mem://blobs/thumbnails/{id}_old"))),
        media_locator: Some(Locator::new(format!("mem://blobs/videos/{id}_old"))),
        category: "programming".to_string(),
        created_at: EpochMillis::new(created_at),
        is_private: false,
        access_code: None,
    }
}

pub fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

/// Collects progress reports.
#[derive(Clone, Default)]
pub struct ProgressLog(Arc<Mutex<Vec<UploadProgress>>>);

impl ProgressLog {
    pub fn sink(&self) -> impl Fn(UploadProgress) + Send + Sync + 'static {
        let events = Arc::clone(&self.0);
        move |progress| events.lock().unwrap().push(progress)
    }

    pub fn events(&self) -> Vec<UploadProgress> {
        self.0.lock().unwrap().clone()
    }
}
