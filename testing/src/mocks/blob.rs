//! In-memory blob store.

use coursehub_core::providers::{BlobStore, BoxFuture, ProgressFn, ServiceResult};
use coursehub_core::{ByteSource, Locator, ServiceError};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Locator prefix of every stored object.
pub const BASE_URL: &str = "mem://blobs/";

/// Default number of progress reports per upload.
const DEFAULT_CHUNKS: u64 = 4;

#[derive(Debug, Default)]
struct State {
    /// path → content type and size
    objects: BTreeMap<String, (String, u64)>,
    upload_failures: Vec<(String, ServiceError)>,
    delete_failure: Option<ServiceError>,
    uploads: usize,
}

/// In-memory blob store.
///
/// Each upload reports progress in a few chunks, yielding to the runtime
/// between them, then stores the object under `mem://blobs/{path}`.
#[derive(Debug, Clone)]
pub struct InMemoryBlobStore {
    state: Arc<Mutex<State>>,
    chunks: u64,
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            chunks: DEFAULT_CHUNKS,
        }
    }
}

impl InMemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report progress in `chunks` steps (at least one).
    #[must_use]
    pub fn with_chunks(mut self, chunks: u64) -> Self {
        self.chunks = chunks.max(1);
        self
    }

    /// Fail every upload whose path starts with `prefix`.
    pub fn fail_uploads_under(&self, prefix: &str, error: ServiceError) {
        self.lock()
            .upload_failures
            .push((prefix.to_string(), error));
    }

    /// Fail every subsequent delete.
    pub fn fail_delete(&self, error: ServiceError) {
        self.lock().delete_failure = Some(error);
    }

    /// Number of upload calls, failed ones included.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.lock().uploads
    }

    /// Paths of stored objects, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    /// Whether `locator` points at a stored object.
    #[must_use]
    pub fn contains(&self, locator: &Locator) -> bool {
        locator
            .as_str()
            .strip_prefix(BASE_URL)
            .is_some_and(|path| self.lock().objects.contains_key(path))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlobStore for InMemoryBlobStore {
    fn upload<'a>(
        &'a self,
        path: &'a str,
        source: &'a ByteSource,
        on_progress: &'a ProgressFn<'a>,
    ) -> BoxFuture<'a, ServiceResult<Locator>> {
        Box::pin(async move {
            let failure = {
                let mut state = self.lock();
                state.uploads += 1;
                state
                    .upload_failures
                    .iter()
                    .find(|(prefix, _)| path.starts_with(prefix.as_str()))
                    .map(|(_, err)| err.clone())
            };

            let total = source.len();
            let step = total.div_ceil(self.chunks).max(1);
            let mut sent = 0;
            while sent < total {
                sent = (sent + step).min(total);
                on_progress(sent, total);
                tokio::task::yield_now().await;
                if failure.is_some() && sent * 2 >= total {
                    break;
                }
            }

            if let Some(err) = failure {
                return Err(err);
            }

            self.lock()
                .objects
                .insert(path.to_string(), (source.content_type.clone(), total));
            Ok(Locator::new(format!("{BASE_URL}{path}")))
        })
    }

    fn delete<'a>(&'a self, locator: &'a Locator) -> BoxFuture<'a, ServiceResult<()>> {
        Box::pin(async move {
            let mut state = self.lock();
            if let Some(err) = state.delete_failure.clone() {
                return Err(err);
            }
            locator
                .as_str()
                .strip_prefix(BASE_URL)
                .and_then(|path| state.objects.remove(path))
                .map(|_| ())
                .ok_or_else(|| ServiceError::NotFound(locator.to_string()))
        })
    }
}
