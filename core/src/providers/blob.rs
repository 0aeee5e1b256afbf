//! Blob store trait.

use super::{BoxFuture, ServiceResult};
use crate::model::{ByteSource, Locator};

/// Progress callback: `(bytes_sent, total_bytes)`.
///
/// Borrowed for the duration of one upload, so it may capture local state.
pub type ProgressFn<'a> = dyn Fn(u64, u64) + Send + Sync + 'a;

/// Path-addressed binary storage.
pub trait BlobStore: Send + Sync {
    /// Upload `source` to `path`, reporting progress as bytes stream out.
    ///
    /// Returns the retrievable locator of the stored object.
    ///
    /// # Errors
    ///
    /// Returns error if the transfer fails or the store rejects the object.
    fn upload<'a>(
        &'a self,
        path: &'a str,
        source: &'a ByteSource,
        on_progress: &'a ProgressFn<'a>,
    ) -> BoxFuture<'a, ServiceResult<Locator>>;

    /// Delete the object behind `locator`.
    ///
    /// # Errors
    ///
    /// Returns error if the locator is not recognised or the store fails.
    fn delete<'a>(&'a self, locator: &'a Locator) -> BoxFuture<'a, ServiceResult<()>>;
}
