//! Remote service interfaces.
//!
//! The orchestration layer talks to three independent services through these
//! traits. They are **interfaces**, not implementations: production bindings
//! wrap the real identity provider, document database and blob store, while
//! `coursehub-testing` provides in-memory doubles with failure injection.
//!
//! # Dyn Compatibility
//!
//! Every method returns an explicit `Pin<Box<dyn Future + Send>>` instead of
//! using `async fn`, so the services can be shared as `Arc<dyn Trait>` and
//! their futures can be spawned onto the runtime (the playlist fan-out does).

use crate::error::ServiceError;
use std::future::Future;
use std::pin::Pin;

pub mod blob;
pub mod document;
pub mod identity;

pub use blob::{BlobStore, ProgressFn};
pub use document::{Document, DocumentStore, Fields};
pub use identity::IdentityService;

/// Boxed, sendable future returned by service methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a single remote call.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
