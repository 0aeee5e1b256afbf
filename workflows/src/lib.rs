//! # Coursehub Workflows
//!
//! Orchestration of multi-step operations across the identity provider, the
//! document store and the blob store.
//!
//! - [`Registration`]: account + profile creation with compensation
//! - [`UploadPipeline`]: preview then media upload, one trailing record write
//! - [`PlaylistAggregator`]: ordered fan-out/join of collection items
//! - [`AccessCodeAllocator`]: bounded retry-until-unique access codes
//!
//! The use cases built on them are [`ContentCatalog`], [`CollectionService`]
//! and [`Bookmarks`]. Every operation settles with exactly one
//! `Result<_, coursehub_core::Error>`.
//!
//! ## Example
//!
//! ```
//! use coursehub_testing::{InMemoryBlobStore, InMemoryDocumentStore, InMemoryIdentityService};
//! use coursehub_workflows::{Registration, ServiceEnvironment};
//! use std::sync::Arc;
//!
//! # async fn example() -> coursehub_core::Result<()> {
//! let env = ServiceEnvironment::new(
//!     Arc::new(InMemoryIdentityService::new()),
//!     Arc::new(InMemoryDocumentStore::new()),
//!     Arc::new(InMemoryBlobStore::new()),
//! );
//!
//! let profile = Registration::new(env).register("alice", "a@x.com", "pw123456").await?;
//! assert_eq!(profile.username, "alice");
//! # Ok(())
//! # }
//! ```

pub mod access_code;
pub mod bookmarks;
pub mod catalog;
pub mod collections;
pub mod environment;
pub mod playlist;
pub mod registration;
pub mod upload;

mod records;

pub use access_code::{AccessCodeAllocator, Unlockable};
pub use bookmarks::{BookmarkKind, Bookmarks};
pub use catalog::{ContentCatalog, ContentEdit, NewContent};
pub use collections::{CollectionEdit, CollectionService, NewCollection, ResolvedCollection};
pub use environment::ServiceEnvironment;
pub use playlist::PlaylistAggregator;
pub use registration::Registration;
pub use upload::{ProgressSink, UploadPipeline, UploadProgress};
