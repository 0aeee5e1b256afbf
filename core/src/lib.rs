//! # Coursehub Core
//!
//! Core types and traits for the Coursehub orchestration layer.
//!
//! Coursehub coordinates multi-step operations against three independent,
//! non-transactional remote services:
//!
//! - an identity provider ([`providers::IdentityService`])
//! - a document database ([`providers::DocumentStore`])
//! - a blob store ([`providers::BlobStore`])
//!
//! None of them offers cross-service atomicity. This crate only defines the
//! vocabulary shared by the orchestration code: the data model, the error
//! taxonomy, the service traits, and the injected environment (clock, id and
//! access-code generators). The workflows themselves live in
//! `coursehub-workflows`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  coursehub-workflows │  registration, upload pipeline,
//! │                      │  playlist aggregation, access codes
//! └──────────┬───────────┘
//!            │ Arc<dyn Trait>
//!            ▼
//! ┌──────────────────────┐
//! │  coursehub-core      │  IdentityService / DocumentStore / BlobStore
//! └──────────────────────┘
//! ```

pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod model;
pub mod providers;
pub mod timestamp;

pub use config::{AccessCodeConfig, UploadConfig, WorkflowConfig};
pub use error::{Error, Result, ServiceError, Stage};
pub use model::{
    AccessCode, AccessCodeKind, AccountId, Bookmark, ByteSource, Collection, ContentItem,
    Locator, Profile, StoredRecord, UploadResult,
};
pub use timestamp::EpochMillis;
