//! # Coursehub Testing
//!
//! Testing utilities for the Coursehub orchestration layer.
//!
//! This crate provides:
//! - In-memory implementations of the remote service traits, with failure
//!   and latency injection ([`mocks`])
//! - Deterministic clock, id and access-code generators
//! - One-shot tracing initialisation for tests
//!
//! ## Example
//!
//! ```
//! use coursehub_testing::mocks::{InMemoryDocumentStore, Op};
//! use coursehub_core::ServiceError;
//!
//! let store = InMemoryDocumentStore::new();
//! store.fail_on(Op::Set, "users", None, ServiceError::Unavailable("disk full".into()));
//! ```

pub mod mocks;

pub use mocks::{
    test_clock, FixedClock, InMemoryBlobStore, InMemoryDocumentStore, InMemoryIdentityService,
    Op, ScriptedCodeGenerator, SequentialIdGenerator,
};

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Honours `RUST_LOG`. Safe to call from every test; only the first call
/// installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
