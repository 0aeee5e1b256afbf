//! Mock implementations of the remote services and environment traits.
//!
//! Every double keeps its state behind an `Arc`, so clones share state: hand
//! one clone to the workflow under test and keep another for assertions.

pub mod blob;
pub mod clock;
pub mod document;
pub mod generators;
pub mod identity;

pub use blob::InMemoryBlobStore;
pub use clock::{test_clock, FixedClock};
pub use document::{InMemoryDocumentStore, Op};
pub use generators::{ScriptedCodeGenerator, SequentialIdGenerator};
pub use identity::InMemoryIdentityService;
