//! Workflow environment.
//!
//! Bundles the remote services and the injected environment every workflow
//! runs against.

use coursehub_core::WorkflowConfig;
use coursehub_core::environment::{
    Clock, CodeGenerator, IdGenerator, RandomCodeGenerator, SystemClock, UuidGenerator,
};
use coursehub_core::providers::{BlobStore, DocumentStore, IdentityService};
use std::fmt;
use std::sync::Arc;

/// External dependencies of the workflows.
///
/// Cheap to clone: every service is behind an `Arc`.
#[derive(Clone)]
pub struct ServiceEnvironment {
    /// Identity provider.
    pub identity: Arc<dyn IdentityService>,

    /// Document database.
    pub documents: Arc<dyn DocumentStore>,

    /// Blob store.
    pub blobs: Arc<dyn BlobStore>,

    /// Time source.
    pub clock: Arc<dyn Clock>,

    /// Document id and blob path suffix source.
    pub ids: Arc<dyn IdGenerator>,

    /// Access-code candidate source.
    pub codes: Arc<dyn CodeGenerator>,

    /// Workflow configuration.
    pub config: WorkflowConfig,
}

impl ServiceEnvironment {
    /// Create an environment with the production clock, generators and
    /// default configuration.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityService>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            identity,
            documents,
            blobs,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            codes: Arc::new(RandomCodeGenerator),
            config: WorkflowConfig::default(),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the id generator.
    #[must_use]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Replace the access-code candidate generator.
    #[must_use]
    pub fn with_codes(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }
}

impl fmt::Debug for ServiceEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEnvironment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
