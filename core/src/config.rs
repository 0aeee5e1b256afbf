//! Workflow configuration.
//!
//! Configuration values are provided by the application. Defaults mirror the
//! production policy.

use crate::constants::{COLLECTION_CODE_LENGTH, CONTENT_CODE_LENGTH, DEFAULT_MAX_UPLOAD_BYTES};
use crate::model::AccessCodeKind;
use std::time::Duration;

/// Upload pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Largest accepted source, in bytes.
    ///
    /// Default: 5 GiB
    pub max_upload_bytes: u64,

    /// Blob path prefix for preview images.
    ///
    /// Default: `thumbnails/`
    pub preview_prefix: String,

    /// Blob path prefix for media files.
    ///
    /// Default: `videos/`
    pub media_prefix: String,
}

impl UploadConfig {
    /// Create a configuration with the default prefixes.
    #[must_use]
    pub fn new(max_upload_bytes: u64) -> Self {
        Self {
            max_upload_bytes,
            ..Self::default()
        }
    }

    /// Set the blob path prefixes.
    #[must_use]
    pub fn with_prefixes(mut self, preview: impl Into<String>, media: impl Into<String>) -> Self {
        self.preview_prefix = preview.into();
        self.media_prefix = media.into();
        self
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            preview_prefix: "thumbnails/".to_string(),
            media_prefix: "videos/".to_string(),
        }
    }
}

/// Access-code allocator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCodeConfig {
    /// Digits in a content-item code.
    ///
    /// Default: 9
    pub content_code_length: usize,

    /// Digits in a collection code.
    ///
    /// Default: 6
    pub collection_code_length: usize,

    /// Candidates probed before giving up.
    ///
    /// Default: 16
    pub max_attempts: usize,

    /// Bound on one whole allocation, probes included.
    ///
    /// Default: 10 seconds
    pub deadline: Duration,

    /// Bound used when a synchronous call site blocks on an allocation.
    ///
    /// Default: 2 seconds
    pub blocking_timeout: Duration,
}

impl AccessCodeConfig {
    /// Code length for `kind`.
    #[must_use]
    pub const fn length_for(&self, kind: AccessCodeKind) -> usize {
        match kind {
            AccessCodeKind::Content => self.content_code_length,
            AccessCodeKind::Collection => self.collection_code_length,
        }
    }

    /// Set maximum probe attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the allocation deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the blocking-wait timeout.
    #[must_use]
    pub const fn with_blocking_timeout(mut self, timeout: Duration) -> Self {
        self.blocking_timeout = timeout;
        self
    }
}

impl Default for AccessCodeConfig {
    fn default() -> Self {
        Self {
            content_code_length: CONTENT_CODE_LENGTH,
            collection_code_length: COLLECTION_CODE_LENGTH,
            max_attempts: 16,
            deadline: Duration::from_secs(10),
            blocking_timeout: Duration::from_secs(2),
        }
    }
}

/// Everything the workflows are configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Upload pipeline settings.
    pub upload: UploadConfig,
    /// Access-code allocator settings.
    pub access_code: AccessCodeConfig,
}

impl WorkflowConfig {
    /// Replace the upload settings.
    #[must_use]
    pub fn with_upload(mut self, upload: UploadConfig) -> Self {
        self.upload = upload;
        self
    }

    /// Replace the access-code settings.
    #[must_use]
    pub fn with_access_code(mut self, access_code: AccessCodeConfig) -> Self {
        self.access_code = access_code;
        self
    }
}
