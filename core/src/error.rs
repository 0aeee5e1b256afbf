//! Error types for orchestration operations.
//!
//! Two layers of errors exist:
//!
//! - [`ServiceError`]: what a remote service binding reports (network failure,
//!   rejected request, duplicate key, missing object).
//! - [`Error`]: what an orchestration operation reports to its caller. Every
//!   remote failure is wrapped with the [`Stage`] it originated from so a
//!   caller can render a meaningful message.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a remote service binding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service could not be reached or failed internally.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The service refused the request (malformed email, weak password, quota).
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// A store-level uniqueness constraint rejected the write.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The addressed object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Provider message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unavailable(msg)
            | Self::Rejected(msg)
            | Self::AlreadyExists(msg)
            | Self::NotFound(msg) => msg,
        }
    }
}

/// The step of a workflow an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Username uniqueness query.
    UsernameProbe,
    /// Identity account creation.
    CreateAccount,
    /// Profile document write.
    WriteProfile,
    /// Identity account deletion (compensation).
    DeleteAccount,
    /// Preview image upload.
    Preview,
    /// Media file upload.
    Media,
    /// Content item document read.
    ReadContent,
    /// Content item document write.
    WriteContent,
    /// Content item document delete.
    DeleteContent,
    /// Access-code uniqueness or validation query.
    AccessCodeProbe,
    /// Collection document read.
    ReadCollection,
    /// Collection document write.
    WriteCollection,
    /// Collection document delete.
    DeleteCollection,
    /// Bookmark query or write.
    Bookmark,
    /// Profile document read.
    ReadProfile,
}

impl Stage {
    /// Stable kebab-case name, used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UsernameProbe => "username-probe",
            Self::CreateAccount => "create-account",
            Self::WriteProfile => "write-profile",
            Self::DeleteAccount => "delete-account",
            Self::Preview => "preview",
            Self::Media => "media",
            Self::ReadContent => "read-content",
            Self::WriteContent => "write-content",
            Self::DeleteContent => "delete-content",
            Self::AccessCodeProbe => "access-code-probe",
            Self::ReadCollection => "read-collection",
            Self::WriteCollection => "write-collection",
            Self::DeleteCollection => "delete-collection",
            Self::Bookmark => "bookmark",
            Self::ReadProfile => "read-profile",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error taxonomy for orchestration operations.
///
/// Every terminal result carries either a value or exactly one of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════
    // Caller errors (reported before any remote call)
    // ═══════════════════════════════════════════════════════════

    /// Caller-supplied input is malformed.
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Offending input field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// An upload source exceeds the configured maximum size.
    #[error("{stage} source too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Upload stage the source belongs to
        stage: Stage,
        /// Size of the rejected source
        size: u64,
        /// Configured maximum
        limit: u64,
    },

    // ═══════════════════════════════════════════════════════════
    // Terminal domain outcomes
    // ═══════════════════════════════════════════════════════════

    /// A uniqueness rule was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A referenced record is absent.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind
        kind: &'static str,
        /// Requested id
        id: String,
    },

    /// A stored record could not be decoded into the domain model.
    #[error("Malformed {kind} record {id}: {reason}")]
    Malformed {
        /// Record kind
        kind: &'static str,
        /// Document id
        id: String,
        /// Decoding failure
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Remote failures
    // ═══════════════════════════════════════════════════════════

    /// The underlying service reported a failure.
    #[error("Remote failure during {stage}: {message}")]
    Remote {
        /// Originating step
        stage: Stage,
        /// Provider message
        message: String,
    },

    /// A rollback step failed, leaving cross-service state inconsistent.
    #[error("Compensation failed after {stage} error ({cause}): {compensation}")]
    CompensationFailed {
        /// Step whose failure triggered compensation
        stage: Stage,
        /// The original failure
        cause: String,
        /// Why the compensation itself failed
        compensation: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Bounds
    // ═══════════════════════════════════════════════════════════

    /// A bounded wait expired.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation that was waited on
        operation: &'static str,
        /// Configured bound
        after: Duration,
    },

    /// The access-code allocator ran out of attempts.
    #[error("No unused access code found after {attempts} attempts")]
    Exhausted {
        /// Candidates probed
        attempts: usize,
    },
}

impl Error {
    /// Wrap a service failure with the stage it came from.
    #[must_use]
    pub fn remote(stage: Stage, err: &ServiceError) -> Self {
        Self::Remote {
            stage,
            message: err.message().to_string(),
        }
    }

    /// Shorthand for a validation error.
    #[must_use]
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error was detected without a remote call.
    ///
    /// # Examples
    ///
    /// ```
    /// # use coursehub_core::Error;
    /// assert!(Error::validation("username", "must not be empty").is_validation());
    /// assert!(!Error::Conflict("username taken".into()).is_validation());
    /// ```
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::PayloadTooLarge { .. })
    }

    /// Returns `true` if cross-service state may be inconsistent.
    #[must_use]
    pub const fn needs_operator(&self) -> bool {
        matches!(self, Self::CompensationFailed { .. })
    }

    /// The originating stage, for errors that carry one.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Remote { stage, .. }
            | Self::CompensationFailed { stage, .. }
            | Self::PayloadTooLarge { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
