//! Retry-until-unique access-code allocation.
//!
//! A candidate code is drawn at random and probed against the document store;
//! if a record of the same kind already carries it, another candidate is
//! drawn. This is not a reservation: two concurrent allocations can accept the
//! same candidate before either writes it.
//!
//! Only the "candidate is taken" outcome earns another attempt. A failed probe
//! ends the allocation at once, and the loop is bounded by
//! [`AccessCodeConfig`](coursehub_core::AccessCodeConfig)'s attempt budget and
//! deadline.

use crate::environment::ServiceEnvironment;
use crate::records;
use coursehub_core::constants::fields;
use coursehub_core::{
    AccessCode, AccessCodeKind, Collection, ContentItem, Error, Result, ServiceError, Stage,
    StoredRecord,
};
use coursehub_runtime::metrics::AccessCodeMetrics;
use coursehub_runtime::{BlockingWait, RetryError, RetryPolicy, WaitError, retry_with_predicate};
use serde_json::Value;
use thiserror::Error as ThisError;
use tokio::runtime::Handle;

/// Operation name reported by allocation timeouts.
const ALLOCATION: &str = "access code allocation";

/// A record that an access code can unlock.
pub trait Unlockable: StoredRecord {
    /// Which allocator namespace the record's codes live in.
    const CODE_KIND: AccessCodeKind;

    /// Whether the record is currently private.
    fn is_private(&self) -> bool;
}

impl Unlockable for ContentItem {
    const CODE_KIND: AccessCodeKind = AccessCodeKind::Content;

    fn is_private(&self) -> bool {
        self.is_private
    }
}

impl Unlockable for Collection {
    const CODE_KIND: AccessCodeKind = AccessCodeKind::Collection;

    fn is_private(&self) -> bool {
        self.is_private
    }
}

#[derive(Debug, ThisError)]
enum ProbeError {
    #[error("candidate {0} is taken")]
    Taken(String),

    #[error("probe failed: {0}")]
    Remote(ServiceError),

    #[error("{0}")]
    Invalid(Error),
}

/// Access-code allocator.
#[derive(Debug, Clone)]
pub struct AccessCodeAllocator {
    env: ServiceEnvironment,
}

impl AccessCodeAllocator {
    /// Create the allocator.
    #[must_use]
    pub const fn new(env: ServiceEnvironment) -> Self {
        Self { env }
    }

    /// Mint a code no record of `kind` currently holds.
    ///
    /// # Errors
    ///
    /// - [`Error::Remote`]: a probe failed
    /// - [`Error::Exhausted`]: every candidate in the attempt budget was taken
    /// - [`Error::Timeout`]: the allocation deadline passed
    #[tracing::instrument(skip(self), fields(kind = %kind))]
    pub async fn allocate(&self, kind: AccessCodeKind) -> Result<AccessCode> {
        let settings = &self.env.config.access_code;
        let length = settings.length_for(kind);
        let policy = RetryPolicy::builder()
            .max_attempts(settings.max_attempts)
            .deadline(settings.deadline)
            .build();

        let result = retry_with_predicate(
            policy,
            || {
                let candidate = self.env.codes.candidate(length);
                async move { self.probe(kind, candidate, length).await }
            },
            |err| matches!(err, ProbeError::Taken(_)),
        )
        .await;

        match result {
            Ok(code) => {
                AccessCodeMetrics::record_allocation("success");
                tracing::debug!("Access code allocated");
                Ok(code)
            }
            Err(err) => {
                AccessCodeMetrics::record_allocation("failure");
                Err(match err {
                    RetryError::Fatal(ProbeError::Remote(e)) => {
                        Error::remote(Stage::AccessCodeProbe, &e)
                    }
                    RetryError::Fatal(ProbeError::Invalid(e)) => e,
                    RetryError::Exhausted { attempts, .. } => Error::Exhausted { attempts },
                    RetryError::Fatal(ProbeError::Taken(_)) => Error::Exhausted {
                        attempts: settings.max_attempts,
                    },
                    RetryError::DeadlineElapsed(after) => Error::Timeout {
                        operation: ALLOCATION,
                        after,
                    },
                })
            }
        }
    }

    /// The code a record of `kind` should carry after a write.
    ///
    /// A public record carries none. A private record keeps `current` when it
    /// has one, and gets a fresh code otherwise.
    ///
    /// # Errors
    ///
    /// Everything [`allocate`](Self::allocate) returns, when a fresh code is
    /// needed.
    pub async fn code_for(
        &self,
        kind: AccessCodeKind,
        is_private: bool,
        current: Option<AccessCode>,
    ) -> Result<Option<AccessCode>> {
        match (is_private, current) {
            (false, _) => Ok(None),
            (true, Some(code)) => Ok(Some(code)),
            (true, None) => self.allocate(kind).await.map(Some),
        }
    }

    /// [`allocate`](Self::allocate) for synchronous call sites.
    ///
    /// Blocks the current thread for at most the configured blocking timeout.
    /// Must not be called from a thread driving `runtime`.
    ///
    /// # Errors
    ///
    /// Everything [`allocate`](Self::allocate) returns, plus
    /// [`Error::Timeout`] when the blocking timeout expires first.
    pub fn allocate_blocking(&self, runtime: &Handle, kind: AccessCodeKind) -> Result<AccessCode> {
        let waiter = BlockingWait::new(self.env.config.access_code.blocking_timeout);
        let allocator = self.clone();

        match waiter.wait(runtime, async move { allocator.allocate(kind).await }) {
            Ok(result) => result,
            Err(WaitError::TimedOut(after)) => Err(Error::Timeout {
                operation: ALLOCATION,
                after,
            }),
            Err(WaitError::Aborted) => Err(Error::Remote {
                stage: Stage::AccessCodeProbe,
                message: "allocation ended without a result".to_string(),
            }),
        }
    }

    /// Whether `code` currently unlocks a record of `kind`.
    ///
    /// With `require_private`, a code still attached to a record that has
    /// since been made public does not count.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: `code` has the wrong length or non-digits
    /// - [`Error::Remote`]: the probe failed
    #[tracing::instrument(skip(self, code), fields(kind = %kind))]
    pub async fn validate(
        &self,
        kind: AccessCodeKind,
        code: &str,
        require_private: bool,
    ) -> Result<bool> {
        let code = AccessCode::parse(code, self.env.config.access_code.length_for(kind))?;
        let hits = self
            .env
            .documents
            .query(kind.collection(), fields::ACCESS_CODE, &code_value(&code))
            .await
            .map_err(|e| Error::remote(Stage::AccessCodeProbe, &e))?;

        Ok(hits.iter().any(|hit| {
            !require_private || hit.field(fields::IS_PRIVATE) == Some(&Value::Bool(true))
        }))
    }

    /// The private record `code` unlocks.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: `code` is malformed
    /// - [`Error::NotFound`]: no private record carries `code`
    /// - [`Error::Remote`]: the lookup failed
    #[tracing::instrument(skip(self, code), fields(kind = T::KIND))]
    pub async fn find_by_code<T: Unlockable>(&self, code: &str) -> Result<T> {
        let kind = T::CODE_KIND;
        let parsed = AccessCode::parse(code, self.env.config.access_code.length_for(kind))?;
        let hits: Vec<T> = records::find(
            self.env.documents.as_ref(),
            kind.collection(),
            fields::ACCESS_CODE,
            &code_value(&parsed),
            Stage::AccessCodeProbe,
        )
        .await?;

        hits.into_iter()
            .find(|record| record.is_private())
            .ok_or_else(|| Error::NotFound {
                kind: T::KIND,
                id: parsed.to_string(),
            })
    }

    async fn probe(
        &self,
        kind: AccessCodeKind,
        candidate: String,
        length: usize,
    ) -> std::result::Result<AccessCode, ProbeError> {
        let code = AccessCode::parse(&candidate, length).map_err(ProbeError::Invalid)?;
        let hits = self
            .env
            .documents
            .query(kind.collection(), fields::ACCESS_CODE, &code_value(&code))
            .await
            .map_err(ProbeError::Remote)?;

        if hits.is_empty() {
            Ok(code)
        } else {
            AccessCodeMetrics::record_collision();
            tracing::debug!(candidate = %candidate, "Candidate taken, drawing another");
            Err(ProbeError::Taken(candidate))
        }
    }
}

fn code_value(code: &AccessCode) -> Value {
    Value::String(code.as_str().to_string())
}
