//! Bounded retry loops.
//!
//! Remote failures are never retried blindly. A caller decides which outcomes
//! are worth another attempt (for example "this access-code candidate is
//! already taken") and everything else fails immediately. Every loop is
//! bounded by an attempt budget and, optionally, a wall-clock deadline, so a
//! low-probability condition can never turn into an unbounded loop.
//!
//! # Example
//!
//! ```rust
//! use coursehub_runtime::retry::{retry_with_predicate, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(5)
//!     .deadline(Duration::from_secs(1))
//!     .build();
//!
//! let result = retry_with_predicate(
//!     policy,
//!     || async { Ok::<_, String>(42) },
//!     |err: &String| err.contains("taken"),
//! )
//! .await;
//! assert_eq!(result.ok(), Some(42));
//! # }
//! ```

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Bounds of a retry loop.
///
/// Attempts follow each other immediately; there is no backoff. The loop
/// stops at `max_attempts` or, when set, once `deadline` has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_attempts: usize,
    /// Bound on the whole loop
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            deadline: None,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            max_attempts: None,
            deadline: None,
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<usize>,
    deadline: Option<Duration>,
}

impl RetryPolicyBuilder {
    /// Set maximum number of attempts (at least one attempt is always made).
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Bound the whole loop by a wall-clock deadline.
    #[must_use]
    pub const fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            deadline: self.deadline.or(defaults.deadline),
        }
    }
}

/// Why a bounded retry loop gave up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The operation failed with an error the predicate does not retry.
    #[error("{0}")]
    Fatal(E),

    /// Every attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made
        attempts: usize,
        /// Error of the final attempt
        last: E,
    },

    /// The deadline elapsed before an attempt succeeded.
    #[error("deadline of {0:?} elapsed")]
    DeadlineElapsed(Duration),
}

/// Retry an async operation while `is_retryable` accepts its error.
///
/// # Arguments
///
/// * `policy` - Attempt budget and deadline
/// * `operation` - Async operation to retry (must be `FnMut` to allow multiple calls)
/// * `is_retryable` - Predicate deciding whether an error earns another attempt
///
/// # Errors
///
/// - [`RetryError::Fatal`] on the first non-retryable error
/// - [`RetryError::Exhausted`] once `max_attempts` retryable errors were seen
/// - [`RetryError::DeadlineElapsed`] if the policy deadline passes first
pub async fn retry_with_predicate<F, Fut, T, E, P>(
    policy: RetryPolicy,
    operation: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    match policy.deadline {
        Some(deadline) => tokio::time::timeout(
            deadline,
            attempt_loop(&policy, operation, is_retryable),
        )
        .await
        .unwrap_or_else(|_| {
            tracing::warn!(
                deadline_ms = deadline.as_millis(),
                "Retry deadline elapsed"
            );
            Err(RetryError::DeadlineElapsed(deadline))
        }),
        None => attempt_loop(&policy, operation, is_retryable).await,
    }
}

async fn attempt_loop<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "Accepted after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            tracing::warn!(attempt, error = %err, "Not retryable, giving up");
            return Err(RetryError::Fatal(err));
        }
        if attempt >= policy.max_attempts {
            tracing::warn!(attempt, error = %err, "Attempt budget spent");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }
        tracing::debug!(attempt, error = %err, "Retryable failure, trying again");
        // Ready futures never yield on their own.
        tokio::task::yield_now().await;
    }
}
