//! # Coursehub Runtime
//!
//! Async composition utilities shared by the Coursehub workflows.
//!
//! The workflows are linear `async` functions: each `.await` on a remote
//! service is a suspension point and nothing else blocks. The pieces that are
//! not linear live here:
//!
//! - **Retry**: a bounded retry-until-accepted loop with an attempt budget and
//!   an optional deadline ([`retry`])
//! - **Fan-out/join**: concurrent fetches joined through an atomic countdown
//!   and a concurrent collector, re-sorted into request order ([`fanout`])
//! - **Bounded wait**: blocking on a future from synchronous code with a
//!   finite timeout ([`wait`])
//! - **Metrics**: metric names and recorders ([`metrics`])
//!
//! ## Example
//!
//! ```
//! use coursehub_runtime::fanout::join_ordered;
//!
//! # async fn example() {
//! let ids = vec!["a".to_string(), "b".to_string()];
//! let joined = join_ordered(&ids, |id| async move {
//!     Ok::<_, String>(Some(id.to_uppercase()))
//! })
//! .await;
//! assert_eq!(joined.items, vec!["A", "B"]);
//! # }
//! ```

/// Bounded retry-until-accepted loops
pub mod retry;

/// Fan-out/join with an atomic countdown
pub mod fanout;

/// Finite blocking waits for synchronous call sites
pub mod wait;

/// Metric names and recorders
pub mod metrics;

pub use fanout::{join_ordered, Countdown, FetchFailure, Joined};
pub use retry::{retry_with_predicate, RetryError, RetryPolicy};
pub use wait::{BlockingWait, WaitError};
