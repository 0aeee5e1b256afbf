//! Finite blocking waits.
//!
//! Some call sites are synchronous and cannot `.await`. They may block on an
//! async operation, but only through [`BlockingWait`], which always carries a
//! finite timeout and reports expiry as an error. The operation keeps running
//! on the runtime after a timeout; only the caller stops waiting for it.

use std::future::Future;
use std::sync::mpsc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;

/// Why a blocking wait returned without a value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The timeout expired first.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// The task ended without producing a value (it panicked or the runtime shut down).
    #[error("task ended before producing a result")]
    Aborted,
}

/// Blocks the current thread on a future with a finite timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockingWait {
    timeout: Duration,
}

impl BlockingWait {
    /// Create a waiter with the given bound.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The configured bound.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `future` on `runtime` and block until it finishes or the timeout expires.
    ///
    /// Must be called from a thread that is not driving `runtime` itself
    /// (a plain thread, or inside `tokio::task::spawn_blocking`).
    ///
    /// # Errors
    ///
    /// - [`WaitError::TimedOut`] if the future has not finished in time
    /// - [`WaitError::Aborted`] if the task ended without a result
    pub fn wait<F>(&self, runtime: &Handle, future: F) -> Result<F::Output, WaitError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        runtime.spawn(async move {
            // The receiver may have given up already.
            let _ = tx.send(future.await);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(output) => Ok(output),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis(),
                    "Blocking wait expired"
                );
                Err(WaitError::TimedOut(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(WaitError::Aborted),
        }
    }
}
