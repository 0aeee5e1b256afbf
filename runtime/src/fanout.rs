//! Fan-out/join.
//!
//! Issues one fetch per key, all started before any is awaited, and joins
//! them once every fetch has settled. Completions race, so:
//!
//! - a shared [`Countdown`] is decremented exactly once per fetch with an
//!   atomic decrement-and-compare, from whichever worker thread the fetch
//!   finished on (a drop guard covers fetches that panic)
//! - results land in a [`Collector`] that tolerates concurrent pushes
//! - the joined result is re-sorted into the original key order at the end
//!
//! The join never fails as a whole. Missing and failed fetches are reported
//! back in [`Joined::failures`] for the caller to log and elide.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

/// Countdown latch that can be decremented from any thread.
#[derive(Debug)]
pub struct Countdown {
    remaining: AtomicUsize,
    zero: Notify,
}

impl Countdown {
    /// Create a latch expecting `count` completions.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            zero: Notify::new(),
        }
    }

    /// Record one completion. Returns `true` for the completion that reached zero.
    ///
    /// Extra calls once the latch is at zero are ignored.
    pub fn count_down(&self) -> bool {
        let reached_zero = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok_and(|previous| previous == 1);

        if reached_zero {
            self.zero.notify_one();
        }
        reached_zero
    }

    /// Completions still outstanding.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Wait until the latch reaches zero.
    pub async fn wait(&self) {
        if self.remaining() == 0 {
            return;
        }
        // notify_one stores a permit, so a count_down racing this check is not lost.
        self.zero.notified().await;
    }
}

/// Decrements a [`Countdown`] when dropped, whether the fetch finished or panicked.
#[derive(Debug)]
pub struct CountdownGuard(Arc<Countdown>);

impl CountdownGuard {
    /// Arm a guard for one expected completion.
    #[must_use]
    pub const fn new(countdown: Arc<Countdown>) -> Self {
        Self(countdown)
    }
}

impl Drop for CountdownGuard {
    fn drop(&mut self) {
        self.0.count_down();
    }
}

/// Append-only collector shared by concurrent completions.
#[derive(Debug)]
pub struct Collector<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Collector<T> {
    /// Create an empty collector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Append an item.
    pub fn push(&self, item: T) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }

    /// Take everything collected so far.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a key has no item in a [`Joined`] result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure<E> {
    /// The fetch succeeded but the record does not exist.
    Missing,
    /// The fetch returned an error.
    Failed(E),
    /// The fetch task ended without reporting (it panicked).
    Aborted,
}

/// Outcome of [`join_ordered`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined<T, E> {
    /// Fetched items, in the order of the requested keys.
    pub items: Vec<T>,
    /// Keys with no item, in the order of the requested keys.
    pub failures: Vec<(String, FetchFailure<E>)>,
}

/// Fetch every key concurrently and join the results in key order.
///
/// Each fetch runs as its own task on the current Tokio runtime. `fetch`
/// returns `Ok(None)` for an absent record.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub async fn join_ordered<T, E, F, Fut>(keys: &[String], fetch: F) -> Joined<T, E>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    if keys.is_empty() {
        return Joined {
            items: Vec::new(),
            failures: Vec::new(),
        };
    }

    let countdown = Arc::new(Countdown::new(keys.len()));
    let collected: Arc<Collector<(usize, T)>> = Arc::new(Collector::new());
    let failed: Arc<Collector<(usize, FetchFailure<E>)>> = Arc::new(Collector::new());

    for (index, key) in keys.iter().enumerate() {
        let guard = CountdownGuard::new(Arc::clone(&countdown));
        let collected = Arc::clone(&collected);
        let failed = Arc::clone(&failed);
        let pending = fetch(key.clone());

        tokio::spawn(async move {
            let _guard = guard;
            match pending.await {
                Ok(Some(item)) => collected.push((index, item)),
                Ok(None) => failed.push((index, FetchFailure::Missing)),
                Err(err) => failed.push((index, FetchFailure::Failed(err))),
            }
        });
    }

    countdown.wait().await;

    let mut items = collected.take();
    items.sort_by_key(|(index, _)| *index);
    let mut failures = failed.take();

    let mut reported = vec![false; keys.len()];
    for (index, _) in &items {
        reported[*index] = true;
    }
    for (index, _) in &failures {
        reported[*index] = true;
    }
    failures.extend(
        reported
            .iter()
            .enumerate()
            .filter(|(_, seen)| !**seen)
            .map(|(index, _)| (index, FetchFailure::Aborted)),
    );
    failures.sort_by_key(|(index, _)| *index);

    Joined {
        items: items.into_iter().map(|(_, item)| item).collect(),
        failures: failures
            .into_iter()
            .map(|(index, failure)| (keys[index].clone(), failure))
            .collect(),
    }
}
