//! Injected dependencies that are not remote services.
//!
//! Time, identifiers and access-code candidates are abstracted behind traits
//! so workflows stay deterministic under test.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use coursehub_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let _now = clock.now();
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of new document ids and blob path suffixes.
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh, unique id.
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Source of access-code candidates.
pub trait CodeGenerator: Send + Sync {
    /// Produce a candidate of exactly `length` decimal digits.
    fn candidate(&self, length: usize) -> String;
}

/// Uniformly random digits from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn candidate(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}
