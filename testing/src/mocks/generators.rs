//! Deterministic id and access-code generators.

use coursehub_core::environment::{CodeGenerator, IdGenerator, RandomCodeGenerator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Predictable ids: `{prefix}-1`, `{prefix}-2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: Arc<AtomicU64>,
}

impl SequentialIdGenerator {
    /// Create a generator with the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

/// Yields scripted candidates in order, then falls back to random digits.
///
/// # Example
///
/// ```
/// use coursehub_testing::ScriptedCodeGenerator;
/// use coursehub_core::environment::CodeGenerator;
///
/// let codes = ScriptedCodeGenerator::new(["123456", "555555"]);
/// assert_eq!(codes.candidate(6), "123456");
/// assert_eq!(codes.candidate(6), "555555");
/// assert_eq!(codes.candidate(6).len(), 6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedCodeGenerator {
    script: Arc<Mutex<VecDeque<String>>>,
    issued: Arc<AtomicU64>,
}

impl ScriptedCodeGenerator {
    /// Script the candidates to hand out.
    #[must_use]
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Arc::new(Mutex::new(candidates.into_iter().map(Into::into).collect())),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of candidates handed out so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

impl CodeGenerator for ScriptedCodeGenerator {
    fn candidate(&self, length: usize) -> String {
        self.issued.fetch_add(1, Ordering::Relaxed);
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| RandomCodeGenerator.candidate(length))
    }
}
