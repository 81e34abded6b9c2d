use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of fresh ticket identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs rendered as hyphenated strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-1`, `prefix-2`, ... ids for tests and fixtures.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), counter: AtomicU64::new(0) }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self { Self::new("ticket") }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}
