//! Identifier source for tickets and correlation ids.
//!
//! Injected through the runner so tests can pin ids; the default source is a
//! process-local counter, which keeps single-run streams deterministic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Produces opaque unique ids for tickets and event correlation.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Deterministic id source: `prefix-1`, `prefix-2`, ...
///
/// The runner's default (`SeededIdSource::new("run")`). Give each test its
/// own seed to make expected tickets literal.
pub struct SeededIdSource {
    prefix: String,
    counter: AtomicU64,
}

impl SeededIdSource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn shared(prefix: impl Into<String>) -> Arc<dyn IdSource> {
        Arc::new(Self::new(prefix))
    }
}

impl IdSource for SeededIdSource {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}
