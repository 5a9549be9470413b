//! Cooperative cancellation for runs.
//!
//! A cloneable flag the embedder triggers and the scheduler (and handlers)
//! check between steps. Abort does not roll back completed side effects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Shared abort flag passed into a run and on to every handler context.
#[derive(Clone, Default)]
pub struct AbortSignal {
    inner: Arc<AbortInner>,
}

#[derive(Default)]
struct AbortInner {
    aborted: AtomicBool,
    notify: Notify,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn trigger(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// True once cancellation was requested.
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Resolves when cancellation is requested; handlers can select on this
    /// against their own I/O.
    pub async fn aborted(&self) {
        if self.is_aborted() {
            return;
        }
        let notified = self.inner.notify.notified();
        if self.is_aborted() {
            return;
        }
        notified.await;
    }
}
