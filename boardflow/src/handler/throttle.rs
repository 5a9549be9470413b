//! Throttled cache for graph-valued handler resolution.
//!
//! Burst evaluation of a board can ask for the same URL-like type many
//! times in quick succession. The cache keeps one shared in-flight load
//! per type for a short window so concurrent resolutions join it instead
//! of stampeding the loader.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::descriptor::GraphDescriptor;
use crate::loader::Loader;

type SharedLoad = Shared<BoxFuture<'static, Option<Arc<GraphDescriptor>>>>;

/// Default throttle window for repeated resolutions of one type.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_secs(10);

/// Per-type cache of in-flight and recently finished graph loads.
pub struct GraphHandlerCache {
    window: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    at: Instant,
    load: SharedLoad,
}

impl Default for GraphHandlerCache {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_WINDOW)
    }
}

impl GraphHandlerCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the shared load for `node_type`, starting one when no fresh
    /// entry exists. The lock is only held around the map; awaiting happens
    /// on the shared future outside it, so reentrant resolution cannot
    /// deadlock.
    pub fn resolve(
        &self,
        node_type: &str,
        loader: Arc<dyn Loader>,
        base: Option<String>,
    ) -> SharedLoad {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            // A poisoned map only loses caching; load directly.
            Err(_) => return Self::start_load(node_type, loader, base),
        };
        if let Some(entry) = entries.get(node_type) {
            if entry.at.elapsed() < self.window {
                return entry.load.clone();
            }
        }
        let load = Self::start_load(node_type, loader, base);
        entries.insert(
            node_type.to_string(),
            CacheEntry {
                at: Instant::now(),
                load: load.clone(),
            },
        );
        load
    }

    fn start_load(node_type: &str, loader: Arc<dyn Loader>, base: Option<String>) -> SharedLoad {
        let url = node_type.to_string();
        async move {
            loader
                .load(&url, base.as_deref())
                .await
                .ok()
                .flatten()
                .map(Arc::new)
        }
        .boxed()
        .shared()
    }
}
