//! Handler resolution: kits first, then graph-valued URL types.

use std::sync::Arc;

use crate::descriptor::GraphDescriptor;
use crate::loader::{is_url_like, Loader};

use super::throttle::GraphHandlerCache;
use super::{Kit, NodeHandler};

/// Outcome of resolving a node type.
pub enum Resolution {
    /// A kit supplied the handler.
    Handler(Arc<dyn NodeHandler>),
    /// The type is a URL that loaded as a board; invoke it as a subgraph.
    Graph(Arc<GraphDescriptor>),
    /// Nobody knows this type; the node's outputs become `$error`.
    Unknown,
}

/// Resolves node types to handlers.
///
/// Kits are consulted in the order they were supplied (earlier kits win).
/// URL-like types fall through to the loader behind the throttled cache.
#[derive(Default)]
pub struct HandlerRegistry {
    kits: Vec<Arc<Kit>>,
    graph_cache: GraphHandlerCache,
}

impl HandlerRegistry {
    pub fn new(kits: Vec<Arc<Kit>>) -> Self {
        Self {
            kits,
            graph_cache: GraphHandlerCache::default(),
        }
    }

    pub fn kits(&self) -> &[Arc<Kit>] {
        &self.kits
    }

    pub async fn resolve(
        &self,
        node_type: &str,
        loader: &Arc<dyn Loader>,
        base: Option<&str>,
    ) -> Resolution {
        for kit in &self.kits {
            if let Some(handler) = kit.get(node_type) {
                return Resolution::Handler(handler.clone());
            }
        }
        if is_url_like(node_type) {
            let load =
                self.graph_cache
                    .resolve(node_type, loader.clone(), base.map(str::to_string));
            if let Some(graph) = load.await {
                return Resolution::Graph(graph);
            }
        }
        Resolution::Unknown
    }
}
