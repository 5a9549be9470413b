//! Node handlers and kits.
//!
//! A handler is the executable behavior behind a node type: an async
//! `invoke`, an optional `describe`, and optional metadata. Kits bundle
//! handlers by type name; the registry merges kits in priority order and
//! falls back to graph-valued handlers for URL-like types.

mod context;
mod registry;
mod throttle;

pub use context::{ModuleRunner, NodeHandlerContext};
pub use registry::{HandlerRegistry, Resolution};
pub use throttle::GraphHandlerCache;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::descriptor::{InputValues, OutputValues};
use crate::error::HandlerError;

/// Executable behavior for a node type.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Runs the node. Inputs are the shifted invocation map (configuration,
    /// constants, and one queued value per port). Failures are trapped by
    /// the machine and become the node's `$error` output.
    async fn invoke(
        &self,
        inputs: InputValues,
        context: &NodeHandlerContext,
    ) -> Result<OutputValues, HandlerError>;

    /// Port schemas for editors and validators. Default: undescribed.
    async fn describe(
        &self,
        _inputs: Option<&InputValues>,
        _context: &NodeHandlerContext,
    ) -> Option<NodeDescription> {
        None
    }

    /// Display metadata for the handler, if any.
    fn metadata(&self) -> Option<Value> {
        None
    }
}

/// Result of a `describe` call: input and output port schemas.
#[derive(Debug, Clone)]
pub struct NodeDescription {
    pub input_schema: Value,
    pub output_schema: Value,
}

/// A bundle of named handlers supplied to the runtime.
///
/// Kits compose by name with priority: when several kits define the same
/// type, the kit added to the runner first wins.
#[derive(Default)]
pub struct Kit {
    title: Option<String>,
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
}

impl Kit {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            handlers: HashMap::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Registers a handler under a type name (builder style).
    pub fn with_handler(
        mut self,
        node_type: impl Into<String>,
        handler: Arc<dyn NodeHandler>,
    ) -> Self {
        self.handlers.insert(node_type.into(), handler);
        self
    }

    /// Registers a synchronous function handler; convenient for tests and
    /// simple transforms.
    pub fn with_fn<F>(self, node_type: impl Into<String>, f: F) -> Self
    where
        F: Fn(InputValues) -> Result<OutputValues, HandlerError> + Send + Sync + 'static,
    {
        self.with_handler(node_type, Arc::new(FnHandler { f }))
    }

    pub fn get(&self, node_type: &str) -> Option<&Arc<dyn NodeHandler>> {
        self.handlers.get(node_type)
    }
}

struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F> NodeHandler for FnHandler<F>
where
    F: Fn(InputValues) -> Result<OutputValues, HandlerError> + Send + Sync,
{
    async fn invoke(
        &self,
        inputs: InputValues,
        _context: &NodeHandlerContext,
    ) -> Result<OutputValues, HandlerError> {
        (self.f)(inputs)
    }
}
