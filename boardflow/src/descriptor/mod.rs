//! Board descriptor: nodes + edges + subgraphs, the immutable input to a run.
//!
//! A descriptor is plain serde data. `GraphDescriptor` is what a `Loader`
//! yields and what `BoardRunner` executes; it never changes during a run.

mod edge;
mod graph;
mod node;

pub use edge::Edge;
pub use graph::{GraphDescriptor, GraphMetadata, ModuleDescriptor};
pub use node::{NodeDescriptor, NodeMetadata, NodeTag};

/// Values arriving on a node's input ports, keyed by port name.
pub type InputValues = serde_json::Map<String, serde_json::Value>;

/// Values leaving a node's output ports, keyed by port name.
pub type OutputValues = serde_json::Map<String, serde_json::Value>;

/// Reserved output key carrying a structured failure between nodes.
pub const ERROR_PORT: &str = "$error";
