//! Graph descriptor: the full board, including subgraphs and modules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Edge, InputValues, NodeDescriptor};

/// A board: nodes and edges, plus optional subgraphs, modules, and metadata.
///
/// Treated as immutable once a run starts; handlers receive it behind an
/// `Arc` and must not mutate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescriptor {
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Nested descriptors addressable by id (e.g. from an `invoke` node).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphs: Option<BTreeMap<String, GraphDescriptor>>,
    /// Named code modules for imperative boards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<BTreeMap<String, ModuleDescriptor>>,
    /// Id of the module to run when the board is imperative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GraphMetadata>,
    /// Arguments merged under a subgraph's inputs when invoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<InputValues>,
    /// Where the descriptor was loaded from; set by the loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl GraphDescriptor {
    /// Declarative board from nodes and edges.
    pub fn new(nodes: Vec<NodeDescriptor>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            ..Default::default()
        }
    }

    /// True when the board is imperative (`main` module instead of nodes).
    pub fn is_imperative(&self) -> bool {
        self.main.is_some()
    }

    /// Looks up a nested descriptor by id.
    pub fn subgraph(&self, id: &str) -> Option<&GraphDescriptor> {
        self.graphs.as_ref()?.get(id)
    }
}

/// A named code module; execution is delegated to a `ModuleRunner` capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Board-level metadata: version, title, tags, assets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// e.g. `published`, `component`, `deprecated`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<BTreeMap<String, Value>>,
}
