//! Node descriptor: id, type, configuration, and display metadata.

use serde::{Deserialize, Serialize};

use super::InputValues;

/// One vertex of a board. `type` names the handler that runs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Unique id within the graph.
    pub id: String,
    /// Handler type; resolved through kits or, for URL-like types, the loader.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Values baked into every invocation of this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<InputValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,
}

impl NodeDescriptor {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            configuration: None,
            metadata: None,
        }
    }

    /// Sets the node configuration (builder style).
    pub fn with_configuration(mut self, configuration: InputValues) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Sets the node metadata (builder style).
    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the `start` tag label when this node is an entry, if any.
    /// A bare `start` tag counts as the `"default"` label.
    pub fn start_label(&self) -> Option<&str> {
        let metadata = self.metadata.as_ref()?;
        metadata.tags.iter().find_map(|tag| match tag {
            NodeTag::Plain(name) if name == "start" => Some("default"),
            NodeTag::Typed { kind, label } if kind == "start" => {
                Some(label.as_deref().unwrap_or("default"))
            }
            _ => None,
        })
    }
}

/// Display and behavior hints attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<NodeTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(rename = "logLevel", default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// A tag on a node: either a plain name or a typed tag with a label
/// (the `start` tag selects entry nodes per run label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeTag {
    Plain(String),
    Typed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}
