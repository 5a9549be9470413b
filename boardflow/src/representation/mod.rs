//! Derived view of a descriptor: per-node edge indices and entry set.
//!
//! Built once at run start and shared read-only with the traversal machine.
//! Edge endpoints are validated here; an unresolvable endpoint is a
//! descriptor error and fatal to the run.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map};

use crate::descriptor::{Edge, GraphDescriptor, NodeDescriptor};
use crate::error::RunError;
use crate::logging::log_edge_normalized;

/// Default entry label when the run does not request one.
pub const DEFAULT_START_LABEL: &str = "default";

/// Indexed, normalized form of a descriptor for one run.
pub struct GraphRepresentation {
    descriptor: Arc<GraphDescriptor>,
    /// Edges leaving each node, in descriptor order, star-normalized.
    tails: HashMap<String, Vec<Edge>>,
    /// Edges arriving at each node, in descriptor order, star-normalized.
    heads: HashMap<String, Vec<Edge>>,
    nodes_by_id: HashMap<String, NodeDescriptor>,
    /// Entry node ids, in descriptor order.
    entries: Vec<String>,
}

impl GraphRepresentation {
    /// Builds the representation for `descriptor` with the default start label.
    pub fn new(descriptor: Arc<GraphDescriptor>) -> Result<Self, RunError> {
        Self::with_start_label(descriptor, DEFAULT_START_LABEL)
    }

    /// Builds the representation, selecting entries by `start` tag label.
    ///
    /// Imperative descriptors (`main` + `modules`) are lifted to declarative
    /// form first.
    pub fn with_start_label(
        descriptor: Arc<GraphDescriptor>,
        start_label: &str,
    ) -> Result<Self, RunError> {
        let descriptor = if descriptor.is_imperative() {
            Arc::new(lift_imperative(&descriptor)?)
        } else {
            descriptor
        };

        if descriptor.nodes.is_empty() {
            return Err(RunError::InvalidGraph("board has no nodes".into()));
        }

        let mut nodes_by_id = HashMap::new();
        for node in &descriptor.nodes {
            if nodes_by_id.insert(node.id.clone(), node.clone()).is_some() {
                return Err(RunError::InvalidGraph(format!(
                    "duplicate node id `{}`",
                    node.id
                )));
            }
        }

        let mut tails: HashMap<String, Vec<Edge>> = HashMap::new();
        let mut heads: HashMap<String, Vec<Edge>> = HashMap::new();
        for edge in &descriptor.edges {
            if !nodes_by_id.contains_key(&edge.from) {
                return Err(RunError::InvalidGraph(format!(
                    "edge references unknown node `{}`",
                    edge.from
                )));
            }
            if !nodes_by_id.contains_key(&edge.to) {
                return Err(RunError::InvalidGraph(format!(
                    "edge references unknown node `{}`",
                    edge.to
                )));
            }
            let edge = normalize_star(edge.clone());
            tails.entry(edge.from.clone()).or_default().push(edge.clone());
            heads.entry(edge.to.clone()).or_default().push(edge);
        }

        let entries = find_entries(&descriptor, &heads, start_label);
        if entries.is_empty() {
            return Err(RunError::InvalidGraph(
                "board has no entry nodes (no start tags and no edge-free nodes)".into(),
            ));
        }

        Ok(Self {
            descriptor,
            tails,
            heads,
            nodes_by_id,
            entries,
        })
    }

    pub fn descriptor(&self) -> &Arc<GraphDescriptor> {
        &self.descriptor
    }

    /// Edges leaving `id`, in descriptor order.
    pub fn tails(&self, id: &str) -> &[Edge] {
        self.tails.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges arriving at `id`, in descriptor order.
    pub fn heads(&self, id: &str) -> &[Edge] {
        self.heads.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes_by_id.get(id)
    }

    /// Entry node ids for this run, in descriptor order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// Rewrites half-star edges to matching star ports.
///
/// `*→specific` and `specific→*` have no port to pair the value with, so
/// both sides become `*` and the delivery carries every output under its
/// own name. Control edges are left alone.
fn normalize_star(mut edge: Edge) -> Edge {
    if edge.is_control() {
        return edge;
    }
    let star_out = edge.is_star_out();
    let star_in = edge.is_star_in();
    if star_out && !star_in {
        log_edge_normalized(&edge.from, &edge.to);
        edge.in_ = "*".into();
    } else if star_in && !star_out && !edge.out.is_empty() {
        log_edge_normalized(&edge.from, &edge.to);
        edge.out = "*".into();
    }
    edge
}

/// Entries: nodes tagged `start` with a matching label; failing that, all
/// nodes with no incoming edges. Descriptor order either way.
fn find_entries(
    descriptor: &GraphDescriptor,
    heads: &HashMap<String, Vec<Edge>>,
    start_label: &str,
) -> Vec<String> {
    let tagged: Vec<String> = descriptor
        .nodes
        .iter()
        .filter(|n| n.start_label() == Some(start_label))
        .map(|n| n.id.clone())
        .collect();
    if !tagged.is_empty() {
        return tagged;
    }
    descriptor
        .nodes
        .iter()
        .filter(|n| heads.get(&n.id).map(|h| h.is_empty()).unwrap_or(true))
        .map(|n| n.id.clone())
        .collect()
}

/// Lifts an imperative board (`main` + `modules`) to declarative form:
/// `input.* → runModule(configured with $module: main) → output.*`.
pub fn lift_imperative(descriptor: &GraphDescriptor) -> Result<GraphDescriptor, RunError> {
    let main = descriptor
        .main
        .as_ref()
        .ok_or_else(|| RunError::InvalidGraph("imperative board without main".into()))?;
    let modules = descriptor
        .modules
        .as_ref()
        .ok_or_else(|| RunError::InvalidGraph("imperative board without modules".into()))?;
    if !modules.contains_key(main) {
        return Err(RunError::InvalidGraph(format!(
            "main module `{main}` not found in modules"
        )));
    }

    let mut run_module_config = Map::new();
    run_module_config.insert("$module".into(), json!(main));

    Ok(GraphDescriptor {
        nodes: vec![
            NodeDescriptor::new("input", "input"),
            NodeDescriptor::new("runModule", "runModule").with_configuration(run_module_config),
            NodeDescriptor::new("output", "output"),
        ],
        edges: vec![
            Edge::star("input", "runModule"),
            Edge::star("runModule", "output"),
        ],
        modules: descriptor.modules.clone(),
        metadata: descriptor.metadata.clone(),
        args: descriptor.args.clone(),
        url: descriptor.url.clone(),
        ..Default::default()
    })
}
