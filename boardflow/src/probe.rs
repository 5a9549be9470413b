//! Probe: a passive side-channel observer of scheduler internals.
//!
//! The probe sees a superset of the harness stream, including per-edge
//! delivery reports and nested graph brackets. Reporting is fire-and-forget:
//! `report` must not block, and the scheduler never awaits it.

use std::sync::Mutex;

use serde::Serialize;

use crate::descriptor::{Edge, InputValues, OutputValues};
use crate::event::InvocationPath;

/// Diagnostic event reported to a probe.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeEvent {
    #[serde(rename = "graphstart")]
    GraphStart { path: InvocationPath },
    #[serde(rename = "graphend")]
    GraphEnd { path: InvocationPath },
    #[serde(rename = "nodestart")]
    NodeStart {
        path: InvocationPath,
        node: String,
        inputs: InputValues,
    },
    #[serde(rename = "nodeend")]
    NodeEnd {
        path: InvocationPath,
        node: String,
        outputs: OutputValues,
    },
    Skip {
        path: InvocationPath,
        node: String,
        #[serde(rename = "missingInputs")]
        missing_inputs: Vec<String>,
    },
    /// One delivery over one edge, with the port names that arrived.
    Edge {
        path: InvocationPath,
        edge: Edge,
        delivered: Vec<String>,
    },
    Error { path: InvocationPath, error: String },
}

/// Observer of [`ProbeEvent`]s. Implementations must return promptly;
/// anything slow belongs on the implementation's own channel or task.
pub trait Probe: Send + Sync {
    fn report(&self, event: &ProbeEvent);
}

/// Collects every reported event; for tests and offline inspection.
#[derive(Default)]
pub struct VecProbe {
    events: Mutex<Vec<ProbeEvent>>,
}

impl VecProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out everything reported so far.
    pub fn events(&self) -> Vec<ProbeEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Probe for VecProbe {
    fn report(&self, event: &ProbeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Forwards probe events to the logging helpers.
pub struct LogProbe;

impl Probe for LogProbe {
    fn report(&self, event: &ProbeEvent) {
        match event {
            ProbeEvent::GraphStart { path } => crate::logging::log_run_start(path),
            ProbeEvent::GraphEnd { path } => crate::logging::log_run_complete(path),
            ProbeEvent::NodeStart { node, .. } => crate::logging::log_node_start(node, ""),
            ProbeEvent::NodeEnd { node, .. } => crate::logging::log_node_complete(node),
            ProbeEvent::Skip {
                node,
                missing_inputs,
                ..
            } => crate::logging::log_node_skipped(node, missing_inputs),
            ProbeEvent::Edge { .. } => {}
            ProbeEvent::Error { error, .. } => {
                crate::logging::log_run_error(&crate::error::RunError::InvalidGraph(error.clone()))
            }
        }
    }
}
