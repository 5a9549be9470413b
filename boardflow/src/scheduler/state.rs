//! Scheduler state and the readiness predicate.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::{Edge, InputValues, OutputValues, ERROR_PORT};

/// Mutable state of one graph traversal.
///
/// All operations are synchronous and side-effect free outside this object.
/// The ready queue holds node ids in discovery order; a node is queued at
/// most once per ready-wave (further deliveries only extend its queues).
#[derive(Debug, Default)]
pub struct SchedulerState {
    /// Pending deliveries: node -> port -> FIFO of values.
    inputs: HashMap<String, HashMap<String, VecDeque<Value>>>,
    /// Values from constant edges; persist across invocations of the target.
    constants: HashMap<String, InputValues>,
    /// Upstream ids whose control edges have fired, per node.
    control_wires: HashMap<String, Vec<String>>,
    /// Nodes that have run at least once.
    have_run: HashSet<String>,
    queue: VecDeque<String>,
    queued: HashSet<String>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` to the ready queue unless it is already waiting.
    /// Priority deliveries surface ahead of the rest of the wave.
    pub fn enqueue(&mut self, id: &str, priority: bool) -> bool {
        if !self.queued.insert(id.to_string()) {
            return false;
        }
        if priority {
            self.queue.push_front(id.to_string());
        } else {
            self.queue.push_back(id.to_string());
        }
        true
    }

    /// Pops the next node to consider; it may still be missing inputs.
    pub fn dequeue(&mut self) -> Option<String> {
        let id = self.queue.pop_front()?;
        self.queued.remove(&id);
        Some(id)
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn has_run(&self, id: &str) -> bool {
        self.have_run.contains(id)
    }

    /// Routes a producer's outputs into the target's input space.
    ///
    /// Star out delivers every output under its own name; control edges
    /// deliver nothing and instead record the upstream id on the target's
    /// control wires. A `$error` output rides along every non-control edge
    /// so failures reach downstream nodes whatever the port names.
    ///
    /// Returns the delivered port names; the machine enqueues the target
    /// when anything arrived.
    pub fn distribute(&mut self, edge: &Edge, outputs: &OutputValues) -> Vec<String> {
        if edge.is_control() {
            self.control_wires
                .entry(edge.to.clone())
                .or_default()
                .push(edge.from.clone());
            return vec![String::new()];
        }

        let mut delivery = InputValues::new();
        if edge.is_star_out() {
            for (port, value) in outputs {
                delivery.insert(port.clone(), value.clone());
            }
        } else if !edge.out.is_empty() {
            if let Some(value) = outputs.get(&edge.out) {
                let port = if edge.is_star_in() {
                    edge.out.clone()
                } else {
                    edge.in_.clone()
                };
                delivery.insert(port, value.clone());
            }
        }
        if let Some(error) = outputs.get(ERROR_PORT) {
            delivery
                .entry(ERROR_PORT.to_string())
                .or_insert_with(|| error.clone());
        }

        let delivered: Vec<String> = delivery.keys().cloned().collect();
        if delivery.is_empty() {
            return delivered;
        }

        if edge.constant {
            let constants = self.constants.entry(edge.to.clone()).or_default();
            for (port, value) in delivery {
                constants.insert(port, value);
            }
        } else {
            let queues = self.inputs.entry(edge.to.clone()).or_default();
            for (port, value) in delivery {
                queues.entry(port).or_default().push_back(value);
            }
        }
        delivered
    }

    /// The missing-input predicate.
    ///
    /// Required ports are the distinct specific `in` names across `heads`
    /// plus `schema_required`; a port is present when it appears in the
    /// node's configuration, constants, or a non-empty pending queue. Any
    /// incoming control edge requires at least one fired control wire,
    /// reported as the `""` port. A pending `$error` short-circuits the
    /// predicate so failures flow through nodes with unmet ports.
    ///
    /// Returns `None` when the node is ready, `Some(missing)` otherwise.
    pub fn missing_inputs(
        &self,
        id: &str,
        heads: &[Edge],
        configuration: Option<&InputValues>,
        schema_required: &[String],
    ) -> Option<Vec<String>> {
        if self.pending(id, ERROR_PORT) {
            return None;
        }

        let mut required: Vec<&str> = Vec::new();
        for edge in heads {
            let port = edge.in_.as_str();
            if port.is_empty() || port == "*" || required.contains(&port) {
                continue;
            }
            required.push(port);
        }
        for port in schema_required {
            if !required.contains(&port.as_str()) {
                required.push(port);
            }
        }

        let mut missing: Vec<String> = required
            .into_iter()
            .filter(|port| {
                let configured = configuration.map(|c| c.contains_key(*port)).unwrap_or(false);
                let constant = self
                    .constants
                    .get(id)
                    .map(|c| c.contains_key(*port))
                    .unwrap_or(false);
                !(configured || constant || self.pending(id, port))
            })
            .map(str::to_string)
            .collect();

        let has_control = heads.iter().any(Edge::is_control);
        let control_fired = self
            .control_wires
            .get(id)
            .map(|w| !w.is_empty())
            .unwrap_or(false);
        if has_control && !control_fired {
            missing.push(String::new());
        }

        if missing.is_empty() {
            None
        } else {
            Some(missing)
        }
    }

    /// Builds the invocation input map: configuration, overlaid with
    /// constants, overlaid with one value shifted off each pending queue.
    /// Records the node as run and clears its control wires.
    pub fn shift_inputs(&mut self, id: &str, configuration: Option<&InputValues>) -> InputValues {
        let mut shifted = configuration.cloned().unwrap_or_default();
        if let Some(constants) = self.constants.get(id) {
            for (port, value) in constants {
                shifted.insert(port.clone(), value.clone());
            }
        }
        if let Some(queues) = self.inputs.get_mut(id) {
            for (port, queue) in queues.iter_mut() {
                if let Some(value) = queue.pop_front() {
                    shifted.insert(port.clone(), value);
                }
            }
            queues.retain(|_, queue| !queue.is_empty());
        }
        self.have_run.insert(id.to_string());
        self.control_wires.remove(id);
        shifted
    }

    /// True when any of the node's ports has a queued value. Constants do
    /// not count; they persist without draining.
    pub fn has_pending(&self, id: &str) -> bool {
        self.inputs
            .get(id)
            .map(|queues| queues.values().any(|queue| !queue.is_empty()))
            .unwrap_or(false)
    }

    /// Pending queue length for one port (used by invariants in tests).
    pub fn pending_len(&self, id: &str, port: &str) -> usize {
        self.inputs
            .get(id)
            .and_then(|q| q.get(port))
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    fn pending(&self, id: &str, port: &str) -> bool {
        self.pending_len(id, port) > 0
    }

    /// Serializable copy of the whole state for reanimation.
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let mut have_run: Vec<String> = self.have_run.iter().cloned().collect();
        have_run.sort();
        SchedulerSnapshot {
            queue: self.queue.iter().cloned().collect(),
            inputs: self
                .inputs
                .iter()
                .map(|(id, queues)| {
                    (
                        id.clone(),
                        queues
                            .iter()
                            .map(|(port, queue)| (port.clone(), queue.iter().cloned().collect()))
                            .collect(),
                    )
                })
                .collect(),
            constants: self.constants.clone(),
            control_wires: self.control_wires.clone(),
            have_run,
        }
    }

    /// Rebuilds the state verbatim from a snapshot.
    pub fn restore(snapshot: SchedulerSnapshot) -> Self {
        let queued = snapshot.queue.iter().cloned().collect();
        Self {
            inputs: snapshot
                .inputs
                .into_iter()
                .map(|(id, queues)| {
                    (
                        id,
                        queues
                            .into_iter()
                            .map(|(port, queue)| (port, queue.into_iter().collect()))
                            .collect(),
                    )
                })
                .collect(),
            constants: snapshot.constants,
            control_wires: snapshot.control_wires,
            have_run: snapshot.have_run.into_iter().collect(),
            queue: snapshot.queue.into(),
            queued,
        }
    }
}

/// Wire form of [`SchedulerState`], embedded in reanimation blobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub queue: Vec<String>,
    pub inputs: HashMap<String, HashMap<String, Vec<Value>>>,
    pub constants: HashMap<String, InputValues>,
    #[serde(rename = "controlWires")]
    pub control_wires: HashMap<String, Vec<String>>,
    #[serde(rename = "haveRun")]
    pub have_run: Vec<String>,
}
