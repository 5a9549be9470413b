//! Traversal machine: the main scheduling loop for one graph invocation.
//!
//! One machine drives one graph; nested graphs get their own machine whose
//! events flow into the same stream with an extended invocation path. At
//! any moment exactly one node handler is executing within a machine.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::descriptor::{InputValues, NodeDescriptor, OutputValues, ERROR_PORT};
use crate::error::RunError;
use crate::event::{now_millis, InputReply, InvocationPath, RunEvent};
use crate::handler::{NodeHandlerContext, Resolution};
use crate::logging::{log_node_complete, log_node_skipped, log_node_start};
use crate::probe::ProbeEvent;
use crate::representation::GraphRepresentation;
use crate::run::config::LogLevel;
use crate::run::invoke::invoke_graph;
use crate::run::reanimation::{PendingInput, ReanimationState};
use crate::scheduler::SchedulerState;

/// Node type intercepted by the machine for input resolution.
pub(crate) const INPUT_TYPE: &str = "input";

/// Node type intercepted by the machine for output capture.
pub(crate) const OUTPUT_TYPE: &str = "output";

/// How one machine run ended.
pub(crate) enum Outcome {
    /// Queue drained (or first output in a nested run); the payload is the
    /// most recent captured outputs.
    Done(Option<OutputValues>),
    /// The run reached an unsatisfiable input node and captured its state.
    Paused(ReanimationState),
}

enum InputOutcome {
    Outputs(OutputValues),
    Pause(Value),
}

pub(crate) struct TraversalMachine {
    rep: Arc<GraphRepresentation>,
    state: SchedulerState,
    ctx: NodeHandlerContext,
    /// Inputs feeding this graph's input nodes (run config inputs at the
    /// top level, caller-supplied inputs merged over args for subgraphs).
    run_inputs: InputValues,
    log_level: LogLevel,
    /// Per-graph invocation counter; node paths append its next value.
    next_invocation: u64,
    /// Nested runs return at the first output node.
    stop_at_first_output: bool,
    /// Only the top-level machine may capture reanimation state.
    allow_pause: bool,
    last_outputs: Option<OutputValues>,
    resume: Option<PendingInput>,
}

impl TraversalMachine {
    /// Fresh machine for a top-level run; seeds the queue with entries.
    pub(crate) fn top_level(
        rep: Arc<GraphRepresentation>,
        ctx: NodeHandlerContext,
        run_inputs: InputValues,
        log_level: LogLevel,
    ) -> Self {
        let mut machine = Self {
            rep,
            state: SchedulerState::new(),
            ctx,
            run_inputs,
            log_level,
            next_invocation: 0,
            stop_at_first_output: false,
            allow_pause: true,
            last_outputs: None,
            resume: None,
        };
        machine.seed();
        machine
    }

    /// Machine for a nested invocation; returns at the first output node
    /// and never captures pause state.
    pub(crate) fn nested(
        rep: Arc<GraphRepresentation>,
        ctx: NodeHandlerContext,
        run_inputs: InputValues,
    ) -> Self {
        let mut machine = Self {
            rep,
            state: SchedulerState::new(),
            ctx,
            run_inputs,
            log_level: LogLevel::Info,
            next_invocation: 0,
            stop_at_first_output: true,
            allow_pause: false,
            last_outputs: None,
            resume: None,
        };
        machine.seed();
        machine
    }

    /// Machine restored verbatim from a reanimation blob. The pending input
    /// node is replayed first with `run_inputs` as its supplied values.
    pub(crate) fn reanimated(
        rep: Arc<GraphRepresentation>,
        ctx: NodeHandlerContext,
        run_inputs: InputValues,
        state: ReanimationState,
        log_level: LogLevel,
    ) -> Self {
        Self {
            rep,
            state: SchedulerState::restore(state.scheduler),
            ctx,
            run_inputs,
            log_level,
            next_invocation: state.next_invocation,
            stop_at_first_output: false,
            allow_pause: true,
            last_outputs: None,
            resume: Some(state.pending_input),
        }
    }

    fn seed(&mut self) {
        let entries: Vec<String> = self.rep.entries().to_vec();
        for id in entries {
            self.state.enqueue(&id, false);
        }
    }

    pub(crate) async fn run(mut self) -> Result<Outcome, RunError> {
        let path = self.ctx.invocation_path.clone();
        self.emit(RunEvent::GraphStart {
            path: path.clone(),
            timestamp: now_millis(),
        })
        .await?;
        self.report(ProbeEvent::GraphStart { path: path.clone() });

        if let Some(pending) = self.resume.take() {
            self.replay_pending(pending).await?;
        }

        while let Some(id) = self.state.dequeue() {
            if self.ctx.signal.is_aborted() {
                return Err(RunError::Aborted);
            }
            let Some(node) = self.rep.node(&id).cloned() else {
                continue;
            };
            let configuration = node.configuration.clone();
            let schema_required = if node.node_type == INPUT_TYPE {
                Vec::new()
            } else {
                schema_required_ports(configuration.as_ref())
            };

            if let Some(missing) = self.state.missing_inputs(
                &id,
                self.rep.heads(&id),
                configuration.as_ref(),
                &schema_required,
            ) {
                if self.log_level == LogLevel::Debug {
                    log_node_skipped(&id, &missing);
                }
                self.emit(RunEvent::Skip {
                    path: path.clone(),
                    timestamp: now_millis(),
                    node: node.clone(),
                    missing_inputs: missing.clone(),
                })
                .await?;
                self.report(ProbeEvent::Skip {
                    path: path.clone(),
                    node: id.clone(),
                    missing_inputs: missing,
                });
                continue;
            }

            let inputs = self.state.shift_inputs(&id, configuration.as_ref());
            self.next_invocation += 1;
            let node_path = child_path(&path, self.next_invocation);
            if self.log_level == LogLevel::Debug {
                log_node_start(&id, &node.node_type);
            }
            self.emit(RunEvent::NodeStart {
                path: node_path.clone(),
                timestamp: now_millis(),
                node: node.clone(),
                inputs: inputs.clone(),
            })
            .await?;
            self.report(ProbeEvent::NodeStart {
                path: node_path.clone(),
                node: id.clone(),
                inputs: inputs.clone(),
            });

            let outputs = if inputs.contains_key(ERROR_PORT) && node.node_type != OUTPUT_TYPE {
                // error passthrough: downstream nodes surface the failure
                // without running their handler
                let mut outputs = OutputValues::new();
                outputs.insert(ERROR_PORT.to_string(), inputs[ERROR_PORT].clone());
                outputs
            } else {
                match node.node_type.as_str() {
                    INPUT_TYPE => match self.run_input_node(&node, &inputs).await? {
                        InputOutcome::Outputs(outputs) => outputs,
                        InputOutcome::Pause(schema) => {
                            return Ok(Outcome::Paused(self.capture_pause(
                                node_path, id, schema, inputs,
                            )));
                        }
                    },
                    OUTPUT_TYPE => self.run_output_node(&inputs).await?,
                    _ => self.invoke_handler(&node, &inputs, &node_path).await,
                }
            };

            // large inline parts move out-of-band once a data store is
            // configured; they inflate back at the output boundary
            let outputs = self.deflated(outputs).await;

            if self.log_level == LogLevel::Debug {
                log_node_complete(&id);
            }
            self.emit(RunEvent::NodeEnd {
                path: node_path.clone(),
                timestamp: now_millis(),
                node: node.clone(),
                inputs,
                outputs: outputs.clone(),
            })
            .await?;
            self.report(ProbeEvent::NodeEnd {
                path: node_path,
                node: id.clone(),
                outputs: outputs.clone(),
            });

            if node.node_type == OUTPUT_TYPE && self.stop_at_first_output {
                self.finish(&path).await?;
                return Ok(Outcome::Done(self.last_outputs.take()));
            }

            self.distribute_outputs(&id, &outputs);

            // queued values are FIFO regardless of origin: a node with more
            // satisfying deliveries left goes around again
            if self.state.has_pending(&id)
                && self
                    .state
                    .missing_inputs(
                        &id,
                        self.rep.heads(&id),
                        configuration.as_ref(),
                        &schema_required,
                    )
                    .is_none()
            {
                self.state.enqueue(&id, false);
            }
        }

        self.finish(&path).await?;
        Ok(Outcome::Done(self.last_outputs.take()))
    }

    /// Re-emits the paused invocation and injects the supplied values as
    /// its outputs, making a resumed stream match a pre-supplied run.
    async fn replay_pending(&mut self, pending: PendingInput) -> Result<(), RunError> {
        let node = self
            .rep
            .node(&pending.node)
            .cloned()
            .ok_or_else(|| {
                RunError::Reanimation(format!("paused node `{}` not in board", pending.node))
            })?;
        self.emit(RunEvent::NodeStart {
            path: pending.path.clone(),
            timestamp: now_millis(),
            node: node.clone(),
            inputs: pending.inputs.clone(),
        })
        .await?;
        let outputs = merge_supplied(&pending.inputs, &self.run_inputs);
        self.emit(RunEvent::NodeEnd {
            path: pending.path,
            timestamp: now_millis(),
            node,
            inputs: pending.inputs,
            outputs: outputs.clone(),
        })
        .await?;
        self.distribute_outputs(&pending.node, &outputs);
        Ok(())
    }

    async fn run_input_node(
        &mut self,
        node: &NodeDescriptor,
        inputs: &InputValues,
    ) -> Result<InputOutcome, RunError> {
        let schema = inputs.get("schema").cloned().unwrap_or_else(|| json!({}));
        let candidate = merge_supplied(inputs, &self.run_inputs);
        let satisfied = match required_ports(&schema) {
            Some(required) => required.iter().all(|port| candidate.contains_key(port)),
            None => !candidate.is_empty(),
        };
        if satisfied {
            return Ok(InputOutcome::Outputs(candidate));
        }

        if self.ctx.interactive {
            let (reply, rx) = InputReply::channel();
            self.emit(RunEvent::Input {
                node: node.clone(),
                input_arguments: candidate.clone(),
                schema,
                next: None,
                correlation: self.ctx.ids.next_id(),
                reply: Some(reply),
            })
            .await?;
            return match rx.await {
                Ok(values) => {
                    let mut outputs = candidate;
                    for (port, value) in values {
                        outputs.insert(port, value);
                    }
                    Ok(InputOutcome::Outputs(outputs))
                }
                // the observer walked away from a paused run
                Err(_) => Err(RunError::Aborted),
            };
        }

        if self.allow_pause && self.ctx.run_state_store.is_some() {
            return Ok(InputOutcome::Pause(schema));
        }

        Ok(InputOutcome::Outputs(error_outputs(
            &format!("input node `{}` has no supplied values", node.id),
            Some(inputs),
        )))
    }

    async fn run_output_node(&mut self, inputs: &InputValues) -> Result<OutputValues, RunError> {
        let mut outputs = inputs.clone();
        outputs.remove("schema");
        if self.ctx.invocation_path.is_empty() {
            let emitted = self.inflated(outputs.clone()).await;
            self.emit(RunEvent::Output { outputs: emitted }).await?;
        }
        self.last_outputs = Some(outputs.clone());
        Ok(outputs)
    }

    async fn invoke_handler(
        &self,
        node: &NodeDescriptor,
        inputs: &InputValues,
        node_path: &InvocationPath,
    ) -> OutputValues {
        let resolution = self
            .ctx
            .registry
            .resolve(&node.node_type, &self.ctx.loader, self.ctx.base.as_deref())
            .await;
        match resolution {
            Resolution::Handler(handler) => {
                let hctx = self.ctx.for_invocation(node_path.clone());
                match handler.invoke(inputs.clone(), &hctx).await {
                    Ok(outputs) => outputs,
                    Err(err) => error_outputs(&err.to_string(), Some(inputs)),
                }
            }
            Resolution::Graph(graph) => {
                let hctx = self.ctx.for_invocation(node_path.clone());
                Box::pin(invoke_graph(&hctx, (*graph).clone(), inputs.clone())).await
            }
            Resolution::Unknown => {
                let mut outputs = OutputValues::new();
                outputs.insert(
                    ERROR_PORT.to_string(),
                    json!(format!("no handler for type `{}`", node.node_type)),
                );
                outputs
            }
        }
    }

    fn capture_pause(
        &self,
        node_path: InvocationPath,
        node: String,
        schema: Value,
        inputs: InputValues,
    ) -> ReanimationState {
        ReanimationState {
            scheduler: self.state.snapshot(),
            pending_input: PendingInput {
                path: node_path,
                node,
                schema,
                inputs,
            },
            invocation_path: self.ctx.invocation_path.clone(),
            next_invocation: self.next_invocation,
        }
    }

    fn distribute_outputs(&mut self, id: &str, outputs: &OutputValues) {
        let edges: Vec<_> = self.rep.tails(id).to_vec();
        for edge in edges {
            let delivered = self.state.distribute(&edge, outputs);
            if self.ctx.diagnostics {
                self.report(ProbeEvent::Edge {
                    path: self.ctx.invocation_path.clone(),
                    edge: edge.clone(),
                    delivered: delivered.clone(),
                });
            }
            if !delivered.is_empty() {
                self.state.enqueue(&edge.to, edge.priority);
            }
        }
    }

    async fn finish(&mut self, path: &InvocationPath) -> Result<(), RunError> {
        self.emit(RunEvent::GraphEnd {
            path: path.clone(),
            timestamp: now_millis(),
        })
        .await?;
        self.report(ProbeEvent::GraphEnd { path: path.clone() });
        Ok(())
    }

    /// Moves inline data parts into the data store, leaving handles.
    async fn deflated(&self, outputs: OutputValues) -> OutputValues {
        let Some(store) = &self.ctx.data_store else {
            return outputs;
        };
        match crate::data::deflate(store.as_ref(), Value::Object(outputs.clone())).await {
            Ok(Value::Object(deflated)) => deflated,
            _ => outputs,
        }
    }

    /// Resolves stored-data handles before values cross to the observer.
    async fn inflated(&self, outputs: OutputValues) -> OutputValues {
        let Some(store) = &self.ctx.data_store else {
            return outputs;
        };
        match crate::data::inflate(store.as_ref(), Value::Object(outputs.clone())).await {
            Ok(Value::Object(inflated)) => inflated,
            _ => outputs,
        }
    }

    async fn emit(&self, event: RunEvent) -> Result<(), RunError> {
        self.ctx.emit(event).await
    }

    fn report(&self, event: ProbeEvent) {
        if let Some(probe) = &self.ctx.probe {
            probe.report(&event);
        }
    }
}

/// Packages a failure as the node's `$error` output.
pub(crate) fn error_outputs(message: &str, inputs: Option<&InputValues>) -> OutputValues {
    let mut error = serde_json::Map::new();
    error.insert("kind".to_string(), json!("error"));
    error.insert("error".to_string(), json!(message));
    if let Some(inputs) = inputs {
        error.insert("inputs".to_string(), Value::Object(inputs.clone()));
    }
    let mut outputs = OutputValues::new();
    outputs.insert(ERROR_PORT.to_string(), Value::Object(error));
    outputs
}

fn child_path(path: &InvocationPath, invocation: u64) -> InvocationPath {
    let mut child = path.clone();
    child.push(invocation);
    child
}

/// Shifted inputs minus the schema, with run-level inputs filling the gaps
/// (dataflow wins over pre-supplied values).
fn merge_supplied(shifted: &InputValues, supplied: &InputValues) -> OutputValues {
    let mut merged = shifted.clone();
    merged.remove("schema");
    for (port, value) in supplied {
        merged.entry(port.clone()).or_insert_with(|| value.clone());
    }
    merged
}

/// Ports an input node wants: `schema.required`, else the schema's
/// property names; `None` when no schema constrains the node.
fn required_ports(schema: &Value) -> Option<Vec<String>> {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        return Some(
            required
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        );
    }
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| properties.keys().cloned().collect())
}

/// Extra required ports a non-input node declares via its configured schema.
fn schema_required_ports(configuration: Option<&InputValues>) -> Vec<String> {
    configuration
        .and_then(|c| c.get("schema"))
        .and_then(|s| s.get("required"))
        .and_then(Value::as_array)
        .map(|required| {
            required
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
