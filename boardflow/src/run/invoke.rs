//! One-shot subgraph invocation from inside a handler.

use std::sync::Arc;

use crate::descriptor::{GraphDescriptor, InputValues, OutputValues};
use crate::handler::NodeHandlerContext;
use crate::representation::GraphRepresentation;

use super::machine::{error_outputs, Outcome, TraversalMachine};

/// Runs `graph` to its first output and returns those outputs.
///
/// The child scheduler's events flow into the caller's stream with the
/// caller's invocation path as their prefix. Failures never escape as
/// errors; they come back as a `$error` output so the calling node's graph
/// keeps running.
pub async fn invoke_graph(
    ctx: &NodeHandlerContext,
    graph: GraphDescriptor,
    inputs: InputValues,
) -> OutputValues {
    let board = Arc::new(graph);
    let rep = match GraphRepresentation::new(board.clone()) {
        Ok(rep) => Arc::new(rep),
        Err(err) => return error_outputs(&err.to_string(), Some(&inputs)),
    };

    let mut child_ctx = ctx.clone();
    child_ctx.board = board.clone();
    child_ctx.base = board.url.clone().or_else(|| ctx.base.clone());

    // caller inputs override the graph's own args
    let mut run_inputs = board.args.clone().unwrap_or_default();
    for (port, value) in inputs {
        run_inputs.insert(port, value);
    }

    let machine = TraversalMachine::nested(rep, child_ctx, run_inputs);
    match machine.run().await {
        Ok(Outcome::Done(Some(outputs))) => outputs,
        Ok(Outcome::Done(None)) => OutputValues::new(),
        Ok(Outcome::Paused(_)) => {
            error_outputs("nested run cannot pause for reanimation", None)
        }
        Err(err) => error_outputs(&err.to_string(), None),
    }
}
