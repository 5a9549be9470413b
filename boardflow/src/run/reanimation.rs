//! Reanimation state: everything needed to resume a paused run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::InputValues;
use crate::event::InvocationPath;
use crate::scheduler::SchedulerSnapshot;

/// Serialized scheduler state captured when a run pauses at an input node.
///
/// Owned by the run-state store once saved; the engine treats a loaded blob
/// as verbatim truth and resumes from it deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReanimationState {
    pub scheduler: SchedulerSnapshot,
    #[serde(rename = "pendingInput")]
    pub pending_input: PendingInput,
    /// Invocation path of the paused graph (empty for the top level).
    #[serde(rename = "invocationPath")]
    pub invocation_path: InvocationPath,
    /// Invocation counter of the paused graph, so resumed node paths
    /// continue where the paused attempt stopped.
    #[serde(rename = "nextInvocation")]
    pub next_invocation: u64,
}

/// The exact point to resume at: the input node that could not be
/// satisfied, with its already-shifted inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInput {
    /// Node path of the paused invocation (graph path plus its index).
    pub path: InvocationPath,
    /// Id of the paused input node.
    pub node: String,
    /// Schema describing the wanted ports.
    pub schema: Value,
    /// Inputs shifted for the paused invocation, replayed on resume.
    pub inputs: InputValues,
}
