//! Harness event stream: what an observer sees while a board runs.
//!
//! A run yields a lazy, finite, non-restartable sequence of [`RunEvent`]s
//! over a bounded channel; a slow consumer delays the next scheduler step.
//! Exactly one of `End`, `Error`, or an `Input` carrying a resume ticket
//! closes the stream.

mod wire;

pub use wire::to_wire;

use std::time::SystemTime;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::descriptor::{InputValues, NodeDescriptor, OutputValues};
use crate::error::RunError;

/// Position of an invocation in the nested run tree. The top-level graph is
/// `[]`; each nested invocation appends its invocation id.
pub type InvocationPath = Vec<u64>;

/// Milliseconds since the epoch; the timestamp carried on traversal events.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One event on the harness stream.
#[derive(Debug)]
pub enum RunEvent {
    /// A graph (top-level or nested) began traversal.
    GraphStart {
        path: InvocationPath,
        timestamp: u64,
    },
    /// A graph's queue drained; brackets all nested events of that graph.
    GraphEnd {
        path: InvocationPath,
        timestamp: u64,
    },
    /// A node was dequeued ready and its inputs shifted.
    NodeStart {
        path: InvocationPath,
        timestamp: u64,
        node: NodeDescriptor,
        inputs: InputValues,
    },
    /// A node finished; `outputs` is what got distributed downstream.
    NodeEnd {
        path: InvocationPath,
        timestamp: u64,
        node: NodeDescriptor,
        inputs: InputValues,
        outputs: OutputValues,
    },
    /// A node was dequeued but is still missing inputs.
    Skip {
        path: InvocationPath,
        timestamp: u64,
        node: NodeDescriptor,
        missing_inputs: Vec<String>,
    },
    /// The run reached an input node it cannot satisfy.
    ///
    /// Interactive runs carry a `reply`; answering it resumes the run in
    /// place. Non-interactive runs carry `next`, a ticket for a later
    /// resume, and the event is terminal.
    Input {
        node: NodeDescriptor,
        input_arguments: InputValues,
        /// Schema describing the wanted ports, from the node configuration.
        schema: Value,
        /// Resume ticket; set when the run paused into the run-state store.
        next: Option<String>,
        /// Correlation id tying a transported reply back to this event.
        correlation: String,
        reply: Option<InputReply>,
    },
    /// An output node fired at the top level.
    Output { outputs: OutputValues },
    /// A secrets node wants values for `keys` from the observer.
    Secret {
        keys: Vec<String>,
        correlation: String,
        reply: Option<SecretReply>,
    },
    /// The run failed; terminal.
    Error { error: RunError },
    /// The run completed; terminal. `last` is the most recent output set.
    End { last: Option<OutputValues> },
}

impl RunEvent {
    /// Wire tag for this event (the first element of the wire tuple).
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::GraphStart { .. } => "graphstart",
            RunEvent::GraphEnd { .. } => "graphend",
            RunEvent::NodeStart { .. } => "nodestart",
            RunEvent::NodeEnd { .. } => "nodeend",
            RunEvent::Skip { .. } => "skip",
            RunEvent::Input { .. } => "input",
            RunEvent::Output { .. } => "output",
            RunEvent::Secret { .. } => "secret",
            RunEvent::Error { .. } => "error",
            RunEvent::End { .. } => "end",
        }
    }

    /// True for events that close the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunEvent::End { .. }
                | RunEvent::Error { .. }
                | RunEvent::Input { next: Some(_), .. }
        )
    }
}

/// One-shot reply channel for an interactive `Input` event.
#[derive(Debug)]
pub struct InputReply {
    tx: oneshot::Sender<InputValues>,
}

impl InputReply {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<InputValues>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Supplies the requested inputs; the paused run resumes with them as
    /// the input node's outputs. Errs with the values if the run is gone.
    pub fn reply(self, values: InputValues) -> Result<(), InputValues> {
        self.tx.send(values)
    }
}

/// One-shot reply channel for a `Secret` event.
#[derive(Debug)]
pub struct SecretReply {
    tx: oneshot::Sender<InputValues>,
}

impl SecretReply {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<InputValues>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Supplies the secret values keyed by secret name.
    pub fn reply(self, values: InputValues) -> Result<(), InputValues> {
        self.tx.send(values)
    }
}
