//! Per-run configuration.

use crate::abort::AbortSignal;
use crate::descriptor::InputValues;
use crate::representation::DEFAULT_START_LABEL;

/// How much the observers record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
}

/// Options for a single run.
///
/// `inputs` feed the top-level graph's input nodes; `next` resumes a
/// previously paused run from its ticket.
#[derive(Clone)]
pub struct RunConfig {
    /// Initial inputs for the top-level graph.
    pub inputs: InputValues,
    /// Resolve unsatisfied input nodes through `input` reply events
    /// instead of pausing into the run-state store.
    pub interactive: bool,
    /// Raise `secret` events to the observer; otherwise the secrets node
    /// resolves from the runner's injected secret values.
    pub interactive_secrets: bool,
    /// Report per-edge delivery events to the probe.
    pub diagnostics: bool,
    pub log_level: LogLevel,
    /// Entry label for multi-entry graphs.
    pub start: String,
    /// Ticket of a paused run to resume.
    pub next: Option<String>,
    /// Principal owning persisted run state; opaque to the engine.
    pub owner: String,
    pub signal: AbortSignal,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            inputs: InputValues::new(),
            interactive: false,
            interactive_secrets: false,
            diagnostics: false,
            log_level: LogLevel::default(),
            start: DEFAULT_START_LABEL.to_string(),
            next: None,
            owner: "local".to_string(),
            signal: AbortSignal::new(),
        }
    }
}

impl RunConfig {
    /// Config with initial inputs; everything else default.
    pub fn with_inputs(inputs: InputValues) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }

    /// Config resuming a paused run from `ticket` with the supplied inputs.
    pub fn resuming(ticket: impl Into<String>, inputs: InputValues) -> Self {
        Self {
            inputs,
            next: Some(ticket.into()),
            ..Self::default()
        }
    }
}
