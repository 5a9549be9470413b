//! Invocation context passed to every node handler.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::abort::AbortSignal;
use crate::data::DataStore;
use crate::descriptor::{GraphDescriptor, InputValues, ModuleDescriptor, OutputValues};
use crate::error::HandlerError;
use crate::event::{InvocationPath, RunEvent};
use crate::ids::IdSource;
use crate::loader::Loader;
use crate::probe::Probe;
use crate::run::RunStateStore;

use super::HandlerRegistry;

/// Capability contract for executing user-authored code modules.
///
/// The core never runs module code itself; an embedder that wants
/// imperative boards supplies a sandboxed implementation.
#[async_trait]
pub trait ModuleRunner: Send + Sync {
    async fn invoke_module(
        &self,
        module: &ModuleDescriptor,
        inputs: InputValues,
    ) -> Result<OutputValues, HandlerError>;
}

/// Everything a handler may reach while running one node.
///
/// Cloned per node invocation; `invocation_path` identifies the node's
/// position in the nested run tree.
#[derive(Clone)]
pub struct NodeHandlerContext {
    /// The board being run. Immutable; handlers must not rely on interior
    /// mutation.
    pub board: Arc<GraphDescriptor>,
    /// Base URL for relative loads (usually the board's own url).
    pub base: Option<String>,
    /// Position of this invocation in the nested run tree.
    pub invocation_path: InvocationPath,
    pub registry: Arc<HandlerRegistry>,
    pub loader: Arc<dyn Loader>,
    pub data_store: Option<Arc<dyn DataStore>>,
    pub run_state_store: Option<Arc<dyn RunStateStore>>,
    pub module_runner: Option<Arc<dyn ModuleRunner>>,
    pub probe: Option<Arc<dyn Probe>>,
    pub signal: AbortSignal,
    pub ids: Arc<dyn IdSource>,
    /// Secret values for non-interactive secret resolution.
    pub secrets: InputValues,
    /// Raise `secret` events to the observer instead of resolving locally.
    pub interactive_secrets: bool,
    /// Resolve unsatisfied input nodes through `input` reply events.
    pub interactive: bool,
    /// Report per-edge delivery events to the probe.
    pub diagnostics: bool,
    /// Harness stream of the run this invocation belongs to; nested runs
    /// and interactive handlers emit through it.
    pub(crate) events: mpsc::Sender<RunEvent>,
}

impl NodeHandlerContext {
    /// Derives the context handed to one node invocation: same run
    /// environment, with the node's own position appended.
    pub(crate) fn for_invocation(&self, invocation_path: InvocationPath) -> Self {
        let mut ctx = self.clone();
        ctx.invocation_path = invocation_path;
        ctx
    }

    /// Sends an event into the harness stream, waiting for channel room.
    /// Errs when the observer has gone away.
    pub(crate) async fn emit(&self, event: RunEvent) -> Result<(), crate::error::RunError> {
        self.events
            .send(event)
            .await
            .map_err(|_| crate::error::RunError::Aborted)
    }
}
