//! Board runner: the embedder-facing entry point for executing a board.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::data::DataStore;
use crate::descriptor::{GraphDescriptor, InputValues, OutputValues};
use crate::error::RunError;
use crate::event::RunEvent;
use crate::handler::{HandlerRegistry, Kit, ModuleRunner, NodeHandlerContext};
use crate::ids::{IdSource, SeededIdSource};
use crate::kits::core_kit;
use crate::loader::{Loader, MapLoader};
use crate::logging::{log_run_complete, log_run_error, log_run_start};
use crate::probe::Probe;
use crate::representation::GraphRepresentation;

use super::config::{LogLevel, RunConfig};
use super::machine::{Outcome, TraversalMachine};
use super::state_store::RunStateStore;

/// Capacity of the harness stream; a full channel applies backpressure to
/// the scheduler rather than buffering without bound.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How a completed run ended, as seen by [`BoardRunner::run_to_completion`].
#[derive(Debug)]
pub enum RunCompletion {
    /// The run drained its queue; payload is the last captured outputs.
    Done(Option<OutputValues>),
    /// The run paused at an input node; resume with the ticket.
    Paused { ticket: String, schema: Value },
}

/// Executes one board. Holds the run environment (kits, loader, stores,
/// probe, id source); each [`run`](Self::run) call is an independent run
/// with its own scheduler state.
pub struct BoardRunner {
    board: Arc<GraphDescriptor>,
    kits: Vec<Arc<Kit>>,
    loader: Arc<dyn Loader>,
    data_store: Option<Arc<dyn DataStore>>,
    run_state_store: Option<Arc<dyn RunStateStore>>,
    module_runner: Option<Arc<dyn ModuleRunner>>,
    probe: Option<Arc<dyn Probe>>,
    ids: Arc<dyn IdSource>,
    secrets: InputValues,
    base: Option<String>,
}

impl BoardRunner {
    pub fn new(board: GraphDescriptor) -> Self {
        Self {
            board: Arc::new(board),
            kits: Vec::new(),
            loader: Arc::new(MapLoader::new()),
            data_store: None,
            run_state_store: None,
            module_runner: None,
            probe: None,
            ids: Arc::new(SeededIdSource::new("run")),
            secrets: InputValues::new(),
            base: None,
        }
    }

    /// Adds a kit; kits added earlier win type conflicts. The built-in core
    /// kit is always consulted last.
    pub fn with_kit(mut self, kit: Kit) -> Self {
        self.kits.push(Arc::new(kit));
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_data_store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.data_store = Some(store);
        self
    }

    pub fn with_run_state_store(mut self, store: Arc<dyn RunStateStore>) -> Self {
        self.run_state_store = Some(store);
        self
    }

    pub fn with_module_runner(mut self, runner: Arc<dyn ModuleRunner>) -> Self {
        self.module_runner = Some(runner);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Secret values for non-interactive `secrets` resolution.
    pub fn with_secrets(mut self, secrets: InputValues) -> Self {
        self.secrets = secrets;
        self
    }

    /// Base URL for relative loads; defaults to the board's own url.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Starts a run and returns its event stream.
    ///
    /// The stream is lazy, finite, and non-restartable; the scheduler
    /// advances as the observer consumes.
    pub fn run(&self, config: RunConfig) -> ReceiverStream<RunEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let ctx = self.context(&config, tx);
        let board = self.board.clone();
        let run_state_store = self.run_state_store.clone();
        tokio::spawn(async move {
            run_task(board, ctx, config, run_state_store).await;
        });
        ReceiverStream::new(rx)
    }

    /// Drives a run to its terminal event.
    ///
    /// Interactive `input`/`secret` events cannot be answered through this
    /// method; use [`run`](Self::run) and reply on the stream for those.
    pub async fn run_to_completion(&self, config: RunConfig) -> Result<RunCompletion, RunError> {
        let mut stream = self.run(config);
        let mut last: Option<OutputValues> = None;
        while let Some(event) = stream.next().await {
            match event {
                RunEvent::Output { outputs } => last = Some(outputs),
                RunEvent::End { last: final_outputs } => {
                    return Ok(RunCompletion::Done(final_outputs.or(last)))
                }
                RunEvent::Error { error } => return Err(error),
                RunEvent::Input {
                    next: Some(ticket),
                    schema,
                    ..
                } => return Ok(RunCompletion::Paused { ticket, schema }),
                _ => {}
            }
        }
        // stream closed without a terminal event; treat as abandoned
        Err(RunError::Aborted)
    }

    fn context(&self, config: &RunConfig, events: mpsc::Sender<RunEvent>) -> NodeHandlerContext {
        let mut kits = self.kits.clone();
        kits.push(Arc::new(core_kit()));
        NodeHandlerContext {
            board: self.board.clone(),
            base: self.base.clone().or_else(|| self.board.url.clone()),
            invocation_path: Vec::new(),
            registry: Arc::new(HandlerRegistry::new(kits)),
            loader: self.loader.clone(),
            data_store: self.data_store.clone(),
            run_state_store: self.run_state_store.clone(),
            module_runner: self.module_runner.clone(),
            probe: self.probe.clone(),
            signal: config.signal.clone(),
            ids: self.ids.clone(),
            secrets: self.secrets.clone(),
            interactive_secrets: config.interactive_secrets,
            interactive: config.interactive,
            diagnostics: config.diagnostics,
            events,
        }
    }
}

async fn run_task(
    board: Arc<GraphDescriptor>,
    ctx: NodeHandlerContext,
    config: RunConfig,
    run_state_store: Option<Arc<dyn RunStateStore>>,
) {
    if config.log_level == LogLevel::Debug {
        log_run_start(&ctx.invocation_path);
    }

    let rep = match GraphRepresentation::with_start_label(board, &config.start) {
        Ok(rep) => Arc::new(rep),
        Err(error) => {
            log_run_error(&error);
            let _ = ctx.emit(RunEvent::Error { error }).await;
            return;
        }
    };

    let machine = match &config.next {
        Some(ticket) => {
            let Some(store) = &run_state_store else {
                let _ = ctx
                    .emit(RunEvent::Error {
                        error: RunError::Reanimation(
                            "resume requested without a run-state store".into(),
                        ),
                    })
                    .await;
                return;
            };
            match store.load_reanimation_state(&config.owner, ticket).await {
                Ok(Some(state)) => TraversalMachine::reanimated(
                    rep.clone(),
                    ctx.clone(),
                    config.inputs.clone(),
                    state,
                    config.log_level,
                ),
                Ok(None) => {
                    let _ = ctx
                        .emit(RunEvent::Error {
                            error: RunError::UnknownTicket(ticket.clone()),
                        })
                        .await;
                    return;
                }
                Err(err) => {
                    let _ = ctx
                        .emit(RunEvent::Error {
                            error: RunError::Reanimation(err.to_string()),
                        })
                        .await;
                    return;
                }
            }
        }
        None => TraversalMachine::top_level(
            rep.clone(),
            ctx.clone(),
            config.inputs.clone(),
            config.log_level,
        ),
    };

    match machine.run().await {
        Ok(Outcome::Done(last)) => {
            if config.log_level == LogLevel::Debug {
                log_run_complete(&ctx.invocation_path);
            }
            let last = match (last, &ctx.data_store) {
                (Some(outputs), Some(store)) => {
                    match crate::data::inflate(
                        store.as_ref(),
                        serde_json::Value::Object(outputs.clone()),
                    )
                    .await
                    {
                        Ok(serde_json::Value::Object(inflated)) => Some(inflated),
                        _ => Some(outputs),
                    }
                }
                (last, _) => last,
            };
            let _ = ctx.emit(RunEvent::End { last }).await;
        }
        Ok(Outcome::Paused(state)) => {
            let Some(store) = &run_state_store else {
                // machine only pauses when a store is configured
                return;
            };
            match store.save_reanimation_state(&config.owner, &state).await {
                Ok(ticket) => {
                    let node = rep
                        .node(&state.pending_input.node)
                        .cloned()
                        .unwrap_or_else(|| {
                            crate::descriptor::NodeDescriptor::new(
                                state.pending_input.node.clone(),
                                "input",
                            )
                        });
                    let mut input_arguments = state.pending_input.inputs.clone();
                    input_arguments.remove("schema");
                    let _ = ctx
                        .emit(RunEvent::Input {
                            node,
                            input_arguments,
                            schema: state.pending_input.schema.clone(),
                            next: Some(ticket),
                            correlation: ctx.ids.next_id(),
                            reply: None,
                        })
                        .await;
                }
                Err(err) => {
                    let _ = ctx
                        .emit(RunEvent::Error {
                            error: RunError::Reanimation(err.to_string()),
                        })
                        .await;
                }
            }
        }
        Err(RunError::Aborted) => {
            log_run_error(&RunError::Aborted);
            // cancellation: a distinct error, then a closing end
            let _ = ctx
                .emit(RunEvent::Error {
                    error: RunError::Aborted,
                })
                .await;
            let _ = ctx.emit(RunEvent::End { last: None }).await;
        }
        Err(error) => {
            log_run_error(&error);
            let _ = ctx.emit(RunEvent::Error { error }).await;
        }
    }
}
