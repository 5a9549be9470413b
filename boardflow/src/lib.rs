//! # boardflow
//!
//! A board execution engine: run directed graphs of typed nodes connected
//! by named port-to-port edges. The scheduler drives a board to completion,
//! coordinates data flow across edges (including star, control, and
//! constant wires), invokes node handlers — recursively for subgraphs —
//! and exposes everything it does as an observable event stream.
//!
//! ## Design Principles
//!
//! - **Descriptors are data**: a board is plain serde JSON (`nodes`,
//!   `edges`, optional `graphs`/`modules`); the runtime never mutates it.
//! - **One runner per graph**: within a graph invocation exactly one node
//!   handler executes at a time; nested invocations get their own
//!   scheduler and report under an extended invocation path.
//! - **Failures are data too**: handler errors become `$error` outputs and
//!   keep flowing downstream; the run itself only errors on descriptor or
//!   reanimation problems.
//! - **Pause is a value**: a run that reaches an unsatisfiable input node
//!   serializes its scheduler into a ticket and can be resumed later with
//!   fresh inputs.
//!
//! ## Main Modules
//!
//! - [`descriptor`]: `GraphDescriptor`, `NodeDescriptor`, `Edge` — the board model.
//! - [`representation`]: derived heads/tails/entries indices for one run.
//! - [`scheduler`]: per-run queues, constants, control wires, readiness.
//! - [`run`]: `BoardRunner`, `RunConfig`, the traversal machine, reanimation.
//! - [`handler`]: `NodeHandler`, `Kit`, registry and graph-handler cache.
//! - [`event`]: the harness stream (`RunEvent`) and its wire format.
//! - [`probe`]: diagnostic side-channel for scheduler internals.
//! - [`loader`] / [`data`]: external contracts for boards and blobs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boardflow::{BoardRunner, Edge, GraphDescriptor, Kit, NodeDescriptor, RunConfig};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let board = GraphDescriptor::new(
//!     vec![
//!         NodeDescriptor::new("in", "input"),
//!         NodeDescriptor::new("double", "doubler"),
//!         NodeDescriptor::new("out", "output"),
//!     ],
//!     vec![Edge::star("in", "double"), Edge::star("double", "out")],
//! );
//! let kit = Kit::new("math").with_fn("doubler", |inputs| {
//!     let x = inputs.get("x").and_then(|v| v.as_i64()).unwrap_or(0);
//!     let mut out = inputs;
//!     out.insert("x".into(), json!(x * 2));
//!     Ok(out)
//! });
//! let runner = BoardRunner::new(board).with_kit(kit);
//! let mut inputs = serde_json::Map::new();
//! inputs.insert("x".into(), json!(3));
//! let outcome = runner
//!     .run_to_completion(RunConfig::with_inputs(inputs))
//!     .await
//!     .unwrap();
//! # let _ = outcome;
//! # }
//! ```

pub mod abort;
pub mod data;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod handler;
pub mod ids;
pub mod kits;
pub mod loader;
pub mod logging;
pub mod probe;
pub mod representation;
pub mod run;
pub mod scheduler;

pub use abort::AbortSignal;
pub use data::{deflate, inflate, DataStore, InMemoryDataStore, StoreError};
pub use descriptor::{
    Edge, GraphDescriptor, GraphMetadata, InputValues, ModuleDescriptor, NodeDescriptor,
    NodeMetadata, NodeTag, OutputValues, ERROR_PORT,
};
pub use error::{HandlerError, RunError};
pub use event::{to_wire, InputReply, InvocationPath, RunEvent, SecretReply};
pub use handler::{
    GraphHandlerCache, HandlerRegistry, Kit, ModuleRunner, NodeDescription, NodeHandler,
    NodeHandlerContext, Resolution,
};
pub use ids::{IdSource, SeededIdSource};
pub use kits::core_kit;
pub use loader::{is_url_like, FileLoader, Loader, MapLoader};
pub use probe::{LogProbe, Probe, ProbeEvent, VecProbe};
pub use representation::{GraphRepresentation, DEFAULT_START_LABEL};
pub use run::{
    invoke_graph, BoardRunner, InMemoryRunStore, JsonSerializer, LogLevel, PendingInput,
    ReanimationState, RunCompletion, RunConfig, RunStateStore, StateSerializer, StateStoreError,
};
pub use scheduler::{SchedulerSnapshot, SchedulerState};
