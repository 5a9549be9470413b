//! Run lifecycle: configuration, the traversal machine, subgraph
//! invocation, and pause/resume through the run-state store.
//!
//! A run moves `idle → running → paused-for-input → running → done|errored`.
//! Pauses serialize the scheduler into a [`ReanimationState`] and come back
//! through [`RunConfig::resuming`].

mod config;
mod invoke;
pub(crate) mod machine;
mod reanimation;
mod runner;
mod state_store;

pub use config::{LogLevel, RunConfig};
pub use invoke::invoke_graph;
pub use reanimation::{PendingInput, ReanimationState};
pub use runner::{BoardRunner, RunCompletion};
pub use state_store::{
    InMemoryRunStore, JsonSerializer, RunStateStore, StateSerializer, StateStoreError,
};
