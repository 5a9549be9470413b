//! Per-run mutable scheduler state: queues, constants, control wires.
//!
//! Owned exclusively by one traversal machine; observers only ever see
//! snapshots. Serializes to [`SchedulerSnapshot`] for reanimation.

mod state;

pub use state::{SchedulerSnapshot, SchedulerState};
