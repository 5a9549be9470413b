//! Run and handler error types.
//!
//! The scheduler never throws past its own boundary: handler failures become
//! `$error` outputs, everything else becomes an `error` event on the stream.

use thiserror::Error;

/// Failure of a run, surfaced as an `error` event.
///
/// Descriptor and reanimation errors are fatal to the run; handler failures
/// never reach this type (they are trapped into `$error` outputs instead).
#[derive(Debug, Error)]
pub enum RunError {
    /// The descriptor is invalid (unknown nodes referenced, no nodes, etc.).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// The loader could not produce a descriptor for a URL.
    #[error("unable to load graph: {0}")]
    Load(String),

    /// Resume was requested with a ticket the run-state store does not know.
    #[error("unknown or stale ticket: {0}")]
    UnknownTicket(String),

    /// A reanimation blob failed to restore.
    #[error("reanimation state corrupted: {0}")]
    Reanimation(String),

    /// The run observed its abort signal.
    #[error("aborted")]
    Aborted,
}

/// Failure inside a node handler.
///
/// Trapped by the traversal machine and packaged as
/// `{$error: {kind: "error", error, inputs}}` on the node's outputs.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Message(String),

    /// A required input or configuration value was missing or ill-typed.
    #[error("invalid input `{port}`: {reason}")]
    InvalidInput { port: String, reason: String },

    /// A capability the handler needs was not supplied in the context.
    #[error("missing capability: {0}")]
    MissingCapability(&'static str),
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::Message(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::Message(message.to_string())
    }
}
