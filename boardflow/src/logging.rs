//! Logging utilities for board execution.
//!
//! Structured logging for run lifecycle, node execution, and edge
//! normalization warnings.

/// Log node execution start.
pub fn log_node_start(node_id: &str, node_type: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(node_id = node_id, node_type = node_type, "Starting node");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Starting node: {} ({})", node_id, node_type);
}

/// Log node execution completion.
pub fn log_node_complete(node_id: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(node_id = node_id, "Node complete");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Node complete: {}", node_id);
}

/// Log a node skipped for missing inputs.
pub fn log_node_skipped(node_id: &str, missing: &[String]) {
    #[cfg(feature = "tracing")]
    tracing::debug!(node_id = node_id, ?missing, "Node skipped");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] Node skipped: {} missing {:?}", node_id, missing);
}

/// Log board run start.
pub fn log_run_start(path: &[u64]) {
    #[cfg(feature = "tracing")]
    tracing::info!(?path, "Starting board run");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] Starting board run at {:?}", path);
}

/// Log board run completion.
pub fn log_run_complete(path: &[u64]) {
    #[cfg(feature = "tracing")]
    tracing::info!(?path, "Board run complete");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] Board run complete at {:?}", path);
}

/// Log a fatal run error.
pub fn log_run_error(error: &crate::error::RunError) {
    #[cfg(feature = "tracing")]
    tracing::error!(?error, "Board run error");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] Board run error: {:?}", error);
}

/// Log an edge rewritten during star normalization.
pub fn log_edge_normalized(from: &str, to: &str) {
    #[cfg(feature = "tracing")]
    tracing::warn!(from = from, to = to, "Star edge normalized to matching ports");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[WARN] Star edge normalized to matching ports: {} -> {}", from, to);
}
