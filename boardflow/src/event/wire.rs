//! Run result wire format for harness transports.
//!
//! Each event becomes a tagged `[kind, payload]` JSON tuple. Transports must
//! preserve order; `input` and `secret` payloads carry the correlation id so
//! a consumer can pair a reply with the right paused event after the reply
//! channel has been stripped.

use serde_json::{json, Value};

use super::RunEvent;

/// Serializes an event into its `[kind, payload]` wire tuple.
pub fn to_wire(event: &RunEvent) -> Value {
    let payload = match event {
        RunEvent::GraphStart { path, timestamp } => json!({
            "path": path,
            "timestamp": timestamp,
        }),
        RunEvent::GraphEnd { path, timestamp } => json!({
            "path": path,
            "timestamp": timestamp,
        }),
        RunEvent::NodeStart {
            path,
            timestamp,
            node,
            inputs,
        } => json!({
            "path": path,
            "timestamp": timestamp,
            "node": node,
            "inputs": inputs,
        }),
        RunEvent::NodeEnd {
            path,
            timestamp,
            node,
            inputs,
            outputs,
        } => json!({
            "path": path,
            "timestamp": timestamp,
            "node": node,
            "inputs": inputs,
            "outputs": outputs,
        }),
        RunEvent::Skip {
            path,
            timestamp,
            node,
            missing_inputs,
        } => json!({
            "path": path,
            "timestamp": timestamp,
            "node": node,
            "missingInputs": missing_inputs,
        }),
        RunEvent::Input {
            node,
            input_arguments,
            schema,
            next,
            correlation,
            ..
        } => {
            let mut payload = json!({
                "node": node,
                "inputArguments": input_arguments,
                "schema": schema,
                "correlation": correlation,
            });
            if let Some(ticket) = next {
                payload["next"] = json!(ticket);
            }
            payload
        }
        RunEvent::Output { outputs } => json!({ "outputs": outputs }),
        RunEvent::Secret {
            keys, correlation, ..
        } => json!({
            "keys": keys,
            "correlation": correlation,
        }),
        RunEvent::Error { error } => json!({
            "error": error.to_string(),
        }),
        RunEvent::End { last } => match last {
            Some(outputs) => json!({ "last": outputs }),
            None => json!({}),
        },
    };
    json!([event.kind(), payload])
}
