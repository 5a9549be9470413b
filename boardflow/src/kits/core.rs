//! Core kit: the handlers every board can rely on.
//!
//! `input` and `output` are machine-level node types and deliberately not
//! here; this kit carries composition and plumbing: `passthrough`,
//! `secrets`, `invoke`, and `runModule`. The runner appends the core kit
//! after user kits, so embedders can shadow any of these types.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::descriptor::{GraphDescriptor, InputValues, OutputValues};
use crate::error::HandlerError;
use crate::event::{RunEvent, SecretReply};
use crate::handler::{Kit, NodeHandler, NodeHandlerContext};
use crate::run::invoke_graph;

/// Builds the core kit.
pub fn core_kit() -> Kit {
    Kit::new("core")
        .with_fn("passthrough", Ok)
        .with_handler("secrets", Arc::new(SecretsHandler))
        .with_handler("invoke", Arc::new(InvokeHandler))
        .with_handler("runModule", Arc::new(RunModuleHandler))
}

/// Resolves secret values named in the `keys` configuration.
///
/// With `interactiveSecrets`, raises a `secret` event and waits for the
/// observer's reply; otherwise reads the runner's injected secret values.
struct SecretsHandler;

#[async_trait]
impl NodeHandler for SecretsHandler {
    async fn invoke(
        &self,
        inputs: InputValues,
        context: &NodeHandlerContext,
    ) -> Result<OutputValues, HandlerError> {
        let keys: Vec<String> = inputs
            .get("keys")
            .and_then(Value::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if keys.is_empty() {
            return Err(HandlerError::InvalidInput {
                port: "keys".into(),
                reason: "expected a non-empty list of secret names".into(),
            });
        }

        if context.interactive_secrets {
            let (reply, rx) = SecretReply::channel();
            context
                .emit(RunEvent::Secret {
                    keys: keys.clone(),
                    correlation: context.ids.next_id(),
                    reply: Some(reply),
                })
                .await
                .map_err(|_| HandlerError::Message("run closed before secret reply".into()))?;
            let values = rx
                .await
                .map_err(|_| HandlerError::Message("secret reply dropped".into()))?;
            let mut outputs = OutputValues::new();
            for key in keys {
                match values.get(&key) {
                    Some(value) => {
                        outputs.insert(key, value.clone());
                    }
                    None => {
                        return Err(HandlerError::Message(format!(
                            "secret `{key}` not supplied"
                        )))
                    }
                }
            }
            return Ok(outputs);
        }

        let mut outputs = OutputValues::new();
        for key in keys {
            match context.secrets.get(&key) {
                Some(value) => {
                    outputs.insert(key, value.clone());
                }
                None => {
                    return Err(HandlerError::Message(format!(
                        "secret `{key}` not available"
                    )))
                }
            }
        }
        Ok(outputs)
    }
}

/// Invokes another board: a `#subgraph` id, a loadable URL, or an inline
/// descriptor under `$board`.
struct InvokeHandler;

#[async_trait]
impl NodeHandler for InvokeHandler {
    async fn invoke(
        &self,
        inputs: InputValues,
        context: &NodeHandlerContext,
    ) -> Result<OutputValues, HandlerError> {
        let mut inputs = inputs;
        let board_ref = inputs
            .remove("$board")
            .or_else(|| inputs.remove("board"))
            .or_else(|| inputs.remove("path"))
            .ok_or(HandlerError::InvalidInput {
                port: "$board".into(),
                reason: "invoke needs a board reference".into(),
            })?;

        let graph = resolve_board(&board_ref, context).await?;
        Ok(invoke_graph(context, graph, inputs).await)
    }
}

async fn resolve_board(
    board_ref: &Value,
    context: &NodeHandlerContext,
) -> Result<GraphDescriptor, HandlerError> {
    match board_ref {
        Value::String(reference) => {
            if let Some(id) = reference.strip_prefix('#') {
                return context
                    .board
                    .subgraph(id)
                    .cloned()
                    .ok_or_else(|| HandlerError::Message(format!("no subgraph `{id}` in board")));
            }
            context
                .loader
                .load(reference, context.base.as_deref())
                .await
                .map_err(|err| HandlerError::Message(err.to_string()))?
                .ok_or_else(|| HandlerError::Message(format!("unable to load board `{reference}`")))
        }
        Value::Object(_) => serde_json::from_value(board_ref.clone())
            .map_err(|err| HandlerError::Message(format!("inline board is invalid: {err}"))),
        _ => Err(HandlerError::InvalidInput {
            port: "$board".into(),
            reason: "expected a URL, #subgraph id, or inline board".into(),
        }),
    }
}

/// Runs the named module through the embedder's `ModuleRunner` capability.
struct RunModuleHandler;

#[async_trait]
impl NodeHandler for RunModuleHandler {
    async fn invoke(
        &self,
        inputs: InputValues,
        context: &NodeHandlerContext,
    ) -> Result<OutputValues, HandlerError> {
        let mut inputs = inputs;
        let name = inputs
            .remove("$module")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or(HandlerError::InvalidInput {
                port: "$module".into(),
                reason: "runModule needs a module name".into(),
            })?;
        let module = context
            .board
            .modules
            .as_ref()
            .and_then(|modules| modules.get(&name))
            .cloned()
            .ok_or_else(|| HandlerError::Message(format!("no module `{name}` in board")))?;
        let runner = context
            .module_runner
            .as_ref()
            .ok_or(HandlerError::MissingCapability("module runner"))?;
        runner.invoke_module(&module, inputs).await
    }
}
