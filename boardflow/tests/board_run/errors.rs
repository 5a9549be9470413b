//! Error containment: failures become `$error` outputs and keep flowing.

use boardflow::{
    AbortSignal, BoardRunner, Edge, GraphDescriptor, NodeDescriptor, RunConfig, RunEvent,
    ERROR_PORT,
};
use serde_json::json;

use crate::common::{collect, kinds, node_ends, node_starts, test_kit, values};

/// **Scenario**: `a` throws; `b` passes the error on; the output captures
/// it; the run still ends normally.
#[tokio::test]
async fn handler_failure_flows_downstream() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("a", "thrower"),
            NodeDescriptor::new("b", "passthrough"),
            NodeDescriptor::new("output", "output"),
        ],
        vec![
            Edge::wired("a", "out", "b", "x"),
            Edge::wired("b", "x", "output", "x"),
        ],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;

    let ends = node_ends(&events);
    let (_, a_outputs) = ends.iter().find(|(id, _)| id == "a").unwrap();
    assert_eq!(a_outputs[ERROR_PORT]["kind"], json!("error"));
    assert!(a_outputs[ERROR_PORT]["error"]
        .as_str()
        .unwrap()
        .contains("synthetic failure"));

    // b ran with the error in its inputs and surfaced it unchanged
    let (_, b_inputs) = node_starts(&events)
        .into_iter()
        .find(|(id, _)| id == "b")
        .unwrap();
    assert!(b_inputs.contains_key(ERROR_PORT));
    let (_, b_outputs) = ends.iter().find(|(id, _)| id == "b").unwrap();
    assert!(b_outputs.contains_key(ERROR_PORT));

    let output_event = events.iter().find_map(|event| match event {
        RunEvent::Output { outputs } => Some(outputs.clone()),
        _ => None,
    });
    assert!(output_event.unwrap().contains_key(ERROR_PORT));

    assert_eq!(kinds(&events).last(), Some(&"end"));
}

/// **Scenario**: Exactly one nodeend carries the failing node's $error.
#[tokio::test]
async fn one_nodeend_per_failure() {
    let board = GraphDescriptor::new(
        vec![NodeDescriptor::new("a", "thrower")],
        vec![],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;
    let a_ends = node_ends(&events)
        .into_iter()
        .filter(|(id, _)| id == "a")
        .count();
    assert_eq!(a_ends, 1);
    assert_eq!(kinds(&events), vec!["graphstart", "nodestart", "nodeend", "graphend", "end"]);
}

/// **Scenario**: An unknown node type produces `$error` outputs and the
/// run continues.
#[tokio::test]
async fn unknown_type_is_contained() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("mystery", "unregistered-type"),
            NodeDescriptor::new("output", "output"),
        ],
        vec![Edge::star("mystery", "output")],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;

    let (_, outputs) = node_ends(&events)
        .into_iter()
        .find(|(id, _)| id == "mystery")
        .unwrap();
    assert!(outputs[ERROR_PORT]
        .as_str()
        .unwrap()
        .contains("unregistered-type"));
    assert_eq!(kinds(&events).last(), Some(&"end"));
}

/// **Scenario**: A triggered abort signal surfaces as error then end.
#[tokio::test]
async fn abort_emits_error_then_end() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("src", "emit")
                .with_configuration(values(&[("emit", json!({"x": 1}))])),
        ],
        vec![],
    );
    let signal = AbortSignal::new();
    signal.trigger();
    let config = RunConfig {
        signal,
        ..RunConfig::default()
    };
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, config).await;
    assert_eq!(kinds(&events), vec!["graphstart", "error", "end"]);
}

/// **Scenario**: A board with no nodes is a descriptor error at run start.
#[tokio::test]
async fn empty_board_is_fatal() {
    let runner = BoardRunner::new(GraphDescriptor::default()).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;
    assert_eq!(kinds(&events), vec!["error"]);
}
