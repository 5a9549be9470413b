//! Nested invocation: `invoke` over subgraphs and graph-valued node types.

use std::collections::BTreeMap;
use std::sync::Arc;

use boardflow::{
    BoardRunner, Edge, GraphDescriptor, MapLoader, NodeDescriptor, RunCompletion, RunConfig,
    RunEvent, ERROR_PORT,
};
use serde_json::json;

use crate::common::{collect, path_of, test_kit, values};

fn child_board() -> GraphDescriptor {
    GraphDescriptor::new(
        vec![
            NodeDescriptor::new("in", "input"),
            NodeDescriptor::new("double", "doubler"),
            NodeDescriptor::new("out", "output"),
        ],
        vec![Edge::star("in", "double"), Edge::star("double", "out")],
    )
}

fn parent_with_subgraph() -> GraphDescriptor {
    let mut parent = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("input", "input"),
            NodeDescriptor::new("call", "invoke")
                .with_configuration(values(&[("$board", json!("#child"))])),
            NodeDescriptor::new("output", "output"),
        ],
        vec![Edge::star("input", "call"), Edge::star("call", "output")],
    );
    parent.graphs = Some(BTreeMap::from([("child".into(), child_board())]));
    parent
}

/// **Scenario**: invoke over a `#subgraph` runs the child to its first
/// output and returns those outputs to the parent flow.
#[tokio::test]
async fn invoke_subgraph_by_id() {
    let runner = BoardRunner::new(parent_with_subgraph()).with_kit(test_kit());
    let completion = runner
        .run_to_completion(RunConfig::with_inputs(values(&[("x", json!(5))])))
        .await
        .unwrap();
    match completion {
        RunCompletion::Done(Some(outputs)) => assert_eq!(outputs["x"], json!(10)),
        other => panic!("expected Done, got {:?}", other),
    }
}

/// **Scenario**: The child's graphstart/graphend bracket all of its events,
/// and its graphend precedes the parent's nodeend for the calling node.
#[tokio::test]
async fn nested_events_are_bracketed() {
    let runner = BoardRunner::new(parent_with_subgraph()).with_kit(test_kit());
    let events = collect(
        &runner,
        RunConfig::with_inputs(values(&[("x", json!(5))])),
    )
    .await;

    // the calling node `call` is the second invocation of the parent graph
    let child_prefix = vec![2u64];
    let child_start = events
        .iter()
        .position(|e| {
            matches!(e, RunEvent::GraphStart { path, .. } if *path == child_prefix)
        })
        .expect("child graphstart");
    let child_end = events
        .iter()
        .position(|e| matches!(e, RunEvent::GraphEnd { path, .. } if *path == child_prefix))
        .expect("child graphend");
    assert!(child_start < child_end);

    for (index, event) in events.iter().enumerate() {
        let Some(path) = path_of(event) else { continue };
        if path.len() > child_prefix.len() && path.starts_with(&child_prefix) {
            assert!(
                child_start < index && index < child_end,
                "nested event at {index} escapes its graph bracket"
            );
        }
    }

    let parent_call_end = events
        .iter()
        .position(|e| {
            matches!(e, RunEvent::NodeEnd { path, node, .. } if node.id == "call" && *path == child_prefix)
        })
        .expect("parent nodeend for call");
    assert!(child_end < parent_call_end);
}

/// **Scenario**: No Output event is emitted for nested output nodes.
#[tokio::test]
async fn nested_outputs_stay_internal() {
    let runner = BoardRunner::new(parent_with_subgraph()).with_kit(test_kit());
    let events = collect(
        &runner,
        RunConfig::with_inputs(values(&[("x", json!(5))])),
    )
    .await;
    let outputs: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, RunEvent::Output { .. }))
        .collect();
    assert_eq!(outputs.len(), 1, "only the top-level output emits");
}

/// **Scenario**: A URL-like node type resolves through the loader and runs
/// as a nested board.
#[tokio::test]
async fn graph_valued_node_type() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("input", "input"),
            NodeDescriptor::new("nested", "boards/double.json"),
            NodeDescriptor::new("output", "output"),
        ],
        vec![Edge::star("input", "nested"), Edge::star("nested", "output")],
    );
    let loader = Arc::new(MapLoader::new().with_board("boards/double.json", child_board()));
    let runner = BoardRunner::new(board)
        .with_kit(test_kit())
        .with_loader(loader);
    let completion = runner
        .run_to_completion(RunConfig::with_inputs(values(&[("x", json!(4))])))
        .await
        .unwrap();
    match completion {
        RunCompletion::Done(Some(outputs)) => assert_eq!(outputs["x"], json!(8)),
        other => panic!("expected Done, got {:?}", other),
    }
}

/// **Scenario**: A failing subgraph comes back as the calling node's
/// `$error` output; the parent keeps running.
#[tokio::test]
async fn failing_subgraph_is_wrapped() {
    let mut parent = parent_with_subgraph();
    // replace the child with one whose only node fails
    parent.graphs = Some(BTreeMap::from([(
        "child".into(),
        GraphDescriptor::new(
            vec![
                NodeDescriptor::new("boom", "thrower"),
                NodeDescriptor::new("out", "output"),
            ],
            vec![Edge::star("boom", "out")],
        ),
    )]));
    let runner = BoardRunner::new(parent).with_kit(test_kit());
    let completion = runner
        .run_to_completion(RunConfig::with_inputs(values(&[("x", json!(5))])))
        .await
        .unwrap();
    match completion {
        RunCompletion::Done(Some(outputs)) => {
            assert!(outputs.contains_key(ERROR_PORT));
        }
        other => panic!("expected Done with $error, got {:?}", other),
    }
}
