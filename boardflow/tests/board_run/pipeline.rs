//! Linear pipeline: input → dupe → output, the canonical happy path.

use boardflow::{BoardRunner, Edge, GraphDescriptor, NodeDescriptor, RunCompletion, RunConfig, RunEvent};
use serde_json::json;

use crate::common::{collect, kinds, node_id, node_starts, test_kit, values};

fn pipeline_board() -> GraphDescriptor {
    GraphDescriptor::new(
        vec![
            NodeDescriptor::new("input", "input"),
            NodeDescriptor::new("dupe", "doubler"),
            NodeDescriptor::new("output", "output"),
        ],
        vec![Edge::star("input", "dupe"), Edge::star("dupe", "output")],
    )
}

/// **Scenario**: `{x: 3}` through a doubling pipeline produces `{x: 6}` with
/// the literal event sequence.
#[tokio::test]
async fn linear_pipeline_events_and_result() {
    let runner = BoardRunner::new(pipeline_board()).with_kit(test_kit());
    let events = collect(
        &runner,
        RunConfig::with_inputs(values(&[("x", json!(3))])),
    )
    .await;

    assert_eq!(
        kinds(&events),
        vec![
            "graphstart",
            "nodestart",
            "nodeend",
            "nodestart",
            "nodeend",
            "nodestart",
            "output",
            "nodeend",
            "graphend",
            "end",
        ]
    );

    let started: Vec<_> = events.iter().filter_map(node_id).collect();
    assert_eq!(started, vec!["input", "input", "dupe", "dupe", "output", "output"]);

    match &events[6] {
        RunEvent::Output { outputs } => assert_eq!(outputs["x"], json!(6)),
        other => panic!("expected output event, got {:?}", other.kind()),
    }
    match events.last() {
        Some(RunEvent::End { last: Some(last) }) => assert_eq!(last["x"], json!(6)),
        other => panic!("expected end with outputs, got {:?}", other.map(RunEvent::kind)),
    }
}

/// **Scenario**: run_to_completion resolves to the final outputs.
#[tokio::test]
async fn run_to_completion_returns_outputs() {
    let runner = BoardRunner::new(pipeline_board()).with_kit(test_kit());
    let completion = runner
        .run_to_completion(RunConfig::with_inputs(values(&[("x", json!(21))])))
        .await
        .unwrap();
    match completion {
        RunCompletion::Done(Some(outputs)) => assert_eq!(outputs["x"], json!(42)),
        other => panic!("expected Done with outputs, got {:?}", other),
    }
}

/// **Scenario**: Node paths carry per-graph invocation indices 1, 2, 3.
#[tokio::test]
async fn node_paths_are_sequential() {
    let runner = BoardRunner::new(pipeline_board()).with_kit(test_kit());
    let events = collect(
        &runner,
        RunConfig::with_inputs(values(&[("x", json!(1))])),
    )
    .await;
    let paths: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            RunEvent::NodeStart { path, .. } => Some(path.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(paths, vec![vec![1], vec![2], vec![3]]);
}

/// **Scenario**: A source with no incoming edges fires exactly once per run.
#[tokio::test]
async fn sources_fire_once() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("src", "emit")
                .with_configuration(values(&[("emit", json!({"x": 1}))])),
            NodeDescriptor::new("sink", "passthrough"),
        ],
        vec![Edge::new("src", "sink", "x")],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;
    let src_starts = node_starts(&events)
        .into_iter()
        .filter(|(id, _)| id == "src")
        .count();
    assert_eq!(src_starts, 1);
}

/// **Scenario**: Priority edges surface their targets ahead of the wave.
#[tokio::test]
async fn priority_edge_runs_first() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("src", "emit")
                .with_configuration(values(&[("emit", json!({"x": 1}))])),
            NodeDescriptor::new("norm", "passthrough"),
            NodeDescriptor::new("prio", "passthrough"),
        ],
        vec![
            Edge::new("src", "norm", "x"),
            Edge::new("src", "prio", "x").as_priority(),
        ],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;
    let order: Vec<_> = node_starts(&events).into_iter().map(|(id, _)| id).collect();
    assert_eq!(order, vec!["src", "prio", "norm"]);
}
