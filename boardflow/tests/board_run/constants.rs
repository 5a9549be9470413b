//! Constant edges: delivered once, re-read on every later invocation.

use boardflow::{BoardRunner, Edge, GraphDescriptor, NodeDescriptor, RunConfig};
use serde_json::json;

use crate::common::{collect, node_starts, test_kit, values};

/// **Scenario**: A constant edge carries `{k: 7}` once; two later deliveries
/// on another port invoke the sink twice, each time with `k = 7`.
#[tokio::test]
async fn constant_persists_across_invocations() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("kons", "emit")
                .with_configuration(values(&[("emit", json!({"k": 7}))])),
            NodeDescriptor::new("p1", "emit")
                .with_configuration(values(&[("emit", json!({"v": 1}))])),
            NodeDescriptor::new("p2", "emit")
                .with_configuration(values(&[("emit", json!({"v": 2}))])),
            NodeDescriptor::new("sink", "passthrough"),
        ],
        vec![
            Edge::new("kons", "sink", "k").as_constant(),
            Edge::new("p1", "sink", "v"),
            Edge::new("p2", "sink", "v"),
        ],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;

    let sink_runs: Vec<_> = node_starts(&events)
        .into_iter()
        .filter(|(id, _)| id == "sink")
        .map(|(_, inputs)| inputs)
        .collect();
    assert_eq!(sink_runs.len(), 2, "sink must be invoked twice");
    assert_eq!(sink_runs[0]["k"], json!(7));
    assert_eq!(sink_runs[0]["v"], json!(1));
    assert_eq!(sink_runs[1]["k"], json!(7), "constant re-read after queue drained");
    assert_eq!(sink_runs[1]["v"], json!(2));
}

/// **Scenario**: A constant alone satisfies readiness; the sink fires as
/// soon as the constant lands even with nothing queued.
#[tokio::test]
async fn constant_satisfies_readiness() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("kons", "emit")
                .with_configuration(values(&[("emit", json!({"k": 7}))])),
            NodeDescriptor::new("sink", "passthrough"),
        ],
        vec![Edge::new("kons", "sink", "k").as_constant()],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;

    let sink_runs: Vec<_> = node_starts(&events)
        .into_iter()
        .filter(|(id, _)| id == "sink")
        .collect();
    assert_eq!(sink_runs.len(), 1);
    assert_eq!(sink_runs[0].1["k"], json!(7));
}
