//! Star distribution: `src.* → sink.*` delivers every output by name.

use boardflow::{BoardRunner, Edge, GraphDescriptor, NodeDescriptor, RunConfig};
use serde_json::json;

use crate::common::{collect, node_starts, test_kit, values};

/// **Scenario**: `src` outputs `{foo: 1, bar: 2}`; the sink's invocation
/// input equals exactly that.
#[tokio::test]
async fn star_delivers_all_outputs() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("src", "emit")
                .with_configuration(values(&[("emit", json!({"foo": 1, "bar": 2}))])),
            NodeDescriptor::new("sink", "passthrough"),
        ],
        vec![Edge::star("src", "sink")],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;

    let (_, inputs) = node_starts(&events)
        .into_iter()
        .find(|(id, _)| id == "sink")
        .expect("sink should run");
    assert_eq!(inputs, values(&[("foo", json!(1)), ("bar", json!(2))]));
}

/// **Scenario**: A half-star edge (`*→specific`) behaves like a star edge
/// after normalization.
#[tokio::test]
async fn half_star_edge_normalizes_and_delivers() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("src", "emit")
                .with_configuration(values(&[("emit", json!({"foo": 1, "bar": 2}))])),
            NodeDescriptor::new("sink", "passthrough"),
        ],
        vec![Edge::wired("src", "*", "sink", "foo")],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;

    let (_, inputs) = node_starts(&events)
        .into_iter()
        .find(|(id, _)| id == "sink")
        .expect("sink should run");
    assert_eq!(inputs["foo"], json!(1));
    assert_eq!(inputs["bar"], json!(2));
}
