//! Probe reporting and the transport wire format.

use std::sync::Arc;

use boardflow::{
    to_wire, BoardRunner, Edge, GraphDescriptor, InMemoryDataStore, NodeDescriptor, ProbeEvent,
    RunConfig, RunEvent, VecProbe,
};
use serde_json::json;

use crate::common::{collect, test_kit, values};

fn small_board() -> GraphDescriptor {
    GraphDescriptor::new(
        vec![
            NodeDescriptor::new("src", "emit")
                .with_configuration(values(&[("emit", json!({"x": 1}))])),
            NodeDescriptor::new("sink", "output"),
        ],
        vec![Edge::new("src", "sink", "x")],
    )
}

/// **Scenario**: A probe sees the run's internals; with diagnostics it also
/// gets per-edge delivery reports.
#[tokio::test]
async fn probe_receives_superset_with_diagnostics() {
    let probe = Arc::new(VecProbe::new());
    let runner = BoardRunner::new(small_board())
        .with_kit(test_kit())
        .with_probe(probe.clone());
    let config = RunConfig {
        diagnostics: true,
        ..RunConfig::default()
    };
    let _events = collect(&runner, config).await;

    let reported = probe.events();
    assert!(reported
        .iter()
        .any(|e| matches!(e, ProbeEvent::GraphStart { .. })));
    assert!(reported
        .iter()
        .any(|e| matches!(e, ProbeEvent::NodeStart { node, .. } if node == "src")));
    let edge = reported
        .iter()
        .find_map(|e| match e {
            ProbeEvent::Edge { edge, delivered, .. } => Some((edge.clone(), delivered.clone())),
            _ => None,
        })
        .expect("edge report with diagnostics");
    assert_eq!(edge.0.from, "src");
    assert_eq!(edge.1, vec!["x".to_string()]);
}

/// **Scenario**: Without diagnostics the probe still gets lifecycle events
/// but no edge reports.
#[tokio::test]
async fn probe_without_diagnostics_has_no_edges() {
    let probe = Arc::new(VecProbe::new());
    let runner = BoardRunner::new(small_board())
        .with_kit(test_kit())
        .with_probe(probe.clone());
    let _events = collect(&runner, RunConfig::default()).await;

    let reported = probe.events();
    assert!(!reported.is_empty());
    assert!(!reported.iter().any(|e| matches!(e, ProbeEvent::Edge { .. })));
}

/// **Scenario**: With a data store, inline parts travel as handles between
/// nodes and inflate back at the output boundary.
#[tokio::test]
async fn data_store_deflates_between_nodes_and_inflates_at_output() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("src", "emit").with_configuration(values(&[(
                "emit",
                json!({"att": {"inlineData": {"mimeType": "text/plain", "data": "aGk="}}}),
            )])),
            NodeDescriptor::new("sink", "output"),
        ],
        vec![Edge::new("src", "sink", "att")],
    );
    let runner = BoardRunner::new(board)
        .with_kit(test_kit())
        .with_data_store(Arc::new(InMemoryDataStore::new()));
    let events = collect(&runner, RunConfig::default()).await;

    // between nodes: the attachment is a stored-data handle
    let src_end = events
        .iter()
        .find_map(|event| match event {
            RunEvent::NodeEnd { node, outputs, .. } if node.id == "src" => Some(outputs.clone()),
            _ => None,
        })
        .unwrap();
    assert!(src_end["att"]["storedData"]["handle"].is_string());

    // at the observer boundary: inflated back to inline data
    let output = events
        .iter()
        .find_map(|event| match event {
            RunEvent::Output { outputs } => Some(outputs.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(output["att"]["inlineData"]["data"], json!("aGk="));
}

/// **Scenario**: A whole run serializes to ordered [kind, payload] tuples.
#[tokio::test]
async fn run_serializes_to_wire_tuples() {
    let runner = BoardRunner::new(small_board()).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;
    let wire: Vec<_> = events.iter().map(to_wire).collect();

    assert_eq!(wire.first().unwrap()[0], "graphstart");
    assert_eq!(wire.last().unwrap()[0], "end");
    for tuple in &wire {
        assert!(tuple.is_array());
        assert_eq!(tuple.as_array().unwrap().len(), 2);
        assert!(tuple[0].is_string());
    }
}
