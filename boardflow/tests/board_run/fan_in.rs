//! Fan-in with a control wire: a target fed by two suppliers plus ordering.

use boardflow::{BoardRunner, Edge, GraphDescriptor, NodeDescriptor, RunConfig, RunEvent};
use serde_json::json;

use crate::common::{collect, node_starts, test_kit, values};

fn fan_in_board(b_type: &str) -> GraphDescriptor {
    GraphDescriptor::new(
        vec![
            NodeDescriptor::new("a", "emit")
                .with_configuration(values(&[("emit", json!({"out": 1}))])),
            NodeDescriptor::new("b", b_type)
                .with_configuration(values(&[("emit", json!({"out": 2}))])),
            NodeDescriptor::new("t", "passthrough"),
        ],
        vec![
            Edge::wired("a", "out", "t", "x"),
            Edge::wired("b", "out", "t", "y"),
            Edge::control("a", "t"),
        ],
    )
}

/// **Scenario**: Firing only `a` leaves `t` missing `y`; the target is
/// skipped, not run.
#[tokio::test]
async fn missing_supplier_skips_target() {
    // b produces nothing, so y never arrives
    let runner = BoardRunner::new(fan_in_board("silent")).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;

    let skip = events
        .iter()
        .find_map(|event| match event {
            RunEvent::Skip {
                node,
                missing_inputs,
                ..
            } => Some((node.id.clone(), missing_inputs.clone())),
            _ => None,
        })
        .expect("t should be skipped");
    assert_eq!(skip.0, "t");
    assert_eq!(skip.1, vec!["y".to_string()]);

    assert!(
        !node_starts(&events).iter().any(|(id, _)| id == "t"),
        "t must not run with y missing"
    );
}

/// **Scenario**: Firing `b` as well makes `t` ready with both ports and the
/// fired control wire.
#[tokio::test]
async fn both_suppliers_make_target_ready() {
    let runner = BoardRunner::new(fan_in_board("emit")).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;

    let (_, inputs) = node_starts(&events)
        .into_iter()
        .find(|(id, _)| id == "t")
        .expect("t should run");
    assert_eq!(inputs["x"], json!(1));
    assert_eq!(inputs["y"], json!(2));
}

/// **Scenario**: A control edge from an unknown node is a descriptor error,
/// fatal at run start.
#[tokio::test]
async fn unknown_control_source_is_fatal() {
    let board = GraphDescriptor::new(
        vec![
            NodeDescriptor::new("b", "emit")
                .with_configuration(values(&[("emit", json!({"out": 2}))])),
            NodeDescriptor::new("t", "passthrough"),
        ],
        vec![Edge::wired("b", "out", "t", "y"), Edge::control("never", "t")],
    );
    let runner = BoardRunner::new(board).with_kit(test_kit());
    let events = collect(&runner, RunConfig::default()).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], RunEvent::Error { .. }));
}
