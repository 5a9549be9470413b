//! Imperative boards: `main` + `modules` lifted through the module runner.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use boardflow::{
    BoardRunner, GraphDescriptor, HandlerError, InputValues, ModuleDescriptor, ModuleRunner,
    OutputValues, RunCompletion, RunConfig,
};
use serde_json::json;

use crate::common::{test_kit, values};

/// Marks inputs as having passed through the module.
struct EchoModuleRunner;

#[async_trait]
impl ModuleRunner for EchoModuleRunner {
    async fn invoke_module(
        &self,
        _module: &ModuleDescriptor,
        inputs: InputValues,
    ) -> Result<OutputValues, HandlerError> {
        let mut outputs = inputs;
        outputs.insert("ran".into(), json!(true));
        Ok(outputs)
    }
}

fn imperative_board() -> GraphDescriptor {
    GraphDescriptor {
        main: Some("main".into()),
        modules: Some(BTreeMap::from([(
            "main".into(),
            ModuleDescriptor {
                code: "export default (inputs) => inputs".into(),
                metadata: None,
            },
        )])),
        ..Default::default()
    }
}

/// **Scenario**: An imperative board runs as input → runModule → output
/// through the module-runner capability.
#[tokio::test]
async fn imperative_board_runs_main_module() {
    let runner = BoardRunner::new(imperative_board())
        .with_kit(test_kit())
        .with_module_runner(Arc::new(EchoModuleRunner));
    let completion = runner
        .run_to_completion(RunConfig::with_inputs(values(&[("x", json!(5))])))
        .await
        .unwrap();
    match completion {
        RunCompletion::Done(Some(outputs)) => {
            assert_eq!(outputs["x"], json!(5));
            assert_eq!(outputs["ran"], json!(true));
        }
        other => panic!("expected Done, got {:?}", other),
    }
}

/// **Scenario**: Without the capability, runModule fails into `$error`
/// outputs and the run still completes.
#[tokio::test]
async fn missing_module_runner_is_contained() {
    let runner = BoardRunner::new(imperative_board()).with_kit(test_kit());
    let completion = runner
        .run_to_completion(RunConfig::with_inputs(values(&[("x", json!(5))])))
        .await
        .unwrap();
    match completion {
        RunCompletion::Done(Some(outputs)) => {
            assert!(outputs.contains_key("$error"));
        }
        other => panic!("expected Done with $error, got {:?}", other),
    }
}
