//! Forwarder behavior against a recording workflow.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use cqrs_infra::data_sync::forwarder::execution_name;
use cqrs_infra::data_sync::{DataSyncEvent, ExecutionHandle, ForwardError, Forwarder, Workflow};

#[derive(Clone)]
struct Start {
    state_machine_arn: String,
    name: String,
    input: String,
}

#[derive(Clone, Default)]
struct RecordingWorkflow {
    starts: Arc<Mutex<Vec<Start>>>,
    refuse: Arc<Mutex<bool>>,
}

impl RecordingWorkflow {
    fn starts(&self) -> Vec<Start> {
        self.starts.lock().unwrap().clone()
    }

    fn refuse(&self) {
        *self.refuse.lock().unwrap() = true;
    }
}

#[async_trait]
impl Workflow for RecordingWorkflow {
    async fn start_execution(
        &self,
        state_machine_arn: &str,
        name: &str,
        input: String,
    ) -> Result<ExecutionHandle, ForwardError> {
        if *self.refuse.lock().unwrap() {
            return Err(ForwardError::StartExecution {
                name: name.to_string(),
                source: "workflow refused".into(),
            });
        }
        self.starts.lock().unwrap().push(Start {
            state_machine_arn: state_machine_arn.to_string(),
            name: name.to_string(),
            input,
        });
        Ok(ExecutionHandle {
            execution_arn: format!("arn:aws:states:local:0:execution:commands:{name}"),
            execution_name: name.to_string(),
        })
    }
}

fn forwarder(workflow: RecordingWorkflow) -> Forwarder<RecordingWorkflow> {
    Forwarder::new(workflow, "arn:aws:states:local:0:stateMachine:commands".to_string())
}

fn event(value: Value) -> DataSyncEvent {
    serde_json::from_value(value).unwrap()
}

#[test]
fn execution_names_carry_table_id_and_unique_suffix() {
    let name = execution_name("orders-data", Some("A-1"));
    let prefix = "orders-data-A-1-";
    assert!(name.starts_with(prefix), "unexpected name {name}");
    assert_eq!(name.len() - prefix.len(), 26);

    // The trailing ulid makes every delivery distinct.
    assert_ne!(name, execution_name("orders-data", Some("A-1")));
}

#[test]
fn missing_record_id_uses_placeholder() {
    let name = execution_name("orders-data", None);
    assert!(name.starts_with("orders-data-no-id-"), "unexpected name {name}");
}

#[test]
fn composite_record_ids_drop_hash_separators() {
    let name = execution_name("orders-data", Some("ORDER#A1"));
    assert!(name.starts_with("orders-data-ORDER-A1-"), "unexpected name {name}");
}

#[test]
fn record_id_comes_from_the_new_image() {
    let with_id = event(json!({
        "tableName": "orders-data",
        "dynamodb": { "NewImage": { "id": { "S": "A-1" } } }
    }));
    assert_eq!(with_id.record_id(), Some("A-1"));

    let no_image = event(json!({ "tableName": "orders-data" }));
    assert_eq!(no_image.record_id(), None);

    let non_string_id = event(json!({
        "tableName": "orders-data",
        "dynamodb": { "NewImage": { "id": { "N": "7" } } }
    }));
    assert_eq!(non_string_id.record_id(), None);
}

#[tokio::test]
async fn event_passes_through_as_execution_input() {
    let original = json!({
        "tableName": "dev-app-orders-data",
        "eventId": "e-1",
        "awsRegion": "eu-west-1",
        "dynamodb": {
            "NewImage": { "id": { "S": "ORDER#A1" }, "total": { "N": "12" } },
            "OldImage": { "id": { "S": "ORDER#A1" } },
            "SequenceNumber": "111"
        }
    });
    let workflow = RecordingWorkflow::default();

    let handle = forwarder(workflow.clone())
        .handle(&event(original.clone()))
        .await
        .unwrap();

    let starts = workflow.starts();
    assert_eq!(starts.len(), 1);
    assert_eq!(
        starts[0].state_machine_arn,
        "arn:aws:states:local:0:stateMachine:commands"
    );
    assert!(starts[0].name.starts_with("dev-app-orders-data-ORDER-A1-"));
    assert_eq!(handle.execution_name, starts[0].name);

    // Unmodeled fields survive the round trip into the execution input.
    let sent: Value = serde_json::from_str(&starts[0].input).unwrap();
    assert_eq!(sent, original);
}

#[tokio::test]
async fn explicit_nulls_survive_the_round_trip() {
    let stripped = json!({
        "tableName": "dev-app-orders-data",
        "dynamodb": null,
        "userIdentity": null
    });
    let nested = json!({
        "tableName": "dev-app-orders-data",
        "dynamodb": { "NewImage": null, "SequenceNumber": "111" }
    });
    let workflow = RecordingWorkflow::default();
    let forwarder = forwarder(workflow.clone());

    assert_eq!(event(stripped.clone()).record_id(), None);
    forwarder.handle(&event(stripped.clone())).await.unwrap();
    forwarder.handle(&event(nested.clone())).await.unwrap();

    // Null payloads are forwarded as delivered, not dropped.
    let starts = workflow.starts();
    let first: Value = serde_json::from_str(&starts[0].input).unwrap();
    let second: Value = serde_json::from_str(&starts[1].input).unwrap();
    assert_eq!(first, stripped);
    assert_eq!(second, nested);
}

#[tokio::test]
async fn workflow_failure_propagates() {
    let workflow = RecordingWorkflow::default();
    workflow.refuse();

    let err = forwarder(workflow.clone())
        .handle(&event(json!({ "tableName": "orders-data" })))
        .await
        .unwrap_err();

    assert!(matches!(err, ForwardError::StartExecution { .. }));
    assert!(workflow.starts().is_empty());
}
