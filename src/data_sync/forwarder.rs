//! Turns one change event into one workflow execution.

use tracing::debug;
use ulid::Ulid;

use super::event::DataSyncEvent;
use super::workflow::{ExecutionHandle, Workflow};
use super::ForwardError;

/// Stands in for the record id when the new image does not carry one.
const NO_ID: &str = "no-id";

/// Forwards change events to a fixed state machine.
pub struct Forwarder<W> {
    workflow: W,
    state_machine_arn: String,
}

impl<W: Workflow> Forwarder<W> {
    pub fn new(workflow: W, state_machine_arn: String) -> Self {
        Self {
            workflow,
            state_machine_arn,
        }
    }

    /// Start one execution for `event`, passing the event through as the
    /// execution input unmodified.
    pub async fn handle(&self, event: &DataSyncEvent) -> Result<ExecutionHandle, ForwardError> {
        debug!("data sync event: {event:?}");

        let name = execution_name(&event.table_name, event.record_id());
        let input = serde_json::to_string(event)?;
        self.workflow
            .start_execution(&self.state_machine_arn, &name, input)
            .await
    }
}

/// Execution names are `{table}-{record id}-{ulid}`: traceable back to the
/// row that changed, unique per delivery. `#` is not a legal execution-name
/// character, so composite ids have it replaced with `-`.
pub fn execution_name(table: &str, record_id: Option<&str>) -> String {
    let id = record_id.unwrap_or(NO_ID).replace('#', "-");
    format!("{table}-{id}-{}", Ulid::new())
}
