//! The seam between the forwarder and Step Functions.

use async_trait::async_trait;
use serde::Serialize;

use super::ForwardError;

/// Returned once the workflow has accepted an execution. Serialized as the
/// handler's response so the delivery can be correlated from logs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionHandle {
    pub execution_arn: String,
    pub execution_name: String,
}

/// Whatever can run a state machine for us.
#[async_trait]
pub trait Workflow: Send + Sync {
    async fn start_execution(
        &self,
        state_machine_arn: &str,
        name: &str,
        input: String,
    ) -> Result<ExecutionHandle, ForwardError>;
}

/// `Workflow` over the real Step Functions client.
pub struct SfnWorkflow {
    client: aws_sdk_sfn::Client,
}

impl SfnWorkflow {
    pub fn new(client: aws_sdk_sfn::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Workflow for SfnWorkflow {
    async fn start_execution(
        &self,
        state_machine_arn: &str,
        name: &str,
        input: String,
    ) -> Result<ExecutionHandle, ForwardError> {
        let output = self
            .client
            .start_execution()
            .state_machine_arn(state_machine_arn)
            .name(name)
            .input(input)
            .send()
            .await
            .map_err(|err| ForwardError::StartExecution {
                name: name.to_string(),
                source: Box::new(err),
            })?;

        Ok(ExecutionHandle {
            execution_arn: output.execution_arn,
            execution_name: name.to_string(),
        })
    }
}
