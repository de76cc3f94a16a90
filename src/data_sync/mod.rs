//! Forwarding of data-table change events into the command workflow.
//!
//! Each stream event becomes exactly one Step Functions execution, named so
//! it can be traced back to the row that changed. There is no retry layer
//! here; a failed start surfaces to the runtime and the event source
//! redelivers.

pub mod event;
pub mod forwarder;
pub mod workflow;

pub use event::DataSyncEvent;
pub use forwarder::Forwarder;
pub use workflow::{ExecutionHandle, SfnWorkflow, Workflow};

use thiserror::Error;

use crate::BoxError;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to serialize event as execution input: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to start execution {name}: {source}")]
    StartExecution { name: String, source: BoxError },
}
