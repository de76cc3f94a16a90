//! Table provisioning: desired-state specs and reconciliation against
//! DynamoDB.

use std::path::PathBuf;

use thiserror::Error;

pub mod reconciler;
pub mod spec;
pub mod store;

pub use reconciler::Reconciler;
pub use spec::TableSpec;
pub use store::{DynamoTableStore, StoreError, TableIdentity, TableStore};

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read table spec directory {dir}: {source}")]
    SpecDir {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read table spec {path}: {source}")]
    SpecRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse table spec {path}: {source}")]
    SpecParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("table reconciliation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ProvisionError {
    /// Creation failures abort the whole batch; everything else fails only
    /// the table it belongs to.
    pub fn batch_fatal(&self) -> bool {
        matches!(self, ProvisionError::Store(StoreError::Create { .. }))
    }
}
