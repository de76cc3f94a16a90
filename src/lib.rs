//! Deployment glue for a CQRS backend on DynamoDB.
//!
//! Two entry points share this crate: `provision-tables` reconciles a
//! directory of table specs against DynamoDB (see [`provision`]), and
//! `data-sync-forwarder` starts one Step Functions execution per inbound
//! change-stream event (see [`data_sync`]).

pub mod config;
pub mod data_sync;
pub mod provision;

/// Error type for sources whose concrete type does not matter to callers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
