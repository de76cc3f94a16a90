//! Environment-driven configuration for both binaries.
//!
//! Values come from process environment variables; the binaries load a
//! `.env` file before reading them. Each binary reads only the block it
//! needs.

use std::path::PathBuf;

use thiserror::Error;

const ENVIRONMENT_DEFAULT: &str = "dev";
const TABLE_DIR_DEFAULT: &str = "tables";
const CONCURRENCY_DEFAULT: usize = 8;

/// Environment name that switches on production-only behavior.
pub const PRODUCTION_ENV: &str = "prod";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Settings for the table provisioner.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Deployment environment name (`dev`, `staging`, `prod`, ...).
    pub environment: String,
    /// Application name, the second component of the table prefix.
    pub app_name: String,
    /// DynamoDB endpoint override, for local development.
    pub endpoint: Option<String>,
    /// AWS region override.
    pub region: Option<String>,
    /// Directory holding the table spec files.
    pub table_dir: PathBuf,
    /// Upper bound on concurrent table reconciliations.
    pub concurrency: usize,
}

impl ProvisionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("APP_ENV").unwrap_or_else(|_| ENVIRONMENT_DEFAULT.to_string());
        let app_name = std::env::var("APP_NAME").map_err(|_| ConfigError::MissingVar("APP_NAME"))?;
        let endpoint = std::env::var("DYNAMODB_ENDPOINT").ok();
        let region = std::env::var("DYNAMODB_REGION").ok();
        let table_dir = std::env::var("TABLE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(TABLE_DIR_DEFAULT));
        let concurrency = match std::env::var("TABLE_CONCURRENCY") {
            Ok(raw) => parse_concurrency(&raw)?,
            Err(_) => CONCURRENCY_DEFAULT,
        };

        Ok(Self {
            environment,
            app_name,
            endpoint,
            region,
            table_dir,
            concurrency,
        })
    }

    /// Prefix applied to every table name: `{env}-{app}-`.
    pub fn table_prefix(&self) -> String {
        format!("{}-{}-", self.environment, self.app_name)
    }

    /// Whether production-only settings (point-in-time recovery) apply.
    pub fn production(&self) -> bool {
        self.environment == PRODUCTION_ENV
    }
}

/// Settings for the data-sync forwarder.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// ARN of the state machine that receives forwarded events.
    pub state_machine_arn: String,
}

impl ForwarderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let state_machine_arn = std::env::var("SFN_COMMAND_ARN")
            .map_err(|_| ConfigError::MissingVar("SFN_COMMAND_ARN"))?;

        Ok(Self { state_machine_arn })
    }
}

fn parse_concurrency(raw: &str) -> Result<usize, ConfigError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            name: "TABLE_CONCURRENCY",
            value: raw.to_string(),
        }),
    }
}
