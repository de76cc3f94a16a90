use aws_config::{BehaviorVersion, Region};
use tracing::{error, info};

use cqrs_infra::config::ProvisionConfig;
use cqrs_infra::provision::{DynamoTableStore, ProvisionError, Reconciler};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_target(false)
        .init();

    if let Err(err) = provision().await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn provision() -> Result<(), ProvisionError> {
    let config = ProvisionConfig::from_env()?;

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = config.region.clone() {
        loader = loader.region(Region::new(region));
    }
    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let aws_config = loader.load().await;

    let store = DynamoTableStore::new(aws_sdk_dynamodb::Client::new(&aws_config));
    let reconciler = Reconciler::new(store, &config);

    let created = reconciler.reconcile_dir(&config.table_dir).await?;
    if created == 0 {
        info!("no tables were created");
    } else {
        info!("{created} tables were created successfully");
    }

    Ok(())
}
