use aws_config::BehaviorVersion;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

use cqrs_infra::config::ForwarderConfig;
use cqrs_infra::data_sync::{DataSyncEvent, Forwarder, SfnWorkflow};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time() // CloudWatch will add the ingestion time
        .with_target(false)
        .init();

    let config = ForwarderConfig::from_env()?;

    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let workflow = SfnWorkflow::new(aws_sdk_sfn::Client::new(&aws_config));
    let forwarder = Forwarder::new(workflow, config.state_machine_arn);

    run(service_fn(|event: LambdaEvent<DataSyncEvent>| async {
        let payload = event.payload;
        forwarder.handle(&payload).await.map_err(Error::from)
    }))
    .await
}
