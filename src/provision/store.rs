//! The seam between the reconciler and the backing store.
//!
//! `TableStore` is everything the reconciler needs from DynamoDB; the real
//! implementation maps one method to one SDK call. "Table not found" on a
//! lookup is an expected answer, not an error, so `find_table` folds it into
//! `Ok(None)`.

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{BuildError, SdkError};
use aws_sdk_dynamodb::operation::create_table::builders::CreateTableFluentBuilder;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType,
    LocalSecondaryIndex, PointInTimeRecoverySpecification, PointInTimeRecoveryStatus, Projection,
    ProjectionType, ProvisionedThroughput, ScalarAttributeType, SseSpecification, SseType,
    StreamSpecification, StreamViewType, TableClass, Tag, TimeToLiveSpecification,
    TimeToLiveStatus,
};
use aws_sdk_dynamodb::Client;
use thiserror::Error;

use crate::BoxError;

use super::spec::{IndexSpec, KeySpec, LocalIndexSpec, ProjectionSpec, TableSpec};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table {table} lookup failed: {source}")]
    Describe { table: String, source: BoxError },

    #[error("table {table} creation failed: {source}")]
    Create { table: String, source: BoxError },

    #[error("time-to-live update failed for table {table}: {source}")]
    TimeToLive { table: String, source: BoxError },

    #[error("continuous backups update failed for table {table}: {source}")]
    ContinuousBackups { table: String, source: BoxError },
}

impl StoreError {
    fn describe(table: &str, source: impl Into<BoxError>) -> Self {
        StoreError::Describe {
            table: table.to_string(),
            source: source.into(),
        }
    }

    fn create(table: &str, source: impl Into<BoxError>) -> Self {
        StoreError::Create {
            table: table.to_string(),
            source: source.into(),
        }
    }

    fn time_to_live(table: &str, source: impl Into<BoxError>) -> Self {
        StoreError::TimeToLive {
            table: table.to_string(),
            source: source.into(),
        }
    }

    fn continuous_backups(table: &str, source: impl Into<BoxError>) -> Self {
        StoreError::ContinuousBackups {
            table: table.to_string(),
            source: source.into(),
        }
    }
}

/// Remote identity of a table as the store reports it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableIdentity {
    pub table_arn: Option<String>,
    pub stream_arn: Option<String>,
}

/// Store operations the reconciler drives. One method per remote call.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Look a table up by its full (prefixed) name. `Ok(None)` means the
    /// table does not exist; any other failure is an error.
    async fn find_table(&self, name: &str) -> Result<Option<TableIdentity>, StoreError>;

    /// Create the table described by `spec` (whose name is already
    /// prefixed).
    async fn create_table(&self, spec: &TableSpec) -> Result<TableIdentity, StoreError>;

    /// Whether time-to-live is currently in the DISABLED state. Transitional
    /// states report `false` so an in-flight enable is not repeated.
    async fn time_to_live_disabled(&self, name: &str) -> Result<bool, StoreError>;

    async fn enable_time_to_live(&self, name: &str, attribute: &str) -> Result<(), StoreError>;

    /// Whether point-in-time recovery is currently in the DISABLED state.
    async fn point_in_time_recovery_disabled(&self, name: &str) -> Result<bool, StoreError>;

    async fn enable_point_in_time_recovery(&self, name: &str) -> Result<(), StoreError>;
}

/// `TableStore` over the real DynamoDB client.
pub struct DynamoTableStore {
    client: Client,
}

impl DynamoTableStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn build_create_table(&self, spec: &TableSpec) -> Result<CreateTableFluentBuilder, BuildError> {
        let mut request = self.client.create_table().table_name(&spec.table_name);

        for attribute in &spec.attribute_definitions {
            request = request.attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(&attribute.attribute_name)
                    .attribute_type(ScalarAttributeType::from(attribute.attribute_type.as_str()))
                    .build()?,
            );
        }
        for key in &spec.key_schema {
            request = request.key_schema(key_element(key)?);
        }
        if let Some(mode) = &spec.billing_mode {
            request = request.billing_mode(BillingMode::from(mode.as_str()));
        }
        if let Some(throughput) = &spec.provisioned_throughput {
            request = request.provisioned_throughput(
                ProvisionedThroughput::builder()
                    .read_capacity_units(throughput.read_capacity_units)
                    .write_capacity_units(throughput.write_capacity_units)
                    .build()?,
            );
        }
        if let Some(stream) = &spec.stream_specification {
            let mut builder = StreamSpecification::builder().stream_enabled(stream.stream_enabled);
            if let Some(view) = &stream.stream_view_type {
                builder = builder.stream_view_type(StreamViewType::from(view.as_str()));
            }
            request = request.stream_specification(builder.build()?);
        }
        if let Some(indexes) = &spec.global_secondary_indexes {
            for index in indexes {
                request = request.global_secondary_indexes(global_index(index)?);
            }
        }
        if let Some(indexes) = &spec.local_secondary_indexes {
            for index in indexes {
                request = request.local_secondary_indexes(local_index(index)?);
            }
        }
        if let Some(sse) = &spec.sse_specification {
            let mut builder = SseSpecification::builder();
            if let Some(enabled) = sse.enabled {
                builder = builder.enabled(enabled);
            }
            if let Some(kind) = &sse.sse_type {
                builder = builder.sse_type(SseType::from(kind.as_str()));
            }
            if let Some(key) = &sse.kms_master_key_id {
                builder = builder.kms_master_key_id(key);
            }
            request = request.sse_specification(builder.build());
        }
        if let Some(tags) = &spec.tags {
            for tag in tags {
                request = request.tags(Tag::builder().key(&tag.key).value(&tag.value).build()?);
            }
        }
        if let Some(class) = &spec.table_class {
            request = request.table_class(TableClass::from(class.as_str()));
        }
        if let Some(enabled) = spec.deletion_protection_enabled {
            request = request.deletion_protection_enabled(enabled);
        }

        Ok(request)
    }
}

fn key_element(key: &KeySpec) -> Result<KeySchemaElement, BuildError> {
    KeySchemaElement::builder()
        .attribute_name(&key.attribute_name)
        .key_type(KeyType::from(key.key_type.as_str()))
        .build()
}

fn projection(spec: &ProjectionSpec) -> Projection {
    let mut builder = Projection::builder();
    if let Some(kind) = &spec.projection_type {
        builder = builder.projection_type(ProjectionType::from(kind.as_str()));
    }
    if let Some(attributes) = &spec.non_key_attributes {
        for attribute in attributes {
            builder = builder.non_key_attributes(attribute);
        }
    }
    builder.build()
}

fn global_index(index: &IndexSpec) -> Result<GlobalSecondaryIndex, BuildError> {
    let mut builder = GlobalSecondaryIndex::builder().index_name(&index.index_name);
    for key in &index.key_schema {
        builder = builder.key_schema(key_element(key)?);
    }
    builder = builder.projection(projection(&index.projection));

    if let Some(throughput) = &index.provisioned_throughput {
        builder = builder.provisioned_throughput(
            ProvisionedThroughput::builder()
                .read_capacity_units(throughput.read_capacity_units)
                .write_capacity_units(throughput.write_capacity_units)
                .build()?,
        );
    }

    builder.build()
}

fn local_index(index: &LocalIndexSpec) -> Result<LocalSecondaryIndex, BuildError> {
    let mut builder = LocalSecondaryIndex::builder().index_name(&index.index_name);
    for key in &index.key_schema {
        builder = builder.key_schema(key_element(key)?);
    }
    builder.projection(projection(&index.projection)).build()
}

#[async_trait]
impl TableStore for DynamoTableStore {
    async fn find_table(&self, name: &str) -> Result<Option<TableIdentity>, StoreError> {
        let result = self.client.describe_table().table_name(name).send().await;

        match result {
            Ok(output) => Ok(output.table.map(|table| TableIdentity {
                table_arn: table.table_arn,
                stream_arn: table.latest_stream_arn,
            })),
            Err(SdkError::ServiceError(err))
                if matches!(err.err(), DescribeTableError::ResourceNotFoundException(_)) =>
            {
                Ok(None)
            }
            Err(err) => Err(StoreError::describe(name, err)),
        }
    }

    async fn create_table(&self, spec: &TableSpec) -> Result<TableIdentity, StoreError> {
        let request = self
            .build_create_table(spec)
            .map_err(|err| StoreError::create(&spec.table_name, err))?;

        let output = request
            .send()
            .await
            .map_err(|err| StoreError::create(&spec.table_name, err))?;

        Ok(output
            .table_description
            .map(|table| TableIdentity {
                table_arn: table.table_arn,
                stream_arn: table.latest_stream_arn,
            })
            .unwrap_or_default())
    }

    async fn time_to_live_disabled(&self, name: &str) -> Result<bool, StoreError> {
        let output = self
            .client
            .describe_time_to_live()
            .table_name(name)
            .send()
            .await
            .map_err(|err| StoreError::time_to_live(name, err))?;

        let status = output
            .time_to_live_description
            .and_then(|description| description.time_to_live_status);
        Ok(matches!(status, Some(TimeToLiveStatus::Disabled)))
    }

    async fn enable_time_to_live(&self, name: &str, attribute: &str) -> Result<(), StoreError> {
        let specification = TimeToLiveSpecification::builder()
            .enabled(true)
            .attribute_name(attribute)
            .build()
            .map_err(|err| StoreError::time_to_live(name, err))?;

        self.client
            .update_time_to_live()
            .table_name(name)
            .time_to_live_specification(specification)
            .send()
            .await
            .map_err(|err| StoreError::time_to_live(name, err))?;

        Ok(())
    }

    async fn point_in_time_recovery_disabled(&self, name: &str) -> Result<bool, StoreError> {
        let output = self
            .client
            .describe_continuous_backups()
            .table_name(name)
            .send()
            .await
            .map_err(|err| StoreError::continuous_backups(name, err))?;

        let status = output
            .continuous_backups_description
            .and_then(|description| description.point_in_time_recovery_description)
            .and_then(|recovery| recovery.point_in_time_recovery_status);
        Ok(matches!(status, Some(PointInTimeRecoveryStatus::Disabled)))
    }

    async fn enable_point_in_time_recovery(&self, name: &str) -> Result<(), StoreError> {
        let specification = PointInTimeRecoverySpecification::builder()
            .point_in_time_recovery_enabled(true)
            .build()
            .map_err(|err| StoreError::continuous_backups(name, err))?;

        self.client
            .update_continuous_backups()
            .table_name(name)
            .point_in_time_recovery_specification(specification)
            .send()
            .await
            .map_err(|err| StoreError::continuous_backups(name, err))?;

        Ok(())
    }
}
