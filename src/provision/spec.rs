//! Table spec files and the CQRS family expansion.
//!
//! Spec files carry the AWS CreateTable JSON shape (PascalCase keys). Two
//! file names in the spec directory are special: `cqrs.json` lists module
//! names, `cqrs_desc.json` holds the template each module's three tables are
//! derived from. Every other file is a standalone table spec.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::ProvisionError;

/// File listing the CQRS module names (JSON array of strings).
pub const CQRS_MODULES_FILE: &str = "cqrs.json";
/// File holding the base table spec the CQRS families derive from.
pub const CQRS_TEMPLATE_FILE: &str = "cqrs_desc.json";

/// Desired state for one table, loaded verbatim from a spec file.
///
/// The name is rewritten with the environment prefix at reconcile time;
/// nothing else is touched. Unknown keys are rejected so a misspelled or
/// unsupported attribute fails the run instead of silently never reaching
/// the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TableSpec {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeSpec>,
    pub key_schema: Vec<KeySpec>,
    #[serde(default)]
    pub billing_mode: Option<String>,
    #[serde(default)]
    pub provisioned_throughput: Option<ThroughputSpec>,
    #[serde(default)]
    pub stream_specification: Option<StreamSpec>,
    #[serde(default)]
    pub global_secondary_indexes: Option<Vec<IndexSpec>>,
    #[serde(default)]
    pub local_secondary_indexes: Option<Vec<LocalIndexSpec>>,
    #[serde(default, rename = "SSESpecification")]
    pub sse_specification: Option<SseSpec>,
    #[serde(default)]
    pub tags: Option<Vec<TagSpec>>,
    #[serde(default)]
    pub table_class: Option<String>,
    #[serde(default)]
    pub deletion_protection_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct AttributeSpec {
    pub attribute_name: String,
    pub attribute_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct KeySpec {
    pub attribute_name: String,
    pub key_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ThroughputSpec {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct StreamSpec {
    pub stream_enabled: bool,
    #[serde(default)]
    pub stream_view_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct IndexSpec {
    pub index_name: String,
    pub key_schema: Vec<KeySpec>,
    pub projection: ProjectionSpec,
    #[serde(default)]
    pub provisioned_throughput: Option<ThroughputSpec>,
}

/// Local index over the table's hash key. Unlike a global index it shares
/// the table's capacity and can only be declared at creation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct LocalIndexSpec {
    pub index_name: String,
    pub key_schema: Vec<KeySpec>,
    pub projection: ProjectionSpec,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ProjectionSpec {
    #[serde(default)]
    pub projection_type: Option<String>,
    #[serde(default)]
    pub non_key_attributes: Option<Vec<String>>,
}

/// Server-side encryption, keyed as the AWS shape spells it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SseSpec {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, rename = "SSEType")]
    pub sse_type: Option<String>,
    #[serde(default, rename = "KMSMasterKeyId")]
    pub kms_master_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct TagSpec {
    pub key: String,
    pub value: String,
}

/// Derive the three tables of one CQRS module from the shared template.
///
/// `{module}-command` keeps the template's stream configuration; the data
/// table drops it, and the history table is derived from the data table.
/// The three specs differ only in name and stream presence.
pub fn cqrs_family(template: &TableSpec, module: &str) -> [TableSpec; 3] {
    let mut command = template.clone();
    command.table_name = format!("{module}-command");

    let mut data = command.clone();
    data.table_name = format!("{module}-data");
    data.stream_specification = None;

    let mut history = data.clone();
    history.table_name = format!("{module}-history");

    [command, data, history]
}

/// Load every table spec from `dir`: the expanded CQRS families first, then
/// each remaining file in name order.
pub fn load_table_specs(dir: &Path) -> Result<Vec<TableSpec>, ProvisionError> {
    let modules: Option<Vec<String>> = read_json(&dir.join(CQRS_MODULES_FILE))?;
    let template: TableSpec = read_json(&dir.join(CQRS_TEMPLATE_FILE))?;

    let mut specs = Vec::new();
    for module in modules.unwrap_or_default() {
        specs.extend(cqrs_family(&template, &module));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ProvisionError::SpecDir {
        dir: dir.to_path_buf(),
        source,
    })?;
    let mut extra = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ProvisionError::SpecDir {
            dir: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match path.file_name().and_then(|name| name.to_str()) {
            Some(CQRS_MODULES_FILE) | Some(CQRS_TEMPLATE_FILE) => continue,
            _ => extra.push(path),
        }
    }
    extra.sort();
    for path in &extra {
        specs.push(read_json(path)?);
    }

    Ok(specs)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ProvisionError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ProvisionError::SpecRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ProvisionError::SpecParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> TableSpec {
        serde_json::from_str(
            r#"{
                "TableName": "cqrs",
                "AttributeDefinitions": [{ "AttributeName": "id", "AttributeType": "S" }],
                "KeySchema": [{ "AttributeName": "id", "KeyType": "HASH" }],
                "BillingMode": "PAY_PER_REQUEST",
                "StreamSpecification": {
                    "StreamEnabled": true,
                    "StreamViewType": "NEW_AND_OLD_IMAGES"
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn family_names_and_stream_presence() {
        let [command, data, history] = cqrs_family(&template(), "orders");

        assert_eq!(command.table_name, "orders-command");
        assert_eq!(data.table_name, "orders-data");
        assert_eq!(history.table_name, "orders-history");

        assert!(command.stream_specification.is_some());
        assert!(data.stream_specification.is_none());
        assert!(history.stream_specification.is_none());
    }

    #[test]
    fn family_differs_only_in_name_and_stream() {
        let [command, data, history] = cqrs_family(&template(), "orders");

        let mut data_as_command = data.clone();
        data_as_command.table_name = command.table_name.clone();
        data_as_command.stream_specification = command.stream_specification.clone();
        assert_eq!(data_as_command, command);

        let mut history_as_data = history.clone();
        history_as_data.table_name = data.table_name.clone();
        assert_eq!(history_as_data, data);
    }

    #[test]
    fn family_leaves_the_template_untouched() {
        let before = template();
        let _ = cqrs_family(&before, "orders");
        assert_eq!(before, template());
    }

    #[test]
    fn spec_rejects_unknown_fields() {
        let raw = r#"{
            "TableName": "t",
            "AttributeDefinitions": [{ "AttributeName": "id", "AttributeType": "S" }],
            "KeySchema": [{ "AttributeName": "id", "KeyType": "HASH" }],
            "BilingMode": "PAY_PER_REQUEST"
        }"#;
        assert!(serde_json::from_str::<TableSpec>(raw).is_err());
    }

    #[test]
    fn spec_parses_provisioned_throughput_and_indexes() {
        let raw = r#"{
            "TableName": "t",
            "AttributeDefinitions": [
                { "AttributeName": "id", "AttributeType": "S" },
                { "AttributeName": "owner", "AttributeType": "S" }
            ],
            "KeySchema": [{ "AttributeName": "id", "KeyType": "HASH" }],
            "ProvisionedThroughput": { "ReadCapacityUnits": 5, "WriteCapacityUnits": 5 },
            "GlobalSecondaryIndexes": [{
                "IndexName": "by-owner",
                "KeySchema": [{ "AttributeName": "owner", "KeyType": "HASH" }],
                "Projection": { "ProjectionType": "ALL" },
                "ProvisionedThroughput": { "ReadCapacityUnits": 1, "WriteCapacityUnits": 1 }
            }]
        }"#;
        let spec: TableSpec = serde_json::from_str(raw).unwrap();
        let throughput = spec.provisioned_throughput.unwrap();
        assert_eq!(throughput.read_capacity_units, 5);
        let indexes = spec.global_secondary_indexes.unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].projection.projection_type.as_deref(), Some("ALL"));
    }

    #[test]
    fn spec_parses_local_indexes_encryption_and_tags() {
        let raw = r#"{
            "TableName": "t",
            "AttributeDefinitions": [
                { "AttributeName": "id", "AttributeType": "S" },
                { "AttributeName": "createdAt", "AttributeType": "N" }
            ],
            "KeySchema": [{ "AttributeName": "id", "KeyType": "HASH" }],
            "LocalSecondaryIndexes": [{
                "IndexName": "by-creation",
                "KeySchema": [
                    { "AttributeName": "id", "KeyType": "HASH" },
                    { "AttributeName": "createdAt", "KeyType": "RANGE" }
                ],
                "Projection": { "ProjectionType": "KEYS_ONLY" }
            }],
            "SSESpecification": { "Enabled": true, "SSEType": "KMS", "KMSMasterKeyId": "alias/tables" },
            "Tags": [{ "Key": "team", "Value": "platform" }],
            "TableClass": "STANDARD_INFREQUENT_ACCESS",
            "DeletionProtectionEnabled": true
        }"#;
        let spec: TableSpec = serde_json::from_str(raw).unwrap();

        let indexes = spec.local_secondary_indexes.unwrap();
        assert_eq!(indexes[0].index_name, "by-creation");
        assert_eq!(
            indexes[0].projection.projection_type.as_deref(),
            Some("KEYS_ONLY")
        );

        let sse = spec.sse_specification.unwrap();
        assert_eq!(sse.enabled, Some(true));
        assert_eq!(sse.sse_type.as_deref(), Some("KMS"));
        assert_eq!(sse.kms_master_key_id.as_deref(), Some("alias/tables"));

        assert_eq!(spec.tags.unwrap()[0].key, "team");
        assert_eq!(spec.table_class.as_deref(), Some("STANDARD_INFREQUENT_ACCESS"));
        assert_eq!(spec.deletion_protection_enabled, Some(true));
    }

    #[test]
    fn null_module_list_means_no_cqrs_tables() {
        let modules: Option<Vec<String>> = serde_json::from_str("null").unwrap();
        assert!(modules.is_none());
    }
}
