//! Wire shape of the change events the forwarder receives.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One change record from a data table's stream, as delivered to the
/// forwarder. Only the table name is modeled; the rest of the event,
/// including the stream payload, is captured raw so re-serialization
/// reproduces the delivered JSON, explicit nulls included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSyncEvent {
    pub table_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataSyncEvent {
    /// String identifier of the changed row, read from the stream payload's
    /// new image at `dynamodb.NewImage.id.S`. Absent whenever the payload,
    /// the image, its `id` attribute, or the string value is.
    pub fn record_id(&self) -> Option<&str> {
        self.extra
            .get("dynamodb")?
            .get("NewImage")?
            .get("id")?
            .get("S")?
            .as_str()
    }
}
