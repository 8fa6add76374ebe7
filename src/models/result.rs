use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One piece of generated output referenced by a result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result record returned by the service for one request.
///
/// Every field is passed through untouched so that the metadata file holds
/// exactly what the service sent back; a missing `images` key stays missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<MediaDescriptor>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerationResult {
    /// Media descriptors, empty when the service sent none.
    pub fn images(&self) -> &[MediaDescriptor] {
        self.images.as_deref().unwrap_or_default()
    }

    pub fn seed(&self) -> Option<i64> {
        self.extra.get("seed").and_then(Value::as_i64)
    }
}

/// Identifies a request accepted by the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHandle {
    pub request_id: String,
    pub status_url: String,
    pub response_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueState {
    InQueue,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueLog {
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub status: QueueState,
    #[serde(default)]
    pub queue_position: Option<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub logs: Vec<QueueLog>,
}

impl QueueStatus {
    pub fn is_completed(&self) -> bool {
        self.status == QueueState::Completed
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<QueueLog>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<QueueLog>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Item yielded by a streaming subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    Log(String),
    Completed(GenerationResult),
}
