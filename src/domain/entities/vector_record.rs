use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Metadata attached to a vector: string values, or groups of string values
pub type Metadata = serde_json::Map<String, JsonValue>;

/// A record returned by the vector index for a query.
///
/// `distance` and `metadata` are only present when they were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl VectorRecord {
    /// Serializes the whole record into the JSON caption displayed next to its image
    pub fn to_caption(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn try_parsing_caption(caption: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(caption)
    }
}
