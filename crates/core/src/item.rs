// Item read types
//
// Field names follow the DynamoDB JSON protocol so requests serialize
// straight onto the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Name of the partition key attribute on the probed table
pub const PARTITION_KEY: &str = "id";

/// A typed key attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String
    S(String),
    /// Number, carried as its decimal string
    N(String),
}

/// Consistency mode of a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadConsistency {
    /// May return stale data; cheaper and usually faster
    Eventual,
    /// Reflects every write acknowledged before the read
    Strong,
}

impl ReadConsistency {
    pub fn is_consistent_read(self) -> bool {
        matches!(self, ReadConsistency::Strong)
    }
}

impl fmt::Display for ReadConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadConsistency::Eventual => write!(f, "eventual"),
            ReadConsistency::Strong => write!(f, "strong"),
        }
    }
}

/// Single-item read by primary key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemRequest {
    pub table_name: String,
    pub key: HashMap<String, AttributeValue>,
    pub consistent_read: bool,
}

impl GetItemRequest {
    pub fn new(table_name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        let mut key = HashMap::new();
        key.insert(
            PARTITION_KEY.to_string(),
            AttributeValue::S(partition_key.into()),
        );
        Self {
            table_name: table_name.into(),
            key,
            consistent_read: false,
        }
    }

    /// Read of a freshly generated key that almost certainly does not exist
    pub fn random(table_name: impl Into<String>, consistency: ReadConsistency) -> Self {
        Self::new(table_name, Uuid::new_v4().to_string()).with_consistency(consistency)
    }

    pub fn with_consistency(mut self, consistency: ReadConsistency) -> Self {
        self.consistent_read = consistency.is_consistent_read();
        self
    }

    pub fn consistency(&self) -> ReadConsistency {
        if self.consistent_read {
            ReadConsistency::Strong
        } else {
            ReadConsistency::Eventual
        }
    }

    /// The string partition key, if the key has one
    pub fn partition_key(&self) -> Option<&str> {
        match self.key.get(PARTITION_KEY) {
            Some(AttributeValue::S(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Result of a single-item read; `item` is `None` when the key is absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    #[serde(default)]
    pub item: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GetItemOutput {
    pub fn not_found() -> Self {
        Self { item: None }
    }

    pub fn found(&self) -> bool {
        self.item.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request =
            GetItemRequest::new("sessions", "abc").with_consistency(ReadConsistency::Strong);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "TableName": "sessions",
                "Key": { "id": { "S": "abc" } },
                "ConsistentRead": true
            })
        );
    }

    #[test]
    fn test_random_requests_use_fresh_keys() {
        let a = GetItemRequest::random("sessions", ReadConsistency::Eventual);
        let b = GetItemRequest::random("sessions", ReadConsistency::Eventual);
        assert_ne!(a.partition_key(), b.partition_key());
        assert!(Uuid::parse_str(a.partition_key().unwrap()).is_ok());
        assert_eq!(a.consistency(), ReadConsistency::Eventual);
        assert!(!a.consistent_read);
    }

    #[test]
    fn test_output_parses_empty_body_as_not_found() {
        let output: GetItemOutput = serde_json::from_str("{}").unwrap();
        assert!(!output.found());
        assert_eq!(output, GetItemOutput::not_found());
    }

    #[test]
    fn test_output_parses_item() {
        let output: GetItemOutput =
            serde_json::from_value(json!({ "Item": { "id": { "S": "abc" } } })).unwrap();
        assert!(output.found());
        assert_eq!(output.item.unwrap()["id"], json!({ "S": "abc" }));
    }
}
