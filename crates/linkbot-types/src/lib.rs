//! Linkbot Types - Shared types for the linkbot gateway
//!
//! Records persisted by the plugins and the snapshots they hand back to the
//! command layer.

use serde::{Deserialize, Serialize};

/// A trigger as it is persisted under its normalized key
///
/// The compiled matcher is rebuilt from `raw_pattern` and `is_regex` on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub raw_pattern: String,
    pub is_regex: bool,
    pub targets: Vec<String>,
}

impl TriggerRecord {
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Snapshot of a trigger handed to callers for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerListing {
    /// Normalized key of the trigger
    pub pattern: String,
    pub is_regex: bool,
    pub targets: Vec<String>,
}

/// What a single remove operation took out of one trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removal {
    pub pattern: String,
    pub removed_targets: Vec<String>,
    /// True when the trigger itself is gone afterwards
    pub trigger_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_layout() {
        let record = TriggerRecord {
            raw_pattern: "Ship It".to_string(),
            is_regex: false,
            targets: vec!["https://example.com/shipit.jpg".to_string()],
        };

        let value = record.to_value().unwrap();
        assert_eq!(value["raw_pattern"], "Ship It");
        assert_eq!(value["is_regex"], false);
        assert_eq!(value["targets"][0], "https://example.com/shipit.jpg");

        assert_eq!(TriggerRecord::from_value(value).unwrap(), record);
    }

    #[test]
    fn test_record_rejects_missing_fields() {
        let value = serde_json::json!({ "raw_pattern": "ship it" });
        assert!(TriggerRecord::from_value(value).is_err());
    }
}
