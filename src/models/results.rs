// src/models/results.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Driver-style acknowledgement of a single insert.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Value>, // Always null, upserts are never requested
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl InsertOneResult {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: inserted_id.into(),
        }
    }
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_count: 0,
            upserted_id: None,
        }
    }
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_result_wire_shape() {
        let json = serde_json::to_value(UpdateResult::new(1, 0)).unwrap();
        assert_eq!(json["matchedCount"], 1);
        assert_eq!(json["modifiedCount"], 0);
        assert_eq!(json["upsertedCount"], 0);
        assert!(json["upsertedId"].is_null());
    }

    #[test]
    fn test_insert_result_wire_shape() {
        let json = serde_json::to_string(&InsertOneResult::new("abc")).unwrap();
        assert_eq!(json, r#"{"acknowledged":true,"insertedId":"abc"}"#);
    }
}
