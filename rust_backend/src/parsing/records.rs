use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::models::macros::{BugId, CategoryId, ProjectId, ResourceId};
use crate::models::time::{deserialize_optional_timestamp, Timestamp};
use crate::models::work::MinutesKind;

/// Candidate keys that may contain the record list when the payload is an object
const RECORD_KEYS: &[&str] = &["records", "rows", "work_records", "workRecords"];

/// Custom deserializer that accepts either string or integer ids
fn deserialize_id<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<i64>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => s.trim().parse::<i64>().map(T::from).map_err(D::Error::custom),
        StringOrInt::Int(i) => Ok(T::from(i)),
    }
}

/// One flat row of the inbound work stream.
///
/// Every row carries the full user → project → category → bug path plus one
/// minute value for one work category. Field aliases accept the column
/// names issue trackers export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    #[serde(alias = "handler_id", deserialize_with = "deserialize_id")]
    pub resource_id: ResourceId,
    #[serde(deserialize_with = "deserialize_id")]
    pub project_id: ProjectId,
    #[serde(default)]
    pub project_name: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub category_id: CategoryId,
    #[serde(default)]
    pub category_name: String,
    #[serde(alias = "id", deserialize_with = "deserialize_id")]
    pub bug_id: BugId,
    #[serde(default, alias = "weight")]
    pub bug_weight: i64,
    #[serde(
        default,
        alias = "target_date",
        alias = "due_date",
        deserialize_with = "deserialize_optional_timestamp"
    )]
    pub bug_due_date: Option<Timestamp>,
    #[serde(alias = "work_type")]
    pub work_category: String,
    /// Ledger map the value goes to; rows without one carry estimates.
    #[serde(default = "default_minutes_kind", alias = "minutes_type")]
    pub minutes_kind: MinutesKind,
    #[serde(alias = "minutes")]
    pub minute_value: i64,
}

fn default_minutes_kind() -> MinutesKind {
    MinutesKind::Estimate
}

/// Locate the record array inside a parsed payload
fn extract_records(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in RECORD_KEYS {
                if let Some(found) = map.remove(*key) {
                    return match found {
                        Value::Array(items) => Ok(items),
                        other => anyhow::bail!("'{}' must be an array, found {}", key, type_name(&other)),
                    };
                }
            }
            anyhow::bail!(
                "JSON object must contain one of {:?}. Found keys: {:?}",
                RECORD_KEYS,
                map.keys().collect::<Vec<_>>()
            )
        }
        other => anyhow::bail!("Expected an array of work records, found {}", type_name(&other)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse work records from a JSON string.
///
/// Accepts a bare array of records or an object holding the array under one
/// of the [`RECORD_KEYS`]. Errors name the index of the offending record and
/// the path of the offending field.
pub fn parse_records_str(json_str: &str) -> Result<Vec<WorkRecord>> {
    let value: Value = serde_json::from_str(json_str).with_context(|| {
        let preview: String = json_str.chars().take(200).collect();
        format!("Invalid JSON syntax. First 200 chars: {}", preview)
    })?;

    extract_records(value)?
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_path_to_error::deserialize(item)
                .with_context(|| format!("Invalid work record at index {}", idx))
        })
        .collect()
}

/// Parse work records from a JSON file
pub fn parse_records_file(path: &Path) -> Result<Vec<WorkRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;

    parse_records_str(&content)
        .with_context(|| format!("Failed to parse records file: {}", path.display()))
}
