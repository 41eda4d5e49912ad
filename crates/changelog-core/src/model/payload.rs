//! Change payload encoding
//!
//! New entries are written as a versioned envelope:
//!
//! ```json
//! { "payload_schema_version": 1, "payload": { "kind": "update", "changes": [...] } }
//! ```
//!
//! Entries written before the envelope existed hold a bare object
//! (`{"changes": {...}}`, `{"message": ...}` or `{}`) whose meaning depends
//! on the entry's operation code. Both decode to [`ChangePayload`].

#![allow(clippy::result_large_err)]

use crate::errors::{ChangeLogError, Result};
use crate::model::change_set::ChangeSet;
use crate::model::field_change::{value_text, FieldChange};
use crate::model::operation::OperationKind;
use crate::schema::ColumnType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PAYLOAD_SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangePayload {
    Insertion,
    Update { changes: ChangeSet },
    Deletion,
    CustomMessage { message: String },
}

#[derive(Serialize)]
struct Envelope<'a> {
    payload_schema_version: u64,
    payload: &'a ChangePayload,
}

impl ChangePayload {
    pub fn operation(&self) -> OperationKind {
        match self {
            ChangePayload::Insertion => OperationKind::Insertion,
            ChangePayload::Update { .. } => OperationKind::Update,
            ChangePayload::Deletion => OperationKind::Deletion,
            ChangePayload::CustomMessage { .. } => OperationKind::CustomMessage,
        }
    }

    /// Encode inside the current envelope version
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if a change value cannot be encoded.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(&Envelope {
            payload_schema_version: PAYLOAD_SCHEMA_VERSION,
            payload: self,
        })?)
    }

    /// Decode a stored payload
    ///
    /// `operation` is only consulted for legacy (un-enveloped) payloads.
    ///
    /// # Errors
    ///
    /// - `UnsupportedPayloadVersion` if the envelope version is unknown
    /// - `InvalidPayload` if the text is not a payload this build can read
    pub fn decode(raw: &str, operation: Option<OperationKind>) -> Result<Self> {
        let raw = raw.trim();
        let value: Value = if raw.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(raw).map_err(|e| ChangeLogError::InvalidPayload {
                reason: format!("not valid JSON: {}", e),
            })?
        };
        let object = value.as_object().ok_or_else(|| ChangeLogError::InvalidPayload {
            reason: "payload root must be an object".to_string(),
        })?;

        match object.get("payload_schema_version") {
            Some(version) => Self::decode_envelope(object, version),
            None => Self::decode_legacy(object, operation),
        }
    }

    fn decode_envelope(object: &Map<String, Value>, version: &Value) -> Result<Self> {
        let version = version
            .as_u64()
            .ok_or_else(|| ChangeLogError::InvalidPayload {
                reason: format!("payload_schema_version must be an integer, got {}", version),
            })?;
        if version != PAYLOAD_SCHEMA_VERSION {
            return Err(ChangeLogError::UnsupportedPayloadVersion { version });
        }
        let payload = object
            .get("payload")
            .cloned()
            .ok_or_else(|| ChangeLogError::InvalidPayload {
                reason: "envelope has no payload".to_string(),
            })?;
        serde_json::from_value(payload).map_err(|e| ChangeLogError::InvalidPayload {
            reason: e.to_string(),
        })
    }

    fn decode_legacy(object: &Map<String, Value>, operation: Option<OperationKind>) -> Result<Self> {
        match operation {
            Some(OperationKind::Insertion) => Ok(ChangePayload::Insertion),
            Some(OperationKind::Deletion) => Ok(ChangePayload::Deletion),
            Some(OperationKind::Update) => {
                let changes = match object.get("changes") {
                    None | Some(Value::Null) => ChangeSet::new(),
                    Some(Value::Object(fields)) => fields
                        .iter()
                        .map(|(field, detail)| legacy_change(field, detail))
                        .collect(),
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(|detail| {
                            let field = detail.get("field").map(value_text).unwrap_or_default();
                            legacy_change(&field, detail)
                        })
                        .collect(),
                    Some(other) => {
                        return Err(ChangeLogError::InvalidPayload {
                            reason: format!("legacy changes must be a map, got {}", other),
                        })
                    }
                };
                Ok(ChangePayload::Update { changes })
            }
            Some(OperationKind::CustomMessage) => {
                let message = object.get("message").map(value_text).unwrap_or_default();
                Ok(ChangePayload::CustomMessage { message })
            }
            None => Err(ChangeLogError::InvalidPayload {
                reason: "legacy payload with unknown operation".to_string(),
            }),
        }
    }
}

/// One entry of a legacy `changes` map:
/// `{ field, old, new, type?, raw?: { old, new } }`
fn legacy_change(key: &str, detail: &Value) -> FieldChange {
    let field = detail
        .get("field")
        .map(value_text)
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| key.to_string());
    let old = detail.get("old").cloned().unwrap_or(Value::Null);
    let new = detail.get("new").cloned().unwrap_or(Value::Null);
    let raw = detail.get("raw");
    let raw_old = raw
        .and_then(|r| r.get("old"))
        .cloned()
        .unwrap_or_else(|| old.clone());
    let raw_new = raw
        .and_then(|r| r.get("new"))
        .cloned()
        .unwrap_or_else(|| new.clone());
    let column_type = detail
        .get("type")
        .and_then(Value::as_str)
        .map(legacy_column_type)
        .unwrap_or_default();

    FieldChange::new(field, old, new)
        .with_raw(raw_old, raw_new)
        .with_column_type(column_type)
}

/// Map a legacy column type name onto [`ColumnType`]
fn legacy_column_type(name: &str) -> ColumnType {
    match name.to_ascii_uppercase().as_str() {
        "CHAR" | "VARCHAR" | "LONGVARCHAR" | "CLOB" | "TEXT" => ColumnType::Text,
        "NUMERIC" | "DECIMAL" | "TINYINT" | "SMALLINT" | "INTEGER" | "BIGINT" | "REAL"
        | "FLOAT" | "DOUBLE" => ColumnType::Numeric,
        "BOOLEAN" => ColumnType::Boolean,
        "DATE" | "BU_DATE" => ColumnType::Date,
        "TIME" => ColumnType::Time,
        "TIMESTAMP" | "BU_TIMESTAMP" => ColumnType::Timestamp,
        "BINARY" | "VARBINARY" | "LONGVARBINARY" | "BLOB" => ColumnType::Binary,
        _ => ColumnType::Other,
    }
}
