#![allow(clippy::result_large_err)]

use crate::errors::{ChangeLogError, Result};
use crate::model::operation::OperationKind;
use crate::model::payload::ChangePayload;
use crate::model::primary_key::NormalizedPk;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One immutable row of the change log
///
/// An entry starts unpersisted (no id) and becomes persisted exactly once,
/// when the repository assigns its id. The payload is kept in its stored
/// text form and decoded on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    id: Option<i64>,
    operation_code: i64,
    class_name: String,
    object_pk: Option<NormalizedPk>,
    username: String,
    created_at: DateTime<Utc>,
    changes_detail: String,
}

impl LogEntry {
    /// A new, unpersisted entry
    ///
    /// `object_pk` may be `None` only for an insertion whose key the store
    /// has not assigned yet.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if the payload cannot be encoded.
    pub fn new(
        class_name: impl Into<String>,
        object_pk: Option<NormalizedPk>,
        username: impl Into<String>,
        created_at: DateTime<Utc>,
        payload: &ChangePayload,
    ) -> Result<Self> {
        Ok(Self {
            id: None,
            operation_code: payload.operation().code(),
            class_name: class_name.into(),
            object_pk,
            username: username.into(),
            created_at: truncate_to_millis(created_at),
            changes_detail: payload.encode()?,
        })
    }

    /// Rebuild a persisted entry from its stored columns
    pub fn restore(
        id: i64,
        operation_code: i64,
        class_name: String,
        object_pk: String,
        username: String,
        created_at_ms: i64,
        changes_detail: String,
    ) -> Self {
        Self {
            id: Some(id),
            operation_code,
            class_name,
            object_pk: Some(NormalizedPk::new(object_pk)),
            username,
            created_at: Utc
                .timestamp_millis_opt(created_at_ms)
                .single()
                .unwrap_or_default(),
            changes_detail,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn operation_code(&self) -> i64 {
        self.operation_code
    }

    /// `None` for codes this build does not know
    pub fn operation(&self) -> Option<OperationKind> {
        OperationKind::from_code(self.operation_code)
    }

    pub fn is_operation(&self, kind: OperationKind) -> bool {
        self.operation_code == kind.code()
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_pk(&self) -> Option<&NormalizedPk> {
        self.object_pk.as_ref()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    /// Stored payload text
    pub fn changes_detail(&self) -> &str {
        &self.changes_detail
    }

    /// # Errors
    ///
    /// Returns `InvalidPayload` or `UnsupportedPayloadVersion` if the
    /// stored payload cannot be decoded.
    pub fn payload(&self) -> Result<ChangePayload> {
        ChangePayload::decode(&self.changes_detail, self.operation())
    }

    /// Fill in the target key once the store has assigned it
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPersisted` if the entry was already written.
    pub fn set_object_pk(&mut self, object_pk: NormalizedPk) -> Result<()> {
        self.ensure_unpersisted()?;
        self.object_pk = Some(object_pk);
        Ok(())
    }

    /// Replace the payload of a pending entry
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPersisted` if the entry was already written, or
    /// `InvalidInput` if the payload is for a different operation.
    pub fn set_payload(&mut self, payload: &ChangePayload) -> Result<()> {
        self.ensure_unpersisted()?;
        if payload.operation().code() != self.operation_code {
            let entry_kind = match self.operation() {
                Some(kind) => kind.label().to_string(),
                None => format!("operation code {}", self.operation_code),
            };
            return Err(ChangeLogError::InvalidInput {
                reason: format!(
                    "cannot store {} payload on {} entry",
                    payload.operation().label(),
                    entry_kind
                ),
            });
        }
        self.changes_detail = payload.encode()?;
        Ok(())
    }

    /// Record the id the repository assigned
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPersisted` on any call after the first.
    pub fn mark_persisted(&mut self, id: i64) -> Result<()> {
        self.ensure_unpersisted()?;
        self.id = Some(id);
        Ok(())
    }

    fn ensure_unpersisted(&self) -> Result<()> {
        match self.id {
            Some(entry_id) => Err(ChangeLogError::AlreadyPersisted { entry_id }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = self
            .operation()
            .map(|kind| kind.label().to_string())
            .unwrap_or_else(|| format!("Operation {}", self.operation_code));
        write!(f, "{} at {}", label, self.created_at)
    }
}

/// Storage keeps millisecond precision; entries carry the same
fn truncate_to_millis(instant: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(instant.timestamp_millis())
        .single()
        .unwrap_or(instant)
}
