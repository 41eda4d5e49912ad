//! Read-only interpretation of log entries.
//!
//! A [`ChangeLogAdapter`] wraps exactly one [`LogEntry`] and presents it
//! according to its operation: an update exposes one [`FieldChange`] per
//! field, a custom message exposes its text under the `message` key, and
//! insertions and deletions expose nothing. The view can never be written
//! to.

#![allow(clippy::result_large_err)]

pub mod env;

pub use env::RenderEnv;

use crate::config::ChangeLogConfig;
use crate::errors::{ChangeLogError, Result};
use crate::model::{value_text, ChangePayload, FieldChange, LogEntry, OperationKind};
use crate::render::{FieldRenderContext, Formatter, Templates};
use crate::schema::{ColumnType, TableDescriptor};
use serde_json::Value;
use std::cell::OnceCell;
use std::fmt::Write as _;
use std::sync::Arc;

/// Key under which a custom message is exposed
pub const MESSAGE_KEY: &str = "message";

/// A value read from an adapter's keyed view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdapterValue<'a> {
    Change(&'a FieldChange),
    Message(&'a str),
}

pub struct ChangeLogAdapter {
    operation: OperationKind,
    entry: LogEntry,
    env: Arc<RenderEnv>,
    payload: OnceCell<Result<ChangePayload>>,
    formatter: OnceCell<Box<dyn Formatter>>,
}

impl ChangeLogAdapter {
    /// Wrap an entry in the adapter for its operation
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the entry's operation code is not
    /// one this build knows.
    pub fn from_entry(entry: LogEntry, env: Arc<RenderEnv>) -> Result<Self> {
        let operation = entry
            .operation()
            .ok_or(ChangeLogError::UnsupportedOperation {
                code: entry.operation_code(),
            })?;
        Ok(Self {
            operation,
            entry,
            env,
            payload: OnceCell::new(),
            formatter: OnceCell::new(),
        })
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn entry(&self) -> &LogEntry {
        &self.entry
    }

    pub fn into_entry(self) -> LogEntry {
        self.entry
    }

    pub fn env(&self) -> &RenderEnv {
        &self.env
    }

    pub fn config(&self) -> &ChangeLogConfig {
        self.env.config()
    }

    pub fn templates(&self) -> &Templates {
        &self.env.config().templates
    }

    pub fn class_name(&self) -> &str {
        self.entry.class_name()
    }

    fn table(&self) -> Option<&TableDescriptor> {
        self.env.registry().table(self.entry.class_name())
    }

    /// Table of the affected class; the class name when it is not registered
    pub fn table_name(&self) -> &str {
        self.table()
            .map(|t| t.table_name.as_str())
            .unwrap_or_else(|| self.entry.class_name())
    }

    /// Normalized key of the affected object
    pub fn primary_key(&self) -> &str {
        self.entry.object_pk().map(|pk| pk.as_str()).unwrap_or("")
    }

    // ===== Payload =====

    fn payload(&self) -> Result<&ChangePayload> {
        match self.payload.get_or_init(|| self.decode_payload()) {
            Ok(payload) => Ok(payload),
            Err(err) => Err(err.clone()),
        }
    }

    fn decode_payload(&self) -> Result<ChangePayload> {
        let payload = self.entry.payload()?;
        if payload.operation() != self.operation {
            return Err(ChangeLogError::InvalidPayload {
                reason: format!(
                    "{} payload stored on a {} entry",
                    payload.operation(),
                    self.operation
                ),
            });
        }
        // Legacy payloads may lack column metadata
        Ok(match payload {
            ChangePayload::Update { changes } => {
                let table = self.table();
                let changes = changes
                    .into_vec()
                    .into_iter()
                    .map(|mut change| {
                        if let Some(column) = table.and_then(|t| t.column(&change.field)) {
                            if change.column_type == ColumnType::Other {
                                change.column_type = column.column_type;
                            }
                            change.foreign_key |= column.is_foreign_key();
                        }
                        change
                    })
                    .collect();
                ChangePayload::Update { changes }
            }
            other => other,
        })
    }

    /// Field changes of an update, in stored order; empty for other operations
    ///
    /// # Errors
    ///
    /// Returns the payload decoding error, if any.
    pub fn changes(&self) -> Result<&[FieldChange]> {
        match self.payload()? {
            ChangePayload::Update { changes } => Ok(changes.as_slice()),
            _ => Ok(&[]),
        }
    }

    /// Text of a custom message; empty for other operations
    ///
    /// # Errors
    ///
    /// Returns the payload decoding error, if any.
    pub fn custom_message(&self) -> Result<&str> {
        match self.payload()? {
            ChangePayload::CustomMessage { message } => Ok(message),
            _ => Ok(""),
        }
    }

    // ===== Keyed view =====

    /// Keys of the view, in order
    ///
    /// # Errors
    ///
    /// Returns the payload decoding error, if any.
    pub fn keys(&self) -> Result<Vec<&str>> {
        Ok(match self.operation {
            OperationKind::Update => self.changes()?.iter().map(|c| c.field.as_str()).collect(),
            OperationKind::CustomMessage => {
                self.custom_message()?;
                vec![MESSAGE_KEY]
            }
            OperationKind::Insertion | OperationKind::Deletion => Vec::new(),
        })
    }

    /// Read one key of the view
    ///
    /// # Errors
    ///
    /// Returns `ChangeNotFound` if the key is absent, or the payload
    /// decoding error.
    pub fn get(&self, key: &str) -> Result<AdapterValue<'_>> {
        let not_found = || ChangeLogError::ChangeNotFound {
            key: key.to_string(),
        };
        match self.operation {
            OperationKind::Update => self
                .changes()?
                .iter()
                .find(|c| c.field == key)
                .map(AdapterValue::Change)
                .ok_or_else(not_found),
            OperationKind::CustomMessage if key == MESSAGE_KEY => {
                Ok(AdapterValue::Message(self.custom_message()?))
            }
            _ => Err(not_found()),
        }
    }

    /// Views are read-only; always fails
    ///
    /// # Errors
    ///
    /// Always returns `ImmutableView`.
    pub fn set(&self, key: &str, _value: Value) -> Result<()> {
        Err(ChangeLogError::ImmutableView {
            action: "update".to_string(),
            key: key.to_string(),
        })
    }

    /// Views are read-only; always fails
    ///
    /// # Errors
    ///
    /// Always returns `ImmutableView`.
    pub fn unset(&self, key: &str) -> Result<()> {
        Err(ChangeLogError::ImmutableView {
            action: "unset".to_string(),
            key: key.to_string(),
        })
    }

    /// False for an undecodable payload
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Zero for an undecodable payload
    pub fn len(&self) -> usize {
        self.keys().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ===== Rendering =====

    /// The configured formatter, built on first use
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter
            .get_or_init(|| self.env.formatter())
            .as_ref()
    }

    /// Display name of the affected class
    pub fn render_class_name(&self) -> String {
        self.table()
            .map(|t| t.display_name().to_string())
            .unwrap_or_else(|| self.entry.class_name().to_string())
    }

    pub fn render_username(&self) -> &str {
        self.entry.username()
    }

    /// Creation instant in the configured date-time format
    pub fn render_created_at(&self) -> String {
        let created_at = self.entry.created_at();
        let mut out = String::new();
        match write!(out, "{}", created_at.format(&self.config().date_time_format)) {
            Ok(()) => out,
            Err(_) => created_at.to_rfc3339(),
        }
    }

    /// Operation label, or the message itself for a custom message
    pub fn render_operation_type(&self) -> String {
        if self.operation == OperationKind::CustomMessage {
            match self.custom_message() {
                Ok(message) => return message.to_string(),
                Err(err) => tracing::warn!(
                    entry_id = ?self.entry.id(),
                    error = %err,
                    "cannot decode custom message"
                ),
            }
        }
        self.operation.label().to_string()
    }

    /// Column label, else the field name
    pub fn render_field_name(&self, change: &FieldChange) -> String {
        self.table()
            .and_then(|t| t.column(&change.field))
            .and_then(|c| c.label.clone())
            .unwrap_or_else(|| change.field.clone())
    }

    pub fn render_old_value(&self, change: &FieldChange) -> String {
        self.render_value(change, &change.old_value)
    }

    pub fn render_new_value(&self, change: &FieldChange) -> String {
        self.render_value(change, &change.new_value)
    }

    /// Field hooks first; a foreign key value no field hook handled is then
    /// replaced by the referenced object's display string
    fn render_value(&self, change: &FieldChange, value: &Value) -> String {
        let ctx = FieldRenderContext {
            class_name: self.entry.class_name(),
            table_name: self.table_name(),
            field_name: &change.field,
            column_type: change.column_type,
        };
        let (rendered, handled) = self.env.run_field_hooks(&ctx, value.clone());
        let text = value_text(&rendered);
        if handled || text.is_empty() || !change.foreign_key {
            return text;
        }
        self.table()
            .and_then(|t| t.column(&change.field))
            .and_then(|c| c.foreign_key.as_ref())
            .and_then(|fk| self.env.resolve_foreign_value(&fk.class_name, &text))
            .unwrap_or(text)
    }

    /// The whole entry through the formatter
    ///
    /// # Errors
    ///
    /// Returns the payload decoding error, if any.
    pub fn render(&self) -> Result<String> {
        let formatter = self.formatter();
        let body = match self.operation {
            OperationKind::Insertion => formatter.format_insertion(self),
            OperationKind::Update => formatter.format_update(self, "\n")?,
            OperationKind::Deletion => formatter.format_deletion(self),
            OperationKind::CustomMessage => formatter.format_custom_message(self)?,
        };
        Ok(format!(
            "{}{}{}",
            formatter.format_start(),
            body,
            formatter.format_end()
        ))
    }

    /// One listing row, linking to `link` when the formatter supports it
    pub fn render_list(&self, link: &str) -> String {
        let formatter = self.formatter();
        match self.operation {
            OperationKind::Insertion => formatter.format_list_insertion(self, link),
            OperationKind::Update => formatter.format_list_update(self, link),
            OperationKind::Deletion => formatter.format_list_deletion(self, link),
            OperationKind::CustomMessage => formatter.format_list_custom_message(self, link),
        }
    }
}

impl std::fmt::Display for ChangeLogAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.entry),
        }
    }
}

impl std::fmt::Debug for ChangeLogAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeLogAdapter")
            .field("operation", &self.operation)
            .field("entry", &self.entry)
            .finish()
    }
}

/// Render a list of adapters between the formatter's list markers
pub fn render_listing(adapters: &[ChangeLogAdapter], link_for: impl Fn(&ChangeLogAdapter) -> String) -> String {
    let Some(first) = adapters.first() else {
        return String::new();
    };
    let formatter = first.formatter();
    let mut out = formatter.format_list_start();
    for adapter in adapters {
        out.push_str(&adapter.render_list(&link_for(adapter)));
    }
    out.push_str(&formatter.format_list_end());
    out
}
