use crate::model::field_change::value_text;
use crate::model::primary_key::PrimaryKey;
use crate::schema::TableDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// In-process identity of a record, stable across its lifetime
///
/// Pending log entries are keyed by it, so two loaded copies of the same
/// row never share a pending entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked domain object as the host hands it to the change log
///
/// Field values are JSON scalars. A record tracks which fields were set
/// since it was loaded or last saved, and whether it has been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    instance_id: InstanceId,
    class_name: String,
    values: BTreeMap<String, Value>,
    modified: BTreeSet<String>,
    is_new: bool,
}

impl Record {
    /// A record that has never been stored
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            instance_id: InstanceId::new(),
            class_name: class_name.into(),
            values: BTreeMap::new(),
            modified: BTreeSet::new(),
            is_new: true,
        }
    }

    /// A record hydrated from storage: not new, nothing modified
    pub fn from_stored(class_name: impl Into<String>, values: BTreeMap<String, Value>) -> Self {
        Self {
            instance_id: InstanceId::new(),
            class_name: class_name.into(),
            values,
            modified: BTreeSet::new(),
            is_new: false,
        }
    }

    /// Builder form of [`Record::set`]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Field value, `Null` when unset
    pub fn value(&self, field: &str) -> Value {
        self.values.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Set a field; marks it modified only when the value actually changes
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        if self.values.get(&field) != Some(&value) {
            self.modified.insert(field.clone());
            self.values.insert(field, value);
        }
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_modified(&self) -> bool {
        !self.modified.is_empty()
    }

    pub fn is_field_modified(&self, field: &str) -> bool {
        self.modified.contains(field)
    }

    pub fn modified_fields(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }

    /// Called by the object store once the record is written
    pub fn mark_saved(&mut self) {
        self.is_new = false;
        self.modified.clear();
    }

    /// The record's key per the table's primary key columns
    ///
    /// `None` while any key column is null or empty.
    pub fn primary_key(&self, table: &TableDescriptor) -> Option<PrimaryKey> {
        let mut parts = Vec::with_capacity(table.primary_key.len());
        for column in &table.primary_key {
            let text = value_text(self.values.get(column).unwrap_or(&Value::Null));
            if text.is_empty() {
                return None;
            }
            parts.push(text);
        }
        match parts.len() {
            0 => None,
            1 => parts.pop().map(PrimaryKey::Single),
            _ => Some(PrimaryKey::Composite(parts)),
        }
    }

    /// How the object is named to a human: the table's display field when
    /// set and non-empty, else the normalized key
    pub fn display_string(&self, table: &TableDescriptor) -> String {
        if let Some(field) = &table.display_field {
            let text = value_text(&self.value(field));
            if !text.is_empty() {
                return text;
            }
        }
        self.primary_key(table)
            .and_then(|pk| pk.normalize().ok())
            .map(|pk| pk.as_str().to_string())
            .unwrap_or_default()
    }
}
