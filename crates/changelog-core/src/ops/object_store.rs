#![allow(clippy::result_large_err)]

use crate::errors::ExError;
use crate::model::{value_text, PrimaryKey, Record};
use serde_json::Value;

/// Selection of records whose `field` is one of `values`
///
/// Values match on their text form, so `1` and `"1"` are the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFilter {
    pub field: String,
    pub values: Vec<Value>,
}

impl RecordFilter {
    pub fn field_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            values,
        }
    }

    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field_in(field, vec![value.into()])
    }

    pub fn matches(&self, record: &Record) -> bool {
        let actual = value_text(&record.value(&self.field));
        self.values.iter().any(|v| value_text(v) == actual)
    }
}

/// Storage for tracked domain objects
pub trait ObjectStore {
    /// Load the stored state of one object
    ///
    /// # Errors
    ///
    /// Returns an error only when the store itself fails; a missing object
    /// is `Ok(None)`.
    fn retrieve_by_pk(&self, class_name: &str, pk: &PrimaryKey) -> Result<Option<Record>, ExError>;

    /// # Errors
    ///
    /// Returns an error if the class is unknown or the store fails.
    fn select(&self, class_name: &str, filter: &RecordFilter) -> Result<Vec<Record>, ExError>;

    /// Store a new record, assigning a single-column key when it is null
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or taken.
    fn insert(&mut self, record: &mut Record) -> Result<(), ExError>;

    /// # Errors
    ///
    /// Returns an error if the record was never stored.
    fn update(&mut self, record: &mut Record) -> Result<(), ExError>;

    /// # Errors
    ///
    /// Returns an error if the record was never stored.
    fn delete(&mut self, record: &Record) -> Result<(), ExError>;
}
