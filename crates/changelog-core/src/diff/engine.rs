//! Change set computation.
//!
//! [`DiffEngine::compute_change_set`] is the pure comparison;
//! [`DiffEngine::diff_for_update`] loads the stored snapshot, applies the
//! configured ignore list and runs the registered filters.

#![allow(clippy::result_large_err)]

use crate::config::ChangeLogConfig;
use crate::diff::filter::{ChangeSetFilter, ChangeSetFilters};
use crate::diff::temporal::format_value;
use crate::errors::ExError;
use crate::model::{ChangeSet, FieldChange, Record};
use crate::ops::ObjectStore;
use crate::schema::{ColumnType, SchemaRegistry, TableDescriptor};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct DiffEngine {
    config: Arc<ChangeLogConfig>,
    registry: Arc<SchemaRegistry>,
    filters: ChangeSetFilters,
}

impl DiffEngine {
    pub fn new(config: Arc<ChangeLogConfig>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            config,
            registry,
            filters: ChangeSetFilters::new(),
        }
    }

    /// Register a filter run on every table's change sets
    pub fn with_global_filter(mut self, filter: impl ChangeSetFilter + 'static) -> Self {
        self.filters.add_global(filter);
        self
    }

    /// Register a filter run on one table's change sets
    pub fn with_table_filter(
        mut self,
        table_name: impl Into<String>,
        filter: impl ChangeSetFilter + 'static,
    ) -> Self {
        self.filters.add_for_table(table_name, filter);
        self
    }

    pub fn config(&self) -> &ChangeLogConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Compare two states of the same object
    ///
    /// Walks the table's columns in order, skipping `ignore_fields`. A table
    /// declared without columns is compared over the union of both records'
    /// fields, in name order.
    pub fn compute_change_set(
        &self,
        stored: &Record,
        current: &Record,
        table: &TableDescriptor,
        ignore_fields: &[String],
    ) -> ChangeSet {
        let fields: Vec<(String, ColumnType, bool)> = if table.columns.is_empty() {
            stored
                .values()
                .keys()
                .chain(current.values().keys())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|f| (f.clone(), ColumnType::Other, false))
                .collect()
        } else {
            table
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.column_type, c.is_foreign_key()))
                .collect()
        };

        let mut changes = ChangeSet::new();
        for (field, column_type, foreign_key) in fields {
            if ignore_fields.contains(&field) {
                continue;
            }
            let raw_old = stored.value(&field);
            let raw_new = current.value(&field);
            let old_value = format_value(&raw_old, column_type, &self.config);
            let new_value = format_value(&raw_new, column_type, &self.config);
            if comparison_form(&old_value) == comparison_form(&new_value) {
                continue;
            }
            changes.insert(
                FieldChange::new(field, old_value, new_value)
                    .with_raw(raw_old, raw_new)
                    .with_column_type(column_type)
                    .with_foreign_key(foreign_key),
            );
        }
        changes
    }

    /// Diff a modified record against its stored snapshot
    ///
    /// `Ok(None)` means there is nothing to diff: the record has no key yet,
    /// no stored snapshot exists, or nothing was modified. An empty set means
    /// every modification was ignored or filtered away.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClass` if the record's class is not registered, or
    /// any error the store reports while loading the snapshot.
    pub fn diff_for_update<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        record: &Record,
    ) -> Result<Option<ChangeSet>, ExError> {
        let table = self.registry.require_table(record.class_name())?;
        if !record.is_modified() {
            return Ok(None);
        }
        let Some(pk) = record.primary_key(table) else {
            return Ok(None);
        };
        let Some(stored) = store.retrieve_by_pk(record.class_name(), &pk)? else {
            tracing::debug!(
                class_name = record.class_name(),
                "no stored snapshot, skipping diff"
            );
            return Ok(None);
        };

        let ignored = self.config.ignored_fields_for(record.class_name());
        let changes = self.compute_change_set(&stored, record, table, &ignored);
        Ok(Some(self.filters.apply(record, table, changes)))
    }
}

/// Values equal in text form are not a change (`1` vs `"1"`)
fn comparison_form(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        other => other.clone(),
    }
}

impl std::fmt::Debug for DiffEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffEngine")
            .field("filters", &self.filters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDescriptor;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn book_table() -> TableDescriptor {
        TableDescriptor::new("Book", "book")
            .with_column(ColumnDescriptor::new("id", ColumnType::Numeric))
            .with_column(ColumnDescriptor::new("title", ColumnType::Text))
            .with_column(ColumnDescriptor::new("published", ColumnType::Date))
            .with_column(ColumnDescriptor::new("updated_at", ColumnType::Timestamp))
    }

    fn engine() -> DiffEngine {
        DiffEngine::new(
            Arc::new(ChangeLogConfig::default()),
            Arc::new(SchemaRegistry::new().with_table(book_table())),
        )
    }

    fn stored(values: serde_json::Value) -> Record {
        let map: BTreeMap<String, Value> = serde_json::from_value(values).unwrap();
        Record::from_stored("Book", map)
    }

    #[test]
    fn test_changes_follow_column_order() {
        let before = stored(json!({"id": 1, "title": "Dune", "published": "1965-08-01"}));
        let after = stored(json!({"id": 1, "title": "Dune II", "published": "1965-08-02"}));
        let changes = engine().compute_change_set(&before, &after, &book_table(), &[]);

        assert_eq!(changes.fields().collect::<Vec<_>>(), vec!["title", "published"]);
        let published = changes.get("published").unwrap();
        assert_eq!(published.old_value, json!("1965/08/01"));
        assert_eq!(published.raw_old, json!("1965-08-01"));
    }

    #[test]
    fn test_same_instant_in_different_spelling_is_not_a_change() {
        let before = stored(json!({"published": "1965-08-01"}));
        let after = stored(json!({"published": "1965-08-01T00:00:00Z"}));
        let changes = engine().compute_change_set(&before, &after, &book_table(), &[]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_ignored_fields_are_skipped() {
        let before = stored(json!({"title": "a", "updated_at": "2024-01-01 00:00:00"}));
        let after = stored(json!({"title": "b", "updated_at": "2024-01-02 00:00:00"}));
        let changes = engine().compute_change_set(
            &before,
            &after,
            &book_table(),
            &["updated_at".to_string()],
        );
        assert_eq!(changes.fields().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn test_numeric_and_text_forms_compare_equal() {
        let before = stored(json!({"id": 1}));
        let after = stored(json!({"id": "1"}));
        assert!(engine()
            .compute_change_set(&before, &after, &book_table(), &[])
            .is_empty());
    }

    #[test]
    fn test_schemaless_table_uses_field_union() {
        let table = TableDescriptor::new("Note", "note");
        let before = Record::from_stored("Note", BTreeMap::new());
        let after = Record::new("Note").with("body", "hi").with("author", "x");
        let changes = engine().compute_change_set(&before, &after, &table, &[]);
        assert_eq!(changes.fields().collect::<Vec<_>>(), vec!["author", "body"]);
    }
}
