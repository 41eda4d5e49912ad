#![allow(clippy::result_large_err)]

use crate::errors::{ChangeLogError, ExError, ExErrorKind};
use crate::model::{NormalizedPk, PrimaryKey, Record};
use crate::ops::object_store::{ObjectStore, RecordFilter};
use crate::schema::{SchemaRegistry, TableDescriptor};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type Row = BTreeMap<String, Value>;

/// In-memory object store
///
/// HashMap-based, single-threaded. Single-column keys left null on insert
/// get the next value of a per-class counter.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    registry: Arc<SchemaRegistry>,
    rows: HashMap<String, BTreeMap<NormalizedPk, Row>>,
    counters: HashMap<String, i64>,
}

impl MemoryObjectStore {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            rows: HashMap::new(),
            counters: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Number of stored objects of a class
    pub fn count(&self, class_name: &str) -> usize {
        self.rows.get(class_name).map_or(0, BTreeMap::len)
    }

    fn table(&self, class_name: &str) -> Result<&TableDescriptor, ExError> {
        Ok(self.registry.require_table(class_name)?)
    }

    fn key_of(table: &TableDescriptor, record: &Record) -> Result<NormalizedPk, ExError> {
        let pk = record
            .primary_key(table)
            .ok_or_else(|| ChangeLogError::MissingPrimaryKey {
                class_name: table.class_name.clone(),
            })?;
        Ok(pk.normalize()?)
    }

    /// Id the next keyless insert of `class_name` receives
    fn peek_id(&self, class_name: &str) -> i64 {
        self.counters.get(class_name).copied().unwrap_or(0) + 1
    }

    /// Keep the counter ahead of explicitly supplied numeric keys
    fn observe_id(&mut self, class_name: &str, key: &NormalizedPk) {
        if let Ok(id) = key.as_str().parse::<i64>() {
            let counter = self.counters.entry(class_name.to_string()).or_insert(0);
            *counter = (*counter).max(id);
        }
    }
}

impl ObjectStore for MemoryObjectStore {
    fn retrieve_by_pk(&self, class_name: &str, pk: &PrimaryKey) -> Result<Option<Record>, ExError> {
        let key = pk.normalize()?;
        Ok(self
            .rows
            .get(class_name)
            .and_then(|rows| rows.get(&key))
            .map(|row| Record::from_stored(class_name, row.clone())))
    }

    fn select(&self, class_name: &str, filter: &RecordFilter) -> Result<Vec<Record>, ExError> {
        self.table(class_name)?;
        Ok(self
            .rows
            .get(class_name)
            .into_iter()
            .flat_map(|rows| rows.values())
            .map(|row| Record::from_stored(class_name, row.clone()))
            .filter(|record| filter.matches(record))
            .collect())
    }

    fn insert(&mut self, record: &mut Record) -> Result<(), ExError> {
        let table = self.table(record.class_name())?.clone();
        let assigned = (table.primary_key.len() == 1 && record.primary_key(&table).is_none())
            .then(|| self.peek_id(&table.class_name));
        let key = match assigned {
            Some(id) => PrimaryKey::single(id.to_string()).normalize()?,
            None => Self::key_of(&table, record)?,
        };
        if self
            .rows
            .get(&table.class_name)
            .is_some_and(|rows| rows.contains_key(&key))
        {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("insert")
                .with_entity_id(format!("{}#{}", table.class_name, key))
                .with_message("duplicate primary key"));
        }

        if let Some(id) = assigned {
            record.set(table.primary_key[0].clone(), id);
        }
        self.observe_id(&table.class_name, &key);
        self.rows
            .entry(table.class_name.clone())
            .or_default()
            .insert(key, record.values().clone());
        record.mark_saved();
        Ok(())
    }

    fn update(&mut self, record: &mut Record) -> Result<(), ExError> {
        let table = self.table(record.class_name())?;
        let key = Self::key_of(table, record)?;
        let row = self
            .rows
            .get_mut(record.class_name())
            .and_then(|rows| rows.get_mut(&key))
            .ok_or_else(|| {
                ExError::new(ExErrorKind::NotFound)
                    .with_op("update")
                    .with_entity_id(format!("{}#{}", record.class_name(), key))
                    .with_message("record was never stored")
            })?;
        *row = record.values().clone();
        record.mark_saved();
        Ok(())
    }

    fn delete(&mut self, record: &Record) -> Result<(), ExError> {
        let table = self.table(record.class_name())?;
        let key = Self::key_of(table, record)?;
        self.rows
            .get_mut(record.class_name())
            .and_then(|rows| rows.remove(&key))
            .map(|_| ())
            .ok_or_else(|| {
                ExError::new(ExErrorKind::NotFound)
                    .with_op("delete")
                    .with_entity_id(format!("{}#{}", record.class_name(), key))
                    .with_message("record was never stored")
            })
    }
}
