use crate::model::{ChangeSet, Record};
use crate::schema::TableDescriptor;
use std::collections::HashMap;

/// Post-processing hook over a computed change set
///
/// The returned set replaces the input entirely. Filters may add synthetic
/// fields, drop fields, or return an empty set to suppress logging.
pub trait ChangeSetFilter {
    fn filter(&self, record: &Record, table: &TableDescriptor, changes: ChangeSet) -> ChangeSet;
}

impl<F> ChangeSetFilter for F
where
    F: Fn(&Record, &TableDescriptor, ChangeSet) -> ChangeSet,
{
    fn filter(&self, record: &Record, table: &TableDescriptor, changes: ChangeSet) -> ChangeSet {
        self(record, table, changes)
    }
}

/// Registered filters: global ones first, then the table's own
#[derive(Default)]
pub struct ChangeSetFilters {
    global: Vec<Box<dyn ChangeSetFilter>>,
    per_table: HashMap<String, Vec<Box<dyn ChangeSetFilter>>>,
}

impl ChangeSetFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global(&mut self, filter: impl ChangeSetFilter + 'static) {
        self.global.push(Box::new(filter));
    }

    pub fn add_for_table(&mut self, table_name: impl Into<String>, filter: impl ChangeSetFilter + 'static) {
        self.per_table
            .entry(table_name.into())
            .or_default()
            .push(Box::new(filter));
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.per_table.values().all(Vec::is_empty)
    }

    pub fn apply(&self, record: &Record, table: &TableDescriptor, changes: ChangeSet) -> ChangeSet {
        let table_filters = self
            .per_table
            .get(&table.table_name)
            .into_iter()
            .flatten();
        self.global
            .iter()
            .chain(table_filters)
            .fold(changes, |acc, f| f.filter(record, table, acc))
    }
}

impl std::fmt::Debug for ChangeSetFilters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSetFilters")
            .field("global", &self.global.len())
            .field("per_table", &self.per_table.keys().collect::<Vec<_>>())
            .finish()
    }
}
