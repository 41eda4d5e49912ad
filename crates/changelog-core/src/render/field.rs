//! Per-field value rendering hooks.

use crate::model::{PrimaryKey, Record};
use crate::ops::ObjectStore;
use crate::schema::{ColumnType, SchemaRegistry};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// What a field render hook is told about the value it receives
#[derive(Debug, Clone, Copy)]
pub struct FieldRenderContext<'a> {
    pub class_name: &'a str,
    pub table_name: &'a str,
    pub field_name: &'a str,
    pub column_type: ColumnType,
}

type FieldRenderHook = Box<dyn Fn(&FieldRenderContext<'_>, Value) -> Value>;

/// Value rewriting hooks run before a field value is rendered
///
/// Global hooks run first, in registration order, then the hook registered
/// for the exact `table.field`. A field with its own hook is considered
/// handled and skips foreign value resolution.
#[derive(Default)]
pub struct FieldHooks {
    global: Vec<FieldRenderHook>,
    per_field: HashMap<(String, String), FieldRenderHook>,
}

impl FieldHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global<F>(&mut self, hook: F)
    where
        F: Fn(&FieldRenderContext<'_>, Value) -> Value + 'static,
    {
        self.global.push(Box::new(hook));
    }

    /// Replaces any hook already registered for the field
    pub fn add_for_field<F>(&mut self, table_name: impl Into<String>, field_name: impl Into<String>, hook: F)
    where
        F: Fn(&FieldRenderContext<'_>, Value) -> Value + 'static,
    {
        self.per_field
            .insert((table_name.into(), field_name.into()), Box::new(hook));
    }

    /// Run the hooks; the flag reports whether a field hook handled the value
    pub fn run(&self, ctx: &FieldRenderContext<'_>, value: Value) -> (Value, bool) {
        let value = self.global.iter().fold(value, |acc, hook| hook(ctx, acc));
        let key = (ctx.table_name.to_string(), ctx.field_name.to_string());
        match self.per_field.get(&key) {
            Some(hook) => (hook(ctx, value), true),
            None => (value, false),
        }
    }
}

impl std::fmt::Debug for FieldHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldHooks")
            .field("global", &self.global.len())
            .field("per_field", &self.per_field.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolves a foreign key value to the referenced object's display string
pub trait ForeignValueResolver {
    fn display_value(&self, class_name: &str, key: &str) -> Option<String>;
}

impl<F> ForeignValueResolver for F
where
    F: Fn(&str, &str) -> Option<String>,
{
    fn display_value(&self, class_name: &str, key: &str) -> Option<String> {
        self(class_name, key)
    }
}

/// Resolver reading referenced objects from an object store
pub struct StoreDisplayResolver<S> {
    store: S,
    registry: Arc<SchemaRegistry>,
}

impl<S: ObjectStore> StoreDisplayResolver<S> {
    pub fn new(store: S, registry: Arc<SchemaRegistry>) -> Self {
        Self { store, registry }
    }
}

impl<S: ObjectStore> ForeignValueResolver for StoreDisplayResolver<S> {
    fn display_value(&self, class_name: &str, key: &str) -> Option<String> {
        let table = self.registry.table(class_name)?;
        let pk = PrimaryKey::from_normalized(&key.into(), table.primary_key.len());
        let record: Record = self.store.retrieve_by_pk(class_name, &pk).ok()??;
        Some(record.display_string(table))
    }
}
