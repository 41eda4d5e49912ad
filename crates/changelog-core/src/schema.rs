//! Schema registry
//!
//! Table, column and relation metadata for every tracked class. The registry
//! is built once at startup, in code or from a TOML document, and is the only
//! source the diff, render and query layers consult for column types, foreign
//! keys and association tables.

#![allow(clippy::result_large_err)]

use crate::errors::{ChangeLogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Column type as far as diffing and rendering care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Numeric,
    Boolean,
    Date,
    Time,
    Timestamp,
    Binary,
    #[default]
    Other,
}

impl ColumnType {
    /// Date, time and timestamp columns compare through formatted strings
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::Time | ColumnType::Timestamp
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Numeric => "numeric",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Binary => "binary",
            ColumnType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub class_name: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(default)]
    pub column_type: ColumnType,
    /// Human readable name used when rendering changes
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub foreign_key: Option<ForeignKeyRef>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            label: None,
            foreign_key: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Mark the column as a foreign key to `class_name.column`
    pub fn references(mut self, class_name: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef {
            class_name: class_name.into(),
            column: column.into(),
        });
        self
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ManyToMany,
}

/// A relation reached through an association class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub name: String,
    pub kind: RelationKind,
    /// Class of the association (cross-reference) table
    pub association_class: String,
    /// Class on the far side of the association
    pub foreign_class: String,
}

impl RelationDescriptor {
    pub fn many_to_many(
        name: impl Into<String>,
        association_class: impl Into<String>,
        foreign_class: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ManyToMany,
            association_class: association_class.into(),
            foreign_class: foreign_class.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub class_name: String,
    pub table_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub primary_key: Vec<String>,
    /// Column whose value identifies an object to a human
    #[serde(default)]
    pub display_field: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub relations: Vec<RelationDescriptor>,
}

impl TableDescriptor {
    /// A table with a single `id` primary key column
    pub fn new(class_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            table_name: table_name.into(),
            display_name: None,
            primary_key: vec!["id".to_string()],
            display_field: None,
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_display_field(mut self, field: impl Into<String>) -> Self {
        self.display_field = Some(field.into());
        self
    }

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    /// Display name, falling back to the class name
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.class_name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_type(&self, name: &str) -> ColumnType {
        self.column(name)
            .map(|c| c.column_type)
            .unwrap_or_default()
    }

    pub fn has_composite_key(&self) -> bool {
        self.primary_key.len() > 1
    }

    pub fn foreign_key_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_foreign_key())
    }

    /// Foreign key columns pointing at `class_name`, in declaration order
    pub fn columns_referencing<'a, 'b>(
        &'a self,
        class_name: &'b str,
    ) -> impl Iterator<Item = &'a ColumnDescriptor> + 'b
    where
        'a: 'b,
    {
        self.foreign_key_columns().filter(move |c| {
            c.foreign_key
                .as_ref()
                .is_some_and(|fk| fk.class_name == class_name)
        })
    }

    /// First foreign key column pointing at `class_name`
    pub fn column_referencing(&self, class_name: &str) -> Option<&ColumnDescriptor> {
        self.columns_referencing(class_name).next()
    }
}

/// On-disk form of a registry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDocument {
    #[serde(default = "default_many_to_many")]
    many_to_many: bool,
    #[serde(default)]
    tables: Vec<TableDescriptor>,
}

fn default_many_to_many() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, TableDescriptor>,
    many_to_many: bool,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            many_to_many: true,
        }
    }

    /// Builder form of [`SchemaRegistry::register`]
    pub fn with_table(mut self, table: TableDescriptor) -> Self {
        self.register(table);
        self
    }

    /// Model a schema without association metadata
    pub fn without_many_to_many(mut self) -> Self {
        self.many_to_many = false;
        self
    }

    /// Add or replace the descriptor for a class
    pub fn register(&mut self, table: TableDescriptor) {
        self.tables.insert(table.class_name.clone(), table);
    }

    pub fn table(&self, class_name: &str) -> Option<&TableDescriptor> {
        self.tables.get(class_name)
    }

    /// # Errors
    ///
    /// Returns `UnknownClass` if the class is not registered.
    pub fn require_table(&self, class_name: &str) -> Result<&TableDescriptor> {
        self.table(class_name)
            .ok_or_else(|| ChangeLogError::UnknownClass {
                class_name: class_name.to_string(),
            })
    }

    /// Look a class up by its table name
    pub fn table_by_name(&self, table_name: &str) -> Option<&TableDescriptor> {
        self.tables.values().find(|t| t.table_name == table_name)
    }

    /// # Errors
    ///
    /// Returns `UnknownClass` if the class is not registered.
    pub fn columns_of(&self, class_name: &str) -> Result<&[ColumnDescriptor]> {
        Ok(&self.require_table(class_name)?.columns)
    }

    /// # Errors
    ///
    /// Returns `UnknownClass` if the class is not registered.
    pub fn relations_of(&self, class_name: &str) -> Result<&[RelationDescriptor]> {
        Ok(&self.require_table(class_name)?.relations)
    }

    pub fn supports_many_to_many(&self) -> bool {
        self.many_to_many
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// # Errors
    ///
    /// Returns `Config` if the document is not a valid schema.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: SchemaDocument =
            toml::from_str(content).map_err(|e| ChangeLogError::Config {
                message: format!("invalid schema: {}", e),
            })?;
        let mut registry = Self::new();
        registry.many_to_many = document.many_to_many;
        for table in document.tables {
            if table.primary_key.is_empty() {
                return Err(ChangeLogError::Config {
                    message: format!("table {} has no primary key", table.class_name),
                });
            }
            registry.register(table);
        }
        Ok(registry)
    }
}

/// Load a schema registry from a TOML file
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, `Config` if it cannot be
/// parsed.
pub fn load_schema(path: &Path) -> Result<SchemaRegistry> {
    let content = std::fs::read_to_string(path).map_err(|e| ChangeLogError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    SchemaRegistry::from_toml_str(&content)
}
