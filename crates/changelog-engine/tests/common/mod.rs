#![allow(dead_code)]

use changelog_core::errors::{ExError, ExErrorKind};
use changelog_core::queries::MemoryLogRepo;
use changelog_core::schema::{ColumnDescriptor, RelationDescriptor};
use changelog_core::{
    ChangeLogConfig, ColumnType, MemoryObjectStore, ObjectStore, PrimaryKey, Record, RecordFilter,
    SchemaRegistry, TableDescriptor,
};
use changelog_engine::ChangeLogBehavior;
use std::sync::Arc;

/// Author, Book, Tag and the Book-Tag association
pub fn bookstore() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_table(
            TableDescriptor::new("Author", "author")
                .with_display_field("name")
                .with_column(ColumnDescriptor::new("id", ColumnType::Numeric))
                .with_column(ColumnDescriptor::new("name", ColumnType::Text)),
        )
        .with_table(
            TableDescriptor::new("Book", "book")
                .with_display_name("book")
                .with_display_field("title")
                .with_column(ColumnDescriptor::new("id", ColumnType::Numeric))
                .with_column(ColumnDescriptor::new("title", ColumnType::Text))
                .with_column(
                    ColumnDescriptor::new("author_id", ColumnType::Numeric)
                        .references("Author", "id"),
                )
                .with_column(ColumnDescriptor::new("created_at", ColumnType::Timestamp))
                .with_column(ColumnDescriptor::new("updated_at", ColumnType::Timestamp))
                .with_relation(RelationDescriptor::many_to_many("tags", "BookTag", "Tag")),
        )
        .with_table(
            TableDescriptor::new("Tag", "tag")
                .with_display_field("label")
                .with_column(ColumnDescriptor::new("id", ColumnType::Numeric))
                .with_column(ColumnDescriptor::new("label", ColumnType::Text)),
        )
        .with_table(
            TableDescriptor::new("BookTag", "book_tag")
                .with_primary_key(&["book_id", "tag_id"])
                .with_column(
                    ColumnDescriptor::new("book_id", ColumnType::Numeric).references("Book", "id"),
                )
                .with_column(
                    ColumnDescriptor::new("tag_id", ColumnType::Numeric).references("Tag", "id"),
                ),
        )
}

pub fn setup_with(
    config: ChangeLogConfig,
    registry: SchemaRegistry,
) -> (ChangeLogBehavior<MemoryLogRepo>, MemoryObjectStore) {
    let registry = Arc::new(registry);
    (
        ChangeLogBehavior::new(Arc::new(config), registry.clone(), MemoryLogRepo::new()),
        MemoryObjectStore::new(registry),
    )
}

pub fn setup() -> (ChangeLogBehavior<MemoryLogRepo>, MemoryObjectStore) {
    setup_with(ChangeLogConfig::default(), bookstore())
}

/// Store that writes rows but never assigns keys
pub struct KeylessStore;

impl ObjectStore for KeylessStore {
    fn retrieve_by_pk(&self, _: &str, _: &PrimaryKey) -> Result<Option<Record>, ExError> {
        Ok(None)
    }

    fn select(&self, _: &str, _: &RecordFilter) -> Result<Vec<Record>, ExError> {
        Ok(Vec::new())
    }

    fn insert(&mut self, record: &mut Record) -> Result<(), ExError> {
        record.mark_saved();
        Ok(())
    }

    fn update(&mut self, record: &mut Record) -> Result<(), ExError> {
        record.mark_saved();
        Ok(())
    }

    fn delete(&mut self, _: &Record) -> Result<(), ExError> {
        Ok(())
    }
}

/// Reads from the wrapped store, rejects every update
pub struct ReadOnlyStore<'a>(pub &'a MemoryObjectStore);

impl ObjectStore for ReadOnlyStore<'_> {
    fn retrieve_by_pk(&self, class_name: &str, pk: &PrimaryKey) -> Result<Option<Record>, ExError> {
        self.0.retrieve_by_pk(class_name, pk)
    }

    fn select(&self, class_name: &str, filter: &RecordFilter) -> Result<Vec<Record>, ExError> {
        self.0.select(class_name, filter)
    }

    fn insert(&mut self, _: &mut Record) -> Result<(), ExError> {
        Err(ExError::new(ExErrorKind::Persistence).with_message("read-only store"))
    }

    fn update(&mut self, _: &mut Record) -> Result<(), ExError> {
        Err(ExError::new(ExErrorKind::Persistence).with_message("read-only store"))
    }

    fn delete(&mut self, _: &Record) -> Result<(), ExError> {
        Err(ExError::new(ExErrorKind::Persistence).with_message("read-only store"))
    }
}
