use changelog_core::schema::{ColumnDescriptor, RelationDescriptor};
use changelog_core::{
    ChangeLogConfig, ChangePayload, ColumnType, LogEntry, NormalizedPk, RenderEnv, SchemaRegistry,
    TableDescriptor,
};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

/// Author, Book, Tag and the Book-Tag association
#[allow(dead_code)]
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
                .with_column(ColumnDescriptor::new("title", ColumnType::Text).with_label("Title"))
                .with_column(ColumnDescriptor::new("published", ColumnType::Date))
                .with_column(ColumnDescriptor::new("in_print", ColumnType::Boolean))
                .with_column(
                    ColumnDescriptor::new("author_id", ColumnType::Numeric)
                        .references("Author", "id"),
                )
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

#[allow(dead_code)]
pub fn render_env(config: ChangeLogConfig) -> Arc<RenderEnv> {
    Arc::new(RenderEnv::new(Arc::new(config), Arc::new(bookstore())))
}

/// 2024-03-01 12:30:00 UTC
#[allow(dead_code)]
pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
}

/// A persisted Book entry created at [`fixed_instant`]
#[allow(dead_code)]
pub fn book_entry(pk: &str, payload: &ChangePayload) -> LogEntry {
    let mut entry = LogEntry::new(
        "Book",
        Some(NormalizedPk::from(pk)),
        "alice",
        fixed_instant(),
        payload,
    )
    .unwrap();
    entry.mark_persisted(1).unwrap();
    entry
}
