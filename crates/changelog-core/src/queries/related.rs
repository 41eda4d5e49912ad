//! Change history of objects related to a record.
//!
//! One-to-many: every foreign key column of the record's table leads to one
//! referenced object, and its history is filed under the referenced table's
//! display name. Many-to-many: every association relation of the record's
//! table leads to the objects linked through the association table; their
//! histories are filed per linked table, then per linked object. Objects
//! with no history are skipped.

#![allow(clippy::result_large_err)]

use crate::errors::{ChangeLogError, ExError};
use crate::model::{value_text, LogEntry, PrimaryKey, Record};
use crate::ops::{ObjectStore, RecordFilter};
use crate::queries::criteria::LogCriteria;
use crate::queries::repository::ChangeLogRepository;
use crate::schema::{SchemaRegistry, TableDescriptor};
use std::collections::{BTreeMap, BTreeSet};

/// Histories keyed by referenced table display name
pub type OneToManyChangeLog<T = LogEntry> = BTreeMap<String, Vec<T>>;

/// Histories keyed by linked table display name, then by linked object
pub type ManyToManyChangeLog<T = LogEntry> = BTreeMap<String, BTreeMap<String, Vec<T>>>;

/// Both traversals side by side
///
/// The two halves are never merged, so a linked object named like a
/// referenced table cannot shadow that table's history.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedChangeLog<T = LogEntry> {
    pub one_to_many: OneToManyChangeLog<T>,
    pub many_to_many: ManyToManyChangeLog<T>,
}

impl<T> Default for RelatedChangeLog<T> {
    fn default() -> Self {
        Self {
            one_to_many: BTreeMap::new(),
            many_to_many: BTreeMap::new(),
        }
    }
}

impl<T> RelatedChangeLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.history_count() == 0
    }

    /// Number of related objects or tables with a non-empty history
    pub fn history_count(&self) -> usize {
        self.one_to_many.len() + self.many_to_many.values().map(BTreeMap::len).sum::<usize>()
    }

    /// Transform every history, dropping the ones that come back empty
    pub fn map_histories<U>(self, mut f: impl FnMut(Vec<T>) -> Vec<U>) -> RelatedChangeLog<U> {
        let one_to_many = self
            .one_to_many
            .into_iter()
            .map(|(key, entries)| (key, f(entries)))
            .filter(|(_, entries)| !entries.is_empty())
            .collect();
        let many_to_many = self
            .many_to_many
            .into_iter()
            .map(|(table, objects)| {
                let objects: BTreeMap<String, Vec<U>> = objects
                    .into_iter()
                    .map(|(key, entries)| (key, f(entries)))
                    .filter(|(_, entries)| !entries.is_empty())
                    .collect();
                (table, objects)
            })
            .filter(|(_, objects)| !objects.is_empty())
            .collect();
        RelatedChangeLog {
            one_to_many,
            many_to_many,
        }
    }
}

/// Load the object `table.column == value` points at
fn resolve_reference<S: ObjectStore + ?Sized>(
    objects: &S,
    table: &TableDescriptor,
    column: &str,
    value: &str,
) -> Result<Option<Record>, ExError> {
    if table.primary_key.len() == 1 && table.primary_key[0] == column {
        return objects.retrieve_by_pk(&table.class_name, &PrimaryKey::single(value));
    }
    Ok(objects
        .select(&table.class_name, &RecordFilter::field_eq(column, value))?
        .into_iter()
        .next())
}

fn change_log_of<R: ChangeLogRepository + ?Sized>(
    repo: &R,
    record: &Record,
    table: &TableDescriptor,
    criteria: &LogCriteria,
) -> Result<Vec<LogEntry>, ExError> {
    let Some(pk) = record.primary_key(table) else {
        return Ok(Vec::new());
    };
    repo.change_log_for(&table.class_name, &pk.normalize()?, criteria)
}

/// History of the objects the record's foreign keys point at
///
/// Keyed by the referenced table's display name. Two foreign keys to the
/// same table share one key and their entries are concatenated.
///
/// # Errors
///
/// Returns `UnknownClass` for an unregistered class, or any store or
/// repository error.
pub fn one_to_many_related_change_log<S, R>(
    record: &Record,
    registry: &SchemaRegistry,
    objects: &S,
    repo: &R,
    criteria: &LogCriteria,
) -> Result<OneToManyChangeLog, ExError>
where
    S: ObjectStore + ?Sized,
    R: ChangeLogRepository + ?Sized,
{
    let table = registry.require_table(record.class_name())?;
    let mut related = OneToManyChangeLog::new();

    for column in table.foreign_key_columns() {
        let Some(fk) = column.foreign_key.as_ref() else {
            continue;
        };
        let value = value_text(&record.value(&column.name));
        if value.is_empty() {
            continue;
        }
        let target_table = registry.require_table(&fk.class_name)?;
        let Some(target) = resolve_reference(objects, target_table, &fk.column, &value)? else {
            continue;
        };
        let entries = change_log_of(repo, &target, target_table, criteria)?;
        if entries.is_empty() {
            continue;
        }
        related
            .entry(target_table.display_name().to_string())
            .or_default()
            .extend(entries);
    }

    Ok(related)
}

/// Key of a linked object within its table's map
///
/// The display string, else the normalized key. A display string already
/// taken by another object gets the key appended.
fn linked_key(
    linked: &BTreeMap<String, Vec<LogEntry>>,
    target: &Record,
    table: &TableDescriptor,
    pk: &str,
) -> String {
    let display = target.display_string(table);
    if display.is_empty() {
        pk.to_string()
    } else if linked.contains_key(&display) {
        format!("{display} ({pk})")
    } else {
        display
    }
}

/// History of the objects linked to the record through association tables
///
/// Keyed by the linked table's display name, then by the linked object's
/// display string. A registry without association metadata yields an empty
/// mapping.
///
/// # Errors
///
/// Returns `CompositeKeyUnsupported` if the record or a linked class has a
/// composite key, `UnknownClass` for an unregistered class, or any store or
/// repository error.
pub fn many_to_many_related_change_log<S, R>(
    record: &Record,
    registry: &SchemaRegistry,
    objects: &S,
    repo: &R,
    criteria: &LogCriteria,
) -> Result<ManyToManyChangeLog, ExError>
where
    S: ObjectStore + ?Sized,
    R: ChangeLogRepository + ?Sized,
{
    let mut related = ManyToManyChangeLog::new();
    if !registry.supports_many_to_many() {
        tracing::debug!(
            class_name = record.class_name(),
            "schema has no association metadata, skipping many-to-many history"
        );
        return Ok(related);
    }

    let table = registry.require_table(record.class_name())?;
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    for relation in &table.relations {
        if table.has_composite_key() {
            return Err(ChangeLogError::CompositeKeyUnsupported {
                class_name: table.class_name.clone(),
                relation: relation.name.clone(),
            }
            .into());
        }
        let association = registry.require_table(&relation.association_class)?;
        let foreign = registry.require_table(&relation.foreign_class)?;
        if foreign.has_composite_key() {
            return Err(ChangeLogError::CompositeKeyUnsupported {
                class_name: foreign.class_name.clone(),
                relation: relation.name.clone(),
            }
            .into());
        }

        // Self-referential associations point both columns at one class
        let back = association.column_referencing(&table.class_name);
        let forward = back.and_then(|back| {
            association
                .columns_referencing(&foreign.class_name)
                .find(|c| c.name != back.name)
        });
        let (Some(back), Some(forward)) = (back, forward) else {
            tracing::warn!(
                relation = relation.name.as_str(),
                association = association.class_name.as_str(),
                "association table lacks a foreign key to one side, skipping relation"
            );
            continue;
        };

        let Some(pk) = record.primary_key(table) else {
            return Ok(related);
        };
        let pk = pk.normalize()?;
        let links = objects.select(
            &association.class_name,
            &RecordFilter::field_eq(back.name.as_str(), pk.as_str()),
        )?;

        for link in links {
            let target_value = value_text(&link.value(&forward.name));
            if target_value.is_empty() {
                continue;
            }
            let target_column = forward
                .foreign_key
                .as_ref()
                .map(|fk| fk.column.as_str())
                .unwrap_or("id");
            let Some(target) = resolve_reference(objects, foreign, target_column, &target_value)?
            else {
                continue;
            };
            let Some(target_pk) = target.primary_key(foreign) else {
                continue;
            };
            let target_pk = target_pk.normalize()?;
            if !seen.insert((foreign.class_name.clone(), target_pk.as_str().to_string())) {
                continue;
            }
            let entries = repo.change_log_for(&foreign.class_name, &target_pk, criteria)?;
            if entries.is_empty() {
                continue;
            }
            let linked = related
                .entry(foreign.display_name().to_string())
                .or_default();
            let key = linked_key(linked, &target, foreign, target_pk.as_str());
            linked.insert(key, entries);
        }
    }

    Ok(related)
}

/// Both traversals for one record
///
/// # Errors
///
/// Same as the two traversals.
pub fn related_change_log<S, R>(
    record: &Record,
    registry: &SchemaRegistry,
    objects: &S,
    repo: &R,
    criteria: &LogCriteria,
) -> Result<RelatedChangeLog, ExError>
where
    S: ObjectStore + ?Sized,
    R: ChangeLogRepository + ?Sized,
{
    Ok(RelatedChangeLog {
        one_to_many: one_to_many_related_change_log(record, registry, objects, repo, criteria)?,
        many_to_many: many_to_many_related_change_log(record, registry, objects, repo, criteria)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use crate::model::{ChangePayload, NormalizedPk};
    use crate::ops::MemoryObjectStore;
    use crate::queries::MemoryLogRepo;
    use crate::schema::{ColumnDescriptor, ColumnType, RelationDescriptor};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .with_table(
                TableDescriptor::new("Author", "author")
                    .with_display_name("Writer")
                    .with_display_field("name")
                    .with_column(ColumnDescriptor::new("id", ColumnType::Numeric))
                    .with_column(ColumnDescriptor::new("name", ColumnType::Text)),
            )
            .with_table(
                TableDescriptor::new("Book", "book")
                    .with_column(ColumnDescriptor::new("id", ColumnType::Numeric))
                    .with_column(ColumnDescriptor::new("title", ColumnType::Text))
                    .with_column(
                        ColumnDescriptor::new("author_id", ColumnType::Numeric)
                            .references("Author", "id"),
                    )
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

    struct Fixture {
        registry: Arc<SchemaRegistry>,
        objects: MemoryObjectStore,
        repo: MemoryLogRepo,
        book: Record,
    }

    fn log(repo: &mut MemoryLogRepo, class_name: &str, pk: &str, payload: ChangePayload) {
        let mut entry = LogEntry::new(
            class_name,
            Some(NormalizedPk::from(pk)),
            "cli",
            Utc::now(),
            &payload,
        )
        .unwrap();
        repo.append(&mut entry).unwrap();
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(registry());
        let mut objects = MemoryObjectStore::new(registry.clone());
        let mut author = Record::new("Author").with("name", "Herbert");
        objects.insert(&mut author).unwrap();
        let mut book = Record::new("Book").with("title", "Dune").with("author_id", 1);
        objects.insert(&mut book).unwrap();
        for label in ["scifi", "classic", "quiet"] {
            let mut tag = Record::new("Tag").with("label", label);
            objects.insert(&mut tag).unwrap();
        }
        for tag_id in [1, 2, 3] {
            let mut link = Record::new("BookTag").with("book_id", 1).with("tag_id", tag_id);
            objects.insert(&mut link).unwrap();
        }

        let mut repo = MemoryLogRepo::new();
        log(&mut repo, "Author", "1", ChangePayload::Insertion);
        log(&mut repo, "Tag", "1", ChangePayload::Insertion);
        log(
            &mut repo,
            "Tag",
            "2",
            ChangePayload::CustomMessage {
                message: "renamed".to_string(),
            },
        );
        Fixture {
            registry,
            objects,
            repo,
            book,
        }
    }

    #[test]
    fn test_one_to_many_keys_by_display_name() {
        let f = fixture();
        let related = one_to_many_related_change_log(
            &f.book,
            &f.registry,
            &f.objects,
            &f.repo,
            &LogCriteria::new(),
        )
        .unwrap();
        assert_eq!(related.keys().collect::<Vec<_>>(), vec!["Writer"]);
        assert_eq!(related["Writer"].len(), 1);
    }

    #[test]
    fn test_null_foreign_key_is_skipped() {
        let f = fixture();
        let orphan = Record::new("Book").with("id", 9).with("title", "Loose");
        let related = one_to_many_related_change_log(
            &orphan,
            &f.registry,
            &f.objects,
            &f.repo,
            &LogCriteria::new(),
        )
        .unwrap();
        assert!(related.is_empty());
    }

    #[test]
    fn test_many_to_many_skips_objects_without_history() {
        let f = fixture();
        let related = many_to_many_related_change_log(
            &f.book,
            &f.registry,
            &f.objects,
            &f.repo,
            &LogCriteria::new(),
        )
        .unwrap();
        assert_eq!(related.keys().collect::<Vec<_>>(), vec!["Tag"]);
        assert_eq!(
            related["Tag"].keys().collect::<Vec<_>>(),
            vec!["classic", "scifi"]
        );
    }

    #[test]
    fn test_colliding_names_keep_every_history() {
        let registry = Arc::new(registry());
        let mut objects = MemoryObjectStore::new(registry.clone());
        let mut author = Record::new("Author").with("name", "Herbert");
        objects.insert(&mut author).unwrap();
        let mut book = Record::new("Book").with("title", "Dune").with("author_id", 1);
        objects.insert(&mut book).unwrap();
        for label in ["Writer", "dup", "dup"] {
            let mut tag = Record::new("Tag").with("label", label);
            objects.insert(&mut tag).unwrap();
        }
        let mut repo = MemoryLogRepo::new();
        log(&mut repo, "Author", "1", ChangePayload::Insertion);
        for tag_id in [1, 2, 3] {
            let mut link = Record::new("BookTag").with("book_id", 1).with("tag_id", tag_id);
            objects.insert(&mut link).unwrap();
            log(&mut repo, "Tag", &tag_id.to_string(), ChangePayload::Insertion);
        }

        let related =
            related_change_log(&book, &registry, &objects, &repo, &LogCriteria::new()).unwrap();

        assert_eq!(related.history_count(), 4);
        assert_eq!(related.one_to_many["Writer"][0].class_name(), "Author");
        let tags = &related.many_to_many["Tag"];
        assert_eq!(
            tags.keys().collect::<Vec<_>>(),
            vec!["Writer", "dup", "dup (3)"]
        );
        assert_eq!(tags["dup"][0].object_pk().unwrap().as_str(), "2");
        assert_eq!(tags["dup (3)"][0].object_pk().unwrap().as_str(), "3");
    }

    #[test]
    fn test_self_referential_association_follows_the_other_column() {
        let registry = Arc::new(
            SchemaRegistry::new()
                .with_table(
                    TableDescriptor::new("Person", "person")
                        .with_display_field("name")
                        .with_column(ColumnDescriptor::new("id", ColumnType::Numeric))
                        .with_column(ColumnDescriptor::new("name", ColumnType::Text))
                        .with_relation(RelationDescriptor::many_to_many(
                            "friends",
                            "Friendship",
                            "Person",
                        )),
                )
                .with_table(
                    TableDescriptor::new("Friendship", "friendship")
                        .with_primary_key(&["person_id", "friend_id"])
                        .with_column(
                            ColumnDescriptor::new("person_id", ColumnType::Numeric)
                                .references("Person", "id"),
                        )
                        .with_column(
                            ColumnDescriptor::new("friend_id", ColumnType::Numeric)
                                .references("Person", "id"),
                        ),
                ),
        );
        let mut objects = MemoryObjectStore::new(registry.clone());
        let mut alice = Record::new("Person").with("name", "alice");
        objects.insert(&mut alice).unwrap();
        let mut bob = Record::new("Person").with("name", "bob");
        objects.insert(&mut bob).unwrap();
        let mut link = Record::new("Friendship")
            .with("person_id", 1)
            .with("friend_id", 2);
        objects.insert(&mut link).unwrap();

        let mut repo = MemoryLogRepo::new();
        log(&mut repo, "Person", "1", ChangePayload::Insertion);
        log(&mut repo, "Person", "2", ChangePayload::Insertion);

        let related =
            many_to_many_related_change_log(&alice, &registry, &objects, &repo, &LogCriteria::new())
                .unwrap();
        assert_eq!(
            related["Person"].keys().collect::<Vec<_>>(),
            vec!["bob"]
        );
        assert_eq!(related["Person"]["bob"][0].object_pk().unwrap().as_str(), "2");
    }

    #[test]
    fn test_many_to_many_needs_association_metadata() {
        let f = fixture();
        let registry = registry().without_many_to_many();
        let related = many_to_many_related_change_log(
            &f.book,
            &registry,
            &f.objects,
            &f.repo,
            &LogCriteria::new(),
        )
        .unwrap();
        assert!(related.is_empty());
    }

    #[test]
    fn test_composite_key_record_is_rejected() {
        let f = fixture();
        let registry = SchemaRegistry::new()
            .with_table(
                TableDescriptor::new("Edition", "edition")
                    .with_primary_key(&["book_id", "number"])
                    .with_relation(RelationDescriptor::many_to_many("tags", "BookTag", "Tag")),
            )
            .with_table(TableDescriptor::new("Tag", "tag"))
            .with_table(TableDescriptor::new("BookTag", "book_tag"));
        let edition = Record::new("Edition").with("book_id", 1).with("number", 2);
        let err = many_to_many_related_change_log(
            &edition,
            &registry,
            &f.objects,
            &f.repo,
            &LogCriteria::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::CompositeKeyUnsupported);
    }

    #[test]
    fn test_union_and_time_filter() {
        let f = fixture();
        let all = related_change_log(&f.book, &f.registry, &f.objects, &f.repo, &LogCriteria::new())
            .unwrap();
        assert_eq!(all.history_count(), 3);
        assert_eq!(all.one_to_many.keys().collect::<Vec<_>>(), vec!["Writer"]);

        let later = LogCriteria::new().after(Utc::now() + Duration::hours(1));
        let none = related_change_log(&f.book, &f.registry, &f.objects, &f.repo, &later).unwrap();
        assert!(none.is_empty());
    }
}
