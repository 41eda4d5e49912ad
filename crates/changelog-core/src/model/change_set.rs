use crate::model::field_change::FieldChange;
use serde::{Deserialize, Serialize};

/// Ordered field → change mapping for one update
///
/// Order is the table's column order at diff time. Field names are unique;
/// inserting an existing field replaces it in place. Serialized as a JSON
/// array so the order survives storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<FieldChange>", into = "Vec<FieldChange>")]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a change, replacing any existing change for the same field
    pub fn insert(&mut self, change: FieldChange) {
        match self.changes.iter_mut().find(|c| c.field == change.field) {
            Some(existing) => *existing = change,
            None => self.changes.push(change),
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldChange> {
        let index = self.changes.iter().position(|c| c.field == field)?;
        Some(self.changes.remove(index))
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.field.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldChange> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn as_slice(&self) -> &[FieldChange] {
        &self.changes
    }

    pub fn into_vec(self) -> Vec<FieldChange> {
        self.changes
    }
}

impl From<Vec<FieldChange>> for ChangeSet {
    fn from(changes: Vec<FieldChange>) -> Self {
        changes.into_iter().collect()
    }
}

impl From<ChangeSet> for Vec<FieldChange> {
    fn from(set: ChangeSet) -> Self {
        set.changes
    }
}

impl FromIterator<FieldChange> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = FieldChange>>(iter: I) -> Self {
        let mut set = ChangeSet::new();
        for change in iter {
            set.insert(change);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a FieldChange;
    type IntoIter = std::slice::Iter<'a, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut set = ChangeSet::new();
        set.insert(FieldChange::new("title", "a", "b"));
        set.insert(FieldChange::new("price", 1, 2));
        set.insert(FieldChange::new("title", "a", "c"));

        assert_eq!(set.fields().collect::<Vec<_>>(), vec!["title", "price"]);
        assert_eq!(set.get("title").unwrap().new_value, "c");
    }

    #[test]
    fn test_serialized_order_is_preserved() {
        let set: ChangeSet = vec![
            FieldChange::new("zeta", "1", "2"),
            FieldChange::new("alpha", "1", "2"),
        ]
        .into();
        let json = serde_json::to_string(&set).unwrap();
        let decoded: ChangeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.fields().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_remove() {
        let mut set: ChangeSet = vec![FieldChange::new("title", "a", "b")].into();
        assert!(set.remove("title").is_some());
        assert!(set.is_empty());
        assert!(set.remove("title").is_none());
    }
}
