use crate::model::{LogEntry, OperationKind};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOrder {
    /// Id ascending, the order entries were written in
    #[default]
    Persistence,
    /// Creation time ascending, ties broken by id
    Chronological,
    /// Creation time descending, ties broken by id descending
    ReverseChronological,
}

/// Filters for a change log query
///
/// Bounds: `after` is exclusive, `from` and `to` are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogCriteria {
    pub after: Option<DateTime<Utc>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub operation: Option<OperationKind>,
    pub order: LogOrder,
    pub limit: Option<usize>,
}

impl LogCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only entries created strictly after `instant`
    pub fn after(mut self, instant: DateTime<Utc>) -> Self {
        self.after = Some(instant);
        self
    }

    /// Only entries created within `[from, to]`
    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn operation(mut self, operation: OperationKind) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn order(mut self, order: LogOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        let created_at = entry.created_at();
        self.after.map_or(true, |after| created_at > after)
            && self.from.map_or(true, |from| created_at >= from)
            && self.to.map_or(true, |to| created_at <= to)
            && self.operation.map_or(true, |op| entry.is_operation(op))
    }

    pub fn compare(&self, a: &LogEntry, b: &LogEntry) -> Ordering {
        match self.order {
            LogOrder::Persistence => a.id().cmp(&b.id()),
            LogOrder::Chronological => a
                .created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(&b.id())),
            LogOrder::ReverseChronological => b
                .created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id())),
        }
    }

    /// Filter, order and truncate an unordered set of entries
    pub fn apply(&self, entries: impl IntoIterator<Item = LogEntry>) -> Vec<LogEntry> {
        let mut selected: Vec<LogEntry> = entries.into_iter().filter(|e| self.matches(e)).collect();
        selected.sort_by(|a, b| self.compare(a, b));
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(id: i64, code: i64, millis: i64) -> LogEntry {
        LogEntry::restore(id, code, "Book".into(), "1".into(), "cli".into(), millis, "{}".into())
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap()
    }

    #[test]
    fn test_after_is_exclusive_window_is_inclusive() {
        let entries = vec![entry(1, 1, 1000), entry(2, 2, 2000), entry(3, 2, 3000)];

        let after = LogCriteria::new().after(at(2000)).apply(entries.clone());
        assert_eq!(after.iter().map(|e| e.id()).collect::<Vec<_>>(), vec![Some(3)]);

        let window = LogCriteria::new()
            .between(Some(at(2000)), Some(at(3000)))
            .apply(entries);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_reverse_chronological_breaks_ties_by_id() {
        let entries = vec![entry(1, 2, 5000), entry(2, 2, 5000), entry(3, 2, 1000)];
        let ordered = LogCriteria::new()
            .order(LogOrder::ReverseChronological)
            .apply(entries);
        assert_eq!(
            ordered.iter().map(|e| e.id()).collect::<Vec<_>>(),
            vec![Some(2), Some(1), Some(3)]
        );
    }

    #[test]
    fn test_operation_filter_and_limit() {
        let entries = vec![entry(1, 1, 1), entry(2, 2, 2), entry(3, 2, 3), entry(4, 3, 4)];
        let updates = LogCriteria::new()
            .operation(OperationKind::Update)
            .limit(1)
            .apply(entries);
        assert_eq!(updates.iter().map(|e| e.id()).collect::<Vec<_>>(), vec![Some(2)]);
    }
}
