//! Request-scoped engine state
//!
//! A session carries the caller's [`RequestContext`] and the log entries
//! created in pre-save that wait for their post-save. An entry is keyed by
//! the in-memory identity of the record it belongs to and leaves the map on
//! post-save, on any failure of the save sequence, or on [`ChangeLogSession::clear`].

use changelog_core::{InstanceId, LogEntry};
use changelog_core_types::RequestContext;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ChangeLogSession {
    context: RequestContext,
    pending: HashMap<InstanceId, LogEntry>,
}

impl ChangeLogSession {
    pub fn new(context: RequestContext) -> Self {
        Self {
            context,
            pending: HashMap::new(),
        }
    }

    /// A session acting for `actor`
    pub fn for_actor(actor: impl Into<String>) -> Self {
        Self::new(RequestContext::new().with_actor(actor))
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn actor(&self) -> Option<&str> {
        self.context.actor()
    }

    pub fn has_pending(&self, instance_id: InstanceId) -> bool {
        self.pending.contains_key(&instance_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop every pending entry
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(
                request_id = %self.context.request_id,
                pending = self.pending.len(),
                "discarding pending log entries"
            );
        }
        self.pending.clear();
    }

    pub(crate) fn stash(&mut self, instance_id: InstanceId, entry: LogEntry) {
        self.pending.insert(instance_id, entry);
    }

    pub(crate) fn take(&mut self, instance_id: InstanceId) -> Option<LogEntry> {
        self.pending.remove(&instance_id)
    }
}
