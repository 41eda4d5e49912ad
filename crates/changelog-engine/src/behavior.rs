//! Save and delete hooks.
//!
//! The host's store performs the writes; the behavior runs around them:
//!
//! 1. `pre_save` creates the entry (an insertion, or an update carrying the
//!    diff against the stored snapshot) and parks it on the session
//! 2. the store inserts or updates the record
//! 3. `post_save` completes the entry with the key the store assigned and
//!    appends it to the repository
//!
//! Deletions are logged in `post_delete`, after the store removed the row.
//! [`ChangeLogBehavior::save`] and [`ChangeLogBehavior::delete`] run the
//! whole sequence and drop the pending entry on every failure path.
//!
//! ## Logging Ownership
//!
//! `save`, `delete` and the retrieval API own lifecycle logging
//! (`log_op_start!` / `log_op_end!` / `log_op_error!`). The individual hooks
//! only use `tracing::debug!`.

#![allow(clippy::result_large_err)]

use crate::session::ChangeLogSession;
use changelog_core::errors::ChangeLogError;
use changelog_core::{
    log_op_end, log_op_error, log_op_start, ChangeLogConfig, ChangePayload, DiffEngine,
    EmptyUpdatePolicy, LogEntry, NormalizedPk, ObjectStore, Record, RenderEnv, SchemaRegistry,
    TableDescriptor,
};
use changelog_store::errors::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;

/// Column stamped with the insertion instant when left empty
const CREATED_AT_COLUMN: &str = "created_at";

/// What the store should do after `pre_save`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    Write,
    /// The update changed nothing worth logging and the configuration asks
    /// for it not to be written either
    Skip,
}

/// Change logging for every class of one schema
pub struct ChangeLogBehavior<R> {
    config: Arc<ChangeLogConfig>,
    registry: Arc<SchemaRegistry>,
    diff: DiffEngine,
    env: Arc<RenderEnv>,
    repo: R,
}

impl<R: changelog_core::ChangeLogRepository> ChangeLogBehavior<R> {
    pub fn new(config: Arc<ChangeLogConfig>, registry: Arc<SchemaRegistry>, repo: R) -> Self {
        Self {
            diff: DiffEngine::new(config.clone(), registry.clone()),
            env: Arc::new(RenderEnv::new(config.clone(), registry.clone())),
            config,
            registry,
            repo,
        }
    }

    /// Replace the diff engine, e.g. one with change set filters registered
    pub fn with_diff_engine(mut self, diff: DiffEngine) -> Self {
        self.diff = diff;
        self
    }

    /// Replace the render environment adapters are created with
    pub fn with_render_env(mut self, env: RenderEnv) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn config(&self) -> &ChangeLogConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn diff_engine(&self) -> &DiffEngine {
        &self.diff
    }

    pub fn render_env(&self) -> &Arc<RenderEnv> {
        &self.env
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn into_repo(self) -> R {
        self.repo
    }

    /// Explicit actor, else the request's actor, else the configured default
    pub fn resolve_actor(&self, session: &ChangeLogSession, explicit: Option<&str>) -> String {
        explicit
            .or(session.actor())
            .unwrap_or(self.config.username_cli.as_str())
            .to_string()
    }

    pub(crate) fn table_of(&self, record: &Record) -> Result<&TableDescriptor> {
        Ok(self.registry.require_table(record.class_name())?)
    }

    /// Normalized key of a record, `None` while the key is incomplete
    pub(crate) fn normalized_pk(&self, record: &Record) -> Result<Option<NormalizedPk>> {
        let table = self.table_of(record)?;
        match record.primary_key(table) {
            Some(pk) => Ok(Some(pk.normalize()?)),
            None => Ok(None),
        }
    }

    // ===== Hooks =====

    /// Build the pending entry for a record about to be written
    ///
    /// # Errors
    ///
    /// Returns `UnknownClass` for an unregistered class, or the store's
    /// error while loading the stored snapshot.
    pub fn pre_save<S: ObjectStore + ?Sized>(
        &self,
        session: &mut ChangeLogSession,
        store: &S,
        record: &mut Record,
    ) -> Result<SaveDecision> {
        let now = Utc::now();
        if record.is_new() {
            self.stamp_created_at(record, now)?;
            let entry = LogEntry::new(
                record.class_name(),
                self.normalized_pk(record)?,
                self.resolve_actor(session, None),
                now,
                &ChangePayload::Insertion,
            )?;
            session.stash(record.instance_id(), entry);
            return Ok(SaveDecision::Write);
        }

        let Some(changes) = self.diff.diff_for_update(store, record)? else {
            return Ok(SaveDecision::Write);
        };
        if changes.is_empty() {
            tracing::debug!(
                class_name = record.class_name(),
                policy = ?self.config.empty_update_policy,
                "empty change set, update not logged"
            );
            return Ok(match self.config.empty_update_policy {
                EmptyUpdatePolicy::Persist => SaveDecision::Write,
                EmptyUpdatePolicy::Skip => SaveDecision::Skip,
            });
        }

        let entry = LogEntry::new(
            record.class_name(),
            self.normalized_pk(record)?,
            self.resolve_actor(session, None),
            now,
            &ChangePayload::Update { changes },
        )?;
        session.stash(record.instance_id(), entry);
        Ok(SaveDecision::Write)
    }

    /// Persist the record's pending entry, if any
    ///
    /// # Errors
    ///
    /// Returns `MissingPrimaryKey` if the store left an inserted record
    /// without a key, or the repository's error.
    pub fn post_save(
        &mut self,
        session: &mut ChangeLogSession,
        record: &Record,
    ) -> Result<Option<LogEntry>> {
        let Some(mut entry) = session.take(record.instance_id()) else {
            return Ok(None);
        };
        if entry.object_pk().is_none() {
            let pk = self
                .normalized_pk(record)?
                .ok_or_else(|| ChangeLogError::MissingPrimaryKey {
                    class_name: record.class_name().to_string(),
                })?;
            entry.set_object_pk(pk)?;
        }
        self.repo.append(&mut entry)?;
        tracing::debug!(
            entry_id = ?entry.id(),
            class_name = entry.class_name(),
            operation = entry.operation_code(),
            "logged save"
        );
        Ok(Some(entry))
    }

    /// Log the deletion of a record the store just removed
    ///
    /// # Errors
    ///
    /// Returns `MissingPrimaryKey` if the record has no key, or the
    /// repository's error.
    pub fn post_delete(&mut self, session: &ChangeLogSession, record: &Record) -> Result<LogEntry> {
        let pk = self
            .normalized_pk(record)?
            .ok_or_else(|| ChangeLogError::MissingPrimaryKey {
                class_name: record.class_name().to_string(),
            })?;
        let mut entry = LogEntry::new(
            record.class_name(),
            Some(pk),
            self.resolve_actor(session, None),
            Utc::now(),
            &ChangePayload::Deletion,
        )?;
        self.repo.append(&mut entry)?;
        Ok(entry)
    }

    fn stamp_created_at(&self, record: &mut Record, now: DateTime<Utc>) -> Result<()> {
        if !self.config.stamp_created_at {
            return Ok(());
        }
        let table = self.table_of(record)?;
        if table.column(CREATED_AT_COLUMN).is_some() && record.value(CREATED_AT_COLUMN).is_null() {
            record.set(
                CREATED_AT_COLUMN,
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            );
        }
        Ok(())
    }

    // ===== Write sequences =====

    /// Insert or update a record and log the change
    ///
    /// Returns the persisted entry, or `None` when nothing was logged.
    ///
    /// # Errors
    ///
    /// Any hook or store error. The record's pending entry is dropped
    /// whenever an error is returned.
    pub fn save<S: ObjectStore + ?Sized>(
        &mut self,
        session: &mut ChangeLogSession,
        store: &mut S,
        record: &mut Record,
    ) -> Result<Option<LogEntry>> {
        log_op_start!(
            "save",
            class_name = record.class_name(),
            is_new = record.is_new()
        );
        let start = std::time::Instant::now();

        let result = self.save_impl(session, store, record).map_err(|e| {
            session.take(record.instance_id());
            log_op_error!(
                "save",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "save",
            duration_ms = start.elapsed().as_millis() as u64,
            entry_id = ?result.as_ref().and_then(LogEntry::id)
        );
        Ok(result)
    }

    fn save_impl<S: ObjectStore + ?Sized>(
        &mut self,
        session: &mut ChangeLogSession,
        store: &mut S,
        record: &mut Record,
    ) -> Result<Option<LogEntry>> {
        if self.pre_save(session, &*store, record)? == SaveDecision::Skip {
            return Ok(None);
        }
        if record.is_new() {
            store.insert(record)?;
        } else {
            store.update(record)?;
        }
        self.post_save(session, record)
    }

    /// Delete a record and log the deletion
    ///
    /// # Errors
    ///
    /// Any store or hook error.
    pub fn delete<S: ObjectStore + ?Sized>(
        &mut self,
        session: &ChangeLogSession,
        store: &mut S,
        record: &Record,
    ) -> Result<LogEntry> {
        log_op_start!("delete", class_name = record.class_name());
        let start = std::time::Instant::now();

        let result = store
            .delete(record)
            .and_then(|()| self.post_delete(session, record))
            .map_err(|e| {
                log_op_error!(
                    "delete",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                e
            })?;

        log_op_end!(
            "delete",
            duration_ms = start.elapsed().as_millis() as u64,
            entry_id = ?result.id()
        );
        Ok(result)
    }
}

impl<R> std::fmt::Debug for ChangeLogBehavior<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeLogBehavior")
            .field("config", &self.config)
            .field("diff", &self.diff)
            .finish_non_exhaustive()
    }
}
