//! Per-trigger-kind persistence contract.
//!
//! The store engine owns the base trigger row and the transaction. Everything
//! a trigger kind stores beyond the base row lives in that kind's extension
//! table and goes through its [`TriggerPersistenceDelegate`].

use std::{fmt, sync::Arc};

use {async_trait::async_trait, cadence_config::JobStoreConfig, sqlx::SqliteConnection};

use crate::{
    Error, Result,
    bundle::TriggerPropertyBundle,
    command::{Command, CommandAccessor},
    job::JobDetail,
    key::TriggerKey,
    sql::{replace_table_prefix, scheduler_name_literal},
    trigger::{Trigger, TriggerKindTag, TriggerState},
};

/// Configuration every delegate is built from.
///
/// Holds the table prefix, the quoted scheduler-name literal and the command
/// accessor. Immutable once built, so delegates sharing it are `Send + Sync`.
#[derive(Clone)]
pub struct DelegateContext {
    table_prefix: String,
    scheduler_name: String,
    sched_name_literal: String,
    command_accessor: Arc<dyn CommandAccessor>,
}

impl DelegateContext {
    /// Fails if the prefix is not a plain SQL identifier fragment or the
    /// scheduler name is empty, since both are spliced into statement text.
    pub fn new(
        table_prefix: impl Into<String>,
        scheduler_name: impl Into<String>,
        command_accessor: Arc<dyn CommandAccessor>,
    ) -> Result<Self> {
        let table_prefix = table_prefix.into();
        let scheduler_name = scheduler_name.into();
        cadence_config::validate::validate_table_prefix(&table_prefix)?;
        cadence_config::validate::validate_scheduler_name(&scheduler_name)?;

        Ok(Self {
            sched_name_literal: scheduler_name_literal(&scheduler_name),
            table_prefix,
            scheduler_name,
            command_accessor,
        })
    }

    pub fn from_config(
        config: &JobStoreConfig,
        command_accessor: Arc<dyn CommandAccessor>,
    ) -> Result<Self> {
        Self::new(
            config.table_prefix.clone(),
            config.scheduler_name.clone(),
            command_accessor,
        )
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn scheduler_name(&self) -> &str {
        &self.scheduler_name
    }

    pub fn command_accessor(&self) -> &dyn CommandAccessor {
        self.command_accessor.as_ref()
    }

    /// Resolve a statement template for this scheduler.
    pub fn statement(&self, template: &str) -> String {
        replace_table_prefix(template, &self.table_prefix, &self.sched_name_literal)
    }

    /// Prepare `template` with the key parameters every extension statement uses.
    pub(crate) fn keyed_command(&self, template: &str, key: &TriggerKey) -> Command {
        let accessor = self.command_accessor();
        let mut command = accessor.prepare_command(self.statement(template));
        accessor.add_command_parameter(&mut command, "triggerName", key.name().into());
        accessor.add_command_parameter(&mut command, "triggerGroup", key.group().into());
        command
    }

    pub(crate) async fn execute_keyed(
        &self,
        conn: &mut SqliteConnection,
        template: &str,
        key: &TriggerKey,
    ) -> Result<u64> {
        let command = self.keyed_command(template, key);
        self.command_accessor().execute_non_query(conn, command).await
    }
}

impl fmt::Debug for DelegateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateContext")
            .field("table_prefix", &self.table_prefix)
            .field("scheduler_name", &self.scheduler_name)
            .finish_non_exhaustive()
    }
}

/// Persists the kind-specific part of a trigger in its extension table.
///
/// Construction plays the role of one-time initialization: implementations
/// take a [`DelegateContext`] and are immutable afterwards. All operations run
/// on the caller's connection, inside the caller's transaction.
#[async_trait]
pub trait TriggerPersistenceDelegate: Send + Sync {
    /// Tag stored in the base trigger row for triggers this delegate owns.
    fn handled_discriminator(&self) -> &'static str;

    /// Trigger kinds this delegate persists.
    fn handled_kinds(&self) -> &'static [TriggerKindTag];

    /// Write-path selection. False for triggers carrying properties outside
    /// the kind's fixed schema.
    fn can_handle_trigger_type(&self, trigger: &Trigger) -> bool;

    /// Remove the extension row. Zero affected rows is not an error.
    async fn delete_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<u64>;

    /// Insert the extension row. A duplicate key surfaces as the database's
    /// constraint error.
    async fn insert_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        state: TriggerState,
        job_detail: &JobDetail,
    ) -> Result<u64>;

    /// Update the extension row's mutable columns. Returns the affected-row
    /// count; zero means the row is missing.
    async fn update_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        state: TriggerState,
        job_detail: &JobDetail,
    ) -> Result<u64>;

    /// Rebuild the kind-specific state. [`Error::NotFound`] if the row is missing.
    async fn load_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<TriggerPropertyBundle>;
}

pub(crate) fn unsupported(discriminator: &'static str, trigger: &Trigger) -> Error {
    Error::UnsupportedTrigger {
        discriminator,
        key: trigger.key.clone(),
        kind: trigger.kind_tag(),
    }
}
