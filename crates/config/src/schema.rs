use serde::{Deserialize, Serialize};

use crate::{ConfigError, validate};

/// Root of a cadence config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub job_store: JobStoreConfig,
}

impl CadenceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.job_store.validate()
    }
}

/// Database and naming settings shared by every trigger persistence delegate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobStoreConfig {
    /// sqlx connection URL, e.g. `sqlite:cadence.db?mode=rwc`.
    pub database_url: String,
    pub max_connections: u32,
    /// Prepended to every table name. Spliced into statement text, so only
    /// ASCII letters, digits and `_` are accepted.
    pub table_prefix: String,
    /// Scopes every row, so several schedulers can share one schema.
    pub scheduler_name: String,
    /// Create missing extension tables on connect.
    pub create_schema: bool,
}

impl Default for JobStoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:cadence.db?mode=rwc".into(),
            max_connections: 5,
            table_prefix: "SCHED_".into(),
            scheduler_name: "default".into(),
            create_schema: true,
        }
    }
}

impl JobStoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate::validate_table_prefix(&self.table_prefix)?;
        validate::validate_scheduler_name(&self.scheduler_name)?;
        if self.max_connections == 0 {
            return Err(ConfigError::EmptyPool);
        }
        Ok(())
    }
}
