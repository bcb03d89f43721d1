//! Per-trigger-kind persistence for a SQL-backed job store.
//!
//! Each trigger kind keeps its own fields in an extension table next to the
//! engine's base trigger table. A [`delegate::TriggerPersistenceDelegate`]
//! owns one such table; the [`registry::DelegateRegistry`] picks the delegate
//! for a trigger (write path) or a stored discriminator (read path).

pub mod bundle;
pub mod command;
pub mod delegate;
pub mod delegate_blob;
pub mod delegate_calendar;
pub mod delegate_cron;
pub mod delegate_simple;
pub mod error;
pub mod job;
pub mod key;
pub mod registry;
pub mod schedule;
pub mod sql;
pub mod trigger;

#[cfg(test)]
pub(crate) mod test_support;

use {
    cadence_config::JobStoreConfig,
    sqlx::{SqliteConnection, SqlitePool, sqlite::SqlitePoolOptions},
    tracing::{debug, info},
};

pub use error::{Error, Result};

/// Open a pool for `config` and, if enabled, create the extension tables.
pub async fn connect(config: &JobStoreConfig) -> Result<SqlitePool> {
    config.validate()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    if config.create_schema {
        let mut conn = pool.acquire().await?;
        ensure_schema(&mut conn, &config.table_prefix).await?;
    }

    info!(
        scheduler = %config.scheduler_name,
        table_prefix = %config.table_prefix,
        "job store connected"
    );
    Ok(pool)
}

/// Create every extension table under `table_prefix` if it does not exist.
pub async fn ensure_schema(conn: &mut SqliteConnection, table_prefix: &str) -> Result<()> {
    cadence_config::validate::validate_table_prefix(table_prefix)?;

    for template in sql::SQL_CREATE_EXTENSION_TABLES {
        let ddl = sql::replace_table_prefix(template, table_prefix, "");
        sqlx::query(&ddl).execute(&mut *conn).await?;
    }
    debug!(table_prefix, "extension tables ensured");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let (pool, _ctx) = test_support::setup().await;
        let mut conn = pool.acquire().await.unwrap();
        ensure_schema(&mut conn, test_support::TEST_PREFIX)
            .await
            .unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'TEST_%' ORDER BY name",
        )
        .fetch_all(&mut *conn)
        .await
        .unwrap();
        assert_eq!(
            tables,
            vec![
                "TEST_BLOB_TRIGGERS",
                "TEST_CRON_TRIGGERS",
                "TEST_SIMPLE_TRIGGERS",
                "TEST_SIMPROP_TRIGGERS"
            ]
        );
    }

    #[tokio::test]
    async fn unsafe_prefix_rejected() {
        let (pool, _ctx) = test_support::setup().await;
        let mut conn = pool.acquire().await.unwrap();
        let err = ensure_schema(&mut conn, "X; DROP TABLE Y; --")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }
}
