//! Fallback persistence: the whole trigger kind as a JSON document.
//!
//! Used for custom trigger kinds and for any trigger carrying properties that
//! its kind's fixed table cannot hold.

use {
    async_trait::async_trait,
    serde_json::Value,
    sqlx::{Row, SqliteConnection},
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    bundle::TriggerPropertyBundle,
    delegate::{DelegateContext, TriggerPersistenceDelegate},
    job::JobDetail,
    key::TriggerKey,
    schedule::resolve_time_zone,
    sql::{
        COL_BLOB_DATA, SQL_DELETE_BLOB_TRIGGER, SQL_INSERT_BLOB_TRIGGER, SQL_SELECT_BLOB_TRIGGER,
        SQL_UPDATE_BLOB_TRIGGER,
    },
    trigger::{Trigger, TriggerKind, TriggerKindTag, TriggerState},
};

pub const TRIGGER_TYPE_BLOB: &str = "BLOB";

#[derive(Debug, Clone)]
pub struct BlobTriggerPersistenceDelegate {
    ctx: DelegateContext,
}

impl BlobTriggerPersistenceDelegate {
    pub fn new(ctx: DelegateContext) -> Self {
        Self { ctx }
    }

    async fn write(
        &self,
        conn: &mut SqliteConnection,
        template: &str,
        trigger: &Trigger,
    ) -> Result<u64> {
        let data = serde_json::to_vec(&trigger.kind)?;
        let accessor = self.ctx.command_accessor();
        let mut cmd = self.ctx.keyed_command(template, &trigger.key);
        accessor.add_command_parameter(&mut cmd, "blob", data.into());
        accessor.execute_non_query(conn, cmd).await
    }
}

#[async_trait]
impl TriggerPersistenceDelegate for BlobTriggerPersistenceDelegate {
    fn handled_discriminator(&self) -> &'static str {
        TRIGGER_TYPE_BLOB
    }

    fn handled_kinds(&self) -> &'static [TriggerKindTag] {
        &TriggerKindTag::ALL
    }

    fn can_handle_trigger_type(&self, trigger: &Trigger) -> bool {
        matches!(trigger.kind, TriggerKind::Custom(_)) || trigger.has_additional_properties()
    }

    async fn delete_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<u64> {
        self.ctx
            .execute_keyed(conn, SQL_DELETE_BLOB_TRIGGER, key)
            .await
    }

    async fn insert_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        _state: TriggerState,
        _job_detail: &JobDetail,
    ) -> Result<u64> {
        let rows = self.write(conn, SQL_INSERT_BLOB_TRIGGER, trigger).await?;
        debug!(key = %trigger.key, kind = %trigger.kind_tag(), "inserted blob trigger");
        Ok(rows)
    }

    async fn update_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        _state: TriggerState,
        _job_detail: &JobDetail,
    ) -> Result<u64> {
        let rows = self.write(conn, SQL_UPDATE_BLOB_TRIGGER, trigger).await?;
        if rows == 0 {
            warn!(key = %trigger.key, "blob trigger update matched no extension row");
        }
        Ok(rows)
    }

    async fn load_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<TriggerPropertyBundle> {
        let cmd = self.ctx.keyed_command(SQL_SELECT_BLOB_TRIGGER, key);
        let Some(row) = self.ctx.command_accessor().execute_reader(conn, cmd).await? else {
            return Err(Error::not_found(key, self.ctx.statement(SQL_SELECT_BLOB_TRIGGER)));
        };

        let data: Vec<u8> = row.try_get(COL_BLOB_DATA)?;
        let kind = decode_kind(&data)?;

        Ok(TriggerPropertyBundle::new(
            kind.schedule_builder(),
            kind.state_properties(),
            kind.additional_properties().cloned(),
        ))
    }
}

/// Decode a stored payload. A zone this host does not know is reported as
/// [`Error::UnknownTimeZone`], not as a malformed payload.
fn decode_kind(data: &[u8]) -> Result<TriggerKind> {
    let value: Value = serde_json::from_slice(data)?;
    if let Some(id) = value.pointer("/schedule/timeZone").and_then(Value::as_str) {
        resolve_time_zone(id)?;
    }
    Ok(serde_json::from_value(value)?)
}
