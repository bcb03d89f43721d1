//! Extension-table persistence for simple (fixed-interval) triggers.

use {
    async_trait::async_trait,
    sqlx::{Row, SqliteConnection},
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    bundle::TriggerPropertyBundle,
    delegate::{DelegateContext, TriggerPersistenceDelegate, unsupported},
    job::JobDetail,
    key::TriggerKey,
    schedule::{ScheduleBuilder, SimpleScheduleBuilder},
    sql::{
        COL_REPEAT_COUNT, COL_REPEAT_INTERVAL, COL_TIMES_TRIGGERED, SQL_DELETE_SIMPLE_TRIGGER,
        SQL_INSERT_SIMPLE_TRIGGER, SQL_SELECT_SIMPLE_TRIGGER, SQL_UPDATE_SIMPLE_TRIGGER,
    },
    trigger::{
        SimpleTrigger, Trigger, TriggerKind, TriggerKindTag, TriggerState,
        times_triggered_property,
    },
};

pub const TRIGGER_TYPE_SIMPLE: &str = "SIMPLE";

/// Stores repeat count, interval and fire count in `{prefix}SIMPLE_TRIGGERS`.
#[derive(Debug, Clone)]
pub struct SimpleTriggerPersistenceDelegate {
    ctx: DelegateContext,
}

impl SimpleTriggerPersistenceDelegate {
    pub fn new(ctx: DelegateContext) -> Self {
        Self { ctx }
    }

    fn simple_trigger<'t>(&self, trigger: &'t Trigger) -> Result<&'t SimpleTrigger> {
        match &trigger.kind {
            TriggerKind::Simple(simple) if simple.additional_properties.is_empty() => Ok(simple),
            _ => Err(unsupported(TRIGGER_TYPE_SIMPLE, trigger)),
        }
    }

    async fn write(
        &self,
        conn: &mut SqliteConnection,
        template: &str,
        trigger: &Trigger,
    ) -> Result<u64> {
        let simple = self.simple_trigger(trigger)?;
        let interval_ms = i64::try_from(simple.schedule.repeat_interval_ms())
            .map_err(|_| Error::invalid_schedule("repeat interval out of range"))?;
        let accessor = self.ctx.command_accessor();

        let mut cmd = self.ctx.keyed_command(template, &trigger.key);
        accessor.add_command_parameter(
            &mut cmd,
            "triggerRepeatCount",
            simple.schedule.repeat_count().into(),
        );
        accessor.add_command_parameter(&mut cmd, "triggerRepeatInterval", interval_ms.into());
        accessor.add_command_parameter(
            &mut cmd,
            "triggerTimesTriggered",
            simple.times_triggered.into(),
        );

        accessor.execute_non_query(conn, cmd).await
    }
}

#[async_trait]
impl TriggerPersistenceDelegate for SimpleTriggerPersistenceDelegate {
    fn handled_discriminator(&self) -> &'static str {
        TRIGGER_TYPE_SIMPLE
    }

    fn handled_kinds(&self) -> &'static [TriggerKindTag] {
        &[TriggerKindTag::Simple]
    }

    fn can_handle_trigger_type(&self, trigger: &Trigger) -> bool {
        matches!(
            &trigger.kind,
            TriggerKind::Simple(simple) if simple.additional_properties.is_empty()
        )
    }

    async fn delete_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<u64> {
        self.ctx
            .execute_keyed(conn, SQL_DELETE_SIMPLE_TRIGGER, key)
            .await
    }

    async fn insert_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        _state: TriggerState,
        _job_detail: &JobDetail,
    ) -> Result<u64> {
        let rows = self.write(conn, SQL_INSERT_SIMPLE_TRIGGER, trigger).await?;
        debug!(key = %trigger.key, "inserted simple trigger properties");
        Ok(rows)
    }

    async fn update_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        _state: TriggerState,
        _job_detail: &JobDetail,
    ) -> Result<u64> {
        let rows = self.write(conn, SQL_UPDATE_SIMPLE_TRIGGER, trigger).await?;
        if rows == 0 {
            warn!(key = %trigger.key, "simple trigger update matched no extension row");
        }
        Ok(rows)
    }

    async fn load_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<TriggerPropertyBundle> {
        let cmd = self.ctx.keyed_command(SQL_SELECT_SIMPLE_TRIGGER, key);
        let Some(row) = self.ctx.command_accessor().execute_reader(conn, cmd).await? else {
            return Err(Error::not_found(key, self.ctx.statement(SQL_SELECT_SIMPLE_TRIGGER)));
        };

        let repeat_count: i64 = row.try_get(COL_REPEAT_COUNT)?;
        let repeat_interval: i64 = row.try_get(COL_REPEAT_INTERVAL)?;
        let times_triggered: i64 = row.try_get(COL_TIMES_TRIGGERED)?;

        let builder = SimpleScheduleBuilder::new()
            .with_repeat_count(
                i32::try_from(repeat_count)
                    .map_err(|_| Error::invalid_schedule("stored repeat count out of range"))?,
            )
            .with_interval_ms(
                u64::try_from(repeat_interval)
                    .map_err(|_| Error::invalid_schedule("stored repeat interval is negative"))?,
            );
        builder.build()?;
        let times_triggered = u32::try_from(times_triggered)
            .map_err(|_| Error::invalid_schedule("stored fire count out of range"))?;

        Ok(TriggerPropertyBundle::new(
            ScheduleBuilder::Simple(builder),
            Some(times_triggered_property(times_triggered)),
            None,
        ))
    }
}
