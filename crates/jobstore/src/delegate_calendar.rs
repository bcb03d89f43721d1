//! Calendar-interval triggers, stored in the generic simple-properties table.
//!
//! Column mapping in `{prefix}SIMPROP_TRIGGERS`:
//!
//! | column         | value                                    |
//! |----------------|------------------------------------------|
//! | `STR_PROP_1`   | interval unit                            |
//! | `INT_PROP_1`   | interval                                 |
//! | `INT_PROP_2`   | times triggered                          |
//! | `BOOL_PROP_1`  | preserve hour of day across DST          |
//! | `BOOL_PROP_2`  | skip day if hour does not exist          |
//! | `TIME_ZONE_ID` | time zone, `NULL` for the local zone     |

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
    schedule::{CalendarIntervalScheduleBuilder, IntervalUnit, ScheduleBuilder, resolve_time_zone},
    sql::{
        COL_BOOL_PROP_1, COL_BOOL_PROP_2, COL_INT_PROP_1, COL_INT_PROP_2, COL_STR_PROP_1,
        COL_TIME_ZONE_ID, SQL_DELETE_SIMPROP_TRIGGER, SQL_INSERT_SIMPROP_TRIGGER,
        SQL_SELECT_SIMPROP_TRIGGER, SQL_UPDATE_SIMPROP_TRIGGER,
    },
    trigger::{
        CalendarIntervalTrigger, Trigger, TriggerKind, TriggerKindTag, TriggerState,
        times_triggered_property,
    },
};

pub const TRIGGER_TYPE_CALENDAR_INTERVAL: &str = "CAL_INT";

#[derive(Debug, Clone)]
pub struct CalendarIntervalTriggerPersistenceDelegate {
    ctx: DelegateContext,
}

impl CalendarIntervalTriggerPersistenceDelegate {
    pub fn new(ctx: DelegateContext) -> Self {
        Self { ctx }
    }

    fn calendar_trigger<'t>(&self, trigger: &'t Trigger) -> Result<&'t CalendarIntervalTrigger> {
        match &trigger.kind {
            TriggerKind::CalendarInterval(t) if t.additional_properties.is_empty() => Ok(t),
            _ => Err(unsupported(TRIGGER_TYPE_CALENDAR_INTERVAL, trigger)),
        }
    }

    async fn write(
        &self,
        conn: &mut SqliteConnection,
        template: &str,
        trigger: &Trigger,
    ) -> Result<u64> {
        let calendar = self.calendar_trigger(trigger)?;
        let schedule = &calendar.schedule;
        let accessor = self.ctx.command_accessor();

        let mut cmd = self.ctx.keyed_command(template, &trigger.key);
        accessor.add_command_parameter(&mut cmd, "string1", schedule.unit().as_str().into());
        accessor.add_command_parameter(&mut cmd, "int1", schedule.interval().into());
        accessor.add_command_parameter(&mut cmd, "int2", calendar.times_triggered.into());
        accessor.add_command_parameter(
            &mut cmd,
            "boolean1",
            schedule
                .preserve_hour_of_day_across_daylight_savings()
                .into(),
        );
        accessor.add_command_parameter(
            &mut cmd,
            "boolean2",
            schedule.skip_day_if_hour_does_not_exist().into(),
        );
        accessor.add_command_parameter(&mut cmd, "timeZoneId", schedule.time_zone_id().into());

        accessor.execute_non_query(conn, cmd).await
    }
}

#[async_trait]
impl TriggerPersistenceDelegate for CalendarIntervalTriggerPersistenceDelegate {
    fn handled_discriminator(&self) -> &'static str {
        TRIGGER_TYPE_CALENDAR_INTERVAL
    }

    fn handled_kinds(&self) -> &'static [TriggerKindTag] {
        &[TriggerKindTag::CalendarInterval]
    }

    fn can_handle_trigger_type(&self, trigger: &Trigger) -> bool {
        matches!(
            &trigger.kind,
            TriggerKind::CalendarInterval(calendar) if calendar.additional_properties.is_empty()
        )
    }

    async fn delete_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<u64> {
        self.ctx
            .execute_keyed(conn, SQL_DELETE_SIMPROP_TRIGGER, key)
            .await
    }

    async fn insert_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        _state: TriggerState,
        _job_detail: &JobDetail,
    ) -> Result<u64> {
        let rows = self.write(conn, SQL_INSERT_SIMPROP_TRIGGER, trigger).await?;
        debug!(key = %trigger.key, "inserted calendar-interval trigger properties");
        Ok(rows)
    }

    async fn update_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        _state: TriggerState,
        _job_detail: &JobDetail,
    ) -> Result<u64> {
        let rows = self.write(conn, SQL_UPDATE_SIMPROP_TRIGGER, trigger).await?;
        if rows == 0 {
            warn!(key = %trigger.key, "calendar-interval trigger update matched no extension row");
        }
        Ok(rows)
    }

    async fn load_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<TriggerPropertyBundle> {
        let cmd = self.ctx.keyed_command(SQL_SELECT_SIMPROP_TRIGGER, key);
        let Some(row) = self.ctx.command_accessor().execute_reader(conn, cmd).await? else {
            return Err(Error::not_found(key, self.ctx.statement(SQL_SELECT_SIMPROP_TRIGGER)));
        };

        let unit: Option<String> = row.try_get(COL_STR_PROP_1)?;
        let interval: Option<i64> = row.try_get(COL_INT_PROP_1)?;
        let times_triggered: Option<i64> = row.try_get(COL_INT_PROP_2)?;
        let preserve_hour: Option<bool> = row.try_get(COL_BOOL_PROP_1)?;
        let skip_day: Option<bool> = row.try_get(COL_BOOL_PROP_2)?;
        let time_zone_id: Option<String> = row.try_get(COL_TIME_ZONE_ID)?;

        let unit: IntervalUnit = unit
            .ok_or_else(|| Error::invalid_schedule("stored interval unit is missing"))?
            .parse()?;
        let interval = interval
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| Error::invalid_schedule("stored interval is missing or out of range"))?;
        let times_triggered = u32::try_from(times_triggered.unwrap_or(0))
            .map_err(|_| Error::invalid_schedule("stored fire count out of range"))?;

        let mut builder = CalendarIntervalScheduleBuilder::new()
            .with_interval(interval, unit)
            .preserve_hour_of_day_across_daylight_savings(preserve_hour.unwrap_or(false))
            .skip_day_if_hour_does_not_exist(skip_day.unwrap_or(false));
        if let Some(id) = time_zone_id.as_deref() {
            builder = builder.in_time_zone(resolve_time_zone(id)?);
        }
        builder.build()?;

        Ok(TriggerPropertyBundle::new(
            ScheduleBuilder::CalendarInterval(builder),
            Some(times_triggered_property(times_triggered)),
            None,
        ))
    }
}
