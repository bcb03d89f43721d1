//! Fixtures shared by the delegate tests.

use std::sync::Arc;

use {cadence_config::JobStoreConfig, serde_json::json, sqlx::SqlitePool};

use crate::{
    command::SqliteCommandAccessor,
    delegate::DelegateContext,
    job::JobDetail,
    key::{JobKey, TriggerKey},
    schedule::{CalendarIntervalScheduleBuilder, IntervalUnit, SimpleScheduleBuilder},
    trigger::{
        CalendarIntervalTrigger, CronTrigger, CustomTrigger, PropertyMap, SimpleTrigger, Trigger,
        TriggerKind,
    },
};

pub const TEST_PREFIX: &str = "TEST_";
pub const TEST_SCHEDULER: &str = "test";

pub fn context() -> DelegateContext {
    DelegateContext::new(
        TEST_PREFIX,
        TEST_SCHEDULER,
        Arc::new(SqliteCommandAccessor::new()),
    )
    .unwrap()
}

/// Single-connection in-memory database with the extension tables created.
pub async fn setup() -> (SqlitePool, DelegateContext) {
    let config = JobStoreConfig {
        database_url: "sqlite::memory:".into(),
        max_connections: 1,
        table_prefix: TEST_PREFIX.into(),
        scheduler_name: TEST_SCHEDULER.into(),
        create_schema: true,
    };
    let pool = crate::connect(&config).await.unwrap();
    (pool, context())
}

pub fn job_detail() -> JobDetail {
    JobDetail::new(JobKey::new("job", "jobs").unwrap())
}

fn trigger(name: &str, group: &str, kind: TriggerKind) -> Trigger {
    Trigger::new(
        TriggerKey::new(name, group).unwrap(),
        JobKey::new("job", "jobs").unwrap(),
        kind,
    )
}

pub fn cron_trigger(name: &str, group: &str, expression: &str) -> Trigger {
    trigger(
        name,
        group,
        TriggerKind::Cron(CronTrigger::new(expression).unwrap()),
    )
}

pub fn cron_trigger_with_property(name: &str, group: &str, expression: &str) -> Trigger {
    trigger(
        name,
        group,
        TriggerKind::Cron(
            CronTrigger::new(expression)
                .unwrap()
                .with_property("owner", json!("ops")),
        ),
    )
}

pub fn with_zone(mut trigger: Trigger, time_zone: chrono_tz::Tz) -> Trigger {
    if let TriggerKind::Cron(cron) = trigger.kind {
        trigger.kind = TriggerKind::Cron(cron.with_time_zone(time_zone));
    }
    trigger
}

pub fn simple_trigger(name: &str, group: &str) -> Trigger {
    let schedule = SimpleScheduleBuilder::new()
        .with_interval_ms(60_000)
        .repeat_forever()
        .build()
        .unwrap();
    trigger(name, group, TriggerKind::Simple(SimpleTrigger::new(schedule)))
}

pub fn calendar_trigger(name: &str, group: &str) -> Trigger {
    let schedule = CalendarIntervalScheduleBuilder::new()
        .with_interval(2, IntervalUnit::Month)
        .in_time_zone(chrono_tz::Europe::Berlin)
        .preserve_hour_of_day_across_daylight_savings(true)
        .build()
        .unwrap();
    trigger(
        name,
        group,
        TriggerKind::CalendarInterval(CalendarIntervalTrigger::new(schedule)),
    )
}

pub fn custom_trigger(name: &str, group: &str) -> Trigger {
    trigger(
        name,
        group,
        TriggerKind::Custom(CustomTrigger {
            type_name: "lunar".into(),
            properties: PropertyMap::from([("phase".into(), json!("full"))]),
        }),
    )
}
