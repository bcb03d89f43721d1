//! Extension-table persistence for cron triggers.

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
    schedule::{CronScheduleBuilder, ScheduleBuilder, resolve_time_zone},
    sql::{
        COL_CRON_EXPRESSION, COL_TIME_ZONE_ID, SQL_DELETE_CRON_TRIGGER, SQL_INSERT_CRON_TRIGGER,
        SQL_SELECT_CRON_TRIGGER, SQL_UPDATE_CRON_TRIGGER,
    },
    trigger::{CronTrigger, Trigger, TriggerKind, TriggerKindTag, TriggerState},
};

pub const TRIGGER_TYPE_CRON: &str = "CRON";

/// Stores a cron trigger's expression and time zone in `{prefix}CRON_TRIGGERS`.
#[derive(Debug, Clone)]
pub struct CronTriggerPersistenceDelegate {
    ctx: DelegateContext,
}

impl CronTriggerPersistenceDelegate {
    pub fn new(ctx: DelegateContext) -> Self {
        Self { ctx }
    }

    fn cron_trigger<'t>(&self, trigger: &'t Trigger) -> Result<&'t CronTrigger> {
        match &trigger.kind {
            TriggerKind::Cron(cron) if cron.additional_properties.is_empty() => Ok(cron),
            _ => Err(unsupported(TRIGGER_TYPE_CRON, trigger)),
        }
    }
}

#[async_trait]
impl TriggerPersistenceDelegate for CronTriggerPersistenceDelegate {
    fn handled_discriminator(&self) -> &'static str {
        TRIGGER_TYPE_CRON
    }

    fn handled_kinds(&self) -> &'static [TriggerKindTag] {
        &[TriggerKindTag::Cron]
    }

    fn can_handle_trigger_type(&self, trigger: &Trigger) -> bool {
        matches!(&trigger.kind, TriggerKind::Cron(cron) if cron.additional_properties.is_empty())
    }

    async fn delete_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<u64> {
        let rows = self
            .ctx
            .execute_keyed(conn, SQL_DELETE_CRON_TRIGGER, key)
            .await?;
        debug!(%key, rows, "deleted cron trigger properties");
        Ok(rows)
    }

    async fn insert_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        _state: TriggerState,
        _job_detail: &JobDetail,
    ) -> Result<u64> {
        let cron = self.cron_trigger(trigger)?;
        let accessor = self.ctx.command_accessor();

        let mut cmd = self.ctx.keyed_command(SQL_INSERT_CRON_TRIGGER, &trigger.key);
        accessor.add_command_parameter(
            &mut cmd,
            "triggerCronExpression",
            cron.expression().into(),
        );
        accessor.add_command_parameter(&mut cmd, "triggerTimeZone", cron.time_zone_id().into());

        let rows = accessor.execute_non_query(conn, cmd).await?;
        debug!(
            key = %trigger.key,
            expression = cron.expression(),
            "inserted cron trigger properties"
        );
        Ok(rows)
    }

    async fn update_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        trigger: &Trigger,
        _state: TriggerState,
        _job_detail: &JobDetail,
    ) -> Result<u64> {
        let cron = self.cron_trigger(trigger)?;
        let accessor = self.ctx.command_accessor();

        let mut cmd = self.ctx.keyed_command(SQL_UPDATE_CRON_TRIGGER, &trigger.key);
        accessor.add_command_parameter(
            &mut cmd,
            "triggerCronExpression",
            cron.expression().into(),
        );
        accessor.add_command_parameter(&mut cmd, "timeZoneId", cron.time_zone_id().into());

        let rows = accessor.execute_non_query(conn, cmd).await?;
        if rows == 0 {
            warn!(key = %trigger.key, "cron trigger update matched no extension row");
        } else {
            debug!(
                key = %trigger.key,
                expression = cron.expression(),
                "updated cron trigger properties"
            );
        }
        Ok(rows)
    }

    async fn load_extended_properties(
        &self,
        conn: &mut SqliteConnection,
        key: &TriggerKey,
    ) -> Result<TriggerPropertyBundle> {
        let cmd = self.ctx.keyed_command(SQL_SELECT_CRON_TRIGGER, key);
        let Some(row) = self.ctx.command_accessor().execute_reader(conn, cmd).await? else {
            return Err(Error::not_found(key, self.ctx.statement(SQL_SELECT_CRON_TRIGGER)));
        };

        let expression: String = row.try_get(COL_CRON_EXPRESSION)?;
        let time_zone_id: Option<String> = row.try_get(COL_TIME_ZONE_ID)?;

        let mut builder = CronScheduleBuilder::cron_schedule(&expression)?;
        if let Some(id) = time_zone_id.as_deref() {
            builder = builder.in_time_zone(resolve_time_zone(id)?);
        }

        Ok(TriggerPropertyBundle::from_builder(ScheduleBuilder::Cron(builder)))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_support::*,
        chrono::{TimeZone, Timelike, Utc},
        rstest::rstest,
    };

    async fn make_delegate() -> (sqlx::SqlitePool, CronTriggerPersistenceDelegate) {
        let (pool, ctx) = setup().await;
        (pool, CronTriggerPersistenceDelegate::new(ctx))
    }

    #[test]
    fn discriminator_is_stable() {
        let a = CronTriggerPersistenceDelegate::new(context());
        let b = CronTriggerPersistenceDelegate::new(context());
        assert_eq!(a.handled_discriminator(), "CRON");
        assert_eq!(a.handled_discriminator(), a.handled_discriminator());
        assert_eq!(a.handled_discriminator(), b.handled_discriminator());
    }

    #[rstest]
    #[case(cron_trigger("t", "G", "0 0 12 * * ?"), true)]
    #[case(cron_trigger_with_property("t", "G", "0 0 12 * * ?"), false)]
    #[case(simple_trigger("t", "G"), false)]
    #[case(custom_trigger("t", "G"), false)]
    fn type_gate(#[case] trigger: Trigger, #[case] expected: bool) {
        let delegate = CronTriggerPersistenceDelegate::new(context());
        assert_eq!(delegate.can_handle_trigger_type(&trigger), expected);
    }

    #[tokio::test]
    async fn insert_then_load_round_trip() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        let trigger = with_zone(
            cron_trigger("job1", "G1", "0 0/15 * * * ?"),
            chrono_tz::Asia::Tokyo,
        );

        let rows = delegate
            .insert_extended_properties(&mut conn, &trigger, TriggerState::Waiting, &job_detail())
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let bundle = delegate
            .load_extended_properties(&mut conn, &trigger.key)
            .await
            .unwrap();
        assert!(bundle.state_properties().is_none());
        assert!(bundle.additional_properties().is_none());

        let loaded = bundle.schedule_builder().as_cron().unwrap().build();
        let TriggerKind::Cron(original) = &trigger.kind else {
            unreachable!()
        };
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(loaded, original.schedule);
        assert_eq!(
            loaded.upcoming(from, 5),
            original.schedule.upcoming(from, 5)
        );
        assert_eq!(loaded.time_zone(), Some(chrono_tz::Asia::Tokyo));
    }

    #[tokio::test]
    async fn missing_zone_stored_as_null() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        let trigger = cron_trigger("job1", "G1", "0 0 12 * * ?");
        delegate
            .insert_extended_properties(&mut conn, &trigger, TriggerState::Waiting, &job_detail())
            .await
            .unwrap();

        let tz: Option<String> =
            sqlx::query_scalar("SELECT TIME_ZONE_ID FROM TEST_CRON_TRIGGERS")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        assert_eq!(tz, None);

        let bundle = delegate
            .load_extended_properties(&mut conn, &trigger.key)
            .await
            .unwrap();
        let schedule = bundle.schedule_builder().as_cron().unwrap().build();
        assert_eq!(schedule.time_zone(), None);
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for fire in schedule.upcoming(from, 3) {
            assert_eq!(fire.with_timezone(&chrono::Local).hour(), 12);
        }
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_constraint_error() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        let trigger = cron_trigger("job1", "G1", "0 0 12 * * ?");
        delegate
            .insert_extended_properties(&mut conn, &trigger, TriggerState::Waiting, &job_detail())
            .await
            .unwrap();

        let err = delegate
            .insert_extended_properties(&mut conn, &trigger, TriggerState::Waiting, &job_detail())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sqlx(_)), "{err}");
    }

    #[tokio::test]
    async fn update_only_touches_target_key() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        let target = cron_trigger("job1", "G1", "0 0 12 * * ?");
        let sibling = cron_trigger("job2", "G1", "0 30 6 * * ?");
        for t in [&target, &sibling] {
            delegate
                .insert_extended_properties(&mut conn, t, TriggerState::Waiting, &job_detail())
                .await
                .unwrap();
        }

        let changed = with_zone(
            cron_trigger("job1", "G1", "0 0/15 * * * ?"),
            chrono_tz::UTC,
        );
        let rows = delegate
            .update_extended_properties(&mut conn, &changed, TriggerState::Waiting, &job_detail())
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let target_bundle = delegate
            .load_extended_properties(&mut conn, &target.key)
            .await
            .unwrap();
        let target_schedule = target_bundle.schedule_builder().as_cron().unwrap().build();
        assert_eq!(target_schedule.expression().as_str(), "0 0/15 * * * ?");
        assert_eq!(target_schedule.time_zone(), Some(chrono_tz::UTC));

        let sibling_bundle = delegate
            .load_extended_properties(&mut conn, &sibling.key)
            .await
            .unwrap();
        let sibling_schedule = sibling_bundle.schedule_builder().as_cron().unwrap().build();
        assert_eq!(sibling_schedule.expression().as_str(), "0 30 6 * * ?");
        assert_eq!(sibling_schedule.time_zone(), None);
    }

    #[tokio::test]
    async fn update_missing_row_reports_zero() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        let rows = delegate
            .update_extended_properties(
                &mut conn,
                &cron_trigger("ghost", "G1", "0 0 12 * * ?"),
                TriggerState::Waiting,
                &job_detail(),
            )
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        let trigger = cron_trigger("job1", "G1", "0 0 12 * * ?");

        let missing = delegate
            .delete_extended_properties(&mut conn, &trigger.key)
            .await
            .unwrap();
        assert_eq!(missing, 0);

        delegate
            .insert_extended_properties(&mut conn, &trigger, TriggerState::Waiting, &job_detail())
            .await
            .unwrap();
        let first = delegate
            .delete_extended_properties(&mut conn, &trigger.key)
            .await
            .unwrap();
        let second = delegate
            .delete_extended_properties(&mut conn, &trigger.key)
            .await
            .unwrap();
        assert_eq!((first, second), (1, 0));
    }

    #[tokio::test]
    async fn load_missing_row_is_not_found() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        let key = TriggerKey::new("nope", "G1").unwrap();
        let err = delegate
            .load_extended_properties(&mut conn, &key)
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "{err}");
        assert!(err.to_string().contains("G1.nope"));
        assert!(err.to_string().contains("TEST_CRON_TRIGGERS"));
    }

    #[tokio::test]
    async fn corrupt_expression_fails_to_load() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        sqlx::query(
            "INSERT INTO TEST_CRON_TRIGGERS (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP, CRON_EXPRESSION)
             VALUES ('test', 'job1', 'G1', 'every tuesday')",
        )
        .execute(&mut *conn)
        .await
        .unwrap();

        let key = TriggerKey::new("job1", "G1").unwrap();
        let err = delegate
            .load_extended_properties(&mut conn, &key)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CronParse { .. }), "{err}");
    }

    #[tokio::test]
    async fn unknown_zone_fails_to_load() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        sqlx::query(
            "INSERT INTO TEST_CRON_TRIGGERS (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP, CRON_EXPRESSION, TIME_ZONE_ID)
             VALUES ('test', 'job1', 'G1', '0 0 12 * * ?', 'Mars/Olympus')",
        )
        .execute(&mut *conn)
        .await
        .unwrap();

        let key = TriggerKey::new("job1", "G1").unwrap();
        let err = delegate
            .load_extended_properties(&mut conn, &key)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, Error::UnknownTimeZone { timezone } if timezone == "Mars/Olympus"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn rows_are_scoped_to_scheduler_name() {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();
        sqlx::query(
            "INSERT INTO TEST_CRON_TRIGGERS (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP, CRON_EXPRESSION)
             VALUES ('other', 'job1', 'G1', '0 0 12 * * ?')",
        )
        .execute(&mut *conn)
        .await
        .unwrap();

        let key = TriggerKey::new("job1", "G1").unwrap();
        assert!(
            delegate
                .load_extended_properties(&mut conn, &key)
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert_eq!(
            delegate
                .delete_extended_properties(&mut conn, &key)
                .await
                .unwrap(),
            0
        );
    }

    #[rstest]
    #[case(simple_trigger("s", "G1"), TriggerKindTag::Simple)]
    #[case(cron_trigger_with_property("s", "G1", "0 0 12 * * ?"), TriggerKindTag::Cron)]
    #[tokio::test]
    async fn rejects_triggers_it_cannot_represent(
        #[case] trigger: Trigger,
        #[case] expected_kind: TriggerKindTag,
    ) {
        let (pool, delegate) = make_delegate().await;
        let mut conn = pool.acquire().await.unwrap();

        for update in [false, true] {
            let result = if update {
                delegate
                    .update_extended_properties(
                        &mut conn,
                        &trigger,
                        TriggerState::Waiting,
                        &job_detail(),
                    )
                    .await
            } else {
                delegate
                    .insert_extended_properties(
                        &mut conn,
                        &trigger,
                        TriggerState::Waiting,
                        &job_detail(),
                    )
                    .await
            };
            let err = result.unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedTrigger {
                    discriminator: "CRON",
                    kind,
                    ..
                } if kind == expected_kind),
                "{err}"
            );
        }

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM TEST_CRON_TRIGGERS")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }
}
