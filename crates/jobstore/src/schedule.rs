//! Schedule builders reconstructed from extension rows, and the cron schedule
//! they materialize into.

use std::{collections::BTreeMap, fmt, str::FromStr};

use {
    chrono::{DateTime, Local, Utc},
    chrono_tz::Tz,
    serde::{Deserialize, Serialize},
};

use crate::{Error, Result, trigger::TriggerKindTag};

/// Repeat count meaning "fire until the end time, forever if none".
pub const REPEAT_INDEFINITELY: i32 = -1;

// ── Cron ────────────────────────────────────────────────────────────────────

/// A validated cron expression, kept verbatim alongside its parsed form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronExpression {
    source: String,
    schedule: cron::Schedule,
}

impl CronExpression {
    /// Parse a 6/7-field expression (seconds first), or a standard 5-field one.
    ///
    /// The dialect is the `cron` crate's: `?` is accepted, but the `L`, `W`
    /// and `#` day modifiers (`6L`, `LW`, `6#3`) are not and fail with
    /// [`Error::CronParse`].
    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        let schedule = trimmed
            .parse::<cron::Schedule>()
            .or_else(|err| {
                // The `cron` crate requires a seconds field. Plain 5-field
                // expressions get seconds pinned to 0 and an open year.
                if trimmed.split_whitespace().count() == 5 {
                    format!("0 {trimmed} *").parse::<cron::Schedule>()
                } else {
                    Err(err)
                }
            })
            .map_err(|source| Error::CronParse {
                expression: expression.to_string(),
                source,
            })?;

        Ok(Self {
            source: expression.to_string(),
            schedule,
        })
    }

    /// The expression exactly as it was supplied (and as it is stored).
    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn schedule(&self) -> &cron::Schedule {
        &self.schedule
    }
}

impl PartialEq for CronExpression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for CronExpression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CronExpression {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CronExpression> for String {
    fn from(value: CronExpression) -> Self {
        value.source
    }
}

/// A cron recurrence localized to a time zone.
///
/// Without an explicit zone the schedule is evaluated in the host's local zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronSchedule {
    expression: CronExpression,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_zone: Option<Tz>,
}

impl CronSchedule {
    pub fn expression(&self) -> &CronExpression {
        &self.expression
    }

    pub fn time_zone(&self) -> Option<Tz> {
        self.time_zone
    }

    /// Time-zone identifier as persisted, `None` for the local zone.
    pub fn time_zone_id(&self) -> Option<&'static str> {
        self.time_zone.map(|tz| tz.name())
    }

    pub fn next_fire_time_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.upcoming(after, 1).into_iter().next()
    }

    /// The next `count` fire times strictly after `after`.
    pub fn upcoming(&self, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let schedule = self.expression.schedule();
        match self.time_zone {
            Some(tz) => schedule
                .after(&after.with_timezone(&tz))
                .take(count)
                .map(|dt| dt.with_timezone(&Utc))
                .collect(),
            None => schedule
                .after(&after.with_timezone(&Local))
                .take(count)
                .map(|dt| dt.with_timezone(&Utc))
                .collect(),
        }
    }
}

/// Builder for [`CronSchedule`].
#[derive(Debug, Clone, PartialEq)]
pub struct CronScheduleBuilder {
    expression: CronExpression,
    time_zone: Option<Tz>,
}

impl CronScheduleBuilder {
    pub fn cron_schedule(expression: &str) -> Result<Self> {
        Ok(Self::from_expression(CronExpression::parse(expression)?))
    }

    pub fn from_expression(expression: CronExpression) -> Self {
        Self {
            expression,
            time_zone: None,
        }
    }

    #[must_use]
    pub fn in_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = Some(time_zone);
        self
    }

    pub fn build(&self) -> CronSchedule {
        CronSchedule {
            expression: self.expression.clone(),
            time_zone: self.time_zone,
        }
    }
}

impl From<&CronSchedule> for CronScheduleBuilder {
    fn from(schedule: &CronSchedule) -> Self {
        Self {
            expression: schedule.expression.clone(),
            time_zone: schedule.time_zone,
        }
    }
}

/// Resolve a stored time-zone identifier.
pub fn resolve_time_zone(id: &str) -> Result<Tz> {
    id.parse::<Tz>().map_err(|_| Error::unknown_timezone(id))
}

// ── Simple ──────────────────────────────────────────────────────────────────

/// Fixed-interval repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleSchedule {
    repeat_interval_ms: u64,
    repeat_count: i32,
}

impl SimpleSchedule {
    pub fn repeat_interval_ms(&self) -> u64 {
        self.repeat_interval_ms
    }

    pub fn repeat_count(&self) -> i32 {
        self.repeat_count
    }

    pub fn repeats_forever(&self) -> bool {
        self.repeat_count == REPEAT_INDEFINITELY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimpleScheduleBuilder {
    repeat_interval_ms: u64,
    repeat_count: i32,
}

impl SimpleScheduleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.repeat_interval_ms = interval_ms;
        self
    }

    #[must_use]
    pub fn with_repeat_count(mut self, repeat_count: i32) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    #[must_use]
    pub fn repeat_forever(mut self) -> Self {
        self.repeat_count = REPEAT_INDEFINITELY;
        self
    }

    pub fn build(&self) -> Result<SimpleSchedule> {
        if self.repeat_count < REPEAT_INDEFINITELY {
            return Err(Error::invalid_schedule(format!(
                "repeat count must be >= {REPEAT_INDEFINITELY}, got {}",
                self.repeat_count
            )));
        }
        if self.repeat_count != 0 && self.repeat_interval_ms == 0 {
            return Err(Error::invalid_schedule(
                "repeat interval must be > 0 for a repeating trigger",
            ));
        }
        Ok(SimpleSchedule {
            repeat_interval_ms: self.repeat_interval_ms,
            repeat_count: self.repeat_count,
        })
    }
}

impl From<&SimpleSchedule> for SimpleScheduleBuilder {
    fn from(schedule: &SimpleSchedule) -> Self {
        Self {
            repeat_interval_ms: schedule.repeat_interval_ms,
            repeat_count: schedule.repeat_count,
        }
    }
}

// ── Calendar interval ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl IntervalUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Second => "SECOND",
            Self::Minute => "MINUTE",
            Self::Hour => "HOUR",
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SECOND" => Ok(Self::Second),
            "MINUTE" => Ok(Self::Minute),
            "HOUR" => Ok(Self::Hour),
            "DAY" => Ok(Self::Day),
            "WEEK" => Ok(Self::Week),
            "MONTH" => Ok(Self::Month),
            "YEAR" => Ok(Self::Year),
            other => Err(Error::invalid_schedule(format!(
                "unknown interval unit: {other}"
            ))),
        }
    }
}

/// Calendar-aware repetition ("every 2 months"), optionally in a fixed zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarIntervalSchedule {
    interval: u32,
    unit: IntervalUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_zone: Option<Tz>,
    #[serde(default)]
    preserve_hour_of_day_across_daylight_savings: bool,
    #[serde(default)]
    skip_day_if_hour_does_not_exist: bool,
}

impl CalendarIntervalSchedule {
    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    pub fn time_zone(&self) -> Option<Tz> {
        self.time_zone
    }

    pub fn time_zone_id(&self) -> Option<&'static str> {
        self.time_zone.map(|tz| tz.name())
    }

    pub fn preserve_hour_of_day_across_daylight_savings(&self) -> bool {
        self.preserve_hour_of_day_across_daylight_savings
    }

    pub fn skip_day_if_hour_does_not_exist(&self) -> bool {
        self.skip_day_if_hour_does_not_exist
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarIntervalScheduleBuilder {
    interval: u32,
    unit: IntervalUnit,
    time_zone: Option<Tz>,
    preserve_hour_of_day_across_daylight_savings: bool,
    skip_day_if_hour_does_not_exist: bool,
}

impl Default for CalendarIntervalScheduleBuilder {
    fn default() -> Self {
        Self {
            interval: 1,
            unit: IntervalUnit::Day,
            time_zone: None,
            preserve_hour_of_day_across_daylight_savings: false,
            skip_day_if_hour_does_not_exist: false,
        }
    }
}

impl CalendarIntervalScheduleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_interval(mut self, interval: u32, unit: IntervalUnit) -> Self {
        self.interval = interval;
        self.unit = unit;
        self
    }

    #[must_use]
    pub fn in_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = Some(time_zone);
        self
    }

    #[must_use]
    pub fn preserve_hour_of_day_across_daylight_savings(mut self, preserve: bool) -> Self {
        self.preserve_hour_of_day_across_daylight_savings = preserve;
        self
    }

    #[must_use]
    pub fn skip_day_if_hour_does_not_exist(mut self, skip: bool) -> Self {
        self.skip_day_if_hour_does_not_exist = skip;
        self
    }

    pub fn build(&self) -> Result<CalendarIntervalSchedule> {
        if self.interval == 0 {
            return Err(Error::invalid_schedule("interval must be > 0"));
        }
        Ok(CalendarIntervalSchedule {
            interval: self.interval,
            unit: self.unit,
            time_zone: self.time_zone,
            preserve_hour_of_day_across_daylight_savings: self
                .preserve_hour_of_day_across_daylight_savings,
            skip_day_if_hour_does_not_exist: self.skip_day_if_hour_does_not_exist,
        })
    }
}

impl From<&CalendarIntervalSchedule> for CalendarIntervalScheduleBuilder {
    fn from(schedule: &CalendarIntervalSchedule) -> Self {
        Self {
            interval: schedule.interval,
            unit: schedule.unit,
            time_zone: schedule.time_zone,
            preserve_hour_of_day_across_daylight_savings: schedule
                .preserve_hour_of_day_across_daylight_savings,
            skip_day_if_hour_does_not_exist: schedule.skip_day_if_hour_does_not_exist,
        }
    }
}

// ── Custom ──────────────────────────────────────────────────────────────────

/// Opaque schedule for trigger kinds interpreted outside this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomScheduleBuilder {
    pub type_name: String,
    pub properties: BTreeMap<String, serde_json::Value>,
}

// ── Builder sum type ────────────────────────────────────────────────────────

/// Reconstructed schedule state, one variant per trigger kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleBuilder {
    Simple(SimpleScheduleBuilder),
    CalendarInterval(CalendarIntervalScheduleBuilder),
    Cron(CronScheduleBuilder),
    Custom(CustomScheduleBuilder),
}

impl ScheduleBuilder {
    pub fn kind(&self) -> TriggerKindTag {
        match self {
            Self::Simple(_) => TriggerKindTag::Simple,
            Self::CalendarInterval(_) => TriggerKindTag::CalendarInterval,
            Self::Cron(_) => TriggerKindTag::Cron,
            Self::Custom(_) => TriggerKindTag::Custom,
        }
    }

    pub fn as_cron(&self) -> Option<&CronScheduleBuilder> {
        match self {
            Self::Cron(builder) => Some(builder),
            _ => None,
        }
    }
}
