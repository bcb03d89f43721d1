//! Trigger records: the base fields shared by every trigger plus a closed set
//! of kind-specific variants.

use std::{collections::BTreeMap, fmt};

use {
    chrono_tz::Tz,
    serde::{Deserialize, Serialize},
};

use crate::{
    Result,
    key::{JobKey, TriggerKey},
    schedule::{
        CalendarIntervalSchedule, CalendarIntervalScheduleBuilder, CronSchedule,
        CronScheduleBuilder, CustomScheduleBuilder, ScheduleBuilder, SimpleSchedule,
        SimpleScheduleBuilder,
    },
};

/// Untyped properties keyed by name.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// State-property name carrying a trigger's fire count.
pub const TIMES_TRIGGERED_PROPERTY: &str = "timesTriggered";

pub const DEFAULT_PRIORITY: i32 = 5;

/// Persisted trigger state, stored by the engine in the base trigger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriggerState {
    #[default]
    Waiting,
    Acquired,
    Executing,
    Complete,
    Paused,
    Blocked,
    PausedBlocked,
    Error,
    Deleted,
}

impl TriggerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Acquired => "ACQUIRED",
            Self::Executing => "EXECUTING",
            Self::Complete => "COMPLETE",
            Self::Paused => "PAUSED",
            Self::Blocked => "BLOCKED",
            Self::PausedBlocked => "PAUSED_BLOCKED",
            Self::Error => "ERROR",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fieldless mirror of [`TriggerKind`], used for registry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TriggerKindTag {
    Simple,
    CalendarInterval,
    Cron,
    Custom,
}

impl TriggerKindTag {
    pub const ALL: [Self; 4] = [
        Self::Simple,
        Self::CalendarInterval,
        Self::Cron,
        Self::Custom,
    ];
}

impl fmt::Display for TriggerKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simple => "simple",
            Self::CalendarInterval => "calendarInterval",
            Self::Cron => "cron",
            Self::Custom => "custom",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleTrigger {
    pub schedule: SimpleSchedule,
    #[serde(default)]
    pub times_triggered: u32,
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub additional_properties: PropertyMap,
}

impl SimpleTrigger {
    pub fn new(schedule: SimpleSchedule) -> Self {
        Self {
            schedule,
            times_triggered: 0,
            additional_properties: PropertyMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarIntervalTrigger {
    pub schedule: CalendarIntervalSchedule,
    #[serde(default)]
    pub times_triggered: u32,
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub additional_properties: PropertyMap,
}

impl CalendarIntervalTrigger {
    pub fn new(schedule: CalendarIntervalSchedule) -> Self {
        Self {
            schedule,
            times_triggered: 0,
            additional_properties: PropertyMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronTrigger {
    pub schedule: CronSchedule,
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub additional_properties: PropertyMap,
}

impl CronTrigger {
    /// Cron trigger evaluated in the local zone. Fails if `expression` does not parse.
    pub fn new(expression: &str) -> Result<Self> {
        Ok(Self {
            schedule: CronScheduleBuilder::cron_schedule(expression)?.build(),
            additional_properties: PropertyMap::new(),
        })
    }

    #[must_use]
    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.schedule = CronScheduleBuilder::from(&self.schedule)
            .in_time_zone(time_zone)
            .build();
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.additional_properties.insert(name.into(), value);
        self
    }

    pub fn expression(&self) -> &str {
        self.schedule.expression().as_str()
    }

    pub fn time_zone_id(&self) -> Option<&'static str> {
        self.schedule.time_zone_id()
    }
}

/// A trigger kind whose schedule is interpreted outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTrigger {
    pub type_name: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Kind-specific trigger state. Each variant carries exactly its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TriggerKind {
    Simple(SimpleTrigger),
    CalendarInterval(CalendarIntervalTrigger),
    Cron(CronTrigger),
    Custom(CustomTrigger),
}

impl TriggerKind {
    pub fn tag(&self) -> TriggerKindTag {
        match self {
            Self::Simple(_) => TriggerKindTag::Simple,
            Self::CalendarInterval(_) => TriggerKindTag::CalendarInterval,
            Self::Cron(_) => TriggerKindTag::Cron,
            Self::Custom(_) => TriggerKindTag::Custom,
        }
    }

    /// Extra properties outside the kind's fixed schema. Custom triggers have
    /// none; their properties are their schema.
    pub fn additional_properties(&self) -> Option<&PropertyMap> {
        let props = match self {
            Self::Simple(t) => &t.additional_properties,
            Self::CalendarInterval(t) => &t.additional_properties,
            Self::Cron(t) => &t.additional_properties,
            Self::Custom(_) => return None,
        };
        (!props.is_empty()).then_some(props)
    }

    pub fn has_additional_properties(&self) -> bool {
        self.additional_properties().is_some()
    }

    pub fn schedule_builder(&self) -> ScheduleBuilder {
        match self {
            Self::Simple(t) => ScheduleBuilder::Simple(SimpleScheduleBuilder::from(&t.schedule)),
            Self::CalendarInterval(t) => ScheduleBuilder::CalendarInterval(
                CalendarIntervalScheduleBuilder::from(&t.schedule),
            ),
            Self::Cron(t) => ScheduleBuilder::Cron(CronScheduleBuilder::from(&t.schedule)),
            Self::Custom(t) => ScheduleBuilder::Custom(CustomScheduleBuilder {
                type_name: t.type_name.clone(),
                properties: t.properties.clone(),
            }),
        }
    }

    /// Mutable runtime state that is not part of the schedule itself.
    pub fn state_properties(&self) -> Option<PropertyMap> {
        let times_triggered = match self {
            Self::Simple(t) => t.times_triggered,
            Self::CalendarInterval(t) => t.times_triggered,
            Self::Cron(_) | Self::Custom(_) => return None,
        };
        Some(times_triggered_property(times_triggered))
    }
}

pub(crate) fn times_triggered_property(times_triggered: u32) -> PropertyMap {
    PropertyMap::from([(
        TIMES_TRIGGERED_PROPERTY.to_string(),
        serde_json::Value::from(times_triggered),
    )])
}

/// A trigger as handed to the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub key: TriggerKey,
    pub job_key: JobKey,
    pub description: Option<String>,
    pub priority: i32,
    pub kind: TriggerKind,
}

impl Trigger {
    pub fn new(key: TriggerKey, job_key: JobKey, kind: TriggerKind) -> Self {
        Self {
            key,
            job_key,
            description: None,
            priority: DEFAULT_PRIORITY,
            kind,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn kind_tag(&self) -> TriggerKindTag {
        self.kind.tag()
    }

    pub fn has_additional_properties(&self) -> bool {
        self.kind.has_additional_properties()
    }
}
