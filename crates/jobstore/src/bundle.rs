//! Reconstruction carrier returned by delegate loads.

use crate::{schedule::ScheduleBuilder, trigger::PropertyMap};

/// Subtype state rebuilt from an extension row.
///
/// Besides the schedule builder it carries two optional slots: runtime state
/// (such as the fire count) and properties outside the subtype's fixed schema.
/// Subtypes that need neither leave both empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerPropertyBundle {
    schedule_builder: ScheduleBuilder,
    state_properties: Option<PropertyMap>,
    additional_properties: Option<PropertyMap>,
}

impl TriggerPropertyBundle {
    pub fn new(
        schedule_builder: ScheduleBuilder,
        state_properties: Option<PropertyMap>,
        additional_properties: Option<PropertyMap>,
    ) -> Self {
        Self {
            schedule_builder,
            state_properties,
            additional_properties,
        }
    }

    pub fn from_builder(schedule_builder: ScheduleBuilder) -> Self {
        Self::new(schedule_builder, None, None)
    }

    pub fn schedule_builder(&self) -> &ScheduleBuilder {
        &self.schedule_builder
    }

    pub fn state_properties(&self) -> Option<&PropertyMap> {
        self.state_properties.as_ref()
    }

    pub fn additional_properties(&self) -> Option<&PropertyMap> {
        self.additional_properties.as_ref()
    }

    pub fn into_parts(self) -> (ScheduleBuilder, Option<PropertyMap>, Option<PropertyMap>) {
        (
            self.schedule_builder,
            self.state_properties,
            self.additional_properties,
        )
    }
}
