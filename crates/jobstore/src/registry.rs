//! Discriminator-keyed dispatch to persistence delegates.

use std::{collections::HashMap, sync::Arc};

use tracing::info;

use crate::{
    Error, Result,
    delegate::{DelegateContext, TriggerPersistenceDelegate},
    delegate_blob::BlobTriggerPersistenceDelegate,
    delegate_calendar::CalendarIntervalTriggerPersistenceDelegate,
    delegate_cron::CronTriggerPersistenceDelegate,
    delegate_simple::SimpleTriggerPersistenceDelegate,
    trigger::{Trigger, TriggerKindTag},
};

/// Immutable set of delegates, built once at store start-up.
///
/// Write path: [`DelegateRegistry::delegate_for_trigger`] asks each specific
/// delegate in registration order, then the fallback. Read path:
/// [`DelegateRegistry::delegate_for_discriminator`] matches the tag stored in
/// the base trigger row.
pub struct DelegateRegistry {
    delegates: Vec<Arc<dyn TriggerPersistenceDelegate>>,
    fallback: Option<Arc<dyn TriggerPersistenceDelegate>>,
    by_discriminator: HashMap<&'static str, Arc<dyn TriggerPersistenceDelegate>>,
}

impl DelegateRegistry {
    pub fn builder() -> DelegateRegistryBuilder {
        DelegateRegistryBuilder::default()
    }

    /// Simple, calendar-interval and cron delegates, with blob as fallback.
    pub fn standard(ctx: &DelegateContext) -> Result<Self> {
        Self::builder()
            .register(SimpleTriggerPersistenceDelegate::new(ctx.clone()))?
            .register(CalendarIntervalTriggerPersistenceDelegate::new(ctx.clone()))?
            .register(CronTriggerPersistenceDelegate::new(ctx.clone()))?
            .fallback(BlobTriggerPersistenceDelegate::new(ctx.clone()))?
            .build()
    }

    pub fn delegate_for_trigger(
        &self,
        trigger: &Trigger,
    ) -> Result<&dyn TriggerPersistenceDelegate> {
        self.delegates
            .iter()
            .find(|d| d.can_handle_trigger_type(trigger))
            .or_else(|| {
                self.fallback
                    .as_ref()
                    .filter(|d| d.can_handle_trigger_type(trigger))
            })
            .map(|d| d.as_ref())
            .ok_or_else(|| Error::NoDelegate {
                key: trigger.key.clone(),
            })
    }

    pub fn delegate_for_discriminator(
        &self,
        discriminator: &str,
    ) -> Result<&dyn TriggerPersistenceDelegate> {
        self.by_discriminator
            .get(discriminator)
            .map(|d| d.as_ref())
            .ok_or_else(|| Error::UnknownDiscriminator {
                discriminator: discriminator.to_string(),
            })
    }

    pub fn discriminators(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.delegates
            .iter()
            .chain(self.fallback.iter())
            .map(|d| d.handled_discriminator())
    }
}

#[derive(Default)]
pub struct DelegateRegistryBuilder {
    delegates: Vec<Arc<dyn TriggerPersistenceDelegate>>,
    fallback: Option<Arc<dyn TriggerPersistenceDelegate>>,
    by_discriminator: HashMap<&'static str, Arc<dyn TriggerPersistenceDelegate>>,
}

impl DelegateRegistryBuilder {
    pub fn register(self, delegate: impl TriggerPersistenceDelegate + 'static) -> Result<Self> {
        self.register_arc(Arc::new(delegate))
    }

    pub fn register_arc(mut self, delegate: Arc<dyn TriggerPersistenceDelegate>) -> Result<Self> {
        self.index(&delegate)?;
        self.delegates.push(delegate);
        Ok(self)
    }

    /// Delegate consulted when no registered delegate accepts a trigger.
    pub fn fallback(mut self, delegate: impl TriggerPersistenceDelegate + 'static) -> Result<Self> {
        let delegate: Arc<dyn TriggerPersistenceDelegate> = Arc::new(delegate);
        self.index(&delegate)?;
        if let Some(previous) = self.fallback.replace(delegate) {
            self.by_discriminator.remove(previous.handled_discriminator());
        }
        Ok(self)
    }

    fn index(&mut self, delegate: &Arc<dyn TriggerPersistenceDelegate>) -> Result<()> {
        let discriminator = delegate.handled_discriminator();
        if self.by_discriminator.contains_key(discriminator) {
            return Err(Error::DuplicateDiscriminator { discriminator });
        }
        self.by_discriminator.insert(discriminator, Arc::clone(delegate));
        Ok(())
    }

    /// Fails unless every trigger kind has a delegate.
    pub fn build(self) -> Result<DelegateRegistry> {
        for kind in TriggerKindTag::ALL {
            let handled = self
                .delegates
                .iter()
                .chain(self.fallback.iter())
                .any(|d| d.handled_kinds().contains(&kind));
            if !handled {
                return Err(Error::UnhandledTriggerKind { kind });
            }
        }

        let registry = DelegateRegistry {
            delegates: self.delegates,
            fallback: self.fallback,
            by_discriminator: self.by_discriminator,
        };
        info!(
            discriminators = ?registry.discriminators().collect::<Vec<_>>(),
            "trigger persistence delegates registered"
        );
        Ok(registry)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            delegate_blob::TRIGGER_TYPE_BLOB, delegate_calendar::TRIGGER_TYPE_CALENDAR_INTERVAL,
            delegate_cron::TRIGGER_TYPE_CRON, delegate_simple::TRIGGER_TYPE_SIMPLE,
            test_support::*,
        },
        rstest::rstest,
    };

    #[rstest]
    #[case(simple_trigger("t", "G"), TRIGGER_TYPE_SIMPLE)]
    #[case(calendar_trigger("t", "G"), TRIGGER_TYPE_CALENDAR_INTERVAL)]
    #[case(cron_trigger("t", "G", "0 0 12 * * ?"), TRIGGER_TYPE_CRON)]
    #[case(cron_trigger_with_property("t", "G", "0 0 12 * * ?"), TRIGGER_TYPE_BLOB)]
    #[case(custom_trigger("t", "G"), TRIGGER_TYPE_BLOB)]
    fn write_path_dispatch(#[case] trigger: Trigger, #[case] expected: &str) {
        let registry = DelegateRegistry::standard(&context()).unwrap();
        let delegate = registry.delegate_for_trigger(&trigger).unwrap();
        assert_eq!(delegate.handled_discriminator(), expected);
    }

    #[test]
    fn read_path_dispatch() {
        let registry = DelegateRegistry::standard(&context()).unwrap();
        for tag in ["SIMPLE", "CAL_INT", "CRON", "BLOB"] {
            let delegate = registry.delegate_for_discriminator(tag).unwrap();
            assert_eq!(delegate.handled_discriminator(), tag);
        }
        assert!(matches!(
            registry.delegate_for_discriminator("DAILY_I"),
            Err(Error::UnknownDiscriminator { .. })
        ));
    }

    #[test]
    fn duplicate_discriminator_rejected() {
        let ctx = context();
        let err = DelegateRegistry::builder()
            .register(CronTriggerPersistenceDelegate::new(ctx.clone()))
            .unwrap()
            .register(CronTriggerPersistenceDelegate::new(ctx))
            .err()
            .unwrap();
        assert!(matches!(err, Error::DuplicateDiscriminator {
            discriminator: "CRON"
        }));
    }

    #[test]
    fn missing_kind_rejected() {
        let err = DelegateRegistry::builder()
            .register(CronTriggerPersistenceDelegate::new(context()))
            .unwrap()
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnhandledTriggerKind {
            kind: TriggerKindTag::Simple
        }));
    }

    #[test]
    fn blob_as_regular_delegate() {
        let ctx = context();
        let registry = DelegateRegistry::builder()
            .register(SimpleTriggerPersistenceDelegate::new(ctx.clone()))
            .unwrap()
            .register(CalendarIntervalTriggerPersistenceDelegate::new(ctx.clone()))
            .unwrap()
            .register(CronTriggerPersistenceDelegate::new(ctx.clone()))
            .unwrap()
            .register(BlobTriggerPersistenceDelegate::new(ctx))
            .unwrap()
            .build()
            .unwrap();
        let extended = cron_trigger_with_property("t", "G", "0 0 12 * * ?");
        assert_eq!(
            registry
                .delegate_for_trigger(&extended)
                .unwrap()
                .handled_discriminator(),
            "BLOB"
        );
    }
}
