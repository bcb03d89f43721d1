use thiserror::Error;

use crate::{key::TriggerKey, trigger::TriggerKindTag};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] cadence_config::ConfigError),

    #[error("invalid cron expression '{expression}': {source}")]
    CronParse {
        expression: String,
        #[source]
        source: cron::error::Error,
    },

    #[error("unknown timezone: {timezone}")]
    UnknownTimeZone { timezone: String },

    #[error("no record found for trigger '{key}' with statement: {statement}")]
    NotFound { key: TriggerKey, statement: String },

    #[error("delegate {discriminator} cannot persist trigger '{key}' of kind {kind}")]
    UnsupportedTrigger {
        discriminator: &'static str,
        key: TriggerKey,
        kind: TriggerKindTag,
    },

    #[error("no persistence delegate handles trigger '{key}'")]
    NoDelegate { key: TriggerKey },

    #[error("no persistence delegate registered for discriminator '{discriminator}'")]
    UnknownDiscriminator { discriminator: String },

    #[error("discriminator '{discriminator}' is registered twice")]
    DuplicateDiscriminator { discriminator: &'static str },

    #[error("no persistence delegate handles trigger kind {kind}")]
    UnhandledTriggerKind { kind: TriggerKindTag },

    #[error("no value bound for statement parameter @{name}")]
    MissingParameter { name: String },

    #[error("invalid key: {message}")]
    InvalidKey { message: String },

    #[error("invalid schedule: {message}")]
    InvalidSchedule { message: String },
}

impl Error {
    #[must_use]
    pub fn unknown_timezone(timezone: impl Into<String>) -> Self {
        Self::UnknownTimeZone {
            timezone: timezone.into(),
        }
    }

    #[must_use]
    pub fn not_found(key: &TriggerKey, statement: impl Into<String>) -> Self {
        Self::NotFound {
            key: key.clone(),
            statement: statement.into(),
        }
    }

    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_schedule(message: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            message: message.into(),
        }
    }

    /// True for the hard failure raised when an extension row is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
