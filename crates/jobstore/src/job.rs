use crate::key::JobKey;

/// The job a trigger fires, as known to the store engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetail {
    pub key: JobKey,
    pub description: Option<String>,
    /// Kept after its last trigger is removed.
    pub durable: bool,
    /// Re-executed if the scheduler stops mid-run.
    pub requests_recovery: bool,
}

impl JobDetail {
    pub fn new(key: JobKey) -> Self {
        Self {
            key,
            description: None,
            durable: false,
            requests_recovery: false,
        }
    }
}
