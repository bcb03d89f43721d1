//! Trigger and job identities.

use std::fmt;

use crate::{Error, Result};

/// Group used when a key is created without an explicit group.
pub const DEFAULT_GROUP: &str = "DEFAULT";

/// Identity of a trigger within one scheduler: a `(name, group)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerKey {
    name: String,
    group: String,
}

impl TriggerKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Result<Self> {
        let (name, group) = validate_parts(name.into(), group.into())?;
        Ok(Self { name, group })
    }

    /// Key in the [`DEFAULT_GROUP`].
    pub fn with_default_group(name: impl Into<String>) -> Result<Self> {
        Self::new(name, DEFAULT_GROUP)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Identity of the job a trigger fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    name: String,
    group: String,
}

impl JobKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Result<Self> {
        let (name, group) = validate_parts(name.into(), group.into())?;
        Ok(Self { name, group })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

fn validate_parts(name: String, group: String) -> Result<(String, String)> {
    if name.trim().is_empty() {
        return Err(Error::invalid_key("name must not be empty"));
    }
    if group.trim().is_empty() {
        return Err(Error::invalid_key(format!(
            "group must not be empty (name '{name}')"
        )));
    }
    Ok((name, group))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_group_dot_name() {
        let key = TriggerKey::new("job1", "G1").unwrap();
        assert_eq!(key.to_string(), "G1.job1");
    }

    #[test]
    fn default_group() {
        let key = TriggerKey::with_default_group("nightly").unwrap();
        assert_eq!(key.group(), DEFAULT_GROUP);
        assert_eq!(key.name(), "nightly");
    }

    #[test]
    fn rejects_blank_parts() {
        assert!(TriggerKey::new("", "G1").is_err());
        assert!(TriggerKey::new("job1", "  ").is_err());
        assert!(JobKey::new("", "G1").is_err());
    }
}
