//! Checks on values that end up inside SQL statement text.

use crate::ConfigError;

pub const MAX_TABLE_PREFIX_LEN: usize = 64;
pub const MAX_SCHEDULER_NAME_LEN: usize = 120;

/// Accept an empty prefix or an identifier fragment: ASCII letters, digits
/// and `_`, not starting with a digit.
pub fn validate_table_prefix(prefix: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidTablePrefix {
        prefix: prefix.to_string(),
        reason,
    };

    if prefix.len() > MAX_TABLE_PREFIX_LEN {
        return Err(invalid("longer than 64 characters"));
    }
    if prefix.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("starts with a digit"));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid("only ASCII letters, digits and '_' are allowed"));
    }
    Ok(())
}

/// The name is embedded as a quoted literal, so any characters are fine, but it
/// must be present and fit the `SCHED_NAME` column.
pub fn validate_scheduler_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidSchedulerName { reason: "empty" });
    }
    if name.chars().count() > MAX_SCHEDULER_NAME_LEN {
        return Err(ConfigError::InvalidSchedulerName {
            reason: "longer than 120 characters",
        });
    }
    Ok(())
}
