//! Statement templates for the extension tables.
//!
//! Templates carry two configuration tokens, [`TABLE_PREFIX_TOKEN`] and
//! [`SCHED_NAME_TOKEN`], substituted with operator-supplied values by
//! [`replace_table_prefix`]. Everything else a statement needs is a named
//! `@parameter` bound by the command accessor.

pub const TABLE_PREFIX_TOKEN: &str = "{prefix}";
pub const SCHED_NAME_TOKEN: &str = "{sched_name}";

pub const DEFAULT_TABLE_PREFIX: &str = "SCHED_";

// Shared columns.
pub const COL_SCHED_NAME: &str = "SCHED_NAME";
pub const COL_TRIGGER_NAME: &str = "TRIGGER_NAME";
pub const COL_TRIGGER_GROUP: &str = "TRIGGER_GROUP";
pub const COL_TIME_ZONE_ID: &str = "TIME_ZONE_ID";

// Cron.
pub const COL_CRON_EXPRESSION: &str = "CRON_EXPRESSION";

// Simple.
pub const COL_REPEAT_COUNT: &str = "REPEAT_COUNT";
pub const COL_REPEAT_INTERVAL: &str = "REPEAT_INTERVAL";
pub const COL_TIMES_TRIGGERED: &str = "TIMES_TRIGGERED";

// Simple-properties table.
pub const COL_STR_PROP_1: &str = "STR_PROP_1";
pub const COL_INT_PROP_1: &str = "INT_PROP_1";
pub const COL_INT_PROP_2: &str = "INT_PROP_2";
pub const COL_BOOL_PROP_1: &str = "BOOL_PROP_1";
pub const COL_BOOL_PROP_2: &str = "BOOL_PROP_2";

// Blob.
pub const COL_BLOB_DATA: &str = "BLOB_DATA";

pub const SQL_INSERT_CRON_TRIGGER: &str = "INSERT INTO {prefix}CRON_TRIGGERS \
     (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP, CRON_EXPRESSION, TIME_ZONE_ID) \
     VALUES ({sched_name}, @triggerName, @triggerGroup, @triggerCronExpression, @triggerTimeZone)";

pub const SQL_UPDATE_CRON_TRIGGER: &str = "UPDATE {prefix}CRON_TRIGGERS \
     SET CRON_EXPRESSION = @triggerCronExpression, TIME_ZONE_ID = @timeZoneId \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_SELECT_CRON_TRIGGER: &str = "SELECT CRON_EXPRESSION, TIME_ZONE_ID \
     FROM {prefix}CRON_TRIGGERS \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_DELETE_CRON_TRIGGER: &str = "DELETE FROM {prefix}CRON_TRIGGERS \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_INSERT_SIMPLE_TRIGGER: &str = "INSERT INTO {prefix}SIMPLE_TRIGGERS \
     (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP, REPEAT_COUNT, REPEAT_INTERVAL, TIMES_TRIGGERED) \
     VALUES ({sched_name}, @triggerName, @triggerGroup, @triggerRepeatCount, @triggerRepeatInterval, @triggerTimesTriggered)";

pub const SQL_UPDATE_SIMPLE_TRIGGER: &str = "UPDATE {prefix}SIMPLE_TRIGGERS \
     SET REPEAT_COUNT = @triggerRepeatCount, REPEAT_INTERVAL = @triggerRepeatInterval, \
     TIMES_TRIGGERED = @triggerTimesTriggered \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_SELECT_SIMPLE_TRIGGER: &str = "SELECT REPEAT_COUNT, REPEAT_INTERVAL, TIMES_TRIGGERED \
     FROM {prefix}SIMPLE_TRIGGERS \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_DELETE_SIMPLE_TRIGGER: &str = "DELETE FROM {prefix}SIMPLE_TRIGGERS \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_INSERT_SIMPROP_TRIGGER: &str = "INSERT INTO {prefix}SIMPROP_TRIGGERS \
     (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP, STR_PROP_1, INT_PROP_1, INT_PROP_2, \
     BOOL_PROP_1, BOOL_PROP_2, TIME_ZONE_ID) \
     VALUES ({sched_name}, @triggerName, @triggerGroup, @string1, @int1, @int2, \
     @boolean1, @boolean2, @timeZoneId)";

pub const SQL_UPDATE_SIMPROP_TRIGGER: &str = "UPDATE {prefix}SIMPROP_TRIGGERS \
     SET STR_PROP_1 = @string1, INT_PROP_1 = @int1, INT_PROP_2 = @int2, \
     BOOL_PROP_1 = @boolean1, BOOL_PROP_2 = @boolean2, TIME_ZONE_ID = @timeZoneId \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_SELECT_SIMPROP_TRIGGER: &str = "SELECT STR_PROP_1, INT_PROP_1, INT_PROP_2, \
     BOOL_PROP_1, BOOL_PROP_2, TIME_ZONE_ID \
     FROM {prefix}SIMPROP_TRIGGERS \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_DELETE_SIMPROP_TRIGGER: &str = "DELETE FROM {prefix}SIMPROP_TRIGGERS \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_INSERT_BLOB_TRIGGER: &str = "INSERT INTO {prefix}BLOB_TRIGGERS \
     (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP, BLOB_DATA) \
     VALUES ({sched_name}, @triggerName, @triggerGroup, @blob)";

pub const SQL_UPDATE_BLOB_TRIGGER: &str = "UPDATE {prefix}BLOB_TRIGGERS SET BLOB_DATA = @blob \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_SELECT_BLOB_TRIGGER: &str = "SELECT BLOB_DATA FROM {prefix}BLOB_TRIGGERS \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

pub const SQL_DELETE_BLOB_TRIGGER: &str = "DELETE FROM {prefix}BLOB_TRIGGERS \
     WHERE SCHED_NAME = {sched_name} AND TRIGGER_NAME = @triggerName AND TRIGGER_GROUP = @triggerGroup";

/// DDL for every extension table, one statement per entry.
pub const SQL_CREATE_EXTENSION_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS {prefix}CRON_TRIGGERS (
        SCHED_NAME      TEXT NOT NULL,
        TRIGGER_NAME    TEXT NOT NULL,
        TRIGGER_GROUP   TEXT NOT NULL,
        CRON_EXPRESSION TEXT NOT NULL,
        TIME_ZONE_ID    TEXT,
        PRIMARY KEY (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP)
    )",
    "CREATE TABLE IF NOT EXISTS {prefix}SIMPLE_TRIGGERS (
        SCHED_NAME      TEXT    NOT NULL,
        TRIGGER_NAME    TEXT    NOT NULL,
        TRIGGER_GROUP   TEXT    NOT NULL,
        REPEAT_COUNT    INTEGER NOT NULL,
        REPEAT_INTERVAL INTEGER NOT NULL,
        TIMES_TRIGGERED INTEGER NOT NULL,
        PRIMARY KEY (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP)
    )",
    "CREATE TABLE IF NOT EXISTS {prefix}SIMPROP_TRIGGERS (
        SCHED_NAME    TEXT NOT NULL,
        TRIGGER_NAME  TEXT NOT NULL,
        TRIGGER_GROUP TEXT NOT NULL,
        STR_PROP_1    TEXT,
        STR_PROP_2    TEXT,
        STR_PROP_3    TEXT,
        INT_PROP_1    INTEGER,
        INT_PROP_2    INTEGER,
        LONG_PROP_1   INTEGER,
        LONG_PROP_2   INTEGER,
        DEC_PROP_1    NUMERIC,
        DEC_PROP_2    NUMERIC,
        BOOL_PROP_1   BOOLEAN,
        BOOL_PROP_2   BOOLEAN,
        TIME_ZONE_ID  TEXT,
        PRIMARY KEY (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP)
    )",
    "CREATE TABLE IF NOT EXISTS {prefix}BLOB_TRIGGERS (
        SCHED_NAME    TEXT NOT NULL,
        TRIGGER_NAME  TEXT NOT NULL,
        TRIGGER_GROUP TEXT NOT NULL,
        BLOB_DATA     BLOB,
        PRIMARY KEY (SCHED_NAME, TRIGGER_NAME, TRIGGER_GROUP)
    )",
];

/// Substitute the table prefix and scheduler-name literal into a template.
///
/// Only configuration values belong here; `sched_name_literal` must already be
/// quoted with [`scheduler_name_literal`].
pub fn replace_table_prefix(
    template: &str,
    table_prefix: &str,
    sched_name_literal: &str,
) -> String {
    template
        .replace(TABLE_PREFIX_TOKEN, table_prefix)
        .replace(SCHED_NAME_TOKEN, sched_name_literal)
}

/// Quote a scheduler name as a SQL string literal.
pub fn scheduler_name_literal(scheduler_name: &str) -> String {
    format!("'{}'", scheduler_name.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_both_tokens() {
        let sql = replace_table_prefix(SQL_DELETE_CRON_TRIGGER, "QA_", "'main'");
        assert!(sql.starts_with("DELETE FROM QA_CRON_TRIGGERS"));
        assert!(sql.contains("SCHED_NAME = 'main'"));
        assert!(!sql.contains('{'));
        // Parameters stay symbolic.
        assert!(sql.contains("@triggerName"));
    }

    #[test]
    fn literal_escapes_quotes() {
        assert_eq!(scheduler_name_literal("main"), "'main'");
        assert_eq!(scheduler_name_literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn every_template_is_fully_substituted() {
        let templates = [
            SQL_INSERT_CRON_TRIGGER,
            SQL_UPDATE_CRON_TRIGGER,
            SQL_SELECT_CRON_TRIGGER,
            SQL_DELETE_CRON_TRIGGER,
            SQL_INSERT_SIMPLE_TRIGGER,
            SQL_UPDATE_SIMPLE_TRIGGER,
            SQL_SELECT_SIMPLE_TRIGGER,
            SQL_DELETE_SIMPLE_TRIGGER,
            SQL_INSERT_SIMPROP_TRIGGER,
            SQL_UPDATE_SIMPROP_TRIGGER,
            SQL_SELECT_SIMPROP_TRIGGER,
            SQL_DELETE_SIMPROP_TRIGGER,
            SQL_INSERT_BLOB_TRIGGER,
            SQL_UPDATE_BLOB_TRIGGER,
            SQL_SELECT_BLOB_TRIGGER,
            SQL_DELETE_BLOB_TRIGGER,
        ];
        for template in templates.into_iter().chain(SQL_CREATE_EXTENSION_TABLES.iter().copied()) {
            let sql = replace_table_prefix(template, DEFAULT_TABLE_PREFIX, "'s'");
            assert!(!sql.contains(TABLE_PREFIX_TOKEN), "{sql}");
            assert!(!sql.contains(SCHED_NAME_TOKEN), "{sql}");
        }
    }
}
