//! Statement preparation and named-parameter binding.

use {
    async_trait::async_trait,
    sqlx::{SqliteConnection, sqlite::SqliteRow},
    tracing::debug,
};

use crate::{Error, Result};

/// A value bound to a named statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    Text(String),
    Integer(i64),
    Bool(bool),
    Blob(Vec<u8>),
}

impl From<&str> for DbValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DbValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for DbValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for DbValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for DbValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<bool> for DbValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<u8>> for DbValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl<T: Into<DbValue>> From<Option<T>> for DbValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A prepared statement and its bound parameters. Owned by a single call.
#[derive(Debug, Clone)]
pub struct Command {
    sql: String,
    parameters: Vec<(String, DbValue)>,
}

impl Command {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    /// Bind `value` to `@name`. Rebinding a name replaces the earlier value.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl Into<DbValue>) {
        let name = name.into();
        let value = value.into();
        match self.parameters.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((name, value)),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter(&self, name: &str) -> Option<&DbValue> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Rewrite `@name` placeholders to positional `?` markers and collect the
    /// values in the order they appear. Quoted literals are left untouched.
    pub fn positional(&self) -> Result<(String, Vec<&DbValue>)> {
        let sql = self.sql.as_str();
        let mut out = String::with_capacity(sql.len());
        let mut values = Vec::new();
        let mut in_literal = false;
        let mut chars = sql.char_indices().peekable();

        while let Some((i, ch)) = chars.next() {
            match ch {
                // A doubled quote inside a literal toggles twice and stays inside.
                '\'' => {
                    in_literal = !in_literal;
                    out.push(ch);
                },
                '@' if !in_literal => {
                    let start = i + ch.len_utf8();
                    let mut end = start;
                    while let Some(&(j, c)) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            end = j + c.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let name = &sql[start..end];
                    if name.is_empty() {
                        out.push(ch);
                        continue;
                    }
                    let value = self.parameter(name).ok_or_else(|| Error::MissingParameter {
                        name: name.to_string(),
                    })?;
                    values.push(value);
                    out.push('?');
                },
                _ => out.push(ch),
            }
        }

        Ok((out, values))
    }
}

/// Prepares commands and executes them on a caller-supplied connection.
///
/// The connection is normally a transaction owned by the store engine; the
/// accessor never begins, commits or rolls back.
#[async_trait]
pub trait CommandAccessor: Send + Sync {
    fn prepare_command(&self, sql: String) -> Command {
        Command::new(sql)
    }

    fn add_command_parameter(&self, command: &mut Command, name: &str, value: DbValue) {
        command.add_parameter(name, value);
    }

    /// Execute a write and return the affected-row count.
    async fn execute_non_query(
        &self,
        conn: &mut SqliteConnection,
        command: Command,
    ) -> Result<u64>;

    /// Execute a read and return its first row, if any.
    async fn execute_reader(
        &self,
        conn: &mut SqliteConnection,
        command: Command,
    ) -> Result<Option<SqliteRow>>;
}

/// [`CommandAccessor`] backed by sqlx's SQLite driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteCommandAccessor;

impl SqliteCommandAccessor {
    pub fn new() -> Self {
        Self
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

fn bind_all<'q>(sql: &'q str, values: Vec<&'q DbValue>) -> SqliteQuery<'q> {
    values
        .into_iter()
        .fold(sqlx::query(sql), |query, value| match value {
            DbValue::Null => query.bind(None::<String>),
            DbValue::Text(s) => query.bind(s.as_str()),
            DbValue::Integer(n) => query.bind(*n),
            DbValue::Bool(b) => query.bind(*b),
            DbValue::Blob(bytes) => query.bind(bytes.as_slice()),
        })
}

#[async_trait]
impl CommandAccessor for SqliteCommandAccessor {
    async fn execute_non_query(
        &self,
        conn: &mut SqliteConnection,
        command: Command,
    ) -> Result<u64> {
        let (sql, values) = command.positional()?;
        debug!(sql = %sql, params = values.len(), "executing statement");
        let result = bind_all(&sql, values).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn execute_reader(
        &self,
        conn: &mut SqliteConnection,
        command: Command,
    ) -> Result<Option<SqliteRow>> {
        let (sql, values) = command.positional()?;
        debug!(sql = %sql, params = values.len(), "executing query");
        let row = bind_all(&sql, values).fetch_optional(&mut *conn).await?;
        Ok(row)
    }
}
