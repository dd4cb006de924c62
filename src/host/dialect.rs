//! SQL dialects and the driver/connector seams.
//!
//! The dialect renders bound values back into SQL text for logs and span
//! attributes. Execution and connection setup belong to the driver and are
//! only described here as traits.

use crate::host::database::Database;
use crate::host::statement::Statement;
use crate::otel::operation::OperationKind;
use crate::types::Result;
use async_trait::async_trait;
use serde_json::Value;

/// SQL dialect of a connection.
pub trait Dialect: Send + Sync {
    /// Database system name (`db.system` attribute).
    fn name(&self) -> &str;

    /// Interpolate bound values into `sql`.
    ///
    /// Placeholders without a matching value are left as-is.
    fn explain(&self, sql: &str, vars: &[Value]) -> String;
}

/// Executes the built-in step of an operation.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Run `statement` for `kind`.
    ///
    /// # Returns
    ///
    /// Rows affected (or returned). `DatabaseError::RecordNotFound` is
    /// reported unchanged when nothing matched.
    async fn execute(&self, kind: OperationKind, statement: &Statement) -> Result<u64>;
}

/// Opens database handles from driver-specific connection strings.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, dsn: &str) -> Result<Database>;
}

/// MySQL dialect: `?` placeholders, single-quoted strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn explain(&self, sql: &str, vars: &[Value]) -> String {
        let mut out = String::with_capacity(sql.len() + vars.len() * 8);
        let mut vars = vars.iter();
        let mut quote: Option<char> = None;

        for c in sql.chars() {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                    out.push(c);
                }
                None => match c {
                    '\'' | '"' | '`' => {
                        quote = Some(c);
                        out.push(c);
                    }
                    '?' => match vars.next() {
                        Some(value) => render_value(&mut out, value),
                        None => out.push('?'),
                    },
                    _ => out.push(c),
                },
            }
        }

        out
    }
}

fn render_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("NULL"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => push_quoted(out, s),
        Value::Array(_) | Value::Object(_) => push_quoted(out, &value.to_string()),
    }
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
}
