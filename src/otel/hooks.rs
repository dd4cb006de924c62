//! Span lifecycle hooks.
//!
//! `before` starts a client span and records the start time in the
//! statement's call state; `after` takes both back out, stamps the rendered
//! SQL on the span, ends it and logs the call. Statements without an
//! operation context are skipped by both sides.

use crate::host::{Database, Statement};
use crate::otel::options::PluginOptions;
use crate::types::DatabaseError;
use opentelemetry::trace::{SpanRef, Status, TraceContextExt};
use opentelemetry::KeyValue;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Span attribute keys.
pub mod attributes {
    /// Database system (dialect name)
    pub const DB_SYSTEM: &str = "db.system";
    /// Database name
    pub const DB_NAME: &str = "db.name";
    /// Rendered SQL statement
    pub const DB_STATEMENT: &str = "db.statement";
    /// Rows affected, recorded when result logging is on
    pub const ROWS_AFFECTED: &str = "db.otel.rows_affected";
}

/// Maps a statement error onto its span.
pub type ErrorTagHook = Arc<dyn Fn(&SpanRef<'_>, &DatabaseError) + Send + Sync>;

/// Record the error as a span event and mark the span failed.
pub fn default_error_tag_hook(span: &SpanRef<'_>, err: &DatabaseError) {
    span.record_error(err);
    span.set_status(Status::error(err.to_string()));
}

/// What the after hook observed for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReport {
    /// Time since the before hook, zero if it never ran
    pub elapsed: Duration,
    /// SQL as logged and recorded on the span
    pub sql: String,
    /// Rows affected, only when result logging is on
    pub rows_affected: Option<u64>,
    /// Whether a span was found and ended
    pub span_ended: bool,
}

/// Before/after hook pair sharing one set of plugin options.
#[derive(Clone)]
pub struct SpanHooks {
    options: Arc<PluginOptions>,
}

impl Default for SpanHooks {
    fn default() -> Self {
        Self::new(Arc::new(PluginOptions::default()))
    }
}

impl SpanHooks {
    pub fn new(options: Arc<PluginOptions>) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Start a span for the statement.
    ///
    /// # Arguments
    ///
    /// * `db` - Handle running the statement
    /// * `statement` - Per-call statement; receives the start time and span
    /// * `operation_name` - Span name
    ///
    /// # Returns
    ///
    /// `None` if the statement has no operation context (nothing stored)
    pub fn before(&self, db: &Database, statement: &mut Statement, operation_name: &str) -> Option<()> {
        let parent = statement.context()?;

        let attrs = vec![
            KeyValue::new(attributes::DB_SYSTEM, db.dialect().name().to_string()),
            KeyValue::new(attributes::DB_NAME, db.name().to_string()),
        ];
        let cx = self.options.tracer.start(operation_name.to_string(), attrs, parent);

        statement.call_state.start_time = Some(Instant::now());
        statement.call_state.span = Some(cx);
        Some(())
    }

    /// Finish the span for the statement and log the call.
    ///
    /// Missing call state is tolerated: elapsed falls back to zero and span
    /// annotation is skipped, but the log line is still emitted.
    ///
    /// # Returns
    ///
    /// `None` if the statement has no operation context, otherwise a
    /// `CallReport`
    pub fn after(&self, db: &Database, statement: &mut Statement) -> Option<CallReport> {
        statement.context()?;

        let start_time = statement.call_state.start_time.take();
        let span_cx = statement.call_state.span.take();
        let elapsed = start_time.map(|t| t.elapsed()).unwrap_or(Duration::ZERO);

        let sql = if self.options.log_sql_parameters {
            db.dialect().explain(&statement.sql, &statement.vars)
        } else {
            statement.sql.clone()
        };
        let rows_affected = self.options.log_result.then_some(statement.rows_affected);

        let span_ended = match span_cx {
            Some(cx) => {
                let span = cx.span();
                span.set_attribute(KeyValue::new(attributes::DB_STATEMENT, sql.clone()));
                if let Some(rows) = rows_affected {
                    span.set_attribute(KeyValue::new(attributes::ROWS_AFFECTED, rows as i64));
                }
                if let Some(err) = statement.error.as_ref().filter(|e| !e.is_not_found()) {
                    (self.options.error_tag_hook)(&span, err);
                }
                span.end();
                true
            }
            None => false,
        };

        debug!(
            name = db.name(),
            cost = ?elapsed,
            sql = %sql,
            rows_affected,
            "[db] statement finished"
        );

        Some(CallReport {
            elapsed,
            sql,
            rows_affected,
            span_ended,
        })
    }
}
