//! Per-call statement state.
//!
//! A `Statement` lives for exactly one database operation. Hooks read the
//! SQL and bound values from it and keep their own state in `call_state`.

use crate::types::DatabaseError;
use opentelemetry::Context;
use serde_json::Value;
use std::time::Instant;

/// Instrumentation state scoped to one operation.
///
/// Filled by the before hook, taken by the after hook. Both fields are
/// optional so an after hook without a matching before degrades instead
/// of failing.
#[derive(Debug, Default)]
pub struct CallState {
    /// When the before hook ran
    pub start_time: Option<Instant>,

    /// Context carrying the span started by the before hook
    pub span: Option<Context>,
}

impl CallState {
    /// Check whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.start_time.is_none() && self.span.is_none()
    }
}

/// One database operation invocation.
#[derive(Debug)]
pub struct Statement {
    context: Option<Context>,

    /// SQL text with `?` placeholders
    pub sql: String,

    /// Bound parameter values, in placeholder order
    pub vars: Vec<Value>,

    /// Rows affected/returned, filled by the built-in step
    pub rows_affected: u64,

    /// Error raised by any step of the pipeline
    pub error: Option<DatabaseError>,

    /// Hook-owned per-call state
    pub call_state: CallState,
}

impl Statement {
    /// Create a statement bound to the current OpenTelemetry context.
    ///
    /// # Arguments
    ///
    /// * `sql` - SQL text with `?` placeholders
    ///
    /// # Returns
    ///
    /// New `Statement` with no bound values
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            context: Some(Context::current()),
            sql: sql.into(),
            vars: Vec::new(),
            rows_affected: 0,
            error: None,
            call_state: CallState::default(),
        }
    }

    /// Bind parameter values.
    pub fn with_vars(mut self, vars: Vec<Value>) -> Self {
        self.vars = vars;
        self
    }

    /// Run the statement under an explicit parent context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Detach the statement from any operation context.
    ///
    /// Instrumentation hooks skip statements without a context.
    pub fn without_context(mut self) -> Self {
        self.context = None;
        self
    }

    /// Operation context, if any.
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }
}
