//! Instrumentation plugin.
//!
//! Registers one before/after hook pair per operation kind around the
//! host's built-in step.

use crate::host::{Database, HookFn, Plugin, Position, Statement};
use crate::otel::errors::ErrorAccumulator;
use crate::otel::hooks::SpanHooks;
use crate::otel::operation::OperationKind;
use crate::otel::options::{ApplyOption, PluginOptions};
use crate::types::Result;
use std::sync::Arc;
use tracing::debug;

/// Name reported to the host for duplicate detection.
pub const PLUGIN_NAME: &str = "otel";

/// Tracing plugin.
///
/// # Example
///
/// ```rust,ignore
/// let plugin = TracingPlugin::with_options([with_sql_parameters(true)]);
/// db.use_plugin(Arc::new(plugin))?;
/// ```
#[derive(Clone, Default)]
pub struct TracingPlugin {
    hooks: SpanHooks,
}

impl TracingPlugin {
    pub fn new(options: PluginOptions) -> Self {
        Self {
            hooks: SpanHooks::new(Arc::new(options)),
        }
    }

    /// Build from option functions applied over the defaults.
    pub fn with_options(opts: impl IntoIterator<Item = ApplyOption>) -> Self {
        Self::new(PluginOptions::apply(opts))
    }

    pub fn options(&self) -> &PluginOptions {
        self.hooks.options()
    }

    fn before_hook(&self, kind: OperationKind) -> HookFn {
        let hooks = self.hooks.clone();
        let operation_name = self.options().operation_name(kind).to_string();
        Arc::new(move |db: &Database, stmt: &mut Statement| {
            hooks.before(db, stmt, &operation_name);
        })
    }

    fn after_hook(&self) -> HookFn {
        let hooks = self.hooks.clone();
        Arc::new(move |db: &Database, stmt: &mut Statement| {
            hooks.after(db, stmt);
        })
    }
}

impl Plugin for TracingPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    /// Register all twelve hooks.
    ///
    /// Every registration is attempted; failures are collected and returned
    /// together, and hooks that did register stay active.
    fn initialize(&self, db: &Database) -> Result<()> {
        let callbacks = db.callbacks();
        let mut errs = ErrorAccumulator::new();

        for kind in OperationKind::ALL {
            let step = kind.builtin_step();

            let before = kind.before_stage();
            errs.add(
                before,
                callbacks.register(kind, Position::Before(step), before.name(), self.before_hook(kind)),
            );

            let after = kind.after_stage();
            errs.add(
                after,
                callbacks.register(kind, Position::After(step), after.name(), self.after_hook()),
            );
        }

        debug!(db = db.name(), failed = errs.len(), "tracing hooks registered");
        errs.into_result()
    }
}
