//! OpenTelemetry instrumentation for database operations.
//!
//! Follows the OpenTelemetry database span conventions:
//! - https://opentelemetry.io/docs/specs/semconv/database/database-spans/
//!
//! # Span Layout
//!
//! **Span name**: the operation's display name (`create`, `update`, `query`,
//! `delete`, `row`, `raw`), overridable per kind.
//!
//! **Span kind**: `CLIENT`
//!
//! **Attributes**:
//! - `db.system`: Dialect name (e.g. `"mysql"`)
//! - `db.name`: Database name of the handle
//! - `db.statement`: SQL with bound values interpolated (unless disabled)
//! - `db.otel.rows_affected`: Only with result logging enabled
//!
//! # Hook Registration
//!
//! For each operation kind the plugin registers `otel:before_<kind>` before
//! the built-in `db:<kind>` step and `otel:after_<kind>` after it. Failed
//! registrations are collected and reported together.
//!
//! # Example
//!
//! ```rust,ignore
//! use percolate_sqltrace::otel::{with_sql_parameters, with_tracer, TracingPlugin};
//!
//! let plugin = TracingPlugin::with_options([
//!     with_tracer(Some(provider)),
//!     with_sql_parameters(true),
//! ]);
//! db.use_plugin(Arc::new(plugin))?;
//! ```

pub mod errors;
pub mod hooks;
pub mod operation;
pub mod options;
pub mod plugin;

pub use errors::ErrorAccumulator;
pub use hooks::{attributes, default_error_tag_hook, CallReport, ErrorTagHook, SpanHooks};
pub use operation::{OperationKind, Phase, Stage};
pub use options::{
    with_error_tag_hook, with_log_result, with_operation_name, with_sql_parameters, with_tracer,
    ApplyOption, ClientTracer, PluginOptions, TracerSource, TRACER_NAME,
};
pub use plugin::{TracingPlugin, PLUGIN_NAME};
