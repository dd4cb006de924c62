//! Plugin configuration.
//!
//! Options are built by applying option functions, in order, over the
//! defaults:
//!
//! ```rust,ignore
//! let options = PluginOptions::apply([
//!     with_log_result(false),
//!     with_sql_parameters(true),
//!     with_tracer(Some(provider)),
//! ]);
//! ```

use crate::otel::hooks::{default_error_tag_hook, ErrorTagHook};
use crate::otel::operation::OperationKind;
use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer, TracerProvider};
use opentelemetry::{global, Context, KeyValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Instrumentation scope name for tracers obtained by the plugin.
pub const TRACER_NAME: &str = "percolate-sqltrace";

/// Object-safe view of a `Tracer` whose spans can live in a `Context`.
pub trait ClientTracer: Send + Sync {
    /// Start a client span as a child of `parent`.
    ///
    /// # Returns
    ///
    /// `parent` extended with the new span
    fn start_client_span(&self, name: String, attributes: Vec<KeyValue>, parent: &Context) -> Context;
}

impl<T> ClientTracer for T
where
    T: Tracer + Send + Sync,
    T::Span: Send + Sync + 'static,
{
    fn start_client_span(&self, name: String, attributes: Vec<KeyValue>, parent: &Context) -> Context {
        let span = self
            .span_builder(name)
            .with_kind(SpanKind::Client)
            .with_attributes(attributes)
            .start_with_context(self, parent);
        parent.with_span(span)
    }
}

/// Where hook spans come from.
#[derive(Clone, Default)]
pub enum TracerSource {
    /// Process-wide provider, resolved at span start
    #[default]
    Global,
    /// Tracer obtained from an explicitly supplied provider
    Provider(Arc<dyn ClientTracer>),
}

impl TracerSource {
    /// Wrap a tracer provider.
    pub fn from_provider<P>(provider: P) -> Self
    where
        P: TracerProvider,
        P::Tracer: Send + Sync + 'static,
        <P::Tracer as Tracer>::Span: Send + Sync + 'static,
    {
        Self::Provider(Arc::new(provider.tracer(TRACER_NAME)))
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }

    pub(crate) fn start(&self, name: String, attributes: Vec<KeyValue>, parent: &Context) -> Context {
        match self {
            Self::Global => global::tracer(TRACER_NAME).start_client_span(name, attributes, parent),
            Self::Provider(tracer) => tracer.start_client_span(name, attributes, parent),
        }
    }
}

impl fmt::Debug for TracerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("Global"),
            Self::Provider(_) => f.write_str("Provider"),
        }
    }
}

/// Instrumentation plugin options.
#[derive(Clone)]
pub struct PluginOptions {
    pub(crate) log_result: bool,
    pub(crate) tracer: TracerSource,
    pub(crate) log_sql_parameters: bool,
    pub(crate) error_tag_hook: ErrorTagHook,
    pub(crate) operation_names: HashMap<OperationKind, String>,
}

/// Option function applied over `PluginOptions::default()`.
pub type ApplyOption = Box<dyn FnOnce(&mut PluginOptions) + Send>;

impl PluginOptions {
    /// Build options from option functions, applied in order.
    pub fn apply(opts: impl IntoIterator<Item = ApplyOption>) -> Self {
        let mut options = Self::default();
        for apply in opts {
            apply(&mut options);
        }
        options
    }

    pub fn log_result(&self) -> bool {
        self.log_result
    }

    pub fn log_sql_parameters(&self) -> bool {
        self.log_sql_parameters
    }

    pub fn tracer(&self) -> &TracerSource {
        &self.tracer
    }

    pub fn error_tag_hook(&self) -> &ErrorTagHook {
        &self.error_tag_hook
    }

    /// Span name for an operation kind.
    pub fn operation_name(&self, kind: OperationKind) -> &str {
        self.operation_names
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.as_str())
    }
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            log_result: false,
            tracer: TracerSource::Global,
            log_sql_parameters: true,
            error_tag_hook: Arc::new(default_error_tag_hook),
            operation_names: OperationKind::ALL
                .into_iter()
                .map(|kind| (kind, kind.as_str().to_string()))
                .collect(),
        }
    }
}

impl fmt::Debug for PluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginOptions")
            .field("log_result", &self.log_result)
            .field("tracer", &self.tracer)
            .field("log_sql_parameters", &self.log_sql_parameters)
            .field("operation_names", &self.operation_names)
            .finish_non_exhaustive()
    }
}

/// Include rows affected in the after-hook log line and span.
pub fn with_log_result(log_result: bool) -> ApplyOption {
    Box::new(move |o| o.log_result = log_result)
}

/// Use spans from `provider`. `None` keeps the current source.
pub fn with_tracer<P>(provider: Option<P>) -> ApplyOption
where
    P: TracerProvider + Send + 'static,
    P::Tracer: Send + Sync + 'static,
    <P::Tracer as Tracer>::Span: Send + Sync + 'static,
{
    Box::new(move |o| {
        if let Some(provider) = provider {
            o.tracer = TracerSource::from_provider(provider);
        }
    })
}

/// Interpolate bound values into the SQL recorded on spans and logs.
pub fn with_sql_parameters(log_sql_parameters: bool) -> ApplyOption {
    Box::new(move |o| o.log_sql_parameters = log_sql_parameters)
}

/// Override the span name used for one operation kind.
pub fn with_operation_name(kind: OperationKind, name: impl Into<String>) -> ApplyOption {
    let name = name.into();
    Box::new(move |o| {
        o.operation_names.insert(kind, name);
    })
}

/// Replace the hook that maps statement errors onto spans.
pub fn with_error_tag_hook(hook: ErrorTagHook) -> ApplyOption {
    Box::new(move |o| o.error_tag_hook = hook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider;

    #[test]
    fn test_defaults() {
        let options = PluginOptions::default();
        assert!(!options.log_result());
        assert!(options.log_sql_parameters());
        assert!(options.tracer().is_global());
        for kind in OperationKind::ALL {
            assert_eq!(options.operation_name(kind), kind.as_str());
        }
    }

    #[test]
    fn test_options_applied_in_order() {
        let options = PluginOptions::apply([
            with_log_result(true),
            with_sql_parameters(false),
            with_log_result(false),
            with_operation_name(OperationKind::Query, "orders.select"),
        ]);
        assert!(!options.log_result());
        assert!(!options.log_sql_parameters());
        assert_eq!(options.operation_name(OperationKind::Query), "orders.select");
        assert_eq!(options.operation_name(OperationKind::Raw), "raw");
    }

    #[test]
    fn test_nil_tracer_is_ignored() {
        let options = PluginOptions::apply([with_tracer::<SdkTracerProvider>(None)]);
        assert!(options.tracer().is_global());
    }

    #[test]
    fn test_nil_tracer_keeps_previous_provider() {
        let provider = SdkTracerProvider::builder().build();
        let options = PluginOptions::apply([
            with_tracer(Some(provider)),
            with_tracer::<SdkTracerProvider>(None),
        ]);
        assert!(!options.tracer().is_global());
    }
}
