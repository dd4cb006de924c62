//! Serializable plugin settings.
//!
//! Lets deployments configure the instrumentation from a JSON document
//! instead of code. The tracer provider is not part of the settings; it is
//! always taken from code (or the global provider).

use crate::otel::{OperationKind, PluginOptions};
use crate::types::{DatabaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Instrumentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingSettings {
    /// Record rows affected on spans and log lines
    pub log_result: bool,

    /// Interpolate bound values into the recorded SQL
    pub log_sql_parameters: bool,

    /// Span name overrides, keyed by operation (`create`, `query`, ...)
    pub operation_names: BTreeMap<String, String>,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            log_result: false,
            log_sql_parameters: true,
            operation_names: BTreeMap::new(),
        }
    }
}

impl TracingSettings {
    /// Parse settings from JSON.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DatabaseError::Config(format!("Invalid tracing settings: {}", e)))
    }

    /// Convert into plugin options.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Config` for an unknown operation key
    pub fn to_options(&self) -> Result<PluginOptions> {
        let mut options = PluginOptions {
            log_result: self.log_result,
            log_sql_parameters: self.log_sql_parameters,
            ..PluginOptions::default()
        };

        for (key, name) in &self.operation_names {
            let kind = OperationKind::parse(key)
                .ok_or_else(|| DatabaseError::Config(format!("Unknown operation: {}", key)))?;
            options.operation_names.insert(kind, name.clone());
        }

        Ok(options)
    }
}

impl TryFrom<TracingSettings> for PluginOptions {
    type Error = DatabaseError;

    fn try_from(settings: TracingSettings) -> Result<Self> {
        settings.to_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let settings = TracingSettings::from_json("{}").unwrap();
        assert_eq!(settings, TracingSettings::default());

        let options = settings.to_options().unwrap();
        assert!(!options.log_result());
        assert!(options.log_sql_parameters());
        assert!(options.tracer().is_global());
    }

    #[test]
    fn test_settings_to_options() {
        let settings = TracingSettings::from_json(
            r#"{"log_result": true, "log_sql_parameters": false,
                "operation_names": {"query": "orders.select"}}"#,
        )
        .unwrap();

        let options = PluginOptions::try_from(settings).unwrap();
        assert!(options.log_result());
        assert!(!options.log_sql_parameters());
        assert_eq!(options.operation_name(OperationKind::Query), "orders.select");
        assert_eq!(options.operation_name(OperationKind::Create), "create");
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let settings = TracingSettings::from_json(r#"{"operation_names": {"upsert": "x"}}"#).unwrap();
        let err = settings.to_options().unwrap_err();
        assert_eq!(err, DatabaseError::Config("Unknown operation: upsert".into()));
    }

    #[test]
    fn test_invalid_json() {
        let err = TracingSettings::from_json("{not json").unwrap_err();
        assert!(matches!(err, DatabaseError::Config(_)));
    }
}
