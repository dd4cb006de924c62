//! # Percolate SQL Trace
//!
//! OpenTelemetry span hooks for SQL database access, and a registry that
//! opens each named database handle exactly once.
//!
//! ## Architecture
//!
//! - **Host**: Database handle with per-operation callback pipelines
//! - **Otel**: Tracing plugin registering before/after span hooks
//! - **Registry**: Single-flight, never-evicting cache of instrumented handles
//! - **Config**: Serializable plugin settings
//!
//! ## Example
//!
//! ```rust,ignore
//! use percolate_sqltrace::{ConnectionRegistry, OperationKind, Statement};
//!
//! let registry = Arc::new(ConnectionRegistry::new(Arc::new(MySqlConnector)));
//! let db = registry.get("orders", "mysql://app@db/orders").await?;
//!
//! let mut stmt = Statement::new("SELECT * FROM orders WHERE id = ?").with_vars(vec![json!(42)]);
//! db.run(OperationKind::Query, &mut stmt).await?;
//! ```

pub mod config;
pub mod host;
pub mod logging;
pub mod otel;
pub mod registry;
pub mod types;

pub use config::TracingSettings;
pub use host::{Connector, Database, Dialect, Driver, MySqlDialect, Plugin, Statement};
pub use otel::{OperationKind, PluginOptions, TracingPlugin};
pub use registry::ConnectionRegistry;
pub use types::{DatabaseError, Result, ERR_NOT_FOUND};
