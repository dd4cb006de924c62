//! Minimal database host.
//!
//! The extension surface the instrumentation plugs into: per-kind callback
//! pipelines, a per-call statement, a dialect for rendering SQL, and the
//! driver/connector seams. SQL execution itself is left to `Driver`
//! implementations.

pub mod callbacks;
pub mod database;
pub mod dialect;
pub mod statement;

pub use callbacks::{Callbacks, HookFn, Position};
pub use database::{Database, Plugin};
pub use dialect::{Connector, Dialect, Driver, MySqlDialect};
pub use statement::{CallState, Statement};
