//! Error types for instrumentation and connection management.
//!
//! Uses `thiserror` for ergonomic error definitions. Every variant carries
//! owned strings so one initialization outcome can be cloned out to all
//! callers waiting on it.

use thiserror::Error;

/// Error type for plugin setup, connection initialization and statement execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// One or more hook registrations failed (entries joined by `;`)
    #[error("{0}")]
    Registration(String),

    /// A plugin with the same name is already installed on the handle
    #[error("Plugin already registered: {0}")]
    PluginRegistered(String),

    /// The underlying connection could not be opened
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// The operation succeeded but matched no record
    #[error("record not found")]
    RecordNotFound,

    /// Statement execution failed in the driver
    #[error("Query execution failed: {0}")]
    Query(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Sentinel for "query succeeded, nothing matched".
///
/// Drivers report this unchanged so callers can tell an empty result apart
/// from a failure.
pub const ERR_NOT_FOUND: DatabaseError = DatabaseError::RecordNotFound;

impl DatabaseError {
    /// Create an initialization error with context.
    ///
    /// # Arguments
    ///
    /// * `msg` - Error message
    ///
    /// # Returns
    ///
    /// `DatabaseError::Initialization`
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Create a query error with context.
    ///
    /// # Arguments
    ///
    /// * `msg` - Error message
    ///
    /// # Returns
    ///
    /// `DatabaseError::Query`
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Check whether this is the record-not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DatabaseError>;
