//! Shared database handle.
//!
//! A `Database` bundles the dialect, the driver, the callback pipelines and
//! installed plugins. Cloning is cheap and all clones refer to the same
//! handle.

use crate::host::callbacks::{Callbacks, Step};
use crate::host::dialect::{Dialect, Driver};
use crate::host::statement::Statement;
use crate::otel::operation::OperationKind;
use crate::types::{DatabaseError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Extension installed on a handle (e.g. instrumentation).
pub trait Plugin: Send + Sync {
    /// Unique plugin name, used for duplicate detection.
    fn name(&self) -> &str;

    /// Install the plugin's hooks on `db`.
    fn initialize(&self, db: &Database) -> Result<()>;
}

struct Inner {
    name: String,
    dialect: Arc<dyn Dialect>,
    driver: Arc<dyn Driver>,
    callbacks: Callbacks,
    plugins: RwLock<HashMap<String, Arc<dyn Plugin>>>,
}

/// Database handle shared across callers.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    /// Create a handle.
    ///
    /// # Arguments
    ///
    /// * `name` - Database name (`db.name` attribute)
    /// * `dialect` - SQL dialect used to render statements
    /// * `driver` - Executes built-in steps
    ///
    /// # Returns
    ///
    /// New `Database` with empty hook pipelines
    pub fn new(name: impl Into<String>, dialect: Arc<dyn Dialect>, driver: Arc<dyn Driver>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                dialect,
                driver,
                callbacks: Callbacks::new(),
                plugins: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.inner.dialect.as_ref()
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.inner.callbacks
    }

    /// Check whether two values refer to the same underlying handle.
    pub fn same_handle(&self, other: &Database) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Install a plugin.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::PluginRegistered` if a plugin with the same
    /// name is installed, or whatever `Plugin::initialize` reports. A plugin
    /// whose initialization fails is not recorded, but hooks it managed to
    /// register stay active.
    pub fn use_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
        let name = plugin.name().to_string();
        if self.inner.plugins.read().contains_key(&name) {
            return Err(DatabaseError::PluginRegistered(name));
        }

        plugin.initialize(self)?;

        let mut plugins = self.inner.plugins.write();
        if plugins.contains_key(&name) {
            return Err(DatabaseError::PluginRegistered(name));
        }
        plugins.insert(name, plugin);
        Ok(())
    }

    /// Check whether a plugin is installed.
    pub fn has_plugin(&self, name: &str) -> bool {
        self.inner.plugins.read().contains_key(name)
    }

    /// Run one operation through its pipeline.
    ///
    /// Every hook runs even when an earlier step failed; the built-in step is
    /// skipped once `statement.error` is set.
    ///
    /// # Arguments
    ///
    /// * `kind` - Operation kind
    /// * `statement` - Per-call statement
    ///
    /// # Returns
    ///
    /// Rows affected, or the first error recorded on the statement
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut stmt = Statement::new("SELECT * FROM users WHERE id = ?").with_vars(vec![json!(42)]);
    /// let rows = db.run(OperationKind::Query, &mut stmt).await?;
    /// ```
    pub async fn run(&self, kind: OperationKind, statement: &mut Statement) -> Result<u64> {
        for step in self.inner.callbacks.snapshot(kind) {
            match step {
                Step::Hook { hook, .. } => hook(self, statement),
                Step::Builtin(_) => {
                    if statement.error.is_some() {
                        continue;
                    }
                    match self.inner.driver.execute(kind, statement).await {
                        Ok(rows) => statement.rows_affected = rows,
                        Err(err) => statement.error = Some(err),
                    }
                }
            }
        }

        match &statement.error {
            Some(err) => Err(err.clone()),
            None => Ok(statement.rows_affected),
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name)
            .field("dialect", &self.inner.dialect.name())
            .finish()
    }
}
