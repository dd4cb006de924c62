//! Named database handles, opened once and shared.
//!
//! The first request for a name opens the connection, installs the tracing
//! plugin and caches the handle for the life of the registry. Concurrent
//! first requests for the same name share one open; failed opens are not
//! cached.

pub mod singleflight;

use crate::host::{Connector, Database};
use crate::otel::{PluginOptions, TracingPlugin};
use crate::types::Result;
use singleflight::Group;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub use crate::types::ERR_NOT_FOUND;

/// Cache of instrumented database handles keyed by logical name.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Arc::new(ConnectionRegistry::new(Arc::new(MySqlConnector)));
/// let db = registry.get("orders", "mysql://app@db/orders").await?;
/// ```
pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    plugin_options: PluginOptions,
    dbs: Arc<RwLock<HashMap<String, Database>>>,
    group: Group<Database>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    ///
    /// Handles get the tracing plugin with default options.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            plugin_options: PluginOptions::default(),
            dbs: Arc::new(RwLock::new(HashMap::new())),
            group: Group::new(),
        }
    }

    /// Use `options` for the plugin installed on newly opened handles.
    pub fn with_plugin_options(mut self, options: PluginOptions) -> Self {
        self.plugin_options = options;
        self
    }

    /// Get the handle for `name`, opening it with `dsn` on first use.
    ///
    /// `dsn` is ignored once `name` is cached.
    ///
    /// # Arguments
    ///
    /// * `name` - Logical connection name
    /// * `dsn` - Connection string passed to the connector
    ///
    /// # Returns
    ///
    /// Shared handle. Every caller that joined the same open gets the same
    /// handle or the same error.
    pub async fn get(&self, name: &str, dsn: &str) -> Result<Database> {
        if let Some(db) = self.dbs.read().await.get(name) {
            return Ok(db.clone());
        }

        let connector = Arc::clone(&self.connector);
        let dbs = Arc::clone(&self.dbs);
        let options = self.plugin_options.clone();
        let name_owned = name.to_string();
        let dsn = dsn.to_string();

        self.group
            .work(name, async move {
                // An earlier attempt may have published between our miss and
                // taking the in-flight slot
                if let Some(db) = dbs.read().await.get(&name_owned) {
                    return Ok(db.clone());
                }

                debug!(name = %name_owned, "opening database");
                let db = connector.open(&dsn).await?;

                if let Err(e) = db.use_plugin(Arc::new(TracingPlugin::new(options))) {
                    warn!(name = %name_owned, error = %e, "tracing plugin partially installed");
                }

                dbs.write().await.insert(name_owned.clone(), db.clone());
                info!(name = %name_owned, db = db.name(), "database registered");
                Ok(db)
            })
            .await
    }

    /// Number of cached handles.
    pub async fn len(&self) -> usize {
        self.dbs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.dbs.read().await.is_empty()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.dbs.read().await.contains_key(name)
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("in_flight", &self.group.in_flight())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::database::test_support::mysql;
    use crate::otel::{OperationKind, PLUGIN_NAME};
    use crate::types::DatabaseError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Connector that counts opens and fails while `failing` is set.
    #[derive(Default)]
    struct CountingConnector {
        opens: AtomicUsize,
        failing: Mutex<bool>,
        dsns: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        async fn open(&self, dsn: &str) -> Result<Database> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.dsns.lock().push(dsn.to_string());
            tokio::time::sleep(Duration::from_millis(50)).await;
            if *self.failing.lock() {
                return Err(DatabaseError::initialization("connection refused"));
            }
            Ok(mysql("orders", Ok(1)))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_opens_once() {
        let connector = Arc::new(CountingConnector::default());
        let registry = Arc::new(ConnectionRegistry::new(connector.clone()));

        let mut handles = Vec::new();
        for _ in 0..12 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { registry.get("orders", "dsn-a").await }));
        }

        let mut dbs = Vec::new();
        for handle in handles {
            dbs.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(connector.opens.load(Ordering::SeqCst), 1);
        assert!(dbs.iter().all(|db| db.same_handle(&dbs[0])));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_cached_handle_ignores_dsn() {
        let connector = Arc::new(CountingConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());

        let first = registry.get("orders", "dsn-a").await.unwrap();
        let second = registry.get("orders", "dsn-b").await.unwrap();

        assert!(first.same_handle(&second));
        assert_eq!(connector.opens.load(Ordering::SeqCst), 1);
        assert_eq!(*connector.dsns.lock(), vec!["dsn-a".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failed_open_shared_and_retried() {
        let connector = Arc::new(CountingConnector::default());
        *connector.failing.lock() = true;
        let registry = Arc::new(ConnectionRegistry::new(connector.clone()));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { registry.get("orders", "dsn").await }));
        }
        for handle in handles {
            assert_eq!(
                handle.await.unwrap().unwrap_err(),
                DatabaseError::initialization("connection refused")
            );
        }
        assert_eq!(connector.opens.load(Ordering::SeqCst), 1);
        assert!(!registry.contains("orders").await);

        *connector.failing.lock() = false;
        registry.get("orders", "dsn").await.unwrap();
        assert_eq!(connector.opens.load(Ordering::SeqCst), 2);
        assert!(registry.contains("orders").await);
    }

    #[tokio::test]
    async fn test_published_handle_is_instrumented() {
        let registry = ConnectionRegistry::new(Arc::new(CountingConnector::default()));
        let db = registry.get("orders", "dsn").await.unwrap();

        assert!(db.has_plugin(PLUGIN_NAME));
        assert_eq!(
            db.callbacks().step_names(OperationKind::Query),
            vec!["otel:before_query", "db:query", "otel:after_query"]
        );
    }

    #[tokio::test]
    async fn test_distinct_names_open_separately() {
        let connector = Arc::new(CountingConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());

        let a = registry.get("a", "dsn").await.unwrap();
        let b = registry.get("b", "dsn").await.unwrap();

        assert!(!a.same_handle(&b));
        assert_eq!(connector.opens.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len().await, 2);
    }
}
