//! Single-flight execution keyed by name.
//!
//! Concurrent callers asking for the same key share one in-flight attempt.
//! The attempt runs on its own task, so a caller that gives up does not
//! cancel it for the others. Once it resolves the key is released and the
//! next call starts a fresh attempt.

use crate::types::{DatabaseError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

type Outcome<T> = Option<Result<T>>;

/// Deduplicates concurrent work per key.
pub struct Group<T> {
    calls: Arc<Mutex<HashMap<String, watch::Receiver<Outcome<T>>>>>,
}

impl<T> Group<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `work` for `key` unless an attempt is already in flight.
    ///
    /// # Arguments
    ///
    /// * `key` - Deduplication key
    /// * `work` - Future to spawn if this caller becomes the leader; dropped
    ///   unpolled otherwise
    ///
    /// # Returns
    ///
    /// The outcome of the shared attempt, identical for every caller that
    /// joined it
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let group = Group::new();
    /// let db = group.work("orders", async move { connector.open(&dsn).await }).await?;
    /// ```
    pub async fn work<F>(&self, key: &str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let mut rx = {
            let mut calls = self.calls.lock();
            match calls.get(key) {
                Some(rx) => rx.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    calls.insert(key.to_string(), rx.clone());
                    self.spawn_leader(key.to_string(), tx, work);
                    rx
                }
            }
        };

        let outcome = rx.wait_for(Option::is_some).await.map_err(|_| {
            DatabaseError::initialization(format!("in-flight attempt for {} was dropped", key))
        })?;

        match &*outcome {
            Some(result) => result.clone(),
            None => Err(DatabaseError::initialization(format!(
                "in-flight attempt for {} resolved without a result",
                key
            ))),
        }
    }

    /// Number of keys with an unresolved attempt.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    fn spawn_leader<F>(&self, key: String, tx: watch::Sender<Outcome<T>>, work: F)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let calls = Arc::clone(&self.calls);
        tokio::spawn(async move {
            // Inner task so a panic in `work` still resolves the waiters
            let result = match tokio::spawn(work).await {
                Ok(result) => result,
                Err(e) => Err(DatabaseError::initialization(format!(
                    "attempt for {} failed: {}",
                    key, e
                ))),
            };

            let _ = tx.send(Some(result));
            calls.lock().remove(&key);
        });
    }
}

impl<T> Default for Group<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
