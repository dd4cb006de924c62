//! Callback pipelines, one per operation kind.
//!
//! Each pipeline starts with a single built-in step (`db:<kind>`). Hooks are
//! inserted before or after a named step, built-in or previously
//! registered.

use crate::host::database::Database;
use crate::host::statement::Statement;
use crate::otel::operation::OperationKind;
use crate::types::{DatabaseError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Hook invoked with the handle and the in-flight statement.
pub type HookFn = Arc<dyn Fn(&Database, &mut Statement) + Send + Sync>;

/// Insertion point relative to a named step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<'a> {
    Before(&'a str),
    After(&'a str),
}

#[derive(Clone)]
pub(crate) enum Step {
    Builtin(&'static str),
    Hook {
        name: String,
        /// Step this hook was registered after, if any
        after: Option<String>,
        hook: HookFn,
    },
}

impl Step {
    fn name(&self) -> &str {
        match self {
            Step::Builtin(name) => name,
            Step::Hook { name, .. } => name,
        }
    }
}

/// Hook registry for a database handle.
pub struct Callbacks {
    processors: RwLock<HashMap<OperationKind, Vec<Step>>>,
}

impl Callbacks {
    pub fn new() -> Self {
        let processors = OperationKind::ALL
            .into_iter()
            .map(|kind| (kind, vec![Step::Builtin(kind.builtin_step())]))
            .collect();
        Self {
            processors: RwLock::new(processors),
        }
    }

    /// Register a hook on the pipeline of `kind`.
    ///
    /// # Arguments
    ///
    /// * `kind` - Operation pipeline
    /// * `position` - Insertion point relative to an existing step
    /// * `name` - Unique hook name within the pipeline
    /// * `hook` - Hook function
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Registration` if `name` is already taken or
    /// the insertion point does not exist
    pub fn register(
        &self,
        kind: OperationKind,
        position: Position<'_>,
        name: &str,
        hook: HookFn,
    ) -> Result<()> {
        let mut processors = self.processors.write();
        let steps = processors.entry(kind).or_default();

        if steps.iter().any(|step| step.name() == name) {
            return Err(DatabaseError::Registration(format!(
                "callback {} already registered for {}",
                name, kind
            )));
        }

        let anchor = match position {
            Position::Before(anchor) | Position::After(anchor) => anchor,
        };
        let idx = steps
            .iter()
            .position(|step| step.name() == anchor)
            .ok_or_else(|| {
                DatabaseError::Registration(format!(
                    "insertion point {} not found for {}",
                    anchor, kind
                ))
            })?;

        match position {
            Position::Before(_) => {
                steps.insert(
                    idx,
                    Step::Hook {
                        name: name.to_string(),
                        after: None,
                        hook,
                    },
                );
            }
            Position::After(_) => {
                // Keep earlier hooks anchored after the same step ahead of this one
                let mut at = idx + 1;
                while let Some(Step::Hook { after: Some(a), .. }) = steps.get(at) {
                    if a != anchor {
                        break;
                    }
                    at += 1;
                }
                steps.insert(
                    at,
                    Step::Hook {
                        name: name.to_string(),
                        after: Some(anchor.to_string()),
                        hook,
                    },
                );
            }
        }

        Ok(())
    }

    /// Remove a hook by name.
    ///
    /// # Returns
    ///
    /// `true` if a hook was removed (built-in steps are never removed)
    pub fn remove(&self, kind: OperationKind, name: &str) -> bool {
        let mut processors = self.processors.write();
        let Some(steps) = processors.get_mut(&kind) else {
            return false;
        };
        let before = steps.len();
        steps.retain(|step| matches!(step, Step::Builtin(_)) || step.name() != name);
        steps.len() != before
    }

    /// Step names of a pipeline, in execution order.
    pub fn step_names(&self, kind: OperationKind) -> Vec<String> {
        self.processors
            .read()
            .get(&kind)
            .map(|steps| steps.iter().map(|s| s.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Snapshot of a pipeline so it can run without holding the lock.
    pub(crate) fn snapshot(&self, kind: OperationKind) -> Vec<Step> {
        self.processors.read().get(&kind).cloned().unwrap_or_default()
    }
}

impl Default for Callbacks {
    fn default() -> Self {
        Self::new()
    }
}
