//! Aggregation of hook registration failures.

use crate::otel::operation::Stage;
use crate::types::{DatabaseError, Result};

/// Collects failures from a multi-step registration sequence.
///
/// Registration keeps going after a failure; the caller learns about every
/// failing stage at the end instead of only the first one.
#[derive(Debug, Default)]
pub struct ErrorAccumulator {
    errs: Vec<String>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self {
            errs: Vec::with_capacity(12),
        }
    }

    /// Record the outcome of one stage. `Ok` is a no-op.
    ///
    /// # Arguments
    ///
    /// * `stage` - Stage that was being registered
    /// * `result` - Outcome of the registration
    pub fn add(&mut self, stage: Stage, result: Result<()>) {
        if let Err(err) = result {
            self.errs.push(format!("{}:{}", stage.name(), err));
        }
    }

    pub fn len(&self) -> usize {
        self.errs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errs.is_empty()
    }

    /// Convert into a single result.
    ///
    /// # Returns
    ///
    /// `Ok(())` when nothing failed, otherwise `DatabaseError::Registration`
    /// with every entry joined by `;` in insertion order
    pub fn into_result(self) -> Result<()> {
        if self.errs.is_empty() {
            return Ok(());
        }
        Err(DatabaseError::Registration(self.errs.join(";")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otel::operation::OperationKind;

    #[test]
    fn test_empty_is_ok() {
        let acc = ErrorAccumulator::new();
        assert!(acc.is_empty());
        assert!(acc.into_result().is_ok());
    }

    #[test]
    fn test_ok_results_are_ignored() {
        let mut acc = ErrorAccumulator::new();
        acc.add(OperationKind::Create.before_stage(), Ok(()));
        acc.add(OperationKind::Create.after_stage(), Ok(()));
        assert_eq!(acc.len(), 0);
    }

    #[test]
    fn test_entries_joined_in_order() {
        let mut acc = ErrorAccumulator::new();
        acc.add(
            OperationKind::Query.after_stage(),
            Err(DatabaseError::Registration("duplicate".into())),
        );
        acc.add(OperationKind::Raw.before_stage(), Ok(()));
        acc.add(
            OperationKind::Create.before_stage(),
            Err(DatabaseError::Registration("unknown step".into())),
        );

        let err = acc.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "otel:after_query:duplicate;otel:before_create:unknown step"
        );
    }
}
