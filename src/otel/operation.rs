//! Operation vocabulary.
//!
//! The closed set of instrumented operation kinds, plus the stage
//! identifiers used as hook registration keys.

use std::fmt;

/// Database operation kinds (one host callback processor each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// INSERT through the model API
    Create,
    /// UPDATE through the model API
    Update,
    /// SELECT materialized into models
    Query,
    /// DELETE through the model API
    Delete,
    /// Row-level scan
    Row,
    /// Raw SQL execution
    Raw,
}

impl OperationKind {
    /// All kinds, in registration order.
    pub const ALL: [OperationKind; 6] = [
        Self::Create,
        Self::Update,
        Self::Query,
        Self::Delete,
        Self::Row,
        Self::Raw,
    ];

    /// Get operation name as string (also the default span name).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Query => "query",
            Self::Delete => "delete",
            Self::Row => "row",
            Self::Raw => "raw",
        }
    }

    /// Name of the host's built-in step the hooks are positioned around.
    pub fn builtin_step(&self) -> &'static str {
        match self {
            Self::Create => "db:create",
            Self::Update => "db:update",
            Self::Query => "db:query",
            Self::Delete => "db:delete",
            Self::Row => "db:row",
            Self::Raw => "db:raw",
        }
    }

    /// Stage for the hook that runs before the built-in step.
    pub fn before_stage(self) -> Stage {
        Stage::new(self, Phase::Before)
    }

    /// Stage for the hook that runs after the built-in step.
    pub fn after_stage(self) -> Stage {
        Stage::new(self, Phase::After)
    }

    /// Parse an operation name (as produced by `as_str`).
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the built-in step a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Before,
    After,
}

/// Hook registration key, e.g. `otel:before_create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stage {
    kind: OperationKind,
    phase: Phase,
}

impl Stage {
    pub fn new(kind: OperationKind, phase: Phase) -> Self {
        Self { kind, phase }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Registration name.
    pub fn name(&self) -> &'static str {
        use OperationKind::*;
        match (self.phase, self.kind) {
            (Phase::Before, Create) => "otel:before_create",
            (Phase::After, Create) => "otel:after_create",
            (Phase::Before, Update) => "otel:before_update",
            (Phase::After, Update) => "otel:after_update",
            (Phase::Before, Query) => "otel:before_query",
            (Phase::After, Query) => "otel:after_query",
            (Phase::Before, Delete) => "otel:before_delete",
            (Phase::After, Delete) => "otel:after_delete",
            (Phase::Before, Row) => "otel:before_row",
            (Phase::After, Row) => "otel:after_row",
            (Phase::Before, Raw) => "otel:before_raw",
            (Phase::After, Raw) => "otel:after_raw",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_operation_names() {
        assert_eq!(OperationKind::Create.as_str(), "create");
        assert_eq!(OperationKind::Raw.as_str(), "raw");
        assert_eq!(OperationKind::Query.builtin_step(), "db:query");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(OperationKind::Create.before_stage().name(), "otel:before_create");
        assert_eq!(OperationKind::Row.after_stage().name(), "otel:after_row");
        assert_eq!(OperationKind::Delete.after_stage().to_string(), "otel:after_delete");
    }

    #[test]
    fn test_stage_names_are_unique() {
        let names: HashSet<_> = OperationKind::ALL
            .iter()
            .flat_map(|k| [k.before_stage().name(), k.after_stage().name()])
            .collect();
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn test_parse_round_trip() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(OperationKind::parse("upsert"), None);
    }
}
