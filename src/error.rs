//! Error types for building, decomposing and rendering queries.

use thiserror::Error;

/// Errors raised while a query is assembled, decomposed or rendered.
///
/// Every variant is a construction-time or decomposition-time fault. None of
/// them are retryable and none of them are ever swallowed by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The same source handle was bound to a second alias.
    #[error("source {source_name} is already bound as {alias}")]
    DuplicateSource {
        /// Display name of the source.
        source_name: String,
        /// The alias the source is already bound to.
        alias: String,
    },

    /// An explicit alias name is already taken in this query.
    #[error("alias {0} is already in use")]
    DuplicateAlias(String),

    /// An alias name or id does not resolve in this query.
    #[error("unknown alias: {0}")]
    UnknownAlias(String),

    /// A node id does not resolve in this query.
    #[error("unknown node: #{0}")]
    UnknownNode(usize),

    /// A constraint id does not resolve in this query.
    #[error("unknown constraint: #{0}")]
    UnknownConstraint(usize),

    /// A subquery used as a value must select exactly one node.
    #[error("subquery must select exactly one node, found {selected}")]
    InvalidSubqueryShape {
        /// Number of nodes the subquery selects.
        selected: usize,
    },

    /// An operand kind is not accepted in the given position.
    #[error("unsupported operand for {position}: {found}")]
    UnsupportedOperand {
        /// Where the operand was used, e.g. "left of CONTAINS".
        position: String,
        /// What was found there.
        found: String,
    },

    /// A constraint set is empty without a truth marker, has the wrong
    /// number of children, or reuses an attached constraint.
    #[error("malformed constraint set: {0}")]
    MalformedConstraintSet(String),

    /// A name does not have identifier shape.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A computed expression has the wrong number of arguments.
    #[error("{op} takes {expected} argument(s), got {actual}")]
    InvalidExpression {
        /// Operator name.
        op: &'static str,
        /// Required argument count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// A query was frozen without any selected node.
    #[error("query selects nothing")]
    EmptySelection,
}

impl QueryError {
    /// Creates an unsupported-operand error.
    #[must_use]
    pub fn unsupported(position: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnsupportedOperand { position: position.into(), found: found.into() }
    }

    /// Creates a malformed-set error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedConstraintSet(reason.into())
    }
}

/// Result type for query model operations.
pub type QueryResult<T> = Result<T, QueryError>;
