use std::sync::Arc;

use crate::ast::{ClassOp, Comparator, ContainsOp, MembershipOp, NodeId, Query, SetOp};
use crate::value::Value;

/// Index of a constraint in its query's constraint arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId {
    pub(crate) owner: u64,
    pub(crate) index: usize,
}

impl ConstraintId {
    pub(crate) const fn new(owner: u64, index: usize) -> Self {
        ConstraintId { owner, index }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

/// Right side of a class-identity constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassOperand {
    /// Another class node or object reference
    Node(NodeId),
    /// A class name, rendered double-quoted like a literal
    Type(String),
}

/// Right side of a simple comparison.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A node of the same query
    Node(NodeId),
    /// A single-column subquery
    Query(Arc<Query>),
    /// A literal value
    Literal(Value),
}

/// One position in a query's constraint tree.
///
/// Only [`Constraint::Set`] has children. Every other variant is a leaf
/// with a fixed left / operator / right shape.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Class identity
    ///
    /// # Examples
    /// ```text
    /// a1_ = "org.model.Dog"
    /// owner != a2_
    /// ```
    ClassIdentity {
        left: NodeId,
        op: ClassOp,
        right: ClassOperand,
    },

    /// Relationship containment
    ///
    /// # Example
    /// ```text
    /// pets DOES NOT CONTAIN a2_
    /// ```
    Containment {
        left: NodeId,
        op: ContainsOp,
        right: NodeId,
    },

    /// Binary comparison, or a unary null check when `right` is `None`
    ///
    /// # Examples
    /// ```text
    /// age > "30"
    /// name IS NULL
    /// ```
    Comparison {
        left: NodeId,
        op: Comparator,
        right: Option<Operand>,
    },

    /// Membership in a single-column subquery
    ///
    /// # Example
    /// ```text
    /// a1_ IN (SELECT a1_ FROM Dog AS a1_)
    /// ```
    Subquery {
        left: NodeId,
        op: MembershipOp,
        query: Arc<Query>,
    },

    /// Boolean combination of other constraints
    Set(ConstraintSet),
}

impl Constraint {
    pub fn is_set(&self) -> bool {
        matches!(self, Constraint::Set(_))
    }

    /// The constraint as a set, if it is one.
    pub fn as_set(&self) -> Option<&ConstraintSet> {
        match self {
            Constraint::Set(set) => Some(set),
            _ => None,
        }
    }
}

/// An ordered combination of child constraints.
///
/// An empty set is only created through the truth markers: an empty AND is
/// always true and an empty OR is always false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSet {
    pub(crate) op: SetOp,
    pub(crate) children: Vec<ConstraintId>,
}

impl ConstraintSet {
    pub fn op(&self) -> SetOp {
        self.op
    }

    pub fn children(&self) -> &[ConstraintId] {
        &self.children
    }

    /// The constant this set stands for, if it is a truth marker.
    pub fn truth(&self) -> Option<bool> {
        if !self.children.is_empty() {
            return None;
        }
        match self.op {
            SetOp::And => Some(true),
            SetOp::Or => Some(false),
            SetOp::Not => None,
        }
    }
}
