//! Left / operator / right projection of single constraints.
//!
//! A leaf constraint is split into three texts without looking into any
//! composite structure:
//!
//! - **left**: a field renders as its bare path (`age`, `address.city`) and a
//!   reference as its relationship name (`pets`), both without the alias;
//!   every other node kind renders with its alias through
//!   [`CanonicalPrinter::print_node`];
//! - **operator**: the symbol of the constraint's operator;
//! - **right**: node text for nodes, the nested query's canonical text for
//!   subqueries (unparenthesized here), a double-quoted literal for values
//!   and for the class name of a class-identity check.
//!
//! Constraint sets have no such shape and project to `None`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::ast::{ClassOperand, Constraint, ConstraintId, Node, NodeId, Operand, Query};
use crate::error::{QueryError, QueryResult};
use crate::output::CanonicalPrinter;

/// Right operand text of a leaf constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RightOperand {
    /// Node text or quoted literal
    Text(String),
    /// Canonical text of a nested query, without parentheses
    Query(String),
}

impl RightOperand {
    pub fn text(&self) -> &str {
        match self {
            RightOperand::Text(text) | RightOperand::Query(text) => text,
        }
    }
}

/// The three texts of a leaf constraint.
///
/// Its `Display` form is exactly the canonical rendering of the leaf,
/// including the parentheses around a nested query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    left: String,
    op: &'static str,
    right: Option<RightOperand>,
}

impl Decomposition {
    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn op(&self) -> &'static str {
        self.op
    }

    /// Right text, `None` for null checks.
    pub fn right(&self) -> Option<&str> {
        self.right.as_ref().map(RightOperand::text)
    }

    pub fn right_operand(&self) -> Option<&RightOperand> {
        self.right.as_ref()
    }
}

impl fmt::Display for Decomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.left, self.op)?;
        match &self.right {
            Some(RightOperand::Text(text)) => write!(f, " {}", text),
            Some(RightOperand::Query(text)) => write!(f, " ({})", text),
            None => Ok(()),
        }
    }
}

/// Splits constraint `id` of `query`, `None` when it is a set.
pub fn decompose(query: &Query, id: ConstraintId) -> QueryResult<Option<Decomposition>> {
    if query.constraint(id)?.is_set() {
        return Ok(None);
    }
    decompose_leaf(query, id).map(Some)
}

pub(crate) fn decompose_leaf(query: &Query, id: ConstraintId) -> QueryResult<Decomposition> {
    let constraint = query.constraint(id)?;
    let (Some(left), Some(op)) = (left_text(query, id)?, op_text(constraint)) else {
        return Err(QueryError::unsupported("decomposition", "constraint set"));
    };
    Ok(Decomposition { left, op, right: right_operand(query, constraint)? })
}

/// Left text of constraint `id`, `None` for a set.
pub fn left_text(query: &Query, id: ConstraintId) -> QueryResult<Option<String>> {
    let left = match query.constraint(id)? {
        Constraint::ClassIdentity { left, .. }
        | Constraint::Containment { left, .. }
        | Constraint::Comparison { left, .. }
        | Constraint::Subquery { left, .. } => *left,
        Constraint::Set(_) => return Ok(None),
    };
    left_node_text(query, left).map(Some)
}

fn left_node_text(query: &Query, id: NodeId) -> QueryResult<String> {
    Ok(match query.node(id)? {
        Node::Field { name, secondary: Some(secondary), .. } => format!("{}.{}", name, secondary),
        Node::Field { name, secondary: None, .. } => name.clone(),
        Node::Reference { name, .. } => name.clone(),
        Node::Class(_) | Node::Value(_) | Node::Expression { .. } | Node::Function { .. } => {
            CanonicalPrinter::new(query).print_node(id)?
        }
    })
}

/// Operator symbol of a constraint, `None` for a set.
pub fn op_text(constraint: &Constraint) -> Option<&'static str> {
    match constraint {
        Constraint::ClassIdentity { op, .. } => Some(op.symbol()),
        Constraint::Containment { op, .. } => Some(op.symbol()),
        Constraint::Comparison { op, .. } => Some(op.symbol()),
        Constraint::Subquery { op, .. } => Some(op.symbol()),
        Constraint::Set(_) => None,
    }
}

/// Right text of constraint `id`, `None` for a set or a null check.
pub fn right_text(query: &Query, id: ConstraintId) -> QueryResult<Option<String>> {
    let constraint = query.constraint(id)?;
    Ok(right_operand(query, constraint)?.map(|right| match right {
        RightOperand::Text(text) | RightOperand::Query(text) => text,
    }))
}

fn right_operand(query: &Query, constraint: &Constraint) -> QueryResult<Option<RightOperand>> {
    let printer = CanonicalPrinter::new(query);
    Ok(match constraint {
        Constraint::ClassIdentity { right: ClassOperand::Node(node), .. }
        | Constraint::Containment { right: node, .. }
        | Constraint::Comparison { right: Some(Operand::Node(node)), .. } => {
            Some(RightOperand::Text(printer.print_node(*node)?))
        }
        Constraint::ClassIdentity { right: ClassOperand::Type(name), .. } => {
            Some(RightOperand::Text(format!("\"{}\"", name)))
        }
        Constraint::Comparison { right: Some(Operand::Literal(value)), .. } => {
            Some(RightOperand::Text(value.quoted()))
        }
        Constraint::Comparison { right: Some(Operand::Query(sub)), .. }
        | Constraint::Subquery { query: sub, .. } => {
            Some(RightOperand::Query(CanonicalPrinter::new(sub).print_query()?))
        }
        Constraint::Comparison { right: None, .. } | Constraint::Set(_) => None,
    })
}

/// A constraint together with the query that owns it.
///
/// Equality is identity: two wrappers are equal only when they hold the same
/// `Arc<Query>` allocation and the same constraint id. Structurally equal
/// trees built separately are not equal; compare their canonical text
/// instead.
#[derive(Debug, Clone)]
pub struct PrintableConstraint {
    query: Arc<Query>,
    constraint: ConstraintId,
}

impl PrintableConstraint {
    pub fn new(query: Arc<Query>, constraint: ConstraintId) -> QueryResult<Self> {
        query.constraint(constraint)?;
        Ok(PrintableConstraint { query, constraint })
    }

    pub fn query(&self) -> &Arc<Query> {
        &self.query
    }

    pub fn id(&self) -> ConstraintId {
        self.constraint
    }

    pub fn constraint(&self) -> QueryResult<&Constraint> {
        self.query.constraint(self.constraint)
    }

    /// Left text, omitting the alias of fields and references.
    pub fn left(&self) -> QueryResult<Option<String>> {
        left_text(&self.query, self.constraint)
    }

    pub fn op(&self) -> QueryResult<Option<&'static str>> {
        Ok(op_text(self.constraint()?))
    }

    pub fn right(&self) -> QueryResult<Option<String>> {
        right_text(&self.query, self.constraint)
    }

    pub fn decompose(&self) -> QueryResult<Option<Decomposition>> {
        decompose(&self.query, self.constraint)
    }

    /// Canonical text of the wrapped subtree.
    pub fn render(&self) -> QueryResult<String> {
        CanonicalPrinter::new(&self.query).print_constraint(self.constraint)
    }
}

impl PartialEq for PrintableConstraint {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.query, &other.query) && self.constraint == other.constraint
    }
}

impl Eq for PrintableConstraint {}

impl Hash for PrintableConstraint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.query).hash(state);
        self.constraint.hash(state);
    }
}
