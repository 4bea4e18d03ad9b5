//! Canonical text rendering of queries and constraint trees.
//!
//! The canonical form is a pure function of the query's structure: sources
//! appear in registration order, constraints in child order, and nothing is
//! taken from an unordered map or from object addresses. Rendering the same
//! query twice always produces the same bytes.
//!
//! # Format
//!
//! ```text
//! SELECT [DISTINCT] node, ... FROM Class AS alias, (subquery) AS alias
//!     [WHERE constraints] [GROUP BY node, ...] [ORDER BY node [DESC], ...]
//! ```
//!
//! Leaf constraints render as `left op right` (see [`crate::projection`]).
//! Sets join their children with `AND` / `OR`, parenthesizing any child that
//! is itself a set, and `NOT` renders as `NOT (child)`.
//!
//! # Examples
//!
//! ```
//! use fql::ast::{Comparator, Operand, QueryBuilder, Source};
//! use fql::output::to_canonical;
//!
//! let mut builder = QueryBuilder::new();
//! let p = builder.bind_source(&Source::class("Person").unwrap()).unwrap();
//! let name = builder.field(p, "name").unwrap();
//! builder.add_selected(name).unwrap();
//! let c = builder.compare(name, Comparator::IsNull, None).unwrap();
//! builder.set_root_constraint(c).unwrap();
//! let query = builder.build().unwrap();
//!
//! assert_eq!(
//!     to_canonical(&query).unwrap(),
//!     "SELECT a1_.name FROM Person AS a1_ WHERE name IS NULL"
//! );
//! ```

use crate::ast::{Constraint, ConstraintId, ConstraintSet, Direction, Node, NodeId, Query, SetOp, Source};
use crate::error::QueryResult;
use crate::projection;

/// Renders one query. Nested queries get a printer of their own.
pub struct CanonicalPrinter<'q> {
    query: &'q Query,
}

impl<'q> CanonicalPrinter<'q> {
    pub fn new(query: &'q Query) -> Self {
        CanonicalPrinter { query }
    }

    pub fn print_query(&self) -> QueryResult<String> {
        let query = self.query;
        let mut result = String::from("SELECT ");
        if query.is_distinct() {
            result.push_str("DISTINCT ");
        }
        result.push_str(&self.print_node_list(query.selected())?);

        if !query.aliases().is_empty() {
            let mut from = Vec::with_capacity(query.aliases().len());
            for (_, alias) in query.aliases().iter() {
                let source = match alias.source().as_ref() {
                    Source::Class(name) => name.clone(),
                    Source::Subquery(sub) => format!("({})", CanonicalPrinter::new(sub).print_query()?),
                };
                from.push(format!("{} AS {}", source, alias.name()));
            }
            result.push_str(" FROM ");
            result.push_str(&from.join(", "));
        }

        let root = query.constraint(query.root())?;
        if root.as_set().and_then(ConstraintSet::truth) != Some(true) {
            result.push_str(" WHERE ");
            result.push_str(&self.print_constraint(query.root())?);
        }

        if !query.group_by().is_empty() {
            result.push_str(" GROUP BY ");
            result.push_str(&self.print_node_list(query.group_by())?);
        }

        if !query.order_by().is_empty() {
            let mut items = Vec::with_capacity(query.order_by().len());
            for order in query.order_by() {
                let text = self.print_node(order.node)?;
                items.push(match order.direction {
                    Direction::Ascending => text,
                    Direction::Descending => format!("{} DESC", text),
                });
            }
            result.push_str(" ORDER BY ");
            result.push_str(&items.join(", "));
        }

        Ok(result)
    }

    pub fn print_constraint(&self, id: ConstraintId) -> QueryResult<String> {
        match self.query.constraint(id)? {
            Constraint::Set(set) => self.print_set(set),
            _ => {
                let parts = projection::decompose_leaf(self.query, id)?;
                Ok(parts.to_string())
            }
        }
    }

    fn print_set(&self, set: &ConstraintSet) -> QueryResult<String> {
        if let Some(truth) = set.truth() {
            return Ok(truth.to_string());
        }
        match set.op() {
            SetOp::Not => {
                // the builder guarantees exactly one child
                let child = self.print_constraint(set.children()[0])?;
                Ok(format!("NOT ({})", child))
            }
            SetOp::And | SetOp::Or => {
                let mut parts = Vec::with_capacity(set.children().len());
                for &child in set.children() {
                    parts.push(self.print_child(child)?);
                }
                Ok(parts.join(&format!(" {} ", set.op())))
            }
        }
    }

    /// A child of a set, parenthesized when it is a non-constant set itself.
    fn print_child(&self, id: ConstraintId) -> QueryResult<String> {
        let text = self.print_constraint(id)?;
        match self.query.constraint(id)? {
            Constraint::Set(set) if set.truth().is_none() => Ok(format!("({})", text)),
            _ => Ok(text),
        }
    }

    /// Node text with aliases, as used in the select list and on the right
    /// of constraints.
    pub fn print_node(&self, id: NodeId) -> QueryResult<String> {
        Ok(match self.query.node(id)? {
            Node::Class(alias) => self.query.aliases().get(*alias)?.name().to_string(),
            Node::Field { alias, name, secondary } => {
                let alias = self.query.aliases().get(*alias)?.name();
                match secondary {
                    Some(secondary) => format!("{}.{}.{}", alias, name, secondary),
                    None => format!("{}.{}", alias, name),
                }
            }
            Node::Reference { alias, name, .. } => {
                format!("{}.{}", self.query.aliases().get(*alias)?.name(), name)
            }
            Node::Value(value) => value.node_text(),
            Node::Expression { op, args } => {
                let args = args
                    .iter()
                    .map(|&arg| self.print_node(arg))
                    .collect::<QueryResult<Vec<_>>>()?;
                if op.is_infix() {
                    format!("({})", args.join(&format!(" {} ", op)))
                } else {
                    format!("{}({})", op, args.join(", "))
                }
            }
            Node::Function { func, arg } => match arg {
                Some(arg) => format!("{}({})", func, self.print_node(*arg)?),
                None => format!("{}(*)", func),
            },
        })
    }

    fn print_node_list(&self, nodes: &[NodeId]) -> QueryResult<String> {
        let items = nodes
            .iter()
            .map(|&node| self.print_node(node))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(items.join(", "))
    }
}

// Convenience functions

/// Renders a whole query.
pub fn to_canonical(query: &Query) -> QueryResult<String> {
    CanonicalPrinter::new(query).print_query()
}

/// Renders the constraint subtree rooted at `id`.
pub fn constraint_to_canonical(query: &Query, id: ConstraintId) -> QueryResult<String> {
    CanonicalPrinter::new(query).print_constraint(id)
}

/// Renders one node with its alias.
pub fn node_to_canonical(query: &Query, id: NodeId) -> QueryResult<String> {
    CanonicalPrinter::new(query).print_node(id)
}
