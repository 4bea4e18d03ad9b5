//! # FQL Query Object Model
//!
//! This module defines the in-memory model of an FQL query: the aliased
//! sources it reads from, the nodes it selects or compares, and the boolean
//! tree of constraints that filters it.
//!
//! ## Architecture Overview
//!
//! The model is organized into focused submodules:
//!
//! - **[aliases]** - Sources and the per-query alias registry
//! - **[expressions]** - Nodes: fields, references, classes, constants, computed values
//! - **[operators]** - Comparators, set combinators, expression operators
//! - **[statements]** - Constraints and constraint sets
//! - **[query]** - The frozen [`Query`] and the [`QueryBuilder`] that assembles it
//!
//! ## Quick Start
//!
//! ```
//! use fql::ast::{Comparator, Operand, QueryBuilder, Source};
//!
//! let person = Source::class("Person").unwrap();
//!
//! let mut builder = QueryBuilder::new();
//! let p = builder.bind_source(&person).unwrap();
//! let p_node = builder.class_node(p).unwrap();
//! let age = builder.field(p, "age").unwrap();
//! builder.add_selected(p_node).unwrap();
//!
//! let c = builder
//!     .compare(age, Comparator::GreaterThan, Some(Operand::Literal(30.into())))
//!     .unwrap();
//! builder.set_root_constraint(c).unwrap();
//!
//! let query = builder.build().unwrap();
//! assert_eq!(
//!     query.to_canonical().unwrap(),
//!     r#"SELECT a1_ FROM Person AS a1_ WHERE age > "30""#
//! );
//! ```
//!
//! ## Core Concepts
//!
//! ### Build, freeze, share
//!
//! A [`QueryBuilder`] is the single mutable owner while a query is assembled.
//! [`QueryBuilder::build`] validates it and hands back an `Arc<Query>` that
//! exposes no mutation, so the frozen query can be rendered from any number
//! of threads.
//!
//! ### Arena ids
//!
//! Aliases, nodes and constraints live in arenas owned by the query and are
//! addressed by [`AliasId`], [`NodeId`] and [`ConstraintId`]. Constraints refer
//! to nodes, never own them. A constraint can be attached to at most one
//! parent position, which keeps the tree acyclic.
//!
//! Every id carries the owner tag of the builder that minted it. The frozen
//! query keeps the same tag, and an id from any other builder or query is
//! rejected as unknown even when its index is in range.
//!
//! ### Negation
//!
//! Negation is part of the operator (`!=`, `DOES NOT CONTAIN`, `IS NOT IN`)
//! or a `NOT` set around one child. There is no free-floating negation flag.
pub mod aliases;
pub mod expressions;
pub mod operators;
pub mod query;
pub mod statements;

pub use aliases::{Alias, AliasId, AliasRegistry, Source};
pub use expressions::{Node, NodeId, ReferenceKind};
pub use operators::{
    Aggregate, ClassOp, Comparator, ContainsOp, Direction, ExprOp, MembershipOp, SetOp,
};
pub use query::{OrderBy, Query, QueryBuilder};
pub use statements::{ClassOperand, Constraint, ConstraintId, ConstraintSet, Operand};

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// A process-unique tag for a new alias registry and everything built on it.
pub(crate) fn next_owner() -> u64 {
    NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
}
