use crate::ast::{Aggregate, AliasId, ExprOp};
use crate::value::Value;

/// Index of a node in its query's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) owner: u64,
    pub(crate) index: usize,
}

impl NodeId {
    pub(crate) const fn new(owner: u64, index: usize) -> Self {
        NodeId { owner, index }
    }

    pub fn index(self) -> usize {
        self.index
    }
}

/// Whether a reference leads to one object or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// To-one relationship
    Object,
    /// To-many relationship
    Collection,
}

/// A value accessed through an aliased source, or computed from other nodes.
///
/// Nodes are owned by the query that created them. Constraints, the select
/// list and the ordering clauses refer to them by [`NodeId`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// The aliased source itself
    ///
    /// # Example
    /// ```text
    /// a1_
    /// ```
    Class(AliasId),

    /// A scalar field, optionally continued through a to-one relationship
    ///
    /// # Examples
    /// ```text
    /// a1_.age
    /// a1_.address.city
    /// ```
    Field {
        alias: AliasId,
        name: String,
        secondary: Option<String>,
    },

    /// A relationship to another class
    ///
    /// # Example
    /// ```text
    /// a1_.pets
    /// ```
    Reference {
        alias: AliasId,
        name: String,
        kind: ReferenceKind,
    },

    /// A constant
    ///
    /// # Examples
    /// ```text
    /// 'Smith'
    /// 42
    /// ```
    Value(Value),

    /// A computed value
    ///
    /// # Examples
    /// ```text
    /// (a1_.age + 1)
    /// SUBSTRING(a1_.name, 1, 3)
    /// ```
    Expression { op: ExprOp, args: Vec<NodeId> },

    /// An aggregate, `None` meaning `*`
    ///
    /// # Examples
    /// ```text
    /// COUNT(*)
    /// MAX(a1_.age)
    /// ```
    Function { func: Aggregate, arg: Option<NodeId> },
}

impl Node {
    /// Kind name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Class(_) => "class",
            Node::Field { .. } => "field",
            Node::Reference { kind: ReferenceKind::Object, .. } => "object reference",
            Node::Reference { kind: ReferenceKind::Collection, .. } => "collection reference",
            Node::Value(_) => "value",
            Node::Expression { .. } => "expression",
            Node::Function { .. } => "function",
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Node::Reference { .. })
    }

    /// True for nodes that stand for a single object: a class node or a
    /// to-one reference.
    pub fn is_object(&self) -> bool {
        matches!(self, Node::Class(_) | Node::Reference { kind: ReferenceKind::Object, .. })
    }
}
