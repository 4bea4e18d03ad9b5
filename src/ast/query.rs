use std::sync::Arc;

use tracing::debug;

use crate::ast::aliases::{check_class_name, check_identifier};
use crate::ast::{
    Aggregate, AliasId, AliasRegistry, ClassOp, ClassOperand, Comparator, Constraint,
    ConstraintId, ConstraintSet, ContainsOp, Direction, ExprOp, MembershipOp, Node, NodeId,
    Operand, ReferenceKind, SetOp, Source,
};
use crate::error::{QueryError, QueryResult};
use crate::output;
use crate::projection::{self, Decomposition, PrintableConstraint};
use crate::value::Value;

/// One ORDER BY entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub node: NodeId,
    pub direction: Direction,
}

/// A frozen query.
///
/// Produced by [`QueryBuilder::build`] and shared as `Arc<Query>`. Nothing
/// can be changed after freezing, so rendering from several threads at once
/// needs no locking.
///
/// There is no structural `PartialEq`. Compare queries through their
/// canonical text.
#[derive(Debug)]
pub struct Query {
    aliases: AliasRegistry,
    nodes: Vec<Node>,
    constraints: Vec<Constraint>,
    selected: Vec<NodeId>,
    root: ConstraintId,
    distinct: bool,
    group_by: Vec<NodeId>,
    order_by: Vec<OrderBy>,
}

impl Query {
    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    pub fn node(&self, id: NodeId) -> QueryResult<&Node> {
        lookup_node(&self.nodes, self.aliases.owner(), id)
    }

    pub fn constraint(&self, id: ConstraintId) -> QueryResult<&Constraint> {
        lookup_constraint(&self.constraints, self.aliases.owner(), id)
    }

    /// Selected nodes, in select-list order.
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// Root of the constraint tree. Always present; a query without
    /// conditions has the always-true set as its root.
    pub fn root(&self) -> ConstraintId {
        self.root
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn group_by(&self) -> &[NodeId] {
        &self.group_by
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// Leaf constraints of the tree under `id`, depth-first, in child order.
    pub fn leaves(&self, id: ConstraintId) -> QueryResult<Vec<ConstraintId>> {
        let mut leaves = Vec::new();
        self.collect_leaves(id, &mut leaves)?;
        Ok(leaves)
    }

    fn collect_leaves(&self, id: ConstraintId, leaves: &mut Vec<ConstraintId>) -> QueryResult<()> {
        match self.constraint(id)? {
            Constraint::Set(set) => {
                for &child in set.children() {
                    self.collect_leaves(child, leaves)?;
                }
            }
            _ => leaves.push(id),
        }
        Ok(())
    }

    /// Canonical text of the whole query.
    pub fn to_canonical(&self) -> QueryResult<String> {
        output::to_canonical(self)
    }

    /// Canonical text of the constraint subtree rooted at `id`.
    pub fn constraint_to_canonical(&self, id: ConstraintId) -> QueryResult<String> {
        output::constraint_to_canonical(self, id)
    }

    /// Left / operator / right text of a leaf, `None` for a set.
    pub fn decompose(&self, id: ConstraintId) -> QueryResult<Option<Decomposition>> {
        projection::decompose(self, id)
    }

    /// Wraps one of this query's constraints for display.
    pub fn printable(self: &Arc<Self>, id: ConstraintId) -> QueryResult<PrintableConstraint> {
        PrintableConstraint::new(Arc::clone(self), id)
    }
}

/// Mutable owner of a query under construction.
///
/// Every method checks its inputs immediately, so a malformed query is
/// reported where it is assembled rather than when it is rendered.
///
/// # Examples
///
/// ```
/// use fql::ast::{ContainsOp, QueryBuilder, ReferenceKind, Source};
///
/// let mut builder = QueryBuilder::new();
/// let person = builder.bind_source(&Source::class("Person").unwrap()).unwrap();
/// let dog = builder.bind_source_as(&Source::class("Dog").unwrap(), "Dog").unwrap();
///
/// let pets = builder.reference(person, "pets", ReferenceKind::Collection).unwrap();
/// let dog_node = builder.class_node(dog).unwrap();
/// let p = builder.class_node(person).unwrap();
/// builder.add_selected(p).unwrap();
///
/// let c = builder.contains(pets, ContainsOp::DoesNotContain, dog_node).unwrap();
/// builder.set_root_constraint(c).unwrap();
///
/// let query = builder.build().unwrap();
/// assert_eq!(
///     query.constraint_to_canonical(c).unwrap(),
///     "pets DOES NOT CONTAIN Dog"
/// );
/// ```
#[derive(Debug, Default)]
pub struct QueryBuilder {
    aliases: AliasRegistry,
    nodes: Vec<Node>,
    constraints: Vec<Constraint>,
    /// Parallel to `constraints`: whether the constraint already sits under a set.
    attached: Vec<bool>,
    selected: Vec<NodeId>,
    root: Option<ConstraintId>,
    distinct: bool,
    group_by: Vec<NodeId>,
    order_by: Vec<OrderBy>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // Sources

    /// Binds a source under the next generated alias.
    pub fn bind_source(&mut self, source: &Arc<Source>) -> QueryResult<AliasId> {
        self.aliases.bind(source)
    }

    /// Binds a source under an explicit alias.
    pub fn bind_source_as(&mut self, source: &Arc<Source>, alias: &str) -> QueryResult<AliasId> {
        self.aliases.bind_as(source, alias)
    }

    /// Looks up an alias by name.
    pub fn alias(&self, name: &str) -> QueryResult<AliasId> {
        self.aliases.lookup(name)
    }

    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    // Nodes

    fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId::new(self.aliases.owner(), self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> QueryResult<&Node> {
        lookup_node(&self.nodes, self.aliases.owner(), id)
    }

    /// The aliased source itself.
    pub fn class_node(&mut self, alias: AliasId) -> QueryResult<NodeId> {
        self.aliases.get(alias)?;
        Ok(self.push_node(Node::Class(alias)))
    }

    /// A scalar field of an aliased source.
    pub fn field(&mut self, alias: AliasId, name: &str) -> QueryResult<NodeId> {
        self.aliases.get(alias)?;
        check_identifier(name)?;
        Ok(self.push_node(Node::Field { alias, name: name.to_string(), secondary: None }))
    }

    /// A field reached through a to-one relationship: `name.secondary`.
    pub fn field_path(&mut self, alias: AliasId, name: &str, secondary: &str) -> QueryResult<NodeId> {
        self.aliases.get(alias)?;
        check_identifier(name)?;
        check_identifier(secondary)?;
        Ok(self.push_node(Node::Field {
            alias,
            name: name.to_string(),
            secondary: Some(secondary.to_string()),
        }))
    }

    /// A relationship of an aliased source.
    pub fn reference(&mut self, alias: AliasId, name: &str, kind: ReferenceKind) -> QueryResult<NodeId> {
        self.aliases.get(alias)?;
        check_identifier(name)?;
        Ok(self.push_node(Node::Reference { alias, name: name.to_string(), kind }))
    }

    /// A constant.
    pub fn value(&mut self, value: impl Into<Value>) -> NodeId {
        self.push_node(Node::Value(value.into()))
    }

    /// A computed value over existing nodes.
    pub fn expression(&mut self, op: ExprOp, args: Vec<NodeId>) -> QueryResult<NodeId> {
        if args.len() != op.arity() {
            return Err(QueryError::InvalidExpression {
                op: op.symbol(),
                expected: op.arity(),
                actual: args.len(),
            });
        }
        for &arg in &args {
            self.node(arg)?;
        }
        Ok(self.push_node(Node::Expression { op, args }))
    }

    /// An aggregate. Only `COUNT` may omit its argument (`COUNT(*)`).
    pub fn function(&mut self, func: Aggregate, arg: Option<NodeId>) -> QueryResult<NodeId> {
        match arg {
            Some(arg) => {
                self.node(arg)?;
            }
            None if func != Aggregate::Count => {
                return Err(QueryError::InvalidExpression {
                    op: func.symbol(),
                    expected: 1,
                    actual: 0,
                });
            }
            None => {}
        }
        Ok(self.push_node(Node::Function { func, arg }))
    }

    // Query clauses

    pub fn add_selected(&mut self, node: NodeId) -> QueryResult<()> {
        self.node(node)?;
        self.selected.push(node);
        Ok(())
    }

    pub fn set_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    pub fn add_group_by(&mut self, node: NodeId) -> QueryResult<()> {
        self.node(node)?;
        self.group_by.push(node);
        Ok(())
    }

    pub fn add_order_by(&mut self, node: NodeId, direction: Direction) -> QueryResult<()> {
        self.node(node)?;
        self.order_by.push(OrderBy { node, direction });
        Ok(())
    }

    // Constraints

    fn push_constraint(&mut self, constraint: Constraint) -> ConstraintId {
        self.constraints.push(constraint);
        self.attached.push(false);
        ConstraintId::new(self.aliases.owner(), self.constraints.len() - 1)
    }

    fn constraint(&self, id: ConstraintId) -> QueryResult<&Constraint> {
        lookup_constraint(&self.constraints, self.aliases.owner(), id)
    }

    /// `left = Type` / `left != other`.
    ///
    /// The left side must be a class node or an object reference.
    pub fn class_identity(&mut self, left: NodeId, op: ClassOp, right: ClassOperand) -> QueryResult<ConstraintId> {
        let position = format!("left of {}", op);
        let left_node = self.node(left)?;
        if !left_node.is_object() {
            return Err(QueryError::unsupported(position, left_node.kind_name()));
        }
        match &right {
            ClassOperand::Node(node) => {
                let right_node = self.node(*node)?;
                if !right_node.is_object() {
                    return Err(QueryError::unsupported(format!("right of {}", op), right_node.kind_name()));
                }
            }
            ClassOperand::Type(name) => check_class_name(name)?,
        }
        Ok(self.push_constraint(Constraint::ClassIdentity { left, op, right }))
    }

    /// `reference CONTAINS node`.
    ///
    /// The left side must be a reference, the right side a class node or an
    /// object reference.
    pub fn contains(&mut self, left: NodeId, op: ContainsOp, right: NodeId) -> QueryResult<ConstraintId> {
        let left_node = self.node(left)?;
        if !left_node.is_reference() {
            return Err(QueryError::unsupported(format!("left of {}", op), left_node.kind_name()));
        }
        let right_node = self.node(right)?;
        if !right_node.is_object() {
            return Err(QueryError::unsupported(format!("right of {}", op), right_node.kind_name()));
        }
        Ok(self.push_constraint(Constraint::Containment { left, op, right }))
    }

    /// `left op right`, or `left IS [NOT] NULL` with no right operand.
    pub fn compare(&mut self, left: NodeId, op: Comparator, right: Option<Operand>) -> QueryResult<ConstraintId> {
        self.node(left)?;
        match (&right, op.is_null_check()) {
            (Some(_), true) => {
                return Err(QueryError::unsupported(format!("right of {}", op), "operand on a null check"));
            }
            (None, false) => {
                return Err(QueryError::unsupported(format!("right of {}", op), "nothing"));
            }
            (Some(Operand::Node(node)), false) => {
                self.node(*node)?;
            }
            (Some(Operand::Query(query)), false) => check_single_column(query)?,
            (Some(Operand::Literal(_)), false) | (None, true) => {}
        }
        Ok(self.push_constraint(Constraint::Comparison { left, op, right }))
    }

    /// `left IN (subquery)` / `left IS NOT IN (subquery)`.
    pub fn subquery(&mut self, left: NodeId, op: MembershipOp, query: Arc<Query>) -> QueryResult<ConstraintId> {
        self.node(left)?;
        check_single_column(&query)?;
        Ok(self.push_constraint(Constraint::Subquery { left, op, query }))
    }

    /// Conjunction of at least one child.
    pub fn and(&mut self, children: Vec<ConstraintId>) -> QueryResult<ConstraintId> {
        self.set(SetOp::And, children)
    }

    /// Disjunction of at least one child.
    pub fn or(&mut self, children: Vec<ConstraintId>) -> QueryResult<ConstraintId> {
        self.set(SetOp::Or, children)
    }

    /// Negation of one child.
    pub fn not(&mut self, child: ConstraintId) -> QueryResult<ConstraintId> {
        self.set(SetOp::Not, vec![child])
    }

    /// The empty set that is always true.
    pub fn always_true(&mut self) -> ConstraintId {
        self.push_constraint(Constraint::Set(ConstraintSet { op: SetOp::And, children: vec![] }))
    }

    /// The empty set that is always false.
    pub fn always_false(&mut self) -> ConstraintId {
        self.push_constraint(Constraint::Set(ConstraintSet { op: SetOp::Or, children: vec![] }))
    }

    /// A set over existing, unattached children.
    pub fn set(&mut self, op: SetOp, children: Vec<ConstraintId>) -> QueryResult<ConstraintId> {
        match (op, children.len()) {
            (_, 0) => {
                return Err(QueryError::malformed(format!(
                    "{} set without children; use always_true or always_false",
                    op
                )));
            }
            (SetOp::Not, n) if n != 1 => {
                return Err(QueryError::malformed(format!("NOT takes one child, got {}", n)));
            }
            _ => {}
        }
        for (i, &child) in children.iter().enumerate() {
            self.constraint(child)?;
            if self.attached[child.index] || children[..i].contains(&child) {
                return Err(QueryError::malformed(format!("constraint #{} is already attached", child.index)));
            }
            if self.root == Some(child) {
                return Err(QueryError::malformed(format!("constraint #{} is the root", child.index)));
            }
        }
        for &child in &children {
            self.attached[child.index] = true;
        }
        Ok(self.push_constraint(Constraint::Set(ConstraintSet { op, children })))
    }

    /// Makes `id` the root of the constraint tree, replacing any earlier root.
    pub fn set_root_constraint(&mut self, id: ConstraintId) -> QueryResult<()> {
        self.constraint(id)?;
        if self.attached[id.index] {
            return Err(QueryError::malformed(format!("constraint #{} is already attached", id.index)));
        }
        self.root = Some(id);
        Ok(())
    }

    /// Freezes the query.
    ///
    /// Fails with [`QueryError::EmptySelection`] if nothing is selected. A
    /// query without a root constraint gets the always-true set.
    pub fn build(mut self) -> QueryResult<Arc<Query>> {
        if self.selected.is_empty() {
            return Err(QueryError::EmptySelection);
        }
        let root = match self.root {
            Some(root) => root,
            None => self.always_true(),
        };
        debug!(
            aliases = self.aliases.len(),
            nodes = self.nodes.len(),
            constraints = self.constraints.len(),
            "froze query"
        );
        Ok(Arc::new(Query {
            aliases: self.aliases,
            nodes: self.nodes,
            constraints: self.constraints,
            selected: self.selected,
            root,
            distinct: self.distinct,
            group_by: self.group_by,
            order_by: self.order_by,
        }))
    }
}

fn lookup_node(nodes: &[Node], owner: u64, id: NodeId) -> QueryResult<&Node> {
    nodes
        .get(id.index)
        .filter(|_| id.owner == owner)
        .ok_or(QueryError::UnknownNode(id.index))
}

fn lookup_constraint(constraints: &[Constraint], owner: u64, id: ConstraintId) -> QueryResult<&Constraint> {
    constraints
        .get(id.index)
        .filter(|_| id.owner == owner)
        .ok_or(QueryError::UnknownConstraint(id.index))
}

fn check_single_column(query: &Query) -> QueryResult<()> {
    match query.selected().len() {
        1 => Ok(()),
        selected => Err(QueryError::InvalidSubqueryShape { selected }),
    }
}
