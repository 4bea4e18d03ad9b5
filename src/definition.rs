//! Saved query definitions.
//!
//! A [`QueryDef`] is a JSON description of a query. Loading one goes through
//! the same [`QueryBuilder`] calls a program would make, so every check the
//! builder performs applies to saved queries too.
//!
//! ```json
//! {
//!   "from": [{ "class": "Person", "alias": "p" }],
//!   "select": [{ "class": "p" }],
//!   "where": {
//!     "compare": {
//!       "left": { "field": { "alias": "p", "name": "age" } },
//!       "op": "greater_than",
//!       "right": { "literal": 30 }
//!     }
//!   }
//! }
//! ```
//!
//! Literals are JSON scalars. Exact decimals are written as
//! `{ "decimal": "1.50" }`.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::ast::{
    Aggregate, ClassOp, ClassOperand, Comparator, ConstraintId, ContainsOp, Direction, ExprOp,
    MembershipOp, NodeId, Operand, Query, QueryBuilder, ReferenceKind, Source,
};
use crate::error::QueryError;
use crate::value::Value;

/// Errors that can occur while loading a query definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// Malformed JSON or a document that does not match the definition shape
    #[error("Invalid definition: {0}")]
    Json(#[from] serde_json::Error),
    /// Well-formed document with an invalid entry
    #[error("Invalid definition: {0}")]
    Invalid(String),
    /// The builder rejected the described query
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),
}

/// A saved query.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryDef {
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub from: Vec<FromDef>,
    pub select: Vec<NodeDef>,
    #[serde(default, rename = "where")]
    pub constraint: Option<ConstraintDef>,
    #[serde(default)]
    pub group_by: Vec<NodeDef>,
    #[serde(default)]
    pub order_by: Vec<OrderDef>,
}

/// One FROM entry: exactly one of `class` and `subquery`, with an optional
/// explicit alias.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FromDef {
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub subquery: Option<Box<QueryDef>>,
}

/// A node, referring to sources by alias name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeDef {
    Class(String),
    Field {
        alias: String,
        name: String,
        #[serde(default)]
        secondary: Option<String>,
    },
    Reference {
        alias: String,
        name: String,
        #[serde(default)]
        collection: bool,
    },
    Value(serde_json::Value),
    Expression {
        op: ExprOp,
        args: Vec<NodeDef>,
    },
    Function {
        func: Aggregate,
        #[serde(default)]
        arg: Option<Box<NodeDef>>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderDef {
    pub node: NodeDef,
    #[serde(default)]
    pub direction: Direction,
}

/// A constraint tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintDef {
    And(Vec<ConstraintDef>),
    Or(Vec<ConstraintDef>),
    Not(Box<ConstraintDef>),
    AlwaysTrue,
    AlwaysFalse,
    Class {
        left: NodeDef,
        op: ClassOp,
        right: ClassTargetDef,
    },
    Contains {
        left: NodeDef,
        op: ContainsOp,
        right: NodeDef,
    },
    Compare {
        left: NodeDef,
        op: Comparator,
        #[serde(default)]
        right: Option<OperandDef>,
    },
    In {
        left: NodeDef,
        op: MembershipOp,
        query: Box<QueryDef>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassTargetDef {
    Type(String),
    Node(NodeDef),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperandDef {
    Node(NodeDef),
    Query(Box<QueryDef>),
    Literal(serde_json::Value),
}

impl QueryDef {
    /// Parses a definition from JSON text.
    pub fn from_json(text: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds and freezes the described query.
    pub fn build(&self) -> Result<Arc<Query>, DefinitionError> {
        let mut loader = Loader { builder: QueryBuilder::new() };

        for (i, from) in self.from.iter().enumerate() {
            let source = match (&from.class, &from.subquery) {
                (Some(class), None) => Source::class(class.as_str())?,
                (None, Some(sub)) => Source::subquery(sub.build()?),
                _ => {
                    return Err(DefinitionError::Invalid(format!(
                        "from entry {} needs exactly one of \"class\" and \"subquery\"",
                        i + 1
                    )));
                }
            };
            match &from.alias {
                Some(alias) => loader.builder.bind_source_as(&source, alias)?,
                None => loader.builder.bind_source(&source)?,
            };
        }

        for node in &self.select {
            let id = loader.node(node)?;
            loader.builder.add_selected(id)?;
        }
        if let Some(constraint) = &self.constraint {
            let root = loader.constraint(constraint)?;
            loader.builder.set_root_constraint(root)?;
        }
        loader.builder.set_distinct(self.distinct);
        for node in &self.group_by {
            let id = loader.node(node)?;
            loader.builder.add_group_by(id)?;
        }
        for order in &self.order_by {
            let id = loader.node(&order.node)?;
            loader.builder.add_order_by(id, order.direction)?;
        }

        let query = loader.builder.build()?;
        debug!(selected = query.selected().len(), "loaded query definition");
        Ok(query)
    }
}

/// Parses and builds a definition in one step.
pub fn load_query(text: &str) -> Result<Arc<Query>, DefinitionError> {
    QueryDef::from_json(text)?.build()
}

struct Loader {
    builder: QueryBuilder,
}

impl Loader {
    fn node(&mut self, def: &NodeDef) -> Result<NodeId, DefinitionError> {
        Ok(match def {
            NodeDef::Class(alias) => {
                let alias = self.builder.alias(alias)?;
                self.builder.class_node(alias)?
            }
            NodeDef::Field { alias, name, secondary } => {
                let alias = self.builder.alias(alias)?;
                match secondary {
                    Some(secondary) => self.builder.field_path(alias, name, secondary)?,
                    None => self.builder.field(alias, name)?,
                }
            }
            NodeDef::Reference { alias, name, collection } => {
                let alias = self.builder.alias(alias)?;
                let kind = if *collection { ReferenceKind::Collection } else { ReferenceKind::Object };
                self.builder.reference(alias, name, kind)?
            }
            NodeDef::Value(json) => {
                let value = literal(json)?;
                self.builder.value(value)
            }
            NodeDef::Expression { op, args } => {
                let args = args.iter().map(|arg| self.node(arg)).collect::<Result<Vec<_>, _>>()?;
                self.builder.expression(*op, args)?
            }
            NodeDef::Function { func, arg } => {
                let arg = match arg {
                    Some(arg) => Some(self.node(arg)?),
                    None => None,
                };
                self.builder.function(*func, arg)?
            }
        })
    }

    fn constraint(&mut self, def: &ConstraintDef) -> Result<ConstraintId, DefinitionError> {
        Ok(match def {
            ConstraintDef::And(children) => {
                let children = self.constraints(children)?;
                self.builder.and(children)?
            }
            ConstraintDef::Or(children) => {
                let children = self.constraints(children)?;
                self.builder.or(children)?
            }
            ConstraintDef::Not(child) => {
                let child = self.constraint(child)?;
                self.builder.not(child)?
            }
            ConstraintDef::AlwaysTrue => self.builder.always_true(),
            ConstraintDef::AlwaysFalse => self.builder.always_false(),
            ConstraintDef::Class { left, op, right } => {
                let left = self.node(left)?;
                let right = match right {
                    ClassTargetDef::Type(name) => ClassOperand::Type(name.clone()),
                    ClassTargetDef::Node(node) => ClassOperand::Node(self.node(node)?),
                };
                self.builder.class_identity(left, *op, right)?
            }
            ConstraintDef::Contains { left, op, right } => {
                let left = self.node(left)?;
                let right = self.node(right)?;
                self.builder.contains(left, *op, right)?
            }
            ConstraintDef::Compare { left, op, right } => {
                let left = self.node(left)?;
                let right = match right {
                    Some(OperandDef::Node(node)) => Some(Operand::Node(self.node(node)?)),
                    Some(OperandDef::Query(sub)) => Some(Operand::Query(sub.build()?)),
                    Some(OperandDef::Literal(json)) => Some(Operand::Literal(literal(json)?)),
                    None => None,
                };
                self.builder.compare(left, *op, right)?
            }
            ConstraintDef::In { left, op, query } => {
                let left = self.node(left)?;
                let query = query.build()?;
                self.builder.subquery(left, *op, query)?
            }
        })
    }

    fn constraints(&mut self, defs: &[ConstraintDef]) -> Result<Vec<ConstraintId>, DefinitionError> {
        defs.iter().map(|def| self.constraint(def)).collect()
    }
}

/// Converts a JSON literal to a [`Value`].
fn literal(json: &serde_json::Value) -> Result<Value, DefinitionError> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(DefinitionError::Invalid(format!("number out of range: {}", n)))
            }
        }
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Object(obj) => match (obj.len(), obj.get("decimal")) {
            (1, Some(serde_json::Value::String(text))) => Decimal::from_str(text)
                .map(Value::Decimal)
                .map_err(|e| DefinitionError::Invalid(format!("bad decimal {:?}: {}", text, e))),
            _ => Err(DefinitionError::Invalid(format!("unsupported literal: {}", json))),
        },
        serde_json::Value::Array(_) => {
            Err(DefinitionError::Invalid(format!("unsupported literal: {}", json)))
        }
    }
}
