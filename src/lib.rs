pub mod ast;
pub mod cli;
pub mod definition;
pub mod error;
pub mod output;
pub mod projection;
pub mod value;

pub use ast::{Constraint, ConstraintId, Node, NodeId, Query, QueryBuilder, Source};
pub use definition::{DefinitionError, QueryDef};
pub use error::{QueryError, QueryResult};
pub use output::{constraint_to_canonical, to_canonical};
pub use projection::{Decomposition, PrintableConstraint, decompose};
pub use value::Value;
