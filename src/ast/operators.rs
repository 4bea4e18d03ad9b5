use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operators of a simple constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Equal (`=`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Pattern match (`LIKE`)
    Like,
    /// Negated pattern match (`NOT LIKE`)
    NotLike,
    /// Null check (`IS NULL`)
    IsNull,
    /// Non-null check (`IS NOT NULL`)
    IsNotNull,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
            Comparator::LessThan => "<",
            Comparator::LessEqual => "<=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterEqual => ">=",
            Comparator::Like => "LIKE",
            Comparator::NotLike => "NOT LIKE",
            Comparator::IsNull => "IS NULL",
            Comparator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Null checks are unary: they take no right operand.
    pub fn is_null_check(self) -> bool {
        matches!(self, Comparator::IsNull | Comparator::IsNotNull)
    }
}

/// Polarity of a class-identity constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassOp {
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
}

impl ClassOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ClassOp::Equal => "=",
            ClassOp::NotEqual => "!=",
        }
    }
}

/// Polarity of a containment constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainsOp {
    /// `CONTAINS`
    Contains,
    /// `DOES NOT CONTAIN`
    DoesNotContain,
}

impl ContainsOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ContainsOp::Contains => "CONTAINS",
            ContainsOp::DoesNotContain => "DOES NOT CONTAIN",
        }
    }
}

/// Polarity of a subquery membership constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipOp {
    /// `IN`
    In,
    /// `IS NOT IN`
    NotIn,
}

impl MembershipOp {
    pub fn symbol(self) -> &'static str {
        match self {
            MembershipOp::In => "IN",
            MembershipOp::NotIn => "IS NOT IN",
        }
    }
}

/// Boolean combinator of a constraint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// Logical NOT over exactly one child
    Not,
}

impl SetOp {
    pub fn symbol(self) -> &'static str {
        match self {
            SetOp::And => "AND",
            SetOp::Or => "OR",
            SetOp::Not => "NOT",
        }
    }
}

/// Operators of computed expression nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprOp {
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// `SUBSTRING(value, start, length)`
    Substring,
    /// `LOWER(value)`
    Lower,
    /// `UPPER(value)`
    Upper,
}

impl ExprOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ExprOp::Add => "+",
            ExprOp::Subtract => "-",
            ExprOp::Multiply => "*",
            ExprOp::Divide => "/",
            ExprOp::Substring => "SUBSTRING",
            ExprOp::Lower => "LOWER",
            ExprOp::Upper => "UPPER",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            ExprOp::Add | ExprOp::Subtract | ExprOp::Multiply | ExprOp::Divide => 2,
            ExprOp::Substring => 3,
            ExprOp::Lower | ExprOp::Upper => 1,
        }
    }

    /// Infix operators render as `(a op b)`, the rest as `NAME(args)`.
    pub fn is_infix(self) -> bool {
        matches!(self, ExprOp::Add | ExprOp::Subtract | ExprOp::Multiply | ExprOp::Divide)
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub fn symbol(self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

/// Sort direction of an ORDER BY entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

macro_rules! display_symbol {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.symbol())
                }
            }
        )*
    };
}

display_symbol!(Comparator, ClassOp, ContainsOp, MembershipOp, SetOp, ExprOp, Aggregate);
