use std::fmt;

use rust_decimal::Decimal;

/// A literal value used on the right of a comparison or as a constant node.
///
/// The set of literal kinds is closed. Integers, floats and exact decimals
/// are kept apart so that their canonical text matches what the caller wrote.
///
/// # Canonical text
///
/// A literal has two textual forms:
///
/// - as a constraint's right operand it is wrapped in double quotes with no
///   escaping (`age > "30"`), see [`Value::quoted`];
/// - as a constant node inside an expression strings take single quotes and
///   everything else is bare (`SUBSTRING(a1_.name, 1, 3)`), see
///   [`Value::node_text`].
///
/// # Examples
///
/// ```
/// use fql::Value;
///
/// assert_eq!(Value::Integer(30).quoted(), "\"30\"");
/// assert_eq!(Value::from("Smith").node_text(), "'Smith'");
/// assert_eq!(Value::Boolean(true).node_text(), "true");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null
    Null,

    /// Boolean (true/false)
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// Exact decimal number
    Decimal(Decimal),

    /// UTF-8 string
    String(String),
}

impl Value {
    /// Double-quoted form used for literal right operands.
    ///
    /// Embedded quote characters are not escaped.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self)
    }

    /// Form used when the value appears as a node inside the query text.
    pub fn node_text(&self) -> String {
        match self {
            Value::String(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }

    /// Human-readable kind name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}
