//! Single-field conditions

use std::fmt;

use serde_json::Value;

/// Comparison applied to one field path
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// field == value
    Eq(Value),
    /// field != value
    Ne(Value),
    /// field > value
    Gt(Value),
    /// field >= value
    Gte(Value),
    /// field < value
    Lt(Value),
    /// field <= value
    Lte(Value),
    /// String field contains substring
    Contains(String),
    /// Field has a non-null value
    Exists,
}

impl FilterOp {
    /// Operator symbol used in display output
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "==",
            FilterOp::Ne(_) => "!=",
            FilterOp::Gt(_) => ">",
            FilterOp::Gte(_) => ">=",
            FilterOp::Lt(_) => "<",
            FilterOp::Lte(_) => "<=",
            FilterOp::Contains(_) => "contains",
            FilterOp::Exists => "exists",
        }
    }
}

/// A field path and the comparison applied to it
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field path, e.g. `subject` or `organizer__email`
    pub path: String,
    pub op: FilterOp,
}

impl Condition {
    pub fn new(path: impl Into<String>, op: FilterOp) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            FilterOp::Eq(v)
            | FilterOp::Ne(v)
            | FilterOp::Gt(v)
            | FilterOp::Gte(v)
            | FilterOp::Lt(v)
            | FilterOp::Lte(v) => write!(f, "{} {} {}", self.path, self.op.op_name(), v),
            FilterOp::Contains(needle) => {
                write!(f, "{} {} {}", self.path, self.op.op_name(), Value::from(needle.as_str()))
            }
            FilterOp::Exists => write!(f, "{} {}", self.path, self.op.op_name()),
        }
    }
}
