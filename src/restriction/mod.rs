//! Restriction expressions
//!
//! A restriction is the boolean predicate deciding which items of a
//! folder belong to a result set. Conditions are combined with `&`,
//! `|` and `!`.
//!
//! Two values are distinguished:
//! - `Restriction::All` matches everything (no restriction)
//! - `Restriction::Never` matches nothing; a query carrying it completes
//!   with an empty result and never calls the folder

mod condition;

pub use condition::{Condition, FilterOp};

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use serde_json::Value;

/// Boolean predicate over item fields
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Restriction {
    /// No restriction
    #[default]
    All,
    /// Matches nothing
    Never,
    /// A single field condition
    Condition(Condition),
    /// Every child must match
    And(Vec<Restriction>),
    /// At least one child must match
    Or(Vec<Restriction>),
    /// Negation
    Not(Box<Restriction>),
}

impl Restriction {
    /// field == value
    pub fn eq(path: impl Into<String>, value: Value) -> Self {
        Restriction::Condition(Condition::new(path, FilterOp::Eq(value)))
    }

    /// field != value
    pub fn ne(path: impl Into<String>, value: Value) -> Self {
        Restriction::Condition(Condition::new(path, FilterOp::Ne(value)))
    }

    /// field > value
    pub fn gt(path: impl Into<String>, value: Value) -> Self {
        Restriction::Condition(Condition::new(path, FilterOp::Gt(value)))
    }

    /// field >= value
    pub fn gte(path: impl Into<String>, value: Value) -> Self {
        Restriction::Condition(Condition::new(path, FilterOp::Gte(value)))
    }

    /// field < value
    pub fn lt(path: impl Into<String>, value: Value) -> Self {
        Restriction::Condition(Condition::new(path, FilterOp::Lt(value)))
    }

    /// field <= value
    pub fn lte(path: impl Into<String>, value: Value) -> Self {
        Restriction::Condition(Condition::new(path, FilterOp::Lte(value)))
    }

    /// Substring match on a string field
    pub fn contains(path: impl Into<String>, needle: impl Into<String>) -> Self {
        Restriction::Condition(Condition::new(path, FilterOp::Contains(needle.into())))
    }

    /// field is set
    pub fn exists(path: impl Into<String>) -> Self {
        Restriction::Condition(Condition::new(path, FilterOp::Exists))
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Restriction::Never)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Restriction::All)
    }

    /// AND-combines two restrictions. `Never` absorbs, `All` is the identity.
    pub fn and(self, other: Restriction) -> Restriction {
        match (self, other) {
            (Restriction::Never, _) | (_, Restriction::Never) => Restriction::Never,
            (Restriction::All, r) | (r, Restriction::All) => r,
            (Restriction::And(mut left), Restriction::And(right)) => {
                left.extend(right);
                Restriction::And(left)
            }
            (Restriction::And(mut left), r) => {
                left.push(r);
                Restriction::And(left)
            }
            (l, Restriction::And(mut right)) => {
                right.insert(0, l);
                Restriction::And(right)
            }
            (l, r) => Restriction::And(vec![l, r]),
        }
    }

    /// OR-combines two restrictions. `All` absorbs, `Never` is the identity.
    pub fn or(self, other: Restriction) -> Restriction {
        match (self, other) {
            (Restriction::All, _) | (_, Restriction::All) => Restriction::All,
            (Restriction::Never, r) | (r, Restriction::Never) => r,
            (Restriction::Or(mut left), Restriction::Or(right)) => {
                left.extend(right);
                Restriction::Or(left)
            }
            (Restriction::Or(mut left), r) => {
                left.push(r);
                Restriction::Or(left)
            }
            (l, r) => Restriction::Or(vec![l, r]),
        }
    }

    /// Negates a restriction
    pub fn negate(self) -> Restriction {
        match self {
            Restriction::All => Restriction::Never,
            Restriction::Never => Restriction::All,
            Restriction::Not(inner) => *inner,
            r => Restriction::Not(Box::new(r)),
        }
    }
}

impl BitAnd for Restriction {
    type Output = Restriction;

    fn bitand(self, rhs: Restriction) -> Restriction {
        self.and(rhs)
    }
}

impl BitOr for Restriction {
    type Output = Restriction;

    fn bitor(self, rhs: Restriction) -> Restriction {
        self.or(rhs)
    }
}

impl Not for Restriction {
    type Output = Restriction;

    fn not(self) -> Restriction {
        self.negate()
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, parts: &[Restriction], op: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", part)?;
            }
            write!(f, ")")
        }

        match self {
            Restriction::All => write!(f, "ALL"),
            Restriction::Never => write!(f, "NEVER"),
            Restriction::Condition(c) => write!(f, "{}", c),
            Restriction::And(parts) => join(f, parts, "AND"),
            Restriction::Or(parts) => join(f, parts, "OR"),
            Restriction::Not(inner) => write!(f, "NOT {}", inner),
        }
    }
}
