//! Restriction evaluation against in-memory items
//!
//! Exact matching only: no type coercion, a missing or null field never
//! satisfies a comparison.

use std::cmp::Ordering;

use serde_json::Value;

use crate::executor::compare_values;
use crate::fields::{CHANGEKEY, ITEM_ID};
use crate::item::Item;
use crate::restriction::{Condition, FilterOp, Restriction};

/// Evaluates restrictions against items
pub struct RestrictionFilter;

impl RestrictionFilter {
    /// Checks if an item satisfies a restriction
    pub fn matches(item: &Item, restriction: &Restriction) -> bool {
        match restriction {
            Restriction::All => true,
            Restriction::Never => false,
            Restriction::Condition(cond) => Self::matches_condition(item, cond),
            Restriction::And(parts) => parts.iter().all(|r| Self::matches(item, r)),
            Restriction::Or(parts) => parts.iter().any(|r| Self::matches(item, r)),
            Restriction::Not(inner) => !Self::matches(item, inner),
        }
    }

    fn matches_condition(item: &Item, cond: &Condition) -> bool {
        let value = match Self::lookup(item, &cond.path) {
            Some(v) if !v.is_null() => v,
            _ => return matches!(cond.op, FilterOp::Ne(_)),
        };

        match &cond.op {
            FilterOp::Eq(expected) => value == *expected,
            FilterOp::Ne(expected) => value != *expected,
            FilterOp::Gt(bound) => Self::ordered(&value, bound) == Some(Ordering::Greater),
            FilterOp::Gte(bound) => matches!(
                Self::ordered(&value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt(bound) => Self::ordered(&value, bound) == Some(Ordering::Less),
            FilterOp::Lte(bound) => matches!(
                Self::ordered(&value, bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Contains(needle) => match &value {
                Value::String(s) => s.contains(needle.as_str()),
                Value::Array(values) => values.iter().any(|v| v.as_str() == Some(needle.as_str())),
                _ => false,
            },
            FilterOp::Exists => true,
        }
    }

    /// Range comparisons only between numbers or between strings
    fn ordered(actual: &Value, bound: &Value) -> Option<Ordering> {
        match (actual, bound) {
            (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => {
                Some(compare_values(actual, bound))
            }
            _ => None,
        }
    }

    fn lookup(item: &Item, path: &str) -> Option<Value> {
        match path {
            ITEM_ID => return item.item_id.clone().map(Value::from),
            CHANGEKEY => return item.changekey.clone().map(Value::from),
            _ => {}
        }
        match path.split_once("__") {
            Some((field, sub)) => item.get(field).and_then(|v| v.get(sub)).cloned(),
            None => item.get(path).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> Item {
        Item::new("id1", "ck1")
            .with_value("subject", json!("Weekly report"))
            .with_value("size", json!(25))
            .with_value("categories", json!(["work", "urgent"]))
            .with_value("organizer", json!({"email": "boss@example.com"}))
            .with_value("body", Value::Null)
    }

    #[test]
    fn test_equality_match() {
        assert!(RestrictionFilter::matches(&item(), &Restriction::eq("subject", json!("Weekly report"))));
        assert!(!RestrictionFilter::matches(&item(), &Restriction::eq("subject", json!("Other"))));
    }

    #[test]
    fn test_no_type_coercion() {
        assert!(!RestrictionFilter::matches(&item(), &Restriction::eq("size", json!("25"))));
        assert!(!RestrictionFilter::matches(&item(), &Restriction::gt("size", json!("1"))));
    }

    #[test]
    fn test_range_conditions() {
        assert!(RestrictionFilter::matches(&item(), &Restriction::gte("size", json!(25))));
        assert!(RestrictionFilter::matches(&item(), &Restriction::lte("size", json!(30))));
        assert!(!RestrictionFilter::matches(&item(), &Restriction::gt("size", json!(25))));
        assert!(!RestrictionFilter::matches(&item(), &Restriction::lt("size", json!(25))));
    }

    #[test]
    fn test_contains() {
        assert!(RestrictionFilter::matches(&item(), &Restriction::contains("subject", "report")));
        assert!(RestrictionFilter::matches(&item(), &Restriction::contains("categories", "urgent")));
        assert!(!RestrictionFilter::matches(&item(), &Restriction::contains("size", "2")));
    }

    #[test]
    fn test_subfield_and_identity() {
        assert!(RestrictionFilter::matches(
            &item(),
            &Restriction::eq("organizer__email", json!("boss@example.com"))
        ));
        assert!(RestrictionFilter::matches(&item(), &Restriction::eq("item_id", json!("id1"))));
    }

    #[test]
    fn test_null_and_missing() {
        assert!(!RestrictionFilter::matches(&item(), &Restriction::exists("body")));
        assert!(!RestrictionFilter::matches(&item(), &Restriction::eq("missing", json!(1))));
        assert!(RestrictionFilter::matches(&item(), &Restriction::ne("missing", json!(1))));
    }

    #[test]
    fn test_combinators() {
        let r = Restriction::gte("size", json!(10)) & !Restriction::contains("subject", "draft");
        assert!(RestrictionFilter::matches(&item(), &r));

        let r = Restriction::eq("size", json!(1)) | Restriction::eq("size", json!(25));
        assert!(RestrictionFilter::matches(&item(), &r));

        assert!(!RestrictionFilter::matches(&item(), &Restriction::Never));
    }
}
