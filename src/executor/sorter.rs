//! Client-side result sorting
//!
//! Multi-key ordering is built from single-key stable sorts, least
//! significant key first. Stability keeps earlier passes intact among
//! items the later keys consider equal.

use std::cmp::Ordering;

use serde_json::Value;

use crate::fields::{FieldOrder, FieldPath};
use crate::item::Found;

/// Sorts search results
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts by every order, first order most significant
    pub fn sort(results: &mut [Found], orders: &[FieldOrder]) {
        for order in orders.iter().rev() {
            Self::sort_by_key(results, order);
        }
    }

    /// One stable pass on a single key
    fn sort_by_key(results: &mut [Found], order: &FieldOrder) {
        results.sort_by(|a, b| {
            let ordering = compare_values(&order.path.get_value(a), &order.path.get_value(b));
            if order.reverse {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    /// Resets fields that were fetched only to sort on
    pub fn strip(found: Found, fields: &[FieldPath]) -> Found {
        match found {
            Found::Item(mut item) => {
                for path in fields {
                    item.clear(path.field().name());
                }
                Found::Item(item)
            }
            pair => pair,
        }
    }
}

/// Total order over JSON values.
///
/// - null < bool < number < string < array < object
/// - same types compare naturally; arrays and objects compare equal
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let type_order = |v: &Value| -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    };

    let (a_type, b_type) = (type_order(a), type_order(b));
    if a_type != b_type {
        return a_type.cmp(&b_type);
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                return xi.cmp(&yi);
            }
            let xf = x.as_f64().unwrap_or(0.0);
            let yf = y.as_f64().unwrap_or(0.0);
            xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Field;
    use crate::item::Item;
    use serde_json::json;

    fn found(id: &str, a: i64, b: i64) -> Found {
        Found::Item(
            Item::new(id, "ck")
                .with_value("a", json!(a))
                .with_value("b", json!(b)),
        )
    }

    fn order(name: &str, reverse: bool) -> FieldOrder {
        FieldOrder::new(FieldPath::new(Field::simple(name)), reverse)
    }

    fn ids(results: &[Found]) -> Vec<&str> {
        results.iter().filter_map(Found::item_id).collect()
    }

    #[test]
    fn test_multi_key_ascending() {
        let mut results = vec![found("x", 1, 2), found("y", 1, 1), found("z", 2, 1)];
        ResultSorter::sort(&mut results, &[order("a", false), order("b", false)]);
        assert_eq!(ids(&results), vec!["y", "x", "z"]);
    }

    #[test]
    fn test_mixed_directions() {
        let mut results = vec![found("x", 1, 2), found("y", 1, 1), found("z", 2, 1)];
        ResultSorter::sort(&mut results, &[order("a", true), order("b", false)]);
        assert_eq!(ids(&results), vec!["z", "y", "x"]);
    }

    #[test]
    fn test_sort_stable() {
        let mut results = vec![found("a", 1, 0), found("b", 1, 0), found("c", 1, 0)];
        ResultSorter::sort(&mut results, &[order("a", true)]);
        assert_eq!(ids(&results), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_values_sort_first() {
        let mut results = vec![
            found("x", 1, 0),
            Found::Item(Item::new("none", "ck")),
        ];
        ResultSorter::sort(&mut results, &[order("a", false)]);
        assert_eq!(ids(&results), vec!["none", "x"]);
    }

    #[test]
    fn test_strip_clears_fields() {
        let stripped = ResultSorter::strip(found("x", 1, 2), &[FieldPath::new(Field::simple("b"))]);
        match stripped {
            Found::Item(item) => {
                assert_eq!(item.get("a"), Some(&json!(1)));
                assert!(item.get("b").is_none());
            }
            other => panic!("expected item, got {:?}", other),
        }
    }

    #[test]
    fn test_compare_values_type_order() {
        assert_eq!(compare_values(&Value::Null, &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(5), &json!("5")), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
    }
}
