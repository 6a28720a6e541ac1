//! Dynamically typed cell values.

use std::cmp::Ordering;

pub use serde_json::Value;

/// A table row: column name → value.
///
/// Keys are a subset of the owning table's schema. Column order is carried
/// by the schema, not by the record.
pub type Record = serde_json::Map<String, Value>;

/// Build a record from `(column, value)` pairs.
pub fn record<K, V, I>(pairs: I) -> Record
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Total order over values used by sorting.
///
/// Values of different types order as
/// `null < bool < number < string < array < object`. Integers compare
/// exactly; mixed integer/float comparisons use `f64::total_cmp`.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.total_cmp(&y)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => Value::Object(x.clone())
            .to_string()
            .cmp(&Value::Object(y.clone()).to_string()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Numeric view of a value; only JSON numbers qualify.
pub fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Human-readable text for a cell: strings without quotes, null as empty.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compare_numbers() {
        assert_eq!(compare_values(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(compare_values(&json!(3), &json!(3.0)), Ordering::Equal);
    }

    #[test]
    fn test_compare_across_types() {
        assert_eq!(compare_values(&Value::Null, &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(10), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!("z"), &json!([1])), Ordering::Less);
    }

    #[test]
    fn test_compare_arrays() {
        assert_eq!(compare_values(&json!([1, 2]), &json!([1, 3])), Ordering::Less);
        assert_eq!(compare_values(&json!([1, 2]), &json!([1])), Ordering::Greater);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("west")), "west");
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&json!(4.5)), "4.5");
        assert_eq!(display_value(&json!(true)), "true");
    }

    #[test]
    fn test_record_builder() {
        let r = record([("a", json!(1)), ("b", json!("x"))]);
        assert_eq!(r.len(), 2);
        assert_eq!(r["b"], json!("x"));
    }
}
