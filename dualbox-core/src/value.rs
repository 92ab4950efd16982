//! Helpers over `serde_json::Value` that mirror the loose, script-style view
//! of values the widget data is keyed on.

use serde_json::{Map, Number, Value};

/// A flat input record or leaf: an insertion-ordered property map.
pub type Record = Map<String, Value>;

/// Stand-in key text for a property that is absent from a record.
pub const MISSING_KEY_TEXT: &str = "undefined";

pub trait ValueExt {
    /// Runtime primitive type name as a script `typeof` would report it:
    /// `null`, arrays and objects all report `"object"`.
    fn runtime_type(&self) -> &'static str;
    /// Precise kind name for diagnostics (`"null"`, `"array"`, ...).
    fn kind(&self) -> &'static str;
    /// Loose string form used for group keys, so that `5` and `"5"` agree.
    fn loose_string(&self) -> String;
    /// Script truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
    fn is_truthy(&self) -> bool;
}

impl ValueExt for Value {
    fn runtime_type(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    fn loose_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_text(n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => other.loose_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

/// Strict equality, except that numbers compare by value (`1 == 1.0`).
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Integral floats print without a fractional part (`1.0` -> `"1"`).
fn number_text(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}

/// Loose key text for an optional property value.
pub fn key_text(value: Option<&Value>) -> String {
    value.map_or_else(|| MISSING_KEY_TEXT.to_string(), ValueExt::loose_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loose_string_collides_numbers_and_strings() {
        assert_eq!(json!(5).loose_string(), json!("5").loose_string());
        assert_eq!(json!(5.0).loose_string(), "5");
        assert_eq!(json!(2.5).loose_string(), "2.5");
        assert_eq!(json!(-0.0).loose_string(), "0");
    }

    #[test]
    fn test_loose_string_composites() {
        assert_eq!(json!([1, null, "a"]).loose_string(), "1,,a");
        assert_eq!(json!({"a": 1}).loose_string(), "[object Object]");
        assert_eq!(json!(null).loose_string(), "null");
        assert_eq!(json!(true).loose_string(), "true");
    }

    #[test]
    fn test_missing_key_text() {
        assert_eq!(key_text(None), "undefined");
        assert_eq!(key_text(Some(&json!("x"))), "x");
    }

    #[test]
    fn test_same_value_compares_numbers_by_value() {
        assert!(same_value(&json!(1), &json!(1.0)));
        assert!(!same_value(&json!(1), &json!("1")));
        assert!(same_value(&json!("a"), &json!("a")));
        assert!(!json!(0.0).is_truthy());
        assert!(json!("0").is_truthy());
    }

    #[test]
    fn test_runtime_type_matches_typeof() {
        assert_eq!(json!(null).runtime_type(), "object");
        assert_eq!(json!([1]).runtime_type(), "object");
        assert_eq!(json!([1]).kind(), "array");
        assert_eq!(json!(1.5).runtime_type(), "number");
    }
}
