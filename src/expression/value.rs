//! Helpers for looking at evaluation results

use serde_json::{Number, Value};

/// Text form of a scalar value.
///
/// Strings are returned as-is and null is empty text. Numbers use their
/// shortest decimal form, so a whole-valued float such as `1.0` reads `1`.
/// `true` is `1` and `false` is empty text, which makes a false tag name
/// blank. Arrays and objects have no text form and yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn number_text(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < WHOLE_FLOAT_LIMIT {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}

/// Whole floats at or above this magnitude keep their float notation
const WHOLE_FLOAT_LIMIT: f64 = 1e15;

/// Short name of a value's JSON type, for error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
