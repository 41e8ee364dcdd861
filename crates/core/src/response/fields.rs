//! Lenient field readers for payloads whose shape is not guaranteed. Every
//! reader returns a default instead of failing.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub fn object<'a>(value: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    value.get(key).and_then(Value::as_object)
}

/// Object under `key`, or an empty object when absent or not an object.
pub fn object_or_empty(value: &Value, key: &str) -> Value {
    match value.get(key) {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => Value::Object(Map::new()),
    }
}

pub fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// Non-blank string, or a number rendered as text.
pub fn string(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(as_text)
}

pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Numbers, or strings such as `"$1,250.50"`; anything else is 0.
pub fn float(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(as_float).unwrap_or(0.0)
}

pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => strip_number(text).parse::<f64>().ok(),
        _ => None,
    }
}

pub fn integer(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(as_integer).unwrap_or(0)
}

pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().map(|n| n as i64)),
        Value::String(text) => {
            let text = strip_number(text);
            text.parse::<i64>().ok().or_else(|| text.parse::<f64>().ok().map(|n| n as i64))
        }
        _ => None,
    }
}

/// `deserialize_with` form of [`as_float`] for model-written records.
pub fn lenient_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(as_float).unwrap_or(0.0))
}

pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(as_text))
}

pub fn lenient_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(as_integer).unwrap_or(0))
}

pub fn unsigned(value: &Value, key: &str) -> u64 {
    integer(value, key).max(0) as u64
}

pub fn flag(value: &Value, key: &str) -> bool {
    match value.get(key) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Some(Value::String(text)) => {
            matches!(text.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
        }
        _ => false,
    }
}

/// Raw value under `key`, `Null` when absent.
pub fn raw(value: &Value, key: &str) -> Value {
    value.get(key).cloned().unwrap_or(Value::Null)
}

fn strip_number(text: &str) -> String {
    text.trim().chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect()
}
