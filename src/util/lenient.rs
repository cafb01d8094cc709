//! Serde helpers for the loosely typed payloads ZenTao returns.
//!
//! The legacy API encodes numbers as strings most of the time, as JSON numbers
//! some of the time, and uses `"0"`, `""` or `null` for "no reference". These
//! helpers normalize all of that at the deserialization boundary so the rest
//! of the crate only ever sees `u64` identifiers and `Option` references.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Interpret a string-or-number JSON value as an unsigned integer.
pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Required identifier.
pub fn id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    as_u64(&value).ok_or_else(|| de::Error::custom(format!("invalid identifier: {value}")))
}

/// Optional cross-reference. Zero means "unset" in ZenTao.
pub fn reference<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(as_u64).filter(|id| *id != 0))
}

pub fn small_int<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(as_u64)
        .and_then(|n| u32::try_from(n).ok()))
}

pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Optional free text; empty strings and zero dates are dropped.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => return Ok(None),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with("0000-00-00") {
        return Ok(None);
    }
    Ok(Some(text))
}

/// Free text that is always present, defaulting to empty.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Entries of a collection that ZenTao sends either as `{"<id>": {...}}` or as
/// a plain array.
pub fn entries(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Object(map)) => map.values().collect(),
        Some(Value::Array(items)) => items.iter().collect(),
        _ => Vec::new(),
    }
}

/// A nested object, treating `false`/`null`/`[]` as absent.
pub fn object<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|v| v.is_object())
}
