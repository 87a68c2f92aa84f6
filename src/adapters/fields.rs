//! Candidate-key extraction over untyped JSON payloads.
//!
//! Console APIs rarely agree on field names, so adapters describe a
//! prioritized list of paths and take the first hit. Numeric fields come
//! back as numbers or as numeric strings depending on the service; both
//! parse here. This knowledge stays inside the adapters module; the core
//! engine never sees source-specific field names.

use serde_json::Value;

/// Walk `path` into `payload`. Segments index objects by key; a segment
/// that parses as an integer indexes arrays.
pub fn nested<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// A number, or a string that parses as one.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// First candidate path that yields a numeric value.
pub fn first_number(payload: &Value, candidates: &[&[&str]]) -> Option<f64> {
    candidates
        .iter()
        .find_map(|path| nested(payload, path).and_then(number))
}

/// First candidate path that yields a non-empty string.
pub fn first_string<'a>(payload: &'a Value, candidates: &[&[&str]]) -> Option<&'a str> {
    candidates.iter().find_map(|path| {
        nested(payload, path)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    })
}
