//! Loose JSON recovery
//!
//! Analytic payloads reach the report view through several hops (upload
//! pipeline, database column, REST body) and can arrive double-encoded,
//! wrapped in an object, or cut off mid-array. Everything here is
//! best-effort: failure means "no data", never an error.

use serde_json::Value;
use tracing::{debug, warn};

/// Object keys that may wrap the record array, checked in order
pub const WRAPPER_KEYS: [&str; 4] = ["results", "frames", "time_series", "data"];

/// Nesting limit for JSON strings that themselves contain JSON
const MAX_STRING_DEPTH: usize = 3;

/// Parse text that should be JSON, salvaging truncated arrays
///
/// Attempts, in order:
/// 1. Parse as-is
/// 2. Trim to the outermost bracket/brace pair and drop dangling commas
/// 3. Cut at the last complete record (`}`), drop the trailing comma and
///    re-close the array
///
/// A successfully parsed JSON string is decoded again (double encoding).
/// Returns `None` when nothing parses.
pub fn parse_loose(input: &str) -> Option<Value> {
    parse_loose_depth(input, 0)
}

fn parse_loose_depth(input: &str, depth: usize) -> Option<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => v,
        Err(_) => {
            let salvaged = salvage(trimmed)?;
            warn!("Recovered malformed JSON payload ({} bytes)", trimmed.len());
            salvaged
        }
    };

    match value {
        Value::String(inner) if depth < MAX_STRING_DEPTH => parse_loose_depth(&inner, depth + 1),
        Value::String(_) => None,
        other => Some(other),
    }
}

fn salvage(text: &str) -> Option<Value> {
    // Outermost pair
    let open = text.find(['[', '{']);
    let close = text.rfind([']', '}']);
    if let (Some(l), Some(r)) = (open, close) {
        if r > l {
            let candidate = strip_dangling_commas(&text[l..=r]);
            if let Ok(v) = serde_json::from_str::<Value>(&candidate) {
                return Some(v);
            }
        }
    }

    // Truncated array: keep complete records only, then re-close
    let open = text.find('[');
    let close = text.rfind('}');
    if let (Some(l), Some(r)) = (open, close) {
        if r > l {
            let body = text[l..=r].trim_end().trim_end_matches(',');
            let candidate = strip_dangling_commas(&format!("{}]", body));
            if let Ok(v) = serde_json::from_str::<Value>(&candidate) {
                return Some(v);
            }
        }
    }

    debug!("JSON salvage failed");
    None
}

/// Remove commas that directly precede a closing bracket or brace
///
/// String literals are skipped so a `",]"` inside text survives.
fn strip_dangling_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some(']') | Some('}') | None) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Extract the record array from any accepted payload shape
///
/// - bare array: returned as-is
/// - object: the first of [`WRAPPER_KEYS`] holding an array, else the
///   first array-valued field
/// - string: parsed loosely, then unwrapped
/// - anything else: empty
pub fn into_records(value: Value) -> Vec<Value> {
    into_records_depth(value, 0)
}

fn into_records_depth(value: Value, depth: usize) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if matches!(map.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(key) {
                        return items;
                    }
                }
            }
            let fallback = map
                .iter()
                .find(|(_, v)| v.is_array())
                .map(|(k, _)| k.clone());
            match fallback.and_then(|k| map.remove(&k)) {
                Some(Value::Array(items)) => {
                    debug!("Using first array-valued field as record list");
                    items
                }
                _ => Vec::new(),
            }
        }
        Value::String(text) if depth < MAX_STRING_DEPTH => match parse_loose(&text) {
            Some(inner) => into_records_depth(inner, depth + 1),
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Session score declared by the upstream analyser
///
/// Read from an `average_score` field (number or numeric string) on a
/// wrapper object; bare arrays carry none.
pub fn average_score(value: &Value) -> Option<f64> {
    value
        .as_object()
        .and_then(|obj| super::number_field(obj, "average_score"))
}

/// Mean of the per-record `score` fields, if any record has one
pub fn mean_record_score(value: &Value) -> Option<f64> {
    let scores: Vec<f64> = into_records(value.clone())
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| super::number_field(obj, "score"))
        .collect();
    (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_json_unchanged() {
        let v = parse_loose(r#"[{"t":1},{"t":2}]"#).unwrap();
        assert_eq!(v, json!([{"t":1},{"t":2}]));
    }

    #[test]
    fn test_parse_truncated_array() {
        let v = parse_loose(r#"[{"t":1,"happy":0.5},{"t":2,"happy":0.7},{"t":3,"hap"#).unwrap();
        assert_eq!(v, json!([{"t":1,"happy":0.5},{"t":2,"happy":0.7}]));
    }

    #[test]
    fn test_parse_trailing_comma() {
        let v = parse_loose(r#"[{"t":1},{"t":2},]"#).unwrap();
        assert_eq!(v, json!([{"t":1},{"t":2}]));

        let v = parse_loose(r#"[{"t":1},{"t":2},"#).unwrap();
        assert_eq!(v, json!([{"t":1},{"t":2}]));
    }

    #[test]
    fn test_parse_leading_garbage() {
        let v = parse_loose(r#"data: [{"t":1}] <eof>"#).unwrap();
        assert_eq!(v, json!([{"t":1}]));
    }

    #[test]
    fn test_parse_double_encoded() {
        let inner = r#"[{"t":1}]"#;
        let outer = serde_json::to_string(inner).unwrap();
        assert_eq!(parse_loose(&outer).unwrap(), json!([{"t":1}]));
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_loose("").is_none());
        assert!(parse_loose("not json at all").is_none());
        assert!(parse_loose("[{\"t\":").is_none());
    }

    #[test]
    fn test_strip_dangling_commas_respects_strings() {
        assert_eq!(strip_dangling_commas(r#"{"a":",]",}"#), r#"{"a":",]"}"#);
    }

    #[test]
    fn test_into_records_wrapper_keys() {
        assert_eq!(into_records(json!({"results": [1, 2]})), vec![json!(1), json!(2)]);
        assert_eq!(into_records(json!({"frames": [3]})), vec![json!(3)]);
        assert_eq!(into_records(json!({"time_series": [4]})), vec![json!(4)]);
        assert_eq!(into_records(json!({"data": [5]})), vec![json!(5)]);
    }

    #[test]
    fn test_into_records_wrapper_priority() {
        let v = json!({"data": [2], "results": [1]});
        assert_eq!(into_records(v), vec![json!(1)]);
    }

    #[test]
    fn test_into_records_first_array_fallback() {
        let v = json!({"average_score": 71.5, "samples": [{"t": 0}]});
        assert_eq!(into_records(v), vec![json!({"t": 0})]);
    }

    #[test]
    fn test_into_records_from_truncated_string() {
        let v = Value::String(r#"{"results":[{"t":1},{"t":2"#.to_string());
        assert_eq!(into_records(v), vec![json!({"t":1})]);
    }

    #[test]
    fn test_into_records_scalars_empty() {
        assert!(into_records(json!(null)).is_empty());
        assert!(into_records(json!(42)).is_empty());
        assert!(into_records(json!({"score": 3})).is_empty());
    }

    #[test]
    fn test_average_score_from_wrapper() {
        assert_eq!(average_score(&json!({"average_score": 91.0, "results": []})), Some(91.0));
        assert_eq!(average_score(&json!({"average_score": "77.5"})), Some(77.5));
        assert_eq!(average_score(&json!({"average_score": null, "results": []})), None);
        assert_eq!(average_score(&json!([{"average_score": 50}])), None);
    }

    #[test]
    fn test_mean_record_score() {
        let v = json!({"results": [{"t": 0, "score": 70}, {"t": 1}, {"t": 2, "score": "80"}]});
        assert_eq!(mean_record_score(&v), Some(75.0));
        assert_eq!(mean_record_score(&json!([{"t": 0, "happy": 10}])), None);
    }
}
