//! Request parameter extraction.
//!
//! # Responsibilities
//! - Decode query strings and urlencoded bodies
//! - Flatten JSON object payloads into multi-valued parameters
//! - Percent-decode captured path segments
//!
//! # Design Decisions
//! - Malformed payloads contribute no parameters instead of failing the request
//! - JSON scalars become single values, arrays become one value per element

use serde_json::Value;
use url::form_urlencoded;

/// Parse `a=1&b=2&a=3` style input, preserving order and repeats.
pub fn parse_urlencoded(raw: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Flatten a JSON object payload into parameter pairs.
///
/// Returns `None` when the payload is not a JSON object.
pub fn parse_json_object(body: &[u8]) -> Option<Vec<(String, String)>> {
    let map = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => return None,
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key, text));
                }
            }
        }
    }
    Some(pairs)
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Percent-decode a single component (`+` is a space).
pub fn decode_component(raw: &str) -> String {
    // Escape the pair separators so the whole input decodes as one key.
    let escaped = raw.replace('&', "%26").replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .map(|(k, _)| k.into_owned())
        .next()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlencoded_keeps_repeats() {
        let pairs = parse_urlencoded("?tag=a&tag=b&name=J%C3%B6rg+K&=skip");
        assert_eq!(
            pairs,
            vec![
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
                ("name".to_string(), "Jörg K".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_json_object() {
        let pairs = parse_json_object(br#"{"id": 42, "tags": ["x", "y"], "gone": null, "ok": true}"#)
            .unwrap();
        assert!(pairs.contains(&("id".to_string(), "42".to_string())));
        assert!(pairs.contains(&("tags".to_string(), "x".to_string())));
        assert!(pairs.contains(&("tags".to_string(), "y".to_string())));
        assert!(pairs.contains(&("ok".to_string(), "true".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "gone"));
    }

    #[test]
    fn test_parse_json_rejects_non_objects() {
        assert!(parse_json_object(b"[1, 2]").is_none());
        assert!(parse_json_object(b"not json").is_none());
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("hello%20world"), "hello world");
        assert_eq!(decode_component("a+b"), "a b");
        assert_eq!(decode_component("x&y=z"), "x&y=z");
        assert_eq!(decode_component("42"), "42");
    }
}
