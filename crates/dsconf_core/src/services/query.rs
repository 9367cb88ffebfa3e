//! Query string transcoding.
//!
//! Converts between `key=value&key=value` text and an ordered mapping. No
//! percent-decoding is applied, so text produced by [`format_query`] parses
//! back to the same mapping.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::models::configuration::value_text;

/// Parse `&`-joined `key=value` pairs.
///
/// Empty segments are skipped, a segment without `=` maps to an empty value,
/// and a repeated key keeps its first position with the last value.
pub fn parse_query(text: &str) -> IndexMap<String, String> {
    text.split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (segment.to_string(), String::new()),
        })
        .collect()
}

/// Parse query text into the JSON mapping stored in `parameters.query`.
pub fn query_mapping(text: &str) -> Map<String, Value> {
    parse_query(text).into_iter().map(|(key, value)| (key, Value::String(value))).collect()
}

/// Join a mapping into `key=value` pairs separated by `&`, in mapping order.
pub fn format_query(mapping: &Map<String, Value>) -> String {
    mapping
        .iter()
        .map(|(key, value)| format!("{key}={}", value_text(value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_query_pairs() {
        let parsed = parse_query("a=1&b=2");
        assert_eq!(parsed.get("a").map(String::as_str), Some("1"));
        assert_eq!(parsed.get("b").map(String::as_str), Some("2"));
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_query_edge_cases() {
        assert!(parse_query("").is_empty());
        assert!(parse_query("&&").is_empty());

        let parsed = parse_query("flag&k=v=w");
        assert_eq!(parsed.get("flag").map(String::as_str), Some(""));
        assert_eq!(parsed.get("k").map(String::as_str), Some("v=w"));
    }

    #[test]
    fn test_parse_query_duplicate_last_wins() {
        let parsed = parse_query("a=1&b=2&a=3");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get_index(0), Some((&"a".to_string(), &"3".to_string())));
    }

    #[test]
    fn test_format_query_renders_non_text_values() {
        let mapping = json!({"sslmode": "require", "timeout": 30, "keepalive": true});
        let text = format_query(mapping.as_object().unwrap());
        assert_eq!(text, "sslmode=require&timeout=30&keepalive=true");
    }

    #[test]
    fn test_text_round_trip() {
        let text = "charset=utf8&sslmode=disable&application_name=dsconf";
        assert_eq!(format_query(&query_mapping(text)), text);
        assert_eq!(format_query(&Map::new()), "");
    }
}
