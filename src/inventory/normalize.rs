//! Descriptor accessors
//!
//! Descriptors are loosely typed JSON trees. Everything the per-kind
//! normalizers read goes through these helpers so that a missing or
//! oddly-typed field turns into a fallback instead of an error.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Fallback for any field the provider did not send
pub const NOT_AVAILABLE: &str = "N/A";

/// Output format for every timestamp field
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Walk a dot-separated path (`"instanceState.name"`)
pub fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(item, |current, part| current.get(part))
}

/// String at `path`, if present and a non-empty string
pub fn get_str<'a>(item: &'a Value, path: &str) -> Option<&'a str> {
    lookup(item, path)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// String at `path`, or `fallback`
pub fn str_or(item: &Value, path: &str, fallback: &str) -> String {
    get_str(item, path).unwrap_or(fallback).to_string()
}

/// String at `path`, or [`NOT_AVAILABLE`]
pub fn str_or_na(item: &Value, path: &str) -> String {
    str_or(item, path, NOT_AVAILABLE)
}

/// View a repeated element as a list.
///
/// XML decoding yields an object for a single child and an array for several,
/// and null for an empty element, so callers never index arrays directly.
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(Value::Object(map)) if map.is_empty() => Vec::new(),
        Some(other) => vec![other],
    }
}

/// Render a provider timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Accepts RFC 3339 strings and epoch seconds (integer or fractional).
pub fn format_timestamp(value: &Value) -> Option<String> {
    let parsed: DateTime<Utc> = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()?
            .with_timezone(&Utc),
        Value::Number(n) => {
            let secs = n.as_f64()?;
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1_000_000_000.0).round() as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))?
        }
        _ => return None,
    };

    Some(parsed.format(TIMESTAMP_FORMAT).to_string())
}

/// Formatted timestamp at `path`, or [`NOT_AVAILABLE`]
pub fn timestamp_or_na(item: &Value, path: &str) -> String {
    lookup(item, path)
        .and_then(format_timestamp)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested() {
        let item = json!({"instanceState": {"name": "running"}});
        assert_eq!(get_str(&item, "instanceState.name"), Some("running"));
        assert_eq!(get_str(&item, "instanceState.code"), None);
        assert_eq!(get_str(&item, "missing.name"), None);
    }

    #[test]
    fn test_str_or_na_on_wrong_type() {
        let item = json!({"version": 1.29, "empty": ""});
        assert_eq!(str_or_na(&item, "version"), "N/A");
        assert_eq!(str_or_na(&item, "empty"), "N/A");
    }

    #[test]
    fn test_as_list_shapes() {
        let single = json!({"key": "Name"});
        let many = json!([{"key": "a"}, {"key": "b"}]);
        assert_eq!(as_list(Some(&single)).len(), 1);
        assert_eq!(as_list(Some(&many)).len(), 2);
        assert!(as_list(Some(&Value::Null)).is_empty());
        assert!(as_list(Some(&json!({}))).is_empty());
        assert!(as_list(None).is_empty());
    }

    #[test]
    fn test_format_rfc3339() {
        let ts = json!("2024-03-05T07:08:09.000Z");
        assert_eq!(format_timestamp(&ts).as_deref(), Some("2024-03-05 07:08:09"));

        let offset = json!("2024-03-05T09:08:09+02:00");
        assert_eq!(format_timestamp(&offset).as_deref(), Some("2024-03-05 07:08:09"));
    }

    #[test]
    fn test_format_epoch_seconds() {
        let ts = json!(1_700_000_000.512);
        assert_eq!(format_timestamp(&ts).as_deref(), Some("2023-11-14 22:13:20"));
    }

    #[test]
    fn test_format_garbage() {
        assert_eq!(format_timestamp(&json!("yesterday")), None);
        assert_eq!(format_timestamp(&json!(null)), None);
        assert_eq!(timestamp_or_na(&json!({}), "launchTime"), "N/A");
    }
}
