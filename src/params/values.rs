//! Lenient conversions for keyword-style parameter values.
//!
//! Test suites hand over numbers as strings and booleans as `"true"`; these
//! helpers accept both forms and return `None` for anything else.

use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use super::ParamsError;

pub fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

/// Seconds as a float or a numeric string.
pub fn as_duration(value: &Value) -> Option<Duration> {
    let secs = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(raw) => raw.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    // Negative, non-finite and out-of-range values are all rejected here.
    Duration::try_from_secs_f64(secs).ok()
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Strings verbatim, everything else in its JSON rendering.
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

/// Non-empty string value.
pub fn as_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

pub fn headers_from_value(value: &Value) -> Result<HeaderMap, ParamsError> {
    let Value::Object(entries) = value else {
        return Err(ParamsError::InvalidHeader(format!(
            "expected a map of headers, got {value}"
        )));
    };

    let mut headers = HeaderMap::with_capacity(entries.len());
    for (name, raw) in entries {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| ParamsError::InvalidHeader(format!("{name}: {err}")))?;
        let text = as_text(raw);
        let value = HeaderValue::from_str(&text)
            .map_err(|err| ParamsError::InvalidHeader(format!("{name}: {err}")))?;
        headers.insert(header, value);
    }
    Ok(headers)
}

/// Query pairs from a map; array values repeat the key.
pub fn query_from_value(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Object(entries) => entries
            .iter()
            .flat_map(|(key, raw)| match raw {
                Value::Array(items) => items
                    .iter()
                    .map(|item| (key.clone(), as_text(item)))
                    .collect::<Vec<_>>(),
                Value::Null => Vec::new(),
                other => vec![(key.clone(), as_text(other))],
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|pair| match pair {
                Value::Array(kv) if kv.len() == 2 => Some((as_text(&kv[0]), as_text(&kv[1]))),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loose_numbers_and_flags() {
        assert_eq!(as_u32(&json!(3)), Some(3));
        assert_eq!(as_u32(&json!("5")), Some(5));
        assert_eq!(as_u32(&json!(2.0)), Some(2));
        assert_eq!(as_u32(&json!(-1)), None);
        assert_eq!(as_u32(&json!("many")), None);

        assert_eq!(as_duration(&json!(0.5)), Some(Duration::from_millis(500)));
        assert_eq!(as_duration(&json!("2")), Some(Duration::from_secs(2)));
        assert_eq!(as_duration(&json!(-3)), None);
        assert_eq!(as_duration(&json!(1e20)), None);
        assert_eq!(as_duration(&json!("1e20")), None);

        assert_eq!(as_bool(&json!("TRUE")), Some(true));
        assert_eq!(as_bool(&json!("false")), Some(false));
        assert_eq!(as_bool(&json!(1)), Some(true));
        assert_eq!(as_bool(&json!("maybe")), None);
    }

    #[test]
    fn headers_accept_non_string_values() {
        let headers = headers_from_value(&json!({"X-Page": 2, "Accept": "application/json"})).unwrap();
        assert_eq!(headers["x-page"], "2");
        assert_eq!(headers["accept"], "application/json");

        assert!(headers_from_value(&json!({"bad header": "x"})).is_err());
        assert!(headers_from_value(&json!(["not", "a", "map"])).is_err());
    }

    #[test]
    fn query_pairs_repeat_array_values() {
        let mut pairs = query_from_value(&json!({"tag": ["a", "b"], "page": 1}));
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "1".to_string()),
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
            ]
        );
    }
}
