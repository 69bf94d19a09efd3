//! Dot-separated path traversal over decoded JSON.
//!
//! `data.items.0.id` walks object keys; a segment made only of digits indexes
//! into an array.

use serde_json::Value;

pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }

    path.split('.').try_fold(root, |node, segment| match node {
        Value::Array(items) if is_index(segment) => {
            segment.parse::<usize>().ok().and_then(|index| items.get(index))
        }
        Value::Object(map) => map.get(segment),
        _ => None,
    })
}

/// Value at `path`, or `default` when any step fails.
pub fn extract(root: &Value, path: &str, default: Value) -> Value {
    lookup(root, path).cloned().unwrap_or(default)
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_objects_and_arrays() {
        let body = json!({"data": {"items": [{"id": 7}, {"id": 8}], "count": 2}});
        assert_eq!(extract(&body, "data.items.0.id", Value::Null), json!(7));
        assert_eq!(extract(&body, "data.items.1.id", Value::Null), json!(8));
        assert_eq!(extract(&body, "data.count", Value::Null), json!(2));
    }

    #[test]
    fn failures_yield_default() {
        let body = json!({"data": {"items": [{"id": 7}], "name": "x"}});
        let fallback = json!("missing");
        assert_eq!(extract(&body, "data.items.5.id", fallback.clone()), fallback);
        assert_eq!(extract(&body, "data.nope", fallback.clone()), fallback);
        assert_eq!(extract(&body, "data.name.first", fallback.clone()), fallback);
        assert_eq!(extract(&body, "data.items.first", fallback.clone()), fallback);
    }

    #[test]
    fn digit_keys_on_objects_are_plain_keys() {
        let body = json!({"years": {"2024": "ok"}});
        assert_eq!(lookup(&body, "years.2024"), Some(&json!("ok")));
        assert_eq!(lookup(&body, ""), Some(&body));
    }
}
