//! Lenient readers for loosely-typed player snapshots.
//!
//! Poller payloads are produced by game scripts and are not consistent about
//! types: numbers show up where strings are expected, `false` stands in for a
//! missing object, and so on. None of these readers fail. A present field of
//! the wrong type is logged and read as the type's empty value.

use serde_json::{Map, Value};
use tracing::warn;

/// A JSON object as produced by `serde_json`.
pub type Object = Map<String, Value>;

fn present<'a>(key: &str, obj: &'a Object) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Nested object, or None. A boolean is a silent "nothing here".
pub fn get_map<'a>(key: &str, obj: &'a Object) -> Option<&'a Object> {
    let value = present(key, obj)?;
    match value {
        Value::Object(map) => Some(map),
        Value::Bool(_) => None,
        other => {
            warn!(key, value = %other, "unable to read field as map or bool");
            None
        }
    }
}

pub fn get_f64(key: &str, obj: &Object) -> f64 {
    match present(key, obj) {
        Some(value) => value.as_f64().unwrap_or_else(|| {
            warn!(key, %value, "unable to read field as float");
            0.0
        }),
        None => 0.0,
    }
}

/// Integer field. Floats are truncated toward zero.
pub fn get_i64(key: &str, obj: &Object, ignore_invalid: bool) -> i64 {
    let Some(value) = present(key, obj) else {
        return 0;
    };

    if let Some(i) = value.as_i64() {
        return i;
    }
    if let Some(f) = value.as_f64() {
        return f as i64;
    }

    if !ignore_invalid {
        warn!(key, %value, "unable to read field as integer");
    }
    0
}

/// String field. With `try_float`, a number is rendered without decimals.
pub fn get_string(key: &str, obj: &Object, try_float: bool) -> String {
    let Some(value) = present(key, obj) else {
        return String::new();
    };

    if let Some(s) = value.as_str() {
        return s.to_string();
    }
    if try_float {
        if let Some(f) = value.as_f64() {
            return format!("{f:.0}");
        }
    }

    warn!(key, %value, "unable to read field as string");
    String::new()
}

pub fn get_bool(key: &str, obj: &Object) -> bool {
    match present(key, obj) {
        Some(value) => value.as_bool().unwrap_or_else(|| {
            warn!(key, %value, "unable to read field as bool");
            false
        }),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Object {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn test_get_map() {
        let obj = object(json!({"vehicle": {"id": 4}, "character": false, "coords": 12, "empty": null}));
        assert!(get_map("vehicle", &obj).is_some());
        assert!(get_map("character", &obj).is_none());
        assert!(get_map("coords", &obj).is_none());
        assert!(get_map("empty", &obj).is_none());
        assert!(get_map("missing", &obj).is_none());
    }

    #[test]
    fn test_get_i64_truncates_floats() {
        let obj = object(json!({"a": 12, "b": 12.9, "c": -3.7, "d": "7"}));
        assert_eq!(get_i64("a", &obj, false), 12);
        assert_eq!(get_i64("b", &obj, false), 12);
        assert_eq!(get_i64("c", &obj, false), -3);
        assert_eq!(get_i64("d", &obj, true), 0);
        assert_eq!(get_i64("missing", &obj, false), 0);
    }

    #[test]
    fn test_get_string_with_float_fallback() {
        let obj = object(json!({"name": "Ada", "model": 1234567.0, "flag": true}));
        assert_eq!(get_string("name", &obj, false), "Ada");
        assert_eq!(get_string("model", &obj, true), "1234567");
        assert_eq!(get_string("model", &obj, false), "");
        assert_eq!(get_string("flag", &obj, true), "");
    }

    #[test]
    fn test_get_f64_and_bool() {
        let obj = object(json!({"speed": 3.5, "heading": "north", "driving": true, "afk": 1}));
        assert_eq!(get_f64("speed", &obj), 3.5);
        assert_eq!(get_f64("heading", &obj), 0.0);
        assert!(get_bool("driving", &obj));
        assert!(!get_bool("afk", &obj));
        assert!(!get_bool("missing", &obj));
    }
}
