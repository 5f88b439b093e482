//! Cache identity.
//!
//! A `CacheKey` is the normalized identity of a query call: the endpoint name
//! plus a canonical rendering of its arguments. Structurally equal arguments
//! must produce equal keys regardless of object key order or of optional
//! fields being omitted versus explicitly null.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Renders `args` in canonical form: object keys sorted, null-valued object
/// members dropped, array order preserved, compact JSON scalars.
pub fn canonical_args(args: &Value) -> String {
    let mut out = String::new();
    write_canonical(args, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, _)| k)
                .collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Normalized identity of one query call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: Arc<str>,
    args: Arc<str>,
}

impl CacheKey {
    pub fn new(endpoint: &str, args: &Value) -> Self {
        Self {
            endpoint: Arc::from(endpoint),
            args: Arc::from(canonical_args(args).as_str()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn args(&self) -> &str {
        &self.args
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_matter() {
        let a = CacheKey::new("getAllProjects", &json!({"city": "Pune", "page": 2}));
        let b = CacheKey::new("getAllProjects", &json!({"page": 2, "city": "Pune"}));
        assert_eq!(a, b);
    }

    #[test]
    fn omitted_and_null_fields_agree() {
        let a = CacheKey::new("getAllProjects", &json!({"city": "Pune"}));
        let b = CacheKey::new("getAllProjects", &json!({"city": "Pune", "page": null}));
        assert_eq!(a, b);
    }

    #[test]
    fn different_args_produce_different_keys() {
        let a = CacheKey::new("getCityById", &json!({"id": 3}));
        let b = CacheKey::new("getCityById", &json!({"id": 4}));
        assert_ne!(a, b);
        assert_ne!(a, CacheKey::new("getAllCities", &json!({"id": 3})));
    }

    #[test]
    fn array_order_is_significant() {
        let a = CacheKey::new("getAllProjects", &json!({"ids": [1, 2]}));
        let b = CacheKey::new("getAllProjects", &json!({"ids": [2, 1]}));
        assert_ne!(a, b);
    }

    #[test]
    fn nested_objects_are_canonicalized() {
        let a = json!({"filter": {"min": 1, "max": 9}, "sort": "asc"});
        let b = json!({"sort": "asc", "filter": {"max": 9, "min": 1}});
        assert_eq!(canonical_args(&a), canonical_args(&b));
    }

    #[test]
    fn strings_stay_escaped() {
        let args = json!({"q": "2 \"bhk\""});
        assert_eq!(canonical_args(&args), r#"{"q":"2 \"bhk\""}"#);
    }

    #[test]
    fn display_includes_endpoint_and_args() {
        let key = CacheKey::new("getCityById", &json!({"id": 3}));
        assert_eq!(key.to_string(), r#"getCityById({"id":3})"#);
    }
}
