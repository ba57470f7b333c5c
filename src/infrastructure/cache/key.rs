//! Cache key derivation.

use serde_json::{Map, Value};

/// Key for `url` plus the request params.
///
/// Params only feed the key; callers embed them in the url themselves when
/// the upstream needs them. Object keys are sorted recursively so two
/// logically identical requests always collide on the same key.
pub fn cache_key(url: &str, params: &Value) -> String {
    match params {
        Value::Null => url.to_string(),
        Value::Object(map) if map.is_empty() => url.to_string(),
        other => format!("{}:{}", url, canonical(other)),
    }
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
