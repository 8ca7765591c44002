//! Small helpers shared across the queue and job modules.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Current unix-second timestamp, rendered the way metadata hashes store it.
pub fn now_unix_string() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Hex-encoded SHA-256 of a payload's canonical JSON form (keys sorted
/// lexicographically at every object level, no inserted whitespace).
///
/// Used to compute the dedupe key for a submitted payload; two payloads that
/// are structurally identical but differ in key order hash identically.
pub fn payload_digest(payload: &Value) -> String {
    let canonical = canonicalize(payload);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

fn canonicalize(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", serde_json::to_string(k).unwrap(), canonicalize(&map[k])))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonicalize).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_is_stable_regardless_of_key_order() {
        let a = json!({"x": 1, "y": 2});
        let b = json!({"y": 2, "x": 1});
        assert_eq!(payload_digest(&a), payload_digest(&b));
    }

    #[test]
    fn digest_differs_for_different_payloads() {
        let a = json!({"x": 1});
        let b = json!({"x": 2});
        assert_ne!(payload_digest(&a), payload_digest(&b));
    }

    #[test]
    fn digest_is_deterministic_for_nested_structures() {
        let a = json!({"outer": {"b": 1, "a": 2}, "list": [3, 1, 2]});
        let b = json!({"list": [3, 1, 2], "outer": {"a": 2, "b": 1}});
        assert_eq!(payload_digest(&a), payload_digest(&b));
    }
}
