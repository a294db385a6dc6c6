//! Hashing - SHA-256 fingerprints for print jobs
//!
//! Identical label requests produce identical job hashes, which the
//! spooler uses to name and log render surfaces.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::ENGINE_VERSION;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    to_string(&sort_value(&v))
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                sorted
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_value(v)))
                    .collect(),
            )
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// job_hash = sha256(engine_version + ":" + canonical_payload)
pub fn compute_job_hash(payload: &impl Serialize) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(payload)?;
    Ok(sha256_hex(format!("{ENGINE_VERSION}:{canonical}").as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"y": 1, "b": 2}});
        assert_eq!(canonical_json(&obj).unwrap(), r#"{"a":2,"m":{"b":2,"y":1},"z":1}"#);
    }

    #[test]
    fn test_job_hash_ignores_key_order() {
        let a = compute_job_hash(&json!({"size": "small", "units": ["64-17-5"]})).unwrap();
        let b = compute_job_hash(&json!({"units": ["64-17-5"], "size": "small"})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_job_hash_tracks_content() {
        let a = compute_job_hash(&json!({"units": ["64-17-5"]})).unwrap();
        let b = compute_job_hash(&json!({"units": ["64-17-5", "64-17-5"]})).unwrap();
        assert_ne!(a, b);
    }
}
