//! Key-value configuration store.
//!
//! Keys are strings, values are stored as strings and decoded on read with
//! caller-supplied defaults. A missing or malformed value is never an
//! error; the default simply wins. The on-disk layout is one file per key
//! under a root directory, which keeps writes atomic per key and makes the
//! store trivially inspectable from a shell.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Read access to the configuration store.
pub trait ParamsStore {
    /// Raw string value, `None` when the key is absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Boolean value: `1`/`true` are true, `0`/`false` are false, anything
    /// else (including absence) falls back to `default`.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).as_deref().map(str::trim) {
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            _ => default,
        }
    }

    /// Integer value, `default` on absence or parse failure.
    fn get_i32(&self, key: &str, default: i32) -> i32 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

// =============================================================================
// File-Backed Store
// =============================================================================

/// One file per key under a root directory.
pub struct FileParams {
    root: PathBuf,
}

impl FileParams {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write a value; best-effort, errors are logged and swallowed.
    pub fn put(&self, key: &str, value: &str) {
        if let Err(err) = fs::write(self.root.join(key), value) {
            tracing::warn!(key, %err, "param write failed");
        }
    }
}

impl ParamsStore for FileParams {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.root.join(key)).ok()
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// In-memory store for tests and the demo binary.
#[derive(Default)]
pub struct MemParams {
    values: HashMap<String, String>,
}

impl MemParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
    }
}

impl ParamsStore for MemParams {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_bool_decodings() {
        let mut params = MemParams::new();
        params.put("A", "1");
        params.put("B", "true");
        params.put("C", "0");
        params.put("D", "maybe");
        assert!(params.get_bool("A", false));
        assert!(params.get_bool("B", false));
        assert!(!params.get_bool("C", true));
        assert!(params.get_bool("D", true), "garbage falls back to default");
        assert!(!params.get_bool("Missing", false));
    }

    #[test]
    fn test_get_i32_parse_and_fallback() {
        let mut params = MemParams::new();
        params.put("N", " 42\n");
        params.put("Bad", "4x2");
        assert_eq!(params.get_i32("N", 0), 42);
        assert_eq!(params.get_i32("Bad", 7), 7);
        assert_eq!(params.get_i32("Missing", -1), -1);
    }

    #[test]
    fn test_file_params_round_trip() {
        let dir = std::env::temp_dir().join("onroad-ui-params-test");
        let _ = fs::create_dir_all(&dir);
        let params = FileParams::new(&dir);
        params.put("IsMetric", "1");
        assert!(params.get_bool("IsMetric", false));
        assert!(params.get("NeverWritten").is_none());
        let _ = fs::remove_dir_all(&dir);
    }
}
