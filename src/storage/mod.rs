//! Persistent key-value storage for engine state.
//!
//! The engine talks to storage through the narrow [`Storage`] trait:
//!
//! ```text
//! ┌──────────────────┐
//! │   TimerEngine    │
//! └────────┬─────────┘
//!          │ get / set / remove
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │     Storage      │────▶│  FileStorage     │
//! │     (trait)      │     │  (<key>.json)    │
//! │                  │     ├──────────────────┤
//! │                  │────▶│  MemoryStorage   │
//! └──────────────────┘     │  (tests, embed)  │
//!                          └──────────────────┘
//! ```
//!
//! Writes are best-effort: [`write_json`] and [`read_json`] log failures and
//! never propagate them.

mod error;
mod file;
mod memory;

pub use error::StorageError;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::Serialize;
use serde_json::Value;

/// Key of the persisted settings record.
pub const SETTINGS_KEY: &str = "pomodoro-settings";
/// Key of the persisted timer state record.
pub const STATE_KEY: &str = "pomodoro-state";
/// Key of the persisted daily session counter.
pub const TODAY_KEY: &str = "pomodoro-today";

/// Every key owned by the engine.
pub const ALL_KEYS: [&str; 3] = [SETTINGS_KEY, STATE_KEY, TODAY_KEY];

/// Key-value string storage.
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and parses the JSON value under `key`.
///
/// Read failures and unparsable content are logged and reported as absent.
pub fn read_json(storage: &dyn Storage, key: &str) -> Option<Value> {
    let raw = match storage.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring malformed {} record: {}", key, e);
            None
        }
    }
}

/// Serializes `value` and stores it under `key`.
///
/// Returns the written JSON on success. Failures are logged and swallowed.
pub fn write_json<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) -> Option<String> {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("Failed to serialize {}: {}", key, e);
            return None;
        }
    };

    match storage.set(key, &json) {
        Ok(()) => Some(json),
        Err(e) => {
            tracing::warn!("Failed to persist {}: {}", key, e);
            None
        }
    }
}

/// Removes every key owned by the engine.
///
/// Each removal is attempted even if an earlier one fails.
pub fn clear_all(storage: &dyn Storage) {
    for key in ALL_KEYS {
        if let Err(e) = storage.remove(key) {
            tracing::warn!("Failed to remove {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_json_absent() {
        let storage = MemoryStorage::new();
        assert_eq!(read_json(&storage, STATE_KEY), None);
    }

    #[test]
    fn test_read_json_malformed_is_absent() {
        let storage = MemoryStorage::new();
        storage.set(STATE_KEY, "{not json").unwrap();
        assert_eq!(read_json(&storage, STATE_KEY), None);
    }

    #[test]
    fn test_write_then_read_json() {
        let storage = MemoryStorage::new();
        let written = write_json(&storage, TODAY_KEY, &json!({"sessions": 2}));
        assert_eq!(written.as_deref(), Some(r#"{"sessions":2}"#));
        assert_eq!(read_json(&storage, TODAY_KEY), Some(json!({"sessions": 2})));
    }

    #[test]
    fn test_write_json_failure_is_swallowed() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        assert_eq!(write_json(&storage, TODAY_KEY, &json!({})), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_clear_all_removes_engine_keys_only() {
        let storage = MemoryStorage::new();
        for key in ALL_KEYS {
            storage.set(key, "{}").unwrap();
        }
        storage.set("pomodoro-size", "\"mini\"").unwrap();

        clear_all(&storage);

        for key in ALL_KEYS {
            assert_eq!(storage.get(key).unwrap(), None);
        }
        assert!(storage.get("pomodoro-size").unwrap().is_some());
    }
}
