//! Typed JSON helpers over a [`KeyValueStore`].
//!
//! These helpers implement the persistence error policy: a failed or
//! malformed load is logged and treated as "absent", a failed save is
//! logged and skipped. Nothing here returns an error to the caller.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::backend::KeyValueStore;

/// Load and decode the document at `key`.
///
/// Returns `None` if the key is absent, unreadable, or not valid JSON for
/// `T`; the latter two cases are logged at `warn`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let text = match store.load(key) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "Store read failed; using defaults");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "Malformed document; using defaults");
            None
        }
    }
}

/// Load the document at `key`, falling back to `T::default()`.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    load_json(store, key).unwrap_or_default()
}

/// Encode `value` and store it at `key`.
///
/// Returns `true` if the write succeeded. Failures are logged at `error`
/// and otherwise ignored; in-memory state remains authoritative.
pub fn persist<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            error!(key, error = %err, "Could not encode document; save skipped");
            return false;
        }
    };
    match store.save(key, &json) {
        Ok(()) => true,
        Err(err) => {
            error!(key, error = %err, "Store write failed; save skipped");
            false
        }
    }
}
