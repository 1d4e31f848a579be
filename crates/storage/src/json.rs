//! Best-effort JSON access on top of a [`CacheStore`]
//!
//! Cache reads and writes never fail their caller: storage errors are logged
//! and reported as absence (reads) or `false` (writes), and a payload that
//! does not parse is treated as if the key were missing.

use serde::{de::DeserializeOwned, Serialize};

use crate::kv::CacheStore;

/// Parse a cached payload, treating malformed JSON as absent
pub fn parse_lenient<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(key, "ignoring malformed cache payload: {}", e);
            None
        }
    }
}

/// Read a raw string, logging and swallowing storage errors
pub async fn read_string(store: &dyn CacheStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, "cache read failed: {}", e);
            None
        }
    }
}

/// Write a raw string, returning whether the write landed
pub async fn write_string(store: &dyn CacheStore, key: &str, value: &str) -> bool {
    match store.set(key, value).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, "cache write failed: {}", e);
            false
        }
    }
}

/// Remove a key, returning whether the removal landed
pub async fn remove_quietly(store: &dyn CacheStore, key: &str) -> bool {
    match store.remove(key).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, "cache remove failed: {}", e);
            false
        }
    }
}

/// Read and parse a JSON payload
pub async fn read_json<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> Option<T> {
    let raw = read_string(store, key).await?;
    parse_lenient(key, &raw)
}

/// Serialize and write a JSON payload
pub async fn write_json<T: Serialize>(store: &dyn CacheStore, key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(raw) => write_string(store, key, &raw).await,
        Err(e) => {
            tracing::warn!(key, "cache payload could not be serialized: {}", e);
            false
        }
    }
}
