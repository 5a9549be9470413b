//! Data store: carries large inline blobs out-of-band.
//!
//! Handlers write a value and receive a handle; the runner substitutes
//! handles for inline data at graph boundaries (`deflate`) and resolves
//! them back when emitting to consumers (`inflate`). Reads may be
//! concurrent; a write always creates a new handle.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::ids::{IdSource, SeededIdSource};

/// Key marking a part as inline data eligible for deflation.
pub const INLINE_DATA_KEY: &str = "inlineData";

/// Key marking a part as a stored-data handle.
pub const STORED_DATA_KEY: &str = "storedData";

/// Blob storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown data handle: {0}")]
    UnknownHandle(String),

    #[error("data store unavailable: {0}")]
    Unavailable(String),
}

/// Blob store contract. Thread-safe from the core's perspective.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Stores a value and returns a fresh opaque handle.
    async fn store(&self, value: Value) -> Result<String, StoreError>;

    /// Retrieves the value behind a handle.
    async fn retrieve(&self, handle: &str) -> Result<Value, StoreError>;
}

/// Walks `value` and moves every `{"inlineData": …}` part into the store,
/// leaving `{"storedData": {"handle": …}}` in its place.
pub async fn deflate(store: &dyn DataStore, value: Value) -> Result<Value, StoreError> {
    match value {
        Value::Object(map) => {
            if map.contains_key(INLINE_DATA_KEY) && map.len() == 1 {
                let inline = map.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null);
                let handle = store.store(inline).await?;
                return Ok(json!({ STORED_DATA_KEY: { "handle": handle } }));
            }
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, inner) in map {
                out.insert(key, Box::pin(deflate(store, inner)).await?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(Box::pin(deflate(store, item)).await?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other),
    }
}

/// Reverse of [`deflate`]: resolves every stored-data handle back to its
/// inline form.
pub async fn inflate(store: &dyn DataStore, value: Value) -> Result<Value, StoreError> {
    match value {
        Value::Object(map) => {
            if let Some(stored) = map.get(STORED_DATA_KEY) {
                if map.len() == 1 {
                    if let Some(handle) = stored.get("handle").and_then(Value::as_str) {
                        let inline = store.retrieve(handle).await?;
                        return Ok(json!({ INLINE_DATA_KEY: inline }));
                    }
                }
            }
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, inner) in map {
                out.insert(key, Box::pin(inflate(store, inner)).await?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(Box::pin(inflate(store, item)).await?);
            }
            Ok(Value::Array(out))
        }
        other => Ok(other),
    }
}

/// In-memory blob store for tests and single-process embedders.
pub struct InMemoryDataStore {
    blobs: Mutex<HashMap<String, Value>>,
    ids: SeededIdSource,
}

impl Default for InMemoryDataStore {
    fn default() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            ids: SeededIdSource::new("blob"),
        }
    }
}

impl InMemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    async fn store(&self, value: Value) -> Result<String, StoreError> {
        let handle = self.ids.next_id();
        self.blobs
            .lock()
            .map_err(|_| StoreError::Unavailable("store poisoned".into()))?
            .insert(handle.clone(), value);
        Ok(handle)
    }

    async fn retrieve(&self, handle: &str) -> Result<Value, StoreError> {
        self.blobs
            .lock()
            .map_err(|_| StoreError::Unavailable("store poisoned".into()))?
            .get(handle)
            .cloned()
            .ok_or_else(|| StoreError::UnknownHandle(handle.to_string()))
    }
}
