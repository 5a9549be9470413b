//! Run-state store: persistence contract for reanimation blobs.
//!
//! Tickets are opaque strings minted by the store; owners are opaque
//! principals supplied by the embedder. A saved blob must never be mutated
//! by the store; tickets are single-use by convention.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::ids::{IdSource, SeededIdSource};

use super::reanimation::ReanimationState;

/// Run-state persistence failure.
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("run-state store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for paused runs.
#[async_trait]
pub trait RunStateStore: Send + Sync {
    /// Saves a reanimation state for `owner`, returning a fresh ticket.
    async fn save_reanimation_state(
        &self,
        owner: &str,
        state: &ReanimationState,
    ) -> Result<String, StateStoreError>;

    /// Loads the state behind `ticket`. `None` for unknown or foreign
    /// tickets.
    async fn load_reanimation_state(
        &self,
        owner: &str,
        ticket: &str,
    ) -> Result<Option<ReanimationState>, StateStoreError>;
}

/// Serializes reanimation state for storage.
pub trait StateSerializer: Send + Sync {
    fn serialize(&self, state: &ReanimationState) -> Result<Vec<u8>, StateStoreError>;
    fn deserialize(&self, bytes: &[u8]) -> Result<ReanimationState, StateStoreError>;
}

/// JSON-based serializer; the blob is the wire form of the state.
pub struct JsonSerializer;

impl StateSerializer for JsonSerializer {
    fn serialize(&self, state: &ReanimationState) -> Result<Vec<u8>, StateStoreError> {
        serde_json::to_vec(state).map_err(|e| StateStoreError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<ReanimationState, StateStoreError> {
        serde_json::from_slice(bytes).map_err(|e| StateStoreError::Serialization(e.to_string()))
    }
}

/// In-memory run-state store for tests and single-process embedders.
///
/// Blobs are kept as serialized bytes so a loaded state is always a fresh
/// deserialization, never a shared mutable object.
pub struct InMemoryRunStore {
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
    ids: SeededIdSource,
    serializer: JsonSerializer,
}

impl Default for InMemoryRunStore {
    fn default() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            ids: SeededIdSource::new("ticket"),
            serializer: JsonSerializer,
        }
    }
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStateStore for InMemoryRunStore {
    async fn save_reanimation_state(
        &self,
        owner: &str,
        state: &ReanimationState,
    ) -> Result<String, StateStoreError> {
        let bytes = self.serializer.serialize(state)?;
        let ticket = self.ids.next_id();
        self.blobs
            .lock()
            .map_err(|_| StateStoreError::Unavailable("store poisoned".into()))?
            .insert((owner.to_string(), ticket.clone()), bytes);
        Ok(ticket)
    }

    async fn load_reanimation_state(
        &self,
        owner: &str,
        ticket: &str,
    ) -> Result<Option<ReanimationState>, StateStoreError> {
        let bytes = {
            let blobs = self
                .blobs
                .lock()
                .map_err(|_| StateStoreError::Unavailable("store poisoned".into()))?;
            blobs.get(&(owner.to_string(), ticket.to_string())).cloned()
        };
        match bytes {
            Some(bytes) => Ok(Some(self.serializer.deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}
