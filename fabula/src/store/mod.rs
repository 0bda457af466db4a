//! Room storage behind a trait, so the registry can be handed whatever
//! backing the deployment wants.
//!
//! Only an in-memory store ships. The registry writes every post-action
//! snapshot through the store and deletes the record when a room is
//! destroyed; rooms can be rebuilt from stored snapshots on startup with
//! [`crate::registry::RoomRegistry::rehydrate`].

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::game::{RoomId, RoomSnapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for room snapshot storage
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Insert or replace the snapshot for a room
    async fn save(&self, snapshot: &RoomSnapshot) -> StoreResult<()>;

    /// Fetch one room's latest snapshot
    async fn load(&self, id: &RoomId) -> StoreResult<Option<RoomSnapshot>>;

    /// Every stored snapshot
    async fn load_all(&self) -> StoreResult<Vec<RoomSnapshot>>;

    /// Forget a room
    async fn remove(&self, id: &RoomId) -> StoreResult<()>;
}

/// Process-local store. Everything is gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<RoomId, RoomSnapshot>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with snapshots exported from another process.
    pub fn with_snapshot(mut self, snapshot: RoomSnapshot) -> Self {
        self.rooms.get_mut().insert(snapshot.id.clone(), snapshot);
        self
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn save(&self, snapshot: &RoomSnapshot) -> StoreResult<()> {
        self.rooms
            .write()
            .await
            .insert(snapshot.id.clone(), snapshot.clone());
        Ok(())
    }

    async fn load(&self, id: &RoomId) -> StoreResult<Option<RoomSnapshot>> {
        Ok(self.rooms.read().await.get(id).cloned())
    }

    async fn load_all(&self) -> StoreResult<Vec<RoomSnapshot>> {
        Ok(self.rooms.read().await.values().cloned().collect())
    }

    async fn remove(&self, id: &RoomId) -> StoreResult<()> {
        self.rooms.write().await.remove(id);
        Ok(())
    }
}
