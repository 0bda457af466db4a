//! Room registry: maps room ids to running room actors.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};

use super::{
    actor::{RoomActor, RoomHandle},
    errors::{RegistryError, RegistryResult},
    messages::{JoinAttempt, JoinReply, RoomMessage, RoomNotification},
};
use crate::{
    game::{
        CardId, CardPool, GameError, NotFoundReason, PlayerName, Room, RoomConfig, RoomId,
        RoomSnapshot, RoomSummary, RoomView, SessionId, ValidationReason,
    },
    store::{MemoryRoomStore, RoomStore},
};

/// Join attempts before giving up on a room that keeps shutting down under us.
const JOIN_ATTEMPTS: usize = 8;

/// Owns every live room.
///
/// The map lock is only held to look up, insert or remove a handle, never
/// while a room is being awaited. Rooms retire themselves once empty, so a
/// join that lands on a retired room sees `RoomClosed`, drops the stale
/// handle and tries again with a fresh room.
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<RoomId, RoomHandle>>>,
    config: RoomConfig,
    pool: CardPool,
    store: Arc<dyn RoomStore>,
}

impl RoomRegistry {
    /// Create a registry handing `config` and `pool` to every room it creates.
    pub fn new(
        config: RoomConfig,
        pool: CardPool,
        store: Arc<dyn RoomStore>,
    ) -> RegistryResult<Self> {
        config.validate().map_err(RegistryError::InvalidConfig)?;

        Ok(Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            config,
            pool,
            store,
        })
    }

    /// Registry backed by a [`MemoryRoomStore`].
    pub fn in_memory(config: RoomConfig, pool: CardPool) -> RegistryResult<Self> {
        Self::new(config, pool, Arc::new(MemoryRoomStore::new()))
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Spawn actors for every non-empty room in the store. Empty records are
    /// dropped. Returns the number of rooms brought back.
    pub async fn rehydrate(&self) -> RegistryResult<usize> {
        let mut snapshots = Vec::new();
        for snapshot in self.store.load_all().await? {
            if snapshot.roster.is_empty() {
                self.store.remove(&snapshot.id).await?;
            } else {
                snapshots.push(snapshot);
            }
        }

        let mut rooms = self.rooms.write().await;
        let mut restored = 0;
        for snapshot in snapshots {
            if rooms.contains_key(&snapshot.id) {
                continue;
            }

            let id = snapshot.id.clone();
            let room = Room::restore(snapshot, self.pool.clone());
            rooms.insert(id.clone(), RoomActor::spawn(room, self.store.clone()));
            log::info!("Restored room {}", id);
            restored += 1;
        }

        Ok(restored)
    }

    pub async fn get_room(&self, room_id: &RoomId) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).cloned()
    }

    async fn handle(&self, room_id: &RoomId) -> RegistryResult<RoomHandle> {
        self.get_room(room_id)
            .await
            .ok_or_else(|| GameError::from(NotFoundReason::UnknownRoom(room_id.clone())).into())
    }

    async fn get_or_create(&self, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = self.get_room(room_id).await
            && !handle.is_closed()
        {
            return handle;
        }

        let mut rooms = self.rooms.write().await;
        match rooms.get(room_id) {
            Some(handle) if !handle.is_closed() => handle.clone(),
            _ => {
                let room = Room::new(room_id.clone(), self.config.clone(), self.pool.clone());
                let handle = RoomActor::spawn(room, self.store.clone());
                rooms.insert(room_id.clone(), handle.clone());
                log::info!("Created room {}", room_id);
                handle
            }
        }
    }

    /// Drop `handle` from the map unless the room id already points at a
    /// newer actor. Returns whether anything was removed.
    async fn forget(&self, handle: &RoomHandle) -> bool {
        let mut rooms = self.rooms.write().await;
        if rooms
            .get(handle.room_id())
            .is_some_and(|current| current.same_actor(handle))
        {
            rooms.remove(handle.room_id());
            true
        } else {
            false
        }
    }

    /// Join `room_id` as `name`, creating the room if nobody is in it yet.
    pub async fn join(
        &self,
        room_id: &RoomId,
        name: PlayerName,
        session: SessionId,
    ) -> RegistryResult<JoinReply> {
        if room_id.as_str().is_empty() {
            return Err(GameError::from(ValidationReason::EmptyRoomId).into());
        }

        let mut last_err = RegistryError::RoomClosed(room_id.clone());
        for _ in 0..JOIN_ATTEMPTS {
            let handle = self.get_or_create(room_id).await;
            let attempt = handle
                .request(|response| RoomMessage::Join {
                    name: name.clone(),
                    session: session.clone(),
                    response,
                })
                .await;

            match attempt {
                Ok(JoinAttempt { result, retired }) => {
                    if retired && self.forget(&handle).await {
                        log::info!("Dropped room {} after a failed first join", room_id);
                    }
                    return result.map_err(RegistryError::from);
                }
                Err(err) => {
                    // Emptied and retired between lookup and join.
                    log::debug!("Room {} closed under a join, retrying", room_id);
                    self.forget(&handle).await;
                    last_err = err;
                }
            }
        }

        Err(last_err)
    }

    /// Remove `session`'s player from every room it sits in and destroy any
    /// room left empty. Returns the rooms the session was removed from.
    pub async fn leave(&self, session: &SessionId) -> RegistryResult<Vec<RoomId>> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();

        let mut affected = Vec::new();
        for handle in handles {
            let reply = match handle
                .request(|response| RoomMessage::Leave {
                    session: session.clone(),
                    response,
                })
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    log::debug!("Skipping room {} during leave: {}", handle.room_id(), e);
                    continue;
                }
            };

            if reply.left.is_some() {
                affected.push(handle.room_id().clone());
            }
            if reply.retired && self.forget(&handle).await {
                log::info!("Destroyed empty room {}", handle.room_id());
            }
        }

        if affected.is_empty() {
            return Err(GameError::from(NotFoundReason::UnknownSession(session.clone())).into());
        }
        affected.sort();
        Ok(affected)
    }

    pub async fn start_game(&self, room_id: &RoomId) -> RegistryResult<RoomSnapshot> {
        self.act(room_id, |response| RoomMessage::StartGame { response })
            .await
    }

    pub async fn give_hint(
        &self,
        room_id: &RoomId,
        session: &SessionId,
        card_id: CardId,
        hint: &str,
    ) -> RegistryResult<RoomSnapshot> {
        self.act(room_id, |response| RoomMessage::GiveHint {
            session: session.clone(),
            card_id,
            hint: hint.to_string(),
            response,
        })
        .await
    }

    pub async fn choose_card(
        &self,
        room_id: &RoomId,
        session: &SessionId,
        card_id: CardId,
    ) -> RegistryResult<RoomSnapshot> {
        self.act(room_id, |response| RoomMessage::ChooseCard {
            session: session.clone(),
            card_id,
            response,
        })
        .await
    }

    pub async fn vote(
        &self,
        room_id: &RoomId,
        session: &SessionId,
        card_id: CardId,
    ) -> RegistryResult<RoomSnapshot> {
        self.act(room_id, |response| RoomMessage::Vote {
            session: session.clone(),
            card_id,
            response,
        })
        .await
    }

    pub async fn next_round(&self, room_id: &RoomId) -> RegistryResult<RoomSnapshot> {
        self.act(room_id, |response| RoomMessage::NextRound { response })
            .await
    }

    pub async fn restart(&self, room_id: &RoomId) -> RegistryResult<RoomSnapshot> {
        self.act(room_id, |response| RoomMessage::Restart { response })
            .await
    }

    async fn act(
        &self,
        room_id: &RoomId,
        make: impl FnOnce(super::messages::ActionResponse) -> RoomMessage,
    ) -> RegistryResult<RoomSnapshot> {
        let handle = self.handle(room_id).await?;
        Ok(handle.request(make).await??)
    }

    pub async fn get_state(&self, room_id: &RoomId) -> RegistryResult<RoomSnapshot> {
        let handle = self.handle(room_id).await?;
        handle
            .request(|response| RoomMessage::GetState { response })
            .await
    }

    /// The room as `viewer` may see it.
    pub async fn view(
        &self,
        room_id: &RoomId,
        viewer: Option<&SessionId>,
    ) -> RegistryResult<RoomView> {
        Ok(self.get_state(room_id).await?.view_for(viewer))
    }

    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(snapshot) = handle
                .request(|response| RoomMessage::GetState { response })
                .await
            {
                summaries.push(snapshot.summary());
            }
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub async fn subscribe(
        &self,
        room_id: &RoomId,
        session: SessionId,
        sender: mpsc::Sender<RoomNotification>,
    ) -> RegistryResult<()> {
        let handle = self.handle(room_id).await?;
        handle
            .send(RoomMessage::Subscribe { session, sender })
            .await
    }

    pub async fn unsubscribe(&self, room_id: &RoomId, session: SessionId) {
        if let Some(handle) = self.get_room(room_id).await {
            let _ = handle.send(RoomMessage::Unsubscribe { session }).await;
        }
    }

    pub async fn active_room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Phase, StateReason};

    fn registry() -> RoomRegistry {
        RoomRegistry::in_memory(RoomConfig::default(), CardPool::numbered(84)).unwrap()
    }

    fn room() -> RoomId {
        RoomId::new("parlor")
    }

    #[tokio::test]
    async fn test_join_creates_room() {
        let registry = registry();
        let reply = registry
            .join(&room(), "ada".into(), "s1".into())
            .await
            .unwrap();

        assert_eq!(reply.snapshot.roster.len(), 1);
        assert_eq!(registry.active_room_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_first_join_leaves_no_room() {
        let registry = registry();
        let err = registry
            .join(&room(), "   ".into(), "s1".into())
            .await
            .unwrap_err();

        assert_eq!(
            err.game_error().map(|e| e.code()),
            Some("validation.empty_name".to_string())
        );
        assert_eq!(registry.active_room_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let registry = registry();
        let err = registry.start_game(&room()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Game(GameError::NotFound(NotFoundReason::UnknownRoom(_)))
        ));
    }

    #[tokio::test]
    async fn test_leave_destroys_empty_room() {
        let registry = registry();
        registry.join(&room(), "ada".into(), "s1".into()).await.unwrap();
        registry
            .join(&RoomId::new("attic"), "ada".into(), "s1".into())
            .await
            .unwrap();
        registry
            .join(&RoomId::new("attic"), "bo".into(), "s2".into())
            .await
            .unwrap();

        let affected = registry.leave(&"s1".into()).await.unwrap();

        assert_eq!(affected, vec![RoomId::new("attic"), room()]);
        assert_eq!(registry.active_room_count().await, 1);
        assert!(registry.get_room(&room()).await.is_none());
    }

    #[tokio::test]
    async fn test_leave_unknown_session() {
        let registry = registry();
        registry.join(&room(), "ada".into(), "s1".into()).await.unwrap();

        let err = registry.leave(&"ghost".into()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Game(GameError::NotFound(NotFoundReason::UnknownSession(_)))
        ));
        assert_eq!(registry.active_room_count().await, 1);
    }

    #[tokio::test]
    async fn test_start_game_needs_players() {
        let registry = registry();
        registry.join(&room(), "ada".into(), "s1".into()).await.unwrap();

        let err = registry.start_game(&room()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Game(GameError::State(StateReason::NotEnoughPlayers { .. }))
        ));
        let state = registry.get_state(&room()).await.unwrap();
        assert_eq!(state.phase, Phase::Waiting);
    }

    #[tokio::test]
    async fn test_rehydrate_restores_rooms() {
        let store = Arc::new(MemoryRoomStore::new());
        let first =
            RoomRegistry::new(RoomConfig::default(), CardPool::numbered(84), store.clone())
                .unwrap();
        for (name, session) in [("ada", "s1"), ("bo", "s2"), ("cy", "s3")] {
            first.join(&room(), name.into(), session.into()).await.unwrap();
        }
        first.start_game(&room()).await.unwrap();

        let second =
            RoomRegistry::new(RoomConfig::default(), CardPool::numbered(84), store).unwrap();
        assert_eq!(second.rehydrate().await.unwrap(), 1);

        let state = second.get_state(&room()).await.unwrap();
        assert_eq!(state.phase, Phase::Storytelling);
        assert_eq!(state.roster.len(), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RoomConfig {
            hand_size: 0,
            ..RoomConfig::default()
        };
        assert!(matches!(
            RoomRegistry::in_memory(config, CardPool::builtin()),
            Err(RegistryError::InvalidConfig(_))
        ));
    }
}
