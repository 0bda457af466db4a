//! Room actor: one task per room, draining an mpsc inbox one message at a
//! time. This is what serializes every action against a room.
//!
//! A room that ends a join or leave with nobody seated retires: it drops its
//! stored record, tells subscribers, closes its inbox and stops. Anything
//! sent afterwards fails with [`RegistryError::RoomClosed`].

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, oneshot};

use super::{
    errors::{RegistryError, RegistryResult},
    messages::{JoinAttempt, JoinReply, LeaveReply, RoomMessage, RoomNotification},
};
use crate::{
    game::{GameResult, Room, RoomId, RoomSnapshot, SessionId},
    store::RoomStore,
};

const INBOX_CAPACITY: usize = 100;

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    room_id: RoomId,
}

impl RoomHandle {
    pub fn new(sender: mpsc::Sender<RoomMessage>, room_id: RoomId) -> Self {
        Self { sender, room_id }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Whether both handles talk to the same actor.
    pub fn same_actor(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Send a message to the room
    pub async fn send(&self, message: RoomMessage) -> RegistryResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RegistryError::RoomClosed(self.room_id.clone()))
    }

    /// Send a message built around a fresh oneshot and wait for the answer.
    pub async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomMessage,
    ) -> RegistryResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx)).await?;
        rx.await
            .map_err(|_| RegistryError::RoomClosed(self.room_id.clone()))
    }
}

/// Actor owning a single room
pub struct RoomActor {
    room: Room,
    inbox: mpsc::Receiver<RoomMessage>,
    store: Arc<dyn RoomStore>,
    /// Subscribers for state change notifications, keyed by session
    subscribers: HashMap<SessionId, mpsc::Sender<RoomNotification>>,
    is_closed: bool,
}

impl RoomActor {
    pub fn new(room: Room, store: Arc<dyn RoomStore>) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let handle = RoomHandle::new(sender, room.id().clone());

        let actor = Self {
            room,
            inbox,
            store,
            subscribers: HashMap::new(),
            is_closed: false,
        };

        (actor, handle)
    }

    /// Spawn the actor on the current runtime and return its handle.
    pub fn spawn(room: Room, store: Arc<dyn RoomStore>) -> RoomHandle {
        let (actor, handle) = Self::new(room, store);
        tokio::spawn(actor.run());
        handle
    }

    /// Run the room actor event loop
    pub async fn run(mut self) {
        log::debug!("Room {} actor starting", self.room.id());

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;
            if self.is_closed {
                break;
            }
        }

        log::debug!("Room {} actor stopped", self.room.id());
    }

    async fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                name,
                session,
                response,
            } => {
                let result = match self.room.join(name, session) {
                    Ok(outcome) => {
                        self.commit().await;
                        Ok(JoinReply {
                            outcome,
                            snapshot: self.room.snapshot(),
                        })
                    }
                    Err(err) => Err(err),
                };
                // Only a room nobody ever got into can be empty here.
                let retired = self.room.player_count() == 0;
                if retired {
                    self.retire().await;
                }
                let _ = response.send(JoinAttempt { result, retired });
            }

            RoomMessage::Leave { session, response } => {
                let left = if self.room.contains_session(&session) {
                    match self.room.leave(&session) {
                        Ok(name) => {
                            self.subscribers.remove(&session);
                            self.commit().await;
                            Some(name)
                        }
                        Err(err) => {
                            log::warn!("Room {}: leave failed: {}", self.room.id(), err);
                            None
                        }
                    }
                } else {
                    None
                };
                let remaining = self.room.player_count();
                let retired = left.is_some() && remaining == 0;
                if retired {
                    self.retire().await;
                }
                let _ = response.send(LeaveReply {
                    left,
                    remaining,
                    retired,
                });
            }

            RoomMessage::StartGame { response } => {
                let result = self.room.start_game();
                let _ = response.send(self.finish(result).await);
            }

            RoomMessage::GiveHint {
                session,
                card_id,
                hint,
                response,
            } => {
                let result = self.room.give_hint(&session, card_id, &hint);
                let _ = response.send(self.finish(result).await);
            }

            RoomMessage::ChooseCard {
                session,
                card_id,
                response,
            } => {
                let result = self.room.choose_card(&session, card_id);
                let _ = response.send(self.finish(result).await);
            }

            RoomMessage::Vote {
                session,
                card_id,
                response,
            } => {
                let result = self.room.vote(&session, card_id);
                let _ = response.send(self.finish(result).await);
            }

            RoomMessage::NextRound { response } => {
                let result = self.room.next_round();
                let _ = response.send(self.finish(result).await);
            }

            RoomMessage::Restart { response } => {
                let result = self.room.restart();
                let _ = response.send(self.finish(result).await);
            }

            RoomMessage::GetState { response } => {
                let _ = response.send(self.room.snapshot());
            }

            RoomMessage::Subscribe { session, sender } => {
                log::debug!("Session {} subscribed to room {}", session, self.room.id());
                self.subscribers.insert(session, sender);
            }

            RoomMessage::Unsubscribe { session } => {
                log::debug!(
                    "Session {} unsubscribed from room {}",
                    session,
                    self.room.id()
                );
                self.subscribers.remove(&session);
            }
        }
    }

    /// Shut the room down for good.
    async fn retire(&mut self) {
        self.inbox.close();
        if let Err(e) = self.store.remove(self.room.id()).await {
            log::error!("Room {}: failed to drop stored record: {}", self.room.id(), e);
        }
        self.broadcast(RoomNotification::Closed);
        self.is_closed = true;
        log::info!("Room {} is empty, shutting down", self.room.id());
    }

    async fn finish(&mut self, result: GameResult<()>) -> GameResult<RoomSnapshot> {
        result?;
        self.commit().await;
        Ok(self.room.snapshot())
    }

    /// Persist the room and tell subscribers what happened.
    async fn commit(&mut self) {
        let events: Vec<_> = self.room.drain_events().into_iter().collect();
        if events.is_empty() {
            return;
        }
        for event in &events {
            log::debug!("Room {}: {}", self.room.id(), event);
        }

        let snapshot = Arc::new(self.room.snapshot());
        if let Err(e) = self.store.save(&snapshot).await {
            log::error!("Room {}: failed to store snapshot: {}", self.room.id(), e);
        }

        self.broadcast(RoomNotification::StateChanged { events, snapshot });
    }

    /// Broadcast a notification to all subscribers
    fn broadcast(&mut self, notification: RoomNotification) {
        self.subscribers.retain(|session, sender| {
            match sender.try_send(notification.clone()) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Subscriber {} channel full, dropping notification", session);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", session);
                    false
                }
            }
        });
    }
}
