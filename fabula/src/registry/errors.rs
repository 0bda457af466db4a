//! Registry error types.

use thiserror::Error;

use crate::{
    game::{GameError, RoomId},
    store::StoreError,
};

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The engine rejected the action
    #[error(transparent)]
    Game(#[from] GameError),

    /// The room's actor stopped before answering
    #[error("room {0} is closed")]
    RoomClosed(RoomId),

    #[error("invalid room config: {0}")]
    InvalidConfig(String),

    #[error("room store error: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// Engine error behind this failure, if any.
    pub fn game_error(&self) -> Option<&GameError> {
        match self {
            Self::Game(err) => Some(err),
            _ => None,
        }
    }
}
