//! Room registry with one async actor per room.
//!
//! ## Architecture
//!
//! Each room runs in its own Tokio task with an mpsc message inbox and
//! answers over oneshot channels, so actions against one room are applied in
//! arrival order while different rooms never wait on each other. The
//! [`RoomRegistry`] creates rooms on first join, destroys them when their last
//! player leaves, and writes every change through the injected
//! [`crate::store::RoomStore`].
//!
//! ## Example
//!
//! ```no_run
//! use fabula::{CardPool, RoomConfig, RoomId, RoomRegistry};
//!
//! # async fn demo() -> Result<(), fabula::RegistryError> {
//! let registry = RoomRegistry::in_memory(RoomConfig::default(), CardPool::builtin())?;
//! let room = RoomId::new("kitchen");
//! registry.join(&room, "ada".into(), "session-1".into()).await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod errors;
pub mod manager;
pub mod messages;

pub use actor::{RoomActor, RoomHandle};
pub use errors::{RegistryError, RegistryResult};
pub use manager::RoomRegistry;
pub use messages::{JoinAttempt, JoinReply, LeaveReply, RoomMessage, RoomNotification};
