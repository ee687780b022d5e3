//! Rooms, players and game orchestration for HexDeck.
//!
//! # Key types
//!
//! - [`Game`]: the orchestrator every transport event goes through
//! - [`RoomRegistry`] / [`Room`] / [`RoomData`]: live rooms and their state
//! - [`RoomStore`]: persistence contract ([`MemoryStore`], [`JsonFileStore`])
//! - [`Notifier`]: fire-and-forget delivery of [`ServerEvent`]s
//! - [`InactivityTicker`]: evicts players whose socket stayed away too long
//!
//! Lock order is registry first, then room. No code path takes a room lock
//! and then the registry lock.

mod config;
mod error;
mod events;
mod game;
mod notify;
mod player;
mod registry;
mod room;
mod store;
mod ticker;

pub use config::{GameState, RoomConfig};
pub use error::{RoomError, StoreError};
pub use events::{ClientEvent, OwnCard, PlayerInfo, PlayerState, RoomInfo, ServerEvent};
pub use game::{Connected, Game, GameStats, JoinedRoom, SweepReport};
pub use notify::{Notifier, RecordingNotifier};
pub use player::{Permissions, Player, generate_session_token, placeholder_username};
pub use registry::{RoomRegistry, generate_join_code};
pub use room::{Room, RoomData};
pub use store::{JsonFileStore, MemoryStore, RoomStore};
pub use ticker::InactivityTicker;
