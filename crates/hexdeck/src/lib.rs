//! # HexDeck
//!
//! Multiplayer server for a turn-based, Uno-like card game.
//!
//! Players create or join rooms over a WebSocket, agree on a deck in the
//! lobby and play it out in turns. The server is authoritative: clients
//! only ever see their own hand, and every action is checked against the
//! room's state before it is applied.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hexdeck::prelude::*;
//!
//! # async fn run() -> Result<(), HexdeckError> {
//! let config = ServerConfig::from_env()?;
//! let server = HexdeckServerBuilder::from_config(&config)?.build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod notifier;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::HexdeckError;
pub use notifier::ChannelNotifier;
pub use server::{HexdeckServer, HexdeckServerBuilder};

/// Everything needed to run a server or talk to one.
pub mod prelude {
    pub use crate::{
        ChannelNotifier, ConfigError, HexdeckError, HexdeckServer, HexdeckServerBuilder,
        ServerConfig,
    };

    pub use hexdeck_deck::{CardDeck, Deck, DeckKind};
    pub use hexdeck_protocol::{
        Envelope, PROTOCOL_VERSION, Payload, PlayerId, RoomId, Status, StatusCode, SystemMessage,
    };
    pub use hexdeck_room::{
        ClientEvent, Game, GameState, JsonFileStore, MemoryStore, RoomConfig, RoomStore,
        ServerEvent,
    };
    pub use hexdeck_tick::TickConfig;
}
