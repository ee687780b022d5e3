//! Unified error type for the HexDeck server.

use hexdeck_protocol::ProtocolError;
use hexdeck_room::{RoomError, StoreError};
use hexdeck_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps every crate-specific error, so `?` works
/// across layers.
#[derive(Debug, thiserror::Error)]
pub enum HexdeckError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A rejected action that ended a connection, e.g. a bad handshake.
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
