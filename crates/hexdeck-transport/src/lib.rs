//! Transport abstraction layer for HexDeck.
//!
//! [`Transport`] accepts sockets; [`Connection`] moves whole frames in
//! and out of one of them. The server only ever talks to these traits, so
//! tests and alternative transports can slot in without touching the room
//! logic.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use hexdeck_protocol::ConnectionId;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One live socket.
///
/// Sending and receiving may run concurrently from different tasks: a
/// connection task blocks in [`recv`](Connection::recv) while room events
/// are pushed out through [`send`](Connection::send).
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame.
    ///
    /// Returns `Ok(None)` when the peer closed the connection.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
