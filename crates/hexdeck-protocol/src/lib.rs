//! Wire protocol for HexDeck.
//!
//! This crate defines the vocabulary shared by the server and its clients:
//!
//! - **Identities** ([`PlayerId`], [`RoomId`], [`ConnectionId`]): the
//!   newtypes every other layer keys its state by.
//! - **Status** ([`Status`], [`StatusCode`]): the short machine-readable
//!   codes used to reject an action.
//! - **Envelopes** ([`Envelope`], [`Payload`], [`SystemMessage`]): the
//!   framing that carries either session plumbing or game events.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become bytes.
//!
//! The protocol layer knows nothing about rooms or cards. Game events are
//! supplied by the room layer as the `G` parameter of [`Envelope`].
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope<G>) → Room (ClientEvent / ServerEvent)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ConnectionId, Envelope, MAX_RANDOM_ID, Payload, PlayerId, RoomId, Status, StatusCode,
    SystemMessage,
};

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;
