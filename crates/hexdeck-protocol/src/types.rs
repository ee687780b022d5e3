//! Core protocol types for HexDeck's wire format.
//!
//! Everything in this module is serialized onto the socket, so the serde
//! attributes here are part of the public contract with browser clients.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Player ids survive a server restart (rooms are reloaded from storage),
/// so they are drawn at random instead of from a process-local counter.
/// `#[serde(transparent)]` keeps the wire shape a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

/// Largest id [`PlayerId::random`] and [`RoomId::random`] hand out. Browser
/// clients parse numbers as `f64`, which is exact only up to 2^53 - 1.
pub const MAX_RANDOM_ID: u64 = (1 << 53) - 1;

fn random_id() -> u64 {
    rand::random::<u64>() & MAX_RANDOM_ID
}

impl PlayerId {
    /// Draws a fresh random id no larger than [`MAX_RANDOM_ID`].
    pub fn random() -> Self {
        Self(random_id())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{:x}", self.0)
    }
}

/// A unique identifier for a room (one game session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl RoomId {
    /// Draws a fresh random id no larger than [`MAX_RANDOM_ID`].
    pub fn random() -> Self {
        Self(random_id())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{:x}", self.0)
    }
}

/// Process-local identifier of one live socket.
///
/// A player keeps the same [`PlayerId`] across reconnects, but every new
/// socket gets a new `ConnectionId`. Comparing the two lets the server
/// ignore a late disconnect from a socket that was already replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Machine-readable reason attached to a [`Status`].
///
/// Serialized in snake_case (`"player_not_active"`), which is what the
/// browser client switches on to pick a translated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    InvalidSession,
    ConnectionFromDifferentSocket,
    InvalidJoinCode,
    GameAlreadyRunning,
    InsufficientPermission,
    InvalidPlayer,
    UsernameTaken,
    GameAlreadyStarted,
    GameNotRunning,
    PlayerNotActive,
    MissingParameter,
    InvalidCardIndex,
    CardNotPlayable,
    CardNotUpdatable,
    DrawBlocked,
    DeckExhausted,
    InvalidCardDeck,
    PlayerKicked,
    VersionMismatch,
}

impl StatusCode {
    /// The wire spelling of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSession => "invalid_session",
            Self::ConnectionFromDifferentSocket => "connection_from_different_socket",
            Self::InvalidJoinCode => "invalid_join_code",
            Self::GameAlreadyRunning => "game_already_running",
            Self::InsufficientPermission => "insufficient_permission",
            Self::InvalidPlayer => "invalid_player",
            Self::UsernameTaken => "username_taken",
            Self::GameAlreadyStarted => "game_already_started",
            Self::GameNotRunning => "game_not_running",
            Self::PlayerNotActive => "player_not_active",
            Self::MissingParameter => "missing_parameter",
            Self::InvalidCardIndex => "invalid_card_index",
            Self::CardNotPlayable => "card_not_playable",
            Self::CardNotUpdatable => "card_not_updatable",
            Self::DrawBlocked => "draw_blocked",
            Self::DeckExhausted => "deck_exhausted",
            Self::InvalidCardDeck => "invalid_card_deck",
            Self::PlayerKicked => "player_kicked",
            Self::VersionMismatch => "version_mismatch",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notice on a room's status channel.
///
/// Rejected actions are reported with `is_error: true`, a [`StatusCode`],
/// and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub is_error: bool,
    pub status_code: StatusCode,
    pub message: String,
}

impl Status {
    /// Builds an error status.
    pub fn error(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            status_code,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SystemMessage
// ---------------------------------------------------------------------------

/// Messages handled by the server itself rather than by a room.
///
/// Internally tagged: `{ "type": "JoinRoom", "join_code": "042917", ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --

    /// Client → Server: attach this socket to an existing session.
    Handshake {
        version: u32,
        session_token: String,
    },

    /// Server → Client: the socket is now attached to `player_id`.
    HandshakeAck {
        player_id: PlayerId,
        room_id: RoomId,
        server_time: u64,
    },

    /// Either direction: "I'm disconnecting."
    Disconnect { reason: String },

    /// Client → Server: keep-alive.
    Heartbeat { client_time: u64 },

    /// Server → Client: keep-alive echo with server timing.
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    // -- Room entry --

    /// Client → Server: create a room and become its host.
    CreateRoom {
        #[serde(default)]
        username: String,
    },

    /// Client → Server: join the room with this code.
    JoinRoom {
        join_code: String,
        #[serde(default)]
        username: String,
    },

    /// Server → Client: a seat was created for you. Keep the token;
    /// it is the only way back into the room after a disconnect.
    RoomJoined {
        room_id: RoomId,
        player_id: PlayerId,
        username: String,
        session_token: String,
    },

    /// Client → Server: give up the seat for good.
    LeaveRoom,

    // -- Lookups --

    /// Client → Server: does a room with this code exist?
    CheckJoinCode { join_code: String },

    /// Server → Client: answer to [`SystemMessage::CheckJoinCode`].
    JoinCodeChecked { join_code: String, valid: bool },

    /// Client → Server: is this session token still seated somewhere?
    CheckSession { session_token: String },

    /// Server → Client: answer to [`SystemMessage::CheckSession`].
    SessionChecked { valid: bool },

    /// Client → Server: request the global stats summary.
    GetStats,

    /// Server → Client: global stats summary.
    Stats {
        total_games_played: u64,
        running_games: usize,
        online_player_count: usize,
    },

    // -- Notices --

    /// Server → Client: an action was rejected, or a notice such as
    /// "you were kicked".
    Status(Status),
}

// ---------------------------------------------------------------------------
// Payload / Envelope
// ---------------------------------------------------------------------------

/// The content of a frame: either session plumbing or a game event.
///
/// Adjacently tagged:
///   `{ "type": "System", "data": { "type": "Heartbeat", "client_time": 1 } }`
///   `{ "type": "Game", "data": { "type": "DrawCard" } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload<G> {
    /// A server-level message.
    System(SystemMessage),

    /// A game event, defined by the room layer.
    Game(G),
}

/// The top-level frame. Every message on the wire is an `Envelope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<G> {
    /// Per-direction sequence number.
    pub seq: u64,

    /// Milliseconds since the sender started.
    pub timestamp: u64,

    /// The message content.
    pub payload: Payload<G>,
}

// =========================================================================
// Tests
// =========================================================================
