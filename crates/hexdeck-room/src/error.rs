//! Error types for the room layer.

use hexdeck_protocol::{PlayerId, RoomId, Status, StatusCode};

/// A rejected action.
///
/// Rejections never mutate state. Each variant maps to a stable
/// [`StatusCode`] that is sent to the acting connection together with the
/// `Display` text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("no player was found for this session token")]
    InvalidSession,

    /// The room was closed while the player still held a reference to it.
    #[error("room {0} is no longer available")]
    RoomGone(RoomId),

    #[error("no room uses join code {0:?}")]
    InvalidJoinCode(String),

    #[error("you cannot join this room as the game has already started")]
    GameAlreadyRunning,

    /// The action is reserved for the host. Carries what was attempted.
    #[error("only the host can {0}")]
    InsufficientPermission(&'static str),

    #[error("no player {0} in this room")]
    InvalidPlayer(PlayerId),

    #[error("username {0:?} is not available")]
    UsernameTaken(String),

    #[error("the game has already started")]
    GameAlreadyStarted,

    #[error("the game is not running")]
    GameNotRunning,

    #[error("you can't do this while you are not the active player")]
    PlayerNotActive,

    #[error("parameter {0} is missing")]
    MissingParameter(&'static str),

    #[error("card index {0} is out of bounds")]
    InvalidCardIndex(usize),

    #[error("you can't play this card now")]
    CardNotPlayable,

    #[error("you can't update this card now")]
    CardNotUpdatable,

    #[error("choose a color for the wildcard before drawing")]
    DrawBlocked,

    #[error("no cards are left to draw")]
    DeckExhausted,

    #[error("card deck {0} does not exist")]
    InvalidCardDeck(u8),
}

impl RoomError {
    /// The machine-readable code for this rejection.
    pub fn code(&self) -> StatusCode {
        match self {
            Self::InvalidSession | Self::RoomGone(_) => StatusCode::InvalidSession,
            Self::InvalidJoinCode(_) => StatusCode::InvalidJoinCode,
            Self::GameAlreadyRunning => StatusCode::GameAlreadyRunning,
            Self::InsufficientPermission(_) => StatusCode::InsufficientPermission,
            Self::InvalidPlayer(_) => StatusCode::InvalidPlayer,
            Self::UsernameTaken(_) => StatusCode::UsernameTaken,
            Self::GameAlreadyStarted => StatusCode::GameAlreadyStarted,
            Self::GameNotRunning => StatusCode::GameNotRunning,
            Self::PlayerNotActive => StatusCode::PlayerNotActive,
            Self::MissingParameter(_) => StatusCode::MissingParameter,
            Self::InvalidCardIndex(_) => StatusCode::InvalidCardIndex,
            Self::CardNotPlayable => StatusCode::CardNotPlayable,
            Self::CardNotUpdatable => StatusCode::CardNotUpdatable,
            Self::DrawBlocked => StatusCode::DrawBlocked,
            Self::DeckExhausted => StatusCode::DeckExhausted,
            Self::InvalidCardDeck(_) => StatusCode::InvalidCardDeck,
        }
    }

    /// Renders this rejection as a status notice.
    pub fn to_status(&self) -> Status {
        Status::error(self.code(), self.to_string())
    }
}

/// Failures of a [`RoomStore`](crate::RoomStore). Logged, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored document is invalid: {0}")]
    Serde(#[from] serde_json::Error),
}
