//! Room configuration and the per-room game state machine.

use std::time::Duration;

use hexdeck_deck::DeckKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room on a server.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long a disconnected player keeps their seat.
    pub inactivity_timeout: Duration,

    /// Number of decimal digits in a join code.
    pub join_code_len: usize,

    /// How many times to re-roll a join code that collides with a live room.
    pub join_code_attempts: usize,

    /// Deck a new room starts with; the host may change it in the lobby.
    pub default_deck: DeckKind,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(20),
            join_code_len: 6,
            join_code_attempts: 32,
            default_deck: DeckKind::HexV1,
        }
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Lifecycle of a room.
///
/// ```text
/// Lobby → Running → Ended
/// ```
///
/// `Ended` is terminal. A room whose last player leaves goes to `Ended`
/// from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Lobby,
    Running,
    Ended,
}

impl GameState {
    /// Returns `true` if new players may join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Running => write!(f, "Running"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_state_predicates() {
        assert!(GameState::Lobby.is_joinable());
        assert!(!GameState::Running.is_joinable());
        assert!(GameState::Running.is_running());
        assert!(GameState::Ended.is_ended());
        assert!(!GameState::Ended.is_joinable());
    }

    #[test]
    fn test_game_state_serializes_snake_case() {
        let json = serde_json::to_string(&GameState::Running).unwrap();
        assert_eq!(json, "\"running\"");
        assert_eq!(GameState::Ended.to_string(), "Ended");
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.inactivity_timeout, Duration::from_millis(20_000));
        assert_eq!(config.join_code_len, 6);
        assert_eq!(config.default_deck, DeckKind::HexV1);
    }
}
