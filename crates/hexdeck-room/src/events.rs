//! Game events exchanged with clients.
//!
//! [`ClientEvent`] is what a seated player may ask for; [`ServerEvent`] is
//! what the room pushes back. Both ride inside the `Game` arm of the
//! protocol envelope.

use hexdeck_deck::{Card, CardUpdate, DeckKind};
use hexdeck_protocol::{PlayerId, RoomId, Status};
use serde::{Deserialize, Serialize};

use crate::{GameState, Permissions};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// An action requested by a seated player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Rename a player or change their permissions. Players may rename
    /// themselves; everything else needs the host.
    UpdatePlayer {
        player_id: PlayerId,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        permissions: Option<Permissions>,
    },

    KickPlayer {
        player_id: PlayerId,
    },

    /// Pick the deck variant by numeric id while in the lobby.
    SetCardDeck {
        card_deck_id: u8,
    },

    StartGame,

    DrawCard,

    /// Play the card at `card_index` of the actor's hand. A wildcard may
    /// carry its color choice inline.
    PlayCard {
        #[serde(default)]
        card_index: Option<usize>,
        #[serde(default)]
        card_update: Option<CardUpdate>,
    },

    UpdatePlayedCard {
        card_update: CardUpdate,
    },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Public summary of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    pub username: String,
    pub permissions: Permissions,
    pub is_connected: bool,
}

/// Full description of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub join_code: String,
    pub game_state: GameState,
    pub card_deck: DeckKind,
    pub top_card: Option<Card>,
    pub winner: Option<PlayerId>,
    pub players: Vec<PlayerInfo>,
}

/// One card of the receiver's own hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnCard {
    pub card: Card,
    pub can_play: bool,
}

/// What everybody may know about a player's hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub player_id: PlayerId,
    pub num_cards: usize,
    pub active: bool,
}

/// An update pushed to one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    RoomInfo(RoomInfo),

    /// The receiver's hand. Only ever sent to its owner.
    OwnCards { cards: Vec<OwnCard> },

    PlayerState(PlayerState),

    CardPlayed {
        card: Card,
        card_index: usize,
        played_by: PlayerId,
    },

    PlayedCardUpdate { updated_by: PlayerId, card: Card },

    /// A notice such as "you were kicked".
    Status(Status),
}

#[cfg(test)]
mod tests {
    use hexdeck_deck::{HexColor, HexSymbol};

    use super::*;

    #[test]
    fn test_play_card_parses_with_inline_update() {
        let raw = r#"{"type":"PlayCard","card_index":2,"card_update":{"deck":"hex_v1","color":"blue"}}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::PlayCard {
                card_index: Some(2),
                card_update: Some(CardUpdate::HexV1 {
                    color: HexColor::Blue
                }),
            }
        );
    }

    #[test]
    fn test_play_card_without_index_parses() {
        let event: ClientEvent = serde_json::from_str(r#"{"type":"PlayCard"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::PlayCard {
                card_index: None,
                card_update: None
            }
        );
    }

    #[test]
    fn test_update_player_optional_fields() {
        let raw = r#"{"type":"UpdatePlayer","player_id":7,"username":"Zed"}"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::UpdatePlayer {
                player_id: PlayerId(7),
                username: Some("Zed".into()),
                permissions: None,
            }
        );
    }

    #[test]
    fn test_unknown_client_event_is_rejected() {
        let result: Result<ClientEvent, _> = serde_json::from_str(r#"{"type":"Cheat"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_card_played_shape() {
        let event = ServerEvent::CardPlayed {
            card: Card::HexV1(hexdeck_deck::HexCard::action(HexColor::Green, HexSymbol::Swap)),
            card_index: 0,
            played_by: PlayerId(3),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CardPlayed");
        assert_eq!(json["card"]["deck"], "hex_v1");
        assert_eq!(json["played_by"], 3);
    }
}
