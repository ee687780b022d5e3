//! The deck contract and its closed dispatch enum.

use serde::{Deserialize, Serialize};

use crate::{Card, CardUpdate, Classic, HexV1, Seats};

/// Why a draw dealt no card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    /// The top card is a wildcard still waiting for its color.
    #[error("a wildcard color must be chosen before drawing")]
    Blocked,

    /// No card was left to deal. The turn has still advanced.
    #[error("the deck is exhausted")]
    Exhausted,

    /// The table has no seats.
    #[error("no players are seated")]
    NoSeats,
}

/// The rules of one card game variant.
///
/// A deck owns its piles and its turn tracking. Hands belong to the
/// players and are reached through [`Seats`], so every operation resolves
/// the active seat against the room as it is right now.
pub trait CardDeck {
    /// Deals the opening hands and resets turn tracking to seat 0.
    fn init(&mut self, seats: &mut dyn Seats);

    /// Returns `true` if no further card can be dealt.
    fn is_empty(&self) -> bool;

    /// Deals one card to the active seat and advances the turn.
    ///
    /// # Errors
    /// [`DrawError::Blocked`] while a wildcard color is pending (the turn
    /// does not move). [`DrawError::Exhausted`] when nothing could be dealt
    /// (the turn still moves).
    fn draw_card(&mut self, seats: &mut dyn Seats) -> Result<Card, DrawError>;

    /// Returns `true` if `card` may be played on the current discard pile.
    fn can_play(&self, card: &Card) -> bool;

    /// Puts `card` on the discard pile and resolves its effect.
    ///
    /// The caller has already removed `card` from the actor's hand.
    /// Returns `false`, touching nothing, if the card is not playable.
    fn play_card(&mut self, card: Card, seats: &mut dyn Seats) -> bool;

    /// The top of the discard pile, with any chosen wildcard color applied.
    fn top_card(&self) -> Option<Card>;

    /// Resolves a pending wildcard and advances the turn.
    ///
    /// Returns the updated top card, or `None` if no wildcard is pending or
    /// the update does not name a valid color of this variant.
    fn update_played_card(&mut self, update: &CardUpdate, seats: &dyn Seats) -> Option<Card>;

    /// The seat whose turn it is, or `None` for an empty table.
    fn active_seat(&self, seats: &dyn Seats) -> Option<usize>;

    /// Returns `true` if `seat` holds the turn.
    fn is_player_active(&self, seat: usize, seats: &dyn Seats) -> bool {
        self.active_seat(seats) == Some(seat)
    }
}

/// Selects which rules a room plays by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckKind {
    Classic,
    #[default]
    HexV1,
}

impl DeckKind {
    /// Looks a variant up by its numeric id (`0` Classic, `1` HexV1).
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Classic),
            1 => Some(Self::HexV1),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Self::Classic => 0,
            Self::HexV1 => 1,
        }
    }
}

/// A live deck of either variant.
///
/// Stored with a `kind` tag so a reloaded room gets its engine back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deck {
    Classic(Classic),
    HexV1(HexV1),
}

impl Deck {
    /// A fresh, undealt deck of the given kind.
    pub fn new(kind: DeckKind) -> Self {
        match kind {
            DeckKind::Classic => Self::Classic(Classic::new()),
            DeckKind::HexV1 => Self::HexV1(HexV1::new()),
        }
    }

    pub fn kind(&self) -> DeckKind {
        match self {
            Self::Classic(_) => DeckKind::Classic,
            Self::HexV1(_) => DeckKind::HexV1,
        }
    }

    fn inner(&self) -> &dyn CardDeck {
        match self {
            Self::Classic(d) => d,
            Self::HexV1(d) => d,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn CardDeck {
        match self {
            Self::Classic(d) => d,
            Self::HexV1(d) => d,
        }
    }
}

impl CardDeck for Deck {
    fn init(&mut self, seats: &mut dyn Seats) {
        self.inner_mut().init(seats)
    }

    fn is_empty(&self) -> bool {
        self.inner().is_empty()
    }

    fn draw_card(&mut self, seats: &mut dyn Seats) -> Result<Card, DrawError> {
        self.inner_mut().draw_card(seats)
    }

    fn can_play(&self, card: &Card) -> bool {
        self.inner().can_play(card)
    }

    fn play_card(&mut self, card: Card, seats: &mut dyn Seats) -> bool {
        self.inner_mut().play_card(card, seats)
    }

    fn top_card(&self) -> Option<Card> {
        self.inner().top_card()
    }

    fn update_played_card(&mut self, update: &CardUpdate, seats: &dyn Seats) -> Option<Card> {
        self.inner_mut().update_played_card(update, seats)
    }

    fn active_seat(&self, seats: &dyn Seats) -> Option<usize> {
        self.inner().active_seat(seats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_kind_ids() {
        assert_eq!(DeckKind::from_id(0), Some(DeckKind::Classic));
        assert_eq!(DeckKind::from_id(1), Some(DeckKind::HexV1));
        assert_eq!(DeckKind::from_id(2), None);
        assert_eq!(DeckKind::HexV1.id(), 1);
        assert_eq!(DeckKind::default(), DeckKind::HexV1);
    }

    #[test]
    fn test_deck_round_trips_through_storage_with_kind() {
        let mut seats: Vec<Vec<Card>> = vec![Vec::new(); 2];
        let mut deck = Deck::new(DeckKind::Classic);
        deck.init(&mut seats);
        let _ = deck.draw_card(&mut seats);

        let json = serde_json::to_value(&deck).unwrap();
        assert_eq!(json["kind"], "classic");

        let restored: Deck = serde_json::from_value(json).unwrap();
        assert_eq!(restored.kind(), DeckKind::Classic);
        assert_eq!(restored, deck);
        assert_eq!(restored.active_seat(&seats), Some(1));
    }

    #[test]
    fn test_deck_dispatches_to_variant() {
        let mut seats: Vec<Vec<Card>> = vec![Vec::new(); 3];
        let mut deck = Deck::new(DeckKind::HexV1);
        deck.init(&mut seats);
        assert!(seats.iter().all(|hand| hand.len() == HexV1::INITIAL_HAND));
        assert!(!deck.is_empty());
        assert!(deck.is_player_active(0, &seats));
        assert!(!deck.is_player_active(1, &seats));
    }

    #[test]
    fn test_deck_rejects_card_from_other_variant() {
        let deck = Deck::new(DeckKind::HexV1);
        let classic = Card::Classic(crate::ClassicCard::new(
            crate::ClassicColor::Black,
            crate::ClassicSymbol::Wildcard,
        ));
        assert!(!deck.can_play(&classic));
    }
}
