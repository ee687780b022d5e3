//! The HexV1 rules: an endless supply of hex-digit and action cards, with
//! a turn order that the `shuffle` action can permute.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{Card, CardDeck, CardUpdate, DrawError, HexCard, HexColor, HexSymbol, Seats};

/// HexV1 deck state.
///
/// Cards are generated when drawn, so only the discard pile is kept.
/// `player_order` is a permutation of seat indices; `active_index` points
/// into it, not at a seat directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HexV1 {
    cards_played: Vec<HexCard>,
    player_order: Vec<usize>,
    active_index: usize,
    chosen_color: Option<HexColor>,
}

impl HexV1 {
    pub const INITIAL_HAND: usize = 8;

    /// Chance that an action card comes out rainbow.
    const RAINBOW_CHANCE: f64 = 0.1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Generates one random card.
    ///
    /// A roll in `0..20` picks the card: `0..16` is the hex digit of the
    /// same value, `16..20` one of the four actions.
    pub fn generate_card<R: Rng>(rng: &mut R) -> HexCard {
        let roll: u8 = rng.random_range(0..20);
        let color = HexColor::CHOOSABLE[rng.random_range(0..HexColor::CHOOSABLE.len())];
        if roll < 16 {
            return HexCard::number(color, roll);
        }

        let action = HexSymbol::ACTIONS[usize::from(roll - 16)];
        let color = if rng.random_bool(Self::RAINBOW_CHANCE) {
            HexColor::Rainbow
        } else {
            color
        };
        HexCard::action(color, action)
    }

    /// The turn order as seat indices.
    pub fn player_order(&self) -> &[usize] {
        &self.player_order
    }

    pub fn played(&self) -> usize {
        self.cards_played.len()
    }

    /// Returns `true` while the top card is rainbow without a color.
    pub fn awaiting_color(&self) -> bool {
        self.cards_played
            .last()
            .is_some_and(|top| top.color.is_wild() && self.chosen_color.is_none())
    }

    fn effective_top(&self) -> Option<HexCard> {
        let mut top = *self.cards_played.last()?;
        if top.color.is_wild() {
            if let Some(color) = self.chosen_color {
                top.color = color;
            }
        }
        Some(top)
    }

    /// First position at or after `index` (wrapping) whose entry is a seat
    /// that still exists.
    fn next_valid_index(&self, index: usize, seat_count: usize) -> Option<usize> {
        let len = self.player_order.len();
        if len == 0 || seat_count == 0 {
            return None;
        }
        (0..len)
            .map(|step| (index + step) % len)
            .find(|&i| self.player_order[i] < seat_count)
    }

    fn seat_at(&self, index: usize, seat_count: usize) -> Option<usize> {
        self.next_valid_index(index, seat_count)
            .map(|i| self.player_order[i])
    }

    fn next_index(&self, seat_count: usize) -> Option<usize> {
        let current = self.next_valid_index(self.active_index, seat_count)?;
        self.next_valid_index(current + 1, seat_count)
    }

    fn advance(&mut self, seat_count: usize) {
        if let Some(next) = self.next_index(seat_count) {
            self.active_index = next;
        }
    }

    fn deal_to(seat: usize, seats: &mut dyn Seats, amount: usize) {
        let Some(hand) = seats.hand_mut(seat) else {
            return;
        };
        let mut rng = rand::rng();
        hand.extend((0..amount).map(|_| Card::HexV1(Self::generate_card(&mut rng))));
    }
}

impl CardDeck for HexV1 {
    fn init(&mut self, seats: &mut dyn Seats) {
        let n = seats.seat_count();
        *self = Self {
            player_order: (0..n).collect(),
            ..Self::default()
        };
        for seat in 0..n {
            Self::deal_to(seat, seats, Self::INITIAL_HAND);
        }
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn draw_card(&mut self, seats: &mut dyn Seats) -> Result<Card, DrawError> {
        let n = seats.seat_count();
        let seat = self.seat_at(self.active_index, n).ok_or(DrawError::NoSeats)?;
        if self.awaiting_color() {
            return Err(DrawError::Blocked);
        }

        let card = Card::HexV1(Self::generate_card(&mut rand::rng()));
        let hand = seats.hand_mut(seat).ok_or(DrawError::NoSeats)?;
        hand.push(card);
        self.advance(n);
        Ok(card)
    }

    fn can_play(&self, card: &Card) -> bool {
        let Card::HexV1(card) = card else {
            return false;
        };
        if self.awaiting_color() {
            return false;
        }
        match self.effective_top() {
            None => true,
            Some(top) => {
                card.color.is_wild() || card.color == top.color || card.symbol == top.symbol
            }
        }
    }

    fn play_card(&mut self, card: Card, seats: &mut dyn Seats) -> bool {
        let n = seats.seat_count();
        if !self.can_play(&card) {
            return false;
        }
        let Card::HexV1(card) = card else {
            return false;
        };
        let (Some(actor), Some(next)) = (
            self.seat_at(self.active_index, n),
            self.next_index(n).map(|i| self.player_order[i]),
        ) else {
            return false;
        };

        match card.symbol {
            HexSymbol::Skip if !card.color.is_wild() => self.advance(n),
            HexSymbol::Draw => {
                let amount = self
                    .cards_played
                    .last()
                    .map_or(HexCard::ACTION_VALUE, |top| top.numeric_value);
                Self::deal_to(next, seats, usize::from(amount));
            }
            HexSymbol::Shuffle => {
                self.player_order.shuffle(&mut rand::rng());
                tracing::debug!(order = ?self.player_order, "turn order shuffled");
            }
            HexSymbol::Swap => seats.swap_hands(actor, next),
            HexSymbol::Skip | HexSymbol::Number(_) => {}
        }

        if !card.color.is_wild() {
            self.advance(n);
        }
        self.cards_played.push(card);
        self.chosen_color = None;
        true
    }

    fn top_card(&self) -> Option<Card> {
        self.effective_top().map(Card::HexV1)
    }

    fn update_played_card(&mut self, update: &CardUpdate, seats: &dyn Seats) -> Option<Card> {
        let CardUpdate::HexV1 { color } = *update else {
            return None;
        };
        if color.is_wild() || !self.awaiting_color() {
            return None;
        }
        let n = seats.seat_count();
        self.chosen_color = Some(color);
        self.advance(n);
        if self.cards_played.last().map(|top| top.symbol) == Some(HexSymbol::Skip) {
            self.advance(n);
        }
        self.top_card()
    }

    fn active_seat(&self, seats: &dyn Seats) -> Option<usize> {
        self.seat_at(self.active_index, seats.seat_count())
    }
}
