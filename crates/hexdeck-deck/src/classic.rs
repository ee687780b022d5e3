//! The Classic rules: a finite 108-card deck with a rotating turn pointer.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{
    Card, CardDeck, CardUpdate, ClassicCard, ClassicColor, ClassicSymbol, DrawError, Seats,
};

/// Classic deck state.
///
/// Cards are dealt from `cards_remaining` and played onto `cards_played`.
/// Together with the hands they always add up to [`Classic::DECK_SIZE`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classic {
    cards_played: Vec<ClassicCard>,
    cards_remaining: Vec<ClassicCard>,
    direction_reversed: bool,
    active_player: usize,
    chosen_color: Option<ClassicColor>,
}

impl Classic {
    pub const DECK_SIZE: usize = 108;
    pub const INITIAL_HAND: usize = 7;

    pub fn new() -> Self {
        Self::default()
    }

    /// The unshuffled 108-card composition.
    ///
    /// Per color: `1..=9, 0, 1..=9`, two each of skip, reverse and draw-2,
    /// then one colorless wildcard and one colorless draw-4.
    pub fn full_deck() -> Vec<ClassicCard> {
        let mut cards = Vec::with_capacity(Self::DECK_SIZE);
        for color in ClassicColor::CHOOSABLE {
            for rank in 0..19u8 {
                cards.push(ClassicCard::new(color, ClassicSymbol::Number((rank + 1) % 10)));
            }
            for _ in 0..2 {
                cards.push(ClassicCard::new(color, ClassicSymbol::Skip));
                cards.push(ClassicCard::new(color, ClassicSymbol::Reverse));
                cards.push(ClassicCard::new(color, ClassicSymbol::DrawTwo));
            }
            cards.push(ClassicCard::new(ClassicColor::Black, ClassicSymbol::Wildcard));
            cards.push(ClassicCard::new(ClassicColor::Black, ClassicSymbol::DrawFour));
        }
        cards
    }

    /// Cards still in the draw pile.
    pub fn remaining(&self) -> usize {
        self.cards_remaining.len()
    }

    /// Cards on the discard pile.
    pub fn played(&self) -> usize {
        self.cards_played.len()
    }

    pub fn is_reversed(&self) -> bool {
        self.direction_reversed
    }

    /// Returns `true` while the top card is a wildcard without a color.
    pub fn awaiting_color(&self) -> bool {
        self.cards_played
            .last()
            .is_some_and(|top| top.color.is_wild() && self.chosen_color.is_none())
    }

    fn effective_top(&self) -> Option<ClassicCard> {
        let mut top = *self.cards_played.last()?;
        if top.color.is_wild() {
            if let Some(color) = self.chosen_color {
                top.color = color;
            }
        }
        Some(top)
    }

    fn current_seat(&self, seat_count: usize) -> Option<usize> {
        (seat_count > 0).then(|| self.active_player % seat_count)
    }

    fn next_seat(&self, seat_count: usize) -> Option<usize> {
        let current = self.current_seat(seat_count)?;
        Some(if self.direction_reversed {
            (current + seat_count - 1) % seat_count
        } else {
            (current + 1) % seat_count
        })
    }

    fn advance(&mut self, seat_count: usize) {
        if let Some(next) = self.next_seat(seat_count) {
            self.active_player = next;
        }
    }

    /// Shuffles the discard pile, minus its top card, back into the draw
    /// pile. Returns `false` if there was nothing to recycle.
    fn recycle_discards(&mut self) -> bool {
        if self.cards_played.len() < 2 {
            return false;
        }
        let top = self.cards_played.pop();
        self.cards_remaining.append(&mut self.cards_played);
        self.cards_remaining.shuffle(&mut rand::rng());
        self.cards_played.extend(top);
        tracing::debug!(
            recycled = self.cards_remaining.len(),
            "classic draw pile refilled from discards"
        );
        true
    }

    /// Moves one card from the draw pile into `seat`'s hand.
    fn deal_to(&mut self, seat: usize, seats: &mut dyn Seats) -> Option<ClassicCard> {
        if self.cards_remaining.is_empty() && !self.recycle_discards() {
            return None;
        }
        let hand = seats.hand_mut(seat)?;
        let card = self.cards_remaining.pop()?;
        hand.push(Card::Classic(card));
        Some(card)
    }
}

impl CardDeck for Classic {
    fn init(&mut self, seats: &mut dyn Seats) {
        let mut cards = Self::full_deck();
        cards.shuffle(&mut rand::rng());
        *self = Self {
            cards_remaining: cards,
            ..Self::default()
        };

        for seat in 0..seats.seat_count() {
            for _ in 0..Self::INITIAL_HAND {
                if self.deal_to(seat, seats).is_none() {
                    break;
                }
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.cards_remaining.is_empty()
    }

    fn draw_card(&mut self, seats: &mut dyn Seats) -> Result<Card, DrawError> {
        let n = seats.seat_count();
        let seat = self.current_seat(n).ok_or(DrawError::NoSeats)?;
        if self.awaiting_color() {
            return Err(DrawError::Blocked);
        }

        let dealt = self.deal_to(seat, seats);
        self.advance(n);
        dealt.map(Card::Classic).ok_or(DrawError::Exhausted)
    }

    fn can_play(&self, card: &Card) -> bool {
        let Card::Classic(card) = card else {
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
        if n == 0 || !self.can_play(&card) {
            return false;
        }
        let Card::Classic(card) = card else {
            return false;
        };

        self.cards_played.push(card);
        self.chosen_color = None;

        match card.symbol {
            ClassicSymbol::Skip => self.advance(n),
            ClassicSymbol::DrawTwo | ClassicSymbol::DrawFour => {
                let amount = if card.symbol == ClassicSymbol::DrawTwo { 2 } else { 4 };
                if let Some(target) = self.next_seat(n) {
                    for _ in 0..amount {
                        if self.deal_to(target, seats).is_none() {
                            break;
                        }
                    }
                }
            }
            ClassicSymbol::Reverse => self.direction_reversed = !self.direction_reversed,
            ClassicSymbol::Number(_) | ClassicSymbol::Wildcard => {}
        }

        if !card.color.is_wild() {
            self.advance(n);
        }
        true
    }

    fn top_card(&self) -> Option<Card> {
        self.effective_top().map(Card::Classic)
    }

    fn update_played_card(&mut self, update: &CardUpdate, seats: &dyn Seats) -> Option<Card> {
        let CardUpdate::Classic { color } = *update else {
            return None;
        };
        if color.is_wild() || !self.awaiting_color() {
            return None;
        }
        self.chosen_color = Some(color);
        self.advance(seats.seat_count());
        self.top_card()
    }

    fn active_seat(&self, seats: &dyn Seats) -> Option<usize> {
        self.current_seat(seats.seat_count())
    }
}
