//! The deck's view of the players sitting at a table.

use crate::Card;

/// Ordered player hands, indexed by seat.
///
/// A deck never owns its players. The room hands one of these to every
/// deck operation, so the seat count the deck sees is always the room's
/// current one.
pub trait Seats {
    /// Number of occupied seats.
    fn seat_count(&self) -> usize;

    /// The hand at `seat`, or `None` if the seat does not exist.
    fn hand_mut(&mut self, seat: usize) -> Option<&mut Vec<Card>>;

    /// Exchanges two hands. Out-of-range seats are ignored.
    fn swap_hands(&mut self, a: usize, b: usize);
}

impl Seats for Vec<Vec<Card>> {
    fn seat_count(&self) -> usize {
        self.len()
    }

    fn hand_mut(&mut self, seat: usize) -> Option<&mut Vec<Card>> {
        self.get_mut(seat)
    }

    fn swap_hands(&mut self, a: usize, b: usize) {
        if a < self.len() && b < self.len() {
            self.swap(a, b);
        }
    }
}
