//! Card deck rule engines for HexDeck.
//!
//! A deck decides three things: which card may be played next, what a
//! played card does, and whose turn it is. It never owns the players. Every
//! operation receives the room's hands through the [`Seats`] trait, so the
//! same engine runs against a live room or a plain `Vec<Vec<Card>>` in tests.
//!
//! Two variants implement [`CardDeck`]:
//!
//! - [`Classic`]: a finite 108-card deck, rotating turn pointer, reverse.
//! - [`HexV1`]: endless generated cards, a permutable turn order.
//!
//! [`Deck`] is the closed enum a room actually stores.

mod card;
mod classic;
mod deck;
mod hexv1;
mod seats;

pub use card::{
    Card, CardUpdate, ClassicCard, ClassicColor, ClassicSymbol, HexCard, HexColor, HexSymbol,
};
pub use classic::Classic;
pub use deck::{CardDeck, Deck, DeckKind, DrawError};
pub use hexv1::HexV1;
pub use seats::Seats;
