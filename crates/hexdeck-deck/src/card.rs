//! Card types for every deck variant.
//!
//! Each variant defines its own card shape. [`Card`] wraps them in a closed
//! enum so a player's hand has one concrete type regardless of which rules
//! the room plays by. All cards are small `Copy` values.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Classic
// ---------------------------------------------------------------------------

/// Colors of the Classic deck. `Black` marks a colorless wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassicColor {
    Red,
    Yellow,
    Blue,
    Green,
    Black,
}

impl ClassicColor {
    /// The colors a wildcard may be resolved to.
    pub const CHOOSABLE: [ClassicColor; 4] = [
        ClassicColor::Red,
        ClassicColor::Yellow,
        ClassicColor::Blue,
        ClassicColor::Green,
    ];

    /// Returns `true` for the colorless wildcard color.
    pub fn is_wild(self) -> bool {
        self == ClassicColor::Black
    }
}

/// What is printed on a Classic card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ClassicSymbol {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wildcard,
    DrawFour,
}

impl fmt::Display for ClassicSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Skip => f.write_str("action:skip"),
            Self::Reverse => f.write_str("action:reverse"),
            Self::DrawTwo => f.write_str("action:draw_2"),
            Self::Wildcard => f.write_str("action:wildcard"),
            Self::DrawFour => f.write_str("action:draw_4"),
        }
    }
}

/// A card of the Classic (108-card) deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicCard {
    pub symbol: ClassicSymbol,
    pub color: ClassicColor,
}

impl ClassicCard {
    pub fn new(color: ClassicColor, symbol: ClassicSymbol) -> Self {
        Self { symbol, color }
    }
}

// ---------------------------------------------------------------------------
// HexV1
// ---------------------------------------------------------------------------

/// Colors of the HexV1 deck. `Rainbow` marks a wild action card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HexColor {
    Blue,
    Green,
    Yellow,
    Purple,
    Rainbow,
}

impl HexColor {
    /// The colors a rainbow card may be resolved to.
    pub const CHOOSABLE: [HexColor; 4] = [
        HexColor::Blue,
        HexColor::Green,
        HexColor::Yellow,
        HexColor::Purple,
    ];

    /// Returns `true` for the rainbow (wild) color.
    pub fn is_wild(self) -> bool {
        self == HexColor::Rainbow
    }
}

/// What is printed on a HexV1 card: a hex digit `0..=f` or an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HexSymbol {
    Number(u8),
    Shuffle,
    Skip,
    Draw,
    Swap,
}

impl HexSymbol {
    pub const ACTIONS: [HexSymbol; 4] = [
        HexSymbol::Shuffle,
        HexSymbol::Skip,
        HexSymbol::Draw,
        HexSymbol::Swap,
    ];
}

impl fmt::Display for HexSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n:x}"),
            Self::Shuffle => f.write_str("action:shuffle"),
            Self::Skip => f.write_str("action:skip"),
            Self::Draw => f.write_str("action:draw"),
            Self::Swap => f.write_str("action:swap"),
        }
    }
}

/// A generated HexV1 card.
///
/// `numeric_value` is the digit for number cards and 3 for action cards;
/// a `draw` action makes the next player draw the top card's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCard {
    pub symbol: HexSymbol,
    pub color: HexColor,
    pub numeric_value: u8,
}

impl HexCard {
    /// Value carried by every action card.
    pub const ACTION_VALUE: u8 = 3;

    pub fn number(color: HexColor, value: u8) -> Self {
        Self {
            symbol: HexSymbol::Number(value),
            color,
            numeric_value: value,
        }
    }

    pub fn action(color: HexColor, symbol: HexSymbol) -> Self {
        Self {
            symbol,
            color,
            numeric_value: Self::ACTION_VALUE,
        }
    }
}

// ---------------------------------------------------------------------------
// Card / CardUpdate
// ---------------------------------------------------------------------------

/// A card from any deck variant.
///
/// Tagged by `deck` on the wire and in storage. A card is only ever legal
/// in the deck variant that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "deck", rename_all = "snake_case")]
pub enum Card {
    Classic(ClassicCard),
    HexV1(HexCard),
}

impl Card {
    /// Returns `true` if this card defers the turn until a color is chosen.
    pub fn is_wild(&self) -> bool {
        match self {
            Self::Classic(c) => c.color.is_wild(),
            Self::HexV1(c) => c.color.is_wild(),
        }
    }
}

impl From<ClassicCard> for Card {
    fn from(card: ClassicCard) -> Self {
        Self::Classic(card)
    }
}

impl From<HexCard> for Card {
    fn from(card: HexCard) -> Self {
        Self::HexV1(card)
    }
}

/// The color choice that resolves a pending wildcard.
///
/// One variant per deck so the payload is validated when it is parsed,
/// not inside the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "deck", rename_all = "snake_case")]
pub enum CardUpdate {
    Classic { color: ClassicColor },
    HexV1 { color: HexColor },
}
