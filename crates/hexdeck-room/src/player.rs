//! Players and their permission bits.

use std::time::Duration;

use hexdeck_deck::Card;
use hexdeck_protocol::{ConnectionId, PlayerId};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// A player's permission bit-field. Bit 0 is the host bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub u32);

impl Permissions {
    pub const HOST: u32 = 0;

    pub fn has(self, bit: u32) -> bool {
        self.0 & (1 << bit) != 0
    }

    pub fn set(&mut self, bit: u32) {
        self.0 |= 1 << bit;
    }

    pub fn clear(&mut self, bit: u32) {
        self.0 &= !(1 << bit);
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One seat in a room.
///
/// The connection handle and the inactivity countdown are runtime-only and
/// are not persisted; a reloaded player starts disconnected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub session_token: String,
    pub username: String,
    pub permissions: Permissions,
    pub cards: Vec<Card>,
    #[serde(skip)]
    pub connection: Option<ConnectionId>,
    #[serde(skip)]
    pub inactivity: Duration,
}

impl Player {
    /// A fresh, disconnected player with a full inactivity countdown.
    pub fn new(username: impl Into<String>, inactivity_timeout: Duration) -> Self {
        Self {
            id: PlayerId::random(),
            session_token: generate_session_token(),
            username: username.into(),
            permissions: Permissions::default(),
            cards: Vec::new(),
            connection: None,
            inactivity: inactivity_timeout,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_host(&self) -> bool {
        self.permissions.has(Permissions::HOST)
    }

    pub fn reset_inactivity(&mut self, timeout: Duration) {
        self.inactivity = timeout;
    }
}

/// A fresh random (v4) UUID in its hyphenated form.
pub fn generate_session_token() -> String {
    Uuid::new_v4().to_string()
}

const ADJECTIVES: &[&str] = &[
    "amused", "brave", "calm", "clever", "cosmic", "curious", "daring", "eager", "fancy", "gentle",
    "happy", "humble", "jolly", "keen", "lively", "lucky", "merry", "mighty", "nimble", "polite",
    "quick", "quiet", "rapid", "sharp", "shiny", "smooth", "sunny", "swift", "tidy", "witty",
];

const ANIMALS: &[&str] = &[
    "badger", "beaver", "bison", "condor", "coyote", "dingo", "dolphin", "falcon", "ferret",
    "gecko", "heron", "ibex", "jackal", "koala", "lemur", "lynx", "marmot", "moose", "newt",
    "ocelot", "otter", "panda", "puffin", "quokka", "raven", "salmon", "tapir", "walrus", "wombat",
    "yak",
];

/// A two-word "adjective animal" name for players who did not pick one.
pub fn placeholder_username<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("nameless");
    let animal = ANIMALS.choose(rng).copied().unwrap_or("player");
    format!("{adjective} {animal}")
}
