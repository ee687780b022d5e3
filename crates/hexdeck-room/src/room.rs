//! A room and the state guarded by its lock.

use hexdeck_deck::{Card, CardDeck, Deck, DeckKind, Seats};
use hexdeck_protocol::{PlayerId, RoomId};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::events::{OwnCard, PlayerInfo, PlayerState, RoomInfo};
use crate::{GameState, Permissions, Player};

// ---------------------------------------------------------------------------
// RoomData
// ---------------------------------------------------------------------------

/// Everything mutable about a room. Also the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomData {
    pub room_id: RoomId,
    pub join_code: String,
    pub game_state: GameState,
    pub card_deck: DeckKind,
    /// Present from the start of the game onward.
    pub deck: Option<Deck>,
    pub players: Vec<Player>,
    pub winner: Option<PlayerId>,
}

impl RoomData {
    pub fn new(room_id: RoomId, join_code: String, card_deck: DeckKind) -> Self {
        Self {
            room_id,
            join_code,
            game_state: GameState::Lobby,
            card_deck,
            deck: None,
            players: Vec::new(),
            winner: None,
        }
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn player_by_token(&self, session_token: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.session_token == session_token)
    }

    pub fn is_username_available(&self, username: &str) -> bool {
        self.players.iter().all(|p| p.username != username)
    }

    /// Removes a player. If nobody holds the host bit afterward, the first
    /// remaining player becomes host.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<Player> {
        let seat = self.seat_of(player_id)?;
        let removed = self.players.remove(seat);
        self.ensure_host();
        Some(removed)
    }

    /// Makes sure exactly one player holds the host bit when anyone is seated.
    pub fn ensure_host(&mut self) {
        let mut seen_host = false;
        for player in &mut self.players {
            if player.is_host() {
                if seen_host {
                    player.permissions.clear(Permissions::HOST);
                }
                seen_host = true;
            }
        }
        if !seen_host {
            if let Some(first) = self.players.first_mut() {
                first.permissions.set(Permissions::HOST);
            }
        }
    }

    /// Returns `true` if `player_id` holds the turn.
    pub fn is_active(&self, player_id: PlayerId) -> bool {
        match (&self.deck, self.seat_of(player_id)) {
            (Some(deck), Some(seat)) => {
                deck.is_player_active(seat, &SeatCount(self.players.len()))
            }
            _ => false,
        }
    }

    pub fn top_card(&self) -> Option<Card> {
        self.deck.as_ref().and_then(|deck| deck.top_card())
    }

    // -- Views --

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            join_code: self.join_code.clone(),
            game_state: self.game_state,
            card_deck: self.card_deck,
            top_card: self.top_card(),
            winner: self.winner,
            players: self
                .players
                .iter()
                .map(|p| PlayerInfo {
                    player_id: p.id,
                    username: p.username.clone(),
                    permissions: p.permissions,
                    is_connected: p.is_connected(),
                })
                .collect(),
        }
    }

    /// The hand of `player`, each card flagged with whether it is legal now.
    pub fn own_cards(&self, player: &Player) -> Vec<OwnCard> {
        player
            .cards
            .iter()
            .map(|&card| OwnCard {
                card,
                can_play: self.deck.as_ref().is_some_and(|d| d.can_play(&card)),
            })
            .collect()
    }

    pub fn player_state(&self, player: &Player) -> PlayerState {
        PlayerState {
            player_id: player.id,
            num_cards: player.cards.len(),
            active: self.is_active(player.id),
        }
    }
}

// ---------------------------------------------------------------------------
// Seats adapters
// ---------------------------------------------------------------------------

/// The room's hands, as seen by the deck.
pub(crate) struct Hands<'a>(pub(crate) &'a mut [Player]);

impl Seats for Hands<'_> {
    fn seat_count(&self) -> usize {
        self.0.len()
    }

    fn hand_mut(&mut self, seat: usize) -> Option<&mut Vec<Card>> {
        self.0.get_mut(seat).map(|p| &mut p.cards)
    }

    fn swap_hands(&mut self, a: usize, b: usize) {
        if a == b || a >= self.0.len() || b >= self.0.len() {
            return;
        }
        let (low, high) = (a.min(b), a.max(b));
        let (head, tail) = self.0.split_at_mut(high);
        std::mem::swap(&mut head[low].cards, &mut tail[0].cards);
    }
}

/// A table of `n` seats whose hands are not visible. Enough for turn
/// queries.
pub(crate) struct SeatCount(pub(crate) usize);

impl Seats for SeatCount {
    fn seat_count(&self) -> usize {
        self.0
    }

    fn hand_mut(&mut self, _seat: usize) -> Option<&mut Vec<Card>> {
        None
    }

    fn swap_hands(&mut self, _a: usize, _b: usize) {}
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A live room.
///
/// The id and join code never change and can be read without locking.
/// Everything else sits behind one mutex, so the inactivity sweep and
/// player actions on the same room are serialized.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    join_code: String,
    data: Mutex<RoomData>,
}

impl Room {
    pub fn new(data: RoomData) -> Self {
        Self {
            id: data.room_id,
            join_code: data.join_code.clone(),
            data: Mutex::new(data),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn join_code(&self) -> &str {
        &self.join_code
    }

    pub fn lock(&self) -> MutexGuard<'_, RoomData> {
        self.data.lock()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> RoomData {
        self.data.lock().clone()
    }
}
