//! The process-wide set of live rooms.

use std::collections::HashMap;
use std::sync::Arc;

use hexdeck_protocol::{PlayerId, RoomId};
use rand::Rng;

use crate::{Room, RoomConfig, RoomData};

/// Live rooms, indexed by id and by join code.
///
/// The registry itself is not synchronized; the orchestrator keeps it
/// behind one mutex. Callers that also need a room's lock take the
/// registry lock first.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Arc<Room>>,
    codes: HashMap<String, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty lobby with a fresh id and a join code no live room
    /// uses.
    ///
    /// A code that collides is re-rolled up to `join_code_attempts` times
    /// before the code grows by one digit.
    pub fn create(&mut self, config: &RoomConfig) -> Arc<Room> {
        let mut rng = rand::rng();

        let mut room_id = RoomId::random();
        while self.rooms.contains_key(&room_id) {
            room_id = RoomId::random();
        }

        let mut len = config.join_code_len.max(1);
        let join_code = 'outer: loop {
            for _ in 0..config.join_code_attempts.max(1) {
                let code = generate_join_code(&mut rng, len);
                if !self.codes.contains_key(&code) {
                    break 'outer code;
                }
            }
            tracing::warn!(len, "join code space crowded, lengthening codes");
            len += 1;
        };

        self.insert(RoomData::new(room_id, join_code, config.default_deck))
    }

    /// Adds an existing room, e.g. one restored from storage.
    pub fn insert(&mut self, data: RoomData) -> Arc<Room> {
        let room = Arc::new(Room::new(data));
        if let Some(previous) = self.codes.insert(room.join_code().to_owned(), room.id()) {
            tracing::warn!(
                join_code = room.join_code(),
                room_id = %room.id(),
                previous = %previous,
                "join code already in use, newest room wins"
            );
        }
        self.rooms.insert(room.id(), Arc::clone(&room));
        room
    }

    pub fn get(&self, room_id: RoomId) -> Option<Arc<Room>> {
        self.rooms.get(&room_id).cloned()
    }

    pub fn by_join_code(&self, join_code: &str) -> Option<Arc<Room>> {
        self.codes.get(join_code).and_then(|id| self.get(*id))
    }

    /// Finds the room and player holding `session_token`.
    ///
    /// Locks each room in turn.
    pub fn find_session(&self, session_token: &str) -> Option<(Arc<Room>, PlayerId)> {
        self.rooms.values().find_map(|room| {
            let player = room.lock().player_by_token(session_token).map(|p| p.id)?;
            Some((Arc::clone(room), player))
        })
    }

    pub fn remove(&mut self, room_id: RoomId) -> Option<Arc<Room>> {
        let room = self.rooms.remove(&room_id)?;
        if self.codes.get(room.join_code()) == Some(&room_id) {
            self.codes.remove(room.join_code());
        }
        Some(room)
    }

    /// Every live room, in no particular order.
    pub fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// `len` random decimal digits. Leading zeros are kept.
pub fn generate_join_code<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Player;

    #[test]
    fn test_generate_join_code_is_decimal() {
        let code = generate_join_code(&mut rand::rng(), 6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_create_registers_room() {
        let mut registry = RoomRegistry::new();
        let room = registry.create(&RoomConfig::default());

        assert_eq!(registry.len(), 1);
        assert_eq!(room.join_code().len(), 6);
        assert_eq!(registry.get(room.id()).unwrap().id(), room.id());
        assert_eq!(registry.by_join_code(room.join_code()).unwrap().id(), room.id());
        assert!(room.lock().game_state.is_joinable());
    }

    #[test]
    fn test_create_never_reuses_live_code() {
        let config = RoomConfig {
            join_code_len: 1,
            join_code_attempts: 4,
            ..RoomConfig::default()
        };
        let mut registry = RoomRegistry::new();
        let mut codes = std::collections::HashSet::new();
        for _ in 0..30 {
            let room = registry.create(&config);
            assert!(codes.insert(room.join_code().to_owned()));
        }
        assert_eq!(registry.len(), 30);
    }

    #[test]
    fn test_find_session() {
        let mut registry = RoomRegistry::new();
        let room = registry.create(&RoomConfig::default());
        let player = Player::new("Ann", Duration::from_secs(20));
        let (id, token) = (player.id, player.session_token.clone());
        room.lock().players.push(player);

        let (found_room, found_player) = registry.find_session(&token).unwrap();
        assert_eq!(found_room.id(), room.id());
        assert_eq!(found_player, id);
        assert!(registry.find_session("not-a-token").is_none());
    }

    #[test]
    fn test_remove_frees_code() {
        let mut registry = RoomRegistry::new();
        let room = registry.create(&RoomConfig::default());
        let code = room.join_code().to_owned();

        assert!(registry.remove(room.id()).is_some());
        assert!(registry.by_join_code(&code).is_none());
        assert!(registry.remove(room.id()).is_none());
        assert!(registry.is_empty());
    }
}
