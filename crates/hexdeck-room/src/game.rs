//! The game orchestrator.
//!
//! [`Game`] owns the registry and the two collaborators (storage and
//! notification) and is the only thing the transport talks to. Every
//! operation locks at most one room, validates against that room's state,
//! mutates it, and then persists and notifies while still holding the lock,
//! so observers never see a half-applied action.
//!
//! Rejections return a [`RoomError`] and leave the room untouched.

use std::sync::Arc;
use std::time::Duration;

use hexdeck_deck::{CardDeck, CardUpdate, Deck, DeckKind, DrawError};
use hexdeck_protocol::{ConnectionId, PlayerId, RoomId, Status, StatusCode};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::player::placeholder_username;
use crate::room::{Hands, SeatCount};
use crate::{
    ClientEvent, GameState, Notifier, Permissions, Player, Room, RoomConfig, RoomData, RoomError,
    RoomRegistry, RoomStore, ServerEvent,
};

const PLACEHOLDER_ATTEMPTS: usize = 64;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A freshly seated player. The session token is the only way back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRoom {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub username: String,
    pub session_token: String,
    pub join_code: String,
}

/// A socket attached to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connected {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    /// The socket this one took over from, if any. The transport should
    /// close it.
    pub replaced: Option<ConnectionId>,
}

/// What one inactivity sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: Vec<(RoomId, PlayerId)>,
    pub closed: Vec<RoomId>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty() && self.closed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStats {
    pub total_games_played: u64,
    /// Live rooms in any state.
    pub running_games: usize,
    pub online_player_count: usize,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// Rooms, rules and side effects in one place. Share it behind an `Arc`.
pub struct Game {
    config: RoomConfig,
    registry: Mutex<RoomRegistry>,
    store: Arc<dyn RoomStore>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("config", &self.config)
            .field("rooms", &self.registry.lock().len())
            .finish_non_exhaustive()
    }
}

impl Game {
    pub fn new(config: RoomConfig, store: Arc<dyn RoomStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            registry: Mutex::new(RoomRegistry::new()),
            store,
            notifier,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// The live room with this id.
    pub fn room(&self, room_id: RoomId) -> Option<Arc<Room>> {
        self.registry.lock().get(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.registry.lock().len()
    }

    fn live_room(&self, room_id: RoomId) -> Result<Arc<Room>, RoomError> {
        self.room(room_id).ok_or(RoomError::RoomGone(room_id))
    }

    // -- Room entry --

    /// Opens a new lobby and seats its creator as host.
    pub fn create_room(&self, username: &str) -> JoinedRoom {
        let mut registry = self.registry.lock();
        let room = registry.create(&self.config);
        let mut data = room.lock();
        drop(registry);

        let joined = self.seat_player(&mut data, username);
        info!(
            room_id = %joined.room_id,
            join_code = %joined.join_code,
            player_id = %joined.player_id,
            "room created"
        );
        self.persist(&data);
        self.broadcast(&data, &ServerEvent::RoomInfo(data.info()));
        joined
    }

    /// Seats a new player in the lobby with this join code.
    pub fn join_room(&self, join_code: &str, username: &str) -> Result<JoinedRoom, RoomError> {
        let room = self
            .registry
            .lock()
            .by_join_code(join_code)
            .ok_or_else(|| RoomError::InvalidJoinCode(join_code.to_owned()))?;

        let mut data = room.lock();
        if !data.game_state.is_joinable() {
            return Err(RoomError::GameAlreadyRunning);
        }

        let joined = self.seat_player(&mut data, username);
        info!(
            room_id = %joined.room_id,
            player_id = %joined.player_id,
            username = %joined.username,
            "player joined"
        );
        self.persist(&data);
        self.broadcast(&data, &ServerEvent::RoomInfo(data.info()));
        Ok(joined)
    }

    /// Gives up a seat for good.
    pub fn leave_room(&self, session_token: &str) -> Result<(), RoomError> {
        let (room, player_id) = self
            .registry
            .lock()
            .find_session(session_token)
            .ok_or(RoomError::InvalidSession)?;

        let closed = {
            let mut data = room.lock();
            if data.remove_player(player_id).is_none() {
                return Err(RoomError::InvalidSession);
            }
            info!(room_id = %room.id(), %player_id, "player left");
            self.after_removal(&mut data)
        };
        self.notifier.detach(player_id);
        if closed {
            self.close_room(room.id());
        }
        Ok(())
    }

    pub fn find_session(&self, session_token: &str) -> Option<(RoomId, PlayerId)> {
        self.registry
            .lock()
            .find_session(session_token)
            .map(|(room, player)| (room.id(), player))
    }

    /// Returns `true` if a live room uses this join code.
    pub fn check_join_code(&self, join_code: &str) -> bool {
        self.registry.lock().by_join_code(join_code).is_some()
    }

    /// Returns `true` if this session token still holds a seat.
    pub fn check_session(&self, session_token: &str) -> bool {
        self.find_session(session_token).is_some()
    }

    fn seat_player(&self, data: &mut RoomData, requested: &str) -> JoinedRoom {
        let username = if !requested.is_empty() && data.is_username_available(requested) {
            requested.to_owned()
        } else {
            unique_placeholder(data)
        };

        let player = Player::new(username, self.config.inactivity_timeout);
        let joined = JoinedRoom {
            room_id: data.room_id,
            player_id: player.id,
            username: player.username.clone(),
            session_token: player.session_token.clone(),
            join_code: data.join_code.clone(),
        };
        data.players.push(player);
        data.ensure_host();
        joined
    }

    // -- Connection lifecycle --

    /// Attaches a socket to the session's player.
    ///
    /// A socket already attached to that player is superseded and reported
    /// in [`Connected::replaced`].
    pub fn connect(
        &self,
        session_token: &str,
        connection: ConnectionId,
    ) -> Result<Connected, RoomError> {
        let (room, player_id) = self
            .registry
            .lock()
            .find_session(session_token)
            .ok_or(RoomError::InvalidSession)?;

        let mut data = room.lock();
        let timeout = self.config.inactivity_timeout;
        let player = data.player_mut(player_id).ok_or(RoomError::InvalidSession)?;
        let replaced = player.connection.replace(connection);
        player.reset_inactivity(timeout);

        info!(
            room_id = %room.id(),
            %player_id,
            %connection,
            replaced = replaced.is_some(),
            "player connected"
        );
        self.broadcast(&data, &ServerEvent::RoomInfo(data.info()));
        if data.deck.is_some() {
            self.send_initial(&data, player_id);
        }

        Ok(Connected {
            room_id: room.id(),
            player_id,
            replaced,
        })
    }

    /// Detaches a socket. A socket that was already replaced is ignored.
    pub fn disconnect(&self, room_id: RoomId, player_id: PlayerId, connection: ConnectionId) {
        let Some(room) = self.room(room_id) else {
            return;
        };
        let mut data = room.lock();
        let timeout = self.config.inactivity_timeout;
        let Some(player) = data.player_mut(player_id) else {
            return;
        };
        if player.connection != Some(connection) {
            debug!(%room_id, %player_id, %connection, "stale disconnect ignored");
            return;
        }
        player.connection = None;
        player.reset_inactivity(timeout);

        info!(%room_id, %player_id, %connection, "player disconnected");
        self.broadcast(&data, &ServerEvent::RoomInfo(data.info()));
    }

    // -- Actions --

    /// Applies one action from a seated player.
    pub fn handle_event(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        let result = match event {
            ClientEvent::UpdatePlayer {
                player_id: target,
                username,
                permissions,
            } => self.update_player(room_id, player_id, target, username, permissions),
            ClientEvent::KickPlayer { player_id: target } => {
                self.kick_player(room_id, player_id, target)
            }
            ClientEvent::SetCardDeck { card_deck_id } => {
                self.set_card_deck(room_id, player_id, card_deck_id)
            }
            ClientEvent::StartGame => self.start_game(room_id, player_id),
            ClientEvent::DrawCard => self.draw_card(room_id, player_id),
            ClientEvent::PlayCard {
                card_index,
                card_update,
            } => self.play_card(room_id, player_id, card_index, card_update),
            ClientEvent::UpdatePlayedCard { card_update } => {
                self.update_played_card(room_id, player_id, card_update)
            }
        };
        if let Err(e) = &result {
            debug!(%room_id, %player_id, code = %e.code(), error = %e, "action rejected");
        }
        result
    }

    /// Renames a player or changes their permissions.
    ///
    /// Anyone may rename themselves. Renaming others and every permission
    /// change need the host. Granting the host bit to someone else hands
    /// the host role over.
    pub fn update_player(
        &self,
        room_id: RoomId,
        actor: PlayerId,
        target: PlayerId,
        username: Option<String>,
        permissions: Option<Permissions>,
    ) -> Result<(), RoomError> {
        let room = self.live_room(room_id)?;
        let mut data = room.lock();

        let actor_is_host = data.player(actor).ok_or(RoomError::InvalidSession)?.is_host();
        if target != actor && !actor_is_host {
            return Err(RoomError::InsufficientPermission("update other players"));
        }
        if permissions.is_some() && !actor_is_host {
            return Err(RoomError::InsufficientPermission("change permissions"));
        }
        let current_name = data
            .player(target)
            .map(|p| p.username.clone())
            .ok_or(RoomError::InvalidPlayer(target))?;
        if let Some(name) = &username {
            if *name != current_name && (name.is_empty() || !data.is_username_available(name)) {
                return Err(RoomError::UsernameTaken(name.clone()));
            }
        }

        if let Some(perms) = permissions {
            if perms.has(Permissions::HOST) && target != actor {
                if let Some(host) = data.player_mut(actor) {
                    host.permissions.clear(Permissions::HOST);
                }
            }
            if let Some(player) = data.player_mut(target) {
                player.permissions = perms;
            }
        }
        if let Some(name) = username {
            if let Some(player) = data.player_mut(target) {
                player.username = name;
            }
        }
        data.ensure_host();

        debug!(%room_id, %actor, %target, "player updated");
        self.persist(&data);
        self.broadcast(&data, &ServerEvent::RoomInfo(data.info()));
        Ok(())
    }

    /// Removes another player from the room. Host only.
    pub fn kick_player(
        &self,
        room_id: RoomId,
        actor: PlayerId,
        target: PlayerId,
    ) -> Result<(), RoomError> {
        let room = self.live_room(room_id)?;
        let closed = {
            let mut data = room.lock();
            require_host(&data, actor, "kick players")?;
            if data.remove_player(target).is_none() {
                return Err(RoomError::InvalidPlayer(target));
            }

            info!(%room_id, %actor, %target, "player kicked");
            self.notifier.send(
                target,
                ServerEvent::Status(Status::error(
                    StatusCode::PlayerKicked,
                    "you were kicked from the room",
                )),
            );
            self.notifier.detach(target);
            self.after_removal(&mut data)
        };
        if closed {
            self.close_room(room_id);
        }
        Ok(())
    }

    /// Picks the deck variant by numeric id. Host only, lobby only.
    pub fn set_card_deck(
        &self,
        room_id: RoomId,
        actor: PlayerId,
        card_deck_id: u8,
    ) -> Result<(), RoomError> {
        let room = self.live_room(room_id)?;
        let mut data = room.lock();
        require_host(&data, actor, "change the card deck")?;
        if !data.game_state.is_joinable() {
            return Err(RoomError::GameAlreadyStarted);
        }
        let kind = DeckKind::from_id(card_deck_id).ok_or(RoomError::InvalidCardDeck(card_deck_id))?;

        data.card_deck = kind;
        debug!(%room_id, deck = ?kind, "card deck selected");
        self.persist(&data);
        self.broadcast(&data, &ServerEvent::RoomInfo(data.info()));
        Ok(())
    }

    /// Deals the opening hands and starts play. Host only, lobby only.
    pub fn start_game(&self, room_id: RoomId, actor: PlayerId) -> Result<(), RoomError> {
        let room = self.live_room(room_id)?;
        let mut guard = room.lock();
        let data = &mut *guard;
        require_host(data, actor, "start the game")?;
        if !data.game_state.is_joinable() {
            return Err(RoomError::GameAlreadyStarted);
        }

        for player in &mut data.players {
            player.cards.clear();
        }
        let mut deck = Deck::new(data.card_deck);
        deck.init(&mut Hands(&mut data.players));
        data.deck = Some(deck);
        data.winner = None;
        self.set_game_state(data, GameState::Running);

        info!(%room_id, deck = ?data.card_deck, players = data.players.len(), "game started");
        self.persist(data);
        self.broadcast(data, &ServerEvent::RoomInfo(data.info()));
        self.refresh_all(data);
        Ok(())
    }

    /// Deals one card to the active player and passes the turn.
    ///
    /// An exhausted deck still passes the turn; the rejection tells the
    /// player nothing was dealt.
    pub fn draw_card(&self, room_id: RoomId, actor: PlayerId) -> Result<(), RoomError> {
        let room = self.live_room(room_id)?;
        let mut guard = room.lock();
        let data = &mut *guard;
        require_turn(data, actor)?;
        let deck = data.deck.as_mut().ok_or(RoomError::GameNotRunning)?;

        let drawn = deck.draw_card(&mut Hands(&mut data.players));
        match drawn {
            Ok(_) => {
                debug!(%room_id, %actor, "card drawn");
                self.persist(data);
                self.refresh_turn(data, actor);
                Ok(())
            }
            Err(DrawError::Blocked) => Err(RoomError::DrawBlocked),
            Err(DrawError::Exhausted) => {
                debug!(%room_id, %actor, "deck exhausted, turn passed");
                self.persist(data);
                self.refresh_turn(data, actor);
                Err(RoomError::DeckExhausted)
            }
            Err(DrawError::NoSeats) => Err(RoomError::GameNotRunning),
        }
    }

    /// Plays the card at `card_index` of the active player's hand.
    ///
    /// A wildcard may carry its color inline; an inline color that does
    /// not apply leaves the wildcard pending. Emptying any hand ends the
    /// game.
    pub fn play_card(
        &self,
        room_id: RoomId,
        actor: PlayerId,
        card_index: Option<usize>,
        card_update: Option<CardUpdate>,
    ) -> Result<(), RoomError> {
        let room = self.live_room(room_id)?;
        let mut guard = room.lock();
        let data = &mut *guard;
        let seat = require_turn(data, actor)?;
        let index = card_index.ok_or(RoomError::MissingParameter("card_index"))?;
        let card = *data.players[seat]
            .cards
            .get(index)
            .ok_or(RoomError::InvalidCardIndex(index))?;
        let deck = data.deck.as_mut().ok_or(RoomError::GameNotRunning)?;
        if !deck.can_play(&card) {
            return Err(RoomError::CardNotPlayable);
        }

        // Out of the hand first: a swap must move the remaining cards only.
        data.players[seat].cards.remove(index);
        if !deck.play_card(card, &mut Hands(&mut data.players)) {
            data.players[seat].cards.insert(index, card);
            return Err(RoomError::CardNotPlayable);
        }
        let updated = match (card.is_wild(), card_update) {
            (true, Some(update)) => {
                let updated = deck.update_played_card(&update, &SeatCount(data.players.len()));
                if updated.is_none() {
                    debug!(%room_id, %actor, ?update, "inline card update ignored");
                }
                updated
            }
            _ => None,
        };

        debug!(%room_id, %actor, ?card, "card played");
        self.broadcast(
            data,
            &ServerEvent::CardPlayed {
                card,
                card_index: index,
                played_by: actor,
            },
        );
        if let Some(updated) = updated {
            self.broadcast(
                data,
                &ServerEvent::PlayedCardUpdate {
                    updated_by: actor,
                    card: updated,
                },
            );
        }

        let winner = std::iter::once(seat)
            .chain(0..data.players.len())
            .find(|&s| data.players[s].cards.is_empty())
            .map(|s| data.players[s].id);
        if let Some(winner) = winner {
            data.winner = Some(winner);
            self.set_game_state(data, GameState::Ended);
        }

        self.persist(data);
        self.refresh_all(data);
        if let Some(winner) = winner {
            info!(%room_id, %winner, "game won");
            self.broadcast(data, &ServerEvent::RoomInfo(data.info()));
        }
        Ok(())
    }

    /// Chooses the color of a pending wildcard and passes the turn.
    pub fn update_played_card(
        &self,
        room_id: RoomId,
        actor: PlayerId,
        card_update: CardUpdate,
    ) -> Result<(), RoomError> {
        let room = self.live_room(room_id)?;
        let mut guard = room.lock();
        let data = &mut *guard;
        require_turn(data, actor)?;
        let seats = SeatCount(data.players.len());
        let deck = data.deck.as_mut().ok_or(RoomError::GameNotRunning)?;

        let card = deck
            .update_played_card(&card_update, &seats)
            .ok_or(RoomError::CardNotUpdatable)?;
        debug!(%room_id, %actor, ?card, "played card updated");
        self.broadcast(
            data,
            &ServerEvent::PlayedCardUpdate {
                updated_by: actor,
                card,
            },
        );
        self.persist(data);
        self.refresh_all(data);
        Ok(())
    }

    // -- Housekeeping --

    /// Ages disconnected players by `dt` and evicts those whose countdown
    /// ran out. Rooms left empty are ended and dropped from the registry.
    pub fn sweep_inactive(&self, dt: Duration) -> SweepReport {
        let rooms = self.registry.lock().rooms();
        let mut report = SweepReport::default();

        for room in rooms {
            let closed = {
                let mut data = room.lock();
                let mut evicted = Vec::new();
                data.players.retain_mut(|player| {
                    if player.is_connected() {
                        return true;
                    }
                    if player.inactivity <= dt {
                        evicted.push(player.id);
                        return false;
                    }
                    player.inactivity -= dt;
                    true
                });
                if evicted.is_empty() && !data.players.is_empty() {
                    continue;
                }

                data.ensure_host();
                for player_id in evicted {
                    info!(room_id = %room.id(), %player_id, "player evicted for inactivity");
                    report.evicted.push((room.id(), player_id));
                }
                self.after_removal(&mut data)
            };
            if closed {
                self.close_room(room.id());
                report.closed.push(room.id());
            }
        }
        report
    }

    pub fn stats(&self) -> GameStats {
        let rooms = self.registry.lock().rooms();
        let online_player_count = rooms
            .iter()
            .map(|room| room.lock().players.iter().filter(|p| p.is_connected()).count())
            .sum();
        let total_games_played = self.store.games_played().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read games played");
            0
        });
        GameStats {
            total_games_played,
            running_games: rooms.len(),
            online_player_count,
        }
    }

    /// Restores every unfinished room from storage. Restored players start
    /// disconnected with a full countdown. Returns how many rooms came back.
    pub fn load_rooms(&self) -> usize {
        let stored = match self.store.load_active_rooms() {
            Ok(rooms) => rooms,
            Err(e) => {
                warn!(error = %e, "failed to load stored rooms");
                return 0;
            }
        };

        let mut registry = self.registry.lock();
        let mut loaded = 0;
        for mut data in stored {
            if registry.get(data.room_id).is_some() {
                continue;
            }
            if data.game_state.is_running() && data.deck.is_none() {
                warn!(room_id = %data.room_id, "running room without a deck, back to lobby");
                data.game_state = GameState::Lobby;
            }
            for player in &mut data.players {
                player.connection = None;
                player.reset_inactivity(self.config.inactivity_timeout);
            }
            data.ensure_host();
            registry.insert(data);
            loaded += 1;
        }
        info!(loaded, "rooms restored");
        loaded
    }

    /// Persists every live room.
    pub fn shutdown(&self) {
        let rooms = self.registry.lock().rooms();
        for room in &rooms {
            self.persist(&room.lock());
        }
        info!(rooms = rooms.len(), "rooms persisted for shutdown");
    }

    // -- Side effects --

    /// Moves the room to `state`. The first entry into `Ended` counts one
    /// finished game.
    fn set_game_state(&self, data: &mut RoomData, state: GameState) {
        if state.is_ended() && !data.game_state.is_ended() {
            if let Err(e) = self.store.increment_games_played() {
                warn!(room_id = %data.room_id, error = %e, "failed to count finished game");
            }
            info!(room_id = %data.room_id, "game ended");
        }
        data.game_state = state;
    }

    /// Persists and notifies after players were removed. Returns `true` if
    /// the room is now empty and has been ended.
    fn after_removal(&self, data: &mut RoomData) -> bool {
        if data.players.is_empty() {
            self.set_game_state(data, GameState::Ended);
            self.persist(data);
            return true;
        }
        self.persist(data);
        self.broadcast(data, &ServerEvent::RoomInfo(data.info()));
        if data.game_state.is_running() {
            self.refresh_all(data);
        }
        false
    }

    fn close_room(&self, room_id: RoomId) {
        if self.registry.lock().remove(room_id).is_some() {
            info!(%room_id, "room closed");
        }
    }

    fn persist(&self, data: &RoomData) {
        if let Err(e) = self.store.upsert_room(data) {
            warn!(room_id = %data.room_id, error = %e, "failed to persist room");
        }
    }

    /// Sends `event` to every connected player of the room.
    fn broadcast(&self, data: &RoomData, event: &ServerEvent) {
        for player in data.players.iter().filter(|p| p.is_connected()) {
            self.notifier.send(player.id, event.clone());
        }
    }

    fn send_own_cards(&self, data: &RoomData, player: &Player) {
        if player.is_connected() {
            self.notifier.send(
                player.id,
                ServerEvent::OwnCards {
                    cards: data.own_cards(player),
                },
            );
        }
    }

    fn broadcast_player_states(&self, data: &RoomData) {
        for player in &data.players {
            self.broadcast(data, &ServerEvent::PlayerState(data.player_state(player)));
        }
    }

    /// The actor's hand plus everybody's public state.
    fn refresh_turn(&self, data: &RoomData, actor: PlayerId) {
        if let Some(player) = data.player(actor) {
            self.send_own_cards(data, player);
        }
        self.broadcast_player_states(data);
    }

    /// Every hand to its owner plus everybody's public state.
    fn refresh_all(&self, data: &RoomData) {
        for player in &data.players {
            self.send_own_cards(data, player);
        }
        self.broadcast_player_states(data);
    }

    /// Catches a (re)connected player up on a game in progress.
    fn send_initial(&self, data: &RoomData, player_id: PlayerId) {
        let Some(player) = data.player(player_id) else {
            return;
        };
        self.send_own_cards(data, player);
        if player.is_connected() {
            for other in &data.players {
                self.notifier
                    .send(player_id, ServerEvent::PlayerState(data.player_state(other)));
            }
        }
    }
}

fn require_host(data: &RoomData, actor: PlayerId, action: &'static str) -> Result<(), RoomError> {
    let player = data.player(actor).ok_or(RoomError::InvalidSession)?;
    if player.is_host() {
        Ok(())
    } else {
        Err(RoomError::InsufficientPermission(action))
    }
}

/// Checks that the game runs and `actor` holds the turn. Returns their seat.
fn require_turn(data: &RoomData, actor: PlayerId) -> Result<usize, RoomError> {
    if !data.game_state.is_running() {
        return Err(RoomError::GameNotRunning);
    }
    let seat = data.seat_of(actor).ok_or(RoomError::InvalidSession)?;
    if !data.is_active(actor) {
        return Err(RoomError::PlayerNotActive);
    }
    Ok(seat)
}

/// A placeholder name no player in the room uses right now.
fn unique_placeholder(data: &RoomData) -> String {
    let mut rng = rand::rng();
    for _ in 0..PLACEHOLDER_ATTEMPTS {
        let name = placeholder_username(&mut rng);
        if data.is_username_available(&name) {
            return name;
        }
    }
    let base = placeholder_username(&mut rng);
    (2u32..)
        .map(|n| format!("{base} {n}"))
        .find(|name| data.is_username_available(name))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hexdeck_deck::{Card, HexCard, HexColor, HexSymbol};

    use super::*;
    use crate::{MemoryStore, RecordingNotifier};

    fn game() -> (Game, Arc<MemoryStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let game = Game::new(RoomConfig::default(), store.clone(), notifier.clone());
        (game, store, notifier)
    }

    #[test]
    fn test_create_room_seats_host_and_persists() {
        let (game, store, _) = game();
        let ann = game.create_room("Ann");

        let room = game.room(ann.room_id).unwrap();
        let data = room.lock();
        assert_eq!(data.players.len(), 1);
        assert!(data.players[0].is_host());
        assert_eq!(data.players[0].username, "Ann");
        assert_eq!(data.game_state, GameState::Lobby);
        assert!(store.room(ann.room_id).is_some());
    }

    #[test]
    fn test_join_with_empty_or_taken_name_gets_placeholder() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");

        let second = game.join_room(&ann.join_code, "Ann").unwrap();
        assert_ne!(second.username, "Ann");
        assert_eq!(second.username.split(' ').count(), 2);

        let third = game.join_room(&ann.join_code, "").unwrap();
        assert_ne!(third.username, second.username);
        assert!(!third.username.is_empty());
    }

    #[test]
    fn test_join_unknown_code() {
        let (game, _, _) = game();
        let err = game.join_room("nope", "Ann").unwrap_err();
        assert_eq!(err, RoomError::InvalidJoinCode("nope".into()));
    }

    #[test]
    fn test_unique_placeholder_falls_back_to_suffix() {
        let mut data = RoomData::new(RoomId(1), "000001".into(), DeckKind::HexV1);
        let name = unique_placeholder(&data);
        data.players
            .push(Player::new(name.clone(), Duration::from_secs(20)));
        assert_ne!(unique_placeholder(&data), name);
    }

    #[test]
    fn test_update_player_rename_self() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        let bob = game.join_room(&ann.join_code, "Bob").unwrap();

        game.update_player(ann.room_id, bob.player_id, bob.player_id, Some("Rob".into()), None)
            .unwrap();
        let room = game.room(ann.room_id).unwrap();
        assert_eq!(room.lock().player(bob.player_id).unwrap().username, "Rob");
    }

    #[test]
    fn test_update_player_rejects_before_mutating() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        let bob = game.join_room(&ann.join_code, "Bob").unwrap();

        let err = game
            .update_player(ann.room_id, bob.player_id, ann.player_id, Some("X".into()), None)
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::InsufficientPermission);

        let err = game
            .update_player(ann.room_id, bob.player_id, bob.player_id, Some("Ann".into()), None)
            .unwrap_err();
        assert_eq!(err, RoomError::UsernameTaken("Ann".into()));

        let err = game
            .update_player(
                ann.room_id,
                bob.player_id,
                bob.player_id,
                Some("Rob".into()),
                Some(Permissions(1)),
            )
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::InsufficientPermission);

        let room = game.room(ann.room_id).unwrap();
        let data = room.lock();
        assert_eq!(data.player(bob.player_id).unwrap().username, "Bob");
        assert!(!data.player(bob.player_id).unwrap().is_host());
    }

    #[test]
    fn test_update_player_transfers_host() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        let bob = game.join_room(&ann.join_code, "Bob").unwrap();

        game.update_player(ann.room_id, ann.player_id, bob.player_id, None, Some(Permissions(1)))
            .unwrap();
        let room = game.room(ann.room_id).unwrap();
        let data = room.lock();
        assert!(data.player(bob.player_id).unwrap().is_host());
        assert!(!data.player(ann.player_id).unwrap().is_host());
    }

    #[test]
    fn test_set_card_deck() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        let bob = game.join_room(&ann.join_code, "Bob").unwrap();

        assert_eq!(
            game.set_card_deck(ann.room_id, bob.player_id, 0).unwrap_err().code(),
            StatusCode::InsufficientPermission
        );
        assert_eq!(
            game.set_card_deck(ann.room_id, ann.player_id, 9).unwrap_err(),
            RoomError::InvalidCardDeck(9)
        );
        game.set_card_deck(ann.room_id, ann.player_id, 0).unwrap();
        assert_eq!(game.room(ann.room_id).unwrap().lock().card_deck, DeckKind::Classic);

        game.start_game(ann.room_id, ann.player_id).unwrap();
        assert_eq!(
            game.set_card_deck(ann.room_id, ann.player_id, 1).unwrap_err(),
            RoomError::GameAlreadyStarted
        );
    }

    #[test]
    fn test_start_game_deals_and_runs() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        let bob = game.join_room(&ann.join_code, "Bob").unwrap();

        assert_eq!(
            game.start_game(ann.room_id, bob.player_id).unwrap_err().code(),
            StatusCode::InsufficientPermission
        );
        game.start_game(ann.room_id, ann.player_id).unwrap();

        let room = game.room(ann.room_id).unwrap();
        let data = room.lock();
        assert_eq!(data.game_state, GameState::Running);
        assert!(data.deck.is_some());
        assert!(data.players.iter().all(|p| p.cards.len() == 8));
        assert!(data.is_active(ann.player_id));
        drop(data);

        assert_eq!(
            game.start_game(ann.room_id, ann.player_id).unwrap_err(),
            RoomError::GameAlreadyStarted
        );
    }

    #[test]
    fn test_actions_need_running_game() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        assert_eq!(
            game.draw_card(ann.room_id, ann.player_id).unwrap_err(),
            RoomError::GameNotRunning
        );
        assert_eq!(
            game.play_card(ann.room_id, ann.player_id, Some(0), None).unwrap_err(),
            RoomError::GameNotRunning
        );
    }

    #[test]
    fn test_play_card_parameter_checks() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        game.join_room(&ann.join_code, "Bob").unwrap();
        game.start_game(ann.room_id, ann.player_id).unwrap();

        assert_eq!(
            game.play_card(ann.room_id, ann.player_id, None, None).unwrap_err(),
            RoomError::MissingParameter("card_index")
        );
        assert_eq!(
            game.play_card(ann.room_id, ann.player_id, Some(99), None).unwrap_err(),
            RoomError::InvalidCardIndex(99)
        );
    }

    #[test]
    fn test_play_wild_with_inline_color_passes_turn() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        let bob = game.join_room(&ann.join_code, "Bob").unwrap();
        game.start_game(ann.room_id, ann.player_id).unwrap();

        let room = game.room(ann.room_id).unwrap();
        room.lock().players[0].cards[0] =
            Card::HexV1(HexCard::action(HexColor::Rainbow, HexSymbol::Shuffle));

        game.play_card(
            ann.room_id,
            ann.player_id,
            Some(0),
            Some(CardUpdate::HexV1 {
                color: HexColor::Blue,
            }),
        )
        .unwrap();

        let data = room.lock();
        assert_eq!(data.players[0].cards.len(), 7);
        match data.top_card() {
            Some(Card::HexV1(card)) => assert_eq!(card.color, HexColor::Blue),
            other => panic!("unexpected top card {other:?}"),
        }
        // Two seats: shuffle may reorder, but someone holds the turn.
        assert!(data.is_active(ann.player_id) || data.is_active(bob.player_id));
    }

    #[test]
    fn test_update_played_card_without_pending_wild() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        game.join_room(&ann.join_code, "Bob").unwrap();
        game.start_game(ann.room_id, ann.player_id).unwrap();

        let err = game
            .update_played_card(
                ann.room_id,
                ann.player_id,
                CardUpdate::HexV1 {
                    color: HexColor::Green,
                },
            )
            .unwrap_err();
        assert_eq!(err, RoomError::CardNotUpdatable);
    }

    #[test]
    fn test_leave_last_player_closes_room() {
        let (game, store, notifier) = game();
        let ann = game.create_room("Ann");

        game.leave_room(&ann.session_token).unwrap();
        assert!(game.room(ann.room_id).is_none());
        assert_eq!(store.room(ann.room_id).unwrap().game_state, GameState::Ended);
        assert_eq!(store.games_played().unwrap(), 1);
        assert_eq!(notifier.detached(), vec![ann.player_id]);

        assert_eq!(
            game.leave_room(&ann.session_token).unwrap_err(),
            RoomError::InvalidSession
        );
    }

    #[test]
    fn test_kick_player_notifies_target() {
        let (game, _, notifier) = game();
        let ann = game.create_room("Ann");
        let bob = game.join_room(&ann.join_code, "Bob").unwrap();

        assert_eq!(
            game.kick_player(ann.room_id, bob.player_id, ann.player_id)
                .unwrap_err()
                .code(),
            StatusCode::InsufficientPermission
        );
        game.kick_player(ann.room_id, ann.player_id, bob.player_id).unwrap();

        let sent = notifier.sent_to(bob.player_id);
        assert!(sent.iter().any(|e| matches!(
            e,
            ServerEvent::Status(s) if s.status_code == StatusCode::PlayerKicked
        )));
        assert_eq!(notifier.detached(), vec![bob.player_id]);
        assert!(!game.check_session(&bob.session_token));
        assert_eq!(
            game.kick_player(ann.room_id, ann.player_id, bob.player_id).unwrap_err(),
            RoomError::InvalidPlayer(bob.player_id)
        );
    }

    #[test]
    fn test_check_join_code_and_session() {
        let (game, _, _) = game();
        let ann = game.create_room("Ann");
        assert!(game.check_join_code(&ann.join_code));
        assert!(!game.check_join_code("abc"));
        assert!(game.check_session(&ann.session_token));
        assert_eq!(
            game.find_session(&ann.session_token),
            Some((ann.room_id, ann.player_id))
        );
    }

    #[test]
    fn test_load_rooms_resets_connections() {
        let store = Arc::new(MemoryStore::new());
        let first = Game::new(
            RoomConfig::default(),
            store.clone(),
            Arc::new(RecordingNotifier::new()),
        );
        let ann = first.create_room("Ann");
        first.connect(&ann.session_token, ConnectionId::new(1)).unwrap();
        first.shutdown();

        let second = Game::new(
            RoomConfig::default(),
            store.clone(),
            Arc::new(RecordingNotifier::new()),
        );
        assert_eq!(second.load_rooms(), 1);
        let room = second.room(ann.room_id).unwrap();
        let data = room.lock();
        assert!(!data.players[0].is_connected());
        assert_eq!(data.players[0].inactivity, Duration::from_secs(20));
        assert!(second.check_join_code(&ann.join_code));
    }
}
