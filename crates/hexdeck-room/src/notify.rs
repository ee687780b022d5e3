//! Delivery of room events to players.

use hexdeck_protocol::PlayerId;
use parking_lot::Mutex;

use crate::ServerEvent;

/// Pushes events to players' sockets.
///
/// Delivery is fire-and-forget: a player without a live socket simply
/// misses the event, and nothing here may block the caller.
pub trait Notifier: Send + Sync + 'static {
    fn send(&self, player: PlayerId, event: ServerEvent);

    /// The player no longer has a seat. Close their socket after any
    /// events already queued.
    fn detach(&self, _player: PlayerId) {}
}

/// A [`Notifier`] that records every call, for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(PlayerId, ServerEvent)>>,
    detached: Mutex<Vec<PlayerId>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything sent so far.
    pub fn take(&self) -> Vec<(PlayerId, ServerEvent)> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Events sent to one player so far, without draining.
    pub fn sent_to(&self, player: PlayerId) -> Vec<ServerEvent> {
        self.sent
            .lock()
            .iter()
            .filter(|(p, _)| *p == player)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn detached(&self) -> Vec<PlayerId> {
        self.detached.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, player: PlayerId, event: ServerEvent) {
        self.sent.lock().push((player, event));
    }

    fn detach(&self, player: PlayerId) {
        self.detached.lock().push(player);
    }
}
