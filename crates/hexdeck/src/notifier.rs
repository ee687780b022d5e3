//! Routes room events to the socket each player is attached to.

use std::collections::HashMap;

use hexdeck_protocol::{ConnectionId, PlayerId, Status, StatusCode, SystemMessage};
use hexdeck_room::{Notifier, ServerEvent};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// What a connection task is asked to do next.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outbound {
    Game(ServerEvent),
    System(SystemMessage),
    /// Close the socket once everything before this has been sent.
    Close,
}

struct Attachment {
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<Outbound>,
}

/// A [`Notifier`] backed by one unbounded channel per attached player.
///
/// Sends never block: a player without a socket, or whose socket task has
/// already gone, simply misses the event.
#[derive(Default)]
pub struct ChannelNotifier {
    attached: Mutex<HashMap<PlayerId, Attachment>>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points `player` at a new socket. A previously attached socket is
    /// told why and closed.
    pub(crate) fn attach(
        &self,
        player: PlayerId,
        connection: ConnectionId,
        tx: mpsc::UnboundedSender<Outbound>,
    ) {
        let previous = self
            .attached
            .lock()
            .insert(player, Attachment { connection, tx });
        if let Some(old) = previous {
            if old.connection != connection {
                let _ = old.tx.send(Outbound::System(SystemMessage::Status(Status::error(
                    StatusCode::ConnectionFromDifferentSocket,
                    "this session was opened on another socket",
                ))));
                let _ = old.tx.send(Outbound::Close);
            }
        }
    }

    /// Forgets `player` if `connection` is still the attached socket.
    pub(crate) fn release(&self, player: PlayerId, connection: ConnectionId) {
        let mut attached = self.attached.lock();
        if attached.get(&player).is_some_and(|a| a.connection == connection) {
            attached.remove(&player);
        }
    }

    pub fn attached_count(&self) -> usize {
        self.attached.lock().len()
    }
}

impl Notifier for ChannelNotifier {
    fn send(&self, player: PlayerId, event: ServerEvent) {
        if let Some(attachment) = self.attached.lock().get(&player) {
            let _ = attachment.tx.send(Outbound::Game(event));
        }
    }

    fn detach(&self, player: PlayerId) {
        if let Some(attachment) = self.attached.lock().remove(&player) {
            let _ = attachment.tx.send(Outbound::Close);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: StatusCode) -> ServerEvent {
        ServerEvent::Status(Status::error(code, "test"))
    }

    #[test]
    fn test_send_reaches_attached_player() {
        let notifier = ChannelNotifier::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        notifier.attach(PlayerId(1), ConnectionId::new(1), tx);

        notifier.send(PlayerId(1), status(StatusCode::DrawBlocked));
        notifier.send(PlayerId(2), status(StatusCode::DrawBlocked));

        assert_eq!(rx.try_recv().unwrap(), Outbound::Game(status(StatusCode::DrawBlocked)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_attach_replaces_and_closes_old_socket() {
        let notifier = ChannelNotifier::new();
        let (old_tx, mut old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        notifier.attach(PlayerId(1), ConnectionId::new(1), old_tx);
        notifier.attach(PlayerId(1), ConnectionId::new(2), new_tx);

        match old_rx.try_recv().unwrap() {
            Outbound::System(SystemMessage::Status(s)) => {
                assert_eq!(s.status_code, StatusCode::ConnectionFromDifferentSocket)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(old_rx.try_recv().unwrap(), Outbound::Close);

        notifier.send(PlayerId(1), status(StatusCode::GameNotRunning));
        assert!(matches!(new_rx.try_recv().unwrap(), Outbound::Game(_)));
        assert_eq!(notifier.attached_count(), 1);
    }

    #[test]
    fn test_release_ignores_replaced_socket() {
        let notifier = ChannelNotifier::new();
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        let (new_tx, _new_rx) = mpsc::unbounded_channel();
        notifier.attach(PlayerId(1), ConnectionId::new(1), old_tx);
        notifier.attach(PlayerId(1), ConnectionId::new(2), new_tx);

        notifier.release(PlayerId(1), ConnectionId::new(1));
        assert_eq!(notifier.attached_count(), 1);
        notifier.release(PlayerId(1), ConnectionId::new(2));
        assert_eq!(notifier.attached_count(), 0);
    }

    #[test]
    fn test_detach_closes_channel() {
        let notifier = ChannelNotifier::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        notifier.attach(PlayerId(1), ConnectionId::new(1), tx);
        notifier.detach(PlayerId(1));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Close);
        assert_eq!(notifier.attached_count(), 0);
    }
}
