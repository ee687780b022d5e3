//! Per-connection handler.
//!
//! Each accepted socket gets its own task running this handler:
//!   1. Until a session is attached, answer lookups (`CheckJoinCode`,
//!      `CheckSession`, `GetStats`, `Heartbeat`) and wait for `Handshake`,
//!      `CreateRoom` or `JoinRoom`.
//!   2. Once attached, forward game events to the room and push room
//!      events from the player's channel out to the socket.
//!   3. On exit, release the channel and mark the player disconnected.

use std::sync::Arc;

use hexdeck_protocol::{
    Codec, Envelope, PROTOCOL_VERSION, Payload, PlayerId, ProtocolError, RoomId,
    Status, StatusCode, SystemMessage,
};
use hexdeck_room::{ClientEvent, RoomError, ServerEvent};
use hexdeck_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::HexdeckError;
use crate::notifier::Outbound;
use crate::server::ServerState;

type Inbound = Envelope<ClientEvent>;

/// A socket attached to a seat.
struct Session {
    room_id: RoomId,
    player_id: PlayerId,
    session_token: String,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

/// What to do after a frame has been handled.
enum Flow {
    Continue,
    Attach(String),
    Close,
}

/// Outgoing side of one connection: numbers and encodes frames.
struct Outbox<'a> {
    conn: &'a WebSocketConnection,
    state: &'a ServerState,
    seq: u64,
}

impl Outbox<'_> {
    async fn send(&mut self, payload: Payload<ServerEvent>) -> Result<(), HexdeckError> {
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.state.uptime_ms(),
            payload,
        };
        self.seq += 1;
        let bytes = self.state.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn system(&mut self, msg: SystemMessage) -> Result<(), HexdeckError> {
        self.send(Payload::System(msg)).await
    }

    async fn status(&mut self, status: Status) -> Result<(), HexdeckError> {
        self.system(SystemMessage::Status(status)).await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), HexdeckError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut outbox = Outbox {
        conn: &conn,
        state: &*state,
        seq: 1,
    };

    let result = match await_session(&mut outbox).await {
        Ok(Some(token)) => match attach(&mut outbox, &token).await {
            Ok(Some(session)) => run_session(&mut outbox, session).await,
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        },
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    };

    let _ = conn.close().await;
    tracing::debug!(%conn_id, "connection closed");
    result
}

// ---------------------------------------------------------------------------
// Before a session
// ---------------------------------------------------------------------------

/// Serves pre-session requests until one of them yields a session token.
/// Returns `None` if the socket closed first.
async fn await_session(outbox: &mut Outbox<'_>) -> Result<Option<String>, HexdeckError> {
    loop {
        let Some(data) = outbox.conn.recv().await? else {
            return Ok(None);
        };
        let Some(envelope) = decode(outbox, &data) else {
            continue;
        };

        let flow = match envelope.payload {
            Payload::System(msg) => handle_pre_session(outbox, msg).await?,
            Payload::Game(_) => {
                outbox
                    .status(RoomError::InvalidSession.to_status())
                    .await?;
                Flow::Continue
            }
        };
        match flow {
            Flow::Continue => {}
            Flow::Attach(token) => return Ok(Some(token)),
            Flow::Close => return Ok(None),
        }
    }
}

async fn handle_pre_session(
    outbox: &mut Outbox<'_>,
    msg: SystemMessage,
) -> Result<Flow, HexdeckError> {
    let game = &outbox.state.game;
    match msg {
        SystemMessage::Handshake {
            version,
            session_token,
        } => {
            if version != PROTOCOL_VERSION {
                let message = format!("expected protocol version {PROTOCOL_VERSION}, got {version}");
                outbox
                    .status(Status::error(StatusCode::VersionMismatch, message.clone()))
                    .await?;
                return Err(ProtocolError::InvalidMessage(message).into());
            }
            return Ok(Flow::Attach(session_token));
        }

        SystemMessage::CreateRoom { username } => {
            let joined = game.create_room(&username);
            outbox
                .system(SystemMessage::RoomJoined {
                    room_id: joined.room_id,
                    player_id: joined.player_id,
                    username: joined.username,
                    session_token: joined.session_token.clone(),
                })
                .await?;
            return Ok(Flow::Attach(joined.session_token));
        }

        SystemMessage::JoinRoom {
            join_code,
            username,
        } => match game.join_room(&join_code, &username) {
            Ok(joined) => {
                outbox
                    .system(SystemMessage::RoomJoined {
                        room_id: joined.room_id,
                        player_id: joined.player_id,
                        username: joined.username,
                        session_token: joined.session_token.clone(),
                    })
                    .await?;
                return Ok(Flow::Attach(joined.session_token));
            }
            Err(e) => {
                tracing::debug!(%join_code, error = %e, "join rejected");
                outbox.status(e.to_status()).await?;
            }
        },

        SystemMessage::LeaveRoom => {
            outbox
                .status(RoomError::InvalidSession.to_status())
                .await?;
        }

        SystemMessage::Disconnect { reason } => {
            tracing::debug!(%reason, "client left before attaching");
            return Ok(Flow::Close);
        }

        other => answer_lookup(outbox, other).await?,
    }
    Ok(Flow::Continue)
}

// ---------------------------------------------------------------------------
// Attached session
// ---------------------------------------------------------------------------

/// Binds this socket to the session. Returns `None` if the token is not
/// seated anywhere; the client has then been told so.
async fn attach(outbox: &mut Outbox<'_>, token: &str) -> Result<Option<Session>, HexdeckError> {
    let state = outbox.state;
    let conn_id = outbox.conn.id();

    let Some((_, player_id)) = state.game.find_session(token) else {
        outbox
            .status(RoomError::InvalidSession.to_status())
            .await?;
        return Ok(None);
    };

    let (tx, rx) = mpsc::unbounded_channel();
    state.notifier.attach(player_id, conn_id, tx);
    let connected = match state.game.connect(token, conn_id) {
        Ok(connected) => connected,
        Err(e) => {
            state.notifier.release(player_id, conn_id);
            outbox.status(e.to_status()).await?;
            return Ok(None);
        }
    };

    outbox
        .system(SystemMessage::HandshakeAck {
            player_id: connected.player_id,
            room_id: connected.room_id,
            server_time: state.uptime_ms(),
        })
        .await?;

    Ok(Some(Session {
        room_id: connected.room_id,
        player_id: connected.player_id,
        session_token: token.to_owned(),
        outbound: rx,
    }))
}

async fn run_session(outbox: &mut Outbox<'_>, mut session: Session) -> Result<(), HexdeckError> {
    let conn = outbox.conn;
    let conn_id = conn.id();
    let (room_id, player_id) = (session.room_id, session.player_id);
    tracing::info!(%conn_id, %room_id, %player_id, "session attached");

    let result = loop {
        tokio::select! {
            outbound = session.outbound.recv() => match outbound {
                Some(Outbound::Game(event)) => {
                    if let Err(e) = outbox.send(Payload::Game(event)).await {
                        break Err(e);
                    }
                }
                Some(Outbound::System(msg)) => {
                    if let Err(e) = outbox.system(msg).await {
                        break Err(e);
                    }
                }
                Some(Outbound::Close) | None => break Ok(()),
            },
            frame = conn.recv() => match frame {
                Ok(Some(data)) => match handle_frame(outbox, &session, &data).await {
                    Ok(Flow::Close) => break Ok(()),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(None) => break Ok(()),
                Err(e) => break Err(e.into()),
            },
        }
    };

    let state = outbox.state;
    state.notifier.release(player_id, conn_id);
    state.game.disconnect(room_id, player_id, conn_id);
    result
}

async fn handle_frame(
    outbox: &mut Outbox<'_>,
    session: &Session,
    data: &[u8],
) -> Result<Flow, HexdeckError> {
    let Some(envelope) = decode(outbox, data) else {
        return Ok(Flow::Continue);
    };
    let game = &outbox.state.game;

    match envelope.payload {
        Payload::Game(event) => {
            if let Err(e) = game.handle_event(session.room_id, session.player_id, event) {
                outbox
                    .send(Payload::Game(ServerEvent::Status(e.to_status())))
                    .await?;
            }
        }

        Payload::System(SystemMessage::LeaveRoom) => {
            // The room detaches us; the resulting close arrives on the channel.
            if let Err(e) = game.leave_room(&session.session_token) {
                outbox.status(e.to_status()).await?;
            }
        }

        Payload::System(SystemMessage::Disconnect { reason }) => {
            tracing::debug!(player_id = %session.player_id, %reason, "client disconnected");
            return Ok(Flow::Close);
        }

        Payload::System(
            msg @ (SystemMessage::Handshake { .. }
            | SystemMessage::CreateRoom { .. }
            | SystemMessage::JoinRoom { .. }),
        ) => {
            tracing::debug!(player_id = %session.player_id, ?msg, "already attached, ignoring");
        }

        Payload::System(other) => answer_lookup(outbox, other).await?,
    }
    Ok(Flow::Continue)
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Answers the requests that are valid with or without a session.
async fn answer_lookup(outbox: &mut Outbox<'_>, msg: SystemMessage) -> Result<(), HexdeckError> {
    let game = &outbox.state.game;
    let reply = match msg {
        SystemMessage::Heartbeat { client_time } => SystemMessage::HeartbeatAck {
            client_time,
            server_time: outbox.state.uptime_ms(),
        },
        SystemMessage::CheckJoinCode { join_code } => {
            let valid = game.check_join_code(&join_code);
            SystemMessage::JoinCodeChecked { join_code, valid }
        }
        SystemMessage::CheckSession { session_token } => SystemMessage::SessionChecked {
            valid: game.check_session(&session_token),
        },
        SystemMessage::GetStats => {
            let stats = game.stats();
            SystemMessage::Stats {
                total_games_played: stats.total_games_played,
                running_games: stats.running_games,
                online_player_count: stats.online_player_count,
            }
        }
        other => {
            tracing::debug!(msg = ?other, "ignoring unexpected system message");
            return Ok(());
        }
    };
    outbox.system(reply).await
}

/// Decodes a client frame. Undecodable frames are logged and dropped.
fn decode(outbox: &Outbox<'_>, data: &[u8]) -> Option<Inbound> {
    match outbox.state.codec.decode(data) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            tracing::debug!(conn_id = %outbox.conn.id(), error = %e, "failed to decode envelope");
            None
        }
    }
}
