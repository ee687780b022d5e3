//! `HexdeckServer` builder and server loop.
//!
//! Ties the layers together: transport → protocol → room. The room layer
//! owns all game state; the server only accepts sockets and hands each one
//! to its own handler task.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hexdeck_protocol::JsonCodec;
use hexdeck_room::{
    Game, InactivityTicker, JsonFileStore, MemoryStore, Notifier, RoomConfig, RoomStore,
};
use hexdeck_tick::TickConfig;
use hexdeck_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{ChannelNotifier, HexdeckError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) game: Arc<Game>,
    pub(crate) notifier: Arc<ChannelNotifier>,
    pub(crate) codec: JsonCodec,
    started: Instant,
}

impl ServerState {
    /// Milliseconds since the server was built.
    pub(crate) fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Builder for configuring and starting a HexDeck server.
///
/// # Example
///
/// ```rust,ignore
/// use hexdeck::prelude::*;
///
/// let server = HexdeckServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct HexdeckServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    tick: TickConfig,
    store: Option<Arc<dyn RoomStore>>,
}

impl HexdeckServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            room_config: RoomConfig::default(),
            tick: TickConfig::every(Duration::from_secs(1)),
            store: None,
        }
    }

    /// Applies a [`ServerConfig`]. Opens a [`JsonFileStore`] when a data
    /// directory is set.
    pub fn from_config(config: &ServerConfig) -> Result<Self, HexdeckError> {
        let mut builder = Self::new()
            .bind(&config.bind_addr())
            .tick(TickConfig::every(config.tick_period));
        if let Some(dir) = &config.data_dir {
            builder = builder.store(Arc::new(JsonFileStore::open(dir)?));
        }
        Ok(builder)
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets how often disconnected players are aged.
    pub fn tick(mut self, tick: TickConfig) -> Self {
        self.tick = tick;
        self
    }

    /// Sets the persistence backend. Defaults to a [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn RoomStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Binds the listener and assembles the game.
    pub async fn build(self) -> Result<HexdeckServer, HexdeckError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn RoomStore>);
        let notifier = Arc::new(ChannelNotifier::new());
        let game = Arc::new(Game::new(
            self.room_config,
            store,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        ));

        let state = Arc::new(ServerState {
            game,
            notifier,
            codec: JsonCodec,
            started: Instant::now(),
        });

        Ok(HexdeckServer {
            transport,
            state,
            tick: self.tick,
        })
    }
}

impl Default for HexdeckServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound HexDeck server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct HexdeckServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    tick: TickConfig,
}

impl HexdeckServer {
    pub fn builder() -> HexdeckServerBuilder {
        HexdeckServerBuilder::new()
    }

    pub fn local_addr(&self) -> Result<SocketAddr, HexdeckError> {
        Ok(self.transport.local_addr()?)
    }

    /// The game behind this server.
    pub fn game(&self) -> &Arc<Game> {
        &self.state.game
    }

    /// Runs until the process is terminated.
    pub async fn run(self) -> Result<(), HexdeckError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Restores persisted rooms, starts the inactivity sweep and accepts
    /// connections until `shutdown` resolves.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), HexdeckError> {
        let restored = self.state.game.load_rooms();
        let ticker = InactivityTicker::spawn(Arc::clone(&self.state.game), self.tick.clone());
        tracing::info!(restored, addr = ?self.transport.local_addr().ok(), "hexdeck server running");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("shutting down");
        ticker.stop().await;
        self.state.game.shutdown();
        Ok(())
    }
}
