//! Background task driving the inactivity sweep.

use std::sync::Arc;

use hexdeck_tick::{TickConfig, TickScheduler};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::Game;

/// Runs [`Game::sweep_inactive`] once per tick until stopped.
#[derive(Debug)]
pub struct InactivityTicker {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl InactivityTicker {
    /// Starts the sweep loop on the current tokio runtime.
    pub fn spawn(game: Arc<Game>, config: TickConfig) -> Self {
        let (shutdown, mut stop) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut scheduler = TickScheduler::new(config);
            tracing::info!(period_ms = scheduler.period().as_millis() as u64, "inactivity ticker started");
            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    info = scheduler.wait_for_tick() => {
                        let report = game.sweep_inactive(info.dt);
                        if !report.is_empty() {
                            tracing::debug!(
                                tick = info.tick,
                                evicted = report.evicted.len(),
                                closed = report.closed.len(),
                                "inactivity sweep"
                            );
                        }
                        scheduler.record_tick_end();
                    }
                }
            }
            tracing::info!(ticks = scheduler.tick_count(), "inactivity ticker stopped");
        });
        Self {
            shutdown: Some(shutdown),
            handle,
        }
    }

    /// Stops the loop and waits for the current sweep to finish.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            tracing::warn!(error = %e, "inactivity ticker task failed");
        }
    }
}
