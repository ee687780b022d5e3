//! Fixed-period tick scheduler for HexDeck background work.
//!
//! The server has no real-time simulation; the only periodic job is the
//! inactivity sweep that evicts disconnected players and reclaims empty
//! rooms. That job wants a steady cadence, a delta it can subtract from
//! countdowns, and a warning when a sweep starts eating into its period.
//!
//! ```ignore
//! let mut scheduler = TickScheduler::new(TickConfig::every(Duration::from_secs(1)));
//! loop {
//!     tokio::select! {
//!         _ = &mut shutdown => break,
//!         info = scheduler.wait_for_tick() => {
//!             game.sweep_inactive(info.dt);
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks.
    pub period: Duration,
    /// Fraction of the period (0.0 to 1.0) a tick may use before a warning
    /// is logged.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            budget_warn_threshold: 0.5,
        }
    }
}

impl TickConfig {
    /// Shortest period the scheduler accepts.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    /// A config that ticks every `period`.
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_millis() as u64,
                min_ms = Self::MIN_PERIOD.as_millis() as u64,
                "tick period below minimum, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }
}

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Time this tick accounts for. Always the configured period, so
    /// countdowns stay deterministic under a paused test clock.
    pub dt: Duration,
    /// Whole periods lost because the scheduler woke up late. Missed ticks
    /// are not replayed; the next one is due a full period from now.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fires at a fixed period on the tokio clock.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    next_tick: TokioInstant,
    tick_start: Option<Instant>,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let next_tick = TokioInstant::now() + config.period;
        debug!(period_ms = config.period.as_millis() as u64, "tick scheduler created");

        Self {
            config,
            tick_count: 0,
            next_tick,
            tick_start: None,
        }
    }

    /// Sleeps until the next tick is due.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let period = self.config.period;
        let due = self.next_tick;
        time::sleep_until(due).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(due);
        let ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_millis() as u64,
                "tick overrun, skipping ahead"
            );
        }
        self.next_tick = now + period;
        trace!(tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: period,
            ticks_skipped,
        }
    }

    /// Marks the end of the work for the current tick and warns if it used
    /// too much of the period. Returns the work time, or `None` without a
    /// preceding [`wait_for_tick`](Self::wait_for_tick).
    pub fn record_tick_end(&mut self) -> Option<Duration> {
        let start = self.tick_start.take()?;
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.config.period.as_secs_f64();

        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_millis() as u64,
                period_ms = self.config.period.as_millis() as u64,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick work approaching its period"
            );
        }
        Some(elapsed)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn period(&self) -> Duration {
        self.config.period
    }
}
