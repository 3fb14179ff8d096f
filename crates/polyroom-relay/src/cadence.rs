//! Fixed-interval cadence for periodic adapters.
//!
//! A [`Cadence`] fires at a fixed interval and never queues missed ticks:
//! if the adapter falls behind (a slow capture, a busy runtime) the ticks
//! it missed are counted and dropped and the schedule restarts from now.
//!
//! ```ignore
//! let mut cadence = Cadence::new(CadenceConfig::default());
//! loop {
//!     tokio::select! {
//!         _ = cancel.cancelled() => break,
//!         info = cadence.wait_for_tick() => { /* capture and send */ }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for one adapter's cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadenceConfig {
    /// Time between ticks. Default: 100 ms.
    pub interval: Duration,
    /// Random delay (0..max) added to the first tick so adapters started
    /// together do not fire in lockstep.
    pub initial_jitter: Duration,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            interval: Self::SNAPSHOT_INTERVAL,
            initial_jitter: Duration::from_millis(5),
        }
    }
}

impl CadenceConfig {
    /// Interval used for primary and secondary snapshots.
    pub const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(100);

    /// Shortest interval accepted.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// A config with the given interval and no start jitter.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            initial_jitter: Duration::ZERO,
        }
    }

    /// Clamps out-of-range values. Called by [`Cadence::new`].
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_secs_f64() * 1000.0,
                "cadence interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info and metrics
// ---------------------------------------------------------------------------

/// Returned by [`Cadence::wait_for_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing, starting at 1.
    pub tick: u64,
    /// Ticks dropped because this one fired late.
    pub skipped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CadenceMetrics {
    pub total_ticks: u64,
    pub total_skipped: u64,
}

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

/// Drives one periodic adapter.
#[derive(Debug)]
pub struct Cadence {
    interval: Duration,
    tick_count: u64,
    next_tick: Instant,
    metrics: CadenceMetrics,
}

impl Cadence {
    pub fn new(config: CadenceConfig) -> Self {
        let config = config.validated();

        let max_jitter_us = config.initial_jitter.as_micros() as u64;
        let jitter = if max_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..max_jitter_us))
        } else {
            Duration::ZERO
        };

        debug!(
            interval_ms = config.interval.as_secs_f64() * 1000.0,
            jitter_us = jitter.as_micros() as u64,
            "cadence created"
        );

        Self {
            interval: config.interval,
            tick_count: 0,
            next_tick: Instant::now() + config.interval + jitter,
            metrics: CadenceMetrics::default(),
        }
    }

    /// A cadence with the given interval and no jitter.
    pub fn every(interval: Duration) -> Self {
        Self::new(CadenceConfig::every(interval))
    }

    /// Waits until the next tick is due.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// schedule untouched.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let due = self.next_tick;
        time::sleep_until(due).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(due);
        let skipped = (late_by.as_nanos() / self.interval.as_nanos()) as u64;
        if skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "cadence overrun, skipping ahead"
            );
        }

        // Always reschedule from now, never from the missed deadline.
        self.next_tick = now + self.interval;

        self.metrics.total_ticks += 1;
        self.metrics.total_skipped += skipped;
        trace!(tick = self.tick_count, skipped, "cadence tick");

        TickInfo {
            tick: self.tick_count,
            skipped,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn metrics(&self) -> &CadenceMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_snapshot_interval() {
        let cfg = CadenceConfig::default();
        assert_eq!(cfg.interval, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_sub_microsecond_jitter_is_ignored() {
        let start = Instant::now();
        let mut cadence = Cadence::new(CadenceConfig {
            interval: Duration::from_millis(100),
            initial_jitter: Duration::from_nanos(500),
        });

        cadence.wait_for_tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(100));
        assert_eq!(cadence.tick_count(), 1);
    }

    #[test]
    fn test_validated_clamps_zero_interval() {
        let cfg = CadenceConfig::every(Duration::ZERO).validated();
        assert_eq!(cfg.interval, CadenceConfig::MIN_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_fires_after_one_interval() {
        let start = Instant::now();
        let mut cadence = Cadence::every(Duration::from_millis(100));

        let info = cadence.wait_for_tick().await;

        assert_eq!(info.tick, 1);
        assert_eq!(info.skipped, 0);
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_consumer_skips_missed_ticks() {
        let mut cadence = Cadence::every(Duration::from_millis(100));
        cadence.wait_for_tick().await;

        // Hold the adapter for 350 ms: the next deadline was 100 ms away,
        // so the tick fires 250 ms late and two ticks are dropped.
        time::advance(Duration::from_millis(350)).await;
        let info = cadence.wait_for_tick().await;

        assert_eq!(info.tick, 2);
        assert_eq!(info.skipped, 2);
        assert_eq!(cadence.metrics().total_skipped, 2);

        // Schedule restarts from now instead of bursting.
        let before = Instant::now();
        cadence.wait_for_tick().await;
        assert_eq!(before.elapsed(), Duration::from_millis(100));
    }
}
