//! Spreads the probes of a group evenly across the configured wait window.
//!
//! Each probe's own round trip is measured and subtracted from the per-probe
//! budget. The remaining wait is slept coarsely until close to the deadline,
//! then finished by yielding until the deadline passes, since timer sleeps
//! overshoot by several milliseconds.

use std::time::{Duration, Instant};

use crate::config::BehaviorConfig;

/// Shortest wait between two probes.
pub const MINIMUM_DELAY: Duration = Duration::from_millis(10);

/// Portion of the wait left to the fine-grained phase.
const COARSE_SLEEP_MARGIN: Duration = Duration::from_millis(16);

#[derive(Debug)]
pub struct PacingScheduler {
    per_probe: Duration,
    started: Option<Instant>,
    probe_cost: Duration,
}

impl PacingScheduler {
    pub fn new(behavior: &BehaviorConfig) -> Self {
        let per_probe = Duration::from_millis(behavior.wait_ms) / behavior.pings_per_call.max(1);
        Self {
            per_probe,
            started: None,
            probe_cost: Duration::ZERO,
        }
    }

    pub fn per_probe(&self) -> Duration {
        self.per_probe
    }

    pub fn start_interval(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn end_interval(&mut self) {
        if let Some(started) = self.started.take() {
            self.probe_cost = started.elapsed();
        }
    }

    /// Wait owed before the next probe, never below [`MINIMUM_DELAY`].
    pub fn next_delay(&self) -> Duration {
        let remaining = self.per_probe.saturating_sub(self.probe_cost);
        remaining.max(MINIMUM_DELAY)
    }

    pub async fn delay(&self) {
        let wait = self.next_delay();
        let deadline = Instant::now() + wait;

        if wait > COARSE_SLEEP_MARGIN {
            tokio::time::sleep(wait - COARSE_SLEEP_MARGIN).await;
        }
        while Instant::now() < deadline {
            tokio::task::yield_now().await;
        }
    }

    #[cfg(test)]
    fn with_probe_cost(mut self, cost: Duration) -> Self {
        self.probe_cost = cost;
        self
    }
}
