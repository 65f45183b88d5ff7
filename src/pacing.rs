//! Pacing policies for rate-limited loops.
//!
//! Both pipelines space out their remote calls. The policy is behind a trait
//! so callers never encode sleep arithmetic themselves: the harvest loop
//! paces detail lookups and grid steps, the dispatch loop paces sends.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

/// A pause point inside a rate-limited loop.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits long enough to respect the policy, then returns.
    async fn pause(&self);
}

/// Sleeps a fixed interval on every call.
///
/// This matches the throttle the remote services were tuned against, so it
/// is the default everywhere.
pub struct FixedDelay {
    interval: Duration,
}

impl FixedDelay {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// Enforces a minimum spacing between consecutive calls.
///
/// The first call returns immediately; later calls only sleep for whatever
/// remains of the interval, so time spent working counts toward the gap.
pub struct MinInterval {
    interval: Duration,
    last: tokio::sync::Mutex<Option<Instant>>,
}

impl MinInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl Pacer for MinInterval {
    async fn pause(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last
            && let Some(remaining) = self.interval.checked_sub(prev.elapsed())
        {
            tokio::time::sleep(remaining).await;
        }
        *last = Some(Instant::now());
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_delay_zero_is_a_noop() {
        FixedDelay::new(Duration::ZERO).pause().await;
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_delay_sleeps_the_full_interval_every_call() {
        let pacer = FixedDelay::new(Duration::from_secs(1));
        let start = Instant::now();
        pacer.pause().await;
        pacer.pause().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn min_interval_first_call_returns_immediately() {
        let pacer = MinInterval::new(Duration::from_secs(5));
        let start = Instant::now();
        pacer.pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn min_interval_spaces_consecutive_calls() {
        let pacer = MinInterval::new(Duration::from_secs(5));
        let start = Instant::now();
        pacer.pause().await;
        pacer.pause().await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn min_interval_credits_time_spent_working() {
        let pacer = MinInterval::new(Duration::from_secs(5));
        pacer.pause().await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        let before = Instant::now();
        pacer.pause().await;
        assert_eq!(before.elapsed(), Duration::from_secs(2));
    }
}
