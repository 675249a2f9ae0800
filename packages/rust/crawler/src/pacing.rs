//! Minimum-interval pacing between consecutive operations of one phase.

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum gap between consecutive [`Pacer::wait`] calls.
///
/// The first call never sleeps.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// The configured minimum gap.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until `interval` has passed since the previous call, then mark now.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            if !self.interval.is_zero() {
                tokio::time::sleep_until(last + self.interval).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
