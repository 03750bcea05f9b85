//! Minimum-interval pacing for outbound requests.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

/// Enforces a minimum wall-clock interval between consecutive requests.
///
/// The pacer holds at most one reference instant. Without one,
/// [`Pacer::wait_if_needed`] returns immediately.
#[derive(Debug, Clone)]
pub struct Pacer {
    min_interval: Duration,
    reference: Option<Instant>,
}

impl Pacer {
    /// Create an idle pacer with the given interval in milliseconds.
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval: Duration::from_millis(min_interval_ms),
            reference: None,
        }
    }

    /// Create a pacer whose reference instant is already recorded.
    pub fn started(min_interval_ms: u64) -> Self {
        let mut pacer = Self::new(min_interval_ms);
        pacer.start();
        pacer
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn is_started(&self) -> bool {
        self.reference.is_some()
    }

    /// Record the current instant as the pacing reference.
    pub fn start(&mut self) {
        self.reference = Some(Instant::now());
    }

    /// Sleep for whatever is left of the interval since the reference.
    ///
    /// Afterwards the reference is re-recorded when `reset` is true and
    /// cleared otherwise.
    pub async fn wait_if_needed(&mut self, reset: bool) {
        let Some(reference) = self.reference else {
            return;
        };

        let remaining = self.min_interval.saturating_sub(reference.elapsed());
        if !remaining.is_zero() {
            debug!(remaining_ms = remaining.as_millis() as u64, "Pacing next request");
            sleep(remaining).await;
        }

        if reset {
            self.start();
        } else {
            self.reference = None;
        }
    }
}
