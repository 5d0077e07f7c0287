//! Configuration for exchange behavior.

use std::time::Duration;

/// Tunables for the exchange engine's liveness verification.
///
/// Liveness detection is a heuristic: a slow consumer can miss the deadline
/// and be discarded even though it was alive, and a consumer can die right
/// after acknowledging. Widen `probe_timeout` or raise `probe_attempts` when
/// consumers are expected to be slow to respond.
#[derive(Clone, Debug)]
pub struct ExchangeConfig {
    /// How long a probed waiter has to acknowledge before the round is
    /// counted against it.
    pub probe_timeout: Duration,

    /// Probe rounds per waiter before it is presumed dead and discarded.
    /// Values below 1 are treated as 1.
    pub probe_attempts: u32,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(300),
            probe_attempts: 1,
        }
    }
}

impl ExchangeConfig {
    /// Override the probe deadline.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Override the number of probe rounds per waiter.
    pub fn with_probe_attempts(mut self, attempts: u32) -> Self {
        self.probe_attempts = attempts;
        self
    }
}
