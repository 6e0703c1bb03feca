use std::time::Duration;

/// Counters for a single live store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreMetrics {
    pub cycles_started: u64,
    /// Cycles that committed, including not-modified ones.
    pub cycles_succeeded: u64,
    /// Successful cycles where nothing changed.
    pub cycles_not_modified: u64,
    pub cycles_failed: u64,
    /// Cycles superseded by a newer one.
    pub cycles_cancelled: u64,
    pub consecutive_failures: u32,
    pub backoff: Duration,
    /// The most recent delay handed to the timer.
    pub last_scheduled_delay: Option<Duration>,
}
