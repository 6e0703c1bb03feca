use std::time::Duration;

use rand::Rng;

use super::LiveStoreConfig;

/// Returns `base` moved by a uniform random amount within `+/- base * ratio`.
pub fn jittered<R: Rng + ?Sized>(base: Duration, ratio: f64, rng: &mut R) -> Duration {
    if ratio <= 0.0 || base.is_zero() {
        return base;
    }
    let spread = base.as_secs_f64() * ratio.min(1.0);
    let offset = rng.gen_range(-spread..=spread);
    Duration::from_secs_f64((base.as_secs_f64() + offset).max(0.0))
}

/// Accumulated failure delay for one store.
///
/// Doubles from `max(min, current)` on every failure, capped at `max`, and
/// drops back to zero on the first success.
#[derive(Clone, Debug)]
pub struct Backoff {
    current: Duration,
    min: Duration,
    max: Duration,
    consecutive_failures: u32,
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            current: Duration::ZERO,
            min,
            max,
            consecutive_failures: 0,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Records a failed cycle and returns the new backoff.
    pub fn record_failure(&mut self) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let doubled = self.current.max(self.min).saturating_mul(2);
        self.current = doubled.min(self.max);
        self.current
    }

    pub fn record_success(&mut self) {
        self.current = Duration::ZERO;
        self.consecutive_failures = 0;
    }
}

/// Scheduling decisions for one store.
#[derive(Clone, Debug)]
pub struct PollPolicy {
    config: LiveStoreConfig,
    backoff: Backoff,
}

impl PollPolicy {
    pub fn new(config: LiveStoreConfig) -> Self {
        let backoff = Backoff::new(config.min_backoff, config.max_backoff);
        Self { config, backoff }
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn on_success(&mut self) {
        self.backoff.record_success();
    }

    pub fn on_failure(&mut self) -> Duration {
        self.backoff.record_failure()
    }

    /// Delay until the next regular cycle.
    ///
    /// While failures are accumulating the store waits out the backoff
    /// exactly; otherwise it waits the jittered base interval.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.backoff.current().is_zero() {
            jittered(self.config.poll_base, self.config.jitter_ratio, rng)
        } else {
            self.backoff.current()
        }
    }

    pub fn follow_up_delay(&self) -> Duration {
        self.config.follow_up_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn policy(base_ms: u64, jitter: f64, max_backoff_ms: u64) -> PollPolicy {
        PollPolicy::new(
            LiveStoreConfig::default()
                .with_poll_base(Duration::from_millis(base_ms))
                .with_jitter_ratio(jitter)
                .with_max_backoff(Duration::from_millis(max_backoff_ms)),
        )
    }

    #[test]
    fn test_zero_jitter_is_exact() {
        let mut rng = StdRng::seed_from_u64(7);
        let policy = policy(1000, 0.0, 8000);
        for _ in 0..10 {
            assert_eq!(policy.next_delay(&mut rng), Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_jitter_stays_within_ratio() {
        let mut rng = StdRng::seed_from_u64(42);
        let base = Duration::from_secs(20);
        let mut saw_below = false;
        let mut saw_above = false;
        for _ in 0..500 {
            let delay = jittered(base, 0.3, &mut rng);
            assert!(delay >= Duration::from_secs(14), "{:?}", delay);
            assert!(delay <= Duration::from_secs(26), "{:?}", delay);
            saw_below |= delay < base;
            saw_above |= delay > base;
        }
        assert!(saw_below && saw_above);
    }

    #[test]
    fn test_backoff_doubles_from_floor_and_caps() {
        let mut backoff = Backoff::new(Duration::from_millis(1000), Duration::from_millis(8000));
        assert_eq!(backoff.record_failure(), Duration::from_millis(2000));
        assert_eq!(backoff.record_failure(), Duration::from_millis(4000));
        assert_eq!(backoff.record_failure(), Duration::from_millis(8000));
        assert_eq!(backoff.record_failure(), Duration::from_millis(8000));
        assert_eq!(backoff.consecutive_failures(), 4);

        backoff.record_success();
        assert_eq!(backoff.current(), Duration::ZERO);
        assert_eq!(backoff.consecutive_failures(), 0);
    }

    #[test]
    fn test_failure_delays_are_non_decreasing_then_reset() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut policy = policy(20_000, 0.3, 120_000);

        let mut previous = Duration::ZERO;
        for _ in 0..3 {
            policy.on_failure();
            let delay = policy.next_delay(&mut rng);
            assert!(delay >= previous);
            assert!(delay <= Duration::from_secs(120));
            previous = delay;
        }

        policy.on_success();
        let delay = policy.next_delay(&mut rng);
        assert!(delay >= Duration::from_secs(14));
        assert!(delay <= Duration::from_secs(26));
        assert_eq!(policy.backoff().current(), Duration::ZERO);
    }

    #[test]
    fn test_backoff_respects_low_cap() {
        let mut policy = policy(1000, 0.0, 1500);
        assert_eq!(policy.on_failure(), Duration::from_millis(1500));
        assert_eq!(policy.on_failure(), Duration::from_millis(1500));
    }
}
