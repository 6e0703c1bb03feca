use std::time::Duration;

use crate::errors::ConfigError;

/// Default interval between successful polls.
pub const DEFAULT_POLL_BASE: Duration = Duration::from_secs(20);

/// Balances change less often than horses and are polled a bit slower.
pub const BALANCES_POLL_BASE: Duration = Duration::from_secs(22);

/// Default jitter: +/- 30% of the base interval.
pub const DEFAULT_JITTER_RATIO: f64 = 0.30;

/// Ceiling for the failure backoff.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Floor the backoff doubles from.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_millis(1000);

/// Default delay for `refresh_soon`.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(250);

/// Delay of the follow-up cycle for a refresh requested mid-flight.
pub const DEFAULT_FOLLOW_UP_DELAY: Duration = Duration::from_millis(150);

/// Scheduling configuration for one live store.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveStoreConfig {
    /// Interval between polls after a successful cycle, before jitter.
    pub poll_base: Duration,
    /// Fraction of `poll_base` added or removed at random (0.0..=1.0).
    pub jitter_ratio: f64,
    /// The backoff never exceeds this.
    pub max_backoff: Duration,
    /// The first failure backs off to twice this.
    pub min_backoff: Duration,
    /// Delay used by `refresh_soon` when the caller gives none.
    pub refresh_delay: Duration,
    /// Delay of the follow-up cycle when a refresh was requested mid-flight.
    pub follow_up_delay: Duration,
}

impl Default for LiveStoreConfig {
    fn default() -> Self {
        Self {
            poll_base: DEFAULT_POLL_BASE,
            jitter_ratio: DEFAULT_JITTER_RATIO,
            max_backoff: DEFAULT_MAX_BACKOFF,
            min_backoff: DEFAULT_MIN_BACKOFF,
            refresh_delay: DEFAULT_REFRESH_DELAY,
            follow_up_delay: DEFAULT_FOLLOW_UP_DELAY,
        }
    }
}

impl LiveStoreConfig {
    pub fn with_poll_base(mut self, poll_base: Duration) -> Self {
        self.poll_base = poll_base;
        self
    }

    pub fn with_jitter_ratio(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = jitter_ratio;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_base.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if !(0.0..=1.0).contains(&self.jitter_ratio) {
            return Err(ConfigError::InvalidJitterRatio(self.jitter_ratio));
        }
        if self.max_backoff < self.min_backoff {
            return Err(ConfigError::BackoffRange {
                min: self.min_backoff,
                max: self.max_backoff,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LiveStoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_base, Duration::from_secs(20));
        assert_eq!(config.max_backoff, Duration::from_secs(120));
    }

    #[test]
    fn test_rejects_bad_jitter() {
        let config = LiveStoreConfig::default().with_jitter_ratio(1.5);
        assert_eq!(config.validate(), Err(ConfigError::InvalidJitterRatio(1.5)));

        let config = LiveStoreConfig::default().with_jitter_ratio(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_interval_and_inverted_backoff() {
        let config = LiveStoreConfig::default().with_poll_base(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));

        let config = LiveStoreConfig::default().with_max_backoff(Duration::from_millis(10));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BackoffRange { .. })
        ));
    }
}
