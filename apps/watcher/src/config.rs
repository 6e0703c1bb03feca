use std::time::Duration;

use anyhow::Context;
use stables_live_store::fetch::DEFAULT_REQUEST_TIMEOUT;
use stables_live_store::LiveStoreConfig;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/";

pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub poll_base: Option<Duration>,
    pub jitter_ratio: Option<f64>,
    pub max_backoff: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`, so tests don't have to touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("STABLES_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let request_timeout = millis(&lookup, "STABLES_REQUEST_TIMEOUT_MS")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let poll_base = millis(&lookup, "STABLES_POLL_BASE_MS")?;
        let max_backoff = millis(&lookup, "STABLES_MAX_BACKOFF_MS")?;
        let jitter_ratio = lookup("STABLES_JITTER_RATIO")
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .with_context(|| format!("Invalid STABLES_JITTER_RATIO: {}", raw))
            })
            .transpose()?;

        Ok(Self {
            api_url,
            request_timeout,
            poll_base,
            jitter_ratio,
            max_backoff,
        })
    }

    /// Applies the overrides from the environment on top of a domain's
    /// defaults.
    pub fn store_config(&self, defaults: LiveStoreConfig) -> LiveStoreConfig {
        let mut config = defaults;
        if let Some(poll_base) = self.poll_base {
            config = config.with_poll_base(poll_base);
        }
        if let Some(jitter_ratio) = self.jitter_ratio {
            config = config.with_jitter_ratio(jitter_ratio);
        }
        if let Some(max_backoff) = self.max_backoff {
            config = config.with_max_backoff(max_backoff);
        }
        config
    }
}

fn millis<F>(lookup: &F, key: &str) -> anyhow::Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .with_context(|| format!("Invalid {}: {}", key, raw))
        })
        .transpose()
}
