use std::collections::HashMap;
use std::time::Duration;

use stables_live_store::LiveStoreConfig;
use stables_watcher::config::{Config, DEFAULT_API_URL};

fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_when_nothing_is_set() {
    let config = config_from(&[]).unwrap();

    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert!(config.poll_base.is_none());
    assert!(config.jitter_ratio.is_none());
    assert!(config.max_backoff.is_none());
    assert_eq!(
        config.store_config(LiveStoreConfig::default()),
        LiveStoreConfig::default()
    );
}

#[test]
fn overrides_apply_on_top_of_domain_defaults() {
    let config = config_from(&[
        ("STABLES_API_URL", " https://game.example.com/api "),
        ("STABLES_POLL_BASE_MS", "5000"),
        ("STABLES_JITTER_RATIO", "0.1"),
        ("STABLES_MAX_BACKOFF_MS", "60000"),
        ("STABLES_REQUEST_TIMEOUT_MS", "2500"),
    ])
    .unwrap();

    assert_eq!(config.api_url, "https://game.example.com/api");
    assert_eq!(config.request_timeout, Duration::from_millis(2500));

    let store = config.store_config(LiveStoreConfig::default());
    assert_eq!(store.poll_base, Duration::from_secs(5));
    assert_eq!(store.jitter_ratio, 0.1);
    assert_eq!(store.max_backoff, Duration::from_secs(60));
    assert_eq!(store.refresh_delay, LiveStoreConfig::default().refresh_delay);
}

#[test]
fn blank_url_falls_back_to_default() {
    let config = config_from(&[("STABLES_API_URL", "   ")]).unwrap();
    assert_eq!(config.api_url, DEFAULT_API_URL);
}

#[test]
fn malformed_numbers_are_rejected() {
    let error = config_from(&[("STABLES_POLL_BASE_MS", "soon")])
        .err()
        .unwrap();
    assert!(error.to_string().contains("STABLES_POLL_BASE_MS"));

    let error = config_from(&[("STABLES_JITTER_RATIO", "lots")])
        .err()
        .unwrap();
    assert!(error.to_string().contains("STABLES_JITTER_RATIO"));
}
