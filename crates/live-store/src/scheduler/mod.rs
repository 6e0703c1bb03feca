//! When the next fetch cycle runs.
//!
//! [`LiveStoreConfig`] carries the tunables, [`PollPolicy`] and [`Backoff`]
//! hold the pure scheduling arithmetic. The async driver in `store` only asks
//! them for delays.

mod config;
mod policy;

pub use config::{
    LiveStoreConfig, BALANCES_POLL_BASE, DEFAULT_FOLLOW_UP_DELAY, DEFAULT_JITTER_RATIO,
    DEFAULT_MAX_BACKOFF, DEFAULT_MIN_BACKOFF, DEFAULT_POLL_BASE, DEFAULT_REFRESH_DELAY,
};
pub use policy::{jittered, Backoff, PollPolicy};
