//! Stables Live Store Crate
//!
//! Keeps client-side game state (horses, balances, stable) loosely
//! consistent with the game API without a push channel.
//!
//! # Overview
//!
//! Each data domain gets one [`LiveStore`]. A store:
//! - Polls on a jittered interval and backs off exponentially on failure
//! - Sends `If-None-Match` per sub-resource and treats 304 as "no change"
//! - Runs at most one fetch cycle at a time; a newer cycle cancels an older one
//! - Pauses while its host is hidden and checks freshness on wake-up
//! - Keeps the last known good data when a cycle fails
//!
//! # Architecture
//!
//! ```text
//! +-------------+  commands   +------------------+
//! |  LiveStore  | ----------> |  driver task     |  (timer, in-flight cycle)
//! +-------------+             +------------------+
//!        |                      |             |
//!        v                      v             v
//! +-------------+      +--------------+  +-------------+
//! |SnapshotStore| <--- |  LiveSource  |  |  PollPolicy |  (jitter, backoff)
//! +-------------+      +--------------+  +-------------+
//!        |                      |
//!        v                      v
//!   subscribers      +--------------------+
//!                    | ConditionalFetcher |  (ETag per sub-resource)
//!                    +--------------------+
//!                               |
//!                               v
//!                    +--------------------+
//!                    |     Transport      |  (reqwest)
//!                    +--------------------+
//! ```
//!
//! # Core Types
//!
//! - [`LiveStore`] - One polling store per domain
//! - [`LiveSource`] - What a domain fetches and how it folds sub-resources
//! - [`Snapshot`] - Data plus `loading` / `error` flags
//! - [`LiveStoreConfig`] - Poll interval, jitter and backoff tunables
//! - [`Transport`] / [`HttpTransport`] - Outbound GET requests
//! - [`EventBus`] - Explicit publish/subscribe channel for store events

pub mod errors;
pub mod events;
pub mod fetch;
pub mod models;
pub mod scheduler;
pub mod snapshot;
pub mod sources;
pub mod store;
pub mod visibility;

pub use errors::{ConfigError, ErrorClass, LiveStoreError};
pub use events::{EventBus, StoreEvent, StoreEventKind};
pub use fetch::{
    Conditional, ConditionalFetcher, HttpTransport, Transport, TransportResponse, ValidatorCache,
};
pub use models::{Balances, Horse, HorseStatus, HorsesData, Stable};
pub use scheduler::LiveStoreConfig;
pub use snapshot::{Snapshot, SnapshotPatch, SnapshotStore, Subscription};
pub use sources::{BalanceSource, HorseSource, StableSource};
pub use store::{LiveSource, LiveStore, LiveStoreBuilder, StoreMetrics};
pub use visibility::{Visibility, VisibilityController};

/// Live store for the player's horses.
pub type HorseLiveStore = LiveStore<HorseSource>;

/// Live store for the player's balances.
pub type BalanceLiveStore = LiveStore<BalanceSource>;

/// Live store for the player's stable.
pub type StableLiveStore = LiveStore<StableSource>;
