//! Live stores: snapshot store + poll scheduler + conditional fetch for one
//! data domain.
//!
//! A host builds one [`LiveStore`] per domain, subscribes, and calls
//! [`start`](LiveStore::start). The store then polls on its own until it is
//! destroyed. None of the public methods block, fail or panic; fetch failures
//! end up in the snapshot's `error` field.

mod driver;
mod metrics;
mod source;

pub use metrics::StoreMetrics;
pub use source::LiveSource;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::errors::ConfigError;
use crate::events::{EventBus, StoreEvent, StoreEventKind};
use crate::fetch::{Transport, ValidatorCache};
use crate::scheduler::{LiveStoreConfig, PollPolicy};
use crate::snapshot::{Snapshot, SnapshotStore, Subscription};
use crate::visibility::Visibility;
use driver::{lock_metrics, Command, Driver};

/// Builder for [`LiveStore`].
pub struct LiveStoreBuilder<S: LiveSource> {
    source: S,
    transport: Arc<dyn Transport>,
    config: Option<LiveStoreConfig>,
    visibility: Option<watch::Receiver<Visibility>>,
    events: Option<EventBus>,
    seed: Option<u64>,
}

impl<S: LiveSource> LiveStoreBuilder<S> {
    /// Overrides the source's default scheduling configuration.
    pub fn config(mut self, config: LiveStoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Pauses polling while the receiver reports [`Visibility::Hidden`].
    pub fn visibility(mut self, visibility: watch::Receiver<Visibility>) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Seeds the jitter source, for reproducible schedules.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration and spawns the store's driver task.
    ///
    /// The store stays idle until [`LiveStore::start`] is called.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn build(self) -> Result<LiveStore<S>, ConfigError> {
        let config = self
            .config
            .unwrap_or_else(|| self.source.default_config());
        config.validate()?;

        let name = self.source.name();
        let refresh_delay = config.refresh_delay;
        let snapshot = SnapshotStore::new(S::Data::default());
        let metrics = Arc::new(Mutex::new(StoreMetrics::default()));
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut visibility = self.visibility;
        let hidden = visibility
            .as_mut()
            .map(|receiver| receiver.borrow_and_update().is_hidden())
            .unwrap_or(false);
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let driver = Driver {
            source: Arc::new(self.source),
            transport: self.transport,
            snapshot: snapshot.clone(),
            policy: PollPolicy::new(config),
            commands: receiver,
            visibility,
            events: self.events.clone(),
            metrics: Arc::clone(&metrics),
            rng,
            hidden,
            validators: ValidatorCache::default(),
            started: false,
            pending_refresh: false,
            deadline: None,
            in_flight: None,
            last_cycle: 0,
        };
        let task = tokio::spawn(driver.run());

        Ok(LiveStore {
            name,
            snapshot,
            commands: sender,
            metrics,
            events: self.events,
            refresh_delay,
            destroyed: AtomicBool::new(false),
            task: Mutex::new(Some(task)),
        })
    }
}

/// Keeps one domain's snapshot loosely in sync with the server.
///
/// Dropping the store destroys it.
pub struct LiveStore<S: LiveSource> {
    name: &'static str,
    snapshot: SnapshotStore<S::Data>,
    commands: mpsc::UnboundedSender<Command>,
    metrics: Arc<Mutex<StoreMetrics>>,
    events: Option<EventBus>,
    refresh_delay: Duration,
    destroyed: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: LiveSource> LiveStore<S> {
    pub fn builder(source: S, transport: Arc<dyn Transport>) -> LiveStoreBuilder<S> {
        LiveStoreBuilder {
            source,
            transport,
            config: None,
            visibility: None,
            events: None,
            seed: None,
        }
    }

    /// Builds a store with the source's default configuration.
    pub fn new(source: S, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        Self::builder(source, transport).build()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fetches right away and keeps polling from then on.
    ///
    /// Calling it while a cycle is in flight cancels that cycle in favour of
    /// a fresh one. No-op once destroyed.
    pub fn start(&self) {
        self.send(Command::Start);
    }

    /// Asks for a fresh cycle after the default refresh delay.
    pub fn refresh_soon(&self) {
        self.refresh_soon_after(self.refresh_delay);
    }

    /// Asks for a fresh cycle after `delay`.
    ///
    /// Overrides the pending timer when idle. When a cycle is in flight the
    /// request is remembered and served right after that cycle ends; any
    /// number of requests made meanwhile collapse into one follow-up.
    pub fn refresh_soon_after(&self, delay: Duration) {
        self.send(Command::RefreshSoon(delay));
    }

    /// Registers `callback` and invokes it once right away with the current
    /// snapshot.
    pub fn subscribe<F>(&self, callback: F) -> Subscription<S::Data>
    where
        F: Fn(&Snapshot<S::Data>) + Send + Sync + 'static,
    {
        self.snapshot.subscribe(callback)
    }

    pub fn snapshot(&self) -> Snapshot<S::Data> {
        self.snapshot.current()
    }

    pub fn metrics(&self) -> StoreMetrics {
        lock_metrics(&self.metrics).clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Stops the store for good: aborts the in-flight request, clears the
    /// timer, detaches the visibility listener and drops all subscribers.
    ///
    /// Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
        self.snapshot.clear_subscribers();

        if let Some(events) = &self.events {
            events.publish(StoreEvent::new(self.name, StoreEventKind::Destroyed));
        }
        info!("{}: live store destroyed", self.name);
    }

    fn send(&self, command: Command) {
        if self.is_destroyed() {
            return;
        }
        // The driver only goes away on destroy, so a closed channel is
        // equivalent to the check above.
        let _ = self.commands.send(command);
    }
}

impl<S: LiveSource> Drop for LiveStore<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<S: LiveSource> std::fmt::Debug for LiveStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveStore")
            .field("name", &self.name)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
