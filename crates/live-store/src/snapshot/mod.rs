//! Last-known-good state for one data domain, with subscriber fan-out.
//!
//! A [`SnapshotStore`] holds the current [`Snapshot`] and a list of callbacks.
//! Updates are shallow merges described by a [`SnapshotPatch`]; subscribers
//! are notified synchronously, in subscription order, and only when a tracked
//! field actually changed. The store performs no I/O.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Utc};
use log::warn;

/// The latest known value for a domain plus its status flags.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<T> {
    /// Domain payload. Kept across failed cycles.
    pub data: T,
    /// True while a fetch cycle is in flight.
    pub loading: bool,
    /// Message of the last failed cycle, cleared by the next successful one.
    pub error: Option<String>,
    /// When `data` was last replaced. `None` until the first successful load.
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T: Default> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: None,
            updated_at: None,
        }
    }
}

impl<T> Snapshot<T> {
    /// Whether `data` has been loaded from the server at least once.
    pub fn is_loaded(&self) -> bool {
        self.updated_at.is_some()
    }
}

/// A shallow update to a snapshot. Fields left as `None` are untouched.
#[derive(Debug)]
pub struct SnapshotPatch<T> {
    data: Option<T>,
    loading: Option<bool>,
    error: Option<Option<String>>,
}

impl<T> Default for SnapshotPatch<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: None,
            error: None,
        }
    }
}

impl<T> SnapshotPatch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }
}

type Callback<T> = Arc<dyn Fn(&Snapshot<T>) + Send + Sync>;

struct Inner<T> {
    snapshot: Snapshot<T>,
    subscribers: Vec<(u64, Callback<T>)>,
    next_id: u64,
}

/// Holds the snapshot for one domain and fans changes out to subscribers.
///
/// Cloning is cheap and yields a handle to the same state.
pub struct SnapshotStore<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for SnapshotStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SnapshotStore<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                snapshot: Snapshot {
                    data: initial,
                    loading: false,
                    error: None,
                    updated_at: None,
                },
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Lock the inner state, recovering from poison.
    ///
    /// Subscribers run outside the lock, so poisoning can only come from a
    /// panic in this module's own bookkeeping.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        lock_inner(&self.inner)
    }

    /// Returns a clone of the current snapshot.
    pub fn current(&self) -> Snapshot<T> {
        self.lock().snapshot.clone()
    }

    /// Registers `callback` and invokes it once, right away, with the current
    /// snapshot.
    pub fn subscribe<F>(&self, callback: F) -> Subscription<T>
    where
        F: Fn(&Snapshot<T>) + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        let (id, snapshot) = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, Arc::clone(&callback)));
            (id, inner.snapshot.clone())
        };

        invoke(&callback, &snapshot);

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Applies `patch` and notifies subscribers if anything changed.
    ///
    /// Replacing `data` always counts as a change on the very first load, so
    /// the initial empty payload is not mistaken for "nothing arrived".
    /// Returns whether subscribers were notified.
    pub fn apply(&self, patch: SnapshotPatch<T>) -> bool {
        let (snapshot, subscribers) = {
            let mut inner = self.lock();
            let mut changed = false;

            if let Some(data) = patch.data {
                if inner.snapshot.updated_at.is_none() || inner.snapshot.data != data {
                    inner.snapshot.data = data;
                    inner.snapshot.updated_at = Some(Utc::now());
                    changed = true;
                }
            }
            if let Some(loading) = patch.loading {
                if inner.snapshot.loading != loading {
                    inner.snapshot.loading = loading;
                    changed = true;
                }
            }
            if let Some(error) = patch.error {
                if inner.snapshot.error != error {
                    inner.snapshot.error = error;
                    changed = true;
                }
            }

            if !changed {
                return false;
            }

            let subscribers: Vec<Callback<T>> = inner
                .subscribers
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect();
            (inner.snapshot.clone(), subscribers)
        };

        for callback in &subscribers {
            invoke(callback, &snapshot);
        }
        true
    }

    pub fn set_data(&self, data: T) -> bool {
        self.apply(SnapshotPatch::new().data(data))
    }

    pub fn set_loading(&self, loading: bool) -> bool {
        self.apply(SnapshotPatch::new().loading(loading))
    }

    pub fn set_error(&self, error: Option<String>) -> bool {
        self.apply(SnapshotPatch::new().error(error))
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Drops every subscriber callback.
    pub fn clear_subscribers(&self) {
        self.lock().subscribers.clear();
    }
}

fn lock_inner<T>(inner: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    inner.lock().unwrap_or_else(|poisoned| {
        warn!("Snapshot store mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

fn invoke<T>(callback: &Callback<T>, snapshot: &Snapshot<T>) {
    if catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
        warn!("Snapshot subscriber panicked; continuing with remaining subscribers");
    }
}

/// Handle returned by [`SnapshotStore::subscribe`].
///
/// Dropping the handle keeps the callback registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription<T> {
    id: u64,
    inner: Weak<Mutex<Inner<T>>>,
}

impl<T> Subscription<T> {
    /// Removes the callback. A no-op once the store is gone.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            lock_inner(&inner)
                .subscribers
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
