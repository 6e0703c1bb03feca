//! The task that owns a live store's timer, in-flight cycle and poll state.
//!
//! Everything that mutates poll state happens here, on one task, so no two
//! cycles of the same store can overlap. Public handles talk to the driver
//! through an unbounded command channel.

use std::future::pending;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, error, warn};
use rand::rngs::StdRng;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use super::{LiveSource, StoreMetrics};
use crate::errors::{ErrorClass, LiveStoreError};
use crate::events::{EventBus, StoreEvent, StoreEventKind};
use crate::fetch::{ConditionalFetcher, Transport, ValidatorCache};
use crate::scheduler::PollPolicy;
use crate::snapshot::{SnapshotPatch, SnapshotStore};
use crate::visibility::Visibility;

#[derive(Debug)]
pub(super) enum Command {
    Start,
    RefreshSoon(Duration),
}

pub(super) struct CycleOutput<T> {
    data: Option<T>,
    validators: ValidatorCache,
}

pub(super) type CycleResult<T> = Result<CycleOutput<T>, LiveStoreError>;

pub(super) struct InFlight<T> {
    cycle: u64,
    future: BoxFuture<'static, CycleResult<T>>,
}

enum Event<T> {
    Command(Command),
    Visibility(Option<Visibility>),
    Completed(u64, CycleResult<T>),
    Timer,
}

pub(super) struct Driver<S: LiveSource> {
    pub(super) source: Arc<S>,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) snapshot: SnapshotStore<S::Data>,
    pub(super) policy: PollPolicy,
    pub(super) commands: mpsc::UnboundedReceiver<Command>,
    pub(super) visibility: Option<watch::Receiver<Visibility>>,
    pub(super) events: Option<EventBus>,
    pub(super) metrics: Arc<Mutex<StoreMetrics>>,
    pub(super) rng: StdRng,
    pub(super) hidden: bool,
    pub(super) validators: ValidatorCache,
    pub(super) started: bool,
    pub(super) pending_refresh: bool,
    pub(super) deadline: Option<Instant>,
    pub(super) in_flight: Option<InFlight<S::Data>>,
    pub(super) last_cycle: u64,
}

impl<S: LiveSource> Driver<S> {
    pub(super) async fn run(mut self) {
        debug!("{}: driver running (hidden: {})", self.name(), self.hidden);

        loop {
            let deadline = self.deadline;
            let event = tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(command) => Event::Command(command),
                    None => break,
                },
                visibility = next_visibility(&mut self.visibility) => Event::Visibility(visibility),
                (cycle, result) = poll_in_flight(&mut self.in_flight) => Event::Completed(cycle, result),
                () = sleep_until_deadline(deadline) => Event::Timer,
            };

            match event {
                Event::Command(Command::Start) => self.on_start(),
                Event::Command(Command::RefreshSoon(delay)) => self.on_refresh_soon(delay),
                Event::Visibility(Some(visibility)) => self.on_visibility(visibility),
                Event::Visibility(None) => {
                    debug!("{}: visibility source closed", self.name());
                    self.visibility = None;
                }
                Event::Completed(cycle, result) => self.on_completed(cycle, result),
                Event::Timer => self.begin_cycle(),
            }
        }

        debug!("{}: driver stopped", self.name());
    }

    fn name(&self) -> &'static str {
        self.source.name()
    }

    fn on_start(&mut self) {
        self.started = true;
        self.publish(StoreEventKind::Started);
        if self.hidden {
            debug!("{}: started while hidden, waiting for visibility", self.name());
            return;
        }
        self.fetch_now();
    }

    fn on_refresh_soon(&mut self, delay: Duration) {
        self.started = true;
        if self.hidden {
            debug!("{}: refresh ignored while hidden", self.name());
            return;
        }
        if self.in_flight.is_some() {
            debug!("{}: refresh deferred until the current cycle ends", self.name());
            self.pending_refresh = true;
        } else {
            self.schedule(delay);
        }
    }

    fn on_visibility(&mut self, visibility: Visibility) {
        match visibility {
            Visibility::Hidden if !self.hidden => {
                self.hidden = true;
                self.deadline = None;
                debug!("{}: hidden, polling paused", self.name());
                self.publish(StoreEventKind::Hidden);
            }
            Visibility::Visible if self.hidden => {
                self.hidden = false;
                debug!("{}: visible again", self.name());
                self.publish(StoreEventKind::Woken);
                if self.started {
                    self.fetch_now();
                }
            }
            _ => {}
        }
    }

    /// Fetches immediately, superseding an in-flight cycle on the spot even
    /// if its result is already ready.
    fn fetch_now(&mut self) {
        if self.in_flight.is_some() {
            self.update_metrics(|m| m.last_scheduled_delay = Some(Duration::ZERO));
            self.begin_cycle();
        } else {
            self.schedule(Duration::ZERO);
        }
    }

    fn begin_cycle(&mut self) {
        self.deadline = None;
        if let Some(previous) = self.in_flight.take() {
            debug!("{}: cycle {} superseded", self.name(), previous.cycle);
            self.update_metrics(|m| m.cycles_cancelled += 1);
        }

        self.pending_refresh = false;
        self.last_cycle += 1;
        let cycle = self.last_cycle;

        self.snapshot.set_loading(true);
        self.update_metrics(|m| m.cycles_started += 1);
        debug!("{}: cycle {} started", self.name(), cycle);

        let future = self.cycle_future();
        self.in_flight = Some(InFlight { cycle, future });
    }

    fn cycle_future(&self) -> BoxFuture<'static, CycleResult<S::Data>> {
        let source = Arc::clone(&self.source);
        let transport = Arc::clone(&self.transport);
        let known = self.validators.clone();
        let current = self.snapshot.current().data;

        async move {
            let mut fetcher = ConditionalFetcher::new(transport, known);
            let data = source.fetch(&mut fetcher, &current).await?;
            Ok(CycleOutput {
                data,
                validators: fetcher.into_staged(),
            })
        }
        .boxed()
    }

    fn on_completed(&mut self, cycle: u64, result: CycleResult<S::Data>) {
        self.in_flight = None;

        match result {
            Ok(output) => self.commit(cycle, output),
            Err(error) if error.is_cancellation() => {
                // No newer cycle owns `loading`; data, error and backoff stay.
                debug!("{}: cycle {} cancelled by transport", self.name(), cycle);
                self.snapshot.set_loading(false);
                self.update_metrics(|m| m.cycles_cancelled += 1);
            }
            Err(error) => self.fail(cycle, error),
        }

        self.schedule_next();
    }

    fn commit(&mut self, cycle: u64, output: CycleOutput<S::Data>) {
        self.validators.merge(output.validators);
        self.policy.on_success();

        let changed = output.data.is_some();
        let mut patch = SnapshotPatch::new().loading(false).error(None);
        if let Some(data) = output.data {
            patch = patch.data(data);
        }
        self.snapshot.apply(patch);

        self.update_metrics(|m| {
            m.cycles_succeeded += 1;
            if !changed {
                m.cycles_not_modified += 1;
            }
            m.consecutive_failures = 0;
            m.backoff = Duration::ZERO;
        });
        debug!("{}: cycle {} committed (changed: {})", self.name(), cycle, changed);
        self.publish(StoreEventKind::Updated { changed });
    }

    fn fail(&mut self, cycle: u64, error: LiveStoreError) {
        let backoff = self.policy.on_failure();
        let consecutive = self.policy.backoff().consecutive_failures();
        let message = error.to_string();

        match error.error_class() {
            ErrorClass::Terminal => error!(
                "{}: cycle {} failed: {} (attempt {}, backing off {:?})",
                self.name(),
                cycle,
                message,
                consecutive,
                backoff
            ),
            _ => warn!(
                "{}: cycle {} failed: {} (attempt {}, backing off {:?})",
                self.name(),
                cycle,
                message,
                consecutive,
                backoff
            ),
        }

        self.snapshot.apply(
            SnapshotPatch::new()
                .loading(false)
                .error(Some(message.clone())),
        );

        self.update_metrics(|m| {
            m.cycles_failed += 1;
            m.consecutive_failures = consecutive;
            m.backoff = backoff;
        });
        self.publish(StoreEventKind::Failed { message, backoff });
    }

    fn schedule_next(&mut self) {
        if self.hidden {
            self.deadline = None;
            return;
        }
        let delay = if std::mem::take(&mut self.pending_refresh) {
            self.policy.follow_up_delay()
        } else {
            self.policy.next_delay(&mut self.rng)
        };
        self.schedule(delay);
    }

    fn schedule(&mut self, delay: Duration) {
        self.deadline = Some(Instant::now() + delay);
        self.update_metrics(|m| m.last_scheduled_delay = Some(delay));
        if delay.is_zero() {
            debug!("{}: next cycle now", self.name());
        } else {
            debug!("{}: next cycle in {:?}", self.name(), delay);
        }
    }

    fn publish(&self, kind: StoreEventKind) {
        if let Some(events) = &self.events {
            events.publish(StoreEvent::new(self.name(), kind));
        }
    }

    fn update_metrics<F: FnOnce(&mut StoreMetrics)>(&self, f: F) {
        f(&mut lock_metrics(&self.metrics));
    }
}

pub(super) fn lock_metrics(metrics: &Mutex<StoreMetrics>) -> MutexGuard<'_, StoreMetrics> {
    metrics.lock().unwrap_or_else(|poisoned| {
        warn!("Store metrics mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

async fn next_visibility(receiver: &mut Option<watch::Receiver<Visibility>>) -> Option<Visibility> {
    match receiver {
        Some(receiver) => match receiver.changed().await {
            Ok(()) => Some(*receiver.borrow_and_update()),
            Err(_) => None,
        },
        None => pending().await,
    }
}

async fn poll_in_flight<T>(slot: &mut Option<InFlight<T>>) -> (u64, CycleResult<T>) {
    match slot {
        Some(in_flight) => {
            let result = (&mut in_flight.future).await;
            (in_flight.cycle, result)
        }
        None => pending().await,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
