use std::ops::ControlFlow;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use stables_live_store::{
    BalanceLiveStore, BalanceSource, Balances, EventBus, HorseLiveStore, HorseSource, HorseStatus,
    HorsesData, HttpTransport, LiveSource, LiveStore, Snapshot, Stable, StableLiveStore,
    StableSource, StoreEvent, StoreEventKind, Transport, VisibilityController,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::commands::{parse_line, Command, HELP};
use crate::config::Config;

/// Store cycles at info, HTTP client internals only when they warn.
const DEFAULT_LOG_FILTER: &str = "warn,stables_live_store=info,stables_watcher=info";

/// Installs the subscriber. Logs go to stderr so `status` output on stdout
/// stays readable; the library's `log` records arrive through `tracing-log`.
pub fn init_tracing() {
    let format = std::env::var("STABLES_LOG_FORMAT").ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    let registry = tracing_subscriber::registry().with(log_filter(rust_log.as_deref()));

    if json_logs(format.as_deref()) {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn json_logs(format: Option<&str>) -> bool {
    format.is_some_and(|format| format.trim().eq_ignore_ascii_case("json"))
}

/// The three live stores a player view needs.
pub struct Stores {
    pub horses: HorseLiveStore,
    pub balances: BalanceLiveStore,
    pub stable: StableLiveStore,
}

impl Stores {
    /// Builds every store over one shared transport, event bus and
    /// visibility source. Nothing is fetched until [`start`](Self::start).
    pub fn build(
        config: &Config,
        transport: Arc<dyn Transport>,
        events: &EventBus,
        visibility: &VisibilityController,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            horses: build_store(
                HorseSource,
                config,
                transport.clone(),
                events,
                visibility,
                describe_horses,
            )?,
            balances: build_store(
                BalanceSource,
                config,
                transport.clone(),
                events,
                visibility,
                describe_balances,
            )?,
            stable: build_store(
                StableSource,
                config,
                transport,
                events,
                visibility,
                describe_stable,
            )?,
        })
    }

    pub fn start(&self) {
        self.horses.start();
        self.balances.start();
        self.stable.start();
    }

    pub fn refresh_soon(&self) {
        self.horses.refresh_soon();
        self.balances.refresh_soon();
        self.stable.refresh_soon();
    }

    pub fn destroy(&self) {
        self.horses.destroy();
        self.balances.destroy();
        self.stable.destroy();
    }

    pub fn status_lines(&self) -> Vec<String> {
        vec![
            format!("horses: {}", describe_horses(&self.horses.snapshot())),
            format!("balances: {}", describe_balances(&self.balances.snapshot())),
            format!("stable: {}", describe_stable(&self.stable.snapshot())),
        ]
    }
}

fn build_store<S: LiveSource>(
    source: S,
    config: &Config,
    transport: Arc<dyn Transport>,
    events: &EventBus,
    visibility: &VisibilityController,
    summarize: fn(&Snapshot<S::Data>) -> String,
) -> anyhow::Result<LiveStore<S>> {
    let name = source.name();
    let store_config = config.store_config(source.default_config());
    let store = LiveStore::builder(source, transport)
        .config(store_config)
        .events(events.clone())
        .visibility(visibility.subscribe())
        .build()
        .with_context(|| format!("Invalid configuration for the {} store", name))?;

    store.subscribe(move |snapshot| {
        debug!(store = name, loading = snapshot.loading, "{}", summarize(snapshot));
    });
    Ok(store)
}

fn describe<T>(snapshot: &Snapshot<T>, body: impl FnOnce(&T) -> String) -> String {
    match (snapshot.is_loaded(), &snapshot.error) {
        (true, None) => body(&snapshot.data),
        (true, Some(error)) => format!("{} (stale: {})", body(&snapshot.data), error),
        (false, Some(error)) => format!("unavailable ({})", error),
        (false, None) if snapshot.loading => "loading".to_string(),
        (false, None) => "not loaded".to_string(),
    }
}

pub fn describe_horses(snapshot: &Snapshot<HorsesData>) -> String {
    describe(snapshot, |data| {
        let racing = data
            .horses
            .iter()
            .filter(|horse| horse.status == HorseStatus::Racing)
            .count();
        let mut line = format!("{} horses, {} racing", data.horses.len(), racing);
        if let Some(at) = data.next_energy_recovery {
            line.push_str(&format!(", next energy recovery at {}", at.format("%H:%M:%S")));
        }
        line
    })
}

pub fn describe_balances(snapshot: &Snapshot<Balances>) -> String {
    describe(snapshot, |data| {
        format!(
            "phorse {}, wron {}, medals {}",
            data.phorse, data.wron, data.medals
        )
    })
}

pub fn describe_stable(snapshot: &Snapshot<Option<Stable>>) -> String {
    describe(snapshot, |data| match data {
        None => "no stable".to_string(),
        Some(stable) => {
            let mut line = format!(
                "{} level {}, {}/{} horses",
                stable.name, stable.level, stable.horse_count, stable.capacity
            );
            if stable.is_upgrading(Utc::now()) {
                line.push_str(", upgrading");
            }
            line
        }
    })
}

/// Applies one command. Returns `Break` when the watcher should exit.
pub fn handle(
    command: Command,
    stores: &Stores,
    visibility: &VisibilityController,
) -> ControlFlow<()> {
    match command {
        Command::Refresh => {
            info!("Refresh requested");
            stores.refresh_soon();
        }
        Command::Hide => {
            info!("Hiding view, polling paused");
            visibility.hide();
        }
        Command::Show => {
            info!("Showing view");
            visibility.show();
        }
        Command::Status => {
            for line in stores.status_lines() {
                println!("{}", line);
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}

async fn log_events(mut receiver: broadcast::Receiver<StoreEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => match event.kind {
                StoreEventKind::Failed { message, backoff } => {
                    warn!(store = event.store, "Fetch failed: {} (retrying in {:?})", message, backoff)
                }
                StoreEventKind::Updated { changed: false } => {
                    debug!(store = event.store, "Not modified")
                }
                kind => info!(store = event.store, "{:?}", kind),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event log lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Runs the watcher until `quit` or Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::with_timeout(&config.api_url, config.request_timeout)
            .context("Failed to set up the HTTP transport")?,
    );
    let events = EventBus::default();
    let visibility = VisibilityController::default();
    let stores = Stores::build(&config, transport, &events, &visibility)?;
    let event_log = tokio::spawn(log_events(events.subscribe()));

    info!("Watching {}", config.api_url);
    stores.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match parse_line(&line) {
                    Some(Ok(command)) => {
                        if handle(command, &stores, &visibility).is_break() {
                            break;
                        }
                    }
                    Some(Err(error)) => println!("{}", error),
                    None => {}
                },
                None => {
                    debug!("stdin closed, waiting for Ctrl-C");
                    stdin_open = false;
                }
            },
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
        }
    }

    stores.destroy();
    event_log.abort();
    info!("Watcher stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stables_live_store::SnapshotStore;

    #[test]
    fn test_log_filter_defaults_to_crate_targets() {
        let filter = log_filter(None).to_string().to_lowercase();
        assert!(filter.contains("stables_live_store=info"), "{}", filter);
        assert!(filter.contains("stables_watcher=info"), "{}", filter);

        assert_eq!(log_filter(Some("debug")).to_string().to_lowercase(), "debug");
        let fallback = log_filter(Some("stables_watcher=verbose"))
            .to_string()
            .to_lowercase();
        assert!(fallback.contains("stables_live_store=info"), "{}", fallback);
    }

    #[test]
    fn test_json_logs_only_when_asked() {
        assert!(json_logs(Some("json")));
        assert!(json_logs(Some(" JSON ")));
        assert!(!json_logs(Some("text")));
        assert!(!json_logs(None));
    }

    #[test]
    fn test_describe_unloaded_states() {
        let store = SnapshotStore::new(Balances::default());
        assert_eq!(describe_balances(&store.current()), "not loaded");

        store.set_loading(true);
        assert_eq!(describe_balances(&store.current()), "loading");

        store.set_error(Some("Network error: refused".to_string()));
        assert_eq!(
            describe_balances(&store.current()),
            "unavailable (Network error: refused)"
        );
    }

    #[test]
    fn test_describe_stale_data() {
        let store = SnapshotStore::new(None::<Stable>);
        store.set_data(None);
        assert_eq!(describe_stable(&store.current()), "no stable");

        store.set_error(Some("timeout".to_string()));
        assert_eq!(describe_stable(&store.current()), "no stable (stale: timeout)");
    }
}
