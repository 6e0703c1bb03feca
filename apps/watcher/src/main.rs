use stables_watcher::config::Config;
use stables_watcher::{init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    run(config).await
}
