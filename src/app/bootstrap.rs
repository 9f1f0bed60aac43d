use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::signal;
use tokio::sync::watch;
use tokio::time::timeout;

use crate::app::{cycler, monitor, Shutdown, TickerController, TickerDeps};
use crate::cli::Cli;
use crate::config::{ClientConfig, ConfigStore, ConfigWatcher, Settings};
use crate::error::{AppError, Context, Result};
use crate::fetch::ReqwestTransport;
use crate::ui::{run_prompt, TerminalUi};

/// How long to wait for an in-flight request once shutdown has been requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Entry point used by `main`: wire the ticker, start the background tasks and run the prompt.
pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.api_base {
        Some(base) => ClientConfig::builtin().with_api_base(base.as_str()),
        None => ClientConfig::builtin(),
    };
    let store = ConfigStore::new(&cli.config);
    let settings = store.load();
    info!(
        "Loaded {} assets from {} (refresh {}s, cycle {}s)",
        settings.watchlist.len(),
        store.path().display(),
        settings.refresh_interval,
        settings.cycle_interval
    );

    let ui = Arc::new(TerminalUi::new());
    let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
    let shutdown = Shutdown::new();

    let ticker = TickerController::assemble(TickerDeps {
        config,
        store: store.clone(),
        settings: settings.clone(),
        transport,
        presenter: ui.clone(),
        notifier: ui,
        shutdown: shutdown.clone(),
    });
    ticker.render();

    let watcher = Arc::new(ConfigWatcher::new(store, settings));
    if let Err(err) = watcher.start_watching() {
        warn!("Config hot reload disabled: {err}");
    }
    let reload_task = tokio::spawn(follow_config(Arc::clone(&ticker), watcher.subscribe()));

    let monitor_task = tokio::spawn(monitor::run(Arc::clone(&ticker)));
    let cycler_task = tokio::spawn(cycler::run(Arc::clone(&ticker)));

    let prompt_result = if cli.no_prompt {
        signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")
            .map_err(AppError::from)
    } else {
        run_prompt(&ticker).await
    };

    info!("Shutting down...");
    shutdown.trigger();
    reload_task.abort();
    cycler_task.await?;
    match timeout(SHUTDOWN_GRACE, monitor_task).await {
        Ok(joined) => joined?,
        Err(_) => warn!("Price monitor still waiting on a request, exiting anyway"),
    }
    prompt_result
}

/// Apply interval changes made to the config file while running.
async fn follow_config(ticker: Arc<TickerController>, mut updates: watch::Receiver<Settings>) {
    while updates.changed().await.is_ok() {
        let settings = updates.borrow_and_update().clone();
        ticker.apply_settings(&settings);
    }
}
