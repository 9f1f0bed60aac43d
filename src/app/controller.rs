use std::sync::Arc;

use log::{info, warn};

use crate::app::adaptive::AdaptiveController;
use crate::app::display::Display;
use crate::app::monitor;
use crate::app::settings::{Intervals, SettingsPersister};
use crate::app::shutdown::Shutdown;
use crate::app::state::{AddOutcome, RemoveOutcome, SharedState};
use crate::config::{ClientConfig, ConfigStore, Settings, MIN_REFRESH_INTERVAL_SECS};
use crate::fetch::{
    AssetId, BatchPriceClient, HttpTransport, PriceCache, RateLimitCounter, RetryPolicy,
    RetryingFetcher, SymbolResolver, Throttle,
};
use crate::symbols::{display_name, display_symbol, lookup_id};
use crate::ui::{Notifier, Presenter};

/// Watch-lists longer than this get a performance warning.
pub const WATCHLIST_WARNING_THRESHOLD: usize = 8;

/// Everything needed to assemble a [`TickerController`].
pub struct TickerDeps {
    pub config: ClientConfig,
    pub store: ConfigStore,
    pub settings: Settings,
    pub transport: Arc<dyn HttpTransport>,
    pub presenter: Arc<dyn Presenter>,
    pub notifier: Arc<dyn Notifier>,
    pub shutdown: Shutdown,
}

/// Command surface used by the prompt and the background loops.
///
/// Each command updates [`SharedState`] first and performs persistence, rendering and
/// notification afterwards, with no state lock held.
pub struct TickerController {
    config: ClientConfig,
    state: Arc<SharedState>,
    intervals: Arc<Intervals>,
    persister: Arc<SettingsPersister>,
    counter: Arc<RateLimitCounter>,
    fetcher: Arc<RetryingFetcher>,
    client: BatchPriceClient,
    resolver: SymbolResolver,
    display: Display,
    notifier: Arc<dyn Notifier>,
    shutdown: Shutdown,
}

impl TickerController {
    pub fn assemble(deps: TickerDeps) -> Arc<Self> {
        let TickerDeps {
            config,
            store,
            settings,
            transport,
            presenter,
            notifier,
            shutdown,
        } = deps;

        let state = Arc::new(SharedState::new(settings.watchlist));
        let intervals = Arc::new(Intervals::new(
            settings.refresh_interval,
            settings.cycle_interval,
        ));
        let persister = Arc::new(SettingsPersister::new(
            store,
            Arc::clone(&state),
            Arc::clone(&intervals),
        ));
        let adaptive = Arc::new(AdaptiveController::new(
            Arc::clone(&intervals),
            Arc::clone(&persister),
            Arc::clone(&notifier),
        ));

        let counter = Arc::new(RateLimitCounter::new());
        let fetcher = Arc::new(
            RetryingFetcher::new(
                transport,
                Arc::new(Throttle::from_config(&config)),
                RetryPolicy::from_config(&config),
                Arc::clone(&counter),
            )
            .with_listener(adaptive),
        );
        let client = BatchPriceClient::new(
            Arc::clone(&fetcher),
            Arc::new(PriceCache::new(config.cache_ttl)),
            config.api_base.clone(),
        );
        let resolver = SymbolResolver::new(Arc::clone(&fetcher), config.api_base.clone());

        Arc::new(Self {
            config,
            state,
            intervals,
            persister,
            counter,
            fetcher,
            client,
            resolver,
            display: Display::new(presenter),
            notifier,
            shutdown,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn intervals(&self) -> &Arc<Intervals> {
        &self.intervals
    }

    pub fn client(&self) -> &BatchPriceClient {
        &self.client
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn rate_limit_counter(&self) -> &Arc<RateLimitCounter> {
        &self.counter
    }

    pub fn current_settings(&self) -> Settings {
        self.persister.current()
    }

    pub fn render(&self) {
        self.display.refresh(&self.state);
    }

    fn notify(&self, title: &str, message: &str) {
        self.notifier.notify(title, message);
    }

    /// Add an asset id to the watch-list.
    pub fn add(&self, id: &str) -> AddOutcome {
        self.add_labeled(id, None)
    }

    fn add_labeled(&self, id: &str, label: Option<&str>) -> AddOutcome {
        let id = id.trim();
        let name = label
            .map(str::to_string)
            .unwrap_or_else(|| display_name(id));

        let outcome = self.state.add(id);
        match outcome {
            AddOutcome::Added { len } => {
                info!("Added {id} to the watch-list ({len} assets)");
                if len > WATCHLIST_WARNING_THRESHOLD {
                    self.notify(
                        "Performance Warning",
                        &format!(
                            "Monitoring {len} coins. Consider longer refresh intervals."
                        ),
                    );
                }
                self.persister.persist();
                self.render();
                self.notify(
                    "Coin Added",
                    &format!("{name} has been added to your watchlist"),
                );
            }
            AddOutcome::AlreadyPresent => {
                self.notify(
                    "Coin Already Added",
                    &format!("{name} is already in your watchlist"),
                );
            }
        }
        outcome
    }

    /// Resolve a ticker symbol and add the matching asset. `None` when nothing matched.
    pub async fn add_by_symbol(&self, symbol: &str) -> Option<AddOutcome> {
        let label = symbol.trim().to_uppercase();
        match self.resolver.resolve(symbol).await {
            Some(id) => Some(self.add_labeled(&id, Some(&label))),
            None => {
                warn!("No asset found for symbol {label}");
                self.notify(
                    "Coin Not Found",
                    &format!("Could not find a coin with symbol {label}"),
                );
                None
            }
        }
    }

    /// Watched asset matching `target` as an id, a known symbol or a display symbol.
    pub fn find_watched(&self, target: &str) -> Option<AssetId> {
        let target = target.trim();
        let watchlist = self.state.watchlist();
        if watchlist.iter().any(|watched| watched == target) {
            return Some(target.to_string());
        }

        let wanted = target.to_lowercase();
        if watchlist.contains(&wanted) {
            return Some(wanted);
        }
        if let Some(id) = lookup_id(&wanted) {
            if watchlist.iter().any(|watched| watched == id) {
                return Some(id.to_string());
            }
        }
        let upper = wanted.to_uppercase();
        watchlist
            .into_iter()
            .find(|watched| display_symbol(watched) == upper)
    }

    pub fn remove(&self, id: &str) -> RemoveOutcome {
        let outcome = self.state.remove(id);
        if let RemoveOutcome::Removed { len } = outcome {
            info!("Removed {id} from the watch-list ({len} assets left)");
            self.client.cache().remove(id);
            self.persister.persist();
            self.render();
            self.notify(
                "Coin Removed",
                &format!("{} has been removed from your watchlist", display_symbol(id)),
            );
        }
        outcome
    }

    pub fn remove_all(&self) {
        self.state.clear();
        self.client.cache().clear();
        info!("Watch-list cleared");
        self.persister.persist();
        self.render();
        self.notify(
            "All Coins Removed",
            "All coins have been removed from your watchlist",
        );
    }

    /// Set the refresh interval (floored at one minute) and reset the rate-limit count.
    pub fn set_refresh_interval(&self, secs: u64) -> u64 {
        let secs = if secs < MIN_REFRESH_INTERVAL_SECS {
            self.notify(
                "Minimum Interval",
                &format!(
                    "Minimum refresh interval is {MIN_REFRESH_INTERVAL_SECS} seconds to prevent rate limiting"
                ),
            );
            MIN_REFRESH_INTERVAL_SECS
        } else {
            secs
        };

        self.intervals.set_refresh_secs(secs);
        self.counter.reset();
        self.persister.persist();
        self.notify(
            "Refresh Interval Updated",
            &format!("Refresh interval set to {secs} seconds"),
        );
        secs
    }

    pub fn set_cycle_interval(&self, secs: u64) -> u64 {
        self.intervals.set_cycle_secs(secs);
        let secs = self.intervals.cycle_secs();
        self.persister.persist();
        self.notify(
            "Coin Cycling Updated",
            &format!("Coin switching interval set to {secs} seconds"),
        );
        secs
    }

    /// Show the next asset now. Returns false when there is nothing to switch to.
    pub fn next_asset(&self) -> bool {
        if self.state.advance_cursor() {
            self.render();
            self.notify("Switched Coin", "Moved to next coin manually");
            true
        } else {
            self.notify("Cannot Switch", "Need multiple coins to switch");
            false
        }
    }

    /// Run one fetch cycle now unless a request went out within the cooldown.
    pub async fn manual_refresh(&self) -> bool {
        let cooldown = self.config.manual_refresh_cooldown;
        if let Some(since) = self.fetcher.throttle().since_last_call() {
            if since < cooldown {
                let remaining = (cooldown - since).as_secs_f64().round();
                self.notify(
                    "Rate Limit Protection",
                    &format!("Please wait {remaining:.0} seconds before manual refresh"),
                );
                return false;
            }
        }

        monitor::refresh_once(self).await;
        self.notify("Manual Refresh", "Prices updated manually");
        true
    }

    /// Pick up intervals edited in the config file. Silent, and leaves the rate-limit
    /// count alone.
    pub fn apply_settings(&self, settings: &Settings) {
        let refresh = settings.refresh_interval.max(MIN_REFRESH_INTERVAL_SECS);
        if refresh != self.intervals.refresh_secs() {
            info!("Config reload: refresh interval {refresh}s");
            self.intervals.set_refresh_secs(refresh);
        }
        if settings.cycle_interval != self.intervals.cycle_secs() {
            self.intervals.set_cycle_secs(settings.cycle_interval);
            info!(
                "Config reload: cycle interval {}s",
                self.intervals.cycle_secs()
            );
        }
    }
}
