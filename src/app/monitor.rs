use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use log::{error, info, warn};

use crate::app::display::{ERROR_TEXT, NO_ASSETS_TEXT};
use crate::app::TickerController;

pub const MONITOR_TICK: Duration = Duration::from_secs(1);

/// Refresh interval stretched for long watch-lists: x1.5 above ten assets, x1.2 above five.
pub fn effective_interval_secs(base_secs: u64, asset_count: usize) -> u64 {
    if asset_count > 10 {
        base_secs * 3 / 2
    } else if asset_count > 5 {
        base_secs * 6 / 5
    } else {
        base_secs
    }
}

/// One fetch cycle: read the watch-list, fetch, replace the snapshot and redraw.
/// Returns how many assets got a price.
pub async fn refresh_once(ticker: &TickerController) -> usize {
    let ids = ticker.state().watchlist();
    if ids.is_empty() {
        ticker.display().show(NO_ASSETS_TEXT);
        return 0;
    }

    let snapshot = ticker.client().fetch_prices(&ids).await;
    let fetched = snapshot.len();
    let failed: Vec<&str> = ids
        .iter()
        .filter(|id| !snapshot.contains_key(*id))
        .map(String::as_str)
        .collect();

    ticker.state().replace_snapshot(snapshot);

    info!("Price update: {fetched}/{} assets successful", ids.len());
    if !failed.is_empty() {
        warn!("Failed to get prices for: {}", failed.join(", "));
    }

    ticker.render();
    fetched
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Poll prices until shutdown. A panicking cycle is logged and followed by a fixed backoff.
pub async fn run(ticker: Arc<TickerController>) {
    info!("Price monitor started");
    let shutdown = ticker.shutdown().clone();

    while !shutdown.is_triggered() {
        let cycle = AssertUnwindSafe(refresh_once(&ticker)).catch_unwind().await;

        let completed = match cycle {
            Ok(_) => {
                let count = ticker.state().len();
                info!(
                    "Next refresh in {}s (monitoring {count} assets)",
                    effective_interval_secs(ticker.intervals().refresh_secs(), count)
                );
                shutdown
                    .sleep_while(MONITOR_TICK, || {
                        Duration::from_secs(effective_interval_secs(
                            ticker.intervals().refresh_secs(),
                            ticker.state().len(),
                        ))
                    })
                    .await
            }
            Err(payload) => {
                error!("Error in price monitor: {}", panic_message(payload.as_ref()));
                ticker.display().show(ERROR_TEXT);
                shutdown
                    .sleep_ticks(ticker.config().monitor_error_backoff, MONITOR_TICK)
                    .await
            }
        };

        if !completed {
            break;
        }
    }
    info!("Price monitor stopped");
}
