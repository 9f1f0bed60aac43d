use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};

use crate::app::TickerController;

pub const CYCLER_TICK: Duration = Duration::from_millis(100);
/// How often to recheck a watch-list that is too short to cycle.
pub const CYCLER_IDLE_POLL: Duration = Duration::from_secs(2);

/// Rotate the displayed asset every cycle interval until shutdown.
pub async fn run(ticker: Arc<TickerController>) {
    info!("Asset cycler started");
    let shutdown = ticker.shutdown().clone();

    while !shutdown.is_triggered() {
        if ticker.state().len() <= 1 {
            if !shutdown.sleep_ticks(CYCLER_IDLE_POLL, CYCLER_TICK).await {
                break;
            }
            continue;
        }

        if !shutdown
            .sleep_while(CYCLER_TICK, || ticker.intervals().cycle())
            .await
        {
            break;
        }

        let step = panic::catch_unwind(AssertUnwindSafe(|| {
            if ticker.state().advance_cursor() {
                ticker.render();
            }
        }));
        if step.is_err() {
            error!("Error in asset cycling");
            if !shutdown.sleep_ticks(CYCLER_IDLE_POLL, CYCLER_TICK).await {
                break;
            }
        }
    }
    info!("Asset cycler stopped");
}
