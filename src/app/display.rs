use std::sync::{Arc, Mutex, PoisonError};

use crate::fetch::PriceInfo;
use crate::symbols::display_symbol;
use crate::ui::Presenter;

use super::SharedState;

pub const LOADING_TEXT: &str = "Loading...";
pub const NO_ASSETS_TEXT: &str = "No Coins";
pub const ERROR_TEXT: &str = "Error";

/// `$` plus a precision that keeps small prices readable.
pub fn format_price(price: f64) -> String {
    if price < 0.01 {
        format!("${price:.6}")
    } else if price < 1.0 {
        format!("${price:.4}")
    } else if price < 100.0 {
        format!("${price:.2}")
    } else {
        format!("${price:.0}")
    }
}

fn single_asset_line(symbol: &str, price: &PriceInfo) -> String {
    let change = if price.change_percent.abs() >= 0.1 {
        format!(" ({:+.1}%)", price.change_percent)
    } else {
        String::new()
    };
    format!(
        "{symbol}: {} {}{change}",
        format_price(price.current_price),
        price.trend.arrow()
    )
}

fn cycling_line(symbol: &str, price: &PriceInfo) -> String {
    format!(
        "{} {symbol}: {}",
        price.trend.arrow(),
        format_price(price.current_price)
    )
}

/// Ticker text for the current selection.
pub fn status_text(state: &SharedState) -> String {
    let Some(selection) = state.selection() else {
        return NO_ASSETS_TEXT.to_string();
    };
    let snapshot = state.snapshot();
    if snapshot.is_empty() {
        return LOADING_TEXT.to_string();
    }

    let symbol = display_symbol(&selection.id);
    match snapshot.get(&selection.id) {
        None => format!("{symbol}: {LOADING_TEXT}"),
        Some(price) if selection.len == 1 => single_asset_line(&symbol, price),
        Some(price) => cycling_line(&symbol, price),
    }
}

/// Pushes ticker text to the presenter, skipping repeats of the last line.
pub struct Display {
    presenter: Arc<dyn Presenter>,
    last: Mutex<Option<String>>,
}

impl Display {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            presenter,
            last: Mutex::new(None),
        }
    }

    /// Recompute the text from `state` and show it. Returns whether anything was rendered.
    pub fn refresh(&self, state: &SharedState) -> bool {
        self.show(&status_text(state))
    }

    pub fn show(&self, text: &str) -> bool {
        {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if last.as_deref() == Some(text) {
                return false;
            }
            *last = Some(text.to_string());
        }
        self.presenter.render(text);
        true
    }

    pub fn last_text(&self) -> Option<String> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PriceSnapshot;
    use crate::ui::testing::RecordingUi;

    fn state_with(ids: &[&str], prices: &[(&str, f64, f64)]) -> SharedState {
        let state = SharedState::new(ids.iter().map(|id| id.to_string()).collect());
        let snapshot: PriceSnapshot = prices
            .iter()
            .map(|(id, price, change)| (id.to_string(), PriceInfo::from_quote(*price, *change)))
            .collect();
        state.replace_snapshot(snapshot);
        state
    }

    #[test]
    fn formats_price_tiers() {
        assert_eq!(format_price(0.001234), "$0.001234");
        assert_eq!(format_price(0.5), "$0.5000");
        assert_eq!(format_price(42.123), "$42.12");
        assert_eq!(format_price(50_000.4), "$50000");
    }

    #[test]
    fn single_asset_shows_significant_change() {
        let state = state_with(&["bitcoin"], &[("bitcoin", 50_000.0, 2.04)]);
        assert_eq!(status_text(&state), "BTC: $50000 ▲ (+2.0%)");

        let flat = state_with(&["bitcoin"], &[("bitcoin", 50_000.0, 0.04)]);
        assert_eq!(status_text(&flat), "BTC: $50000 ▲");
    }

    #[test]
    fn multiple_assets_lead_with_the_arrow() {
        let state = state_with(
            &["bitcoin", "ethereum"],
            &[("bitcoin", 50_000.0, 2.0), ("ethereum", 3_000.0, -1.5)],
        );
        assert_eq!(status_text(&state), "▲ BTC: $50000");

        state.advance_cursor();
        assert_eq!(status_text(&state), "▼ ETH: $3000");
    }

    #[test]
    fn placeholder_states() {
        let empty = SharedState::new(Vec::new());
        assert_eq!(status_text(&empty), NO_ASSETS_TEXT);

        let nothing_yet = state_with(&["bitcoin"], &[]);
        assert_eq!(status_text(&nothing_yet), LOADING_TEXT);

        let partial = state_with(&["bitcoin", "solana"], &[("bitcoin", 1.0, 0.0)]);
        partial.advance_cursor();
        assert_eq!(status_text(&partial), "SOL: Loading...");
    }

    #[test]
    fn repeated_text_is_rendered_once() {
        let ui = Arc::new(RecordingUi::default());
        let display = Display::new(ui.clone());

        assert!(display.show("BTC: $1"));
        assert!(!display.show("BTC: $1"));
        assert!(display.show("BTC: $2"));

        assert_eq!(ui.renders(), vec!["BTC: $1", "BTC: $2"]);
        assert_eq!(display.last_text().as_deref(), Some("BTC: $2"));
    }
}
