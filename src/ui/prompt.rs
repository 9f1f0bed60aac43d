
use log::info;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::signal;

use crate::app::TickerController;
use crate::error::{Context, Result};
use crate::symbols::display_symbol;

use super::{parse_command, Command, HELP_TEXT};

/// What the prompt should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptFlow {
    Continue,
    Quit,
}

/// Read commands from stdin until `quit`, end of input or Ctrl-C.
pub async fn run_prompt(ticker: &TickerController) -> Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read user input")?,
            _ = signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
        };
        let Some(line) = line else {
            return Ok(());
        };

        match parse_command(&line) {
            Ok(Some(command)) => {
                if execute(ticker, command).await == PromptFlow::Quit {
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(err) => println!("{err}"),
        }
    }
}

pub async fn execute(ticker: &TickerController, command: Command) -> PromptFlow {
    match command {
        Command::Add(symbol) => {
            ticker.add_by_symbol(&symbol).await;
        }
        Command::AddId(id) => {
            ticker.add(&id);
        }
        Command::Remove(target) => match ticker.find_watched(&target) {
            Some(id) => {
                ticker.remove(&id);
            }
            None => println!("{target} is not in your watchlist"),
        },
        Command::Clear => ticker.remove_all(),
        Command::List => print!("{}", watchlist_report(ticker)),
        Command::Next => {
            ticker.next_asset();
        }
        Command::Refresh => {
            ticker.manual_refresh().await;
        }
        Command::Interval(secs) => {
            ticker.set_refresh_interval(secs);
        }
        Command::Cycle(secs) => {
            ticker.set_cycle_interval(secs);
        }
        Command::Help => println!("{HELP_TEXT}"),
        Command::Quit => return PromptFlow::Quit,
    }
    PromptFlow::Continue
}

/// Watch-list with the latest prices, the current selection marked with `>`.
pub fn watchlist_report(ticker: &TickerController) -> String {
    let state = ticker.state();
    let intervals = ticker.intervals();
    let snapshot = state.snapshot();
    let selected = state.selection().map(|selection| selection.index);

    let mut report = String::new();
    let watchlist = state.watchlist();
    if watchlist.is_empty() {
        report.push_str("Watch-list is empty\n");
    }
    for (index, id) in watchlist.iter().enumerate() {
        let marker = if Some(index) == selected { '>' } else { ' ' };
        let price = snapshot
            .get(id)
            .map(|price| {
                format!(
                    "{} {:+.2}%",
                    crate::app::display::format_price(price.current_price),
                    price.change_percent
                )
            })
            .unwrap_or_else(|| "-".to_string());
        report.push_str(&format!(
            "{marker} {:<6} {:<28} {price}\n",
            display_symbol(id),
            id
        ));
    }
    report.push_str(&format!(
        "Refresh every {}s, switch every {}s\n",
        intervals.refresh_secs(),
        intervals.cycle_secs()
    ));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::controller::testing::harness;
    use crate::fetch::PriceInfo;

    #[tokio::test]
    async fn commands_drive_the_controller() {
        let h = harness(&["bitcoin"]);

        execute(&h.ticker, Command::Add("eth".to_string())).await;
        execute(&h.ticker, Command::Cycle(6)).await;
        execute(&h.ticker, Command::Remove("BTC".to_string())).await;

        assert_eq!(h.ticker.state().watchlist(), vec!["ethereum".to_string()]);
        assert_eq!(h.ticker.intervals().cycle_secs(), 6);
        assert_eq!(
            execute(&h.ticker, Command::Quit).await,
            PromptFlow::Quit
        );
    }

    #[test]
    fn report_marks_selection_and_prices() {
        let h = harness(&["bitcoin", "solana"]);
        h.ticker.state().replace_snapshot(
            [("bitcoin".to_string(), PriceInfo::from_quote(50_000.0, 2.0))]
                .into_iter()
                .collect(),
        );

        let report = watchlist_report(&h.ticker);
        let lines: Vec<&str> = report.lines().collect();

        assert!(lines[0].starts_with("> BTC"));
        assert!(lines[0].ends_with("$50000 +2.00%"));
        assert!(lines[1].starts_with("  SOL"));
        assert!(lines[1].ends_with('-'));
        assert_eq!(lines[2], "Refresh every 90s, switch every 4s");
    }
}
