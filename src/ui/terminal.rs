use std::io::{self, Write};

use crossterm::style::{style, Stylize};
use log::{info, warn};

use crate::utils::status_timestamp;

use super::{Notifier, Presenter};

/// Prints the ticker line and notices to stdout.
#[derive(Debug, Default)]
pub struct TerminalUi;

impl TerminalUi {
    pub fn new() -> Self {
        Self
    }

    fn write_line(&self, line: String) {
        let mut stdout = io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{line}").and_then(|_| stdout.flush()) {
            warn!("Failed to write to terminal: {err}");
        }
    }
}

impl Presenter for TerminalUi {
    fn render(&self, text: &str) {
        let stamp = style(format!("[{}]", status_timestamp())).dark_grey();
        let body = if text.contains('▲') {
            style(text).green().to_string()
        } else if text.contains('▼') {
            style(text).red().to_string()
        } else {
            text.to_string()
        };
        self.write_line(format!("{stamp} {body}"));
    }
}

impl Notifier for TerminalUi {
    fn notify(&self, title: &str, message: &str) {
        info!("{title}: {message}");
        self.write_line(format!("{} {message}", style(format!("[{title}]")).yellow().bold()));
    }
}
