pub mod commands;
pub mod prompt;
pub mod terminal;

pub use commands::{parse_command, Command, HELP_TEXT};
pub use prompt::{run_prompt, PromptFlow};
pub use terminal::TerminalUi;

/// Sink for the one-line ticker text.
pub trait Presenter: Send + Sync {
    fn render(&self, text: &str);
}

/// Sink for short user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}
