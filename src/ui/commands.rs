use crate::error::{AppError, Result};

pub const HELP_TEXT: &str = "\
Commands:
  add <SYMBOL>      Add an asset by ticker symbol (e.g. add btc)
  add-id <ID>       Add an asset by its API id (e.g. add-id matic-network)
  remove <ID|SYM>   Remove an asset from the watch-list
  clear             Remove every asset
  list              Show the watch-list
  next              Show the next asset now
  refresh           Fetch prices now
  interval <SECS>   Set the refresh interval (minimum 60)
  cycle <SECS>      Set how long each asset stays on screen
  help              Show this help
  quit              Exit";

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    AddId(String),
    Remove(String),
    Clear,
    List,
    Next,
    Refresh,
    Interval(u64),
    Cycle(u64),
    Help,
    Quit,
}

/// Parse a prompt line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };
    let argument = parts.next();
    if parts.next().is_some() {
        return Err(AppError::message(format!(
            "Too many arguments for `{head}`"
        )));
    }

    let command = match (head.to_lowercase().as_str(), argument) {
        ("add", Some(symbol)) => Command::Add(symbol.to_string()),
        ("add-id", Some(id)) => Command::AddId(id.to_string()),
        ("remove" | "rm", Some(target)) => Command::Remove(target.to_string()),
        ("clear", None) => Command::Clear,
        ("list" | "ls", None) => Command::List,
        ("next", None) => Command::Next,
        ("refresh", None) => Command::Refresh,
        ("interval", Some(secs)) => Command::Interval(parse_seconds(secs)?),
        ("cycle", Some(secs)) => Command::Cycle(parse_seconds(secs)?),
        ("help" | "?", None) => Command::Help,
        ("quit" | "exit", None) => Command::Quit,
        ("add" | "add-id" | "remove" | "rm" | "interval" | "cycle", None) => {
            return Err(AppError::message(format!("`{head}` needs an argument")));
        }
        ("clear" | "list" | "ls" | "next" | "refresh" | "help" | "?" | "quit" | "exit", Some(_)) => {
            return Err(AppError::message(format!("`{head}` takes no argument")));
        }
        _ => {
            return Err(AppError::message(format!(
                "Unknown command `{head}`, type `help` for the list"
            )));
        }
    };
    Ok(Some(command))
}

fn parse_seconds(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| AppError::message(format!("`{raw}` is not a whole number of seconds")))
}
