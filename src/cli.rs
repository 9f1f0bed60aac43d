use std::path::PathBuf;

use clap::Parser;

use crate::ui::HELP_TEXT;

#[derive(Debug, Parser)]
#[command(name = "crypto-ticker")]
#[command(about = "A terminal ticker for cryptocurrency prices with rate-limit protection")]
#[command(version)]
pub struct Cli {
    /// Settings file holding the watch-list and intervals
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Base URL of a CoinGecko-compatible API
    #[arg(long)]
    pub api_base: Option<String>,

    /// Only show the ticker; stop with Ctrl-C
    #[arg(long)]
    pub no_prompt: bool,
}

pub fn show_banner(cli: &Cli) {
    println!("# ------------------------------------------------------------------------ #");
    println!("# Crypto Ticker");
    println!("# Settings file: {}", cli.config.display());
    println!("# Started: {}", crate::utils::current_human_timestamp());
    println!("# ------------------------------------------------------------------------ #");
    if !cli.no_prompt {
        println!("{HELP_TEXT}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["crypto-ticker"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(cli.api_base.is_none());
        assert!(!cli.no_prompt);
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "crypto-ticker",
            "-c",
            "/tmp/ticker.json",
            "--api-base",
            "http://localhost:8080/api/v3",
            "--no-prompt",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/ticker.json"));
        assert_eq!(cli.api_base.as_deref(), Some("http://localhost:8080/api/v3"));
        assert!(cli.no_prompt);
    }
}
