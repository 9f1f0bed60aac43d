use anyhow::Result;
use clap::Parser;

use crypto_ticker::app::bootstrap;
use crypto_ticker::cli::{show_banner, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    show_banner(&cli);
    bootstrap::run(cli).await?;
    Ok(())
}
