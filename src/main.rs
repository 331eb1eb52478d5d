use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use poolhunter::application::{Cli, CommandExecutor};
use poolhunter::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Load configuration: file if given, defaults otherwise
    let config = Config::load(cli.config.as_deref())?;

    CommandExecutor::execute(cli.command, config).await?;
    Ok(())
}
