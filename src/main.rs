mod cli;
mod config;
mod digest;
mod error;
mod output;
mod providers;
mod report;
mod server;
mod summarizer;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use env_logger::Env;
use log::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = cli::load_env_file(None);
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Some(path) = env_file {
        debug!("Loaded environment from {}", path.display());
    }

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting cidigest");
    cli.execute().await?;

    Ok(())
}
