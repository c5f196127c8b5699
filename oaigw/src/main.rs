//! oaigw Server Entry Point

use anyhow::Context;
use clap::Parser;
use oaigw::cli::{models, serve, Cli, Commands};
use oaigw::config::GatewayConfig;
use oaigw::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init().context("failed to initialize logging")?;

    let config = GatewayConfig::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    match cli.command {
        Some(Commands::Models(args)) => models::execute(&config, &args).await?,
        Some(Commands::Serve(args)) => serve::execute(config, &args).await?,
        None => serve::execute(config, &serve::ServeArgs::from_env()).await?,
    }

    Ok(())
}
