//! Quorum terminal client.
//!
//! Drives the authentication flow and the request side of the widget
//! engine from the command line.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use quorum_config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let config = Config::load_or_default(cli.config.as_deref())?;

	let subscriber = tracing_subscriber::fmt()
		.with_max_level(cli.log_level(config.log_level))
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	tracing::debug!(api = %config.api_url, channel = %config.channel_url, "configuration loaded");
	commands::run(cli.command, &config).await
}
