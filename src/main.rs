// src/main.rs
use anyhow::Context;
use clap::Parser;

use recorddesk::cli::{self, Cli};
use recorddesk::{logging, settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut app_settings = settings::io::load().context("Failed to load settings")?;
    cli.apply_overrides(&mut app_settings);

    cli::dispatch(cli.command, &app_settings).await
}
