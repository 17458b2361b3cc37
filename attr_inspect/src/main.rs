//! CLI entrypoint for `attr-inspect`.

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use attr_inspect::cli::Cli;
use attr_inspect::commands;
use attr_inspect::config::{SettingsOverrides, load_settings};
use attr_inspect::error::Result;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    run().map_err(color_eyre::eyre::Report::from)
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let overrides = SettingsOverrides {
        pretty: cli.compact.then_some(false),
    };
    let settings = load_settings(cli.config.as_deref(), &overrides)?;
    let mut stdout = io::stdout().lock();
    commands::run(&cli.command, &settings, &mut stdout)
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(io::stderr)
        .init();
}
