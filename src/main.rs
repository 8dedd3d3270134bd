//! Entry point.

use anyhow::Result;
use clap::Parser;

use consolemux::cli::Cli;
use consolemux::config::Config;
use consolemux::{logging, ScreenManager};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    let history_size = cli.history.unwrap_or(config.history_size);
    let log_path = cli
        .log
        .map(|p| Config::expand_path(&p))
        .unwrap_or_else(|| config.log_path());
    let shell = cli.shell.or(config.shell);

    let _guard = logging::init(&log_path)?;

    let mut manager = ScreenManager::new(shell.as_deref(), history_size)?;
    manager.run()
}
