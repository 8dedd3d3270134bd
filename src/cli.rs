//! CLI definitions.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;

/// Build clap styles consistent with the rest of the corpus's themed CLIs.
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "cmux")]
#[command(about = "A minimal terminal multiplexer with scrollback")]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Shell to run in the PTY (defaults to $SHELL, then /bin/sh)
    #[arg(long)]
    pub shell: Option<String>,

    /// Number of scrollback rows to retain
    #[arg(long)]
    pub history: Option<usize>,

    /// Path to the log file
    #[arg(long)]
    pub log: Option<String>,
}
