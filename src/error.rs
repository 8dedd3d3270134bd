//! Domain error types.
//!
//! A `thiserror`-derived enum for errors with a clear name and source,
//! with `anyhow` used at the binary boundary.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    #[error("pseudo-terminal error: {0}")]
    Pty(String),

    #[error("failed to query host terminal size")]
    TerminalSize,

    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
