//! A minimal terminal multiplexer: hosts a child shell on a pseudo-terminal,
//! emulates its output, and renders it with scrollback.

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod host;
pub mod logging;
pub mod pty;
pub mod screen;
pub mod utils;

pub use config::Config;
pub use console::Console;
pub use error::MuxError;
pub use screen::ScreenManager;
