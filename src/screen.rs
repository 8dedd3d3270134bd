//! Screen manager: composes the console, the host terminal, and the child
//! PTY, and drives the single-threaded cooperative main loop.
//!
//! Polls host input and PTY output in a fixed-sleep loop rather than
//! blocking on either, so resize events and shutdown signals are never
//! starved by a busy child process.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::console::Console;
use crate::host::{Host, HostEvent};
use crate::pty::Pty;
use crate::utils::process_guard::ProcessGuard;

/// How long to sleep between idle iterations of the main loop.
const IDLE_SLEEP: Duration = Duration::from_millis(5);

pub struct ScreenManager {
    console: Console,
    pty: Pty,
    host: Host,
    guard: ProcessGuard,
}

impl ScreenManager {
    pub fn new(shell: Option<&str>, history_size: usize) -> Result<Self> {
        let host = Host::new()?;
        let (cols, rows) = host.size()?;
        let console = Console::new(cols as usize, rows as usize, history_size);
        let pty = Pty::spawn(shell, cols, rows)?;
        let guard = ProcessGuard::new();
        guard.register_signal_handlers();
        Ok(Self {
            console,
            pty,
            host,
            guard,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        info!("entering main loop");
        loop {
            if self.guard.is_interrupted() {
                debug!("interrupted, shutting down");
                break;
            }

            if let Some(event) = self.host.read_available()? {
                match event {
                    HostEvent::Bytes(bytes) => {
                        if self.handle_keystroke(&bytes)? {
                            break;
                        }
                    }
                    HostEvent::Resize(cols, rows) => {
                        self.console.resize(cols as usize, rows as usize);
                        self.pty.resize(cols, rows)?;
                    }
                }
            }

            match self.pty.try_read() {
                Some(chunk) if !chunk.is_empty() => {
                    let pty = &mut self.pty;
                    let host = &mut self.host;
                    self.console.write(
                        &chunk,
                        &mut |reply| {
                            let _ = pty.write(reply);
                        },
                        &mut || {
                            let _ = host.beep();
                        },
                    );
                }
                Some(_) => {}
                None => {
                    debug!("child output stream closed");
                    break;
                }
            }

            if self.pty.try_wait()?.is_some() {
                debug!("child process exited");
                break;
            }

            if self.console.take_redraw() {
                self.redraw()?;
            }

            std::thread::sleep(IDLE_SLEEP);
        }

        let _ = self.pty.kill();
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let rows = self.console.visible_lines();
        let cursor = self.console.cursor();
        self.host
            .draw(&rows, cursor.y as u16, cursor.x as u16, cursor.visible)
    }

    /// Apply the multiplexer's own in-band control codes; forward
    /// everything else to the child. Returns `true` if the session should
    /// terminate.
    fn handle_keystroke(&mut self, bytes: &[u8]) -> Result<bool> {
        if bytes == [0x04] || bytes == [0x03] {
            return Ok(true);
        }
        if !self.console.is_auto_scroll() && bytes.len() == 1 {
            match bytes[0] {
                b'+' => {
                    self.console.scroll(1);
                    return Ok(false);
                }
                b'-' => {
                    self.console.scroll(-1);
                    return Ok(false);
                }
                b'*' => {
                    self.console.deactivate_scroll();
                    return Ok(false);
                }
                _ => {}
            }
        }
        self.pty.write(bytes)?;
        Ok(false)
    }
}
