//! Pseudo-terminal boundary module.
//!
//! Spawns the child shell on a pseudo-terminal and exposes a byte-pipe
//! interface to it. Carries no terminal-emulation logic of its own; that
//! lives entirely in [`crate::console`].

use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context, Result};
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

use crate::error::MuxError;

/// A spawned child shell on its own pseudo-terminal.
///
/// `portable_pty` exposes only a blocking reader, so a single background
/// thread pumps bytes into a channel the main loop drains non-blockingly.
/// The thread owns no console state; it is a byte pipe, not a second
/// mutator, so the cooperative single-threaded model `Console` and
/// `Screen` rely on still holds at the level that matters.
pub struct Pty {
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    output_rx: Receiver<Vec<u8>>,
    child: Box<dyn Child + Send + Sync>,
}

impl Pty {
    /// Spawn `shell` (or `$SHELL`, defaulting to `/bin/sh`) on a PTY sized
    /// to `(cols, rows)`.
    pub fn spawn(shell: Option<&str>, cols: u16, rows: u16) -> Result<Self> {
        let shell = shell
            .map(str::to_string)
            .or_else(|| std::env::var("SHELL").ok())
            .unwrap_or_else(|| "/bin/sh".to_string());

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| MuxError::Pty(e.to_string()))
            .context("failed to open pseudo-terminal")?;

        let mut cmd = CommandBuilder::new(&shell);
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| MuxError::Pty(e.to_string()))
            .with_context(|| format!("failed to spawn shell '{shell}'"))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| MuxError::Pty(e.to_string()))?;
        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| MuxError::Pty(e.to_string()))?;

        let (tx, output_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            master: pair.master,
            writer,
            output_rx,
            child,
        })
    }

    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| MuxError::Pty(e.to_string()).into())
    }

    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Drain whatever output the child has produced since the last call,
    /// without blocking. `None` once the reader thread has seen EOF and the
    /// channel is drained.
    pub fn try_read(&mut self) -> Option<Vec<u8>> {
        match self.output_rx.try_recv() {
            Ok(chunk) => Some(chunk),
            Err(TryRecvError::Empty) => Some(Vec::new()),
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Non-blocking liveness check; `Some(status)` once the child has
    /// exited.
    pub fn try_wait(&mut self) -> Result<Option<portable_pty::ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    pub fn kill(&mut self) -> Result<()> {
        self.child.kill().map_err(Into::into)
    }
}
