//! Host-terminal boundary module.
//!
//! A thin `crossterm` wrapper providing the capability set the screen
//! manager needs: raw mode + alternate screen for the session's lifetime,
//! non-blocking input polling, cell drawing, and resize detection.
//!
//! Enters raw mode and the alternate screen on construction, and restores
//! both on drop so a crash or early return never leaves the host terminal
//! in a broken state.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::{Color as CtColor, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::console::color::{Attrs, Color};
use crate::console::fstring::FormattedString;

/// Something read from the host terminal this tick: either a keystroke's
/// raw bytes, or a change in window size.
pub enum HostEvent {
    Bytes(Vec<u8>),
    Resize(u16, u16),
}

/// Owns the host terminal for the session's lifetime; raw mode and the
/// alternate screen are restored on drop.
pub struct Host {
    stdout: io::Stdout,
}

impl Host {
    pub fn new() -> Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self { stdout })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        Ok(crossterm::terminal::size()?)
    }

    /// Poll for a keystroke or resize event without blocking.
    pub fn read_available(&self) -> Result<Option<HostEvent>> {
        if !event::poll(Duration::from_millis(0))? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(key_to_bytes(key).map(HostEvent::Bytes)),
            Event::Resize(cols, rows) => Ok(Some(HostEvent::Resize(cols, rows))),
            _ => Ok(None),
        }
    }

    /// Redraw the full grid of visible rows plus the cursor position.
    pub fn draw(&mut self, rows: &[&FormattedString], cursor_y: u16, cursor_x: u16, cursor_visible: bool) -> Result<()> {
        queue!(self.stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        for (i, row) in rows.iter().enumerate() {
            queue!(self.stdout, MoveTo(0, i as u16))?;
            for run in row.runs() {
                queue!(
                    self.stdout,
                    SetForegroundColor(to_crossterm_color(run.fg)),
                    SetBackgroundColor(to_crossterm_color(run.bg))
                )?;
                apply_attrs(&mut self.stdout, run.attrs)?;
                queue!(self.stdout, Print(&run.text), ResetColor)?;
            }
        }
        if cursor_visible {
            queue!(self.stdout, MoveTo(cursor_x, cursor_y), Show)?;
        } else {
            queue!(self.stdout, Hide)?;
        }
        self.stdout.flush()?;
        Ok(())
    }

    pub fn beep(&mut self) -> Result<()> {
        write!(self.stdout, "\x07")?;
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

fn to_crossterm_color(c: Color) -> CtColor {
    match c {
        Color::Default => CtColor::Reset,
        Color::Black => CtColor::Black,
        Color::Red => CtColor::DarkRed,
        Color::Green => CtColor::DarkGreen,
        Color::Yellow => CtColor::DarkYellow,
        Color::Blue => CtColor::DarkBlue,
        Color::Magenta => CtColor::DarkMagenta,
        Color::Cyan => CtColor::DarkCyan,
        Color::White => CtColor::Grey,
    }
}

fn apply_attrs(stdout: &mut io::Stdout, attrs: Attrs) -> Result<()> {
    use crossterm::style::Attribute;
    if attrs.bold {
        queue!(stdout, SetAttribute(Attribute::Bold))?;
    }
    if attrs.dim {
        queue!(stdout, SetAttribute(Attribute::Dim))?;
    }
    if attrs.underline {
        queue!(stdout, SetAttribute(Attribute::Underlined))?;
    }
    if attrs.blink {
        queue!(stdout, SetAttribute(Attribute::SlowBlink))?;
    }
    if attrs.reverse {
        queue!(stdout, SetAttribute(Attribute::Reverse))?;
    }
    if attrs.invisible {
        queue!(stdout, SetAttribute(Attribute::Hidden))?;
    }
    Ok(())
}

/// Translate a crossterm key event into the raw bytes the child PTY expects
/// on its stdin, matching what a real terminal would send.
fn key_to_bytes(key: KeyEvent) -> Option<Vec<u8>> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(c) => {
            if key.modifiers.contains(crossterm::event::KeyModifiers::CONTROL) {
                let upper = c.to_ascii_uppercase();
                if upper.is_ascii_uppercase() {
                    return Some(vec![(upper as u8) & 0x1f]);
                }
            }
            let mut buf = [0u8; 4];
            Some(c.encode_utf8(&mut buf).as_bytes().to_vec())
        }
        KeyCode::Enter => Some(vec![b'\r']),
        KeyCode::Backspace => Some(vec![0x7f]),
        KeyCode::Tab => Some(vec![b'\t']),
        KeyCode::Esc => Some(vec![0x1b]),
        KeyCode::Up => Some(b"\x1b[A".to_vec()),
        KeyCode::Down => Some(b"\x1b[B".to_vec()),
        KeyCode::Right => Some(b"\x1b[C".to_vec()),
        KeyCode::Left => Some(b"\x1b[D".to_vec()),
        KeyCode::Home => Some(b"\x1b[H".to_vec()),
        KeyCode::End => Some(b"\x1b[F".to_vec()),
        KeyCode::Delete => Some(b"\x1b[3~".to_vec()),
        _ => None,
    }
}
