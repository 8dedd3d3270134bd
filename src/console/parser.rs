//! Byte-level control-sequence dispatcher.
//!
//! Drives a `vte::Parser` to classify the child's output stream into
//! print/execute/CSI/ESC/OSC events and apply exactly the effects named in
//! the console's conformance table.

use tracing::{trace, warn};
use unicode_width::UnicodeWidthChar;
use vte::{Params, Perform};

use super::color::{approximate_256, approximate_rgb, base_color, Attrs, Color};
use super::line::{Line, LineBuffer};

/// Borrows every piece of `Console` state a control sequence might touch,
/// plus the reply/bell callbacks, for the duration of one `advance` call.
pub struct Dispatcher<'a> {
    pub lines: &'a mut LineBuffer,
    pub width: usize,
    pub height: usize,
    pub cursor_y: &'a mut usize,
    pub cursor_x: &'a mut usize,
    pub attrs: &'a mut Attrs,
    pub fg: &'a mut Color,
    pub bg: &'a mut Color,
    pub scroll_top: &'a mut usize,
    pub scroll_bottom: &'a mut usize,
    pub offset: &'a mut usize,
    pub display_offset: &'a mut usize,
    pub auto_scroll: &'a mut bool,
    pub history_size: usize,
    pub redraw: &'a mut bool,
    pub stage: String,
    pub reply: &'a mut dyn FnMut(&[u8]),
    pub bell: &'a mut dyn FnMut(),
}

impl<'a> Dispatcher<'a> {
    /// Absolute row index of the cursor within the line buffer.
    fn abs_row(&self) -> usize {
        *self.offset + *self.cursor_y
    }

    fn ensure_row_exists(&mut self, abs: usize) {
        while self.lines.len() <= abs {
            let real_num = self.lines.last_real_num();
            self.lines.push_back(Line::empty(real_num));
        }
        self.enforce_history_cap();
    }

    fn enforce_history_cap(&mut self) {
        if self.history_size == 0 {
            return;
        }
        let before = self.lines.len();
        let trimmed = self.lines.trim_front_to(self.history_size);
        if trimmed > 0 {
            *self.offset = self.offset.saturating_sub(trimmed);
            *self.display_offset = self.display_offset.saturating_sub(trimmed);
            let _ = before;
        }
    }

    fn flush_stage(&mut self) {
        if self.stage.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.stage);
        self.write_run(&text);
    }

    /// Write a printable run starting at the current cursor position,
    /// wrapping and scrolling as needed.
    fn write_run(&mut self, text: &str) {
        let attrs = *self.attrs;
        let fg = *self.fg;
        let bg = *self.bg;
        for ch in text.chars() {
            if *self.cursor_x >= self.width {
                self.cursor_newline(false);
            }
            let abs = self.abs_row();
            self.ensure_row_exists(abs);
            let abs = self.abs_row();
            if let Some(line) = self.lines.get_mut(abs) {
                line.content.ljust(*self.cursor_x);
                let mut rebuilt = line.content.slice(0, *self.cursor_x);
                rebuilt.push_str(&ch.to_string(), attrs, fg, bg);
                let tail_start = *self.cursor_x + 1;
                if tail_start < line.content.len() {
                    rebuilt.append(&line.content.slice(tail_start, line.content.len()));
                }
                rebuilt.rstrip();
                line.content = rebuilt;
            }
            *self.cursor_x += UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        }
    }

    /// Move to the start of the next row, scrolling the region if the
    /// cursor sits on its bottom edge. `real` marks a hard newline (LF) as
    /// opposed to a soft wrap from an overlong printable run.
    fn cursor_newline(&mut self, real: bool) {
        *self.cursor_x = 0;
        if *self.cursor_y == *self.scroll_bottom {
            self.scroll_down_region(real);
        } else {
            *self.cursor_y = (*self.cursor_y + 1).min(self.height - 1);
            let abs = self.abs_row();
            if self.lines.len() <= abs {
                let real_num = self.lines.last_real_num() + u64::from(real);
                self.lines.push_back(Line::empty(real_num));
                self.enforce_history_cap();
            }
        }
    }

    /// Move down a row, scrolling the region if the cursor sits on its
    /// bottom edge, without touching the column (ESC D / Index).
    fn index_down(&mut self, real: bool) {
        if *self.cursor_y == *self.scroll_bottom {
            self.scroll_down_region(real);
        } else {
            *self.cursor_y = (*self.cursor_y + 1).min(self.height - 1);
            let abs = self.abs_row();
            if self.lines.len() <= abs {
                let real_num = self.lines.last_real_num() + u64::from(real);
                self.lines.push_back(Line::empty(real_num));
                self.enforce_history_cap();
            }
        }
    }

    fn carriage_return(&mut self) {
        *self.cursor_x = 0;
    }

    fn backspace(&mut self) {
        *self.cursor_x = self.cursor_x.saturating_sub(1);
    }

    /// Scroll content up by one within the scroll region (used by LF at the
    /// region's bottom edge and by CSI S).
    fn scroll_down_region(&mut self, real: bool) {
        let full_viewport = *self.scroll_top == 0 && *self.scroll_bottom == self.height - 1;
        if full_viewport {
            *self.offset += 1;
            let abs = *self.offset + self.height - 1;
            if self.lines.len() <= abs {
                let real_num = self.lines.last_real_num() + u64::from(real);
                self.lines.push_back(Line::empty(real_num));
            }
            self.enforce_history_cap();
            if *self.auto_scroll {
                *self.display_offset = *self.offset;
            }
        } else {
            let top_abs = *self.offset + *self.scroll_top;
            let bottom_abs = *self.offset + *self.scroll_bottom;
            self.lines.remove(top_abs);
            let real_num = self
                .lines
                .get(bottom_abs.saturating_sub(1))
                .map(|l| l.real_num)
                .unwrap_or(0)
                + u64::from(real);
            self.lines.insert(bottom_abs, Line::empty(real_num));
        }
        *self.redraw = true;
    }

    /// Scroll content down by one within the scroll region (CSI T, reverse
    /// index at the region's top edge).
    fn scroll_up_region(&mut self) {
        let top_abs = *self.offset + *self.scroll_top;
        let bottom_abs = *self.offset + *self.scroll_bottom;
        if bottom_abs < self.lines.len() {
            self.lines.remove(bottom_abs);
        }
        let real_num = self.lines.get(top_abs).map(|l| l.real_num).unwrap_or(0);
        self.lines.insert(top_abs, Line::empty(real_num));
        *self.redraw = true;
    }

    fn clamp_scroll_region(top: usize, bottom: usize, height: usize) -> (usize, usize) {
        let top = top.min(height.saturating_sub(1));
        let bottom = bottom.min(height.saturating_sub(1));
        if top < bottom {
            (top, bottom)
        } else {
            (0, height.saturating_sub(1))
        }
    }

    fn erase_to_eol(&mut self) {
        let abs = self.abs_row();
        let x = *self.cursor_x;
        if let Some(line) = self.lines.get_mut(abs) {
            if x < line.content.len() {
                line.content = line.content.slice(0, x);
            }
        }
    }

    fn erase_from_sol(&mut self) {
        let abs = self.abs_row();
        let x = *self.cursor_x;
        if let Some(line) = self.lines.get_mut(abs) {
            let width = self.width;
            let mut blanked = super::fstring::FormattedString::new();
            blanked.ljust((x + 1).min(width));
            let tail_start = x + 1;
            if tail_start < line.content.len() {
                blanked.append(&line.content.slice(tail_start, line.content.len()));
            }
            blanked.rstrip();
            line.content = blanked;
        }
    }

    fn erase_entire_line(&mut self) {
        let abs = self.abs_row();
        if let Some(line) = self.lines.get_mut(abs) {
            line.content = super::fstring::FormattedString::new();
        }
    }

    fn erase_chars(&mut self, n: usize) {
        let abs = self.abs_row();
        let x = *self.cursor_x;
        if let Some(line) = self.lines.get_mut(abs) {
            let len = line.content.len();
            if x >= len {
                return;
            }
            let end = (x + n).min(len);
            let mut rebuilt = line.content.slice(0, x);
            rebuilt.ljust(end);
            if end < len {
                rebuilt.append(&line.content.slice(end, len));
            }
            rebuilt.rstrip();
            line.content = rebuilt;
        }
    }

    fn delete_chars(&mut self, n: usize) {
        let abs = self.abs_row();
        let x = *self.cursor_x;
        let width = self.width;
        if let Some(line) = self.lines.get_mut(abs) {
            let len = line.content.len();
            if x >= len {
                return;
            }
            let mut rebuilt = line.content.slice(0, x);
            let tail_start = (x + n).min(len);
            if tail_start < len {
                rebuilt.append(&line.content.slice(tail_start, len));
            }
            rebuilt.ljust(width.min(len));
            rebuilt.rstrip();
            line.content = rebuilt;
        }
    }

    fn insert_chars(&mut self, n: usize) {
        let abs = self.abs_row();
        let x = *self.cursor_x;
        let width = self.width;
        if let Some(line) = self.lines.get_mut(abs) {
            let len = line.content.len();
            let mut rebuilt = line.content.slice(0, x.min(len));
            rebuilt.ljust(x);
            let mut pad = super::fstring::FormattedString::new();
            pad.ljust(n);
            rebuilt.append(&pad);
            if x < len {
                let keep = width.saturating_sub(x + n);
                rebuilt.append(&line.content.slice(x, (x + keep).min(len)));
            }
            rebuilt.rstrip();
            line.content = rebuilt;
        }
    }

    fn erase_to_eos(&mut self) {
        self.erase_to_eol();
        let abs = self.abs_row();
        for row in (abs + 1)..self.lines.len() {
            if let Some(line) = self.lines.get_mut(row) {
                line.content = super::fstring::FormattedString::new();
            }
        }
    }

    fn erase_from_sos(&mut self) {
        let abs = self.abs_row();
        for row in *self.offset..abs {
            if let Some(line) = self.lines.get_mut(row) {
                line.content = super::fstring::FormattedString::new();
            }
        }
        self.erase_from_sol();
    }

    fn clear_screen(&mut self) {
        let offset = *self.offset;
        for row in offset..(offset + self.height) {
            if row < self.lines.len() {
                if let Some(line) = self.lines.get_mut(row) {
                    line.content = super::fstring::FormattedString::new();
                }
            }
        }
    }

    fn insert_lines(&mut self, n: usize) {
        let saved_top = *self.scroll_top;
        *self.scroll_top = *self.cursor_y;
        for _ in 0..n {
            self.scroll_up_region();
        }
        *self.scroll_top = saved_top;
    }

    fn move_cursor(&mut self, dy: isize, dx: isize) {
        let y = (*self.cursor_y as isize + dy).clamp(0, self.height as isize - 1) as usize;
        let x = (*self.cursor_x as isize + dx).clamp(0, self.width as isize - 1) as usize;
        *self.cursor_y = y;
        *self.cursor_x = x;
    }

    fn set_cursor_absolute(&mut self, row: Option<usize>, col: Option<usize>) {
        if let Some(row) = row {
            *self.cursor_y = row.saturating_sub(1).min(self.height - 1);
        }
        if let Some(col) = col {
            *self.cursor_x = col.saturating_sub(1).min(self.width - 1);
        }
    }

    fn sgr(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.attrs.reset();
            *self.fg = Color::Default;
            *self.bg = Color::Default;
            return;
        }
        let mut i = 0;
        while i < params.len() {
            match params[i] {
                0 => {
                    self.attrs.reset();
                    *self.fg = Color::Default;
                    *self.bg = Color::Default;
                }
                1 => self.attrs.bold = true,
                2 => self.attrs.dim = true,
                4 => self.attrs.underline = true,
                5 => self.attrs.blink = true,
                7 => self.attrs.reverse = true,
                8 => self.attrs.invisible = true,
                21 => {
                    self.attrs.bold = false;
                    self.attrs.dim = false;
                }
                22 => {
                    self.attrs.bold = false;
                    self.attrs.dim = false;
                }
                24 => self.attrs.underline = false,
                25 => self.attrs.blink = false,
                27 => self.attrs.reverse = false,
                28 => self.attrs.invisible = false,
                n @ 30..=37 => *self.fg = base_color(n - 30),
                39 => *self.fg = Color::Default,
                n @ 40..=47 => *self.bg = base_color(n - 40),
                49 => *self.bg = Color::Default,
                38 => {
                    i = self.parse_extended_color(params, i, true);
                    continue;
                }
                48 => {
                    i = self.parse_extended_color(params, i, false);
                    continue;
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Consume a `38;5;n`, `38;2;r;g;b` (or 48-prefixed) extended color
    /// sub-sequence starting at `params[i]` (which is `38` or `48`).
    /// Returns the index to resume scanning from.
    fn parse_extended_color(&mut self, params: &[u16], i: usize, fg: bool) -> usize {
        let is_fg = fg;
        match params.get(i + 1) {
            Some(5) => {
                if let Some(&idx) = params.get(i + 2) {
                    let color = approximate_256(idx.min(255) as u8);
                    if is_fg {
                        *self.fg = color;
                    } else {
                        *self.bg = color;
                    }
                    i + 3
                } else {
                    i + 2
                }
            }
            Some(2) => {
                if let (Some(&r), Some(&g), Some(&b)) =
                    (params.get(i + 2), params.get(i + 3), params.get(i + 4))
                {
                    let color = approximate_rgb(r.min(255) as u8, g.min(255) as u8, b.min(255) as u8);
                    if is_fg {
                        *self.fg = color;
                    } else {
                        *self.bg = color;
                    }
                    i + 5
                } else {
                    i + 2
                }
            }
            _ => i + 1,
        }
    }
}

fn collect_params(params: &Params) -> Vec<u16> {
    params.iter().flat_map(|p| p.iter().copied()).collect()
}

fn param_or(params: &[u16], idx: usize, default: usize) -> usize {
    params
        .get(idx)
        .map(|&v| v as usize)
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

impl<'a> Perform for Dispatcher<'a> {
    fn print(&mut self, c: char) {
        let substituted = substitute_unprintable(c);
        self.stage.push_str(&substituted);
    }

    fn execute(&mut self, byte: u8) {
        self.flush_stage();
        match byte {
            0x07 => (self.bell)(),
            0x08 => self.backspace(),
            0x09 => {
                let col = *self.cursor_x;
                let next_stop = ((col / 8) + 1) * 8;
                let spaces = next_stop.saturating_sub(col).min(self.width.saturating_sub(col));
                *self.cursor_x += spaces;
            }
            0x0A => self.cursor_newline(true),
            0x0D => self.carriage_return(),
            _ => {}
        }
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _action: char) {}
    fn put(&mut self, _byte: u8) {}
    fn unhook(&mut self) {}
    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, action: char) {
        self.flush_stage();
        if !intermediates.is_empty() && intermediates[0] == b'?' {
            // Private mode set/reset: the bounded subset of modes this
            // emulator models (mouse tracking, alternate screen, bracketed
            // paste) are all no-ops worth swallowing silently.
            return;
        }
        let p = collect_params(params);
        match action {
            'H' | 'f' => {
                let row = if p.is_empty() { None } else { Some(param_or(&p, 0, 1)) };
                let col = if p.len() < 2 { None } else { Some(param_or(&p, 1, 1)) };
                self.set_cursor_absolute(row, col);
            }
            'A' => self.move_cursor(-(param_or(&p, 0, 1) as isize), 0),
            'B' => self.move_cursor(param_or(&p, 0, 1) as isize, 0),
            'C' => self.move_cursor(0, param_or(&p, 0, 1) as isize),
            'D' => self.move_cursor(0, -(param_or(&p, 0, 1) as isize)),
            'd' => self.set_cursor_absolute(Some(param_or(&p, 0, 1)), None),
            'G' => self.set_cursor_absolute(None, Some(param_or(&p, 0, 1))),
            'K' => match param_or(&p, 0, 0) {
                0 => self.erase_to_eol(),
                1 => self.erase_from_sol(),
                2 => self.erase_entire_line(),
                _ => {}
            },
            'J' => match param_or(&p, 0, 0) {
                0 => self.erase_to_eos(),
                1 => self.erase_from_sos(),
                2 | 3 => self.clear_screen(),
                _ => {}
            },
            'X' => self.erase_chars(param_or(&p, 0, 1)),
            'M' if p.is_empty() => self.erase_entire_line(),
            'L' => self.insert_lines(param_or(&p, 0, 1)),
            'P' => self.delete_chars(param_or(&p, 0, 1)),
            '@' => self.insert_chars(param_or(&p, 0, 1)),
            'm' => self.sgr(&p),
            'r' => {
                let top = if p.is_empty() { 0 } else { param_or(&p, 0, 1).saturating_sub(1) };
                let bottom = if p.len() < 2 {
                    self.height - 1
                } else {
                    param_or(&p, 1, self.height).saturating_sub(1)
                };
                let (top, bottom) = Self::clamp_scroll_region(top, bottom, self.height);
                *self.scroll_top = top;
                *self.scroll_bottom = bottom;
                *self.cursor_y = 0;
                *self.cursor_x = 0;
            }
            'c' if intermediates.first() == Some(&b'>') => (self.reply)(b"\x1b[>84;0;0c"),
            'c' => (self.reply)(b"\x1b[?1;2c"),
            'n' => match param_or(&p, 0, 0) {
                5 => (self.reply)(b"\x1b[0n"),
                6 => {
                    let reply = format!("\x1b[{};{}R", *self.cursor_y + 1, *self.cursor_x + 1);
                    (self.reply)(reply.as_bytes());
                }
                _ => {}
            },
            'h' | 'l' => {
                if p.first() == Some(&4) && action == 'h' {
                    warn!("insert mode (CSI 4h) is not supported by this emulator");
                }
            }
            _ => {
                trace!(action, ?p, ?intermediates, "unhandled CSI sequence");
            }
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        self.flush_stage();
        match byte {
            b'D' => self.index_down(true),
            b'M' => {
                if *self.cursor_y == *self.scroll_top {
                    self.scroll_up_region();
                } else {
                    *self.cursor_y = self.cursor_y.saturating_sub(1);
                }
            }
            b'=' | b'>' => {}
            _ => {
                trace!(byte, ?intermediates, "unhandled ESC sequence");
            }
        }
    }
}

/// Replace control/format/unassigned codepoints with a printable
/// caret-notation placeholder, per the console's write path.
fn substitute_unprintable(c: char) -> String {
    if c.is_control() {
        let b = c as u32;
        if b == 0x7F {
            return "^?".to_string();
        }
        if b < 0x20 {
            return format!("^{}", (b'@' + b as u8) as char);
        }
        return format!("<U+{b:04X}>");
    }
    if UnicodeWidthChar::width(c).is_none() {
        return format!("<U+{:04X}>", c as u32);
    }
    c.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_control_codes() {
        assert_eq!(substitute_unprintable('\x01'), "^A");
        assert_eq!(substitute_unprintable('\x7f'), "^?");
    }

    #[test]
    fn passes_through_printable_ascii() {
        assert_eq!(substitute_unprintable('x'), "x");
    }
}
