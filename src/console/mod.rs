//! The terminal emulator: owns the line buffer, cursor, current attributes,
//! scroll region, and scrollback policy, and exposes the write/resize/
//! scroll operations the screen manager drives.
//!
//! Built on a reflow-capable, run-length `LineBuffer` rather than a fixed
//! grid, so resizing the viewport can re-wrap content instead of
//! truncating it.

pub mod color;
pub mod fstring;
pub mod line;
pub mod parser;

#[cfg(test)]
mod tests;

use vte::Parser as VteParser;

use color::{Attrs, Color};
use fstring::FormattedString;
use line::{Line, LineBuffer};
use parser::Dispatcher;

/// Cursor position and visibility, expressed relative to the viewport.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub y: usize,
    pub x: usize,
    pub visible: bool,
}

/// The terminal emulator's full state.
pub struct Console {
    width: usize,
    height: usize,
    lines: LineBuffer,
    cursor_y: usize,
    cursor_x: usize,
    attrs: Attrs,
    fg: Color,
    bg: Color,
    scroll_top: usize,
    scroll_bottom: usize,
    offset: usize,
    display_offset: usize,
    auto_scroll: bool,
    history_size: usize,
    redraw: bool,
    parser: VteParser,
}

impl Console {
    pub fn new(width: usize, height: usize, history_size: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            lines: LineBuffer::new(),
            cursor_y: 0,
            cursor_x: 0,
            attrs: Attrs::default(),
            fg: Color::Default,
            bg: Color::Default,
            scroll_top: 0,
            scroll_bottom: height - 1,
            offset: 0,
            display_offset: 0,
            auto_scroll: true,
            history_size: history_size.max(height),
            redraw: true,
            parser: VteParser::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cursor(&self) -> Cursor {
        let abs = self.offset + self.cursor_y;
        let viewport_row = abs.checked_sub(self.display_offset);
        let visible = matches!(viewport_row, Some(r) if r < self.height);
        Cursor {
            y: viewport_row.unwrap_or(0).min(self.height.saturating_sub(1)),
            x: self.cursor_x,
            visible,
        }
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw, false)
    }

    /// The rows currently visible, oldest first, given the current scroll
    /// position. Shorter than `height` only when the buffer itself has
    /// fewer rows than the viewport (e.g. right after construction).
    pub fn visible_lines(&self) -> Vec<&FormattedString> {
        (0..self.height)
            .filter_map(|i| self.lines.get(self.display_offset + i).map(|l| &l.content))
            .collect()
    }

    pub fn is_auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Consume a chunk of the child's output, applying every control
    /// sequence and printable run it contains. `reply` receives bytes a
    /// device query wants written back to the child; `bell` is invoked on
    /// BEL.
    pub fn write(&mut self, data: &[u8], reply: &mut dyn FnMut(&[u8]), bell: &mut dyn FnMut()) {
        let mut dispatcher = Dispatcher {
            lines: &mut self.lines,
            width: self.width,
            height: self.height,
            cursor_y: &mut self.cursor_y,
            cursor_x: &mut self.cursor_x,
            attrs: &mut self.attrs,
            fg: &mut self.fg,
            bg: &mut self.bg,
            scroll_top: &mut self.scroll_top,
            scroll_bottom: &mut self.scroll_bottom,
            offset: &mut self.offset,
            display_offset: &mut self.display_offset,
            auto_scroll: &mut self.auto_scroll,
            history_size: self.history_size,
            redraw: &mut self.redraw,
            stage: String::new(),
            reply,
            bell,
        };
        self.parser.advance(&mut dispatcher, data);
        self.redraw = true;
    }

    /// Scroll the display by `delta` rows (negative = toward history,
    /// positive = toward the present). Leaves auto-scroll once the user
    /// scrolls away from the bottom.
    pub fn scroll(&mut self, delta: i64) {
        let max = self.lines.len().saturating_sub(1);
        let new_offset = (self.display_offset as i64 + delta).clamp(0, max as i64) as usize;
        self.display_offset = new_offset;
        self.auto_scroll = false;
        self.redraw = true;
    }

    /// Exit scrollback and snap the display back to the real viewport.
    pub fn deactivate_scroll(&mut self) {
        self.display_offset = self.offset;
        self.auto_scroll = true;
        self.redraw = true;
    }

    /// Reflow the line buffer for new dimensions. Lossless across width
    /// changes: concatenates each logical line's segments and re-chunks at
    /// the new width.
    pub fn resize(&mut self, new_width: usize, new_height: usize) {
        let new_width = new_width.max(1);
        let new_height = new_height.max(1);

        let cursor_abs = self.offset + self.cursor_y;
        let (real_y, real_x) = self.real_position(cursor_abs);

        if new_width != self.width {
            self.rebuild_lines(new_width);
        }
        self.width = new_width;

        let new_abs = self.find_real_position(real_y, real_x, self.width);
        let height_delta = new_height as i64 - self.height as i64;
        self.height = new_height;
        self.scroll_top = 0;
        self.scroll_bottom = new_height - 1;

        if height_delta != 0 {
            let min_offset = new_abs.saturating_sub(new_height - 1);
            self.offset = self.offset.min(min_offset).max(0);
        }
        self.offset = self.offset.min(new_abs);
        self.cursor_y = (new_abs - self.offset).min(new_height - 1);
        self.cursor_x = real_x.min(self.width.saturating_sub(1));

        while self.lines.len() <= self.offset + self.cursor_y {
            let real_num = self.lines.last_real_num();
            self.lines.push_back(Line::empty(real_num));
        }
        self.history_size = self.history_size.max(new_height);
        let trimmed = self.lines.trim_front_to(self.history_size);
        self.offset = self.offset.saturating_sub(trimmed);

        if self.auto_scroll {
            self.display_offset = self.offset;
        } else {
            self.display_offset = self.display_offset.min(self.lines.len().saturating_sub(1));
        }
        self.redraw = true;
    }

    /// Real (logical-line, column-within-logical-line) position of the
    /// cursor's absolute row, used to keep the cursor stable across reflow.
    fn real_position(&self, abs_row: usize) -> (u64, usize) {
        let Some(row) = self.lines.get(abs_row) else {
            return (0, self.cursor_x);
        };
        let real_num = row.real_num;
        let mut col = self.cursor_x;
        let mut i = abs_row;
        while i > 0 {
            let prev = self.lines.get(i - 1);
            match prev {
                Some(p) if p.real_num == real_num => {
                    col += self.width;
                    i -= 1;
                }
                _ => break,
            }
        }
        (real_num, col)
    }

    /// Inverse of `real_position` after a rebuild: find the absolute row
    /// whose segment covers `real_col` for `real_num`.
    fn find_real_position(&self, real_num: u64, real_col: usize, width: usize) -> usize {
        let first_match = (0..self.lines.len())
            .find(|&i| self.lines.get(i).map(|l| l.real_num) == Some(real_num));
        let Some(start) = first_match else {
            return self.lines.len().saturating_sub(1);
        };
        let segment = real_col / width.max(1);
        start + segment
    }

    /// Concatenate each group of consecutive same-real_num lines and
    /// re-chunk at `new_width`.
    fn rebuild_lines(&mut self, new_width: usize) {
        let mut rebuilt: Vec<Line> = Vec::new();
        let mut i = 0;
        let total = self.lines.len();
        while i < total {
            let real_num = self.lines.get(i).unwrap().real_num;
            let mut joined = FormattedString::new();
            let mut j = i;
            while j < total && self.lines.get(j).unwrap().real_num == real_num {
                let seg = self.lines.get(j).unwrap();
                let mut padded = seg.content.clone();
                if j + 1 < total && self.lines.get(j + 1).unwrap().real_num == real_num {
                    padded.ljust(self.width);
                }
                joined.append(&padded);
                j += 1;
            }
            if joined.is_empty() {
                rebuilt.push(Line::empty(real_num));
            } else {
                let len = joined.len();
                let mut start = 0;
                while start < len {
                    let end = (start + new_width).min(len);
                    rebuilt.push(Line {
                        content: joined.slice(start, end),
                        real_num,
                    });
                    start = end;
                }
            }
            i = j;
        }
        self.lines.replace_all(rebuilt);
    }
}
