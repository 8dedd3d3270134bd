//! Line buffer: an ordered sequence of display rows, each tagged with the
//! "real line" it was wrapped from.
//!
//! Backed by a `VecDeque<Line>` so the history cap can trim from the front
//! in O(1) and so wrapped continuations can be tracked via `real_num`.

use std::collections::VecDeque;

use super::fstring::FormattedString;

/// A single display row: its styled content plus the real-line number of the
/// logical line it's a (possibly sole) segment of.
#[derive(Debug, Clone)]
pub struct Line {
    pub content: FormattedString,
    pub real_num: u64,
}

impl Line {
    pub fn empty(real_num: u64) -> Self {
        Self {
            content: FormattedString::new(),
            real_num,
        }
    }
}

/// Ordered buffer of display rows. Never empty.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    lines: VecDeque<Line>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            lines: VecDeque::from(vec![Line::empty(0)]),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, i: usize) -> Option<&Line> {
        self.lines.get(i)
    }

    pub fn get_mut(&mut self, i: usize) -> Option<&mut Line> {
        self.lines.get_mut(i)
    }

    pub fn push_back(&mut self, line: Line) {
        self.lines.push_back(line);
    }

    pub fn pop_back(&mut self) -> Option<Line> {
        if self.lines.len() > 1 {
            self.lines.pop_back()
        } else {
            None
        }
    }

    pub fn push_front(&mut self, line: Line) {
        self.lines.push_front(line);
    }

    /// Remove the row at `i`, shifting everything after it up by one.
    pub fn remove(&mut self, i: usize) -> Option<Line> {
        self.lines.remove(i)
    }

    /// Insert a row at `i`, shifting everything at/after it down by one.
    pub fn insert(&mut self, i: usize, line: Line) {
        self.lines.insert(i.min(self.lines.len()), line);
    }

    pub fn last_real_num(&self) -> u64 {
        self.lines.back().map(|l| l.real_num).unwrap_or(0)
    }

    /// Drop rows from the front until at most `max` remain. Returns the
    /// number actually trimmed, which callers use to adjust offsets.
    pub fn trim_front_to(&mut self, max: usize) -> usize {
        let mut trimmed = 0;
        while self.lines.len() > max.max(1) {
            self.lines.pop_front();
            trimmed += 1;
        }
        trimmed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    /// Replace the whole buffer with a freshly rewrapped sequence (used by
    /// resize reflow). Guarantees at least one line remains.
    pub fn replace_all(&mut self, lines: Vec<Line>) {
        if lines.is_empty() {
            self.lines = VecDeque::from(vec![Line::empty(0)]);
        } else {
            self.lines = VecDeque::from(lines);
        }
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_has_one_empty_line() {
        let b = LineBuffer::new();
        assert_eq!(b.len(), 1);
        assert!(b.get(0).unwrap().content.is_empty());
    }

    #[test]
    fn push_and_pop_back() {
        let mut b = LineBuffer::new();
        b.push_back(Line::empty(1));
        assert_eq!(b.len(), 2);
        let popped = b.pop_back().unwrap();
        assert_eq!(popped.real_num, 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn pop_back_never_empties_buffer() {
        let mut b = LineBuffer::new();
        assert!(b.pop_back().is_none());
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn trim_front_respects_minimum_one() {
        let mut b = LineBuffer::new();
        for i in 1..=5 {
            b.push_back(Line::empty(i));
        }
        assert_eq!(b.len(), 6);
        let trimmed = b.trim_front_to(3);
        assert_eq!(trimmed, 3);
        assert_eq!(b.len(), 3);
        // remaining lines are the tail
        assert_eq!(b.get(0).unwrap().real_num, 3);
    }

    #[test]
    fn trim_front_to_zero_still_leaves_one() {
        let mut b = LineBuffer::new();
        b.push_back(Line::empty(1));
        let trimmed = b.trim_front_to(0);
        assert_eq!(trimmed, 1);
        assert_eq!(b.len(), 1);
    }
}
