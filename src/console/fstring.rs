//! Run-length encoded styled string: an ordered sequence of text runs, each
//! carrying its own attributes and colors.
//!
//! Runs are merged on append so that a line of uniform style costs one
//! allocation rather than one per character.

use super::color::{Attrs, Color};

/// A maximal run of codepoints sharing the same style.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub attrs: Attrs,
    pub fg: Color,
    pub bg: Color,
}

impl Run {
    fn style_eq(&self, attrs: Attrs, fg: Color, bg: Color) -> bool {
        self.attrs == attrs && self.fg == fg && self.bg == bg
    }
}

/// An ordered, run-length encoded styled string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedString {
    runs: Vec<Run>,
}

impl FormattedString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_plain(text: &str, attrs: Attrs, fg: Color, bg: Color) -> Self {
        let mut s = Self::new();
        s.push_str(text, attrs, fg, bg);
        s
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    /// Length in codepoints, not bytes.
    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| r.text.chars().count()).sum()
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Append `text` with the given style, merging into the trailing run
    /// when its style matches.
    pub fn push_str(&mut self, text: &str, attrs: Attrs, fg: Color, bg: Color) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            if last.style_eq(attrs, fg, bg) {
                last.text.push_str(text);
                return;
            }
        }
        self.runs.push(Run {
            text: text.to_string(),
            attrs,
            fg,
            bg,
        });
    }

    /// Append another formatted string's runs, merging the boundary run if
    /// styles match.
    pub fn append(&mut self, other: &FormattedString) {
        for run in &other.runs {
            self.push_str(&run.text, run.attrs, run.fg, run.bg);
        }
    }

    /// Single codepoint at position `i`, as a one-character string with its
    /// style, or `None` if out of range.
    pub fn index(&self, i: usize) -> Option<(char, Attrs, Color, Color)> {
        let mut pos = 0;
        for run in &self.runs {
            let run_len = run.text.chars().count();
            if i < pos + run_len {
                let c = run.text.chars().nth(i - pos).unwrap();
                return Some((c, run.attrs, run.fg, run.bg));
            }
            pos += run_len;
        }
        None
    }

    /// Codepoint range `[start, end)`, preserving per-run attribution.
    pub fn slice(&self, start: usize, end: usize) -> FormattedString {
        let mut out = FormattedString::new();
        if start >= end {
            return out;
        }
        let mut pos = 0;
        for run in &self.runs {
            let run_len = run.text.chars().count();
            let run_start = pos;
            let run_end = pos + run_len;
            pos = run_end;
            if run_end <= start || run_start >= end {
                continue;
            }
            let local_start = start.saturating_sub(run_start);
            let local_end = (end.min(run_end)) - run_start;
            let slice: String = run
                .text
                .chars()
                .skip(local_start)
                .take(local_end - local_start)
                .collect();
            out.push_str(&slice, run.attrs, run.fg, run.bg);
        }
        out
    }

    /// Pad with default-styled spaces on the right until at least `n`
    /// codepoints long. No-op if already long enough.
    pub fn ljust(&mut self, n: usize) {
        let cur = self.len();
        if cur < n {
            let pad: String = std::iter::repeat(' ').take(n - cur).collect();
            self.push_str(&pad, Attrs::default(), Color::Default, Color::Default);
        }
    }

    /// Strip trailing whitespace, run by run, stopping at the first
    /// (rightmost) run carrying a non-default background: colored trailing
    /// space is meaningful and must be preserved.
    pub fn rstrip(&mut self) {
        while let Some(last) = self.runs.last_mut() {
            if last.bg != Color::Default {
                break;
            }
            let trimmed = last.text.trim_end().to_string();
            if trimmed.len() == last.text.len() {
                break;
            }
            if trimmed.is_empty() {
                self.runs.pop();
            } else {
                last.text = trimmed;
                break;
            }
        }
    }

    /// Render as a plain string, discarding style.
    pub fn to_plain_string(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> FormattedString {
        FormattedString::from_plain(s, Attrs::default(), Color::Default, Color::Default)
    }

    #[test]
    fn empty_has_no_runs() {
        let s = FormattedString::new();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn adjacent_runs_merge_on_push() {
        let mut s = FormattedString::new();
        s.push_str("ab", Attrs::default(), Color::Default, Color::Default);
        s.push_str("cd", Attrs::default(), Color::Default, Color::Default);
        assert_eq!(s.runs().len(), 1);
        assert_eq!(s.to_plain_string(), "abcd");
    }

    #[test]
    fn different_style_creates_new_run() {
        let mut s = FormattedString::new();
        s.push_str("ab", Attrs::default(), Color::Default, Color::Default);
        s.push_str("cd", Attrs { bold: true, ..Attrs::default() }, Color::Default, Color::Default);
        assert_eq!(s.runs().len(), 2);
    }

    #[test]
    fn slice_preserves_attribution() {
        let mut s = FormattedString::new();
        s.push_str("ab", Attrs::default(), Color::Default, Color::Default);
        s.push_str("CD", Attrs { bold: true, ..Attrs::default() }, Color::Red, Color::Default);
        let sl = s.slice(1, 3);
        assert_eq!(sl.to_plain_string(), "bC");
        assert_eq!(sl.runs().len(), 2);
        assert_eq!(sl.runs()[1].fg, Color::Red);
    }

    #[test]
    fn ljust_pads_to_length() {
        let mut s = plain("ab");
        s.ljust(5);
        assert_eq!(s.to_plain_string(), "ab   ");
    }

    #[test]
    fn ljust_no_op_when_already_long_enough() {
        let mut s = plain("abcdef");
        s.ljust(3);
        assert_eq!(s.to_plain_string(), "abcdef");
    }

    #[test]
    fn rstrip_trims_default_background_whitespace() {
        let mut s = plain("hello   ");
        s.rstrip();
        assert_eq!(s.to_plain_string(), "hello");
    }

    #[test]
    fn rstrip_preserves_colored_trailing_space() {
        let mut s = plain("hello");
        s.push_str("  ", Attrs::default(), Color::Default, Color::Red);
        s.rstrip();
        assert_eq!(s.to_plain_string(), "hello  ");
    }

    #[test]
    fn index_returns_char_and_style() {
        let s = plain("xy");
        let (c, _, _, _) = s.index(1).unwrap();
        assert_eq!(c, 'y');
        assert!(s.index(5).is_none());
    }

    #[test]
    fn append_merges_boundary_run() {
        let mut a = plain("ab");
        let b = plain("cd");
        a.append(&b);
        assert_eq!(a.runs().len(), 1);
        assert_eq!(a.to_plain_string(), "abcd");
    }
}
