//! Color and attribute model for the console's text runs.
//!
//! Covers the eight-color, six-attribute subset this emulator models, with
//! RGB and 256-color SGR values approximated to the nearest base color.

use std::fmt;

/// One of the eight base colors, or the terminal's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

/// Current text attribute state. A plain bool-per-flag struct rather than a
/// bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attrs {
    pub bold: bool,
    pub dim: bool,
    pub underline: bool,
    pub blink: bool,
    pub reverse: bool,
    pub invisible: bool,
}

impl Attrs {
    pub fn reset(&mut self) {
        *self = Attrs::default();
    }
}

/// RGB reference palette used to approximate 24-bit and 256-color SGR values
/// down to the eight base colors this emulator models.
const PALETTE: [(Color, u8, u8, u8); 8] = [
    (Color::Black, 0, 0, 0),
    (Color::Red, 174, 0, 0),
    (Color::Green, 0, 174, 0),
    (Color::Yellow, 174, 174, 0),
    (Color::Blue, 0, 0, 174),
    (Color::Magenta, 174, 0, 174),
    (Color::Cyan, 0, 174, 174),
    (Color::White, 174, 174, 174),
];

/// Approximate an arbitrary RGB triple to the nearest base color by squared
/// Euclidean distance.
pub fn approximate_rgb(r: u8, g: u8, b: u8) -> Color {
    PALETTE
        .iter()
        .min_by_key(|(_, pr, pg, pb)| {
            let dr = i32::from(*pr) - i32::from(r);
            let dg = i32::from(*pg) - i32::from(g);
            let db = i32::from(*pb) - i32::from(b);
            dr * dr + dg * dg + db * db
        })
        .map(|(c, ..)| *c)
        .unwrap_or(Color::Default)
}

/// Decode an xterm 256-color palette index into an RGB triple, then
/// approximate it to a base color. Indices 0-15 fold onto the same eight
/// base colors (this subset doesn't distinguish "bright" variants).
pub fn approximate_256(index: u8) -> Color {
    match index {
        0..=7 => PALETTE[index as usize].0,
        8..=15 => PALETTE[(index - 8) as usize].0,
        16..=231 => {
            let i = index - 16;
            let r = i / 36;
            let g = (i % 36) / 6;
            let b = i % 6;
            let scale = |v: u8| (u16::from(v) * 256 / 6) as u8;
            approximate_rgb(scale(r), scale(g), scale(b))
        }
        _ => {
            let n = u16::from(index - 232);
            let level = ((n * 256) / 23).min(255) as u8;
            approximate_rgb(level, level, level)
        }
    }
}

/// Decode a base-color SGR parameter (0-7) to a `Color`.
pub fn base_color(n: u16) -> Color {
    match n {
        0 => Color::Black,
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        7 => Color::White,
        _ => Color::Default,
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Default => "default",
            Color::Black => "black",
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Magenta => "magenta",
            Color::Cyan => "cyan",
            Color::White => "white",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approximates_pure_red_to_red() {
        assert_eq!(approximate_rgb(255, 0, 0), Color::Red);
    }

    #[test]
    fn approximates_near_black_to_black() {
        assert_eq!(approximate_rgb(10, 5, 0), Color::Black);
    }

    #[test]
    fn decodes_256_base_range() {
        assert_eq!(approximate_256(1), Color::Red);
        assert_eq!(approximate_256(9), Color::Red);
    }

    #[test]
    fn decodes_256_grayscale_to_white_at_top() {
        assert_eq!(approximate_256(255), Color::White);
    }

    #[test]
    fn attrs_reset_clears_everything() {
        let mut a = Attrs {
            bold: true,
            dim: true,
            ..Attrs::default()
        };
        a.reset();
        assert_eq!(a, Attrs::default());
    }
}
