//! Line-drawing glyphs
//!
//! Border character sets for bordered windows and the alternate character
//! set (ACS) letters used by `addgrstr` and the `ALTCHARSET` attribute.

use serde::{Deserialize, Serialize};

/// Border drawing style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Single,
    Double,
    Rounded,
}

/// Border characters
#[derive(Clone, Copy, Debug)]
pub struct BorderChars {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

impl BorderChars {
    pub fn single() -> Self {
        Self {
            top_left: '┌',
            top_right: '┐',
            bottom_left: '└',
            bottom_right: '┘',
            horizontal: '─',
            vertical: '│',
        }
    }

    pub fn double() -> Self {
        Self {
            top_left: '╔',
            top_right: '╗',
            bottom_left: '╚',
            bottom_right: '╝',
            horizontal: '═',
            vertical: '║',
        }
    }

    pub fn rounded() -> Self {
        Self {
            top_left: '╭',
            top_right: '╮',
            bottom_left: '╰',
            bottom_right: '╯',
            ..Self::single()
        }
    }

    pub fn for_style(style: BorderStyle) -> Self {
        match style {
            BorderStyle::Single => Self::single(),
            BorderStyle::Double => Self::double(),
            BorderStyle::Rounded => Self::rounded(),
        }
    }
}

/// Map an ACS letter to its line-drawing glyph; anything else passes through
pub fn acs_glyph(ch: char) -> char {
    match ch {
        'l' => '┌',
        'k' => '┐',
        'm' => '└',
        'j' => '┘',
        'q' => '─',
        'x' => '│',
        't' => '├',
        'u' => '┤',
        'v' => '┴',
        'w' => '┬',
        'n' => '┼',
        'o' => '⎺',
        'p' => '⎻',
        'r' => '⎼',
        's' => '⎽',
        '`' => '◆',
        'a' => '▒',
        'f' => '°',
        'g' => '±',
        '~' => '·',
        ',' => '←',
        '+' => '→',
        '-' => '↑',
        '.' => '↓',
        'h' => '░',
        'i' => '☃',
        '0' => '█',
        'y' => '≤',
        'z' => '≥',
        '{' => 'π',
        '|' => '≠',
        '}' => '£',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acs_box_letters() {
        let top: String = "lqqk".chars().map(acs_glyph).collect();
        let bottom: String = "mqqj".chars().map(acs_glyph).collect();
        assert_eq!(top, "┌──┐");
        assert_eq!(bottom, "└──┘");
    }

    #[test]
    fn test_acs_passthrough() {
        assert_eq!(acs_glyph('A'), 'A');
        assert_eq!(acs_glyph(' '), ' ');
    }

    #[test]
    fn test_rounded_keeps_single_lines() {
        let chars = BorderChars::for_style(BorderStyle::Rounded);
        assert_eq!(chars.top_left, '╭');
        assert_eq!(chars.horizontal, '─');
    }
}
