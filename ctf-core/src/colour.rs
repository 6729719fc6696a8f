//! Team colours.
//!
//! Every team is identified by one of a fixed, ordered set of colours. The
//! ordinal is what gets persisted, so the declaration order below is part of
//! the save format and must never be reshuffled.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::Ordinal;

/// One of the sixteen team colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamColour {
    /// White.
    White,
    /// Orange.
    Orange,
    /// Magenta.
    Magenta,
    /// Light blue. Also used to render positions in chat.
    LightBlue,
    /// Yellow. The default chat colour.
    Yellow,
    /// Green.
    Green,
    /// Pink.
    Pink,
    /// Gray.
    Gray,
    /// Light gray.
    LightGray,
    /// Cyan.
    Cyan,
    /// Purple.
    Purple,
    /// Blue.
    Blue,
    /// Brown.
    Brown,
    /// Dark green.
    DarkGreen,
    /// Red.
    Red,
    /// Black.
    Black,
}

impl TeamColour {
    /// All colours in declaration (ordinal) order.
    pub const ALL: [Self; 16] = [
        Self::White,
        Self::Orange,
        Self::Magenta,
        Self::LightBlue,
        Self::Yellow,
        Self::Green,
        Self::Pink,
        Self::Gray,
        Self::LightGray,
        Self::Cyan,
        Self::Purple,
        Self::Blue,
        Self::Brown,
        Self::DarkGreen,
        Self::Red,
        Self::Black,
    ];

    /// Human-readable name, e.g. `"Light Blue"`.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Orange => "Orange",
            Self::Magenta => "Magenta",
            Self::LightBlue => "Light Blue",
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Pink => "Pink",
            Self::Gray => "Gray",
            Self::LightGray => "Light Gray",
            Self::Cyan => "Cyan",
            Self::Purple => "Purple",
            Self::Blue => "Blue",
            Self::Brown => "Brown",
            Self::DarkGreen => "Dark Green",
            Self::Red => "Red",
            Self::Black => "Black",
        }
    }

    /// Normalized name used inside store keys, e.g. `"light_blue"`.
    #[must_use]
    pub fn internal_name(self) -> String {
        self.display_name().replace(' ', "_").to_lowercase()
    }
}

impl Ordinal for TeamColour {
    fn ordinal(&self) -> i32 {
        *self as i32
    }

    fn from_ordinal(ordinal: i32) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    fn first() -> Self {
        Self::ALL[0]
    }
}

impl fmt::Display for TeamColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_declaration_order() {
        for (i, colour) in TeamColour::ALL.iter().enumerate() {
            assert_eq!(colour.ordinal(), i as i32);
            assert_eq!(TeamColour::from_ordinal(i as i32), Some(*colour));
        }
        assert_eq!(TeamColour::from_ordinal(16), None);
        assert_eq!(TeamColour::from_ordinal(-1), None);
    }

    #[test]
    fn internal_names_are_key_safe() {
        assert_eq!(TeamColour::LightGray.internal_name(), "light_gray");
        assert_eq!(TeamColour::Red.internal_name(), "red");
        for colour in TeamColour::ALL {
            assert!(!colour.internal_name().contains(' '));
        }
    }
}
