//! Table colour themes

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Blue,
    Red,
    Green,
    Purple,
}

/// The three colours a theme paints a table with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub primary: &'static str,
    pub dark: &'static str,
    pub light: &'static str,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Blue, Theme::Red, Theme::Green, Theme::Purple];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Blue => "blue",
            Theme::Red => "red",
            Theme::Green => "green",
            Theme::Purple => "purple",
        }
    }

    /// Resolve a stored theme name; unknown names fall back to green.
    pub fn from_name(name: &str) -> Theme {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .unwrap_or(Theme::Green)
    }

    pub fn random() -> Theme {
        *Self::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&Theme::Green)
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Blue => Palette {
                primary: "#006B97",
                dark: "#08506D",
                light: "#DCF5FF",
            },
            Theme::Red => Palette {
                primary: "#E34432",
                dark: "#D87367",
                light: "#FDD5D1",
            },
            Theme::Green => Palette {
                primary: "#04AC6B",
                dark: "#02623D",
                light: "#D2F5E8",
            },
            Theme::Purple => Palette {
                primary: "#A259FF",
                dark: "#420096",
                light: "#F1E5FF",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for theme in Theme::ALL {
            assert_eq!(Theme::from_name(theme.name()), theme);
        }
        assert_eq!(Theme::from_name("chartreuse"), Theme::Green);
        assert_eq!(Theme::from_name(""), Theme::Green);
    }

    #[test]
    fn test_random_is_a_known_theme() {
        for _ in 0..20 {
            assert!(Theme::ALL.contains(&Theme::random()));
        }
    }
}
