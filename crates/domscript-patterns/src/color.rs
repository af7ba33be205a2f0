use once_cell::sync::Lazy;
use std::fmt;

/// Recognized color names, in declaration order
pub const COLOR_VOCABULARY: &[&str] = &[
    "red",
    "blue",
    "green",
    "yellow",
    "purple",
    "orange",
    "pink",
    "black",
    "white",
    "gray",
    "grey",
    "brown",
    "cyan",
    "magenta",
    "lime",
    "navy",
    "maroon",
    "olive",
    "teal",
    "silver",
    "gold",
    "lightpink",
    "lightblue",
    "lightgreen",
];

/// Colors the prompt enhancer treats as an explicit color request
pub const BASIC_COLORS: &[&str] = &["red", "blue", "green", "yellow", "purple", "orange", "pink"];

pub const DEFAULT_COLOR: ColorToken = ColorToken("blue");

// Longest names first so "pink" never pre-empts "lightpink".
static BY_LENGTH: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut colors = COLOR_VOCABULARY.to_vec();
    colors.sort_by(|a, b| b.len().cmp(&a.len()));
    colors
});

/// A member of [`COLOR_VOCABULARY`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorToken(&'static str);

impl ColorToken {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Longest vocabulary color mentioned in `text`, if any
pub fn find_color(text: &str) -> Option<ColorToken> {
    let lower = text.to_lowercase();
    BY_LENGTH
        .iter()
        .find(|color| lower.contains(*color))
        .map(|color| ColorToken(color))
}

/// Like [`find_color`] but total: falls back to [`DEFAULT_COLOR`]
pub fn extract_color(text: &str) -> ColorToken {
    find_color(text).unwrap_or(DEFAULT_COLOR)
}

/// True when `text` mentions one of [`BASIC_COLORS`]
pub fn mentions_basic_color(lower: &str) -> bool {
    BASIC_COLORS.iter().any(|color| lower.contains(color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_match_wins() {
        assert_eq!(extract_color("make it lightpink").as_str(), "lightpink");
        assert_eq!(extract_color("LightBlue links").as_str(), "lightblue");
        assert_eq!(extract_color("pink please").as_str(), "pink");
    }

    #[test]
    fn test_default_when_absent() {
        assert_eq!(extract_color("hide images"), DEFAULT_COLOR);
        assert_eq!(find_color("hide images"), None);
        assert_eq!(extract_color(""), DEFAULT_COLOR);
    }

    #[test]
    fn test_substring_inside_words_counts() {
        // "bored" contains "red"; matching is plain substring search
        assert_eq!(find_color("I am bored").map(|c| c.as_str()), Some("red"));
    }

    #[test]
    fn test_basic_colors_subset_of_vocabulary() {
        for color in BASIC_COLORS {
            assert!(COLOR_VOCABULARY.contains(color));
        }
        assert!(mentions_basic_color("make buttons purple"));
        assert!(!mentions_basic_color("make buttons teal"));
    }
}
