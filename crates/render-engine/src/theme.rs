//! Named color themes for the animated quote.

use clipdeck_common::error::{ClipdeckError, ClipdeckResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    /// Gradient color at the top-left corner.
    pub start: [u8; 3],
    /// Gradient color at the bottom-right corner.
    pub end: [u8; 3],
    pub text: [u8; 3],
    /// Author label and particle color.
    pub accent: [u8; 3],
}

pub const THEMES: [Theme; 5] = [
    Theme {
        name: "sunset",
        start: [255, 94, 98],
        end: [255, 153, 102],
        text: [255, 255, 255],
        accent: [255, 236, 210],
    },
    Theme {
        name: "ocean",
        start: [33, 147, 176],
        end: [109, 213, 237],
        text: [255, 255, 255],
        accent: [224, 247, 250],
    },
    Theme {
        name: "forest",
        start: [19, 78, 94],
        end: [113, 178, 128],
        text: [255, 255, 255],
        accent: [220, 237, 200],
    },
    Theme {
        name: "midnight",
        start: [35, 37, 38],
        end: [65, 67, 69],
        text: [236, 240, 241],
        accent: [149, 165, 166],
    },
    Theme {
        name: "aurora",
        start: [0, 201, 255],
        end: [146, 254, 157],
        text: [20, 30, 48],
        accent: [255, 255, 255],
    },
];

/// Look up a theme by name, ignoring case.
pub fn theme_by_name(name: &str) -> ClipdeckResult<Theme> {
    THEMES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
        .copied()
        .ok_or_else(|| {
            let known: Vec<&str> = THEMES.iter().map(|t| t.name).collect();
            ClipdeckError::invalid_input(format!(
                "Unknown theme '{name}' (expected one of: {})",
                known.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(theme_by_name("Ocean").unwrap().name, "ocean");
        assert_eq!(theme_by_name(" sunset ").unwrap().name, "sunset");
    }

    #[test]
    fn test_unknown_theme() {
        let err = theme_by_name("neon").unwrap_err();
        assert!(matches!(err, ClipdeckError::InvalidInput { .. }));
        assert!(err.to_string().contains("aurora"));
    }

    #[test]
    fn test_names_unique() {
        for (i, a) in THEMES.iter().enumerate() {
            for b in &THEMES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
