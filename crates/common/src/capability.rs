//! Host capability detection.
//!
//! Pipelines probe for the external primitives they need before starting,
//! so a missing encoder surfaces as a capability error instead of a
//! mid-session failure.

use std::path::{Path, PathBuf};
use std::process::Command;

/// A host capability that Clipdeck may need.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Check whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Well-known locations of a sans-serif TrueType font.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First system font that exists on disk.
pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// Check all capabilities and report status.
pub fn check_capabilities(font_override: Option<&Path>) -> Vec<Capability> {
    vec![
        check_binary(
            "ffmpeg",
            "Video encoder (WebM recording, non-WAV audio decoding)",
            true,
        ),
        check_binary(
            "ffprobe",
            "Media probe (native resolution, duration, audio tracks)",
            true,
        ),
        check_font(font_override),
    ]
}

fn check_binary(binary: &str, description: &str, required: bool) -> Capability {
    let available = command_exists(binary);
    Capability {
        name: binary.to_string(),
        description: description.to_string(),
        available,
        required,
        fix_instructions: if available {
            None
        } else {
            Some(format!(
                "Install {binary} (e.g. `sudo apt install ffmpeg` or `brew install ffmpeg`)"
            ))
        },
    }
}

fn check_font(font_override: Option<&Path>) -> Capability {
    let available = match font_override {
        Some(path) => path.exists(),
        None => find_system_font().is_some(),
    };
    Capability {
        name: "Font".to_string(),
        description: "TrueType font for animated quote text".to_string(),
        available,
        required: false,
        fix_instructions: if available {
            None
        } else {
            Some("Pass --font <file.ttf> or set animation.font_path in the config".to_string())
        },
    }
}

/// Print a capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING]"
        } else {
            "[WARN]"
        };
        println!("{status} {}: {}", cap.name, cap.description);
        if let Some(fix) = &cap.fix_instructions {
            println!("     Fix: {fix}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_reported() {
        let cap = check_binary("clipdeck-definitely-not-installed", "test", true);
        assert!(!cap.available);
        assert!(cap.fix_instructions.is_some());
    }

    #[test]
    fn test_font_override_must_exist() {
        let cap = check_font(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!cap.available);
    }
}
