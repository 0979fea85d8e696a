//! Error types shared across Clipdeck crates.
//!
//! Every failure that leaves a public pipeline entry point is a
//! [`ClipdeckError`]. Callers that face a user turn it into a status line
//! with [`ClipdeckError::status_message`]; raw platform errors never cross
//! that boundary unwrapped.

use std::path::PathBuf;

/// Top-level error type for Clipdeck operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClipdeckError {
    /// The host cannot run the pipeline at all (no encoder, no decoder, no font).
    #[error("Capability error: {message}")]
    Capability { message: String },

    /// The input was rejected before any session started.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// A running session failed; partial output was discarded.
    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Audio error: {message}")]
    Audio { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("JSON error: {message}")]
    Json { message: String },

    #[error("{message}")]
    Other { message: String },
}

/// Result type alias using ClipdeckError.
pub type ClipdeckResult<T> = Result<T, ClipdeckError>;

/// Coarse grouping used to pick the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Pipeline never started because the platform lacks a primitive.
    Capability,
    /// Action rejected up front.
    InvalidInput,
    /// Session aborted mid-stream.
    MidSession,
    /// Anything else (I/O, config, rendering bugs).
    Internal,
}

impl ClipdeckError {
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Which bucket of the error taxonomy this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Capability { .. } => ErrorClass::Capability,
            Self::InvalidInput { .. } | Self::FileNotFound { .. } => ErrorClass::InvalidInput,
            Self::Session { .. } => ErrorClass::MidSession,
            _ => ErrorClass::Internal,
        }
    }

    /// One-line status string suitable for showing to the user.
    pub fn status_message(&self) -> String {
        match self {
            Self::Capability { message } => {
                format!("Not supported on this system: {message}")
            }
            Self::InvalidInput { message } => format!("Cannot start: {message}"),
            Self::FileNotFound { path } => {
                format!("Cannot start: file not found: {}", path.display())
            }
            Self::Session { message } => {
                format!("Processing failed, no output was produced: {message}")
            }
            other => format!("Processing failed: {other}"),
        }
    }
}

impl From<std::io::Error> for ClipdeckError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ClipdeckError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for ClipdeckError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            message: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_status_is_distinct_from_processing_failure() {
        let cap = ClipdeckError::capability("ffmpeg not found").status_message();
        let failed = ClipdeckError::session("encoder crashed").status_message();
        assert!(cap.starts_with("Not supported"));
        assert!(failed.starts_with("Processing failed"));
        assert_ne!(cap, failed);
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            ClipdeckError::invalid_input("zero-area selection").class(),
            ErrorClass::InvalidInput
        );
        assert_eq!(
            ClipdeckError::session("boom").class(),
            ErrorClass::MidSession
        );
        let io: ClipdeckError = std::io::Error::other("disk").into();
        assert_eq!(io.class(), ErrorClass::Internal);
    }
}
