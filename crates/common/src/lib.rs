//! Clipdeck Common Utilities
//!
//! Shared infrastructure for all Clipdeck crates:
//! - Error taxonomy and result aliases
//! - Host capability probing
//! - Recording clock and frame pacing
//! - Tracing/logging initialization
//! - Configuration loading

pub mod capability;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
