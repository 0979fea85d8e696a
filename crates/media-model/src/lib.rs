//! Clipdeck Media Model
//!
//! Defines the data contracts shared by the media pipelines:
//! - **Geometry:** display-space and source-space crop rectangles
//! - **Audio:** decoded stereo buffers and their phase-cancelled mix
//! - **Session:** the lifecycle of a single recording
//! - **Asset:** the immutable encoded output of a pipeline run
//!
//! Display coordinates are CSS-like pixels of the (possibly stretched)
//! preview surface; source coordinates are native media pixels.

pub mod asset;
pub mod audio;
pub mod geometry;
pub mod session;

pub use asset::*;
pub use audio::*;
pub use geometry::*;
pub use session::*;
