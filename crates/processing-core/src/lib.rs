//! Clipdeck Processing Core
//!
//! Interaction and timing logic for the media pipelines:
//! - **Region selection:** pure reducer over pointer events producing a crop rectangle
//! - **Scheduling:** start/stop/tick loop that turns wall-clock time into progress
//!
//! This crate is pure computation with no I/O and no rendering surface.
//! All inputs are data; all outputs are data.

pub mod region_select;
pub mod scheduler;

pub use region_select::{
    extract_point, reduce, PointerInput, PointerPhase, Redraw, RegionSelector, SelectorEvent,
    SelectorState,
};
pub use scheduler::{AnimationScheduler, StopCondition, Tick};
