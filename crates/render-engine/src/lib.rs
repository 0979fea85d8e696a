//! Clipdeck Render Engine
//!
//! Draws one frame at a time into an off-screen RGBA surface. What gets
//! drawn is decided here; when it gets drawn is up to the scheduler.
//!
//! # Frame Flow
//!
//! ```text
//! VideoSource ── SourceRect ──▶ CropCompositor ──┐
//!                                                ├──▶ RgbaImage ──▶ recorder
//! QuoteScene ── theme, text ──▶ QuoteCompositor ─┘
//!
//! Redraw ──▶ render_selection_overlay ──▶ RgbaImage (mask over preview)
//! ```

pub mod compositor;
pub mod overlay;
pub mod quote;
pub mod surface;
pub mod text;
pub mod theme;

pub use compositor::{CropCompositor, FrameCompositor, FrameOutcome, VideoSource};
pub use overlay::render_selection_overlay;
pub use quote::{QuoteCompositor, QuoteScene};
pub use text::{wrap_text, FontPainter, GlyphPainter};
pub use theme::{theme_by_name, Theme, THEMES};
