//! Interactive crop-region selection.
//!
//! The selector is a three-state machine driven by pointer events:
//!
//! ```text
//!            down              up / leave
//!   Idle ──────────▶ Dragging ───────────▶ Selected
//!                     ▲   │ move                │
//!                     └───┘                     │ down (restart)
//!                     ▲─────────────────────────┘
//! ```
//!
//! [`reduce`] is the pure transition function. [`RegionSelector`] wraps it
//! with the surface geometry and tells the caller when the overlay must be
//! redrawn.

use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use clipdeck_media_model::geometry::{
    CoordinateMapper, DisplayRect, PixelRect, PixelSize, Point, Size, SourceRect,
};
use serde::Serialize;

/// Raw pointer input from either a mouse or a touch screen.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    /// Mouse position in client (window) coordinates.
    Mouse { client: Point },
    /// Active touch points in client coordinates; the first one drives selection.
    Touch { touches: Vec<Point> },
}

/// Convert client coordinates to surface-local coordinates.
///
/// Mouse and touch share this routine. The result is clamped to the surface.
/// Returns `None` for a touch event with no touch points.
pub fn extract_point(input: &PointerInput, surface_origin: Point, display: Size) -> Option<Point> {
    let client = match input {
        PointerInput::Mouse { client } => *client,
        PointerInput::Touch { touches } => *touches.first()?,
    };
    Some(Point::new(
        (client.x - surface_origin.x).clamp(0.0, display.width.max(0.0)),
        (client.y - surface_origin.y).clamp(0.0, display.height.max(0.0)),
    ))
}

/// A selector input, already in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectorEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    PointerLeave,
    Resize(Size),
}

/// Selection state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectorState {
    #[default]
    Idle,
    Dragging {
        anchor: Point,
        rect: DisplayRect,
    },
    Selected {
        rect: DisplayRect,
    },
}

impl SelectorState {
    /// The current rectangle, if any.
    pub fn rect(&self) -> Option<DisplayRect> {
        match self {
            Self::Idle => None,
            Self::Dragging { rect, .. } | Self::Selected { rect } => Some(*rect),
        }
    }
}

/// Pure transition function.
pub fn reduce(state: SelectorState, event: &SelectorEvent) -> SelectorState {
    match (state, event) {
        // A press anywhere starts (or restarts) a selection.
        (_, SelectorEvent::PointerDown(p)) => SelectorState::Dragging {
            anchor: *p,
            rect: DisplayRect::at(*p),
        },
        (SelectorState::Dragging { anchor, .. }, SelectorEvent::PointerMove(p)) => {
            SelectorState::Dragging {
                anchor,
                rect: DisplayRect::from_corners(anchor, *p),
            }
        }
        (
            SelectorState::Dragging { rect, .. },
            SelectorEvent::PointerUp | SelectorEvent::PointerLeave,
        ) => SelectorState::Selected { rect },
        (state, _) => state,
    }
}

/// Overlay redraw request emitted after a state change or resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redraw {
    pub display: Size,
    pub rect: Option<DisplayRect>,
    pub dragging: bool,
}

/// Which pointer callback fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Leave,
}

/// Selection session bound to one preview surface.
#[derive(Debug, Clone)]
pub struct RegionSelector {
    state: SelectorState,
    display: Size,
    surface_origin: Point,
}

impl RegionSelector {
    /// Create a selector for a surface of `display` size at the client origin.
    pub fn new(display: Size) -> Self {
        Self {
            state: SelectorState::Idle,
            display,
            surface_origin: Point::default(),
        }
    }

    /// Place the surface at `origin` in client coordinates.
    pub fn with_surface_origin(mut self, origin: Point) -> Self {
        self.surface_origin = origin;
        self
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn display_size(&self) -> Size {
        self.display
    }

    pub fn rect(&self) -> Option<DisplayRect> {
        self.state.rect()
    }

    /// Feed a raw pointer callback through the shared coordinate extraction.
    pub fn pointer(&mut self, phase: PointerPhase, input: &PointerInput) -> Option<Redraw> {
        let event = match phase {
            PointerPhase::Down => {
                SelectorEvent::PointerDown(extract_point(input, self.surface_origin, self.display)?)
            }
            PointerPhase::Move => {
                SelectorEvent::PointerMove(extract_point(input, self.surface_origin, self.display)?)
            }
            PointerPhase::Up => SelectorEvent::PointerUp,
            PointerPhase::Leave => SelectorEvent::PointerLeave,
        };
        self.dispatch(&event)
    }

    /// Apply an event. Returns a redraw request when the overlay is stale.
    pub fn dispatch(&mut self, event: &SelectorEvent) -> Option<Redraw> {
        if let SelectorEvent::Resize(size) = event {
            self.display = *size;
            tracing::debug!(
                width = size.width,
                height = size.height,
                "Selection surface resized"
            );
            return Some(self.redraw());
        }

        let next = reduce(self.state, event);
        if next == self.state {
            return None;
        }
        if matches!(next, SelectorState::Selected { .. }) {
            tracing::debug!(rect = ?next.rect(), "Selection completed");
        }
        self.state = next;
        Some(self.redraw())
    }

    /// Current overlay contents.
    pub fn redraw(&self) -> Redraw {
        Redraw {
            display: self.display,
            rect: self.state.rect(),
            dragging: matches!(self.state, SelectorState::Dragging { .. }),
        }
    }

    /// Current rectangle mapped to native pixels. `None` before layout or selection.
    pub fn source_rect(&self, native: PixelSize) -> Option<SourceRect> {
        if !self.display.is_laid_out() {
            return None;
        }
        let rect = self.state.rect()?;
        Some(CoordinateMapper::to_source(&rect, self.display, native))
    }

    /// The finished selection, validated for capture.
    pub fn capture_region(&self, native: PixelSize) -> ClipdeckResult<PixelRect> {
        let SelectorState::Selected { .. } = self.state else {
            return Err(ClipdeckError::invalid_input(
                "No completed selection; drag out a region first",
            ));
        };
        let source = self.source_rect(native).ok_or_else(|| {
            ClipdeckError::invalid_input("Preview surface has not been laid out")
        })?;
        source.require_capturable(native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mouse(x: f64, y: f64) -> PointerInput {
        PointerInput::Mouse {
            client: Point::new(x, y),
        }
    }

    #[test]
    fn test_reverse_drag_is_normalized() {
        let mut selector = RegionSelector::new(Size::new(640.0, 360.0));
        selector.pointer(PointerPhase::Down, &mouse(50.0, 50.0));
        selector.pointer(PointerPhase::Move, &mouse(10.0, 10.0));
        selector.pointer(PointerPhase::Up, &mouse(10.0, 10.0));
        assert_eq!(
            selector.state(),
            SelectorState::Selected {
                rect: DisplayRect::new(10.0, 10.0, 40.0, 40.0)
            }
        );
    }

    #[test]
    fn test_pointer_down_initializes_zero_rect() {
        let state = reduce(
            SelectorState::Idle,
            &SelectorEvent::PointerDown(Point::new(5.0, 7.0)),
        );
        assert_eq!(
            state,
            SelectorState::Dragging {
                anchor: Point::new(5.0, 7.0),
                rect: DisplayRect::new(5.0, 7.0, 0.0, 0.0),
            }
        );
    }

    #[test]
    fn test_leave_freezes_selection() {
        let mut state = reduce(
            SelectorState::Idle,
            &SelectorEvent::PointerDown(Point::new(0.0, 0.0)),
        );
        state = reduce(state, &SelectorEvent::PointerMove(Point::new(20.0, 30.0)));
        state = reduce(state, &SelectorEvent::PointerLeave);
        let frozen = reduce(state, &SelectorEvent::PointerMove(Point::new(90.0, 90.0)));
        assert_eq!(frozen.rect(), Some(DisplayRect::new(0.0, 0.0, 20.0, 30.0)));
    }

    #[test]
    fn test_new_press_restarts_selection() {
        let state = SelectorState::Selected {
            rect: DisplayRect::new(0.0, 0.0, 100.0, 100.0),
        };
        let next = reduce(state, &SelectorEvent::PointerDown(Point::new(300.0, 200.0)));
        assert_eq!(next.rect(), Some(DisplayRect::new(300.0, 200.0, 0.0, 0.0)));
    }

    #[test]
    fn test_move_while_idle_does_not_redraw() {
        let mut selector = RegionSelector::new(Size::new(100.0, 100.0));
        assert!(selector.pointer(PointerPhase::Move, &mouse(3.0, 3.0)).is_none());
        assert!(selector.pointer(PointerPhase::Up, &mouse(3.0, 3.0)).is_none());
    }

    #[test]
    fn test_touch_and_mouse_share_extraction() {
        let origin = Point::new(100.0, 40.0);
        let display = Size::new(640.0, 360.0);
        let from_mouse = extract_point(&mouse(150.0, 90.0), origin, display);
        let from_touch = extract_point(
            &PointerInput::Touch {
                touches: vec![Point::new(150.0, 90.0), Point::new(0.0, 0.0)],
            },
            origin,
            display,
        );
        assert_eq!(from_mouse, Some(Point::new(50.0, 50.0)));
        assert_eq!(from_mouse, from_touch);
        assert_eq!(
            extract_point(&PointerInput::Touch { touches: vec![] }, origin, display),
            None
        );
    }

    #[test]
    fn test_points_are_clamped_to_surface() {
        let p = extract_point(&mouse(-20.0, 900.0), Point::default(), Size::new(640.0, 360.0));
        assert_eq!(p, Some(Point::new(0.0, 360.0)));
    }

    #[test]
    fn test_resize_requests_redraw_with_latest_rect() {
        let mut selector = RegionSelector::new(Size::new(640.0, 360.0));
        selector.pointer(PointerPhase::Down, &mouse(10.0, 10.0));
        selector.pointer(PointerPhase::Move, &mouse(60.0, 40.0));
        let redraw = selector
            .dispatch(&SelectorEvent::Resize(Size::new(1280.0, 720.0)))
            .unwrap();
        assert_eq!(redraw.display, Size::new(1280.0, 720.0));
        assert_eq!(redraw.rect, Some(DisplayRect::new(10.0, 10.0, 50.0, 30.0)));
        assert!(redraw.dragging);
    }

    #[test]
    fn test_zero_area_selection_cannot_be_captured() {
        let mut selector = RegionSelector::new(Size::new(640.0, 360.0));
        selector.pointer(PointerPhase::Down, &mouse(10.0, 10.0));
        selector.pointer(PointerPhase::Up, &mouse(10.0, 10.0));
        assert!(matches!(selector.state(), SelectorState::Selected { .. }));
        let err = selector
            .capture_region(PixelSize::new(1920, 1080))
            .unwrap_err();
        assert!(matches!(err, ClipdeckError::InvalidInput { .. }));
    }

    #[test]
    fn test_capture_requires_finished_drag() {
        let mut selector = RegionSelector::new(Size::new(640.0, 360.0));
        selector.pointer(PointerPhase::Down, &mouse(10.0, 10.0));
        selector.pointer(PointerPhase::Move, &mouse(100.0, 100.0));
        assert!(selector.capture_region(PixelSize::new(1920, 1080)).is_err());
    }
}
