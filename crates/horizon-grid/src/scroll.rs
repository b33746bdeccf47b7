//! The contract between scrollable content and the container that scrolls it.

use horizon_grid_core::{Point, Signal, Size};

/// Signals scrollable content emits towards its container.
pub struct ScrollSignals {
    /// The content size changed.
    pub content_resized: Signal<Size>,
    /// The content origin changed.
    pub content_moved: Signal<Point>,
}

impl Default for ScrollSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollSignals {
    pub fn new() -> Self {
        Self {
            content_resized: Signal::new(),
            content_moved: Signal::new(),
        }
    }
}

/// Content that a scroll container can move within its viewport.
///
/// The origin is the content's top-left corner in viewport coordinates, so a
/// scrolled origin has zero or negative components.
pub trait ScrollableContent {
    fn content_origin(&self) -> Point;

    fn set_content_origin(&mut self, origin: Point);

    /// Full size of the content. May trigger lazy layout.
    fn content_size(&mut self) -> Size;

    fn scroll_signals(&self) -> &ScrollSignals;

    fn notify_content_resized(&self, size: Size) {
        self.scroll_signals().content_resized.emit(size);
    }

    fn notify_content_moved(&self, origin: Point) {
        self.scroll_signals().content_moved.emit(origin);
    }
}

/// Clamp `origin` so that a viewport of `viewport` never shows past the end
/// of content of `content` size.
pub fn clamp_origin(origin: Point, content: Size, viewport: Size) -> Point {
    let min_x = (viewport.width - content.width).min(0.0);
    let min_y = (viewport.height - content.height).min(0.0);
    Point::new(origin.x.clamp(min_x, 0.0), origin.y.clamp(min_y, 0.0))
}
