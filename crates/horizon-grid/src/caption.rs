//! Column titles above a grid, with interactive column resize.
//!
//! The caption knows nothing about the grid beyond [`GridMetrics`]: column
//! widths, line size, scroll origin and metric mode. Everything it draws is
//! aligned with those metrics, and resizing writes back through
//! [`GridMetrics::set_col_width`].
//!
//! # Resizing
//!
//! ```text
//! Idle ──pointer near a right edge──▶ Armed ──press──▶ Dragging ──release──▶ Idle
//!   ▲                                   │
//!   └────────pointer moves away─────────┘
//! ```
//!
//! While dragging, an inverted tracking line follows the candidate edge,
//! which never comes closer to the column's left edge than the minimum column
//! width. Releasing commits the width. Resizing only arms in custom-metric
//! mode.

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Point, Rect, Signal, VerticalAlignment, align_within};

use crate::config::CaptionConfig;
use crate::input::{MouseButton, PointerEvent, PointerKind};
use crate::metrics::{GridMetrics, MetricMode};
use crate::paint::Painter;

/// Where the caption is in a column resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeState {
    Idle,
    /// The pointer hovers the right edge of `col`.
    Armed { col: usize },
    /// The edge of `col` is being dragged. Positions are grid-local x.
    Dragging {
        col: usize,
        start_x: f32,
        edge_x: f32,
    },
}

/// What the caption did with a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptionResponse {
    /// Not for the caption.
    Ignored,
    /// Consumed. The caption may need repainting.
    Consumed,
    /// A resize was committed.
    Resized { col: usize, width: f32 },
}

/// Column header for a grid.
pub struct GridCaption {
    config: CaptionConfig,
    titles: Vec<Option<String>>,
    visible: bool,
    resizable: bool,
    state: ResizeState,
    /// Emitted after a committed resize with `(column, old width, new width)`.
    pub column_resized: Signal<(usize, f32, f32)>,
}

impl Default for GridCaption {
    fn default() -> Self {
        Self::new(CaptionConfig::default())
    }
}

impl GridCaption {
    pub fn new(config: CaptionConfig) -> Self {
        Self {
            config,
            titles: Vec::new(),
            visible: true,
            resizable: true,
            state: ResizeState::Idle,
            column_resized: Signal::new(),
        }
    }

    /// Set titles for columns `0..n`.
    pub fn with_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.titles = titles.into_iter().map(|t| Some(t.into())).collect();
        self
    }

    pub fn config(&self) -> &CaptionConfig {
        &self.config
    }

    pub fn set_title(&mut self, col: usize, title: impl Into<String>) {
        if col >= self.titles.len() {
            self.titles.resize(col + 1, None);
        }
        self.titles[col] = Some(title.into());
    }

    pub fn clear_title(&mut self, col: usize) {
        if let Some(slot) = self.titles.get_mut(col) {
            *slot = None;
        }
    }

    pub fn title(&self, col: usize) -> Option<&str> {
        self.titles.get(col).and_then(|t| t.as_deref())
    }

    /// Hidden captions take no space above the grid.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.state = ResizeState::Idle;
        }
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    pub fn set_resizable(&mut self, resizable: bool) {
        self.resizable = resizable;
        if !resizable {
            self.state = ResizeState::Idle;
        }
    }

    pub fn state(&self) -> ResizeState {
        self.state
    }

    /// Whether the host should show a column-resize pointer.
    pub fn wants_resize_cursor(&self) -> bool {
        !matches!(self.state, ResizeState::Idle)
    }

    /// Tallest title plus insets, never below the configured minimum.
    pub fn height(&self) -> f32 {
        let insets = self.config.title_insets.vertical();
        self.titles
            .iter()
            .flatten()
            .map(|title| self.config.text_metrics.measure(title).height + insets)
            .fold(self.config.min_height, f32::max)
    }

    // =========================================================================
    // Painting
    // =========================================================================

    /// Paint titles and separators into `bounds` (grid-local).
    pub fn paint(&self, painter: &mut dyn Painter, metrics: &dyn GridMetrics, bounds: Rect) {
        let width = bounds.width();
        let height = bounds.height();
        let line = metrics.line_size();

        painter.save();
        painter.clip_rect(bounds);
        painter.translate(bounds.left(), bounds.top());
        painter.fill_rect(Rect::new(0.0, 0.0, width, height), self.config.background);

        let mut x = metrics.origin().x + line;
        for col in 0..metrics.grid_cols() {
            if x >= width {
                break;
            }
            let col_width = metrics.col_width(col);
            let right = x + col_width;
            if right >= 0.0 {
                let cell = Rect::new(x, 0.0, col_width, height);
                if let Some(title) = self.title(col) {
                    self.paint_title(painter, title, cell);
                }
                if line > 0.0 {
                    painter.fill_rect(
                        Rect::new(right, 0.0, line, height),
                        self.config.border_color,
                    );
                }
            }
            x = right + line;
        }

        painter.fill_rect(
            Rect::new(0.0, height - 1.0, width, 1.0),
            self.config.border_color,
        );
        painter.restore();
    }

    fn paint_title(&self, painter: &mut dyn Painter, title: &str, cell: Rect) {
        let content = cell.inset(self.config.title_insets);
        let size = self.config.text_metrics.measure(title);
        let placed = align_within(
            content,
            size,
            self.config.title_alignment,
            VerticalAlignment::Center,
        );
        painter.save();
        painter.clip_rect(content);
        painter.draw_text(title, placed.origin, self.config.text_color);
        painter.restore();
    }

    /// Draw the resize tracking line across `extent` (grid-local) while
    /// dragging.
    pub fn paint_tracking_line(&self, painter: &mut dyn Painter, extent: Rect) {
        if let ResizeState::Dragging { edge_x, .. } = self.state {
            painter.draw_xor_line(
                Point::new(edge_x, extent.top()),
                Point::new(edge_x, extent.bottom()),
                self.config.tracking_line_color,
            );
        }
    }

    // =========================================================================
    // Resizing
    // =========================================================================

    /// The column whose right edge is within the tolerance band of `x`, with
    /// that column's left edge.
    pub fn column_at_edge(
        &self,
        metrics: &dyn GridMetrics,
        bounds: Rect,
        x: f32,
    ) -> Option<(usize, f32)> {
        let line = metrics.line_size();
        let tolerance = self.config.resize_tolerance;
        let mut left = bounds.left() + metrics.origin().x + line;
        let mut best: Option<(usize, f32, f32)> = None;

        for col in 0..metrics.grid_cols() {
            let right = left + metrics.col_width(col);
            let distance = (x - right).abs();
            if distance <= tolerance && best.is_none_or(|(_, _, d)| distance <= d) {
                best = Some((col, left, distance));
            }
            if right - tolerance > x {
                break;
            }
            left = right + line;
        }
        best.map(|(col, left, _)| (col, left))
    }

    fn can_resize(&self, metrics: &dyn GridMetrics) -> bool {
        self.resizable && metrics.metric_mode() == MetricMode::Custom
    }

    /// Feed a pointer event. `bounds` is the caption strip in grid-local
    /// coordinates.
    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        metrics: &mut dyn GridMetrics,
        bounds: Rect,
    ) -> CaptionResponse {
        let pos = event.pos;
        match (event.kind, self.state) {
            (PointerKind::Drag, ResizeState::Dragging { col, start_x, .. }) => {
                let edge_x = pos.x.max(start_x + metrics.min_col_width());
                self.state = ResizeState::Dragging {
                    col,
                    start_x,
                    edge_x,
                };
                CaptionResponse::Consumed
            }
            (PointerKind::Release, ResizeState::Dragging { col, start_x, edge_x }) => {
                self.state = ResizeState::Idle;
                if !self.can_resize(metrics) {
                    return CaptionResponse::Consumed;
                }
                let old = metrics.col_width(col);
                let width = edge_x - start_x;
                metrics.set_col_width(col, width);
                tracing::debug!(target: targets::CAPTION, col, old, width, "column resized");
                self.column_resized.emit((col, old, width));
                CaptionResponse::Resized { col, width }
            }
            (PointerKind::Press, _) if event.button == MouseButton::Left => {
                let armed = match self.state {
                    ResizeState::Armed { col } => Some(col),
                    _ => None,
                };
                let target = self
                    .column_at_edge(metrics, bounds, pos.x)
                    .filter(|_| self.can_resize(metrics))
                    .filter(|(col, _)| armed.is_none_or(|a| a == *col));
                match target {
                    Some((col, start_x)) => {
                        self.state = ResizeState::Dragging {
                            col,
                            start_x,
                            edge_x: start_x + metrics.col_width(col),
                        };
                        tracing::trace!(target: targets::CAPTION, col, "resize started");
                        CaptionResponse::Consumed
                    }
                    None if bounds.contains(pos) => CaptionResponse::Consumed,
                    None => CaptionResponse::Ignored,
                }
            }
            (PointerKind::Move, _) => {
                let armed = if bounds.contains(pos) && self.can_resize(metrics) {
                    self.column_at_edge(metrics, bounds, pos.x)
                } else {
                    None
                };
                self.state = match armed {
                    Some((col, _)) => ResizeState::Armed { col },
                    None => ResizeState::Idle,
                };
                if armed.is_some() {
                    CaptionResponse::Consumed
                } else {
                    CaptionResponse::Ignored
                }
            }
            _ if bounds.contains(pos) => CaptionResponse::Consumed,
            _ => CaptionResponse::Ignored,
        }
    }
}

impl std::fmt::Debug for GridCaption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridCaption")
            .field("titles", &self.titles)
            .field("visible", &self.visible)
            .field("resizable", &self.resizable)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, TextMetrics};
    use crate::metrics::{GridLayout, MetricsSource};
    use crate::paint::RecordingPainter;
    use horizon_grid_core::{HorizontalAlignment, Size};

    struct Cols(usize);

    impl MetricsSource for Cols {
        fn rows(&self) -> usize {
            1
        }
        fn cols(&self) -> usize {
            self.0
        }
        fn preferred_cell_size(&self, _row: usize, _col: usize) -> Option<Size> {
            Some(Size::new(40.0, 10.0))
        }
    }

    /// Three 50px columns with 1px lines: right edges at 51, 102, 153.
    fn setup() -> (GridCaption, GridLayout) {
        let config = GridConfig::default().with_default_sizes(20.0, 50.0);
        let mut layout = GridLayout::new(&config);
        layout.set_mode(MetricMode::Custom);
        layout.validate(&Cols(3));

        let caption = GridCaption::new(CaptionConfig {
            text_metrics: TextMetrics::new(10.0, 10.0),
            ..CaptionConfig::default()
        })
        .with_titles(["A", "B", "C"]);
        (caption, layout)
    }

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 300.0, 20.0);

    #[test]
    fn test_titles_and_height() {
        let (mut caption, _) = setup();
        assert_eq!(caption.title(1), Some("B"));
        caption.set_title(5, "F");
        assert_eq!(caption.title(4), None);
        caption.clear_title(5);
        assert_eq!(caption.title(5), None);
        // 10px text + 4px insets is below the minimum height.
        assert_eq!(caption.height(), 20.0);
        caption.set_title(0, "two\nlines");
        assert_eq!(caption.height(), 24.0);
    }

    #[test]
    fn test_arm_and_disarm() {
        let (mut caption, mut layout) = setup();
        let response = caption.handle_pointer(
            &PointerEvent::moved(Point::new(101.0, 5.0)),
            &mut layout,
            BOUNDS,
        );
        assert_eq!(response, CaptionResponse::Consumed);
        assert_eq!(caption.state(), ResizeState::Armed { col: 1 });
        assert!(caption.wants_resize_cursor());

        caption.handle_pointer(
            &PointerEvent::moved(Point::new(80.0, 5.0)),
            &mut layout,
            BOUNDS,
        );
        assert_eq!(caption.state(), ResizeState::Idle);
    }

    #[test]
    fn test_drag_resize_commits_width() {
        let (mut caption, mut layout) = setup();
        let resized = std::sync::Arc::new(parking_lot::Mutex::new(None));
        let out = resized.clone();
        caption.column_resized.connect(move |r| *out.lock() = Some(*r));

        caption.handle_pointer(
            &PointerEvent::moved(Point::new(102.0, 5.0)),
            &mut layout,
            BOUNDS,
        );
        caption.handle_pointer(
            &PointerEvent::press(Point::new(102.0, 5.0), MouseButton::Left, 1),
            &mut layout,
            BOUNDS,
        );
        assert_eq!(
            caption.state(),
            ResizeState::Dragging {
                col: 1,
                start_x: 52.0,
                edge_x: 102.0
            }
        );

        caption.handle_pointer(
            &PointerEvent::drag(Point::new(132.0, 5.0)),
            &mut layout,
            BOUNDS,
        );
        let response = caption.handle_pointer(
            &PointerEvent::release(Point::new(132.0, 5.0)),
            &mut layout,
            BOUNDS,
        );

        assert_eq!(response, CaptionResponse::Resized { col: 1, width: 80.0 });
        assert_eq!(layout.col_width(1), 80.0);
        assert_eq!(*resized.lock(), Some((1, 50.0, 80.0)));
        assert_eq!(caption.state(), ResizeState::Idle);
    }

    #[test]
    fn test_drag_respects_minimum_width() {
        let (mut caption, mut layout) = setup();
        caption.handle_pointer(
            &PointerEvent::press(Point::new(51.0, 5.0), MouseButton::Left, 1),
            &mut layout,
            BOUNDS,
        );
        caption.handle_pointer(&PointerEvent::drag(Point::new(-40.0, 5.0)), &mut layout, BOUNDS);
        caption.handle_pointer(&PointerEvent::release(Point::new(-40.0, 5.0)), &mut layout, BOUNDS);
        assert_eq!(layout.col_width(0), layout.min_col_width());
    }

    #[test]
    fn test_never_resizes_in_preferred_mode() {
        let (mut caption, mut layout) = setup();
        layout.set_mode(MetricMode::Preferred);
        layout.validate(&Cols(3));
        let before = layout.col_width(0);

        caption.handle_pointer(
            &PointerEvent::moved(Point::new(before + 1.0, 5.0)),
            &mut layout,
            BOUNDS,
        );
        assert_eq!(caption.state(), ResizeState::Idle);
        caption.handle_pointer(
            &PointerEvent::press(Point::new(before + 1.0, 5.0), MouseButton::Left, 1),
            &mut layout,
            BOUNDS,
        );
        assert_eq!(caption.state(), ResizeState::Idle);
        assert_eq!(layout.col_width(0), before);
    }

    #[test]
    fn test_paint_follows_scroll_origin() {
        let (caption, mut layout) = setup();
        layout.set_origin(Point::new(-51.0, 0.0));
        let mut painter = RecordingPainter::new();
        caption.paint(&mut painter, &layout, BOUNDS);

        // Column A scrolled out to the left; B starts at x = 1.
        let b = painter.text_origin("B").unwrap();
        let c = painter.text_origin("C").unwrap();
        assert_eq!(c.x - b.x, 51.0);
        assert!(b.x > 1.0 && b.x < 51.0);
        assert!(painter.is_balanced());
    }

    #[test]
    fn test_tracking_line_only_while_dragging() {
        let (mut caption, mut layout) = setup();
        let extent = Rect::new(0.0, 0.0, 300.0, 200.0);
        let mut painter = RecordingPainter::new();
        caption.paint_tracking_line(&mut painter, extent);
        assert_eq!(painter.xor_lines(), 0);

        caption.handle_pointer(
            &PointerEvent::press(Point::new(51.0, 5.0), MouseButton::Left, 1),
            &mut layout,
            BOUNDS,
        );
        caption.paint_tracking_line(&mut painter, extent);
        assert_eq!(painter.xor_lines(), 1);
    }

    #[test]
    fn test_title_alignment() {
        let (caption, layout) = setup();
        let left = GridCaption::new(CaptionConfig {
            text_metrics: TextMetrics::new(10.0, 10.0),
            ..CaptionConfig::default().with_title_alignment(HorizontalAlignment::Left)
        })
        .with_titles(["A"]);

        let mut centered = RecordingPainter::new();
        caption.paint(&mut centered, &layout, BOUNDS);
        let mut leading = RecordingPainter::new();
        left.paint(&mut leading, &layout, BOUNDS);

        // Left-aligned title starts at the column's left inset.
        assert_eq!(leading.text_origin("A").unwrap().x, 5.0);
        assert!(centered.text_origin("A").unwrap().x > 5.0);
    }
}
