//! Incremental tracking of the visible cell window.
//!
//! On every frame the grid needs the first and last visible row and column
//! together with their pixel offsets. Recomputing that by walking from row 0
//! is linear in the scroll position, so the tracker keeps the previous
//! window and walks from its leading edge in the direction the content
//! moved. The result is identical to a full recomputation.
//!
//! A window is all-or-nothing: if either axis has nothing visible, there is
//! no window at all.

use std::ops::RangeInclusive;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Point, Rect};

use crate::metrics::GridMetrics;

/// The visible cell range with pixel offsets in grid-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleWindow {
    pub first_row: usize,
    /// Top edge of `first_row`. May be above the viewport when the row is
    /// partially scrolled out.
    pub first_row_y: f32,
    pub last_row: usize,
    pub last_row_y: f32,
    pub first_col: usize,
    pub first_col_x: f32,
    pub last_col: usize,
    pub last_col_x: f32,
}

impl VisibleWindow {
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.first_row..=self.last_row
    }

    pub fn cols(&self) -> RangeInclusive<usize> {
        self.first_col..=self.last_col
    }

    pub fn contains_row(&self, row: usize) -> bool {
        self.rows().contains(&row)
    }

    pub fn row_count(&self) -> usize {
        self.last_row - self.first_row + 1
    }
}

/// Visible extent along one axis, in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisSpan {
    first: usize,
    first_pos: f32,
    last: usize,
    last_pos: f32,
}

/// The anchor a scan starts from.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    index: usize,
    pos: f32,
}

impl Anchor {
    fn leading(span: AxisSpan) -> Self {
        Self {
            index: span.first,
            pos: span.first_pos,
        }
    }
}

struct Axis<'a> {
    count: usize,
    line: f32,
    size: &'a dyn Fn(usize) -> f32,
}

impl Axis<'_> {
    /// Find the span intersecting `[lo, hi)` (content coordinates).
    ///
    /// The walk starts at `anchor` (or index 0) and moves backward when the
    /// leading edge moved up, forward when it moved down. The trailing edge
    /// is then found by walking on from the new leading edge.
    fn scan(
        &self,
        lo: f32,
        hi: f32,
        anchor: Option<Anchor>,
        steps: &mut usize,
    ) -> Option<AxisSpan> {
        if self.count == 0 || hi <= lo {
            return None;
        }
        let size = self.size;
        let Anchor {
            index: mut i,
            mut pos,
        } = anchor.filter(|a| a.index < self.count).unwrap_or(Anchor {
            index: 0,
            pos: self.line,
        });

        // Backward: step back while the anchor starts below the leading edge.
        while i > 0 && pos > lo {
            i -= 1;
            pos -= size(i) + self.line;
            *steps += 1;
        }
        // Forward: skip cells that end before the leading edge.
        while i < self.count && pos + size(i) <= lo {
            pos += size(i) + self.line;
            i += 1;
            *steps += 1;
        }
        if i == self.count || pos >= hi {
            return None;
        }

        let (first, first_pos) = (i, pos);
        while i + 1 < self.count {
            let next = pos + size(i) + self.line;
            if next >= hi {
                break;
            }
            pos = next;
            i += 1;
            *steps += 1;
        }
        Some(AxisSpan {
            first,
            first_pos,
            last: i,
            last_pos: pos,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct TrackState {
    origin: Point,
    viewport: Rect,
    rows: AxisSpan,
    cols: AxisSpan,
}

/// Computes the [`VisibleWindow`] incrementally across frames.
#[derive(Debug, Default)]
pub struct VisibilityTracker {
    state: Option<TrackState>,
    window: Option<VisibleWindow>,
    last_steps: usize,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous window. The next computation starts from scratch.
    ///
    /// Call whenever metrics or dimensions change.
    pub fn reset(&mut self) {
        self.state = None;
        self.window = None;
    }

    /// The window from the last computation.
    pub fn window(&self) -> Option<VisibleWindow> {
        self.window
    }

    /// Cells walked during the last computation.
    pub fn last_scan_steps(&self) -> usize {
        self.last_steps
    }

    /// Compute the window for `viewport` (grid-local) with the content
    /// placed at `origin`.
    pub fn compute(
        &mut self,
        metrics: &dyn GridMetrics,
        viewport: Rect,
        origin: Point,
    ) -> Option<VisibleWindow> {
        let previous = self.state.filter(|s| s.viewport == viewport);

        if previous.is_some_and(|prev| prev.origin == origin) {
            self.last_steps = 0;
            return self.window;
        }

        let row_anchor = previous.map(|prev| Anchor::leading(prev.rows));
        let col_anchor = previous.map(|prev| Anchor::leading(prev.cols));

        let mut steps = 0;
        let spans = scan(metrics, viewport, origin, row_anchor, col_anchor, &mut steps);
        self.last_steps = steps;

        match spans {
            Some((rows, cols)) => {
                self.state = Some(TrackState {
                    origin,
                    viewport,
                    rows,
                    cols,
                });
                self.window = Some(to_window(rows, cols, viewport, origin));
            }
            None => {
                self.state = None;
                self.window = None;
            }
        }

        tracing::trace!(
            target: targets::VISIBILITY,
            steps,
            incremental = previous.is_some(),
            window = ?self.window,
            "visible window"
        );
        self.window
    }

    /// Compute the window by walking from the first row and column.
    pub fn compute_from_scratch(
        metrics: &dyn GridMetrics,
        viewport: Rect,
        origin: Point,
    ) -> Option<VisibleWindow> {
        let mut steps = 0;
        scan(metrics, viewport, origin, None, None, &mut steps)
            .map(|(rows, cols)| to_window(rows, cols, viewport, origin))
    }
}

fn scan(
    metrics: &dyn GridMetrics,
    viewport: Rect,
    origin: Point,
    row_anchor: Option<Anchor>,
    col_anchor: Option<Anchor>,
    steps: &mut usize,
) -> Option<(AxisSpan, AxisSpan)> {
    let row_size = |r| metrics.row_height(r);
    let col_size = |c| metrics.col_width(c);
    let rows = Axis {
        count: metrics.grid_rows(),
        line: metrics.line_size(),
        size: &row_size,
    };
    let cols = Axis {
        count: metrics.grid_cols(),
        line: metrics.line_size(),
        size: &col_size,
    };

    let top = -origin.y;
    let left = -origin.x;
    let rows = rows.scan(top, top + viewport.height(), row_anchor, steps)?;
    let cols = cols.scan(left, left + viewport.width(), col_anchor, steps)?;
    Some((rows, cols))
}

fn to_window(rows: AxisSpan, cols: AxisSpan, viewport: Rect, origin: Point) -> VisibleWindow {
    let dy = viewport.top() + origin.y;
    let dx = viewport.left() + origin.x;
    VisibleWindow {
        first_row: rows.first,
        first_row_y: rows.first_pos + dy,
        last_row: rows.last,
        last_row_y: rows.last_pos + dy,
        first_col: cols.first,
        first_col_x: cols.first_pos + dx,
        last_col: cols.last,
        last_col_x: cols.last_pos + dx,
    }
}
