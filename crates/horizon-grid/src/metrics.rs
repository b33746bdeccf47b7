//! Row heights, column widths and the grid's preferred size.
//!
//! [`GridLayout`] owns the per-row and per-column sizes and recomputes them
//! lazily. It works in one of two [`MetricMode`]s:
//!
//! - **Preferred**: every size is derived from the preferred sizes of the
//!   views in that row or column, plus cell padding. Recomputed whenever the
//!   layout is invalidated.
//! - **Custom**: sizes are set explicitly. Invalidation only adapts the
//!   arrays to new dimensions; new entries get the configured defaults.
//!
//! [`GridMetrics`] is the narrow read/write view of this state that decorations
//! such as the caption depend on.

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Insets, PerfSpan, Point, Size};

use crate::config::GridConfig;

/// How row heights and column widths are determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricMode {
    /// Sizes follow the content.
    #[default]
    Preferred,
    /// Sizes are set explicitly.
    Custom,
}

/// Grid geometry as seen by decorations.
pub trait GridMetrics {
    /// Rows the grid displays.
    fn grid_rows(&self) -> usize;

    fn grid_cols(&self) -> usize;

    fn row_height(&self, row: usize) -> f32;

    fn col_width(&self, col: usize) -> f32;

    /// Separator line thickness.
    fn line_size(&self) -> f32;

    fn cell_insets(&self) -> Insets;

    /// Top-left corner of the content in viewport coordinates. Both
    /// components are zero or negative once scrolled.
    fn origin(&self) -> Point;

    fn metric_mode(&self) -> MetricMode;

    /// Smallest width an interactive resize may produce.
    fn min_col_width(&self) -> f32;

    /// Set a row height. Ignored outside custom mode.
    fn set_row_height(&mut self, row: usize, height: f32);

    /// Set a column width. Ignored outside custom mode.
    fn set_col_width(&mut self, col: usize, width: f32);

    /// Content-space x of the left edge of `col`.
    fn col_x(&self, col: usize) -> f32 {
        let line = self.line_size();
        (0..col).fold(line, |x, c| x + self.col_width(c) + line)
    }

    /// Content-space y of the top edge of `row`.
    fn row_y(&self, row: usize) -> f32 {
        let line = self.line_size();
        (0..row).fold(line, |y, r| y + self.row_height(r) + line)
    }
}

/// A resizable buffer of sizes with an explicit logical length.
///
/// Shrinking keeps the allocation; growing again reinitializes the revealed
/// entries instead of resurrecting stale ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeBuffer {
    values: Vec<f32>,
    len: usize,
}

impl SizeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set the logical length, giving new entries `default`.
    pub fn resize(&mut self, len: usize, default: f32) {
        if len > self.values.len() {
            self.values.resize(len, default);
        }
        if len > self.len {
            self.values[self.len..len].fill(default);
        }
        self.len = len;
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.as_slice().get(index).copied()
    }

    /// Set an entry. Returns `false` if `index` is out of range.
    pub fn set(&mut self, index: usize, value: f32) -> bool {
        if index >= self.len {
            return false;
        }
        self.values[index] = value;
        true
    }

    pub fn fill(&mut self, value: f32) {
        self.values[..self.len].fill(value);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values[..self.len]
    }

    pub fn sum(&self) -> f32 {
        self.as_slice().iter().sum()
    }
}

/// What the layout measures.
///
/// The grid implements this over its model, row projection and view
/// provider.
pub trait MetricsSource {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    /// A row height imposed by the row projection, overriding both modes.
    fn fixed_row_height(&self, _row: usize) -> Option<f32> {
        None
    }

    /// Preferred size of the view in a cell, without padding.
    fn preferred_cell_size(&self, row: usize, col: usize) -> Option<Size>;
}

/// Sizes, scroll origin and preferred size of a grid.
#[derive(Debug, Clone)]
pub struct GridLayout {
    mode: MetricMode,
    row_heights: SizeBuffer,
    col_widths: SizeBuffer,
    default_row_height: f32,
    default_col_width: f32,
    min_col_width: f32,
    insets: Insets,
    line_size: f32,
    origin: Point,
    preferred: Size,
    dirty: bool,
}

impl GridLayout {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            mode: MetricMode::Preferred,
            row_heights: SizeBuffer::new(),
            col_widths: SizeBuffer::new(),
            default_row_height: config.default_row_height,
            default_col_width: config.default_col_width,
            min_col_width: config.min_col_width,
            insets: config.cell_insets,
            line_size: config.line_size,
            origin: Point::ZERO,
            preferred: Size::ZERO,
            dirty: true,
        }
    }

    /// Adopt new configuration values and invalidate.
    pub fn configure(&mut self, config: &GridConfig) {
        self.default_row_height = config.default_row_height;
        self.default_col_width = config.default_col_width;
        self.min_col_width = config.min_col_width;
        self.insets = config.cell_insets;
        self.line_size = config.line_size;
        self.invalidate();
    }

    pub fn set_mode(&mut self, mode: MetricMode) {
        if self.mode != mode {
            self.mode = mode;
            self.invalidate();
        }
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    /// Sum of all sizes plus separator lines. Only current after
    /// [`validate`](Self::validate).
    pub fn preferred_size(&self) -> Size {
        self.preferred
    }

    pub fn row_heights(&self) -> &[f32] {
        self.row_heights.as_slice()
    }

    pub fn col_widths(&self) -> &[f32] {
        self.col_widths.as_slice()
    }

    /// Recompute the metrics if invalidated. Returns `true` if anything was
    /// recomputed.
    ///
    /// Validating twice without an intervening invalidation is a no-op.
    pub fn validate(&mut self, source: &dyn MetricsSource) -> bool {
        if !self.dirty {
            return false;
        }
        let _perf = PerfSpan::new("grid_metrics");

        let rows = source.rows();
        let cols = source.cols();
        match self.mode {
            MetricMode::Preferred => {
                self.row_heights.resize(rows, 0.0);
                self.col_widths.resize(cols, 0.0);
                self.row_heights.fill(0.0);
                self.col_widths.fill(0.0);

                let pad_w = self.insets.horizontal();
                let pad_h = self.insets.vertical();
                for row in 0..rows {
                    let mut height = 0.0f32;
                    for col in 0..cols {
                        let Some(size) = source.preferred_cell_size(row, col) else {
                            continue;
                        };
                        height = height.max(size.height + pad_h);
                        let width = size.width + pad_w;
                        if width > self.col_widths.as_slice()[col] {
                            self.col_widths.set(col, width);
                        }
                    }
                    self.row_heights.set(row, height);
                }
            }
            MetricMode::Custom => {
                self.row_heights.resize(rows, self.default_row_height);
                self.col_widths.resize(cols, self.default_col_width);
            }
        }

        for row in 0..rows {
            if let Some(height) = source.fixed_row_height(row) {
                self.row_heights.set(row, height);
            }
        }

        self.refresh_preferred();
        self.dirty = false;
        tracing::debug!(
            target: targets::METRICS,
            rows,
            cols,
            mode = ?self.mode,
            width = self.preferred.width,
            height = self.preferred.height,
            "metrics validated"
        );
        true
    }

    fn refresh_preferred(&mut self) {
        let line = self.line_size;
        let rows = self.row_heights.len() as f32;
        let cols = self.col_widths.len() as f32;
        self.preferred = Size::new(
            self.col_widths.sum() + line * (cols + 1.0),
            self.row_heights.sum() + line * (rows + 1.0),
        );
    }
}

impl GridMetrics for GridLayout {
    fn grid_rows(&self) -> usize {
        self.row_heights.len()
    }

    fn grid_cols(&self) -> usize {
        self.col_widths.len()
    }

    fn row_height(&self, row: usize) -> f32 {
        self.row_heights.get(row).unwrap_or(0.0)
    }

    fn col_width(&self, col: usize) -> f32 {
        self.col_widths.get(col).unwrap_or(0.0)
    }

    fn line_size(&self) -> f32 {
        self.line_size
    }

    fn cell_insets(&self) -> Insets {
        self.insets
    }

    fn origin(&self) -> Point {
        self.origin
    }

    fn metric_mode(&self) -> MetricMode {
        self.mode
    }

    fn min_col_width(&self) -> f32 {
        self.min_col_width
    }

    fn set_row_height(&mut self, row: usize, height: f32) {
        if self.mode == MetricMode::Custom && self.row_heights.set(row, height.max(0.0)) {
            self.refresh_preferred();
        }
    }

    fn set_col_width(&mut self, col: usize, width: f32) {
        if self.mode == MetricMode::Custom && self.col_widths.set(col, width.max(0.0)) {
            self.refresh_preferred();
        }
    }
}
