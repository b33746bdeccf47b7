//! The grid core.
//!
//! [`Grid`] binds a [`MatrixModel`] to a pair of providers and turns it into
//! something a host can size, scroll, paint and drive with input events.
//!
//! # Lifecycle
//!
//! Model changes and configuration changes only mark the grid dirty. The next
//! query that needs metrics (`content_size`, `visible_window`, `paint`, input
//! handling) validates once, resets the visibility tracker and reports a new
//! content size to the scroll container if it changed.
//!
//! # Coordinates
//!
//! Everything public is grid-local: `(0, 0)` is the top-left corner of the
//! grid, including the caption strip when one is attached. Cells live in the
//! viewport below the caption and move with the content origin.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::{Grid, Matrix, RecordingPainter};
//! use horizon_grid_core::Size;
//!
//! let model = Arc::new(Matrix::from_rows([["a", "b"], ["c", "d"]]));
//! let mut grid = Grid::new(model);
//! grid.set_size(Size::new(200.0, 100.0));
//!
//! let mut painter = RecordingPainter::new();
//! grid.paint(&mut painter);
//! assert_eq!(painter.texts(), vec!["a", "b", "c", "d"]);
//! ```

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_grid_core::logging::targets;
use horizon_grid_core::{
    ConnectionId, GridError, GridResult, PerfSpan, Point, Rect, Signal, Size, align_within,
    grid_debug, grid_trace,
};

use crate::caption::{CaptionResponse, GridCaption, ResizeState};
use crate::config::GridConfig;
use crate::cursor::{RowCursor, SeekOp};
use crate::edit::EditSession;
use crate::input::{Key, KeyEvent, PointerEvent, PointerKind};
use crate::metrics::{GridLayout, GridMetrics, MetricMode, MetricsSource};
use crate::model::MatrixModel;
use crate::paint::Painter;
use crate::projection::{FlatRows, RowProjection};
use crate::provider::{DefaultViewProvider, EditorProvider, View, ViewProvider};
use crate::scroll::{ScrollSignals, ScrollableContent, clamp_origin};
use crate::visibility::{VisibilityTracker, VisibleWindow};

/// Edit transitions and cell presses, each with `(row, col)`.
pub struct GridSignals {
    pub edit_started: Signal<(usize, usize)>,
    pub edit_committed: Signal<(usize, usize)>,
    pub edit_cancelled: Signal<(usize, usize)>,
    /// A press landed on a cell and did not toggle a row.
    pub cell_pressed: Signal<(usize, usize)>,
}

impl Default for GridSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl GridSignals {
    pub fn new() -> Self {
        Self {
            edit_started: Signal::new(),
            edit_committed: Signal::new(),
            edit_cancelled: Signal::new(),
            cell_pressed: Signal::new(),
        }
    }
}

/// A model plus the listener connections that mark the grid dirty.
/// Dimension and layout notifications also raise `reshaped`: rows may now
/// show different items. Dropping the binding disconnects them.
struct ModelBinding {
    model: Arc<dyn MatrixModel>,
    cell: ConnectionId,
    dimensions: ConnectionId,
    layout: ConnectionId,
}

impl ModelBinding {
    fn connect(
        model: Arc<dyn MatrixModel>,
        dirty: &Arc<AtomicBool>,
        reshaped: &Arc<AtomicBool>,
    ) -> Self {
        let signals = model.signals();
        let flag = dirty.clone();
        let cell = signals
            .cell_changed
            .connect(move |_| flag.store(true, Ordering::Release));
        let (flag, shape) = (dirty.clone(), reshaped.clone());
        let dimensions = signals.dimensions_changed.connect(move |_| {
            shape.store(true, Ordering::Release);
            flag.store(true, Ordering::Release);
        });
        let (flag, shape) = (dirty.clone(), reshaped.clone());
        let layout = signals.layout_changed.connect(move |_| {
            shape.store(true, Ordering::Release);
            flag.store(true, Ordering::Release);
        });
        Self {
            model,
            cell,
            dimensions,
            layout,
        }
    }
}

impl Drop for ModelBinding {
    fn drop(&mut self) {
        let signals = self.model.signals();
        signals.cell_changed.disconnect(self.cell);
        signals.dimensions_changed.disconnect(self.dimensions);
        signals.layout_changed.disconnect(self.layout);
    }
}

/// What the layout measures: the projected rows of the model, drawn through
/// the view provider.
struct GridSource<'a> {
    model: &'a dyn MatrixModel,
    projection: &'a dyn RowProjection,
    views: &'a dyn ViewProvider,
}

impl GridSource<'_> {
    fn view(&self, row: usize, col: usize) -> Option<Arc<dyn View>> {
        if let Some(view) = self.projection.view(row, col) {
            return Some(view);
        }
        let value = self.model.try_get(row, col).ok()?;
        self.views.view(row, col, &value)
    }
}

impl MetricsSource for GridSource<'_> {
    fn rows(&self) -> usize {
        self.projection.grid_rows(self.model)
    }

    fn cols(&self) -> usize {
        self.model.cols()
    }

    fn fixed_row_height(&self, row: usize) -> Option<f32> {
        self.projection.row_height(row)
    }

    fn preferred_cell_size(&self, row: usize, col: usize) -> Option<Size> {
        self.view(row, col).map(|view| view.preferred_size())
    }
}

/// A virtualized, editable grid over a [`MatrixModel`].
pub struct Grid {
    config: GridConfig,
    size: Size,
    binding: ModelBinding,
    model_dirty: Arc<AtomicBool>,
    model_reshaped: Arc<AtomicBool>,
    projection: Arc<dyn RowProjection>,
    source_locked: bool,
    views: Arc<dyn ViewProvider>,
    editors: Option<Arc<dyn EditorProvider>>,
    layout: GridLayout,
    visibility: VisibilityTracker,
    edit: EditSession,
    caption: Option<GridCaption>,
    cursor: RowCursor,
    cursor_key: Option<u64>,
    focused: bool,
    needs_repaint: bool,
    content_size: Size,
    signals: GridSignals,
    scroll_signals: ScrollSignals,
}

impl Grid {
    pub fn new(model: Arc<dyn MatrixModel>) -> Self {
        Self::with_config(model, GridConfig::default())
    }

    pub fn with_config(model: Arc<dyn MatrixModel>, config: GridConfig) -> Self {
        let model_dirty = Arc::new(AtomicBool::new(false));
        let model_reshaped = Arc::new(AtomicBool::new(false));
        Self {
            binding: ModelBinding::connect(model, &model_dirty, &model_reshaped),
            model_dirty,
            model_reshaped,
            views: Arc::new(
                DefaultViewProvider::new(config.text_metrics).with_text_color(config.text_color),
            ),
            layout: GridLayout::new(&config),
            config,
            size: Size::ZERO,
            projection: Arc::new(FlatRows),
            source_locked: false,
            editors: None,
            visibility: VisibilityTracker::new(),
            edit: EditSession::new(),
            caption: None,
            cursor: RowCursor::new(),
            cursor_key: None,
            focused: false,
            needs_repaint: true,
            content_size: Size::ZERO,
            signals: GridSignals::new(),
            scroll_signals: ScrollSignals::new(),
        }
    }

    pub fn with_view_provider(mut self, provider: Arc<dyn ViewProvider>) -> Self {
        self.set_view_provider(provider);
        self
    }

    pub fn with_editor_provider(mut self, provider: Arc<dyn EditorProvider>) -> Self {
        self.set_editor_provider(Some(provider));
        self
    }

    pub fn with_caption(mut self, caption: GridCaption) -> Self {
        self.set_caption(Some(caption));
        self
    }

    pub fn with_metric_mode(mut self, mode: MetricMode) -> Self {
        self.set_metric_mode(mode);
        self
    }

    /// Replace how model rows map to grid rows.
    pub fn with_row_projection(mut self, projection: Arc<dyn RowProjection>) -> Self {
        self.projection = projection;
        self.invalidate();
        self
    }

    pub(crate) fn lock_data_source(&mut self) {
        self.source_locked = true;
    }

    // =========================================================================
    // Binding
    // =========================================================================

    pub fn model(&self) -> &Arc<dyn MatrixModel> {
        &self.binding.model
    }

    /// Bind a different model. Any edit in progress is cancelled.
    pub fn set_data_source(&mut self, model: Arc<dyn MatrixModel>) -> GridResult<()> {
        if self.source_locked {
            return Err(GridError::DataSourceLocked);
        }
        self.cancel_edit();
        self.binding = ModelBinding::connect(model, &self.model_dirty, &self.model_reshaped);
        self.invalidate();
        grid_debug!(
            rows = self.binding.model.rows(),
            cols = self.binding.model.cols(),
            "data source replaced"
        );
        Ok(())
    }

    /// Swap the view provider. Any edit in progress is cancelled.
    pub fn set_view_provider(&mut self, provider: Arc<dyn ViewProvider>) {
        self.cancel_edit();
        self.views = provider;
        self.invalidate();
    }

    /// Swap or remove the editor provider. Any edit in progress is cancelled.
    pub fn set_editor_provider(&mut self, provider: Option<Arc<dyn EditorProvider>>) {
        self.cancel_edit();
        self.editors = provider;
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GridConfig) {
        self.layout.configure(&config);
        self.config = config;
        self.update();
    }

    pub fn signals(&self) -> &GridSignals {
        &self.signals
    }

    pub fn cursor(&self) -> &RowCursor {
        &self.cursor
    }

    // =========================================================================
    // Caption
    // =========================================================================

    /// Attach or detach the column caption.
    pub fn set_caption(&mut self, caption: Option<GridCaption>) {
        self.caption = caption;
        self.visibility.reset();
        self.report_content_size();
        self.update();
    }

    pub fn caption(&self) -> Option<&GridCaption> {
        self.caption.as_ref()
    }

    pub fn caption_mut(&mut self) -> Option<&mut GridCaption> {
        self.caption.as_mut()
    }

    fn header_height(&self) -> f32 {
        self.caption
            .as_ref()
            .filter(|caption| caption.is_visible())
            .map_or(0.0, GridCaption::height)
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    pub fn metric_mode(&self) -> MetricMode {
        self.layout.metric_mode()
    }

    /// Switch metric mode. Switching into preferred mode turns off column
    /// resizing on the attached caption.
    pub fn set_metric_mode(&mut self, mode: MetricMode) {
        if self.layout.metric_mode() == mode {
            return;
        }
        self.layout.set_mode(mode);
        if mode == MetricMode::Preferred
            && let Some(caption) = self.caption.as_mut()
        {
            caption.set_resizable(false);
        }
        self.visibility.reset();
        self.update();
    }

    /// Row height in custom mode. Ignored in preferred mode.
    pub fn set_row_height(&mut self, row: usize, height: f32) {
        self.validate();
        if self.layout.metric_mode() != MetricMode::Custom || row >= self.layout.grid_rows() {
            return;
        }
        self.layout.set_row_height(row, height);
        self.metrics_changed();
    }

    /// Column width in custom mode. Ignored in preferred mode.
    pub fn set_col_width(&mut self, col: usize, width: f32) {
        self.validate();
        if self.layout.metric_mode() != MetricMode::Custom || col >= self.layout.grid_cols() {
            return;
        }
        self.layout.set_col_width(col, width);
        self.metrics_changed();
    }

    pub fn row_height(&mut self, row: usize) -> f32 {
        self.validate();
        self.layout.row_height(row)
    }

    pub fn col_width(&mut self, col: usize) -> f32 {
        self.validate();
        self.layout.col_width(col)
    }

    pub fn grid_rows(&mut self) -> usize {
        self.validate();
        self.layout.grid_rows()
    }

    pub fn grid_cols(&mut self) -> usize {
        self.validate();
        self.layout.grid_cols()
    }

    /// The validated metrics.
    pub fn metrics(&mut self) -> &dyn GridMetrics {
        self.validate();
        &self.layout
    }

    /// Size of the cells and lines, without the caption.
    pub fn preferred_size(&mut self) -> Size {
        self.validate();
        self.layout.preferred_size()
    }

    /// Mark the metrics stale. Nothing is recomputed until the next query.
    pub fn invalidate(&mut self) {
        self.layout.invalidate();
        self.update();
    }

    /// Recompute metrics if anything invalidated them. Returns `true` if a
    /// recomputation happened.
    ///
    /// When the model reported a dimension or layout change, an edit in
    /// progress is cancelled and the row cursor follows the item it was on.
    pub fn validate(&mut self) -> bool {
        let reshaped = self.model_reshaped.swap(false, Ordering::AcqRel);
        if self.model_dirty.swap(false, Ordering::AcqRel) {
            self.layout.invalidate();
        }
        if reshaped && let Some((row, col)) = self.edit.cell() {
            grid_debug!(row, col, "rows reshaped under the editor");
            self.cancel_edit();
        }
        if !self.layout.is_dirty() {
            return false;
        }

        let source = GridSource {
            model: self.binding.model.as_ref(),
            projection: self.projection.as_ref(),
            views: self.views.as_ref(),
        };
        self.layout.validate(&source);
        self.visibility.reset();

        let rows = self.layout.grid_rows();
        let cols = self.layout.grid_cols();
        self.cursor.set_line_count(rows);
        if reshaped {
            self.follow_cursor_key();
        }
        if let Some((row, col)) = self.edit.cell() {
            if row >= rows || col >= cols {
                self.cancel_edit();
            } else {
                self.place_editor();
            }
        }
        self.report_content_size();
        self.update();
        true
    }

    fn metrics_changed(&mut self) {
        self.visibility.reset();
        self.place_editor();
        self.report_content_size();
        self.update();
    }

    fn current_content_size(&self) -> Size {
        let preferred = self.layout.preferred_size();
        Size::new(preferred.width, preferred.height + self.header_height())
    }

    fn report_content_size(&mut self) {
        let size = self.current_content_size();
        if size != self.content_size {
            self.content_size = size;
            self.notify_content_resized(size);
        }
    }

    fn source(&self) -> GridSource<'_> {
        GridSource {
            model: self.binding.model.as_ref(),
            projection: self.projection.as_ref(),
            views: self.views.as_ref(),
        }
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        if self.size != size {
            self.size = size;
            self.update();
        }
    }

    /// The area cells are drawn in: the grid minus the caption strip.
    pub fn viewport(&self) -> Rect {
        let header = self.header_height().min(self.size.height);
        Rect::new(0.0, header, self.size.width, self.size.height - header)
    }

    /// The window of cells currently in the viewport.
    pub fn visible_window(&mut self) -> Option<VisibleWindow> {
        self.validate();
        let viewport = self.viewport();
        let window = self
            .visibility
            .compute(&self.layout, viewport, self.layout.origin());
        if let Some(window) = window {
            self.cursor
                .set_page_size(window.row_count().saturating_sub(1));
        }
        window
    }

    /// The cell under `pos`, or `None` over lines, the caption or empty space.
    pub fn cell_at(&mut self, pos: Point) -> Option<(usize, usize)> {
        let window = self.visible_window()?;
        if !self.viewport().contains(pos) {
            return None;
        }
        let line = self.layout.line_size();
        let row = hit(window.rows(), window.first_row_y, pos.y, line, |r| {
            self.layout.row_height(r)
        })?;
        let col = hit(window.cols(), window.first_col_x, pos.x, line, |c| {
            self.layout.col_width(c)
        })?;
        Some((row, col))
    }

    /// Grid-local box of `(row, col)`, whether or not it is visible.
    pub fn cell_rect(&mut self, row: usize, col: usize) -> Option<Rect> {
        self.validate();
        self.locate_cell(row, col)
    }

    fn locate_cell(&self, row: usize, col: usize) -> Option<Rect> {
        if row >= self.layout.grid_rows() || col >= self.layout.grid_cols() {
            return None;
        }
        let viewport = self.viewport();
        let origin = self.layout.origin();
        Some(Rect::new(
            viewport.left() + origin.x + self.layout.col_x(col),
            viewport.top() + origin.y + self.layout.row_y(row),
            self.layout.col_width(col),
            self.layout.row_height(row),
        ))
    }

    /// Scroll vertically just enough to bring `row` into the viewport.
    pub fn ensure_row_visible(&mut self, row: usize) {
        self.validate();
        if row >= self.layout.grid_rows() {
            return;
        }
        let viewport = self.viewport();
        let line = self.layout.line_size();
        let top = self.layout.row_y(row) - line;
        let bottom = self.layout.row_y(row) + self.layout.row_height(row) + line;
        let origin = self.layout.origin();

        let y = if top + origin.y < 0.0 {
            -top
        } else if bottom + origin.y > viewport.height() {
            viewport.height() - bottom
        } else {
            return;
        };
        self.scroll_to(Point::new(origin.x, y));
    }

    /// Move the content origin, clamped so the viewport stays on the content.
    pub fn scroll_to(&mut self, origin: Point) {
        self.validate();
        let clamped = clamp_origin(
            origin,
            self.layout.preferred_size(),
            self.viewport().size,
        );
        self.set_content_origin(clamped);
    }

    // =========================================================================
    // Painting
    // =========================================================================

    pub fn needs_repaint(&self) -> bool {
        self.needs_repaint
    }

    /// Request a repaint.
    pub fn update(&mut self) {
        self.needs_repaint = true;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Focus changes the selection marker color.
    pub fn set_focused(&mut self, focused: bool) {
        if self.focused != focused {
            self.focused = focused;
            self.update();
        }
    }

    /// Paint one frame: background, caption, visible cells, lines, the row
    /// marker, the active editor and the resize tracking line, in that order.
    pub fn paint(&mut self, painter: &mut dyn Painter) {
        let _perf = PerfSpan::new("grid_paint");
        let window = self.visible_window();
        let bounds = Rect::new(0.0, 0.0, self.size.width, self.size.height);

        painter.save();
        painter.clip_rect(bounds);
        if let Some(background) = self.config.background {
            painter.fill_rect(bounds, background);
        }

        let header = self.header_height();
        if let Some(caption) = self.caption.as_ref().filter(|c| c.is_visible()) {
            caption.paint(
                painter,
                &self.layout,
                Rect::new(0.0, 0.0, self.size.width, header),
            );
        }

        if let Some(window) = window {
            let viewport = self.viewport();
            painter.save();
            painter.clip_rect(viewport);
            let clip = painter.clip_bounds().unwrap_or(viewport);
            self.paint_cells(painter, &window, clip);
            self.paint_lines(painter, &window);
            self.paint_marker(painter, &window);
            painter.restore();
        }

        if let Some(editor) = self.edit.editor() {
            editor.paint(painter);
        }
        if let Some(caption) = &self.caption {
            caption.paint_tracking_line(painter, bounds);
        }
        painter.restore();

        self.needs_repaint = false;
        tracing::trace!(target: targets::PAINT, window = ?window, "grid painted");
    }

    fn paint_cells(&self, painter: &mut dyn Painter, window: &VisibleWindow, clip: Rect) {
        let line = self.layout.line_size();
        let mut y = window.first_row_y;
        for row in window.rows() {
            if y >= clip.bottom() {
                break;
            }
            let height = self.layout.row_height(row);
            if y + height > clip.top() {
                let mut x = window.first_col_x;
                for col in window.cols() {
                    if x >= clip.right() {
                        break;
                    }
                    let width = self.layout.col_width(col);
                    if x + width > clip.left() && !self.edit.is_editing_cell(row, col) {
                        self.paint_cell(painter, row, col, Rect::new(x, y, width, height));
                    }
                    x += width + line;
                }
            }
            y += height + line;
        }
    }

    fn paint_cell(&self, painter: &mut dyn Painter, row: usize, col: usize, cell: Rect) {
        if let Some(color) = self.views.cell_color(row, col) {
            painter.fill_rect(cell, color);
        }
        let Some(view) = self.source().view(row, col) else {
            return;
        };
        let content = cell.inset(self.layout.cell_insets());
        if content.is_empty() {
            return;
        }

        let target = if self.layout.metric_mode() == MetricMode::Preferred || view.stretch() {
            content
        } else {
            align_within(
                content,
                view.preferred_size(),
                self.views.x_alignment(row, col),
                self.views.y_alignment(row, col),
            )
        };
        painter.save();
        painter.clip_rect(content);
        view.paint(painter, target);
        painter.restore();
    }

    fn paint_lines(&self, painter: &mut dyn Painter, window: &VisibleWindow) {
        let line = self.layout.line_size();
        if line <= 0.0 {
            return;
        }
        let color = self.config.line_color;
        let left = window.first_col_x - line;
        let right = window.last_col_x + self.layout.col_width(window.last_col) + line;
        let top = window.first_row_y - line;
        let bottom = window.last_row_y + self.layout.row_height(window.last_row) + line;

        if self.config.line_mask.horizontal {
            let mut y = window.first_row_y;
            for row in window.rows() {
                painter.fill_rect(Rect::new(left, y - line, right - left, line), color);
                y += self.layout.row_height(row) + line;
            }
            painter.fill_rect(Rect::new(left, y - line, right - left, line), color);
        }
        if self.config.line_mask.vertical {
            let mut x = window.first_col_x;
            for col in window.cols() {
                painter.fill_rect(Rect::new(x - line, top, line, bottom - top), color);
                x += self.layout.col_width(col) + line;
            }
            painter.fill_rect(Rect::new(x - line, top, line, bottom - top), color);
        }
    }

    fn paint_marker(&self, painter: &mut dyn Painter, window: &VisibleWindow) {
        let Some(row) = self.cursor.offset() else {
            return;
        };
        if !window.contains_row(row) {
            return;
        }
        let line = self.layout.line_size();
        let y = window
            .rows()
            .take_while(|r| *r < row)
            .fold(window.first_row_y, |y, r| y + self.layout.row_height(r) + line);
        let height = self.layout.row_height(row);
        let color = if self.focused {
            self.config.selection_color
        } else {
            self.config.unfocused_selection_color
        };

        let mut x = window.first_col_x;
        for col in window.cols() {
            let width = self.layout.col_width(col);
            if !self.edit.is_editing_cell(row, col) {
                painter.fill_rect(Rect::new(x, y, width, height), color);
            }
            x += width + line;
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Route a pointer event in grid-local coordinates. Returns `true` if the
    /// grid consumed it.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        self.validate();
        if let Some(handled) = self.route_to_caption(event) {
            return handled;
        }
        if event.kind != PointerKind::Press {
            return false;
        }
        let Some((row, col)) = self.cell_at(event.pos) else {
            return false;
        };
        if self.edit.is_editing_cell(row, col) {
            return true;
        }
        self.commit_edit();

        if let Some(cell) = self.locate_cell(row, col) {
            let local = Point::new(event.pos.x - cell.left(), event.pos.y - cell.top());
            if self
                .projection
                .handle_press(row, col, local, event.click_count)
            {
                self.invalidate();
                self.set_cursor_row(Some(row));
                return true;
            }
        }

        self.set_cursor_row(Some(row));
        self.signals.cell_pressed.emit((row, col));
        let starts_edit = self
            .editors
            .as_ref().is_some_and(|provider| provider.should_start_edit(row, col, event));
        if starts_edit {
            self.start_edit(row, col);
        }
        self.update();
        true
    }

    fn route_to_caption(&mut self, event: &PointerEvent) -> Option<bool> {
        let header = self.header_height();
        let bounds = Rect::new(0.0, 0.0, self.size.width, header);
        let caption = self.caption.as_mut().filter(|c| c.is_visible())?;
        let dragging = matches!(caption.state(), ResizeState::Dragging { .. });
        if !dragging && event.pos.y >= header && event.kind != PointerKind::Move {
            return None;
        }

        match caption.handle_pointer(event, &mut self.layout, bounds) {
            CaptionResponse::Ignored => None,
            CaptionResponse::Consumed => {
                self.update();
                Some(true)
            }
            CaptionResponse::Resized { col, width } => {
                grid_trace!(col, width, "column width committed");
                self.metrics_changed();
                Some(true)
            }
        }
    }

    /// Route a key event. Returns `true` if the grid consumed it.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        self.validate();
        if self.edit.is_editing() {
            if event.is_cancel() {
                self.cancel_edit();
                return true;
            }
            if event.key == Key::Enter {
                self.commit_edit();
                return true;
            }
            if let Some(editor) = self.edit.editor_mut()
                && editor.handle_key(event)
            {
                self.update();
                return true;
            }
        }

        let op = match event.key {
            Key::ArrowUp => SeekOp::LineUp,
            Key::ArrowDown => SeekOp::LineDown,
            Key::PageUp => SeekOp::PageUp,
            Key::PageDown => SeekOp::PageDown,
            Key::Home => SeekOp::Home,
            Key::End => SeekOp::End,
            _ => return self.project_key(event),
        };
        self.visible_window();
        if self.cursor.seek(op) {
            self.cursor_moved();
        }
        true
    }

    fn project_key(&mut self, event: &KeyEvent) -> bool {
        let Some(row) = self.cursor.offset() else {
            return false;
        };
        if !self.projection.handle_key(row, event) {
            return false;
        }
        // Rows below the cursor moved, so the edited cell may now be another.
        self.cancel_edit();
        self.invalidate();
        true
    }

    /// Move the row marker. Returns `true` if it moved.
    pub fn set_cursor_row(&mut self, row: Option<usize>) -> bool {
        self.validate();
        if self.cursor.set_offset(row) {
            self.cursor_moved();
            true
        } else {
            false
        }
    }

    /// Put the cursor back on the item it was on before the rows moved. The
    /// cursor keeps its index when the projection has no stable keys or the
    /// item is no longer shown.
    fn follow_cursor_key(&mut self) {
        if let Some(key) = self.cursor_key
            && let Some(row) = self.projection.row_of_key(key)
        {
            self.cursor.set_offset(Some(row));
        }
        self.remember_cursor_key();
    }

    fn remember_cursor_key(&mut self) {
        self.cursor_key = self
            .cursor
            .offset()
            .and_then(|row| self.projection.row_key(row));
    }

    fn cursor_moved(&mut self) {
        self.remember_cursor_key();
        self.commit_edit();
        if let Some(row) = self.cursor.offset() {
            self.ensure_row_visible(row);
        }
        self.update();
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub fn is_editing(&self) -> bool {
        self.edit.is_editing()
    }

    pub fn editing_cell(&self) -> Option<(usize, usize)> {
        self.edit.cell()
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    pub fn edit_session_mut(&mut self) -> &mut EditSession {
        &mut self.edit
    }

    /// Open an editor on `(row, col)`. An edit elsewhere is committed first.
    /// Returns `false` if the cell is out of range or not editable.
    pub fn start_edit(&mut self, row: usize, col: usize) -> bool {
        self.validate();
        if row >= self.layout.grid_rows()
            || col >= self.layout.grid_cols()
            || !self.projection.editable(row, col)
        {
            return false;
        }
        if self.edit.is_editing_cell(row, col) {
            return true;
        }
        let Some(provider) = self.editors.clone() else {
            return false;
        };
        self.commit_edit();

        let Ok(value) = self.binding.model.try_get(row, col) else {
            return false;
        };
        let Some(mut editor) = provider.editor(row, col, &value) else {
            return false;
        };
        if let Some(bounds) = self.editor_bounds(row, col) {
            editor.set_geometry(bounds);
        }
        editor.request_focus();
        self.edit.begin(row, col, editor);

        tracing::debug!(target: targets::EDIT, row, col, "edit started");
        self.signals.edit_started.emit((row, col));
        self.update();
        true
    }

    /// Write the editor's value back and close it. Returns `false` if nothing
    /// was being edited, including when pending model changes cancelled the
    /// edit.
    pub fn commit_edit(&mut self) -> bool {
        self.validate();
        let Some(active) = self.edit.finish() else {
            return false;
        };
        let (row, col) = (active.row(), active.col());
        if let Some(provider) = &self.editors {
            let value = provider.fetch_edited_value(row, col, active.editor());
            if let Err(err) = self.binding.model.try_put(row, col, value) {
                tracing::warn!(target: targets::EDIT, row, col, %err, "edited value rejected");
            }
        }

        tracing::debug!(target: targets::EDIT, row, col, "edit committed");
        self.signals.edit_committed.emit((row, col));
        self.update();
        true
    }

    /// Close the editor without writing. Returns `false` if nothing was
    /// being edited.
    pub fn cancel_edit(&mut self) -> bool {
        let Some(active) = self.edit.finish() else {
            return false;
        };
        let (row, col) = (active.row(), active.col());
        tracing::debug!(target: targets::EDIT, row, col, "edit cancelled");
        self.signals.edit_cancelled.emit((row, col));
        self.update();
        true
    }

    fn editor_bounds(&self, row: usize, col: usize) -> Option<Rect> {
        let cell = self.locate_cell(row, col)?;
        Some(match self.layout.metric_mode() {
            MetricMode::Preferred => cell.inset(self.layout.cell_insets()),
            MetricMode::Custom => cell,
        })
    }

    fn place_editor(&mut self) {
        let Some((row, col)) = self.edit.cell() else {
            return;
        };
        let Some(bounds) = self.editor_bounds(row, col) else {
            return;
        };
        if let Some(editor) = self.edit.editor_mut() {
            editor.set_geometry(bounds);
        }
    }
}

impl ScrollableContent for Grid {
    fn content_origin(&self) -> Point {
        self.layout.origin()
    }

    /// Move the content. Cancels any edit in progress and recomputes the
    /// visible window immediately.
    fn set_content_origin(&mut self, origin: Point) {
        if self.layout.origin() == origin {
            return;
        }
        self.cancel_edit();
        self.layout.set_origin(origin);
        self.visible_window();
        grid_trace!(x = origin.x, y = origin.y, "content moved");
        self.notify_content_moved(origin);
        self.update();
    }

    fn content_size(&mut self) -> Size {
        self.validate();
        self.current_content_size()
    }

    fn scroll_signals(&self) -> &ScrollSignals {
        &self.scroll_signals
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("size", &self.size)
            .field("mode", &self.layout.metric_mode())
            .field("origin", &self.layout.origin())
            .field("edit", &self.edit)
            .field("cursor", &self.cursor)
            .field("focused", &self.focused)
            .finish()
    }
}

static_assertions::assert_impl_all!(Grid: Send);

/// Index of the cell whose span along one axis contains `pos`.
fn hit(
    range: RangeInclusive<usize>,
    start: f32,
    pos: f32,
    line: f32,
    extent: impl Fn(usize) -> f32,
) -> Option<usize> {
    let mut edge = start;
    for index in range {
        if pos < edge {
            return None;
        }
        let size = extent(index);
        if pos < edge + size {
            return Some(index);
        }
        edge += size + line;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LineMask, TextMetrics};
    use crate::input::MouseButton;
    use crate::model::{CellValue, Matrix};
    use crate::paint::RecordingPainter;
    use crate::provider::TextEditorProvider;
    use horizon_grid_core::Color;
    use parking_lot::Mutex;

    fn config() -> GridConfig {
        GridConfig::default()
            .with_text_metrics(TextMetrics::new(10.0, 10.0))
            .with_default_sizes(20.0, 50.0)
    }

    fn setup() -> (Arc<Matrix>, Grid) {
        let model = Arc::new(Matrix::from_rows([
            ["a0", "b0", "c0"],
            ["a1", "b1", "c1"],
            ["a2", "b2", "c2"],
        ]));
        let mut grid = Grid::with_config(model.clone(), config())
            .with_metric_mode(MetricMode::Custom)
            .with_editor_provider(Arc::new(TextEditorProvider::new(TextMetrics::new(
                10.0, 10.0,
            ))));
        grid.set_size(Size::new(400.0, 300.0));
        (model, grid)
    }

    /// Center of a cell in grid-local coordinates.
    fn center(grid: &mut Grid, row: usize, col: usize) -> Point {
        let rect = grid.cell_rect(row, col).unwrap();
        Point::new(rect.left() + rect.width() / 2.0, rect.top() + rect.height() / 2.0)
    }

    #[test]
    fn test_cell_geometry() {
        let (_, mut grid) = setup();
        assert_eq!(grid.cell_rect(0, 0), Some(Rect::new(1.0, 1.0, 50.0, 20.0)));
        assert_eq!(grid.cell_rect(1, 2), Some(Rect::new(103.0, 22.0, 50.0, 20.0)));
        assert_eq!(grid.cell_rect(3, 0), None);

        assert_eq!(grid.cell_at(Point::new(60.0, 30.0)), Some((1, 1)));
        // Separator line between columns 0 and 1.
        assert_eq!(grid.cell_at(Point::new(51.5, 30.0)), None);
        assert_eq!(grid.cell_at(Point::new(390.0, 30.0)), None);
    }

    #[test]
    fn test_content_size_includes_caption() {
        let (_, mut grid) = setup();
        assert_eq!(grid.content_size(), Size::new(154.0, 64.0));

        let reported = Arc::new(Mutex::new(Vec::new()));
        let log = reported.clone();
        grid.scroll_signals()
            .content_resized
            .connect(move |size| log.lock().push(*size));

        grid.set_caption(Some(GridCaption::default().with_titles(["A", "B", "C"])));
        let header = grid.caption().unwrap().height();
        assert_eq!(grid.content_size(), Size::new(154.0, 64.0 + header));
        assert_eq!(*reported.lock(), vec![Size::new(154.0, 64.0 + header)]);
        assert_eq!(grid.cell_rect(0, 0).unwrap().top(), header + 1.0);
    }

    #[test]
    fn test_model_change_invalidates() {
        let (model, mut grid) = setup();
        assert_eq!(grid.grid_rows(), 3);
        model.put(4, 0, "grown".into());
        assert!(grid.validate());
        assert_eq!(grid.grid_rows(), 5);
        assert!(!grid.validate());
    }

    #[test]
    fn test_paint_order_and_lines() {
        let (_, mut grid) = setup();
        grid.set_cursor_row(Some(1));
        let mut painter = RecordingPainter::new();
        grid.paint(&mut painter);

        assert!(painter.is_balanced());
        assert_eq!(painter.texts().len(), 9);
        // Four horizontal and four vertical separators.
        let lines = painter.fills_of(grid.config().line_color);
        assert_eq!(lines.len(), 8);

        let marker = painter.fills_of(grid.config().unfocused_selection_color);
        assert_eq!(marker.len(), 3);
        assert!(marker.iter().all(|rect| rect.top() == 22.0));

        let last_text = painter
            .commands()
            .iter()
            .rposition(|c| matches!(c, crate::paint::PaintCommand::Text { .. }))
            .unwrap();
        let first_marker = painter
            .commands()
            .iter()
            .position(|c| {
                matches!(c, crate::paint::PaintCommand::FillRect { color, .. }
                    if *color == grid.config().unfocused_selection_color)
            })
            .unwrap();
        assert!(first_marker > last_text);
    }

    #[test]
    fn test_line_mask() {
        let (_, mut grid) = setup();
        let red = Color::from_rgb(1.0, 0.0, 0.0);
        let mut config = config().with_line_mask(LineMask::HORIZONTAL);
        config.line_color = red;
        grid.set_config(config);

        let mut painter = RecordingPainter::new();
        grid.paint(&mut painter);
        let lines = painter.fills_of(red);
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|rect| rect.height() == 1.0));
    }

    #[test]
    fn test_focus_changes_marker_color() {
        let (_, mut grid) = setup();
        grid.set_cursor_row(Some(0));
        grid.set_focused(true);
        let mut painter = RecordingPainter::new();
        grid.paint(&mut painter);
        assert_eq!(painter.fills_of(grid.config().selection_color).len(), 3);
        assert!(!grid.needs_repaint());
    }

    #[test]
    fn test_double_click_edits_and_enter_commits() {
        let (model, mut grid) = setup();
        let pos = center(&mut grid, 1, 1);

        assert!(grid.handle_pointer(&PointerEvent::press(pos, MouseButton::Left, 1)));
        assert!(!grid.is_editing());
        assert_eq!(grid.cursor().offset(), Some(1));

        grid.handle_pointer(&PointerEvent::press(pos, MouseButton::Left, 2));
        assert_eq!(grid.editing_cell(), Some((1, 1)));

        grid.handle_key(&KeyEvent::new(Key::Character('!')));
        grid.handle_key(&KeyEvent::new(Key::Enter));
        assert!(!grid.is_editing());
        assert_eq!(model.get(1, 1), CellValue::Text("b1!".into()));
    }

    #[test]
    fn test_escape_cancels() {
        let (model, mut grid) = setup();
        let cancelled = Arc::new(Mutex::new(Vec::new()));
        let log = cancelled.clone();
        grid.signals()
            .edit_cancelled
            .connect(move |cell| log.lock().push(*cell));

        assert!(grid.start_edit(0, 2));
        grid.handle_key(&KeyEvent::new(Key::Character('x')));
        assert!(grid.handle_key(&KeyEvent::new(Key::Escape)));
        assert!(!grid.is_editing());
        assert_eq!(model.get(0, 2), CellValue::Text("c0".into()));
        assert_eq!(*cancelled.lock(), vec![(0, 2)]);
    }

    #[test]
    fn test_edited_cell_is_not_painted() {
        let (_, mut grid) = setup();
        grid.set_cursor_row(Some(1));
        grid.start_edit(1, 0);
        let mut painter = RecordingPainter::new();
        grid.paint(&mut painter);

        // The editor draws the text itself, above the cells.
        assert_eq!(painter.texts().iter().filter(|t| **t == "a1").count(), 1);
        assert_eq!(painter.fills_of(grid.config().unfocused_selection_color).len(), 2);
    }

    #[test]
    fn test_scrolling_cancels_edit() {
        let (model, mut grid) = setup();
        grid.set_size(Size::new(60.0, 30.0));
        grid.start_edit(0, 0);
        grid.handle_key(&KeyEvent::new(Key::Character('z')));
        grid.set_content_origin(Point::new(-51.0, 0.0));
        assert!(!grid.is_editing());
        assert_eq!(model.get(0, 0), CellValue::Text("a0".into()));
        assert_eq!(grid.visible_window().unwrap().first_col, 1);
    }

    #[test]
    fn test_navigation_commits_and_scrolls() {
        let (model, mut grid) = setup();
        grid.set_size(Size::new(200.0, 30.0));
        grid.set_cursor_row(Some(0));
        grid.start_edit(0, 1);
        grid.handle_key(&KeyEvent::new(Key::Character('?')));

        assert!(grid.handle_key(&KeyEvent::new(Key::ArrowDown)));
        assert_eq!(model.get(0, 1), CellValue::Text("b0?".into()));
        assert_eq!(grid.cursor().offset(), Some(1));

        grid.handle_key(&KeyEvent::new(Key::End));
        assert_eq!(grid.cursor().offset(), Some(2));
        // Row 2 spans 43..63 in content space, plus its bottom line.
        assert_eq!(grid.content_origin(), Point::new(0.0, -34.0));
    }

    #[test]
    fn test_provider_swap_cancels_edit() {
        let (_, mut grid) = setup();
        grid.start_edit(0, 0);
        grid.set_view_provider(Arc::new(DefaultViewProvider::default()));
        assert!(!grid.is_editing());

        grid.start_edit(0, 0);
        grid.set_editor_provider(None);
        assert!(!grid.is_editing());
        assert!(!grid.start_edit(0, 0));
    }

    #[test]
    fn test_rebinding_disconnects_old_model() {
        let (old, mut grid) = setup();
        let new = Arc::new(Matrix::new(1, 1));
        grid.set_data_source(new.clone()).unwrap();
        assert_eq!(grid.grid_rows(), 1);
        assert_eq!(old.signals().cell_changed.connection_count(), 0);

        old.put(9, 9, "ignored".into());
        assert!(!grid.validate());
        assert_eq!(grid.grid_rows(), 1);
    }

    #[test]
    fn test_metric_setters_ignored_in_preferred_mode() {
        let (_, mut grid) = setup();
        grid.set_col_width(0, 90.0);
        assert_eq!(grid.col_width(0), 90.0);

        grid.set_metric_mode(MetricMode::Preferred);
        let preferred = grid.col_width(0);
        grid.set_col_width(0, 300.0);
        assert_eq!(grid.col_width(0), preferred);
    }

    #[test]
    fn test_preferred_mode_disables_caption_resize() {
        let (_, mut grid) = setup();
        grid.set_caption(Some(GridCaption::default()));
        assert!(grid.caption().unwrap().is_resizable());
        grid.set_metric_mode(MetricMode::Preferred);
        assert!(!grid.caption().unwrap().is_resizable());
    }

    #[test]
    fn test_caption_resize_through_grid() {
        let (_, mut grid) = setup();
        grid.set_caption(Some(GridCaption::default().with_titles(["A", "B", "C"])));
        let edge = Point::new(51.0, 5.0);

        grid.handle_pointer(&PointerEvent::moved(edge));
        assert!(grid.caption().unwrap().wants_resize_cursor());
        grid.handle_pointer(&PointerEvent::press(edge, MouseButton::Left, 1));
        grid.handle_pointer(&PointerEvent::drag(Point::new(81.0, 100.0)));

        let mut painter = RecordingPainter::new();
        grid.paint(&mut painter);
        assert_eq!(painter.xor_lines(), 1);

        grid.handle_pointer(&PointerEvent::release(Point::new(81.0, 100.0)));
        assert_eq!(grid.col_width(0), 80.0);
        assert_eq!(grid.content_size().width, 184.0);
    }
}
