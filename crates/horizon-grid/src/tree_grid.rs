//! A grid whose rows are the visible nodes of a tree.
//!
//! [`TreeGrid`] shows a [`TreeGridModel`] through an ordinary [`Grid`]: the
//! rows are the nodes reachable through expanded parents, column 0 is drawn
//! by a [`TreeDisplay`] (indentation, expand indicator and label) and the
//! remaining columns are the node attributes.
//!
//! `+` and `-` expand and collapse the node under the row cursor; pressing
//! the expand indicator toggles it.

use std::sync::Arc;

use slotmap::{Key as _, KeyData};

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Color, GridResult, Insets, Point, Rect, Size};

use crate::config::{GridConfig, TextMetrics};
use crate::grid::Grid;
use crate::input::KeyEvent;
use crate::model::{MatrixModel, NodeId, NodeInfo, TreeGridModel};
use crate::paint::Painter;
use crate::projection::RowProjection;
use crate::provider::View;

/// Draws the tree column of one node row.
pub trait TreeDisplay: Send + Sync {
    /// Height of the node row, without cell insets.
    fn node_height(&self, node: &NodeInfo) -> f32;

    /// Width needed for the node, indentation included.
    fn node_width(&self, node: &NodeInfo) -> f32;

    /// Paint `node` into `rect`, the content box of its column-0 cell.
    fn paint_node(&self, painter: &mut dyn Painter, rect: Rect, node: &NodeInfo);

    /// Whether `pos`, relative to the content box, is on the expand
    /// indicator.
    fn hits_toggle(&self, _node: &NodeInfo, _pos: Point) -> bool {
        false
    }
}

/// Indented labels with a chevron for nodes that have children.
#[derive(Debug, Clone)]
pub struct DefaultTreeDisplay {
    metrics: TextMetrics,
    indentation: f32,
    indicator_size: f32,
    indicator_color: Color,
    text_color: Color,
}

impl Default for DefaultTreeDisplay {
    fn default() -> Self {
        Self::new(TextMetrics::default())
    }
}

impl DefaultTreeDisplay {
    pub fn new(metrics: TextMetrics) -> Self {
        Self {
            metrics,
            indentation: 20.0,
            indicator_size: 16.0,
            indicator_color: Color::from_rgb8(100, 100, 100),
            text_color: Color::BLACK,
        }
    }

    pub fn with_indentation(mut self, indentation: f32) -> Self {
        self.indentation = indentation;
        self
    }

    pub fn with_indicator_size(mut self, size: f32) -> Self {
        self.indicator_size = size;
        self
    }

    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = color;
        self
    }

    pub fn indentation(&self) -> f32 {
        self.indentation
    }

    /// The indicator box of `node` within a content box at the origin.
    fn indicator_rect(&self, node: &NodeInfo) -> Rect {
        let height = self.node_height(node);
        Rect::new(
            node.depth as f32 * self.indentation,
            (height - self.indicator_size) / 2.0,
            self.indicator_size,
            self.indicator_size,
        )
    }

    fn label_x(&self, node: &NodeInfo) -> f32 {
        node.depth as f32 * self.indentation + self.indicator_size.max(self.indentation)
    }
}

impl TreeDisplay for DefaultTreeDisplay {
    fn node_height(&self, _node: &NodeInfo) -> f32 {
        self.metrics.line_height.max(self.indicator_size)
    }

    fn node_width(&self, node: &NodeInfo) -> f32 {
        self.label_x(node) + self.metrics.measure(&node.label).width
    }

    fn paint_node(&self, painter: &mut dyn Painter, rect: Rect, node: &NodeInfo) {
        if node.has_children {
            let indicator = self.indicator_rect(node).offset(rect.left(), rect.top());
            let cx = indicator.left() + indicator.width() / 2.0;
            let cy = indicator.top() + indicator.height() / 2.0;
            let arm = self.indicator_size / 4.0;
            let (a, b, c) = if node.expanded {
                (
                    Point::new(cx - arm, cy - arm / 2.0),
                    Point::new(cx, cy + arm / 2.0),
                    Point::new(cx + arm, cy - arm / 2.0),
                )
            } else {
                (
                    Point::new(cx - arm / 2.0, cy - arm),
                    Point::new(cx + arm / 2.0, cy),
                    Point::new(cx - arm / 2.0, cy + arm),
                )
            };
            painter.draw_line(a, b, self.indicator_color, 1.5);
            painter.draw_line(b, c, self.indicator_color, 1.5);
        }

        let text_y = rect.top() + (rect.height() - self.metrics.line_height) / 2.0;
        painter.draw_text(
            &node.label,
            Point::new(rect.left() + self.label_x(node), text_y),
            self.text_color,
        );
    }

    fn hits_toggle(&self, node: &NodeInfo, pos: Point) -> bool {
        node.has_children && self.indicator_rect(node).contains(pos)
    }
}

/// Column-0 view of one node.
struct NodeView {
    display: Arc<dyn TreeDisplay>,
    node: NodeInfo,
}

impl View for NodeView {
    fn preferred_size(&self) -> Size {
        Size::new(
            self.display.node_width(&self.node),
            self.display.node_height(&self.node),
        )
    }

    fn paint(&self, painter: &mut dyn Painter, rect: Rect) {
        self.display.paint_node(painter, rect, &self.node);
    }

    fn stretch(&self) -> bool {
        true
    }
}

/// Projects the reachable nodes of a tree onto grid rows.
struct TreeRows {
    model: Arc<TreeGridModel>,
    display: Arc<dyn TreeDisplay>,
    insets: Insets,
}

impl RowProjection for TreeRows {
    fn grid_rows(&self, _model: &dyn MatrixModel) -> usize {
        self.model.grid_rows()
    }

    fn row_height(&self, row: usize) -> Option<f32> {
        let node = self.model.node_info(row)?;
        Some(self.display.node_height(&node) + self.insets.vertical())
    }

    fn view(&self, row: usize, col: usize) -> Option<Arc<dyn View>> {
        if col != 0 {
            return None;
        }
        let node = self.model.node_info(row)?;
        Some(Arc::new(NodeView {
            display: self.display.clone(),
            node,
        }))
    }

    fn editable(&self, _row: usize, col: usize) -> bool {
        col != 0
    }

    fn handle_key(&self, row: usize, event: &KeyEvent) -> bool {
        let expanded = if event.is_expand() {
            true
        } else if event.is_collapse() {
            false
        } else {
            return false;
        };
        let Some(id) = self.model.node_at_row(row) else {
            return false;
        };
        self.model.set_expanded(id, expanded).unwrap_or(false)
    }

    fn handle_press(&self, row: usize, col: usize, pos: Point, clicks: u32) -> bool {
        // The first press of a double click already toggled.
        if col != 0 || clicks > 1 {
            return false;
        }
        let Some(node) = self.model.node_info(row) else {
            return false;
        };
        let local = Point::new(pos.x - self.insets.left, pos.y - self.insets.top);
        if !self.display.hits_toggle(&node, local) {
            return false;
        }
        tracing::trace!(target: targets::TREE, row, id = ?node.id, "indicator pressed");
        self.model.toggle(node.id).is_ok()
    }

    fn row_key(&self, row: usize) -> Option<u64> {
        self.model.node_at_row(row).map(|id| id.data().as_ffi())
    }

    fn row_of_key(&self, key: u64) -> Option<usize> {
        self.model.row_of_node(NodeId::from(KeyData::from_ffi(key)))
    }
}

/// A [`Grid`] over a [`TreeGridModel`].
///
/// The data source is fixed at construction; rebinding it through
/// [`Grid::set_data_source`] fails with
/// [`GridError::DataSourceLocked`](horizon_grid_core::GridError::DataSourceLocked).
pub struct TreeGrid {
    grid: Grid,
    model: Arc<TreeGridModel>,
}

impl TreeGrid {
    pub fn new(model: Arc<TreeGridModel>) -> Self {
        Self::with_config(model, GridConfig::default())
    }

    pub fn with_config(model: Arc<TreeGridModel>, config: GridConfig) -> Self {
        let display = Arc::new(DefaultTreeDisplay::new(config.text_metrics));
        Self::with_display(model, config, display)
    }

    pub fn with_display(
        model: Arc<TreeGridModel>,
        config: GridConfig,
        display: Arc<dyn TreeDisplay>,
    ) -> Self {
        let rows = TreeRows {
            model: model.clone(),
            display,
            insets: config.cell_insets,
        };
        let mut grid =
            Grid::with_config(model.clone(), config).with_row_projection(Arc::new(rows));
        grid.lock_data_source();
        Self { grid, model }
    }

    pub fn model(&self) -> &Arc<TreeGridModel> {
        &self.model
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Always fails: a tree grid stays bound to its tree.
    pub fn set_data_source(&mut self, model: Arc<dyn MatrixModel>) -> GridResult<()> {
        self.grid.set_data_source(model)
    }

    /// Number of visible node rows.
    pub fn grid_rows(&mut self) -> usize {
        self.grid.grid_rows()
    }

    pub fn node_at_row(&self, row: usize) -> Option<NodeId> {
        self.model.node_at_row(row)
    }

    pub fn row_of_node(&self, id: NodeId) -> Option<usize> {
        self.model.row_of_node(id)
    }

    /// The node under the row cursor.
    pub fn current_node(&mut self) -> Option<NodeId> {
        self.grid.validate();
        self.grid
            .cursor()
            .offset()
            .and_then(|row| self.model.node_at_row(row))
    }

    /// Expand every ancestor of `id` and move the row cursor onto it.
    pub fn select_node(&mut self, id: NodeId) -> GridResult<()> {
        let mut parent = self.model.parent(id)?;
        while let Some(ancestor) = parent {
            self.model.set_expanded(ancestor, true)?;
            parent = self.model.parent(ancestor)?;
        }
        let row = self.model.row_of_node(id);
        self.grid.set_cursor_row(row);
        Ok(())
    }

    /// Expand or collapse `id`. Rows shift, so an edit in progress is
    /// cancelled and the row cursor stays on its node when still shown.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> GridResult<bool> {
        let changed = self.model.set_expanded(id, expanded)?;
        self.grid.validate();
        Ok(changed)
    }

    pub fn toggle(&mut self, id: NodeId) -> GridResult<bool> {
        let expanded = self.model.toggle(id)?;
        self.grid.validate();
        Ok(expanded)
    }

    pub fn expand_all(&mut self) {
        self.model.expand_all();
        self.grid.validate();
    }

    pub fn collapse_all(&mut self) {
        self.model.collapse_all();
        self.grid.validate();
    }
}

impl std::fmt::Debug for TreeGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeGrid")
            .field("grid", &self.grid)
            .field("nodes", &self.model.node_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, MouseButton, PointerEvent};
    use crate::metrics::MetricMode;
    use crate::model::CellValue;
    use crate::paint::RecordingPainter;
    use crate::provider::TextEditorProvider;
    use crate::scroll::ScrollableContent;
    use horizon_grid_core::GridError;

    struct Fixture {
        tree: TreeGrid,
        a: NodeId,
        a1: NodeId,
        b: NodeId,
    }

    /// ```text
    /// a
    /// ├── a1
    /// │   └── a1x
    /// └── a2
    /// b
    /// ```
    fn setup() -> Fixture {
        let model = Arc::new(TreeGridModel::new(2));
        let a = model.add_root("a");
        let a1 = model.add_child(a, "a1").unwrap();
        model.add_child(a1, "a1x").unwrap();
        model.add_child(a, "a2").unwrap();
        let b = model.add_root("b");
        model.set_attribute(b, 1, "size".into()).unwrap();

        let config = GridConfig::default().with_text_metrics(TextMetrics::new(8.0, 12.0));
        let mut tree = TreeGrid::with_config(model, config);
        tree.grid_mut().set_size(Size::new(300.0, 200.0));
        Fixture { tree, a, a1, b }
    }

    #[test]
    fn test_rows_follow_expansion() {
        let Fixture {
            mut tree, a, a1, ..
        } = setup();
        assert_eq!(tree.grid_rows(), 2);
        assert_eq!(tree.model().rows(), 5);

        let gained = tree.model().reachable_descendants(a).unwrap();
        tree.set_expanded(a, true).unwrap();
        assert_eq!(tree.grid_rows(), 2 + gained);

        tree.set_expanded(a1, true).unwrap();
        assert_eq!(tree.grid_rows(), 5);
        tree.collapse_all();
        assert_eq!(tree.grid_rows(), 2);
    }

    #[test]
    fn test_row_height_from_display() {
        let Fixture { mut tree, .. } = setup();
        // Indicator is taller than a text line; default insets add 2.
        assert_eq!(tree.grid_mut().row_height(0), 18.0);
        tree.grid_mut().set_metric_mode(MetricMode::Custom);
        assert_eq!(tree.grid_mut().row_height(1), 18.0);
    }

    #[test]
    fn test_plus_minus_keys() {
        let Fixture { mut tree, a, .. } = setup();
        tree.grid_mut().set_cursor_row(Some(0));

        assert!(tree.grid_mut().handle_key(&KeyEvent::new(Key::Plus)));
        assert!(tree.model().is_expanded(a).unwrap());
        assert_eq!(tree.grid_rows(), 4);

        // Already expanded: nothing to consume.
        assert!(!tree.grid_mut().handle_key(&KeyEvent::new(Key::NumpadAdd)));

        assert!(tree.grid_mut().handle_key(&KeyEvent::new(Key::Minus)));
        assert_eq!(tree.grid_rows(), 2);
    }

    #[test]
    fn test_indicator_press_toggles() {
        let Fixture { mut tree, a, b, .. } = setup();
        let cell = tree.grid_mut().cell_rect(0, 0).unwrap();
        let insets = tree.grid().config().cell_insets;
        let on_indicator = Point::new(
            cell.left() + insets.left + 8.0,
            cell.top() + cell.height() / 2.0,
        );

        assert!(tree.grid_mut().handle_pointer(&PointerEvent::press(
            on_indicator,
            MouseButton::Left,
            1
        )));
        assert!(tree.model().is_expanded(a).unwrap());
        assert_eq!(tree.current_node(), Some(a));

        // b has no children, so its indicator area is just a row press.
        let row_b = tree.row_of_node(b).unwrap();
        let cell = tree.grid_mut().cell_rect(row_b, 0).unwrap();
        let press = Point::new(
            cell.left() + insets.left + 8.0,
            cell.top() + cell.height() / 2.0,
        );
        tree.grid_mut()
            .handle_pointer(&PointerEvent::press(press, MouseButton::Left, 1));
        assert_eq!(tree.current_node(), Some(b));
        assert_eq!(tree.grid_rows(), 4);
    }

    #[test]
    fn test_tree_column_painted_by_display() {
        let Fixture { mut tree, a, .. } = setup();
        tree.set_expanded(a, true).unwrap();
        let mut painter = RecordingPainter::new();
        tree.grid_mut().paint(&mut painter);

        assert_eq!(painter.texts(), vec!["a", "a1", "a2", "b", "size"]);
        let a = painter.text_origin("a").unwrap();
        let a1 = painter.text_origin("a1").unwrap();
        assert_eq!(a1.x - a.x, 20.0);
    }

    #[test]
    fn test_column_zero_not_editable() {
        let Fixture { mut tree, b, .. } = setup();
        tree.grid_mut()
            .set_editor_provider(Some(Arc::new(TextEditorProvider::default())));
        let row = tree.row_of_node(b).unwrap();

        assert!(!tree.grid_mut().start_edit(row, 0));
        assert!(tree.grid_mut().start_edit(row, 1));
        tree.grid_mut()
            .handle_key(&KeyEvent::new(Key::Character('!')));
        tree.grid_mut().commit_edit();
        assert_eq!(
            tree.model().attribute(b, 1).unwrap(),
            CellValue::Text("size!".into())
        );
    }

    #[test]
    fn test_expanding_above_edit_cancels_it() {
        let Fixture { mut tree, a, a1, b } = setup();
        tree.grid_mut()
            .set_editor_provider(Some(Arc::new(TextEditorProvider::default())));
        let row_b = tree.row_of_node(b).unwrap();

        assert!(tree.grid_mut().start_edit(row_b, 1));
        tree.grid_mut()
            .handle_key(&KeyEvent::new(Key::Character('!')));
        tree.set_expanded(a, true).unwrap();

        assert!(!tree.grid().is_editing());
        assert!(!tree.grid_mut().commit_edit());
        assert_eq!(
            tree.model().attribute(b, 1).unwrap(),
            CellValue::Text("size".into())
        );
        assert!(tree.model().attribute(a1, 1).unwrap().is_none());

        // Same through the model, behind the tree grid's back.
        let row_b = tree.row_of_node(b).unwrap();
        assert!(tree.grid_mut().start_edit(row_b, 1));
        tree.model().set_expanded(a, false).unwrap();
        assert!(!tree.grid_mut().commit_edit());
        assert_eq!(
            tree.model().attribute(b, 1).unwrap(),
            CellValue::Text("size".into())
        );
    }

    #[test]
    fn test_cursor_stays_on_node_when_rows_shift() {
        let Fixture { mut tree, a, b, .. } = setup();
        tree.grid_mut().set_cursor_row(Some(1));
        assert_eq!(tree.current_node(), Some(b));

        tree.set_expanded(a, true).unwrap();
        assert_eq!(tree.grid().cursor().offset(), Some(3));
        assert_eq!(tree.current_node(), Some(b));

        tree.model().collapse_all();
        assert_eq!(tree.current_node(), Some(b));
        assert_eq!(tree.grid().cursor().offset(), Some(1));

        // `-` acts on the node under the cursor, not on whatever took its row.
        tree.set_expanded(a, true).unwrap();
        assert!(!tree.grid_mut().handle_key(&KeyEvent::new(Key::Minus)));
        assert!(tree.model().is_expanded(a).unwrap());
    }

    #[test]
    fn test_double_click_on_indicator_toggles_once() {
        let Fixture { mut tree, a, .. } = setup();
        let cell = tree.grid_mut().cell_rect(0, 0).unwrap();
        let insets = tree.grid().config().cell_insets;
        let on_indicator = Point::new(
            cell.left() + insets.left + 8.0,
            cell.top() + cell.height() / 2.0,
        );

        for clicks in [1, 2] {
            tree.grid_mut()
                .handle_pointer(&PointerEvent::press(on_indicator, MouseButton::Left, clicks));
        }
        assert!(tree.model().is_expanded(a).unwrap());
        assert_eq!(tree.grid_rows(), 4);
        assert_eq!(tree.current_node(), Some(a));
    }

    #[test]
    fn test_data_source_locked() {
        let Fixture { mut tree, .. } = setup();
        let other = Arc::new(TreeGridModel::new(1));
        assert_eq!(tree.set_data_source(other), Err(GridError::DataSourceLocked));
        assert_eq!(tree.grid_rows(), 2);
    }

    #[test]
    fn test_select_hidden_node_expands_ancestors() {
        let Fixture { mut tree, a, a1, .. } = setup();
        let a1x = tree.model().children(a1).unwrap()[0];
        tree.select_node(a1x).unwrap();

        assert!(tree.model().is_expanded(a).unwrap());
        assert!(tree.model().is_expanded(a1).unwrap());
        assert_eq!(tree.current_node(), Some(a1x));
        assert_eq!(tree.grid_mut().content_origin(), Point::ZERO);
    }
}
