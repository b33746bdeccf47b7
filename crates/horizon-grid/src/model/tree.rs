//! Hierarchical model backing the tree-grid.
//!
//! Nodes live in a slot-map arena and are addressed by [`NodeId`]. Per-node
//! attribute values (grid columns `1..cols`) are stored beside the arena and
//! dropped together with their node. Column 0 is the tree itself: it shows the
//! node label and cannot be written through the matrix interface.
//!
//! As a [`MatrixModel`], rows are addressed by *visible row index*: the
//! position of a node in the depth-first list of nodes reachable from the
//! roots through expanded parents. [`MatrixModel::rows`] still reports the
//! total node count; [`TreeGridModel::grid_rows`] reports the reachable count.

use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use slotmap::{SecondaryMap, SlotMap, new_key_type};

use horizon_grid_core::logging::targets;
use horizon_grid_core::{GridError, GridResult, Signal};

use super::matrix::{CellChange, DimensionsChange, MatrixModel, MatrixSignals};
use super::value::CellValue;

new_key_type! {
    /// Handle to a node in a [`TreeGridModel`].
    pub struct NodeId;
}

/// Everything a tree display needs to draw one node row.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub label: String,
    pub depth: usize,
    pub expanded: bool,
    pub has_children: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VisibleNode {
    id: NodeId,
    depth: usize,
}

#[derive(Debug)]
struct TreeNode {
    label: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    expanded: bool,
}

struct TreeState {
    nodes: SlotMap<NodeId, TreeNode>,
    roots: Vec<NodeId>,
    attributes: SecondaryMap<NodeId, Vec<CellValue>>,
    cols: usize,
    projection: Vec<VisibleNode>,
    projection_valid: bool,
}

impl TreeState {
    fn rebuild_projection(&mut self) {
        let mut projection = Vec::with_capacity(self.projection.len());
        let mut stack: Vec<VisibleNode> = self
            .roots
            .iter()
            .rev()
            .map(|&id| VisibleNode { id, depth: 0 })
            .collect();

        while let Some(entry) = stack.pop() {
            projection.push(entry);
            let node = &self.nodes[entry.id];
            if node.expanded {
                stack.extend(node.children.iter().rev().map(|&id| VisibleNode {
                    id,
                    depth: entry.depth + 1,
                }));
            }
        }

        tracing::trace!(
            target: targets::TREE,
            visible = projection.len(),
            total = self.nodes.len(),
            "rebuilt row projection"
        );
        self.projection = projection;
        self.projection_valid = true;
    }

    fn node(&self, id: NodeId) -> GridResult<&TreeNode> {
        self.nodes.get(id).ok_or(GridError::UnknownNode)
    }

    fn node_mut(&mut self, id: NodeId) -> GridResult<&mut TreeNode> {
        self.nodes.get_mut(id).ok_or(GridError::UnknownNode)
    }

    fn reachable_descendants(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut stack: Vec<NodeId> = self.nodes[id].children.clone();
        while let Some(child) = stack.pop() {
            count += 1;
            let node = &self.nodes[child];
            if node.expanded {
                stack.extend(node.children.iter().copied());
            }
        }
        count
    }

    fn info(&self, entry: VisibleNode) -> NodeInfo {
        let node = &self.nodes[entry.id];
        NodeInfo {
            id: entry.id,
            label: node.label.clone(),
            depth: entry.depth,
            expanded: node.expanded,
            has_children: !node.children.is_empty(),
        }
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> GridError {
        GridError::OutOfBounds {
            row,
            col,
            rows: self.projection.len(),
            cols: self.cols,
        }
    }
}

/// Signals specific to the hierarchy.
pub struct TreeSignals {
    /// A node was expanded (`true`) or collapsed (`false`).
    pub expansion_changed: Signal<(NodeId, bool)>,
    /// A node and its subtree were removed. Carries the subtree root.
    pub node_removed: Signal<NodeId>,
}

/// A tree of labelled nodes with per-node attribute columns.
///
/// # Example
///
/// ```
/// use horizon_grid::model::TreeGridModel;
///
/// let model = TreeGridModel::new(2);
/// let root = model.add_root("src");
/// model.add_child(root, "lib.rs").unwrap();
/// assert_eq!(model.grid_rows(), 1);
///
/// model.set_expanded(root, true).unwrap();
/// assert_eq!(model.grid_rows(), 2);
/// ```
pub struct TreeGridModel {
    state: RwLock<TreeState>,
    signals: MatrixSignals,
    tree_signals: TreeSignals,
}

impl TreeGridModel {
    /// Create an empty tree with `cols` grid columns (at least one: the tree
    /// column).
    pub fn new(cols: usize) -> Self {
        Self {
            state: RwLock::new(TreeState {
                nodes: SlotMap::with_key(),
                roots: Vec::new(),
                attributes: SecondaryMap::new(),
                cols: cols.max(1),
                projection: Vec::new(),
                projection_valid: true,
            }),
            signals: MatrixSignals::new(),
            tree_signals: TreeSignals {
                expansion_changed: Signal::new(),
                node_removed: Signal::new(),
            },
        }
    }

    pub fn tree_signals(&self) -> &TreeSignals {
        &self.tree_signals
    }

    /// Run `f` against state whose row projection is current.
    fn with_projection<R>(&self, f: impl FnOnce(&TreeState) -> R) -> R {
        let state = self.state.upgradable_read();
        if state.projection_valid {
            return f(&state);
        }
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.rebuild_projection();
        let state = RwLockWriteGuard::downgrade(state);
        f(&state)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Append a new top-level node. New nodes start collapsed.
    pub fn add_root(&self, label: impl Into<String>) -> NodeId {
        let (id, change) = {
            let mut state = self.state.write();
            let old_rows = state.nodes.len();
            let cols = state.cols;
            let id = state.nodes.insert(TreeNode {
                label: label.into(),
                parent: None,
                children: Vec::new(),
                expanded: false,
            });
            state.roots.push(id);
            state.attributes.insert(id, vec![CellValue::None; cols - 1]);
            state.projection_valid = false;
            (id, grown_by_one(old_rows, cols))
        };
        self.signals.dimensions_changed.emit(change);
        id
    }

    /// Append a new child under `parent`.
    pub fn add_child(&self, parent: NodeId, label: impl Into<String>) -> GridResult<NodeId> {
        let (id, change) = {
            let mut state = self.state.write();
            state.node(parent)?;
            let old_rows = state.nodes.len();
            let cols = state.cols;
            let id = state.nodes.insert(TreeNode {
                label: label.into(),
                parent: Some(parent),
                children: Vec::new(),
                expanded: false,
            });
            state.node_mut(parent)?.children.push(id);
            state.attributes.insert(id, vec![CellValue::None; cols - 1]);
            state.projection_valid = false;
            (id, grown_by_one(old_rows, cols))
        };
        self.signals.dimensions_changed.emit(change);
        Ok(id)
    }

    /// Remove a node with its whole subtree. Returns the number of nodes
    /// removed.
    pub fn remove(&self, id: NodeId) -> GridResult<usize> {
        let (removed, change) = {
            let mut state = self.state.write();
            let parent = state.node(id)?.parent;
            let old_rows = state.nodes.len();

            match parent {
                Some(parent) => state.node_mut(parent)?.children.retain(|&c| c != id),
                None => state.roots.retain(|&r| r != id),
            }

            let mut removed = 0;
            let mut stack = vec![id];
            while let Some(next) = stack.pop() {
                if let Some(node) = state.nodes.remove(next) {
                    stack.extend(node.children);
                    state.attributes.remove(next);
                    removed += 1;
                }
            }
            state.projection_valid = false;

            let change = DimensionsChange {
                old_rows,
                old_cols: state.cols,
                rows: state.nodes.len(),
                cols: state.cols,
            };
            (removed, change)
        };

        tracing::debug!(target: targets::TREE, removed, "removed subtree");
        self.tree_signals.node_removed.emit(id);
        self.signals.dimensions_changed.emit(change);
        Ok(removed)
    }

    pub fn roots(&self) -> Vec<NodeId> {
        self.state.read().roots.clone()
    }

    pub fn children(&self, id: NodeId) -> GridResult<Vec<NodeId>> {
        Ok(self.state.read().node(id)?.children.clone())
    }

    pub fn parent(&self, id: NodeId) -> GridResult<Option<NodeId>> {
        Ok(self.state.read().node(id)?.parent)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.state.read().nodes.contains_key(id)
    }

    /// Total number of nodes, reachable or not.
    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn label(&self, id: NodeId) -> GridResult<String> {
        Ok(self.state.read().node(id)?.label.clone())
    }

    pub fn set_label(&self, id: NodeId, label: impl Into<String>) -> GridResult<()> {
        let (row, previous) = {
            let mut state = self.state.write();
            let previous = std::mem::replace(&mut state.node_mut(id)?.label, label.into());
            let row = state
                .projection_valid
                .then(|| state.projection.iter().position(|v| v.id == id))
                .flatten();
            (row, previous)
        };
        if let Some(row) = row {
            self.signals.cell_changed.emit(CellChange {
                row,
                col: 0,
                previous: CellValue::Text(previous),
            });
        } else {
            self.signals.layout_changed.emit(());
        }
        Ok(())
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    pub fn is_expanded(&self, id: NodeId) -> GridResult<bool> {
        Ok(self.state.read().node(id)?.expanded)
    }

    /// Expand or collapse a node. Returns `true` if the state changed.
    pub fn set_expanded(&self, id: NodeId, expanded: bool) -> GridResult<bool> {
        {
            let mut state = self.state.write();
            let node = state.node_mut(id)?;
            if node.expanded == expanded {
                return Ok(false);
            }
            node.expanded = expanded;
            state.projection_valid = false;
        }
        tracing::debug!(target: targets::TREE, ?id, expanded, "expansion changed");
        self.tree_signals.expansion_changed.emit((id, expanded));
        self.signals.layout_changed.emit(());
        Ok(true)
    }

    /// Flip a node's expansion. Returns the new state.
    pub fn toggle(&self, id: NodeId) -> GridResult<bool> {
        let expanded = !self.is_expanded(id)?;
        self.set_expanded(id, expanded)?;
        Ok(expanded)
    }

    pub fn expand_all(&self) {
        self.set_all_expanded(true);
    }

    pub fn collapse_all(&self) {
        self.set_all_expanded(false);
    }

    fn set_all_expanded(&self, expanded: bool) {
        let changed = {
            let mut state = self.state.write();
            let mut changed = false;
            for node in state.nodes.values_mut() {
                if !node.children.is_empty() && node.expanded != expanded {
                    node.expanded = expanded;
                    changed = true;
                }
            }
            if changed {
                state.projection_valid = false;
            }
            changed
        };
        if changed {
            self.signals.layout_changed.emit(());
        }
    }

    /// Number of descendants that become visible rows when `id` is expanded
    /// (and its ancestors are reachable).
    pub fn reachable_descendants(&self, id: NodeId) -> GridResult<usize> {
        let state = self.state.read();
        state.node(id)?;
        Ok(state.reachable_descendants(id))
    }

    // =========================================================================
    // Row projection
    // =========================================================================

    /// Number of nodes reachable from the roots through expanded parents.
    pub fn grid_rows(&self) -> usize {
        self.with_projection(|state| state.projection.len())
    }

    /// The node shown at a visible row.
    pub fn node_at_row(&self, row: usize) -> Option<NodeId> {
        self.with_projection(|state| state.projection.get(row).map(|v| v.id))
    }

    /// The visible row of a node, or `None` if it is hidden under a collapsed
    /// ancestor.
    pub fn row_of_node(&self, id: NodeId) -> Option<usize> {
        self.with_projection(|state| state.projection.iter().position(|v| v.id == id))
    }

    /// Display information for the node at a visible row.
    pub fn node_info(&self, row: usize) -> Option<NodeInfo> {
        self.with_projection(|state| state.projection.get(row).map(|&v| state.info(v)))
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Read an attribute column (`1..cols`) of a node by handle.
    pub fn attribute(&self, id: NodeId, col: usize) -> GridResult<CellValue> {
        let state = self.state.read();
        state.node(id)?;
        if col == 0 {
            return Ok(CellValue::Text(state.nodes[id].label.clone()));
        }
        Ok(state
            .attributes
            .get(id)
            .and_then(|values| values.get(col - 1))
            .cloned()
            .unwrap_or_default())
    }

    /// Write an attribute column of a node by handle, growing the column
    /// count if needed.
    pub fn set_attribute(&self, id: NodeId, col: usize, value: CellValue) -> GridResult<()> {
        if col == 0 {
            return Err(GridError::ReadOnlyColumn { col });
        }
        let (grown, row, previous) = {
            let mut state = self.state.write();
            state.node(id)?;
            let grown = grow_cols(&mut state, col);
            let previous = match state.attributes.get_mut(id) {
                Some(values) => std::mem::replace(&mut values[col - 1], value),
                None => CellValue::None,
            };
            let row = state
                .projection_valid
                .then(|| state.projection.iter().position(|v| v.id == id))
                .flatten();
            (grown, row, previous)
        };

        if let Some(change) = grown {
            self.signals.dimensions_changed.emit(change);
        }
        match row {
            Some(row) => self.signals.cell_changed.emit(CellChange { row, col, previous }),
            None => self.signals.layout_changed.emit(()),
        }
        Ok(())
    }
}

fn grown_by_one(old_rows: usize, cols: usize) -> DimensionsChange {
    DimensionsChange {
        old_rows,
        old_cols: cols,
        rows: old_rows + 1,
        cols,
    }
}

/// Grow every attribute row so that `col` is addressable.
fn grow_cols(state: &mut TreeState, col: usize) -> Option<DimensionsChange> {
    if col < state.cols {
        return None;
    }
    let change = DimensionsChange {
        old_rows: state.nodes.len(),
        old_cols: state.cols,
        rows: state.nodes.len(),
        cols: col + 1,
    };
    state.cols = col + 1;
    for values in state.attributes.values_mut() {
        values.resize(col, CellValue::None);
    }
    Some(change)
}

impl MatrixModel for TreeGridModel {
    /// Total node count.
    fn rows(&self) -> usize {
        self.node_count()
    }

    fn cols(&self) -> usize {
        self.state.read().cols
    }

    fn try_get(&self, row: usize, col: usize) -> GridResult<CellValue> {
        self.with_projection(|state| {
            let entry = match state.projection.get(row) {
                Some(entry) if col < state.cols => *entry,
                _ => return Err(state.out_of_bounds(row, col)),
            };
            if col == 0 {
                return Ok(CellValue::Text(state.nodes[entry.id].label.clone()));
            }
            Ok(state
                .attributes
                .get(entry.id)
                .and_then(|values| values.get(col - 1))
                .cloned()
                .unwrap_or_default())
        })
    }

    /// Writes column `col` of the node at visible row `row`.
    ///
    /// Column 0 is rejected with [`GridError::ReadOnlyColumn`]; use
    /// [`TreeGridModel::set_label`] instead. Rows past the reachable count
    /// are out of bounds, since rows cannot be conjured without a parent.
    fn try_put(&self, row: usize, col: usize, value: CellValue) -> GridResult<()> {
        if col == 0 {
            return Err(GridError::ReadOnlyColumn { col });
        }
        let id = self.with_projection(|state| {
            state
                .projection
                .get(row)
                .map(|v| v.id)
                .ok_or_else(|| state.out_of_bounds(row, col))
        })?;
        self.set_attribute(id, col, value)
    }

    fn signals(&self) -> &MatrixSignals {
        &self.signals
    }
}

static_assertions::assert_impl_all!(TreeGridModel: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    /// ```text
    /// a
    /// ├── a1
    /// │   └── a1x
    /// └── a2
    /// b
    /// ```
    fn setup() -> (TreeGridModel, [NodeId; 5]) {
        let model = TreeGridModel::new(3);
        let a = model.add_root("a");
        let a1 = model.add_child(a, "a1").unwrap();
        let a1x = model.add_child(a1, "a1x").unwrap();
        let a2 = model.add_child(a, "a2").unwrap();
        let b = model.add_root("b");
        (model, [a, a1, a1x, a2, b])
    }

    #[test]
    fn test_collapsed_projection() {
        let (model, [a, _, _, _, b]) = setup();
        assert_eq!(model.rows(), 5);
        assert_eq!(model.grid_rows(), 2);
        assert_eq!(model.node_at_row(0), Some(a));
        assert_eq!(model.node_at_row(1), Some(b));
        assert_eq!(model.get(1, 0).as_text(), Some("b"));
    }

    #[test]
    fn test_expand_changes_rows_by_reachable_descendants() {
        let (model, [a, a1, a1x, _, _]) = setup();

        assert_eq!(model.reachable_descendants(a).unwrap(), 2);
        model.set_expanded(a, true).unwrap();
        assert_eq!(model.grid_rows(), 4);

        assert_eq!(model.reachable_descendants(a1).unwrap(), 1);
        model.toggle(a1).unwrap();
        assert_eq!(model.grid_rows(), 5);
        assert_eq!(model.row_of_node(a1x), Some(2));
        assert_eq!(model.node_info(2).unwrap().depth, 2);

        // Collapsing the root hides the whole expanded subtree.
        assert_eq!(model.reachable_descendants(a).unwrap(), 3);
        model.toggle(a).unwrap();
        assert_eq!(model.grid_rows(), 2);
        assert_eq!(model.row_of_node(a1x), None);
    }

    #[test]
    fn test_column_zero_is_read_only() {
        let (model, _) = setup();
        assert_eq!(
            model.try_put(0, 0, "x".into()),
            Err(GridError::ReadOnlyColumn { col: 0 })
        );
    }

    #[test]
    #[should_panic(expected = "read-only")]
    fn test_put_column_zero_panics() {
        let (model, _) = setup();
        model.put(0, 0, "x".into());
    }

    #[test]
    fn test_attributes_follow_visible_rows() {
        let (model, [a, _, _, a2, b]) = setup();
        model.set_attribute(b, 1, 10.into()).unwrap();
        assert_eq!(model.get(1, 1), CellValue::Int(10));

        model.set_expanded(a, true).unwrap();
        assert_eq!(model.get(3, 1), CellValue::Int(10));

        model.put(2, 2, "size".into());
        assert_eq!(model.attribute(a2, 2).unwrap().as_text(), Some("size"));
    }

    #[test]
    fn test_put_grows_columns() {
        let (model, [a, ..]) = setup();
        model.put(0, 5, true.into());
        assert_eq!(model.cols(), 6);
        assert_eq!(model.attribute(a, 5).unwrap(), CellValue::Bool(true));
        assert!(model.get(1, 4).is_none());
    }

    #[test]
    fn test_remove_cascades() {
        let (model, [a, a1, a1x, _, b]) = setup();
        model.set_attribute(a1x, 1, "gone".into()).unwrap();

        assert_eq!(model.remove(a1).unwrap(), 2);
        assert_eq!(model.node_count(), 3);
        assert!(!model.contains(a1x));
        assert_eq!(model.attribute(a1x, 1), Err(GridError::UnknownNode));
        assert_eq!(model.children(a).unwrap().len(), 1);

        model.remove(b).unwrap();
        assert_eq!(model.roots(), vec![a]);
    }

    #[test]
    fn test_set_label_reports_previous_label() {
        let (model, [_, _, _, _, b]) = setup();
        assert_eq!(model.grid_rows(), 2);

        let changes = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = changes.clone();
        model
            .signals()
            .cell_changed
            .connect(move |change| log.lock().push(change.clone()));

        model.set_label(b, "bee").unwrap();
        assert_eq!(model.get(1, 0).as_text(), Some("bee"));
        assert_eq!(
            *changes.lock(),
            vec![CellChange {
                row: 1,
                col: 0,
                previous: CellValue::Text("b".into()),
            }]
        );
    }

    #[test]
    fn test_expand_all_collapse_all() {
        let (model, _) = setup();
        model.expand_all();
        assert_eq!(model.grid_rows(), 5);
        model.collapse_all();
        assert_eq!(model.grid_rows(), 2);
    }
}
