//! How model rows become grid rows.
//!
//! A plain grid shows every model row. A [`RowProjection`] lets a variant such
//! as the tree-grid substitute its own row count, row heights, cell views and
//! row-level key handling without the grid knowing about hierarchies.

use std::sync::Arc;

use horizon_grid_core::Point;

use crate::input::KeyEvent;
use crate::model::MatrixModel;
use crate::provider::View;

/// Row-level behavior substituted into a grid.
pub trait RowProjection: Send + Sync {
    /// Number of rows the grid displays.
    fn grid_rows(&self, model: &dyn MatrixModel) -> usize;

    /// A fixed height for `row`, overriding both metric modes.
    fn row_height(&self, _row: usize) -> Option<f32> {
        None
    }

    /// A view that replaces the view provider's for `(row, col)`.
    fn view(&self, _row: usize, _col: usize) -> Option<Arc<dyn View>> {
        None
    }

    /// Whether `(row, col)` may be edited in place.
    fn editable(&self, _row: usize, _col: usize) -> bool {
        true
    }

    /// A key pressed while the cursor is on `row`. Returns `true` if the
    /// projection changed the rows.
    fn handle_key(&self, _row: usize, _event: &KeyEvent) -> bool {
        false
    }

    /// A press inside `(row, col)` at `pos`, relative to the cell's top-left
    /// corner. `clicks` is 2 for the second press of a double click. Returns
    /// `true` if the projection changed the rows.
    fn handle_press(&self, _row: usize, _col: usize, _pos: Point, _clicks: u32) -> bool {
        false
    }

    /// A key for the item shown on `row` that survives rows moving. The row
    /// cursor uses it to stay on its item.
    fn row_key(&self, _row: usize) -> Option<u64> {
        None
    }

    /// The row currently showing the item behind `key`.
    fn row_of_key(&self, _key: u64) -> Option<usize> {
        None
    }
}

/// One grid row per model row.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatRows;

impl RowProjection for FlatRows {
    fn grid_rows(&self, model: &dyn MatrixModel) -> usize {
        model.rows()
    }
}
