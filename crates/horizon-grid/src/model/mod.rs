//! Data models for the grid.
//!
//! - [`MatrixModel`]: the data source contract every grid reads from
//! - [`Matrix`]: resizable in-memory matrix
//! - [`TreeGridModel`]: hierarchy with per-node attribute columns
//! - [`CellValue`]: the value stored in a cell

mod matrix;
mod tree;
mod value;

pub use matrix::{CellChange, DimensionsChange, Matrix, MatrixModel, MatrixSignals};
pub use tree::{NodeId, NodeInfo, TreeGridModel, TreeSignals};
pub use value::{CellValue, WidgetHandle};
