//! Horizon Grid - a virtualized, editable data grid and tree-grid.
//!
//! The grid shows a two-dimensional [`MatrixModel`] and only ever touches
//! the cells inside its viewport. Hosts drive it through a small surface:
//!
//! - size it ([`Grid::set_size`]) and scroll it ([`ScrollableContent`])
//! - paint it onto a [`Painter`]
//! - feed it [`PointerEvent`]s and [`KeyEvent`]s
//!
//! How cells look and how they are edited is pluggable through
//! [`ViewProvider`] and [`EditorProvider`]. A [`GridCaption`] adds column
//! titles with interactive resizing, and [`TreeGrid`] shows a
//! [`TreeGridModel`] with expandable rows.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::{Grid, GridCaption, Matrix, MatrixModel, MetricMode, ScrollableContent};
//! use horizon_grid_core::{Point, Size};
//!
//! let model = Arc::new(Matrix::new(100, 4));
//! model.put(0, 0, "first".into());
//!
//! let mut grid = Grid::new(model.clone())
//!     .with_metric_mode(MetricMode::Custom)
//!     .with_caption(GridCaption::default().with_titles(["A", "B", "C", "D"]));
//! grid.set_size(Size::new(200.0, 120.0));
//!
//! grid.set_content_origin(Point::new(0.0, -42.0));
//! let window = grid.visible_window().unwrap();
//! assert_eq!(window.first_row, 2);
//! ```

pub mod caption;
pub mod config;
pub mod cursor;
pub mod edit;
pub mod grid;
pub mod input;
pub mod metrics;
pub mod model;
pub mod paint;
pub mod projection;
pub mod provider;
pub mod scroll;
pub mod tree_grid;
pub mod visibility;

pub use caption::{CaptionResponse, GridCaption, ResizeState};
pub use config::{CaptionConfig, GridConfig, LineMask, TextMetrics};
pub use cursor::{RowCursor, SeekOp};
pub use edit::{ActiveEdit, CellEditor, EditSession, EditState, TextEditor};
pub use grid::{Grid, GridSignals};
pub use input::{Key, KeyEvent, KeyboardModifiers, MouseButton, PointerEvent, PointerKind};
pub use metrics::{GridLayout, GridMetrics, MetricMode, MetricsSource, SizeBuffer};
pub use model::{
    CellChange, CellValue, DimensionsChange, Matrix, MatrixModel, MatrixSignals, NodeId,
    NodeInfo, TreeGridModel, TreeSignals, WidgetHandle,
};
pub use paint::{PaintCommand, Painter, RecordingPainter};
pub use projection::{FlatRows, RowProjection};
pub use provider::{
    DefaultViewProvider, EditorProvider, SwatchView, TextEditorProvider, TextView, View,
    ViewProvider,
};
pub use scroll::{ScrollSignals, ScrollableContent, clamp_origin};
pub use tree_grid::{DefaultTreeDisplay, TreeDisplay, TreeGrid};
pub use visibility::{VisibilityTracker, VisibleWindow};
