//! Core types for Horizon Grid.
//!
//! This crate holds the pieces the grid subsystem and its decorations share:
//!
//! - **Signals**: synchronous change notification ([`Signal`])
//! - **Geometry**: points, sizes, rectangles, insets, alignment and colors
//! - **Errors**: the [`GridError`] taxonomy
//! - **Logging**: `tracing` targets and timing spans
//!
//! # Example
//!
//! ```
//! use horizon_grid_core::{Insets, Rect, Signal};
//!
//! let cell = Rect::new(0.0, 0.0, 80.0, 24.0);
//! let content = cell.inset(Insets::uniform(2.0));
//! assert_eq!(content.width(), 76.0);
//!
//! let changed = Signal::<Rect>::new();
//! changed.connect(|rect| println!("repaint {rect:?}"));
//! changed.emit(content);
//! ```

mod error;
pub mod geometry;
pub mod logging;
pub mod signal;

pub use error::{GridError, GridResult};
pub use geometry::{
    Color, HorizontalAlignment, Insets, Point, Rect, Size, VerticalAlignment, align_within,
};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
