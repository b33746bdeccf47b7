//! Logging facilities for Horizon Grid.
//!
//! Horizon Grid is instrumented with the `tracing` crate. Nothing is printed
//! unless the embedding application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_grid::visibility=trace")
//!     .init();
//! ```
//!
//! Each subsystem logs under a fixed target from [`targets`], so output can be
//! filtered per concern.

/// Target names for log filtering.
pub mod targets {
    /// Signal emission.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Matrix and tree model mutations.
    pub const MODEL: &str = "horizon_grid::model";
    /// Metric recomputation.
    pub const METRICS: &str = "horizon_grid::metrics";
    /// Visible window tracking.
    pub const VISIBILITY: &str = "horizon_grid::visibility";
    /// In-place edit sessions.
    pub const EDIT: &str = "horizon_grid::edit";
    /// Caption painting and column resize.
    pub const CAPTION: &str = "horizon_grid::caption";
    /// Tree-grid row projection.
    pub const TREE: &str = "horizon_grid::tree";
    /// Frame painting.
    pub const PAINT: &str = "horizon_grid::paint";
    /// Timing spans created by [`super::PerfSpan`].
    pub const PERF: &str = "horizon_grid::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Wrap an expensive pass (validation, painting) to see its duration in a
/// span-aware subscriber.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span for `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::debug_span!(target: targets::PERF, "perf", operation);
        Self {
            _span: span.entered(),
        }
    }
}

/// `tracing::trace!` under the grid target.
#[macro_export]
macro_rules! grid_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "horizon_grid", $($arg)*)
    };
}

/// `tracing::debug!` under the grid target.
#[macro_export]
macro_rules! grid_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "horizon_grid", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
        crate::grid_trace!(rows = 3, "inside span");
    }
}
