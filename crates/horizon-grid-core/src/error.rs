//! Error types for Horizon Grid.

use thiserror::Error;

/// Errors raised by grid models and widgets.
///
/// Every variant describes a programming error in the caller: an access
/// outside the current matrix, or a structurally forbidden operation. Infallible
/// entry points (such as `MatrixModel::get`) panic with the error's message;
/// the `try_*` variants hand it back instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A cell read outside the matrix dimensions.
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} matrix")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A write to a column the model renders itself.
    #[error("column {col} is read-only for this model")]
    ReadOnlyColumn { col: usize },

    /// An attempt to replace a data source that is owned by its grid.
    #[error("the data source of this grid cannot be replaced")]
    DataSourceLocked,

    /// A node handle that no longer refers to a live node.
    #[error("unknown or removed tree node")]
    UnknownNode,
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GridError::OutOfBounds {
            row: 7,
            col: 1,
            rows: 5,
            cols: 3,
        };
        assert_eq!(err.to_string(), "cell (7, 1) is outside the 5x3 matrix");
        assert_eq!(
            GridError::ReadOnlyColumn { col: 0 }.to_string(),
            "column 0 is read-only for this model"
        );
    }
}
