//! The matrix data source contract and its in-memory implementation.

use parking_lot::RwLock;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{GridError, GridResult, Signal};

use super::value::CellValue;

/// A single cell changed.
#[derive(Debug, Clone, PartialEq)]
pub struct CellChange {
    pub row: usize,
    pub col: usize,
    /// The value the cell held before the change.
    pub previous: CellValue,
}

/// The matrix dimensions changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionsChange {
    pub old_rows: usize,
    pub old_cols: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Signals emitted by every matrix model.
///
/// Signals are emitted after the model has released its internal lock, so
/// listeners may read the model from inside a slot.
pub struct MatrixSignals {
    /// A cell value was replaced.
    pub cell_changed: Signal<CellChange>,
    /// Row or column count changed.
    pub dimensions_changed: Signal<DimensionsChange>,
    /// Rows were re-projected without the dimensions changing.
    pub layout_changed: Signal<()>,
}

impl Default for MatrixSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixSignals {
    pub fn new() -> Self {
        Self {
            cell_changed: Signal::new(),
            dimensions_changed: Signal::new(),
            layout_changed: Signal::new(),
        }
    }
}

/// A two-dimensional, resizable array of cell values with change
/// notification.
///
/// Reads outside the matrix are programming errors: [`get`](Self::get)
/// panics and [`try_get`](Self::try_get) returns [`GridError::OutOfBounds`].
/// Writes outside the matrix grow it to exactly `row + 1` rows and/or
/// `col + 1` columns, emit `dimensions_changed`, then store the value and
/// emit `cell_changed`.
pub trait MatrixModel: Send + Sync {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    /// Read a cell.
    fn try_get(&self, row: usize, col: usize) -> GridResult<CellValue>;

    /// Write a cell, growing the matrix if needed.
    fn try_put(&self, row: usize, col: usize, value: CellValue) -> GridResult<()>;

    fn signals(&self) -> &MatrixSignals;

    /// Read a cell, panicking on out-of-bounds access.
    fn get(&self, row: usize, col: usize) -> CellValue {
        match self.try_get(row, col) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Write a cell, panicking if the model refuses the write.
    fn put(&self, row: usize, col: usize, value: CellValue) {
        if let Err(err) = self.try_put(row, col, value) {
            panic!("{err}");
        }
    }
}

struct MatrixData {
    rows: usize,
    cols: usize,
    /// Row-major cell storage, always `rows * cols` long.
    cells: Vec<CellValue>,
}

impl MatrixData {
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Resize, keeping every cell that stays in range.
    fn resize(&mut self, rows: usize, cols: usize) {
        if rows == self.rows && cols == self.cols {
            return;
        }
        if cols == self.cols {
            self.cells.resize(rows * cols, CellValue::None);
        } else {
            let mut cells = Vec::with_capacity(rows * cols);
            for r in 0..rows {
                for c in 0..cols {
                    if r < self.rows && c < self.cols {
                        cells.push(std::mem::take(&mut self.cells[r * self.cols + c]));
                    } else {
                        cells.push(CellValue::None);
                    }
                }
            }
            self.cells = cells;
        }
        self.rows = rows;
        self.cols = cols;
    }
}

/// The standard in-memory [`MatrixModel`].
///
/// # Example
///
/// ```
/// use horizon_grid::model::{Matrix, MatrixModel};
///
/// let matrix = Matrix::new(2, 2);
/// matrix.put(4, 0, "grown".into());
/// assert_eq!(matrix.rows(), 5);
/// assert_eq!(matrix.get(4, 0).as_text(), Some("grown"));
/// ```
pub struct Matrix {
    data: RwLock<MatrixData>,
    signals: MatrixSignals,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Matrix {
    /// Create a matrix of empty cells.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: RwLock::new(MatrixData {
                rows,
                cols,
                cells: vec![CellValue::None; rows * cols],
            }),
            signals: MatrixSignals::new(),
        }
    }

    /// Create a matrix from rows of values.
    ///
    /// The column count is the length of the longest row; short rows are
    /// padded with empty cells.
    pub fn from_rows<R, V>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let rows: Vec<Vec<CellValue>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for mut row in rows.iter().cloned() {
            row.resize(cols, CellValue::None);
            cells.extend(row);
        }
        Self {
            data: RwLock::new(MatrixData {
                rows: rows.len(),
                cols,
                cells,
            }),
            signals: MatrixSignals::new(),
        }
    }

    /// Set both dimensions at once.
    pub fn set_dimensions(&self, rows: usize, cols: usize) {
        let change = {
            let mut data = self.data.write();
            let change = DimensionsChange {
                old_rows: data.rows,
                old_cols: data.cols,
                rows,
                cols,
            };
            data.resize(rows, cols);
            change
        };
        self.emit_dimensions(change);
    }

    pub fn set_rows(&self, rows: usize) {
        let cols = self.cols();
        self.set_dimensions(rows, cols);
    }

    pub fn set_cols(&self, cols: usize) {
        let rows = self.rows();
        self.set_dimensions(rows, cols);
    }

    /// Insert `count` empty rows before `at` (clamped to the row count).
    pub fn insert_rows(&self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        let change = {
            let mut data = self.data.write();
            let at = at.min(data.rows);
            let start = at * data.cols;
            let blank = std::iter::repeat_n(CellValue::None, count * data.cols);
            data.cells.splice(start..start, blank);
            let change = DimensionsChange {
                old_rows: data.rows,
                old_cols: data.cols,
                rows: data.rows + count,
                cols: data.cols,
            };
            data.rows += count;
            change
        };
        self.emit_dimensions(change);
    }

    /// Remove up to `count` rows starting at `at`.
    pub fn remove_rows(&self, at: usize, count: usize) {
        let change = {
            let mut data = self.data.write();
            if at >= data.rows || count == 0 {
                return;
            }
            let count = count.min(data.rows - at);
            let start = at * data.cols;
            let end = start + count * data.cols;
            data.cells.drain(start..end);
            let change = DimensionsChange {
                old_rows: data.rows,
                old_cols: data.cols,
                rows: data.rows - count,
                cols: data.cols,
            };
            data.rows -= count;
            change
        };
        self.emit_dimensions(change);
    }

    fn emit_dimensions(&self, change: DimensionsChange) {
        if change.old_rows == change.rows && change.old_cols == change.cols {
            return;
        }
        tracing::debug!(
            target: targets::MODEL,
            rows = change.rows,
            cols = change.cols,
            "matrix resized"
        );
        self.signals.dimensions_changed.emit(change);
    }
}

impl MatrixModel for Matrix {
    fn rows(&self) -> usize {
        self.data.read().rows
    }

    fn cols(&self) -> usize {
        self.data.read().cols
    }

    fn try_get(&self, row: usize, col: usize) -> GridResult<CellValue> {
        let data = self.data.read();
        if row >= data.rows || col >= data.cols {
            return Err(GridError::OutOfBounds {
                row,
                col,
                rows: data.rows,
                cols: data.cols,
            });
        }
        Ok(data.cells[data.index(row, col)].clone())
    }

    fn try_put(&self, row: usize, col: usize, value: CellValue) -> GridResult<()> {
        let (grown, previous) = {
            let mut data = self.data.write();
            let grown = if row >= data.rows || col >= data.cols {
                let change = DimensionsChange {
                    old_rows: data.rows,
                    old_cols: data.cols,
                    rows: data.rows.max(row + 1),
                    cols: data.cols.max(col + 1),
                };
                data.resize(change.rows, change.cols);
                Some(change)
            } else {
                None
            };
            let index = data.index(row, col);
            let previous = std::mem::replace(&mut data.cells[index], value);
            (grown, previous)
        };

        if let Some(change) = grown {
            self.emit_dimensions(change);
        }
        tracing::trace!(target: targets::MODEL, row, col, "cell changed");
        self.signals
            .cell_changed
            .emit(CellChange { row, col, previous });
        Ok(())
    }

    fn signals(&self) -> &MatrixSignals {
        &self.signals
    }
}

static_assertions::assert_impl_all!(Matrix: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn setup() -> Matrix {
        Matrix::from_rows([["a", "b", "c"], ["d", "e", "f"]])
    }

    #[test]
    fn test_from_rows() {
        let matrix = setup();
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.cols(), 3);
        assert_eq!(matrix.get(1, 2).as_text(), Some("f"));
    }

    #[test]
    fn test_try_get_out_of_bounds() {
        let matrix = setup();
        assert_eq!(
            matrix.try_get(2, 0),
            Err(GridError::OutOfBounds {
                row: 2,
                col: 0,
                rows: 2,
                cols: 3
            })
        );
    }

    #[test]
    #[should_panic(expected = "outside the 2x3 matrix")]
    fn test_get_out_of_bounds_panics() {
        setup().get(0, 3);
    }

    #[test]
    fn test_put_grows_to_exact_size() {
        let matrix = Matrix::new(2, 2);
        let events = Arc::new(Mutex::new(Vec::new()));

        let log = events.clone();
        matrix.signals().dimensions_changed.connect(move |change| {
            log.lock().push(format!("dims {}x{}", change.rows, change.cols));
        });
        let log = events.clone();
        matrix.signals().cell_changed.connect(move |change| {
            log.lock().push(format!("cell {},{}", change.row, change.col));
        });

        matrix.put(4, 3, 7.into());

        assert_eq!(matrix.rows(), 5);
        assert_eq!(matrix.cols(), 4);
        assert_eq!(matrix.get(4, 3), CellValue::Int(7));
        assert_eq!(*events.lock(), vec!["dims 5x4", "cell 4,3"]);
    }

    #[test]
    fn test_put_in_bounds_does_not_resize() {
        let matrix = setup();
        let resized = Arc::new(Mutex::new(0));
        let count = resized.clone();
        matrix
            .signals()
            .dimensions_changed
            .connect(move |_| *count.lock() += 1);

        matrix.put(0, 0, "z".into());
        assert_eq!(*resized.lock(), 0);
        assert_eq!(matrix.get(0, 0).as_text(), Some("z"));
    }

    #[test]
    fn test_resize_preserves_values() {
        let matrix = setup();
        matrix.set_cols(2);
        assert_eq!(matrix.get(1, 1).as_text(), Some("e"));
        matrix.set_cols(4);
        assert_eq!(matrix.get(1, 1).as_text(), Some("e"));
        assert!(matrix.get(1, 3).is_none());
        assert!(matrix.get(0, 2).is_none());
    }

    #[test]
    fn test_insert_and_remove_rows() {
        let matrix = setup();
        matrix.insert_rows(1, 2);
        assert_eq!(matrix.rows(), 4);
        assert_eq!(matrix.get(0, 0).as_text(), Some("a"));
        assert!(matrix.get(1, 0).is_none());
        assert_eq!(matrix.get(3, 0).as_text(), Some("d"));

        matrix.remove_rows(0, 3);
        assert_eq!(matrix.rows(), 1);
        assert_eq!(matrix.get(0, 1).as_text(), Some("e"));
    }

    #[test]
    fn test_listener_can_read_model() {
        let matrix = Arc::new(setup());
        let seen = Arc::new(Mutex::new(None));

        let reader = matrix.clone();
        let out = seen.clone();
        matrix.signals().cell_changed.connect(move |change| {
            *out.lock() = Some(reader.get(change.row, change.col));
        });

        matrix.put(1, 0, "x".into());
        assert_eq!(seen.lock().clone(), Some(CellValue::from("x")));
    }
}
