//! Single-line position controller for the grid's row marker.

use horizon_grid_core::Signal;

/// A cursor movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOp {
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Tracks the selected row.
///
/// The grid tells the cursor how many lines exist and how many fit on a page;
/// the cursor clamps every movement to that range and emits `offset_changed`
/// with `(old, new)` whenever the position actually moves.
pub struct RowCursor {
    offset: Option<usize>,
    line_count: usize,
    page_size: usize,
    pub offset_changed: Signal<(Option<usize>, Option<usize>)>,
}

impl Default for RowCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl RowCursor {
    pub fn new() -> Self {
        Self {
            offset: None,
            line_count: 0,
            page_size: 1,
            offset_changed: Signal::new(),
        }
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Largest valid offset, or `None` when there are no lines.
    pub fn max_offset(&self) -> Option<usize> {
        self.line_count.checked_sub(1)
    }

    /// Update the number of lines, clamping the offset into range.
    pub fn set_line_count(&mut self, count: usize) {
        self.line_count = count;
        if let Some(offset) = self.offset {
            let clamped = self.max_offset().map(|max| offset.min(max));
            self.move_to(clamped);
        }
    }

    /// Lines moved by a page step. At least one.
    pub fn set_page_size(&mut self, lines: usize) {
        self.page_size = lines.max(1);
    }

    /// Move to `offset`, clamped. Returns `true` if the position changed.
    pub fn set_offset(&mut self, offset: Option<usize>) -> bool {
        let clamped = match (offset, self.max_offset()) {
            (Some(offset), Some(max)) => Some(offset.min(max)),
            _ => None,
        };
        self.move_to(clamped)
    }

    /// Apply a movement. With no current position any movement selects the
    /// first line. Returns `true` if the position changed.
    pub fn seek(&mut self, op: SeekOp) -> bool {
        let Some(max) = self.max_offset() else {
            return false;
        };
        let target = match (self.offset, op) {
            (_, SeekOp::Home) => 0,
            (_, SeekOp::End) => max,
            (None, _) => 0,
            (Some(cur), SeekOp::LineUp) => cur.saturating_sub(1),
            (Some(cur), SeekOp::LineDown) => (cur + 1).min(max),
            (Some(cur), SeekOp::PageUp) => cur.saturating_sub(self.page_size),
            (Some(cur), SeekOp::PageDown) => (cur + self.page_size).min(max),
        };
        self.move_to(Some(target))
    }

    pub fn seek_line_up(&mut self) -> bool {
        self.seek(SeekOp::LineUp)
    }

    pub fn seek_line_down(&mut self) -> bool {
        self.seek(SeekOp::LineDown)
    }

    pub fn seek_page_up(&mut self) -> bool {
        self.seek(SeekOp::PageUp)
    }

    pub fn seek_page_down(&mut self) -> bool {
        self.seek(SeekOp::PageDown)
    }

    pub fn seek_home(&mut self) -> bool {
        self.seek(SeekOp::Home)
    }

    pub fn seek_end(&mut self) -> bool {
        self.seek(SeekOp::End)
    }

    fn move_to(&mut self, offset: Option<usize>) -> bool {
        if offset == self.offset {
            return false;
        }
        let old = self.offset;
        self.offset = offset;
        self.offset_changed.emit((old, offset));
        true
    }
}

impl std::fmt::Debug for RowCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowCursor")
            .field("offset", &self.offset)
            .field("line_count", &self.line_count)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn setup() -> RowCursor {
        let mut cursor = RowCursor::new();
        cursor.set_line_count(10);
        cursor.set_page_size(4);
        cursor
    }

    #[test]
    fn test_seek() {
        let mut cursor = setup();
        assert!(cursor.seek(SeekOp::LineDown));
        assert_eq!(cursor.offset(), Some(0));
        cursor.seek(SeekOp::PageDown);
        assert_eq!(cursor.offset(), Some(4));
        cursor.seek(SeekOp::End);
        assert_eq!(cursor.offset(), Some(9));
        assert!(!cursor.seek(SeekOp::LineDown));
        cursor.seek(SeekOp::PageUp);
        assert_eq!(cursor.offset(), Some(5));
        assert!(cursor.seek_home());
        assert!(!cursor.seek_line_up());
    }

    #[test]
    fn test_shrinking_clamps() {
        let mut cursor = setup();
        cursor.set_offset(Some(8));
        cursor.set_line_count(3);
        assert_eq!(cursor.offset(), Some(2));
        cursor.set_line_count(0);
        assert_eq!(cursor.offset(), None);
        assert!(!cursor.seek(SeekOp::Home));
    }

    #[test]
    fn test_signal() {
        let mut cursor = setup();
        let moves = Arc::new(Mutex::new(Vec::new()));
        let log = moves.clone();
        cursor.offset_changed.connect(move |change| log.lock().push(*change));

        cursor.set_offset(Some(3));
        cursor.set_offset(Some(3));
        cursor.seek(SeekOp::LineUp);
        assert_eq!(*moves.lock(), vec![(None, Some(3)), (Some(3), Some(2))]);
    }
}
