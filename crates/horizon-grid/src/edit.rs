//! In-place cell editing.
//!
//! At most one editor exists per grid. [`EditSession`] holds it together with
//! the cell it edits; the grid drives the session through its lifecycle:
//!
//! ```text
//! Idle ──start──▶ Editing ──commit──▶ Idle   (value written to the model)
//!                    │
//!                    └──────cancel──▶ Idle   (value discarded)
//! ```

use std::any::Any;

use unicode_segmentation::UnicodeSegmentation;

use horizon_grid_core::{Color, Point, Rect};

use crate::config::TextMetrics;
use crate::input::{Key, KeyEvent};
use crate::model::CellValue;
use crate::paint::Painter;

/// A widget that edits one cell in place.
///
/// The grid positions the editor over the cell, gives it focus, forwards
/// keys to it and paints it above the cells.
pub trait CellEditor: Send {
    fn set_geometry(&mut self, rect: Rect);

    fn geometry(&self) -> Rect;

    fn request_focus(&mut self);

    fn has_focus(&self) -> bool;

    /// Handle a key. Returns `true` if consumed.
    fn handle_key(&mut self, _event: &KeyEvent) -> bool {
        false
    }

    fn paint(&self, painter: &mut dyn Painter);

    /// For providers to downcast editors they created.
    fn as_any(&self) -> &dyn Any;
}

/// A single-line text editor with the cursor at the end.
#[derive(Debug, Clone)]
pub struct TextEditor {
    text: String,
    original: CellValue,
    geometry: Rect,
    focused: bool,
    metrics: TextMetrics,
}

impl TextEditor {
    pub fn new(text: impl Into<String>, original: CellValue, metrics: TextMetrics) -> Self {
        Self {
            text: text.into(),
            original,
            geometry: Rect::ZERO,
            focused: false,
            metrics,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// The cell value the editor was opened with.
    pub fn original(&self) -> &CellValue {
        &self.original
    }
}

impl CellEditor for TextEditor {
    fn set_geometry(&mut self, rect: Rect) {
        self.geometry = rect;
    }

    fn geometry(&self) -> Rect {
        self.geometry
    }

    fn request_focus(&mut self) {
        self.focused = true;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn handle_key(&mut self, event: &KeyEvent) -> bool {
        match event.key {
            Key::Backspace => {
                if let Some((idx, _)) = self.text.grapheme_indices(true).next_back() {
                    self.text.truncate(idx);
                }
                true
            }
            Key::Enter | Key::Escape | Key::Tab => false,
            _ if !event.text.is_empty() && !event.modifiers.control => {
                self.text.push_str(&event.text);
                true
            }
            _ => false,
        }
    }

    fn paint(&self, painter: &mut dyn Painter) {
        painter.save();
        painter.clip_rect(self.geometry);
        painter.fill_rect(self.geometry, Color::WHITE);
        let y = self.geometry.top() + (self.geometry.height() - self.metrics.line_height) / 2.0;
        painter.draw_text(&self.text, Point::new(self.geometry.left(), y), Color::BLACK);
        painter.restore();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Where a grid is in its edit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Editing { row: usize, col: usize },
}

/// An editor attached to a cell.
pub struct ActiveEdit {
    row: usize,
    col: usize,
    editor: Box<dyn CellEditor>,
}

impl ActiveEdit {
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn editor(&self) -> &dyn CellEditor {
        self.editor.as_ref()
    }
}

/// Holds the grid's single active editor.
#[derive(Default)]
pub struct EditSession {
    active: Option<ActiveEdit>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        match &self.active {
            Some(edit) => EditState::Editing {
                row: edit.row,
                col: edit.col,
            },
            None => EditState::Idle,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.active.is_some()
    }

    /// The cell under edit.
    pub fn cell(&self) -> Option<(usize, usize)> {
        self.active.as_ref().map(|edit| (edit.row, edit.col))
    }

    pub fn is_editing_cell(&self, row: usize, col: usize) -> bool {
        self.cell() == Some((row, col))
    }

    pub fn editor(&self) -> Option<&dyn CellEditor> {
        self.active.as_ref().map(|edit| edit.editor.as_ref())
    }

    pub fn editor_mut(&mut self) -> Option<&mut dyn CellEditor> {
        match &mut self.active {
            Some(edit) => Some(edit.editor.as_mut()),
            None => None,
        }
    }

    /// Attach `editor` to `(row, col)`. The session must be idle; callers
    /// finish any previous edit first.
    pub fn begin(&mut self, row: usize, col: usize, editor: Box<dyn CellEditor>) {
        debug_assert!(self.active.is_none(), "a previous edit was not finished");
        self.active = Some(ActiveEdit { row, col, editor });
    }

    /// Detach and return the active edit, leaving the session idle.
    pub fn finish(&mut self) -> Option<ActiveEdit> {
        self.active.take()
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(text: &str) -> Box<dyn CellEditor> {
        Box::new(TextEditor::new(text, CellValue::from(text), TextMetrics::default()))
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = EditSession::new();
        assert_eq!(session.state(), EditState::Idle);

        session.begin(2, 1, editor("abc"));
        assert_eq!(session.state(), EditState::Editing { row: 2, col: 1 });
        assert!(session.is_editing_cell(2, 1));
        assert!(!session.is_editing_cell(2, 0));

        let edit = session.finish().unwrap();
        assert_eq!((edit.row(), edit.col()), (2, 1));
        assert!(!session.is_editing());
        assert!(session.finish().is_none());
    }

    #[test]
    fn test_text_editor_keys() {
        let mut editor = TextEditor::new("héllo", CellValue::None, TextMetrics::default());
        assert!(editor.handle_key(&KeyEvent::new(Key::Backspace)));
        assert_eq!(editor.text(), "héll");
        assert!(editor.handle_key(&KeyEvent::new(Key::Character('!'))));
        assert_eq!(editor.text(), "héll!");
        assert!(!editor.handle_key(&KeyEvent::new(Key::Escape)));
        assert!(!editor.handle_key(&KeyEvent::new(Key::ArrowUp)));
    }
}
