//! View and editor providers.
//!
//! A [`ViewProvider`] decides how a cell value is drawn: which [`View`] to
//! use, how to align it and which background to give the cell. An
//! [`EditorProvider`] decides whether and how a cell can be edited in place.
//!
//! Both are shared with `Arc` and may be swapped on a live grid.

use std::collections::HashMap;
use std::sync::Arc;

use horizon_grid_core::{Color, HorizontalAlignment, Point, Rect, Size, VerticalAlignment};

use crate::config::{GridConfig, TextMetrics};
use crate::edit::{CellEditor, TextEditor};
use crate::input::{MouseButton, PointerEvent, PointerKind};
use crate::model::CellValue;
use crate::paint::Painter;

// ============================================================================
// Views
// ============================================================================

/// A measurable, drawable cell renderer.
pub trait View: Send + Sync {
    /// Natural size of the content, without cell padding.
    fn preferred_size(&self) -> Size;

    /// Draw into `rect`. The painter is already clipped to the cell content.
    fn paint(&self, painter: &mut dyn Painter, rect: Rect);

    /// Stretch views fill the whole content box instead of being aligned.
    fn stretch(&self) -> bool {
        false
    }
}

/// A single- or multi-line text label.
#[derive(Debug, Clone)]
pub struct TextView {
    text: String,
    metrics: TextMetrics,
    color: Color,
}

impl TextView {
    pub fn new(text: impl Into<String>, metrics: TextMetrics) -> Self {
        Self {
            text: text.into(),
            metrics,
            color: Color::BLACK,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl View for TextView {
    fn preferred_size(&self) -> Size {
        self.metrics.measure(&self.text)
    }

    fn paint(&self, painter: &mut dyn Painter, rect: Rect) {
        for (i, line) in self.text.split('\n').enumerate() {
            let y = rect.top() + i as f32 * self.metrics.line_height;
            painter.draw_text(line, Point::new(rect.left(), y), self.color);
        }
    }
}

/// A filled color swatch.
#[derive(Debug, Clone, Copy)]
pub struct SwatchView {
    color: Color,
    size: Size,
}

impl SwatchView {
    pub fn new(color: Color, size: Size) -> Self {
        Self { color, size }
    }
}

impl View for SwatchView {
    fn preferred_size(&self) -> Size {
        self.size
    }

    fn paint(&self, painter: &mut dyn Painter, rect: Rect) {
        painter.fill_rect(rect, self.color);
    }
}

/// Supplies views, alignment and background per cell.
pub trait ViewProvider: Send + Sync {
    /// The view for `value` at `(row, col)`, or `None` to leave the cell
    /// empty.
    fn view(&self, row: usize, col: usize, value: &CellValue) -> Option<Arc<dyn View>>;

    fn x_alignment(&self, _row: usize, _col: usize) -> HorizontalAlignment {
        HorizontalAlignment::Left
    }

    fn y_alignment(&self, _row: usize, _col: usize) -> VerticalAlignment {
        VerticalAlignment::Center
    }

    /// Background fill for the cell, or `None` for none.
    fn cell_color(&self, _row: usize, _col: usize) -> Option<Color> {
        None
    }
}

/// The provider a grid uses until another is installed.
///
/// Text-like values become [`TextView`]s, colors become swatches and
/// embedded widgets draw themselves. Empty and custom values show nothing.
#[derive(Debug, Clone)]
pub struct DefaultViewProvider {
    metrics: TextMetrics,
    text_color: Color,
    swatch_size: Size,
    column_alignment: HashMap<usize, HorizontalAlignment>,
    alternate_row_color: Option<Color>,
}

impl Default for DefaultViewProvider {
    fn default() -> Self {
        Self::new(TextMetrics::default())
    }
}

impl DefaultViewProvider {
    pub fn new(metrics: TextMetrics) -> Self {
        Self {
            metrics,
            text_color: Color::BLACK,
            swatch_size: Size::new(metrics.line_height, metrics.line_height),
            column_alignment: HashMap::new(),
            alternate_row_color: None,
        }
    }

    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = color;
        self
    }

    pub fn with_column_alignment(mut self, col: usize, alignment: HorizontalAlignment) -> Self {
        self.column_alignment.insert(col, alignment);
        self
    }

    /// Fill every odd row with `color`.
    pub fn with_alternate_row_color(mut self, color: Color) -> Self {
        self.alternate_row_color = Some(color);
        self
    }
}

impl ViewProvider for DefaultViewProvider {
    fn view(&self, _row: usize, _col: usize, value: &CellValue) -> Option<Arc<dyn View>> {
        match value {
            CellValue::Color(color) => Some(Arc::new(SwatchView::new(*color, self.swatch_size))),
            CellValue::Widget(handle) => Some(handle.view()),
            other => other.display_text().map(|text| {
                Arc::new(TextView::new(text, self.metrics).with_color(self.text_color))
                    as Arc<dyn View>
            }),
        }
    }

    fn x_alignment(&self, _row: usize, col: usize) -> HorizontalAlignment {
        self.column_alignment.get(&col).copied().unwrap_or_default()
    }

    fn cell_color(&self, row: usize, _col: usize) -> Option<Color> {
        self.alternate_row_color.filter(|_| row % 2 == 1)
    }
}

// ============================================================================
// Editors
// ============================================================================

/// Supplies in-place editors and converts their contents back to values.
pub trait EditorProvider: Send + Sync {
    /// Create an editor for the cell, or `None` if the cell is not editable.
    fn editor(&self, row: usize, col: usize, value: &CellValue) -> Option<Box<dyn CellEditor>>;

    /// Read the edited value out of an editor this provider created.
    fn fetch_edited_value(&self, row: usize, col: usize, editor: &dyn CellEditor) -> CellValue;

    /// Whether `event` on `(row, col)` should start editing. Defaults to a
    /// primary-button double click.
    fn should_start_edit(&self, _row: usize, _col: usize, event: &PointerEvent) -> bool {
        event.is_double_click()
    }
}

/// Edits text-like cells with a [`TextEditor`].
///
/// The edited text is converted back to the kind of value the cell held:
/// integer cells stay integers when the text parses, and so on. Text that
/// does not parse becomes a text value.
#[derive(Debug, Clone)]
pub struct TextEditorProvider {
    metrics: TextMetrics,
    click_count: u32,
    read_only_columns: Vec<usize>,
}

impl Default for TextEditorProvider {
    fn default() -> Self {
        Self::new(TextMetrics::default())
    }
}

impl TextEditorProvider {
    pub fn new(metrics: TextMetrics) -> Self {
        Self {
            metrics,
            click_count: 2,
            read_only_columns: Vec::new(),
        }
    }

    /// Measurement and click count taken from a grid configuration.
    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.text_metrics).with_click_count(config.edit_click_count)
    }

    /// Primary-button clicks needed to start editing.
    pub fn with_click_count(mut self, clicks: u32) -> Self {
        self.click_count = clicks.max(1);
        self
    }

    pub fn with_read_only_column(mut self, col: usize) -> Self {
        self.read_only_columns.push(col);
        self
    }
}

impl EditorProvider for TextEditorProvider {
    fn editor(&self, _row: usize, col: usize, value: &CellValue) -> Option<Box<dyn CellEditor>> {
        if self.read_only_columns.contains(&col) {
            return None;
        }
        let text = match value {
            CellValue::None => String::new(),
            other => other.display_text()?,
        };
        Some(Box::new(TextEditor::new(text, value.clone(), self.metrics)))
    }

    fn fetch_edited_value(&self, _row: usize, _col: usize, editor: &dyn CellEditor) -> CellValue {
        let Some(editor) = editor.as_any().downcast_ref::<TextEditor>() else {
            return CellValue::None;
        };
        let text = editor.text();
        let parsed = match editor.original() {
            CellValue::Int(_) => text.trim().parse::<i64>().map(CellValue::Int).ok(),
            CellValue::Float(_) => text.trim().parse::<f64>().map(CellValue::Float).ok(),
            CellValue::Bool(_) => text.trim().parse::<bool>().map(CellValue::Bool).ok(),
            _ => None,
        };
        parsed.unwrap_or_else(|| CellValue::Text(text.to_string()))
    }

    fn should_start_edit(&self, _row: usize, _col: usize, event: &PointerEvent) -> bool {
        event.kind == PointerKind::Press
            && event.button == MouseButton::Left
            && event.click_count >= self.click_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, KeyEvent};

    #[test]
    fn test_default_views() {
        let provider = DefaultViewProvider::new(TextMetrics::new(10.0, 20.0));
        let view = provider.view(0, 0, &"hello".into()).unwrap();
        assert_eq!(view.preferred_size(), Size::new(50.0, 20.0));

        let swatch = provider.view(0, 0, &Color::WHITE.into()).unwrap();
        assert_eq!(swatch.preferred_size(), Size::new(20.0, 20.0));

        assert!(provider.view(0, 0, &CellValue::None).is_none());
        assert!(provider.view(0, 0, &CellValue::custom(3u8)).is_none());
    }

    #[test]
    fn test_alternate_rows() {
        let provider = DefaultViewProvider::default().with_alternate_row_color(Color::GRAY);
        assert_eq!(provider.cell_color(0, 0), None);
        assert_eq!(provider.cell_color(1, 0), Some(Color::GRAY));
    }

    #[test]
    fn test_fetch_keeps_value_kind() {
        let provider = TextEditorProvider::default();
        let mut editor = provider.editor(0, 1, &CellValue::Int(4)).unwrap();
        editor.handle_key(&KeyEvent::new(Key::Character('2')));
        assert_eq!(provider.fetch_edited_value(0, 1, editor.as_ref()), CellValue::Int(42));

        editor.handle_key(&KeyEvent::new(Key::Character('x')));
        assert_eq!(
            provider.fetch_edited_value(0, 1, editor.as_ref()),
            CellValue::Text("42x".into())
        );
    }

    #[test]
    fn test_click_count() {
        let pos = Point::new(0.0, 0.0);
        let single = PointerEvent::press(pos, MouseButton::Left, 1);
        let double = PointerEvent::press(pos, MouseButton::Left, 2);

        let provider = TextEditorProvider::default();
        assert!(!provider.should_start_edit(0, 0, &single));
        assert!(provider.should_start_edit(0, 0, &double));

        let config = GridConfig {
            edit_click_count: 1,
            ..GridConfig::default()
        };
        assert!(TextEditorProvider::from_config(&config).should_start_edit(0, 0, &single));
    }

    #[test]
    fn test_read_only_columns() {
        let provider = TextEditorProvider::default().with_read_only_column(0);
        assert!(provider.editor(3, 0, &"a".into()).is_none());
        assert!(provider.editor(3, 1, &"a".into()).is_some());
        assert!(provider.editor(3, 1, &Color::BLACK.into()).is_none());
    }
}
