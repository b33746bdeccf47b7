//! Cell values stored in grid models.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use horizon_grid_core::Color;

use crate::provider::View;

/// An opaque handle to a widget embedded in a cell.
///
/// The widget itself is owned by the embedding framework; the grid only needs
/// to measure and draw it, which it does through the [`View`] contract.
#[derive(Clone)]
pub struct WidgetHandle(Arc<dyn View>);

impl WidgetHandle {
    /// Wrap a drawable widget.
    pub fn new(view: Arc<dyn View>) -> Self {
        Self(view)
    }

    /// The widget as a view.
    pub fn view(&self) -> Arc<dyn View> {
        self.0.clone()
    }

    /// Whether two handles refer to the same widget.
    pub fn same_widget(&self, other: &WidgetHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for WidgetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WidgetHandle({:p})", Arc::as_ptr(&self.0))
    }
}

/// A type-erased value held by one cell.
///
/// Grid models store whatever the application puts in; view providers decide
/// how each variant is drawn.
#[derive(Clone, Default)]
pub enum CellValue {
    /// Empty cell.
    #[default]
    None,
    /// Text.
    Text(String),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Color swatch.
    Color(Color),
    /// An embedded widget.
    Widget(WidgetHandle),
    /// Application data the default providers do not understand.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl CellValue {
    /// Wrap arbitrary application data.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        CellValue::Custom(Arc::new(value))
    }

    /// Returns `true` for [`CellValue::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, CellValue::None)
    }

    /// Text slice, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Downcast custom data.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            CellValue::Custom(data) => data.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The text a plain label would show for this value.
    ///
    /// Returns `None` for values that have no textual form (empty cells,
    /// colors, widgets, custom data).
    pub fn display_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Int(n) => Some(n.to_string()),
            CellValue::Float(n) => Some(n.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::None, CellValue::None) => true,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => a == b,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Color(a), CellValue::Color(b)) => a == b,
            (CellValue::Widget(a), CellValue::Widget(b)) => a.same_widget(b),
            (CellValue::Custom(a), CellValue::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::None => write!(f, "None"),
            CellValue::Text(s) => write!(f, "Text({s:?})"),
            CellValue::Int(n) => write!(f, "Int({n})"),
            CellValue::Float(n) => write!(f, "Float({n})"),
            CellValue::Bool(b) => write!(f, "Bool({b})"),
            CellValue::Color(c) => write!(f, "Color({c:?})"),
            CellValue::Widget(w) => write!(f, "{w:?}"),
            CellValue::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&String> for CellValue {
    fn from(s: &String) -> Self {
        CellValue::Text(s.clone())
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Int(n as i64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Float(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<Color> for CellValue {
    fn from(c: Color) -> Self {
        CellValue::Color(c)
    }
}

impl From<WidgetHandle> for CellValue {
    fn from(w: WidgetHandle) -> Self {
        CellValue::Widget(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text() {
        assert_eq!(CellValue::from("abc").display_text().as_deref(), Some("abc"));
        assert_eq!(CellValue::from(42).display_text().as_deref(), Some("42"));
        assert_eq!(CellValue::from(true).display_text().as_deref(), Some("true"));
        assert_eq!(CellValue::None.display_text(), None);
        assert_eq!(CellValue::from(Color::WHITE).display_text(), None);
    }

    #[test]
    fn test_custom_equality_is_identity() {
        let a = CellValue::custom(vec![1u8, 2, 3]);
        let b = a.clone();
        let c = CellValue::custom(vec![1u8, 2, 3]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
    }
}
