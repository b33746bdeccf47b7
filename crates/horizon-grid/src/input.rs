//! Pointer and keyboard events delivered to grids.
//!
//! Positions are in the receiving widget's local coordinates.

use horizon_grid_core::Point;

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyboardModifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyboardModifiers {
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    pub const CONTROL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }
}

/// What happened to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    /// Movement with a button held.
    Drag,
    Release,
    /// Movement with no button held.
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub button: MouseButton,
    pub pos: Point,
    /// 1 for a single click, 2 for a double click, and so on. Zero for
    /// movement.
    pub click_count: u32,
    pub modifiers: KeyboardModifiers,
}

impl PointerEvent {
    pub fn press(pos: Point, button: MouseButton, click_count: u32) -> Self {
        Self {
            kind: PointerKind::Press,
            button,
            pos,
            click_count,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    pub fn drag(pos: Point) -> Self {
        Self {
            kind: PointerKind::Drag,
            button: MouseButton::Left,
            pos,
            click_count: 0,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    pub fn release(pos: Point) -> Self {
        Self {
            kind: PointerKind::Release,
            button: MouseButton::Left,
            pos,
            click_count: 0,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    pub fn moved(pos: Point) -> Self {
        Self {
            kind: PointerKind::Move,
            button: MouseButton::Left,
            pos,
            click_count: 0,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: KeyboardModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// A primary-button press with at least two clicks.
    pub fn is_double_click(&self) -> bool {
        self.kind == PointerKind::Press
            && self.button == MouseButton::Left
            && self.click_count >= 2
    }

    /// The same event with its position shifted into another coordinate
    /// space.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            pos: Point::new(self.pos.x + dx, self.pos.y + dy),
            ..*self
        }
    }
}

/// Keys the grid and its editors react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Space,
    Plus,
    Minus,
    NumpadAdd,
    NumpadSubtract,
    F2,
    /// Any other key, identified by the character it produces.
    Character(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: KeyboardModifiers,
    /// Text produced by the key press, if any.
    pub text: String,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        let text = match key {
            Key::Character(c) => c.to_string(),
            Key::Space => " ".to_string(),
            Key::Plus | Key::NumpadAdd => "+".to_string(),
            Key::Minus | Key::NumpadSubtract => "-".to_string(),
            _ => String::new(),
        };
        Self {
            key,
            modifiers: KeyboardModifiers::NONE,
            text,
        }
    }

    pub fn with_modifiers(mut self, modifiers: KeyboardModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this key asks to abandon an in-progress operation.
    pub fn is_cancel(&self) -> bool {
        self.key == Key::Escape
    }

    /// Whether this key asks to expand a tree node.
    pub fn is_expand(&self) -> bool {
        matches!(self.key, Key::Plus | Key::NumpadAdd | Key::Character('+'))
    }

    /// Whether this key asks to collapse a tree node.
    pub fn is_collapse(&self) -> bool {
        matches!(
            self.key,
            Key::Minus | Key::NumpadSubtract | Key::Character('-')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_classification() {
        assert!(KeyEvent::new(Key::Escape).is_cancel());
        assert!(!KeyEvent::new(Key::Enter).is_cancel());
        assert!(KeyEvent::new(Key::NumpadAdd).is_expand());
        assert!(KeyEvent::new(Key::Character('-')).is_collapse());
        assert_eq!(KeyEvent::new(Key::Character('x')).text, "x");
    }

    #[test]
    fn test_double_click() {
        let pos = Point::new(1.0, 1.0);
        assert!(PointerEvent::press(pos, MouseButton::Left, 2).is_double_click());
        assert!(!PointerEvent::press(pos, MouseButton::Left, 1).is_double_click());
        assert!(!PointerEvent::press(pos, MouseButton::Right, 2).is_double_click());
    }
}
