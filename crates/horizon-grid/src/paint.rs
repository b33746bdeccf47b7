//! The drawing surface the grid paints onto.
//!
//! The grid never talks to a GPU or window system. A host implements
//! [`Painter`] on top of its renderer and passes it to `Grid::paint`. All
//! coordinates are in the grid's local space.
//!
//! # State Stack
//!
//! [`save`](Painter::save) and [`restore`](Painter::restore) bracket clip
//! and translation changes. [`clip_rect`](Painter::clip_rect) intersects
//! with the current clip.
//!
//! [`RecordingPainter`] records every call and is what the tests paint into.

use horizon_grid_core::{Color, Point, Rect};

/// 2D drawing operations used by grids, captions, views and editors.
pub trait Painter {
    /// Push the current clip and translation onto the state stack.
    fn save(&mut self);

    /// Pop the state stack.
    fn restore(&mut self);

    /// Move the coordinate origin by `(dx, dy)` until the next `restore`.
    fn translate(&mut self, dx: f32, dy: f32);

    /// Intersect the current clip with `rect`.
    fn clip_rect(&mut self, rect: Rect);

    /// The current clip, or `None` when unclipped.
    fn clip_bounds(&self) -> Option<Rect>;

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32);

    /// Draw a line that inverts what is beneath it. Drawing the same line
    /// twice restores the original pixels.
    fn draw_xor_line(&mut self, from: Point, to: Point, color: Color);

    /// Draw a single run of text with its top-left corner at `origin`.
    fn draw_text(&mut self, text: &str, origin: Point, color: Color);
}

/// One recorded painter call.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    Save,
    Restore,
    Clip(Rect),
    FillRect {
        rect: Rect,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f32,
    },
    XorLine {
        from: Point,
        to: Point,
    },
    Text {
        text: String,
        origin: Point,
        color: Color,
        /// The clip in effect when the text was drawn.
        clip: Option<Rect>,
    },
}

#[derive(Debug, Clone, Copy, Default)]
struct PaintState {
    clip: Option<Rect>,
    offset: Point,
}

/// A [`Painter`] that records calls instead of drawing.
///
/// Recorded coordinates have the current translation applied, so they are
/// always in the space of the outermost caller.
#[derive(Debug, Default)]
pub struct RecordingPainter {
    commands: Vec<PaintCommand>,
    state: PaintState,
    stack: Vec<PaintState>,
}

impl RecordingPainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.state = PaintState::default();
        self.stack.clear();
    }

    fn map(&self, point: Point) -> Point {
        Point::new(point.x + self.state.offset.x, point.y + self.state.offset.y)
    }

    fn map_rect(&self, rect: Rect) -> Rect {
        rect.offset(self.state.offset.x, self.state.offset.y)
    }

    /// Text runs in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text runs whose drawing clip was non-empty, i.e. text that can end up
    /// on screen.
    pub fn visible_texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Text {
                    text,
                    clip: Some(clip),
                    ..
                } if !clip.is_empty() => Some(text.as_str()),
                PaintCommand::Text {
                    text, clip: None, ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The origin of the first text run equal to `text`.
    pub fn text_origin(&self, text: &str) -> Option<Point> {
        self.commands.iter().find_map(|c| match c {
            PaintCommand::Text {
                text: t, origin, ..
            } if t == text => Some(*origin),
            _ => None,
        })
    }

    /// Filled rectangles of the given color.
    pub fn fills_of(&self, color: Color) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::FillRect { rect, color: fill } if *fill == color => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn xor_lines(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::XorLine { .. }))
            .count()
    }

    /// Whether every `save` was matched by a `restore`.
    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Painter for RecordingPainter {
    fn save(&mut self) {
        self.stack.push(self.state);
        self.commands.push(PaintCommand::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        self.commands.push(PaintCommand::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.offset = Point::new(self.state.offset.x + dx, self.state.offset.y + dy);
    }

    fn clip_rect(&mut self, rect: Rect) {
        let rect = self.map_rect(rect);
        let clipped = match self.state.clip {
            Some(current) => current
                .intersect(&rect)
                .unwrap_or(Rect::new(rect.left(), rect.top(), 0.0, 0.0)),
            None => rect,
        };
        self.state.clip = Some(clipped);
        self.commands.push(PaintCommand::Clip(rect));
    }

    /// The clip in the current (translated) coordinate space.
    fn clip_bounds(&self) -> Option<Rect> {
        self.state
            .clip
            .map(|clip| clip.offset(-self.state.offset.x, -self.state.offset.y))
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let rect = self.map_rect(rect);
        self.commands.push(PaintCommand::FillRect { rect, color });
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color, width: f32) {
        let (from, to) = (self.map(from), self.map(to));
        self.commands.push(PaintCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn draw_xor_line(&mut self, from: Point, to: Point, _color: Color) {
        let (from, to) = (self.map(from), self.map(to));
        self.commands.push(PaintCommand::XorLine { from, to });
    }

    fn draw_text(&mut self, text: &str, origin: Point, color: Color) {
        self.commands.push(PaintCommand::Text {
            text: text.to_string(),
            origin: self.map(origin),
            color,
            clip: self.state.clip,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_stack() {
        let mut painter = RecordingPainter::new();
        painter.save();
        painter.clip_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        painter.save();
        painter.clip_rect(Rect::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(painter.clip_bounds(), Some(Rect::new(50.0, 50.0, 50.0, 50.0)));
        painter.restore();
        assert_eq!(painter.clip_bounds(), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        painter.restore();
        assert_eq!(painter.clip_bounds(), None);
        assert!(painter.is_balanced());
    }

    #[test]
    fn test_translate_applies_to_commands() {
        let mut painter = RecordingPainter::new();
        painter.save();
        painter.translate(10.0, 5.0);
        painter.clip_rect(Rect::new(0.0, 0.0, 20.0, 20.0));
        painter.draw_text("t", Point::new(1.0, 1.0), Color::BLACK);
        assert_eq!(painter.clip_bounds(), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
        painter.restore();

        assert_eq!(painter.text_origin("t"), Some(Point::new(11.0, 6.0)));
        painter.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        assert_eq!(painter.fills_of(Color::WHITE), vec![Rect::new(0.0, 0.0, 1.0, 1.0)]);
    }

    #[test]
    fn test_disjoint_clip_hides_text() {
        let mut painter = RecordingPainter::new();
        painter.clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        painter.clip_rect(Rect::new(20.0, 20.0, 10.0, 10.0));
        painter.draw_text("hidden", Point::new(20.0, 20.0), Color::BLACK);
        assert_eq!(painter.texts(), vec!["hidden"]);
        assert!(painter.visible_texts().is_empty());
    }
}
