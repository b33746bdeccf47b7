//! Configuration for grids and captions.
//!
//! Every visual constant the grid uses lives here, so a host application can
//! build one [`GridConfig`] from its theme and hand it to each grid.

use unicode_segmentation::UnicodeSegmentation;

use horizon_grid_core::{Color, HorizontalAlignment, Insets, Size};

/// Fixed-pitch text measurement.
///
/// The grid does not shape text. Widths are the number of extended grapheme
/// clusters times `char_width`; heights are the number of lines times
/// `line_height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            line_height: 16.0,
        }
    }
}

impl TextMetrics {
    pub fn new(char_width: f32, line_height: f32) -> Self {
        Self {
            char_width,
            line_height,
        }
    }

    /// Measure possibly multi-line text.
    pub fn measure(&self, text: &str) -> Size {
        let mut lines = 0usize;
        let mut widest = 0usize;
        for line in text.split('\n') {
            lines += 1;
            widest = widest.max(line.graphemes(true).count());
        }
        Size::new(
            widest as f32 * self.char_width,
            lines as f32 * self.line_height,
        )
    }
}

/// Which separator lines the grid draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMask {
    pub horizontal: bool,
    pub vertical: bool,
}

impl LineMask {
    pub const BOTH: Self = Self {
        horizontal: true,
        vertical: true,
    };
    pub const NONE: Self = Self {
        horizontal: false,
        vertical: false,
    };
    pub const HORIZONTAL: Self = Self {
        horizontal: true,
        vertical: false,
    };
    pub const VERTICAL: Self = Self {
        horizontal: false,
        vertical: true,
    };
}

impl Default for LineMask {
    fn default() -> Self {
        Self::BOTH
    }
}

/// Grid appearance and metric defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Padding between a cell's box and its content.
    pub cell_insets: Insets,
    /// Thickness of separator lines. Lines occupy space even when masked out.
    pub line_size: f32,
    pub line_color: Color,
    pub line_mask: LineMask,
    /// Widget background, painted before anything else.
    pub background: Option<Color>,
    /// Row marker color while the grid has focus.
    pub selection_color: Color,
    /// Row marker color while the grid does not have focus.
    pub unfocused_selection_color: Color,
    /// Height given to rows in custom-metric mode until set explicitly.
    pub default_row_height: f32,
    /// Width given to columns in custom-metric mode until set explicitly.
    pub default_col_width: f32,
    /// Lower bound for interactively resized columns.
    pub min_col_width: f32,
    /// Clicks that start an edit with the default editor provider.
    pub edit_click_count: u32,
    /// Measurement used by the default text views and editors.
    pub text_metrics: TextMetrics,
    pub text_color: Color,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_insets: Insets::new(1.0, 2.0, 1.0, 2.0),
            line_size: 1.0,
            line_color: Color::LIGHT_GRAY,
            line_mask: LineMask::BOTH,
            background: Some(Color::WHITE),
            selection_color: Color::from_rgb8(51, 153, 255).with_alpha(0.35),
            unfocused_selection_color: Color::from_rgb8(200, 200, 200).with_alpha(0.5),
            default_row_height: 20.0,
            default_col_width: 80.0,
            min_col_width: 10.0,
            edit_click_count: 2,
            text_metrics: TextMetrics::default(),
            text_color: Color::BLACK,
        }
    }
}

impl GridConfig {
    pub fn with_cell_insets(mut self, insets: Insets) -> Self {
        self.cell_insets = insets;
        self
    }

    pub fn with_line_size(mut self, size: f32) -> Self {
        self.line_size = size.max(0.0);
        self
    }

    pub fn with_line_mask(mut self, mask: LineMask) -> Self {
        self.line_mask = mask;
        self
    }

    pub fn with_default_sizes(mut self, row_height: f32, col_width: f32) -> Self {
        self.default_row_height = row_height;
        self.default_col_width = col_width;
        self
    }

    pub fn with_text_metrics(mut self, metrics: TextMetrics) -> Self {
        self.text_metrics = metrics;
        self
    }

    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = background;
        self
    }
}

/// Caption (column header) appearance and resize behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionConfig {
    /// Padding around each title.
    pub title_insets: Insets,
    pub title_alignment: HorizontalAlignment,
    pub background: Color,
    pub border_color: Color,
    pub text_color: Color,
    /// Half-width of the band around a column's right edge that arms a
    /// resize.
    pub resize_tolerance: f32,
    pub tracking_line_color: Color,
    /// Height used when no title is set.
    pub min_height: f32,
    pub text_metrics: TextMetrics,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            title_insets: Insets::new(2.0, 4.0, 2.0, 4.0),
            title_alignment: HorizontalAlignment::Center,
            background: Color::from_rgb8(240, 240, 240),
            border_color: Color::GRAY,
            text_color: Color::BLACK,
            resize_tolerance: 3.0,
            tracking_line_color: Color::BLACK,
            min_height: 20.0,
            text_metrics: TextMetrics::default(),
        }
    }
}

impl CaptionConfig {
    pub fn with_title_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.title_alignment = alignment;
        self
    }

    pub fn with_resize_tolerance(mut self, tolerance: f32) -> Self {
        self.resize_tolerance = tolerance.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_counts_graphemes() {
        let metrics = TextMetrics::new(10.0, 20.0);
        assert_eq!(metrics.measure("abc"), Size::new(30.0, 20.0));
        // "e" + combining acute accent is one cluster.
        assert_eq!(metrics.measure("e\u{301}"), Size::new(10.0, 20.0));
        assert_eq!(metrics.measure("ab\nlonger"), Size::new(60.0, 40.0));
        assert_eq!(metrics.measure(""), Size::new(0.0, 20.0));
    }
}
