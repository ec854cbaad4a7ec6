//! Heuristic text measurement.
//!
//! No font files are loaded: every glyph is assumed to be half the font size
//! wide (slightly wider when bold). Heights are estimates good enough for
//! pagination, not pixel-exact.

/// Average glyph advance as a fraction of the font size.
pub const AVG_CHAR_WIDTH_FACTOR: f32 = 0.5;

/// Advance factor for bold runs.
pub const BOLD_CHAR_WIDTH_FACTOR: f32 = 0.55;

/// Font parameters for one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub font_size: f32,
    pub line_height: f32,
    pub bold: bool,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self::body()
    }
}

impl TextMetrics {
    pub fn new(font_size: f32, line_height: f32) -> Self {
        Self {
            font_size,
            line_height,
            bold: false,
        }
    }

    /// Body copy: 14px at 1.6 line height.
    pub fn body() -> Self {
        Self::new(14.0, 1.6)
    }

    pub fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn char_width(&self) -> f32 {
        let factor = if self.bold {
            BOLD_CHAR_WIDTH_FACTOR
        } else {
            AVG_CHAR_WIDTH_FACTOR
        };
        self.font_size * factor
    }

    /// Height of one rendered line in pixels.
    pub fn line_px(&self) -> f32 {
        self.font_size * self.line_height
    }

    /// How many glyphs fit on one line of `width` pixels. Never less than one.
    pub fn chars_per_line(&self, width: f32) -> usize {
        let cw = self.char_width();
        if cw <= 0.0 || width <= 0.0 {
            return 1;
        }
        ((width / cw).floor() as usize).max(1)
    }

    /// Approximate width of a single unwrapped run.
    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width()
    }

    /// Wrapped line count. Each `\n` starts a new paragraph; an empty
    /// paragraph still occupies one line.
    pub fn line_count(&self, text: &str, width: f32) -> usize {
        let per_line = self.chars_per_line(width);
        text.split('\n')
            .map(|line| line.chars().count().div_ceil(per_line).max(1))
            .sum()
    }

    /// Estimated block height of `text` wrapped to `width`. Empty text takes
    /// no space.
    pub fn text_height(&self, text: &str, width: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        self.line_count(text, width) as f32 * self.line_px()
    }
}

/// Body-text height estimate for `text` in a container `width` pixels wide.
pub fn estimate_text_height(text: &str, width: f32) -> f32 {
    TextMetrics::body().text_height(text, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chars_per_line_uses_half_font_size() {
        let m = TextMetrics::body();
        // 794 / 7 = 113.4
        assert_eq!(m.chars_per_line(794.0), 113);
        assert_eq!(m.chars_per_line(0.0), 1);
    }

    #[test]
    fn newlines_force_new_lines() {
        let m = TextMetrics::body();
        assert_eq!(m.line_count("a\nb\n\nc", 700.0), 4);
    }

    #[test]
    fn long_line_wraps() {
        let m = TextMetrics::new(10.0, 1.0);
        // 5px per glyph, 100px wide → 20 glyphs per line
        let text = "x".repeat(41);
        assert_eq!(m.line_count(&text, 100.0), 3);
        assert_eq!(m.text_height(&text, 100.0), 30.0);
    }

    #[test]
    fn empty_text_has_no_height() {
        assert_eq!(estimate_text_height("", 700.0), 0.0);
    }

    #[test]
    fn bold_is_wider() {
        let m = TextMetrics::body();
        assert!(m.bold().text_width("abc") > m.text_width("abc"));
    }
}
