//! The input stream a layout is computed from.

use std::sync::Arc;

use crate::font::FontMetrics;
use crate::layout::WrapShape;
use crate::style::Style;

/// A run of text with one style and optional SVG-style per-character
/// positioning.
///
/// The positioning arrays are indexed by character within `text`; a
/// `None` entry (or a missing one past the end) means "not set".
#[derive(Debug, Clone, PartialEq)]
pub struct TextSource {
    pub text: String,
    pub style: Arc<Style>,
    pub x: Vec<Option<f32>>,
    pub y: Vec<Option<f32>>,
    pub dx: Vec<Option<f32>>,
    pub dy: Vec<Option<f32>>,
    /// Rotation in degrees; the last value given keeps applying to the
    /// characters after it.
    pub rotate: Vec<Option<f32>>,
}

impl TextSource {
    pub fn new(text: impl Into<String>, style: Arc<Style>) -> Self {
        Self {
            text: text.into(),
            style,
            x: Vec::new(),
            y: Vec::new(),
            dx: Vec::new(),
            dy: Vec::new(),
            rotate: Vec::new(),
        }
    }

    pub fn with_x(mut self, x: impl IntoIterator<Item = f32>) -> Self {
        self.x = x.into_iter().map(Some).collect();
        self
    }

    pub fn with_y(mut self, y: impl IntoIterator<Item = f32>) -> Self {
        self.y = y.into_iter().map(Some).collect();
        self
    }

    pub fn with_dx(mut self, dx: impl IntoIterator<Item = f32>) -> Self {
        self.dx = dx.into_iter().map(Some).collect();
        self
    }

    pub fn with_dy(mut self, dy: impl IntoIterator<Item = f32>) -> Self {
        self.dy = dy.into_iter().map(Some).collect();
        self
    }

    pub fn with_rotate(mut self, rotate: impl IntoIterator<Item = f32>) -> Self {
        self.rotate = rotate.into_iter().map(Some).collect();
        self
    }

    pub(crate) fn attribute(values: &[Option<f32>], char_index: usize) -> Option<f32> {
        values.get(char_index).copied().flatten()
    }

    /// Rotation in effect at `char_index`, carrying the last given value.
    pub(crate) fn rotation_at(&self, char_index: usize) -> Option<f32> {
        if self.rotate.is_empty() {
            return None;
        }
        let last = char_index.min(self.rotate.len() - 1);
        self.rotate[..=last].iter().rev().find_map(|r| *r)
    }
}

/// Non-text items of the input stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCode {
    /// Continue the text in the next wrap shape.
    ShapeBreak,
    /// End the current paragraph.
    ParagraphBreak,
    /// A fixed-width gap with its own line box.
    ArbitraryGap { width: f32, ascent: f32, descent: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputItem {
    Text(TextSource),
    Control(ControlCode),
}

impl InputItem {
    pub fn as_text(&self) -> Option<&TextSource> {
        match self {
            InputItem::Text(source) => Some(source),
            InputItem::Control(_) => None,
        }
    }
}

/// How a `textLength` constraint is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthAdjust {
    /// Adjust the space between characters only.
    #[default]
    Spacing,
    /// Stretch glyphs along the inline axis as well.
    SpacingAndGlyphs,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLength {
    pub length: f32,
    pub adjust: LengthAdjust,
}

/// Everything one layout call consumes.
#[derive(Debug, Clone, Default)]
pub struct FlowInput {
    pub items: Vec<InputItem>,
    /// Regions to flow into, in order. Empty means unconstrained text.
    pub shapes: Vec<WrapShape>,
    /// Minimum line box for every line; derived from the first text
    /// source when unset.
    pub strut: Option<FontMetrics>,
    pub text_length: Option<TextLength>,
}

impl FlowInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_text(&mut self, source: TextSource) -> &mut Self {
        self.items.push(InputItem::Text(source));
        self
    }

    pub fn append_control(&mut self, code: ControlCode) -> &mut Self {
        self.items.push(InputItem::Control(code));
        self
    }

    pub fn append_wrap_shape(&mut self, shape: WrapShape) -> &mut Self {
        self.shapes.push(shape);
        self
    }

    pub fn set_strut(&mut self, strut: FontMetrics) -> &mut Self {
        self.strut = Some(strut);
        self
    }

    pub fn set_text_length(&mut self, length: f32, adjust: LengthAdjust) -> &mut Self {
        self.text_length = Some(TextLength { length, adjust });
        self
    }

    /// Style of the first text source, which sets paragraph-wide defaults.
    pub fn first_style(&self) -> Option<&Arc<Style>> {
        self.items.iter().find_map(|item| item.as_text().map(|s| &s.style))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_carries_forward() {
        let style = Arc::new(Style::default());
        let mut source = TextSource::new("abcd", style);
        source.rotate = vec![Some(10.0), None, Some(30.0)];
        assert_eq!(source.rotation_at(0), Some(10.0));
        assert_eq!(source.rotation_at(1), Some(10.0));
        assert_eq!(source.rotation_at(2), Some(30.0));
        assert_eq!(source.rotation_at(3), Some(30.0));
    }

    #[test]
    fn unset_attributes_read_as_none() {
        let style = Arc::new(Style::default());
        let source = TextSource::new("ab", style).with_x([5.0]);
        assert_eq!(TextSource::attribute(&source.x, 0), Some(5.0));
        assert_eq!(TextSource::attribute(&source.x, 1), None);
        assert_eq!(TextSource::attribute(&source.dy, 0), None);
    }

    #[test]
    fn first_style_skips_controls() {
        let mut input = FlowInput::new();
        input.append_control(ControlCode::ParagraphBreak);
        assert!(input.first_style().is_none());
        input.append_text(TextSource::new("a", Arc::new(Style::new("Serif", 9.0))));
        assert_eq!(input.first_style().unwrap().font_size, 9.0);
    }
}
