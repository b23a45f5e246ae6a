//! Fully resolved style records consumed by the layout.
//!
//! Cascade resolution happens elsewhere; by the time a [`Style`] reaches
//! the layout every value is absolute (font size in user units, spacing in
//! user units, line height as a multiplier or absolute length).

use crate::font::BaselineKind;

/// Inline base direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn is_rtl(self) -> bool {
        matches!(self, Direction::RightToLeft)
    }

    /// Direction of a UAX-9 embedding level.
    pub fn from_level(level: u8) -> Self {
        if level % 2 == 1 {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        }
    }
}

/// Axis along which lines stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WritingMode {
    /// Horizontal lines stacking top to bottom.
    #[default]
    HorizontalTb,
    /// Vertical lines stacking right to left.
    VerticalRl,
    /// Vertical lines stacking left to right.
    VerticalLr,
}

impl WritingMode {
    pub fn is_vertical(self) -> bool {
        !matches!(self, WritingMode::HorizontalTb)
    }
}

/// Glyph orientation in vertical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextOrientation {
    /// Upright for scripts that are natively vertical, sideways otherwise.
    #[default]
    Mixed,
    Upright,
    Sideways,
}

/// Requested alignment before it is resolved against the paragraph
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
    Justify,
}

/// Paragraph alignment after resolving start/end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
    Full,
}

impl TextAlign {
    pub fn resolve(self, direction: Direction) -> Alignment {
        match (self, direction) {
            (TextAlign::Start, Direction::LeftToRight) | (TextAlign::End, Direction::RightToLeft) => {
                Alignment::Left
            }
            (TextAlign::Start, Direction::RightToLeft) | (TextAlign::End, Direction::LeftToRight) => {
                Alignment::Right
            }
            (TextAlign::Left, _) => Alignment::Left,
            (TextAlign::Right, _) => Alignment::Right,
            (TextAlign::Center, _) => Alignment::Center,
            (TextAlign::Justify, _) => Alignment::Full,
        }
    }
}

/// CSS line-height, already resolved to a number.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LineHeight {
    /// Use the font's own ascent + descent.
    #[default]
    Normal,
    /// Multiple of the font size.
    Multiplier(f32),
    /// Absolute length in user units.
    Absolute(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BaselineShift {
    #[default]
    Baseline,
    Sub,
    Super,
    /// Upwards shift in user units.
    Length(f32),
}

impl BaselineShift {
    /// Upwards shift in user units for the given font size.
    pub fn resolve(self, font_size: f32) -> f32 {
        match self {
            BaselineShift::Baseline => 0.0,
            BaselineShift::Sub => -0.2 * font_size,
            BaselineShift::Super => 0.4 * font_size,
            BaselineShift::Length(len) => len,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// The resolved style of one text source.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Family names in fallback order.
    pub font_family: Vec<String>,
    pub font_weight: u16,
    pub font_style: FontStyle,
    pub font_size: f32,
    pub line_height: LineHeight,
    pub letter_spacing: f32,
    pub word_spacing: f32,
    pub text_align: TextAlign,
    /// Explicit base direction; `None` lets the bidi algorithm decide.
    pub direction: Option<Direction>,
    pub writing_mode: WritingMode,
    pub text_orientation: TextOrientation,
    pub dominant_baseline: BaselineKind,
    pub baseline_shift: BaselineShift,
    /// BCP-47 language tag, passed through to shaping.
    pub language: Option<String>,
    /// Stroke width when the text is stroked; only used for bounding boxes.
    pub stroke_width: Option<f32>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            font_family: vec!["sans-serif".to_string()],
            font_weight: 400,
            font_style: FontStyle::Normal,
            font_size: 12.0,
            line_height: LineHeight::Normal,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            text_align: TextAlign::Start,
            direction: None,
            writing_mode: WritingMode::HorizontalTb,
            text_orientation: TextOrientation::Mixed,
            dominant_baseline: BaselineKind::Alphabetic,
            baseline_shift: BaselineShift::Baseline,
            language: None,
            stroke_width: None,
        }
    }
}

impl Style {
    /// Convenience constructor for a single family at a given size.
    pub fn new(family: impl Into<String>, font_size: f32) -> Self {
        Self {
            font_family: vec![family.into()],
            font_size,
            ..Self::default()
        }
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.text_align = align;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_writing_mode(mut self, mode: WritingMode) -> Self {
        self.writing_mode = mode;
        self
    }

    pub fn with_line_height(mut self, line_height: LineHeight) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_spacing(mut self, letter_spacing: f32, word_spacing: f32) -> Self {
        self.letter_spacing = letter_spacing;
        self.word_spacing = word_spacing;
        self
    }

    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke_width = Some(width);
        self
    }
}
