//! Flowing text into lines: scanline makers, line breaking and the output
//! model, plus the queries and path fitting that operate on a finished
//! layout.

mod assembler;
pub mod calculator;
pub mod cursor;
pub(crate) mod itemizer;
pub mod output;
pub mod path_fit;
pub mod queries;
pub mod scanline;
pub mod shape;
pub(crate) mod spans;

pub use calculator::FlowLayout;
pub use cursor::{CursorRect, HitTestPolicy, HitTestResult, LayoutCursor};
pub use output::{
    CharRefs, Character, Chunk, Glyph, GlyphOrientation, LayoutResult, Line, Paragraph,
    SourcePosition, Span,
};
pub use path_fit::{StartOffset, fit_to_path};
pub use scanline::{InfiniteScanlineMaker, ScanRun, ScanlineMaker, ShapeScanlineMaker};
pub use shape::WrapShape;

use crate::style::WritingMode;

/// Direction lines stack in.
///
/// Layout works in line space, `(inline, block)`, and converts to
/// document coordinates at the end:
///
/// | progression    | document point      |
/// |----------------|---------------------|
/// | `TopToBottom`  | `(inline, block)`   |
/// | `RightToLeft`  | `(-block, inline)`  |
/// | `LeftToRight`  | `(block, inline)`   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockProgression {
    #[default]
    TopToBottom,
    RightToLeft,
    LeftToRight,
}

impl BlockProgression {
    pub fn from_writing_mode(mode: WritingMode) -> Self {
        match mode {
            WritingMode::HorizontalTb => BlockProgression::TopToBottom,
            WritingMode::VerticalRl => BlockProgression::RightToLeft,
            WritingMode::VerticalLr => BlockProgression::LeftToRight,
        }
    }

    pub fn is_vertical(self) -> bool {
        !matches!(self, BlockProgression::TopToBottom)
    }

    pub fn to_doc(self, inline: f32, block: f32) -> (f32, f32) {
        match self {
            BlockProgression::TopToBottom => (inline, block),
            BlockProgression::RightToLeft => (-block, inline),
            BlockProgression::LeftToRight => (block, inline),
        }
    }

    pub fn from_doc(self, x: f32, y: f32) -> (f32, f32) {
        match self {
            BlockProgression::TopToBottom => (x, y),
            BlockProgression::RightToLeft => (y, -x),
            BlockProgression::LeftToRight => (y, x),
        }
    }

    /// The inline component of a partially given document point.
    pub fn inline_of(self, x: Option<f32>, y: Option<f32>) -> Option<f32> {
        if self.is_vertical() { y } else { x }
    }

    /// The block component of a partially given document point.
    pub fn block_of(self, x: Option<f32>, y: Option<f32>) -> Option<f32> {
        match self {
            BlockProgression::TopToBottom => y,
            BlockProgression::RightToLeft => x.map(|x| -x),
            BlockProgression::LeftToRight => x,
        }
    }
}
