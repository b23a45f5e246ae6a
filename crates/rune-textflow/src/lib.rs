//! rune-textflow: text flow and line breaking for Rune Draw.
//!
//! Styled text sources go in; positioned glyphs come out, grouped into
//! paragraphs, lines, chunks and spans.
//! - `font`: the font instance and provider traits, with a swash/fontdb
//!   backend and a synthetic fixed-advance font
//! - `unicode`, `bidi`, `shaping`: segmentation, embedding levels and
//!   harfrust shaping
//! - `layout`: scanline makers, the line breaker, output assembly, path
//!   fitting and queries over the result

pub mod bidi;
pub mod config;
pub mod error;
pub mod font;
pub mod input;
pub mod layout;
pub mod shaping;
pub mod style;
pub mod unicode;

pub use config::{ConfigError, FlowConfig, FontConfig, LayoutConfig};
pub use error::{LayoutError, Result};
pub use font::{
    BaselineKind, BaselineTable, FixedFont, FixedFontProvider, FontDbProvider, FontError,
    FontFace, FontInstance, FontMetrics, FontProvider,
};
pub use input::{ControlCode, FlowInput, InputItem, LengthAdjust, TextLength, TextSource};
pub use layout::{
    BlockProgression, CharRefs, Character, Chunk, CursorRect, FlowLayout, Glyph,
    GlyphOrientation, HitTestPolicy, HitTestResult, LayoutCursor, LayoutResult, Line, Paragraph,
    SourcePosition, Span, StartOffset, WrapShape, fit_to_path,
};
pub use style::{
    Alignment, BaselineShift, Direction, FontStyle, LineHeight, Style, TextAlign,
    TextOrientation, WritingMode,
};
