//! Text shaping contract and the harfrust-backed shaper.

pub mod shaper;

use unicode_script::Script;

use crate::style::Direction;

pub use shaper::shape_with_harfrust;

/// Properties a run is shaped with.
#[derive(Debug, Clone, Copy)]
pub struct ShapeRequest<'a> {
    pub direction: Direction,
    pub script: Script,
    pub language: Option<&'a str>,
}

impl Default for ShapeRequest<'_> {
    fn default() -> Self {
        Self {
            direction: Direction::LeftToRight,
            script: Script::Latin,
            language: None,
        }
    }
}

/// One glyph as produced by a shaper, per em.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawGlyph {
    pub glyph_id: u32,
    /// Byte offset, within the shaped text, of the cluster this glyph
    /// belongs to.
    pub cluster: u32,
    pub x_advance: f32,
    pub y_advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}
