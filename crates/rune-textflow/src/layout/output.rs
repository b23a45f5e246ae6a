//! The computed layout: flat arrays of paragraphs, lines, chunks, spans,
//! characters and glyphs, each pointing at its parent by index.
//!
//! Inline positions (`left_x`, `x_start`, character `x`) and line baselines
//! are in line space; glyph `x`/`y` are in document space.

use std::sync::Arc;

use crate::font::{FontInstance, FontMetrics};
use crate::style::{Alignment, Direction};
use crate::unicode::CharAttributes;

use super::BlockProgression;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paragraph {
    pub base_direction: Direction,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub in_paragraph: usize,
    /// Block-axis position of the baseline (the central axis for vertical
    /// text).
    pub baseline_y: f32,
    pub line_height: FontMetrics,
    /// Index of the wrap shape the line sits in.
    pub in_shape: usize,
    /// Laid out past the last wrap shape; not meant to be drawn.
    pub hidden: bool,
}

impl Line {
    pub fn top(&self) -> f32 {
        self.baseline_y - self.line_height.ascent
    }

    pub fn bottom(&self) -> f32 {
        self.baseline_y + self.line_height.descent
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk {
    pub in_line: usize,
    /// Inline start of the text after alignment.
    pub left_x: f32,
    /// Start of the scan run (or the explicit position) the chunk was
    /// built in.
    pub x: f32,
    pub scanrun_width: f32,
    /// Width of the text, without trailing whitespace.
    pub text_width: f32,
    pub whitespace_count: u32,
    /// Extra width given to each whitespace character by justification.
    pub add_to_each_whitespace: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub in_chunk: usize,
    /// Index of the input item the span's text came from.
    pub in_input_stream_item: usize,
    /// Index into [`LayoutResult::fonts`]; `None` for gaps.
    pub font: Option<usize>,
    pub font_size: f32,
    pub line_height: FontMetrics,
    /// Upwards shift of the baseline in user units.
    pub baseline_shift: f32,
    pub direction: Direction,
    pub block_progression: BlockProgression,
    pub x_start: f32,
    pub x_end: f32,
    pub stroke_width: Option<f32>,
}

/// Where a character came from in the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    pub input_item: usize,
    /// Character index within the text source.
    pub char_index: usize,
    /// Byte offset within the text source.
    pub byte_offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Character {
    pub ch: char,
    pub in_span: usize,
    /// Inline offset of the character's left edge from the span's
    /// `x_start`.
    pub x: f32,
    /// Inline extent of the character, spacing included.
    pub width: f32,
    pub attributes: CharAttributes,
    /// First glyph of the character, if it produced any.
    pub in_glyph: Option<usize>,
    pub source: SourcePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlyphOrientation {
    #[default]
    Upright,
    /// Rotated a quarter turn clockwise in vertical text.
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub glyph_id: u32,
    pub in_character: usize,
    /// Document position of the glyph origin.
    pub x: f32,
    pub y: f32,
    /// Radians, clockwise.
    pub rotation: f32,
    /// Advance along the inline axis in user units.
    pub advance: f32,
    /// Inverse of the inline stretch applied by a length adjustment.
    pub vertical_scale: f32,
    pub orientation: GlyphOrientation,
    pub hidden: bool,
}

/// Indices of everything a character belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRefs {
    pub character: usize,
    pub span: usize,
    pub chunk: usize,
    pub line: usize,
    pub paragraph: usize,
    /// First glyph of the character, if it has one.
    pub glyph: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub paragraphs: Vec<Paragraph>,
    pub lines: Vec<Line>,
    pub chunks: Vec<Chunk>,
    pub spans: Vec<Span>,
    pub characters: Vec<Character>,
    pub glyphs: Vec<Glyph>,
    /// Some text did not fit the wrap shapes (or fell off the path).
    pub truncated: bool,
    /// Glyphs were moved onto a path after layout.
    pub path_fitted: bool,
    pub fonts: Vec<Arc<dyn FontInstance>>,
}

impl PartialEq for LayoutResult {
    fn eq(&self, other: &Self) -> bool {
        self.paragraphs == other.paragraphs
            && self.lines == other.lines
            && self.chunks == other.chunks
            && self.spans == other.spans
            && self.characters == other.characters
            && self.glyphs == other.glyphs
            && self.truncated == other.truncated
            && self.path_fitted == other.path_fitted
            && self.fonts.len() == other.fonts.len()
            && self
                .fonts
                .iter()
                .zip(&other.fonts)
                .all(|(a, b)| a.family() == b.family())
    }
}

impl LayoutResult {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.spans.is_empty()
    }

    pub fn char_refs(&self, character: usize) -> Option<CharRefs> {
        let c = self.characters.get(character)?;
        let span = c.in_span;
        let chunk = self.spans[span].in_chunk;
        let line = self.chunks[chunk].in_line;
        let paragraph = self.lines[line].in_paragraph;
        Some(CharRefs {
            character,
            span,
            chunk,
            line,
            paragraph,
            glyph: c.in_glyph,
        })
    }

    pub fn iter_chars(&self) -> impl Iterator<Item = CharRefs> + '_ {
        (0..self.characters.len()).filter_map(|i| self.char_refs(i))
    }

    /// The laid out characters as a string.
    pub fn text(&self) -> String {
        self.characters.iter().map(|c| c.ch).collect()
    }

    pub fn span_font(&self, span: usize) -> Option<&Arc<dyn FontInstance>> {
        self.spans.get(span)?.font.and_then(|f| self.fonts.get(f))
    }

    pub fn line_of_char(&self, character: usize) -> Option<usize> {
        self.char_refs(character).map(|r| r.line)
    }

    /// Range of characters on `line`.
    pub fn line_chars(&self, line: usize) -> std::ops::Range<usize> {
        let start = self
            .characters
            .iter()
            .position(|c| self.chunks[self.spans[c.in_span].in_chunk].in_line >= line)
            .unwrap_or(self.characters.len());
        let end = self.characters[start..]
            .iter()
            .position(|c| self.chunks[self.spans[c.in_span].in_chunk].in_line > line)
            .map_or(self.characters.len(), |n| start + n);
        start..end
    }

    /// Inline position of a character's left edge in line space.
    pub fn char_inline_x(&self, character: usize) -> Option<f32> {
        let c = self.characters.get(character)?;
        Some(self.spans[c.in_span].x_start + c.x)
    }

    /// Total text width over every chunk.
    pub(crate) fn total_text_width(&self) -> f32 {
        self.chunks.iter().map(|c| c.text_width).sum()
    }
}
