//! Unbroken spans: maximal runs of one item that share explicit
//! positioning, shaped once and then measured by the line breaker.

use std::ops::Range;
use std::sync::Arc;

use crate::error::{LayoutError, Result};
use crate::font::{FontInstance, FontMetrics};
use crate::input::{InputItem, TextSource};
use crate::shaping::ShapeRequest;
use crate::style::{Direction, Style, TextOrientation};
use crate::unicode::{is_nonspacing_mark, is_upright_in_vertical};

use super::BlockProgression;
use super::itemizer::{FontTable, ItemizedParagraph, Item, SourceRange};
use super::output::GlyphOrientation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpanGlyph {
    pub glyph_id: u32,
    /// Paragraph character the glyph's cluster starts at.
    pub char_index: usize,
    /// Inline advance in user units.
    pub advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub is_cluster_start: bool,
    pub orientation: GlyphOrientation,
}

#[derive(Debug, Clone)]
pub(crate) struct UnbrokenSpan {
    pub input_index: usize,
    /// Paragraph character range.
    pub chars: Range<usize>,
    /// Character and byte index of `chars.start` within its text source.
    pub source_char_start: usize,
    pub source_byte_start: usize,
    pub font: Option<usize>,
    pub style: Option<Arc<Style>>,
    pub font_size: f32,
    pub line_height: FontMetrics,
    pub baseline_shift: f32,
    pub direction: Direction,
    /// Logical order.
    pub glyphs: Vec<SpanGlyph>,
    /// Glyphs of each character; empty for characters inside a cluster.
    pub char_glyphs: Vec<Range<usize>>,
    /// Explicit document positions and offsets on the first character.
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub dx: Option<f32>,
    pub dy: Option<f32>,
    /// Degrees.
    pub rotate: Option<f32>,
    pub gap: Option<f32>,
}

impl UnbrokenSpan {
    /// Number of break positions the span covers; a gap counts as one.
    pub fn unit_len(&self) -> usize {
        if self.gap.is_some() { 1 } else { self.chars.len() }
    }

    pub fn letter_spacing(&self) -> f32 {
        self.style.as_ref().map_or(0.0, |s| s.letter_spacing)
    }

    pub fn word_spacing(&self) -> f32 {
        self.style.as_ref().map_or(0.0, |s| s.word_spacing)
    }

    /// Sum of the glyph advances of local character `i`.
    pub fn glyph_width(&self, i: usize) -> f32 {
        self.char_glyphs
            .get(i)
            .map_or(0.0, |r| self.glyphs[r.clone()].iter().map(|g| g.advance).sum())
    }

    pub fn explicit_inline(&self, progression: BlockProgression) -> Option<f32> {
        progression.inline_of(self.x, self.y)
    }

    pub fn explicit_block(&self, progression: BlockProgression) -> Option<f32> {
        progression.block_of(self.x, self.y)
    }
}

fn orientation_of(ch: char, style: &Style) -> GlyphOrientation {
    if !style.writing_mode.is_vertical() {
        return GlyphOrientation::Upright;
    }
    match style.text_orientation {
        TextOrientation::Upright => GlyphOrientation::Upright,
        TextOrientation::Sideways => GlyphOrientation::Sideways,
        TextOrientation::Mixed if is_upright_in_vertical(ch) => GlyphOrientation::Upright,
        TextOrientation::Mixed => GlyphOrientation::Sideways,
    }
}

/// Line box contributed by a span of `style` in `font`.
pub(super) fn span_line_height(font: Option<&dyn FontInstance>, style: &Style) -> FontMetrics {
    let size = style.font_size;
    let metrics = if style.writing_mode.is_vertical() {
        FontMetrics {
            ascent: size * 0.5,
            descent: size * 0.5,
            x_height: font.map_or(FontMetrics::TEMPLATE.x_height, |f| f.metrics().x_height) * size,
            em_size: size,
        }
    } else {
        font.map_or(FontMetrics::TEMPLATE, |f| f.metrics()).scaled(size)
    };
    metrics.with_line_height(style.line_height, size)
}

fn starts_new_span(source: &TextSource, k: usize) -> bool {
    let attr = |values: &[Option<f32>]| TextSource::attribute(values, k);
    k == 0
        || attr(&source.x).is_some()
        || attr(&source.y).is_some()
        || attr(&source.dx).is_some_and(|v| v != 0.0)
        || attr(&source.dy).is_some_and(|v| v != 0.0)
        || source.rotation_at(k) != source.rotation_at(k - 1)
}

/// Build and shape the unbroken spans of a paragraph.
pub(crate) fn build_spans(
    para: &ItemizedParagraph,
    items: &[InputItem],
    fonts: &FontTable,
) -> Result<Vec<UnbrokenSpan>> {
    let mut spans = Vec::new();
    for source_range in &para.sources {
        match (&items[source_range.input_index], source_range.gap) {
            (_, Some((width, ascent, descent))) => {
                spans.push(gap_span(para, source_range, width, ascent, descent));
            }
            (InputItem::Text(source), None) => {
                build_source_spans(para, source_range, source, fonts, &mut spans)?;
            }
            (InputItem::Control(_), None) => {}
        }
    }
    Ok(spans)
}

fn gap_span(
    para: &ItemizedParagraph,
    source: &SourceRange,
    width: f32,
    ascent: f32,
    descent: f32,
) -> UnbrokenSpan {
    UnbrokenSpan {
        input_index: source.input_index,
        chars: source.chars.clone(),
        source_char_start: 0,
        source_byte_start: 0,
        font: None,
        style: None,
        font_size: 0.0,
        line_height: FontMetrics {
            ascent,
            descent,
            x_height: 0.0,
            em_size: ascent + descent,
        },
        baseline_shift: 0.0,
        direction: para.direction,
        glyphs: Vec::new(),
        char_glyphs: Vec::new(),
        x: None,
        y: None,
        dx: None,
        dy: None,
        rotate: None,
        gap: Some(width),
    }
}

fn build_source_spans(
    para: &ItemizedParagraph,
    range: &SourceRange,
    source: &TextSource,
    fonts: &FontTable,
    spans: &mut Vec<UnbrokenSpan>,
) -> Result<()> {
    let style = &source.style;
    let template = |chars: Range<usize>, item: Option<&Item>, k: usize| {
        let font = item.and_then(|i| i.font);
        let font_ref = font.map(|f| fonts.get(f).as_ref());
        UnbrokenSpan {
            input_index: range.input_index,
            source_char_start: k,
            source_byte_start: para.char_offsets[chars.start] - para.char_offsets[range.chars.start],
            chars,
            font,
            style: Some(style.clone()),
            font_size: style.font_size,
            line_height: span_line_height(font_ref, style),
            baseline_shift: style.baseline_shift.resolve(style.font_size),
            direction: item.map_or(para.direction, Item::direction),
            glyphs: Vec::new(),
            char_glyphs: Vec::new(),
            x: TextSource::attribute(&source.x, k),
            y: TextSource::attribute(&source.y, k),
            dx: TextSource::attribute(&source.dx, k),
            dy: TextSource::attribute(&source.dy, k),
            rotate: source.rotation_at(k),
            gap: None,
        }
    };

    if range.chars.is_empty() {
        // Style-only span: contributes a line height and nothing else.
        let item = fonts.font_of(range.input_index).map(|font| Item {
            chars: range.chars.clone(),
            input_index: range.input_index,
            font: Some(font),
            level: u8::from(para.direction.is_rtl()),
            script: unicode_script::Script::Common,
        });
        spans.push(template(range.chars.clone(), item.as_ref(), 0));
        return Ok(());
    }

    let first_new = spans.len();
    for item in para
        .items
        .iter()
        .filter(|i| i.input_index == range.input_index)
    {
        if item.font.is_none() {
            continue;
        }
        for c in item.chars.clone() {
            let k = c - range.chars.start;
            let extend = !starts_new_span(source, k)
                && spans.len() > first_new
                && spans.last().is_some_and(|s: &UnbrokenSpan| s.chars.end == c && s.direction == item.direction())
                && item.chars.start != c;
            if extend {
                if let Some(span) = spans.last_mut() {
                    span.chars.end = c + 1;
                }
            } else {
                spans.push(template(c..c + 1, Some(item), k));
            }
        }
    }

    for (index, span) in spans[first_new..].iter_mut().enumerate() {
        let Some(font) = span.font else {
            continue;
        };
        let item = para
            .items
            .iter()
            .find(|i| i.input_index == range.input_index && i.chars.contains(&span.chars.start));
        shape_span(para, span, fonts.get(font).as_ref(), item, first_new + index)?;
    }
    Ok(())
}

fn shape_span(
    para: &ItemizedParagraph,
    span: &mut UnbrokenSpan,
    font: &dyn FontInstance,
    item: Option<&Item>,
    span_index: usize,
) -> Result<()> {
    let Some(style) = span.style.clone() else {
        return Ok(());
    };
    let bytes = para.byte_range(&span.chars);
    let text = &para.text[bytes.clone()];
    let request = ShapeRequest {
        direction: span.direction,
        script: item.map_or(unicode_script::Script::Common, |i| i.script),
        language: style.language.as_deref(),
    };
    let raw = font.shape(text, &request);
    let size = span.font_size;
    let vertical = style.writing_mode.is_vertical();

    let mut glyphs = Vec::with_capacity(raw.len());
    for (g, glyph) in raw.iter().enumerate() {
        let cluster = bytes.start + glyph.cluster as usize;
        if cluster >= bytes.end {
            return Err(LayoutError::GlyphOutOfSpan {
                glyph: g,
                span: span_index,
                character: para.char_offsets.partition_point(|&o| o < cluster),
            });
        }
        let Ok(char_index) = para.char_offsets.binary_search(&cluster) else {
            return Err(LayoutError::ClusterMismatch {
                cluster: glyph.cluster as usize,
                span_text: text.to_string(),
            });
        };
        let ch = para.chars[char_index];
        let orientation = orientation_of(ch, &style);
        let advance = if vertical && orientation == GlyphOrientation::Upright {
            if is_nonspacing_mark(ch) {
                0.0
            } else if font.has_vertical_metrics() {
                font.advance(glyph.glyph_id, true) * size
            } else {
                font.metrics().line_height() * size
            }
        } else {
            glyph.x_advance * size
        };
        glyphs.push(SpanGlyph {
            glyph_id: glyph.glyph_id,
            char_index,
            advance,
            x_offset: glyph.x_offset * size,
            y_offset: glyph.y_offset * size,
            is_cluster_start: false,
            orientation,
        });
    }

    // Shapers return right-to-left runs in visual order.
    if span.direction.is_rtl() {
        glyphs.reverse();
    }
    if !glyphs.is_sorted_by_key(|g| g.char_index) {
        glyphs.sort_by_key(|g| g.char_index);
    }
    for i in 0..glyphs.len() {
        glyphs[i].is_cluster_start = i == 0 || glyphs[i].char_index != glyphs[i - 1].char_index;
    }

    let mut char_glyphs = Vec::with_capacity(span.chars.len());
    let mut g = 0;
    for c in span.chars.clone() {
        let start = g;
        while g < glyphs.len() && glyphs[g].char_index == c {
            g += 1;
        }
        char_glyphs.push(start..g);
    }

    span.glyphs = glyphs;
    span.char_glyphs = char_glyphs;
    Ok(())
}
