//! Turns broken lines into output records: alignment and justification,
//! bidi placement of spans inside a chunk, and glyph positions for both
//! horizontal and vertical text.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use crate::font::{BaselineKind, FontInstance};
use crate::style::Alignment;
use crate::unicode::is_nonspacing_mark;

use super::calculator::{BreakKind, BrokenSpan, Calculator, ChunkLayout, LineLayout};
use super::itemizer::ItemizedParagraph;
use super::output::{Character, Chunk, Glyph, GlyphOrientation, Line, SourcePosition, Span};
use super::spans::{SpanGlyph, UnbrokenSpan};

const SOFT_HYPHEN: char = '\u{ad}';

/// Inline start of a chunk's text.
fn aligned_left(alignment: Alignment, chunk: &ChunkLayout, constrained: bool) -> f32 {
    let slack = chunk.scanrun_width - chunk.text_width;
    match alignment {
        Alignment::Left | Alignment::Full => chunk.x,
        Alignment::Right if constrained => chunk.x + slack,
        Alignment::Right => chunk.x - chunk.text_width,
        Alignment::Center if constrained => chunk.x + slack * 0.5,
        Alignment::Center => chunk.x - chunk.text_width * 0.5,
    }
}

/// Place broken spans along the inline axis. Runs against the paragraph
/// direction are measured as a whole and laid out backwards within their
/// slot.
fn place_spans(
    chunk: &ChunkLayout,
    spans: &[UnbrokenSpan],
    widths: &[f32],
    left_x: f32,
    visible_width: f32,
    paragraph_rtl: bool,
) -> Vec<(f32, f32)> {
    let n = chunk.spans.len();
    let direction = |j: usize| spans[chunk.spans[j].span].direction.is_rtl();
    let mut placed = vec![(0.0, 0.0); n];
    let mut cur = if paragraph_rtl { left_x + visible_width } else { left_x };
    let mut j = 0;
    while j < n {
        if direction(j) == paragraph_rtl {
            placed[j] = if paragraph_rtl {
                (cur - widths[j], cur)
            } else {
                (cur, cur + widths[j])
            };
            cur += if paragraph_rtl { -widths[j] } else { widths[j] };
            j += 1;
            continue;
        }
        let mut r = j;
        let mut total = 0.0;
        while r < n && direction(r) != paragraph_rtl {
            total += widths[r];
            r += 1;
        }
        if paragraph_rtl {
            let mut x = cur - total;
            for q in j..r {
                placed[q] = (x, x + widths[q]);
                x += widths[q];
            }
            cur -= total;
        } else {
            let mut x = cur + total;
            for q in j..r {
                placed[q] = (x - widths[q], x);
                x -= widths[q];
            }
            cur += total;
        }
        j = r;
    }
    placed
}

impl Calculator<'_> {
    pub(super) fn output_line(
        &mut self,
        para: &ItemizedParagraph,
        para_index: usize,
        spans: &[UnbrokenSpan],
        line: &LineLayout,
        baseline: f32,
    ) {
        let line_index = self.result.lines.len();
        self.result.lines.push(Line {
            in_paragraph: para_index,
            baseline_y: baseline,
            line_height: line.line_height,
            in_shape: self.current_shape,
            hidden: self.hidden,
        });
        tracing::trace!(line = line_index, baseline, chunks = line.chunks.len(), "output line");

        let constrained = self.maker.is_constrained();
        let ends_paragraph = matches!(
            line.kind,
            BreakKind::EndOfParagraph | BreakKind::Mandatory | BreakKind::RowBreak
        );
        let last = line.chunks.len().saturating_sub(1);
        for (n, chunk) in line.chunks.iter().enumerate() {
            let justify = para.alignment == Alignment::Full
                && constrained
                && chunk.whitespace_count > 0
                && chunk.scanrun_width.is_finite()
                && !(n == last && ends_paragraph);
            let add = if justify {
                ((chunk.scanrun_width - chunk.text_width) / chunk.whitespace_count as f32).max(0.0)
            } else {
                0.0
            };
            let left_x = aligned_left(para.alignment, chunk, constrained);
            let chunk_index = self.result.chunks.len();
            self.result.chunks.push(Chunk {
                in_line: line_index,
                left_x,
                x: chunk.x,
                scanrun_width: chunk.scanrun_width,
                text_width: chunk.text_width,
                whitespace_count: chunk.whitespace_count,
                add_to_each_whitespace: add,
            });

            let mut widths: Vec<f32> = chunk
                .spans
                .iter()
                .map(|b| b.width + add * b.whitespace_count as f32)
                .collect();
            if line.hyphenated && n == last {
                if let (Some(w), Some(b)) = (widths.last_mut(), chunk.spans.last()) {
                    *w += self.hyphen_width(&spans[b.span]);
                }
            }
            let visible = chunk.text_width + add * chunk.whitespace_count as f32;
            let placed = place_spans(chunk, spans, &widths, left_x, visible, para.direction.is_rtl());
            let last_span = chunk.spans.len().saturating_sub(1);
            for (j, broken) in chunk.spans.iter().enumerate() {
                let hyphen_at = (line.hyphenated && n == last && j == last_span).then_some(broken.end - 1);
                let (x_start, x_end) = placed[j];
                self.output_span(para, spans, broken, chunk_index, x_start, x_end, add, baseline, hyphen_at);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn output_span(
        &mut self,
        para: &ItemizedParagraph,
        spans: &[UnbrokenSpan],
        broken: &BrokenSpan,
        chunk_index: usize,
        x_start: f32,
        x_end: f32,
        add: f32,
        baseline: f32,
        hyphen_at: Option<usize>,
    ) {
        let span = &spans[broken.span];
        let scale = self.adjust.glyph_scale;
        let span_index = self.result.spans.len();
        self.result.spans.push(Span {
            in_chunk: chunk_index,
            in_input_stream_item: span.input_index,
            font: span.font,
            font_size: span.font_size * scale,
            line_height: span.line_height,
            baseline_shift: span.baseline_shift,
            direction: span.direction,
            block_progression: self.progression,
            x_start,
            x_end,
            stroke_width: span.style.as_ref().and_then(|s| s.stroke_width),
        });
        if span.gap.is_some() {
            return;
        }
        let (Some(font_index), Some(style)) = (span.font, span.style.as_ref()) else {
            return;
        };
        let font: Arc<dyn FontInstance> = self.fonts.get(font_index).clone();
        if broken.start == 0 {
            self.y_offset += self.progression.block_of(span.dx, span.dy).unwrap_or(0.0);
        }

        // Visual pass: left edge, width and glyph origin of every character.
        let count = broken.end - broken.start;
        let rtl = span.direction.is_rtl();
        let mut placed = vec![(0.0_f32, 0.0_f32, 0.0_f32); count];
        let mut pen = x_start;
        for step in 0..count {
            let local = if rtl { broken.end - 1 - step } else { broken.start + step };
            let unit = self.unit_width(para, span, local);
            let extra = if unit.is_expandable { add } else { 0.0 };
            let hyphen = if Some(local) == hyphen_at { self.hyphen_width(span) } else { 0.0 };
            let width = unit.total + extra + hyphen;
            let glyph_start = if rtl { pen + unit.spacing + extra } else { pen + unit.lead };
            placed[local - broken.start] = (pen - x_start, width, glyph_start);
            pen += width;
        }

        let dominant = if self.progression.is_vertical() {
            BaselineKind::Central
        } else {
            style.dominant_baseline
        };
        let baseline_offset = font.baseline_table().get(dominant) * span.font_size;
        let block = baseline + self.y_offset;
        let rotation = span.rotate.map_or(0.0, f32::to_radians);

        // Logical pass: emit characters and their glyphs.
        for local in broken.start..broken.end {
            let c = span.chars.start + local;
            let ch = para.chars[c];
            let (x, width, glyph_start) = placed[local - broken.start];
            let char_index = self.result.characters.len();
            let mut first_glyph = None;

            if ch == SOFT_HYPHEN {
                if Some(local) == hyphen_at {
                    if let Some(glyph_id) = font.glyph_index('-') {
                        first_glyph = Some(self.result.glyphs.len());
                        let hyphen = SpanGlyph {
                            glyph_id,
                            char_index: c,
                            advance: font.advance(glyph_id, false) * span.font_size,
                            x_offset: 0.0,
                            y_offset: 0.0,
                            is_cluster_start: true,
                            orientation: GlyphOrientation::Upright,
                        };
                        let (gx, gy, extra) =
                            self.glyph_origin(span, font.as_ref(), &hyphen, ch, glyph_start, block, baseline_offset, None);
                        self.push_glyph(&hyphen, char_index, gx, gy, rotation + extra);
                    }
                }
            } else if !ch.is_control() {
                let range = span.char_glyphs[local].clone();
                let mut inline = vec![0.0; range.len()];
                let mut cluster_pen = glyph_start;
                let order: Vec<usize> = if rtl {
                    range.clone().rev().collect()
                } else {
                    range.clone().collect()
                };
                for gi in order {
                    inline[gi - range.start] = cluster_pen;
                    cluster_pen += span.glyphs[gi].advance * scale;
                }
                let mut base: Option<(f32, f32)> = None;
                for gi in range.clone() {
                    let glyph = &span.glyphs[gi];
                    let (gx, gy, extra) = self.glyph_origin(
                        span,
                        font.as_ref(),
                        glyph,
                        ch,
                        inline[gi - range.start],
                        block,
                        baseline_offset,
                        base,
                    );
                    if base.is_none() {
                        base = Some((gx, gy));
                    }
                    first_glyph.get_or_insert(self.result.glyphs.len());
                    self.push_glyph(glyph, char_index, gx, gy, rotation + extra);
                }
            }

            self.result.characters.push(Character {
                ch,
                in_span: span_index,
                x,
                width,
                attributes: para.attributes[c],
                in_glyph: first_glyph,
                source: SourcePosition {
                    input_item: span.input_index,
                    char_index: span.source_char_start + local,
                    byte_offset: span.source_byte_start
                        + (para.char_offsets[c] - para.char_offsets[span.chars.start]),
                },
            });
        }
    }

    fn push_glyph(&mut self, glyph: &SpanGlyph, character: usize, x: f32, y: f32, rotation: f32) {
        let scale = self.adjust.glyph_scale;
        self.result.glyphs.push(Glyph {
            glyph_id: glyph.glyph_id,
            in_character: character,
            x,
            y,
            rotation,
            advance: glyph.advance * scale,
            vertical_scale: 1.0 / scale,
            orientation: glyph.orientation,
            hidden: self.hidden,
        });
    }

    /// Document position and extra rotation of a glyph whose inline origin
    /// is `inline` on a line with its baseline (or central axis) at
    /// `block`.
    #[allow(clippy::too_many_arguments)]
    fn glyph_origin(
        &self,
        span: &UnbrokenSpan,
        font: &dyn FontInstance,
        glyph: &SpanGlyph,
        ch: char,
        inline: f32,
        block: f32,
        baseline_offset: f32,
        cluster_base: Option<(f32, f32)>,
    ) -> (f32, f32, f32) {
        let scale = self.adjust.glyph_scale;
        let size = span.font_size;
        if !self.progression.is_vertical() {
            let (x, y) = self.progression.to_doc(inline + glyph.x_offset * scale, block);
            return (x, y + baseline_offset - span.baseline_shift + glyph.y_offset, 0.0);
        }

        let (axis_x, pen_y) = self.progression.to_doc(inline, block);
        match glyph.orientation {
            GlyphOrientation::Sideways => (
                axis_x - baseline_offset + span.baseline_shift - glyph.y_offset,
                pen_y + glyph.x_offset * scale,
                FRAC_PI_2,
            ),
            GlyphOrientation::Upright => {
                if let Some(base) = cluster_base.filter(|_| is_nonspacing_mark(ch) || glyph.advance == 0.0) {
                    return (base.0, base.1, 0.0);
                }
                let bounds = (!font.has_vertical_metrics())
                    .then(|| font.glyph_bounds(glyph.glyph_id))
                    .flatten();
                match bounds {
                    Some(b) => (
                        axis_x - (b.min.x + b.max.x) * 0.5 * size + span.baseline_shift,
                        pen_y + (glyph.advance * scale - (b.max.y - b.min.y) * size) * 0.5
                            - b.min.y * size,
                        0.0,
                    ),
                    None => (
                        axis_x - font.advance(glyph.glyph_id, false) * size * 0.5 + span.baseline_shift,
                        pen_y + font.metrics().ascent * size,
                        0.0,
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::font::FixedFontProvider;
    use crate::input::{FlowInput, TextSource};
    use crate::layout::{FlowLayout, WrapShape};
    use crate::style::{Direction, Style, TextAlign, WritingMode};

    fn styled(text: &str, style: Style, width: Option<f32>) -> FlowInput {
        let mut input = FlowInput::new();
        input.append_text(TextSource::new(text, Arc::new(style)));
        if let Some(width) = width {
            input.append_wrap_shape(WrapShape::rect(0.0, 0.0, width, 100.0));
        }
        input
    }

    #[test]
    fn right_and_center_alignment_in_shape() {
        let provider = FixedFontProvider::default();
        let right = styled("ab", Style::new("Fixed", 10.0).with_align(TextAlign::Right), Some(100.0));
        let result = FlowLayout::new(&provider).layout(&right).unwrap();
        assert_eq!(result.chunks[0].left_x, 90.0);
        assert_eq!(result.glyphs[0].x, 90.0);

        let center = styled("ab", Style::new("Fixed", 10.0).with_align(TextAlign::Center), Some(100.0));
        let result = FlowLayout::new(&provider).layout(&center).unwrap();
        assert_eq!(result.chunks[0].left_x, 45.0);
    }

    #[test]
    fn unconstrained_anchoring() {
        let provider = FixedFontProvider::default();
        let source = TextSource::new("abcd", Arc::new(Style::new("Fixed", 10.0).with_align(TextAlign::End)))
            .with_x([100.0]);
        let mut input = FlowInput::new();
        input.append_text(source);
        let result = FlowLayout::new(&provider).layout(&input).unwrap();
        assert_eq!(result.chunks[0].left_x, 80.0);
        assert_eq!(result.glyphs[3].x, 95.0);
    }

    #[test]
    fn justified_lines_fill_the_run() {
        let provider = FixedFontProvider::default();
        let input = styled(
            "aa bb cc dd",
            Style::new("Fixed", 10.0).with_align(TextAlign::Justify),
            Some(45.0),
        );
        let result = FlowLayout::new(&provider).layout(&input).unwrap();
        assert_eq!(result.lines.len(), 2);
        // "aa bb cc " on the first line: two stretchable gaps.
        let first = &result.chunks[0];
        assert_eq!(first.text_width, 40.0);
        assert_eq!(first.whitespace_count, 2);
        assert_eq!(first.add_to_each_whitespace, 2.5);
        // The last letter of the line ends on the run's edge.
        assert_eq!(result.glyphs[7].x, 40.0);
        // The paragraph's last line is not stretched.
        assert_eq!(result.chunks[1].add_to_each_whitespace, 0.0);
    }

    #[test]
    fn rtl_span_glyphs_run_right_to_left() {
        let provider = FixedFontProvider::default();
        let input = styled("אבג", Style::new("Fixed", 10.0), Some(100.0));
        let result = FlowLayout::new(&provider).layout(&input).unwrap();
        assert_eq!(result.paragraphs[0].base_direction, Direction::RightToLeft);
        // Start alignment resolves to the right edge.
        assert_eq!(result.chunks[0].left_x, 85.0);
        let xs: Vec<f32> = result.glyphs.iter().map(|g| g.x).collect();
        assert_eq!(xs, vec![95.0, 90.0, 85.0]);
        // Characters keep logical order.
        assert_eq!(result.text(), "אבג");
        assert_eq!(result.characters[0].x, 10.0);
    }

    #[test]
    fn embedded_ltr_run_keeps_its_order_inside_rtl() {
        let provider = FixedFontProvider::default();
        let input = styled("א ab", Style::new("Fixed", 10.0), Some(100.0));
        let result = FlowLayout::new(&provider).layout(&input).unwrap();
        let x_of = |ch: char| {
            let c = result.characters.iter().position(|c| c.ch == ch).unwrap();
            result.glyphs[result.characters[c].in_glyph.unwrap()].x
        };
        assert!(x_of('a') < x_of('b'));
        assert!(x_of('b') < x_of('א'));
    }

    #[test]
    fn vertical_text_stacks_down_the_column() {
        let provider = FixedFontProvider::default();
        let source = TextSource::new(
            "漢字",
            Arc::new(Style::new("Fixed", 10.0).with_writing_mode(WritingMode::VerticalRl)),
        )
        .with_x([50.0])
        .with_y([0.0]);
        let mut input = FlowInput::new();
        input.append_text(source);
        let result = FlowLayout::new(&provider).layout(&input).unwrap();
        let g0 = &result.glyphs[0];
        let g1 = &result.glyphs[1];
        assert_eq!(g0.orientation, GlyphOrientation::Upright);
        // Centered on the x = 50 axis, one em apart.
        assert_eq!(g0.x, 47.5);
        assert_eq!(g1.y - g0.y, 10.0);
        assert_eq!(g0.y, 8.0);
    }

    #[test]
    fn sideways_latin_in_vertical_text_is_rotated() {
        let provider = FixedFontProvider::default();
        let source = TextSource::new(
            "ab",
            Arc::new(Style::new("Fixed", 10.0).with_writing_mode(WritingMode::VerticalRl)),
        )
        .with_x([50.0])
        .with_y([0.0]);
        let mut input = FlowInput::new();
        input.append_text(source);
        let result = FlowLayout::new(&provider).layout(&input).unwrap();
        assert_eq!(result.glyphs[0].orientation, GlyphOrientation::Sideways);
        assert!((result.glyphs[0].rotation - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(result.glyphs[1].y - result.glyphs[0].y, 5.0);
    }

    #[test]
    fn dy_accumulates_across_spans() {
        let provider = FixedFontProvider::default();
        let source = TextSource::new("abc", Arc::new(Style::new("Fixed", 10.0))).with_dy([0.0, 5.0, 5.0]);
        let mut input = FlowInput::new();
        input.append_text(source);
        let result = FlowLayout::new(&provider).layout(&input).unwrap();
        let ys: Vec<f32> = result.glyphs.iter().map(|g| g.y).collect();
        assert_eq!(ys, vec![0.0, 5.0, 10.0]);
    }
}
