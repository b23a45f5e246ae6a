//! The line breaker.
//!
//! Each paragraph is itemized and shaped into unbroken spans, then walked
//! one scan run at a time. While walking, the last soft break, the last
//! emergency (any cursor position) break and any mandatory break are
//! remembered; when a character overflows the run the walk backs out to
//! the best of them. A span taller than the current line box restarts the
//! line with a taller box when the scanline maker cannot grow the line in
//! place.

use lyon_path::Path;

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::font::{FontMetrics, FontProvider};
use crate::input::{ControlCode, FlowInput, InputItem, LengthAdjust, TextSource};

use super::BlockProgression;
use super::itemizer::{FontTable, ItemizedParagraph, itemize_paragraph};
use super::output::{LayoutResult, Line, Paragraph};
use super::path_fit::{StartOffset, fit_to_path};
use super::scanline::{InfiniteScanlineMaker, ScanRun, ScanlineMaker, ShapeScanlineMaker};
use super::shape::WrapShape;
use super::spans::{UnbrokenSpan, build_spans, span_line_height};

const SOFT_HYPHEN: char = '\u{ad}';

/// Lays out a [`FlowInput`] with fonts from a [`FontProvider`].
pub struct FlowLayout<'a> {
    provider: &'a dyn FontProvider,
    config: LayoutConfig,
}

impl<'a> FlowLayout<'a> {
    pub fn new(provider: &'a dyn FontProvider) -> Self {
        Self {
            provider,
            config: LayoutConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// A wrap shape from `path`, flattened at the configured tolerance.
    pub fn shape_from_path(&self, path: &Path) -> WrapShape {
        WrapShape::from_path(path, self.config.flatten_tolerance)
    }

    /// [`fit_to_path`] at the configured flattening tolerance.
    pub fn fit_to_path(&self, result: &mut LayoutResult, path: &Path, start: StartOffset) -> Result<()> {
        fit_to_path(result, path, start, self.config.flatten_tolerance)
    }

    /// Compute the layout of `input`.
    ///
    /// Input with no text yields an empty result. A `textLength`
    /// constraint lays the text out twice: once to measure it and once with
    /// the spacing or glyph stretch that makes it fit.
    pub fn layout(&self, input: &FlowInput) -> Result<LayoutResult> {
        if let Some(length) = input.text_length {
            if !length.length.is_finite() || length.length < 0.0 {
                return Err(LayoutError::InvalidLength(length.length));
            }
        }

        let fonts = FontTable::resolve(&input.items, self.provider);
        let first = Calculator::new(input, &fonts, &self.config, LengthAdjustment::default()).run()?;
        let Some(target) = input.text_length else {
            return Ok(first);
        };

        let actual = first.total_text_width();
        if actual <= self.config.epsilon {
            return Ok(first);
        }
        let adjustment = match target.adjust {
            LengthAdjust::Spacing => {
                let positions = first
                    .characters
                    .iter()
                    .filter(|c| c.attributes.is_cursor_position && !c.ch.is_control())
                    .count();
                if positions < 2 {
                    return Ok(first);
                }
                LengthAdjustment {
                    letter_increment: (target.length - actual) / (positions - 1) as f32,
                    glyph_scale: 1.0,
                }
            }
            LengthAdjust::SpacingAndGlyphs => LengthAdjustment {
                letter_increment: 0.0,
                glyph_scale: target.length / actual,
            },
        };
        tracing::debug!(actual, target = target.length, ?adjustment, "re-laying out for text length");
        Calculator::new(input, &fonts, &self.config, adjustment).run()
    }
}

/// Extra spacing and stretch applied in the second pass of a length
/// adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct LengthAdjustment {
    pub letter_increment: f32,
    pub glyph_scale: f32,
}

impl Default for LengthAdjustment {
    fn default() -> Self {
        Self {
            letter_increment: 0.0,
            glyph_scale: 1.0,
        }
    }
}

/// A break position: unit `offset` of span `span`. The end of a paragraph
/// is `(spans.len(), 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) struct SpanPosition {
    pub span: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BreakKind {
    Soft,
    Emergency,
    Mandatory,
    /// An explicit block position starts a new row.
    RowBreak,
    EndOfParagraph,
    /// Nothing fitted.
    Nothing,
}

/// The part of an unbroken span that landed in one chunk.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct BrokenSpan {
    pub span: usize,
    /// Unit range within the span.
    pub start: usize,
    pub end: usize,
    pub width: f32,
    pub whitespace_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ChunkLayout {
    pub x: f32,
    pub scanrun_width: f32,
    pub spans: Vec<BrokenSpan>,
    pub text_width: f32,
    pub whitespace_count: u32,
}

#[derive(Debug, Clone)]
pub(super) struct LineLayout {
    pub chunks: Vec<ChunkLayout>,
    pub line_height: FontMetrics,
    pub top: f32,
    pub end: SpanPosition,
    pub kind: BreakKind,
    /// The line ends at a soft hyphen that is drawn as a hyphen.
    pub hyphenated: bool,
}

enum RunFit {
    Taller(FontMetrics),
    Fitted {
        end: SpanPosition,
        kind: BreakKind,
        chunk_starts: Vec<(SpanPosition, f32)>,
    },
}

/// Width of one break unit.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct UnitWidth {
    /// Full inline extent, spacing included.
    pub total: f32,
    /// Letter and word spacing after the glyphs.
    pub spacing: f32,
    /// Explicit inline offset before the glyphs.
    pub lead: f32,
    pub is_white: bool,
    pub is_expandable: bool,
}

pub(super) struct Calculator<'a> {
    pub(super) input: &'a FlowInput,
    pub(super) fonts: &'a FontTable,
    pub(super) config: &'a LayoutConfig,
    pub(super) adjust: LengthAdjustment,
    pub(super) progression: BlockProgression,
    pub(super) strut: FontMetrics,
    pub(super) maker: Box<dyn ScanlineMaker>,
    pub(super) current_shape: usize,
    /// Set once the wrap shapes are exhausted.
    pub(super) hidden: bool,
    /// Accumulated block offset from relative positioning.
    pub(super) y_offset: f32,
    pub(super) pending_anchor: Option<f32>,
    pub(super) result: LayoutResult,
}

impl<'a> Calculator<'a> {
    pub(super) fn new(
        input: &'a FlowInput,
        fonts: &'a FontTable,
        config: &'a LayoutConfig,
        adjust: LengthAdjustment,
    ) -> Self {
        let first = input
            .items
            .iter()
            .enumerate()
            .find_map(|(index, item)| item.as_text().map(|source| (index, source)));
        let first_source = first.map(|(_, source)| source);
        let progression = first_source.map_or(BlockProgression::TopToBottom, |s| {
            BlockProgression::from_writing_mode(s.style.writing_mode)
        });
        let strut = input.strut.unwrap_or_else(|| {
            first.map_or(FontMetrics::default(), |(index, source)| {
                let font = fonts.font_of(index).map(|f| fonts.get(f).as_ref());
                span_line_height(font, &source.style)
            })
        });

        let first_x = first_source.map(|s| (TextSource::attribute(&s.x, 0), TextSource::attribute(&s.y, 0)));
        let (start_inline, start_block) = first_x.map_or((None, None), |(x, y)| {
            (progression.inline_of(x, y), progression.block_of(x, y))
        });

        let (maker, pending_anchor): (Box<dyn ScanlineMaker>, Option<f32>) =
            match input.shapes.iter().find(|s| !s.is_empty()) {
                Some(shape) => (
                    Box::new(ShapeScanlineMaker::new(shape, progression, config.epsilon)),
                    None,
                ),
                None => (
                    Box::new(InfiniteScanlineMaker::new(start_inline.unwrap_or(0.0), 0.0)),
                    Some(start_block.unwrap_or(0.0)),
                ),
            };
        let current_shape = input.shapes.iter().position(|s| !s.is_empty()).unwrap_or(0);

        Self {
            input,
            fonts,
            config,
            adjust,
            progression,
            strut,
            maker,
            current_shape,
            hidden: false,
            y_offset: 0.0,
            pending_anchor,
            result: LayoutResult::default(),
        }
    }

    pub(super) fn run(mut self) -> Result<LayoutResult> {
        let input = self.input;
        let items = &input.items;
        let has_content = items.iter().any(|item| match item {
            InputItem::Text(source) => !source.text.is_empty(),
            InputItem::Control(ControlCode::ArbitraryGap { .. }) => true,
            InputItem::Control(_) => false,
        });
        if !has_content {
            tracing::debug!("nothing to lay out");
            return Ok(LayoutResult {
                fonts: self.fonts.fonts.clone(),
                ..LayoutResult::default()
            });
        }

        let mut start = 0;
        let mut after_break = false;
        loop {
            let para = itemize_paragraph(items, start, self.fonts, after_break);
            let spans = build_spans(&para, items, self.fonts)?;
            self.lay_out_paragraph(&para, &spans)?;

            match para.terminator {
                None => break,
                Some(ControlCode::ShapeBreak) => {
                    if self.maker.is_constrained() && !self.hidden {
                        self.advance_shape();
                    }
                    if para.next_input >= items.len() {
                        break;
                    }
                }
                Some(_) => {}
            }
            after_break = matches!(para.terminator, Some(ControlCode::ParagraphBreak));
            start = para.next_input;
        }

        self.result.fonts = self.fonts.fonts.clone();
        tracing::debug!(
            paragraphs = self.result.paragraphs.len(),
            lines = self.result.lines.len(),
            glyphs = self.result.glyphs.len(),
            truncated = self.result.truncated,
            "layout complete"
        );
        Ok(self.result)
    }

    /// Move on to the next wrap shape, or into the hidden overflow area
    /// past the last one.
    fn advance_shape(&mut self) {
        let input = self.input;
        let shapes = &input.shapes;
        let mut next = self.current_shape + 1;
        while next < shapes.len() && shapes[next].is_empty() {
            next += 1;
        }
        self.current_shape = next;
        if next < shapes.len() {
            tracing::trace!(shape = next, "continuing in next wrap shape");
            self.maker = Box::new(ShapeScanlineMaker::new(
                &shapes[next],
                self.progression,
                self.config.epsilon,
            ));
        } else {
            if !self.hidden {
                tracing::warn!("text overflows the last wrap shape, remaining lines are hidden");
            }
            self.hidden = true;
            self.result.truncated = true;
            let y = if self.maker.is_constrained() { 0.0 } else { self.maker.y() };
            self.maker = Box::new(InfiniteScanlineMaker::new(0.0, y));
        }
    }

    fn lay_out_paragraph(&mut self, para: &ItemizedParagraph, spans: &[UnbrokenSpan]) -> Result<()> {
        let para_index = self.result.paragraphs.len();
        self.result.paragraphs.push(Paragraph {
            base_direction: para.direction,
            alignment: para.alignment,
        });

        let end = SpanPosition {
            span: spans.len(),
            offset: 0,
        };
        let mut pos = first_unit(spans, SpanPosition { span: 0, offset: 0 });
        if pos >= end {
            return self.place_empty_line(para_index, spans);
        }

        while pos < end {
            let line = self.build_line(para, spans, pos)?;
            if line.end == pos {
                if line.line_height.is_negligible(self.config.epsilon) {
                    return Err(LayoutError::NoProgress {
                        position: self.maker.y(),
                    });
                }
                tracing::trace!(y = line.top, "nothing fits, moving down");
                self.maker.set_line_height(&line.line_height);
                self.maker.complete_line();
                continue;
            }

            let baseline = line.top + line.line_height.ascent;
            self.maker.set_new_y(line.top);
            self.maker.set_line_height(&line.line_height);
            self.output_line(para, para_index, spans, &line, baseline);
            self.maker.complete_line();
            pos = first_unit(spans, line.end);
        }
        Ok(())
    }

    fn place_empty_line(&mut self, para_index: usize, spans: &[UnbrokenSpan]) -> Result<()> {
        let mut line_height = self.strut;
        for span in spans {
            line_height.max(&span.line_height);
        }
        let anchor = self.line_anchor(spans, SpanPosition { span: 0, offset: 0 });
        let top = loop {
            if let Some(block) = anchor {
                self.maker.set_new_y(block - line_height.ascent);
            }
            match self.maker.make_scanline(&line_height).first() {
                Some(run) => break run.y,
                None => self.advance_shape(),
            }
        };
        self.result.lines.push(Line {
            in_paragraph: para_index,
            baseline_y: top + line_height.ascent,
            line_height,
            in_shape: self.current_shape,
            hidden: self.hidden,
        });
        self.maker.set_line_height(&line_height);
        self.maker.complete_line();
        Ok(())
    }

    /// Block position a line starting at `pos` is pinned to, if any.
    fn line_anchor(&mut self, spans: &[UnbrokenSpan], pos: SpanPosition) -> Option<f32> {
        if self.maker.is_constrained() {
            return None;
        }
        let explicit = spans
            .get(pos.span)
            .filter(|_| pos.offset == 0)
            .and_then(|s| s.explicit_block(self.progression));
        match explicit {
            Some(block) => {
                self.pending_anchor = None;
                self.y_offset = 0.0;
                Some(block)
            }
            None => self.pending_anchor.take(),
        }
    }

    fn build_line(
        &mut self,
        para: &ItemizedParagraph,
        spans: &[UnbrokenSpan],
        pos: SpanPosition,
    ) -> Result<LineLayout> {
        let mut line_height = self.strut;
        let anchor = self.line_anchor(spans, pos);
        let mut retries = 0;
        let mut check_heights = true;

        loop {
            if let Some(block) = anchor {
                self.maker.set_new_y(block - line_height.ascent);
            }
            let mut runs = self.maker.make_scanline(&line_height);
            if runs.is_empty() {
                self.advance_shape();
                line_height = self.strut;
                retries = 0;
                check_heights = true;
                continue;
            }
            if para.direction.is_rtl() {
                runs.reverse();
            }

            let mut chunks = Vec::new();
            let mut p = pos;
            let mut kind = BreakKind::Nothing;
            let mut hyphenated = false;
            let mut taller = None;
            for run in &runs {
                match self.fit_run(para, spans, p, run, &mut line_height, check_heights) {
                    RunFit::Taller(height) => {
                        taller = Some(height);
                        break;
                    }
                    RunFit::Fitted {
                        end,
                        kind: run_kind,
                        chunk_starts,
                    } => {
                        if end > p {
                            let (run_chunks, hyphen) =
                                self.commit_run(para, spans, p, end, run, &chunk_starts, run_kind);
                            chunks.extend(run_chunks);
                            hyphenated = hyphen;
                            p = end;
                        }
                        kind = run_kind;
                        if matches!(
                            run_kind,
                            BreakKind::Mandatory | BreakKind::RowBreak | BreakKind::EndOfParagraph
                        ) {
                            break;
                        }
                    }
                }
            }

            if let Some(height) = taller {
                retries += 1;
                tracing::trace!(retries, ascent = height.ascent, "retrying line with taller box");
                line_height = height;
                if retries >= self.config.max_height_retries {
                    tracing::warn!(retries, "line height did not settle, keeping current box");
                    check_heights = false;
                }
                continue;
            }

            let top = runs[0].y;
            let mut final_height = self.strut;
            for chunk in &chunks {
                for broken in &chunk.spans {
                    final_height.max(&spans[broken.span].line_height);
                }
            }
            if chunks.is_empty() {
                final_height = line_height;
            }
            let top = match anchor {
                Some(block) if !chunks.is_empty() => block - final_height.ascent,
                _ => top,
            };
            return Ok(LineLayout {
                chunks,
                line_height: final_height,
                top,
                end: p,
                kind,
                hyphenated,
            });
        }
    }

    fn exceeds(span: &FontMetrics, line: &FontMetrics, epsilon: f32) -> bool {
        span.ascent > line.ascent + epsilon || span.descent > line.descent + epsilon
    }

    /// Walk units from `start` until the run is full.
    fn fit_run(
        &mut self,
        para: &ItemizedParagraph,
        spans: &[UnbrokenSpan],
        start: SpanPosition,
        run: &ScanRun,
        line_height: &mut FontMetrics,
        check_heights: bool,
    ) -> RunFit {
        let eps = self.config.epsilon;
        let constrained = self.maker.is_constrained();
        let first_x = spans
            .get(start.span)
            .filter(|_| !constrained && start.offset == 0)
            .and_then(|s| s.explicit_inline(self.progression))
            .unwrap_or(run.x_start);
        let mut chunk_starts = vec![(start, first_x)];
        let mut available = run.x_end - first_x;
        let mut width = 0.0;
        // `width` up to the end of the last non-white unit.
        let mut inked = 0.0;
        let mut soft: Option<SpanPosition> = None;
        let mut emergency: Option<SpanPosition> = None;

        let (mut k, mut i) = (start.span, start.offset);
        let (end, kind) = loop {
            let Some(span) = spans.get(k) else {
                break (
                    SpanPosition {
                        span: spans.len(),
                        offset: 0,
                    },
                    BreakKind::EndOfParagraph,
                );
            };
            if i >= span.unit_len() {
                k += 1;
                i = 0;
                continue;
            }
            let p = SpanPosition { span: k, offset: i };

            if i == 0 || p == start {
                if i == 0 && p != start && !constrained {
                    if span.explicit_block(self.progression).is_some() {
                        break (p, BreakKind::RowBreak);
                    }
                    if let Some(x) = span.explicit_inline(self.progression) {
                        chunk_starts.push((p, x));
                        width = 0.0;
                        inked = 0.0;
                        available = run.x_end - x;
                    }
                }
                if check_heights && Self::exceeds(&span.line_height, line_height, eps) {
                    let mut taller = *line_height;
                    taller.max(&span.line_height);
                    if !self.maker.can_extend_current_scanline() {
                        return RunFit::Taller(taller);
                    }
                    *line_height = taller;
                    self.maker.set_line_height(line_height);
                }
            }

            let unit = self.unit_width(para, span, i);
            let mut is_white = unit.is_white;
            if span.gap.is_some() {
                if p != start {
                    soft = Some(p);
                    emergency = Some(p);
                }
                is_white = false;
            } else {
                let c = span.chars.start + i;
                let attrs = &para.attributes[c];
                if p != start {
                    if attrs.is_mandatory_break {
                        break (p, BreakKind::Mandatory);
                    }
                    if attrs.is_line_break {
                        let hyphen = if c > 0 && para.chars[c - 1] == SOFT_HYPHEN {
                            self.hyphen_width(prev_span(spans, p).unwrap_or(span))
                        } else {
                            0.0
                        };
                        if inked + hyphen <= available + eps {
                            soft = Some(p);
                        }
                    }
                    if attrs.is_char_break {
                        emergency = Some(p);
                    }
                }
            }

            if !is_white && width + unit.total - unit.spacing > available + eps {
                let narrow = run.width() < self.config.narrow_scanrun_factor * line_height.line_height();
                break match (soft, emergency) {
                    (Some(s), _) => (s, BreakKind::Soft),
                    (None, Some(e)) if narrow => (e, BreakKind::Emergency),
                    _ => (start, BreakKind::Nothing),
                };
            }
            width += unit.total;
            if !is_white {
                inked = width;
            }
            i += 1;
        };

        RunFit::Fitted {
            end,
            kind,
            chunk_starts,
        }
    }

    /// Build the chunks for the units in `[start, end)` and trim the
    /// trailing whitespace of the last one.
    #[allow(clippy::too_many_arguments)]
    fn commit_run(
        &self,
        para: &ItemizedParagraph,
        spans: &[UnbrokenSpan],
        start: SpanPosition,
        end: SpanPosition,
        run: &ScanRun,
        chunk_starts: &[(SpanPosition, f32)],
        kind: BreakKind,
    ) -> (Vec<ChunkLayout>, bool) {
        let mut chunks: Vec<ChunkLayout> = Vec::new();
        let mut next_chunk = 0;
        let mut last: Option<(SpanPosition, UnitWidth)> = None;
        let mut trailing_white = 0.0;
        let mut trailing_expandable = 0;

        let (mut k, mut i) = (start.span, start.offset);
        while k < spans.len() {
            let span = &spans[k];
            if i >= span.unit_len() {
                k += 1;
                i = 0;
                continue;
            }
            let p = SpanPosition { span: k, offset: i };
            if p >= end {
                break;
            }
            while next_chunk < chunk_starts.len() && chunk_starts[next_chunk].0 <= p {
                let x = chunk_starts[next_chunk].1;
                chunks.push(ChunkLayout {
                    x,
                    scanrun_width: if next_chunk == 0 { run.width() } else { run.x_end - x },
                    spans: Vec::new(),
                    text_width: 0.0,
                    whitespace_count: 0,
                });
                next_chunk += 1;
                trailing_white = 0.0;
                trailing_expandable = 0;
            }
            let Some(chunk) = chunks.last_mut() else {
                break;
            };

            let unit = self.unit_width(para, span, i);
            let expandable = u32::from(unit.is_expandable);
            match chunk.spans.last_mut() {
                Some(broken) if broken.span == k && broken.end == i => {
                    broken.end = i + 1;
                    broken.width += unit.total;
                    broken.whitespace_count += expandable;
                }
                _ => chunk.spans.push(BrokenSpan {
                    span: k,
                    start: i,
                    end: i + 1,
                    width: unit.total,
                    whitespace_count: expandable,
                }),
            }
            chunk.text_width += unit.total;
            chunk.whitespace_count += expandable;
            if unit.is_white {
                trailing_white += unit.total;
                trailing_expandable += expandable;
            } else {
                trailing_white = 0.0;
                trailing_expandable = 0;
            }
            last = Some((p, unit));
            i += 1;
        }

        let mut hyphenated = false;
        if let (Some(chunk), Some((p, unit))) = (chunks.last_mut(), last) {
            if unit.is_white {
                chunk.text_width -= trailing_white;
                chunk.whitespace_count = chunk.whitespace_count.saturating_sub(trailing_expandable);
            } else {
                chunk.text_width -= unit.spacing;
            }
            let span = &spans[p.span];
            let is_shy = span.gap.is_none() && para.chars[span.chars.start + p.offset] == SOFT_HYPHEN;
            if kind == BreakKind::Soft && is_shy {
                chunk.text_width += self.hyphen_width(span);
                hyphenated = true;
            }
        }
        (chunks, hyphenated)
    }

    /// Inline width of unit `i` of `span`.
    pub(super) fn unit_width(&self, para: &ItemizedParagraph, span: &UnbrokenSpan, i: usize) -> UnitWidth {
        if let Some(gap) = span.gap {
            return UnitWidth {
                total: gap,
                ..UnitWidth::default()
            };
        }
        let c = span.chars.start + i;
        let attrs = &para.attributes[c];
        let ch = para.chars[c];
        let glyphs = if ch == SOFT_HYPHEN || ch.is_control() {
            0.0
        } else {
            span.glyph_width(i) * self.adjust.glyph_scale
        };
        let mut spacing = 0.0;
        if attrs.is_cursor_position && !ch.is_control() {
            spacing += span.letter_spacing() + self.adjust.letter_increment;
        }
        if attrs.is_expandable_space {
            spacing += span.word_spacing();
        }
        let lead = if i == 0 {
            self.progression.inline_of(span.dx, span.dy).unwrap_or(0.0)
        } else {
            0.0
        };
        UnitWidth {
            total: glyphs + spacing + lead,
            spacing,
            lead,
            is_white: attrs.is_white,
            is_expandable: attrs.is_expandable_space,
        }
    }

    pub(super) fn hyphen_width(&self, span: &UnbrokenSpan) -> f32 {
        span.font
            .map(|f| self.fonts.get(f))
            .and_then(|font| font.glyph_index('-').map(|g| font.advance(g, false)))
            .map_or(0.0, |advance| advance * span.font_size * self.adjust.glyph_scale)
    }
}

/// The first position at or after `pos` that holds a unit.
fn first_unit(spans: &[UnbrokenSpan], mut pos: SpanPosition) -> SpanPosition {
    while pos.span < spans.len() && pos.offset >= spans[pos.span].unit_len() {
        pos.span += 1;
        pos.offset = 0;
    }
    if pos.span >= spans.len() {
        pos.offset = 0;
    }
    pos
}

/// The span holding the unit before `pos`.
fn prev_span(spans: &[UnbrokenSpan], pos: SpanPosition) -> Option<&UnbrokenSpan> {
    if pos.offset > 0 {
        return spans.get(pos.span);
    }
    spans[..pos.span].iter().rev().find(|s| s.unit_len() > 0)
}
