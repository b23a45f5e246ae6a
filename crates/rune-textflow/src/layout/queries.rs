//! Read-only questions asked of a finished layout.

use std::ops::Range;

use lyon_path::math::{Angle, Box2D, Point, Transform, point, vector};
use lyon_path::{Path, PathEvent};

use super::output::{Glyph, LayoutResult};

impl LayoutResult {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether `line` was stashed past the last wrap shape. Out of range
    /// lines count as hidden.
    pub fn is_hidden_line(&self, line: usize) -> bool {
        self.lines.get(line).is_none_or(|l| l.hidden)
    }

    /// Family of the font that renders `character`.
    pub fn font_family_at(&self, character: usize) -> Option<&str> {
        let span = self.characters.get(character)?.in_span;
        self.span_font(span).map(|font| font.family())
    }

    /// Maps glyph space (per em, origin on the baseline) to document space.
    pub fn glyph_transform(&self, glyph: &Glyph) -> Transform {
        let size = self.spans[self.characters[glyph.in_character].in_span].font_size;
        Transform::scale(size, size * glyph.vertical_scale)
            .then_rotate(Angle::radians(glyph.rotation))
            .then_translate(vector(glyph.x, glyph.y))
    }

    /// Visible glyphs drawing the characters in `range` (all when `None`).
    fn visible_glyphs(&self, range: Option<Range<usize>>) -> impl Iterator<Item = &Glyph> + '_ {
        let range = range.unwrap_or(0..self.characters.len());
        self.glyphs
            .iter()
            .filter(move |g| !g.hidden && range.contains(&g.in_character))
    }

    /// Ink bounds of the characters in `range` after `transform`.
    ///
    /// With `with_stroke` each glyph box grows by half its span's stroke
    /// width. Glyphs without an outline contribute nothing.
    pub fn bounding_box(
        &self,
        transform: &Transform,
        with_stroke: bool,
        range: Option<Range<usize>>,
    ) -> Option<Box2D> {
        let mut bounds: Option<Box2D> = None;
        for glyph in self.visible_glyphs(range) {
            let span = self.characters[glyph.in_character].in_span;
            let Some(font) = self.span_font(span) else {
                continue;
            };
            let Some(ink) = font.glyph_bounds(glyph.glyph_id) else {
                continue;
            };
            let to_doc = self.glyph_transform(glyph).then(transform);
            let corners = [
                ink.min,
                point(ink.max.x, ink.min.y),
                ink.max,
                point(ink.min.x, ink.max.y),
            ]
            .map(|p| to_doc.transform_point(p));
            let mut glyph_box = Box2D::from_points(corners);
            if with_stroke {
                if let Some(stroke) = self.spans[span].stroke_width {
                    glyph_box = glyph_box.inflate(stroke * 0.5, stroke * 0.5);
                }
            }
            bounds = Some(bounds.map_or(glyph_box, |b| b.union(&glyph_box)));
        }
        bounds
    }

    /// Outlines of the visible glyphs in `range`, in document space.
    pub fn outline(&self, range: Option<Range<usize>>) -> Path {
        let mut builder = Path::builder();
        for glyph in self.visible_glyphs(range) {
            let span = self.characters[glyph.in_character].in_span;
            let Some(path) = self
                .span_font(span)
                .and_then(|font| font.glyph_outline(glyph.glyph_id))
            else {
                continue;
            };
            let tf = self.glyph_transform(glyph);
            let at = |p: Point| tf.transform_point(p);
            for event in path.iter() {
                match event {
                    PathEvent::Begin { at: p } => {
                        builder.begin(at(p));
                    }
                    PathEvent::Line { to, .. } => {
                        builder.line_to(at(to));
                    }
                    PathEvent::Quadratic { ctrl, to, .. } => {
                        builder.quadratic_bezier_to(at(ctrl), at(to));
                    }
                    PathEvent::Cubic {
                        ctrl1, ctrl2, to, ..
                    } => {
                        builder.cubic_bezier_to(at(ctrl1), at(ctrl2), at(to));
                    }
                    PathEvent::End { close, .. } => builder.end(close),
                }
            }
        }
        builder.build()
    }
}
