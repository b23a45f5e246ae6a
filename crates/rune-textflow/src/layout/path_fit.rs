//! Moving laid-out glyphs onto a curve.

use std::ops::Range;

use lyon_geom::LineSegment;
use lyon_path::iterator::PathIterator;
use lyon_path::math::{Point, Vector, vector};
use lyon_path::{Path, PathEvent};

use crate::error::{LayoutError, Result};

use super::output::LayoutResult;

/// Where along the path the text starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartOffset {
    /// Distance from the start of the path in user units.
    Absolute(f32),
    /// Percentage of the path length, `50.0` being the middle.
    Percent(f32),
}

impl StartOffset {
    fn resolve(self, length: f32) -> f32 {
        match self {
            StartOffset::Absolute(offset) => offset,
            StartOffset::Percent(percent) => length * percent / 100.0,
        }
    }

    fn value(self) -> f32 {
        match self {
            StartOffset::Absolute(v) | StartOffset::Percent(v) => v,
        }
    }
}

/// A flattened path measured by arc length.
#[derive(Debug, Default)]
struct MeasuredPath {
    /// Segments with the arc length at which each starts.
    segments: Vec<(LineSegment<f32>, f32)>,
    length: f32,
}

impl MeasuredPath {
    fn new(path: &Path, tolerance: f32) -> Self {
        let mut measured = MeasuredPath::default();
        for event in path.iter().flattened(tolerance) {
            match event {
                PathEvent::Line { from, to } => measured.push(from, to),
                PathEvent::End {
                    last,
                    first,
                    close: true,
                } => measured.push(last, first),
                _ => {}
            }
        }
        measured
    }

    fn push(&mut self, from: Point, to: Point) {
        let segment = LineSegment { from, to };
        let length = segment.length();
        if length <= f32::EPSILON {
            return;
        }
        self.segments.push((segment, self.length));
        self.length += length;
    }

    /// Point and unit tangent at arc length `s`, if it lies on the path.
    fn sample(&self, s: f32) -> Option<(Point, Vector)> {
        if s < 0.0 || s > self.length || self.segments.is_empty() {
            return None;
        }
        let index = self
            .segments
            .partition_point(|(_, start)| *start <= s)
            .saturating_sub(1);
        let (segment, start) = &self.segments[index];
        let length = segment.length();
        let t = ((s - start) / length).clamp(0.0, 1.0);
        Some((segment.sample(t), segment.to_vector() / length))
    }
}

/// Characters drawn by one glyph run, plus those glyphs.
struct Cluster {
    chars: Range<usize>,
    glyphs: Range<usize>,
}

fn clusters(result: &LayoutResult) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    let chars = &result.characters;
    let mut i = 0;
    while i < chars.len() {
        let Some(first_glyph) = chars[i].in_glyph else {
            i += 1;
            continue;
        };
        let mut end = i + 1;
        while end < chars.len() && chars[end].in_glyph.is_none() && chars[end].in_span == chars[i].in_span {
            end += 1;
        }
        let mut glyph_end = first_glyph;
        while glyph_end < result.glyphs.len() && result.glyphs[glyph_end].in_character < end {
            glyph_end += 1;
        }
        clusters.push(Cluster {
            chars: i..end,
            glyphs: first_glyph..glyph_end,
        });
        i = end;
    }
    clusters
}

fn rotate(v: Vector, angle: f32) -> Vector {
    let (sin, cos) = angle.sin_cos();
    vector(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Remap every glyph cluster of `result` onto `path`.
///
/// Each cluster is pivoted on the point of its baseline half way along its
/// inline extent. That point is placed at `start + inline` along the path
/// and the cluster is turned to follow the tangent there. Clusters falling
/// outside the path are hidden and the result is flagged truncated.
pub fn fit_to_path(
    result: &mut LayoutResult,
    path: &Path,
    start: StartOffset,
    tolerance: f32,
) -> Result<()> {
    if !start.value().is_finite() {
        return Err(LayoutError::InvalidLength(start.value()));
    }
    let curve = MeasuredPath::new(path, tolerance);
    let start = start.resolve(curve.length);
    tracing::debug!(length = curve.length, start, "fitting text to path");

    for cluster in clusters(result) {
        let span_index = result.characters[cluster.chars.start].in_span;
        let span = result.spans[span_index];
        let line = result.lines[result.chunks[span.in_chunk].in_line];
        let (left, right) = cluster.chars.clone().fold((f32::MAX, f32::MIN), |(l, r), c| {
            let ch = &result.characters[c];
            (l.min(ch.x), r.max(ch.x + ch.width))
        });
        let mid = span.x_start + (left + right) * 0.5;

        let Some((point, tangent)) = curve.sample(start + mid) else {
            for glyph in &mut result.glyphs[cluster.glyphs] {
                glyph.hidden = true;
            }
            result.truncated = true;
            continue;
        };

        let progression = span.block_progression;
        let (pivot_x, pivot_y) = progression.to_doc(mid, line.baseline_y);
        let (axis_x, axis_y) = progression.to_doc(1.0, 0.0);
        let angle = tangent.y.atan2(tangent.x) - axis_y.atan2(axis_x);
        for glyph in &mut result.glyphs[cluster.glyphs] {
            let offset = rotate(vector(glyph.x - pivot_x, glyph.y - pivot_y), angle);
            glyph.x = point.x + offset.x;
            glyph.y = point.y + offset.y;
            glyph.rotation += angle;
        }
    }
    result.path_fitted = true;
    Ok(())
}

impl LayoutResult {
    /// See [`fit_to_path`].
    pub fn fit_to_path(&mut self, path: &Path, start: StartOffset, tolerance: f32) -> Result<()> {
        fit_to_path(self, path, start, tolerance)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;

    use lyon_path::math::point;

    use super::*;
    use crate::font::FixedFontProvider;
    use crate::input::{FlowInput, TextSource};
    use crate::layout::FlowLayout;
    use crate::style::Style;

    fn laid_out(text: &str) -> LayoutResult {
        let mut input = FlowInput::new();
        input.append_text(TextSource::new(text, Arc::new(Style::new("Fixed", 10.0))));
        FlowLayout::new(&FixedFontProvider::default())
            .layout(&input)
            .unwrap()
    }

    fn line(from: Point, to: Point) -> Path {
        let mut builder = Path::builder();
        builder.begin(from);
        builder.line_to(to);
        builder.end(false);
        builder.build()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn straight_path_translates_glyphs() {
        let mut result = laid_out("ab");
        let path = line(point(10.0, 50.0), point(200.0, 50.0));
        result
            .fit_to_path(&path, StartOffset::Absolute(0.0), 0.1)
            .unwrap();
        assert!(result.path_fitted);
        assert!(!result.truncated);
        assert!(close(result.glyphs[0].x, 10.0));
        assert!(close(result.glyphs[1].x, 15.0));
        assert!(close(result.glyphs[1].y, 50.0));
        assert!(close(result.glyphs[1].rotation, 0.0));
    }

    #[test]
    fn downward_path_turns_glyphs() {
        let mut result = laid_out("ab");
        let path = line(point(0.0, 0.0), point(0.0, 100.0));
        fit_to_path(&mut result, &path, StartOffset::Absolute(0.0), 0.1).unwrap();
        assert!(close(result.glyphs[0].x, 0.0));
        assert!(close(result.glyphs[0].y, 0.0));
        assert!(close(result.glyphs[1].y, 5.0));
        assert!(close(result.glyphs[1].rotation, FRAC_PI_2));
    }

    #[test]
    fn percent_offset_uses_path_length() {
        let mut result = laid_out("a");
        let path = line(point(0.0, 0.0), point(100.0, 0.0));
        fit_to_path(&mut result, &path, StartOffset::Percent(50.0), 0.1).unwrap();
        assert!(close(result.glyphs[0].x, 50.0));
    }

    #[test]
    fn clusters_past_the_end_are_hidden() {
        let mut result = laid_out("abc");
        let path = line(point(0.0, 0.0), point(7.0, 0.0));
        fit_to_path(&mut result, &path, StartOffset::Absolute(0.0), 0.1).unwrap();
        assert!(result.truncated);
        let hidden: Vec<bool> = result.glyphs.iter().map(|g| g.hidden).collect();
        assert_eq!(hidden, vec![false, true, true]);
        // Hidden text stays queryable.
        assert_eq!(result.text(), "abc");
    }

    #[test]
    fn negative_start_hides_leading_clusters() {
        let mut result = laid_out("ab");
        let path = line(point(0.0, 0.0), point(100.0, 0.0));
        fit_to_path(&mut result, &path, StartOffset::Absolute(-4.0), 0.1).unwrap();
        assert!(result.glyphs[0].hidden);
        assert!(!result.glyphs[1].hidden);
        assert!(close(result.glyphs[1].x, 1.0));
    }

    #[test]
    fn degenerate_path_hides_everything() {
        let mut result = laid_out("ab");
        let path = line(point(3.0, 3.0), point(3.0, 3.0));
        fit_to_path(&mut result, &path, StartOffset::Absolute(0.0), 0.1).unwrap();
        assert!(result.glyphs.iter().all(|g| g.hidden));
        assert!(result.truncated);
    }

    #[test]
    fn non_finite_offset_is_rejected() {
        let mut result = laid_out("a");
        let path = line(point(0.0, 0.0), point(10.0, 0.0));
        let err = fit_to_path(&mut result, &path, StartOffset::Absolute(f32::NAN), 0.1);
        assert!(matches!(err, Err(LayoutError::InvalidLength(_))));
    }
}
