use lyon_path::iterator::PathIterator;
use lyon_path::math::{Box2D, Point, point};
use lyon_path::{Path, PathEvent};

/// A polygonal region text can flow into, filled with the nonzero rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WrapShape {
    contours: Vec<Vec<Point>>,
}

impl WrapShape {
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::polygon([
            point(x, y),
            point(x + width, y),
            point(x + width, y + height),
            point(x, y + height),
        ])
    }

    pub fn polygon(points: impl IntoIterator<Item = Point>) -> Self {
        let contour: Vec<Point> = points.into_iter().collect();
        Self {
            contours: if contour.len() >= 3 { vec![contour] } else { Vec::new() },
        }
    }

    /// Flatten a lyon path into a shape. Every sub-path becomes a closed
    /// contour.
    pub fn from_path(path: &Path, tolerance: f32) -> Self {
        let mut contours = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        for event in path.iter().flattened(tolerance) {
            match event {
                PathEvent::Begin { at } => {
                    current.clear();
                    current.push(at);
                }
                PathEvent::Line { to, .. } => current.push(to),
                PathEvent::End { .. } => {
                    if current.len() >= 3 {
                        contours.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
                PathEvent::Quadratic { to, .. } | PathEvent::Cubic { to, .. } => current.push(to),
            }
        }
        Self { contours }
    }

    pub fn contours(&self) -> &[Vec<Point>] {
        &self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn bounds(&self) -> Option<Box2D> {
        let mut points = self.contours.iter().flatten();
        let first = *points.next()?;
        Some(points.fold(Box2D::new(first, first), |b, p| {
            Box2D::new(b.min.min(*p), b.max.max(*p))
        }))
    }

    /// Apply `f` to every vertex.
    pub(crate) fn map_points(&self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            contours: self
                .contours
                .iter()
                .map(|c| c.iter().map(|p| f(*p)).collect())
                .collect(),
        }
    }

    /// Inside intervals of the horizontal line at `y`, sorted by x.
    pub fn intervals_at(&self, y: f32) -> Vec<(f32, f32)> {
        let mut crossings: Vec<(f32, i32)> = Vec::new();
        for contour in &self.contours {
            for (i, p0) in contour.iter().enumerate() {
                let p1 = contour[(i + 1) % contour.len()];
                let winding = if p0.y <= y && p1.y > y {
                    1
                } else if p1.y <= y && p0.y > y {
                    -1
                } else {
                    continue;
                };
                let x = p0.x + (y - p0.y) * (p1.x - p0.x) / (p1.y - p0.y);
                crossings.push((x, winding));
            }
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut intervals: Vec<(f32, f32)> = Vec::new();
        let mut winding = 0;
        let mut start = 0.0;
        for (x, w) in crossings {
            let was_inside = winding != 0;
            winding += w;
            match (was_inside, winding != 0) {
                (false, true) => start = x,
                (true, false) => match intervals.last_mut() {
                    Some(last) if last.1 >= start => last.1 = x,
                    _ => intervals.push((start, x)),
                },
                _ => {}
            }
        }
        intervals
    }

    /// Intervals where the whole band `[top, bottom]` lies inside the
    /// shape.
    pub fn band_intervals(&self, top: f32, bottom: f32) -> Vec<(f32, f32)> {
        let height = (bottom - top).max(0.0);
        let eps = (height * 1e-4).max(1e-5).min(height * 0.5);
        let mut samples = vec![top + eps, bottom - eps];
        for p in self.contours.iter().flatten() {
            if p.y > top && p.y < bottom {
                samples.push((p.y - eps).max(top + eps));
                samples.push((p.y + eps).min(bottom - eps));
            }
        }

        let mut result = self.intervals_at(samples[0]);
        for y in &samples[1..] {
            if result.is_empty() {
                break;
            }
            result = intersect(&result, &self.intervals_at(*y));
        }
        result.retain(|(a, b)| b > a);
        result
    }
}

fn intersect(a: &[(f32, f32)], b: &[(f32, f32)]) -> Vec<(f32, f32)> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let start = a[i].0.max(b[j].0);
        let end = a[i].1.min(b[j].1);
        if end > start {
            out.push((start, end));
        }
        if a[i].1 < b[j].1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_band_is_full_width() {
        let shape = WrapShape::rect(10.0, 0.0, 100.0, 50.0);
        assert_eq!(shape.band_intervals(0.0, 12.0), vec![(10.0, 110.0)]);
        assert!(shape.band_intervals(45.0, 57.0).is_empty());
    }

    #[test]
    fn triangle_narrows_with_depth() {
        // Apex at the top.
        let shape = WrapShape::polygon([point(50.0, 0.0), point(100.0, 100.0), point(0.0, 100.0)]);
        let upper = shape.band_intervals(10.0, 20.0);
        let lower = shape.band_intervals(80.0, 90.0);
        assert_eq!(upper.len(), 1);
        assert_eq!(lower.len(), 1);
        let w_upper = upper[0].1 - upper[0].0;
        let w_lower = lower[0].1 - lower[0].0;
        assert!(w_upper < w_lower);
        // The band is limited by its narrow top edge: 45..55 at y = 10.
        assert!((w_upper - 10.0).abs() < 0.01);
        assert!((upper[0].0 - 45.0).abs() < 0.01);
    }

    #[test]
    fn hole_splits_band() {
        let outer = [point(0.0, 0.0), point(100.0, 0.0), point(100.0, 100.0), point(0.0, 100.0)];
        // Counter-clockwise hole cancels the winding.
        let hole = [point(40.0, 20.0), point(40.0, 80.0), point(60.0, 80.0), point(60.0, 20.0)];
        let shape = WrapShape {
            contours: vec![outer.to_vec(), hole.to_vec()],
        };
        assert_eq!(shape.band_intervals(30.0, 40.0), vec![(0.0, 40.0), (60.0, 100.0)]);
        // A band straddling the hole's top edge is also split.
        assert_eq!(shape.band_intervals(15.0, 25.0), vec![(0.0, 40.0), (60.0, 100.0)]);
    }

    #[test]
    fn path_is_flattened_into_contours() {
        let mut builder = Path::builder();
        builder.begin(point(0.0, 0.0));
        builder.line_to(point(10.0, 0.0));
        builder.quadratic_bezier_to(point(20.0, 10.0), point(10.0, 20.0));
        builder.line_to(point(0.0, 20.0));
        builder.end(true);
        let shape = WrapShape::from_path(&builder.build(), 0.1);
        assert_eq!(shape.contours().len(), 1);
        assert!(shape.contours()[0].len() > 4);
        let bounds = shape.bounds().unwrap();
        assert_eq!(bounds.min, point(0.0, 0.0));
        assert!(bounds.max.x > 14.0);
    }

    #[test]
    fn degenerate_polygon_is_empty() {
        assert!(WrapShape::polygon([point(0.0, 0.0), point(1.0, 1.0)]).is_empty());
        assert!(WrapShape::default().bounds().is_none());
    }
}
