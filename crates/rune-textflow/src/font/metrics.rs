use crate::style::LineHeight;

/// Vertical metrics of a font or of a laid-out run.
///
/// Font instances report these per em (`em_size == 1.0`); everything the
/// layout stores is scaled to absolute units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    /// Ascent above baseline (positive).
    pub ascent: f32,
    /// Descent below baseline (positive).
    pub descent: f32,
    /// X-height above baseline.
    pub x_height: f32,
    /// Nominal em size (the font size these metrics belong to).
    pub em_size: f32,
}

impl FontMetrics {
    /// Metrics of a typical Latin font, per em. Used when a style has no
    /// resolvable font but still needs a line box.
    pub const TEMPLATE: FontMetrics = FontMetrics {
        ascent: 0.8,
        descent: 0.2,
        x_height: 0.5,
        em_size: 1.0,
    };

    /// Height of the line box (ascent + descent).
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent
    }

    /// Scale per-em metrics to the given font size.
    pub fn scaled(&self, font_size: f32) -> Self {
        Self {
            ascent: self.ascent * font_size,
            descent: self.descent * font_size,
            x_height: self.x_height * font_size,
            em_size: self.em_size * font_size,
        }
    }

    /// Widen these metrics so that they also include `other`.
    pub fn max(&mut self, other: &FontMetrics) {
        self.ascent = self.ascent.max(other.ascent);
        self.descent = self.descent.max(other.descent);
        self.x_height = self.x_height.max(other.x_height);
        self.em_size = self.em_size.max(other.em_size);
    }

    /// Apply a CSS line-height to already scaled metrics, splitting the
    /// leading evenly above and below the glyph box.
    pub fn with_line_height(self, line_height: LineHeight, font_size: f32) -> Self {
        let target = match line_height {
            LineHeight::Normal => return self,
            LineHeight::Multiplier(m) => m * font_size,
            LineHeight::Absolute(px) => px,
        };
        let half_leading = (target - self.line_height()) * 0.5;
        Self {
            ascent: self.ascent + half_leading,
            descent: self.descent + half_leading,
            ..self
        }
    }

    /// True when the line box these metrics describe has no extent.
    pub fn is_negligible(&self, epsilon: f32) -> bool {
        self.line_height() <= epsilon
    }
}

/// Baseline positions of a font, per em, measured upwards from the
/// alphabetic baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineTable {
    pub alphabetic: f32,
    pub ideographic: f32,
    pub hanging: f32,
    pub mathematical: f32,
    pub central: f32,
    pub middle: f32,
    pub text_before_edge: f32,
    pub text_after_edge: f32,
}

/// Baselines a style may align glyphs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselineKind {
    #[default]
    Alphabetic,
    Ideographic,
    Hanging,
    Mathematical,
    Central,
    Middle,
    TextBeforeEdge,
    TextAfterEdge,
}

impl BaselineTable {
    /// Derive a baseline table from plain vertical metrics, for fonts
    /// without a `BASE` table.
    pub fn from_metrics(metrics: &FontMetrics) -> Self {
        Self {
            alphabetic: 0.0,
            ideographic: -metrics.descent,
            hanging: metrics.ascent * 0.8,
            mathematical: metrics.x_height * 0.5,
            central: (metrics.ascent - metrics.descent) * 0.5,
            middle: metrics.x_height * 0.5,
            text_before_edge: metrics.ascent,
            text_after_edge: -metrics.descent,
        }
    }

    /// Position of the given baseline, per em.
    pub fn get(&self, kind: BaselineKind) -> f32 {
        match kind {
            BaselineKind::Alphabetic => self.alphabetic,
            BaselineKind::Ideographic => self.ideographic,
            BaselineKind::Hanging => self.hanging,
            BaselineKind::Mathematical => self.mathematical,
            BaselineKind::Central => self.central,
            BaselineKind::Middle => self.middle,
            BaselineKind::TextBeforeEdge => self.text_before_edge,
            BaselineKind::TextAfterEdge => self.text_after_edge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_widens_every_field() {
        let mut a = FontMetrics {
            ascent: 8.0,
            descent: 2.0,
            x_height: 4.0,
            em_size: 10.0,
        };
        let b = FontMetrics {
            ascent: 6.0,
            descent: 5.0,
            x_height: 3.0,
            em_size: 12.0,
        };
        a.max(&b);
        assert_eq!(a.ascent, 8.0);
        assert_eq!(a.descent, 5.0);
        assert_eq!(a.x_height, 4.0);
        assert_eq!(a.em_size, 12.0);
        assert_eq!(a.line_height(), 13.0);
    }

    #[test]
    fn line_height_multiplier_splits_leading() {
        let m = FontMetrics::TEMPLATE.scaled(10.0);
        let tall = m.with_line_height(LineHeight::Multiplier(1.5), 10.0);
        assert!((tall.line_height() - 15.0).abs() < 1e-4);
        assert!((tall.ascent - 10.5).abs() < 1e-4);
        assert!((tall.descent - 4.5).abs() < 1e-4);
    }

    #[test]
    fn normal_line_height_is_identity() {
        let m = FontMetrics::TEMPLATE.scaled(12.0);
        assert_eq!(m.with_line_height(LineHeight::Normal, 12.0), m);
    }

    #[test]
    fn derived_baselines() {
        let table = BaselineTable::from_metrics(&FontMetrics::TEMPLATE);
        assert_eq!(table.get(BaselineKind::Alphabetic), 0.0);
        assert!((table.get(BaselineKind::Central) - 0.3).abs() < 1e-6);
        assert!((table.get(BaselineKind::Ideographic) + 0.2).abs() < 1e-6);
    }
}
