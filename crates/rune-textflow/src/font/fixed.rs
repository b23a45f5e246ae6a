//! A synthetic font with fixed advances.
//!
//! Useful for headless layout (measuring without font files) and for
//! deterministic tests. Glyph ids are code points; ligature glyphs get ids
//! above the Unicode range.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use lyon_path::Path;
use lyon_path::math::point;

use crate::font::{FontInstance, FontMetrics, FontProvider};
use crate::shaping::{RawGlyph, ShapeRequest};
use crate::style::{Direction, Style};
use crate::unicode::is_nonspacing_mark;

const LIGATURE_BASE: u32 = 0x11_0000;

#[derive(Debug, Clone)]
struct Ligature {
    sequence: String,
    advance: f32,
}

#[derive(Debug, Clone)]
pub struct FixedFont {
    family: String,
    advance: f32,
    space_advance: f32,
    metrics: FontMetrics,
    vertical_metrics: bool,
    ligatures: Vec<Ligature>,
}

impl FixedFont {
    /// A font where every printable character advances `advance` em.
    pub fn new(family: impl Into<String>, advance: f32) -> Self {
        Self {
            family: family.into(),
            advance,
            space_advance: advance,
            metrics: FontMetrics::TEMPLATE,
            vertical_metrics: true,
            ligatures: Vec::new(),
        }
    }

    pub fn with_space_advance(mut self, advance: f32) -> Self {
        self.space_advance = advance;
        self
    }

    pub fn with_metrics(mut self, metrics: FontMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn without_vertical_metrics(mut self) -> Self {
        self.vertical_metrics = false;
        self
    }

    /// Shape `sequence` into a single glyph advancing `advance` em.
    pub fn with_ligature(mut self, sequence: impl Into<String>, advance: f32) -> Self {
        self.ligatures.push(Ligature {
            sequence: sequence.into(),
            advance,
        });
        self
    }

    fn char_advance(&self, ch: char) -> f32 {
        if ch.is_control() || is_nonspacing_mark(ch) || ch == '\u{ad}' {
            0.0
        } else if ch.is_whitespace() {
            self.space_advance
        } else {
            self.advance
        }
    }
}

impl FontInstance for FixedFont {
    fn family(&self) -> &str {
        &self.family
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn advance(&self, glyph: u32, vertical: bool) -> f32 {
        if vertical {
            return if self.vertical_metrics {
                1.0
            } else {
                self.metrics.line_height()
            };
        }
        if glyph >= LIGATURE_BASE {
            let index = (glyph - LIGATURE_BASE) as usize;
            return self.ligatures.get(index).map_or(0.0, |l| l.advance);
        }
        char::from_u32(glyph).map_or(0.0, |ch| self.char_advance(ch))
    }

    fn glyph_outline(&self, glyph: u32) -> Option<Path> {
        let advance = self.advance(glyph, false);
        if glyph < LIGATURE_BASE && char::from_u32(glyph).is_some_and(char::is_whitespace) {
            return None;
        }
        if advance <= 0.0 {
            return None;
        }
        let inset = advance * 0.1;
        let top = -self.metrics.ascent * 0.7;
        let mut builder = Path::builder();
        builder.begin(point(inset, 0.0));
        builder.line_to(point(advance - inset, 0.0));
        builder.line_to(point(advance - inset, top));
        builder.line_to(point(inset, top));
        builder.end(true);
        Some(builder.build())
    }

    fn has_vertical_metrics(&self) -> bool {
        self.vertical_metrics
    }

    fn glyph_index(&self, ch: char) -> Option<u32> {
        Some(u32::from(ch))
    }

    fn shape(&self, text: &str, request: &ShapeRequest<'_>) -> Vec<RawGlyph> {
        let mut glyphs: Vec<RawGlyph> = Vec::with_capacity(text.len());
        let mut pos = 0usize;
        while pos < text.len() {
            let rest = &text[pos..];
            let ligature = self
                .ligatures
                .iter()
                .enumerate()
                .find(|(_, l)| !l.sequence.is_empty() && rest.starts_with(&l.sequence));
            if let Some((index, lig)) = ligature {
                glyphs.push(RawGlyph {
                    glyph_id: LIGATURE_BASE + index as u32,
                    cluster: pos as u32,
                    x_advance: lig.advance,
                    y_advance: 0.0,
                    x_offset: 0.0,
                    y_offset: 0.0,
                });
                pos += lig.sequence.len();
                continue;
            }
            let Some(ch) = rest.chars().next() else {
                break;
            };
            // Marks join the cluster of their base, like a real shaper.
            let cluster = match glyphs.last() {
                Some(prev) if is_nonspacing_mark(ch) => prev.cluster,
                _ => pos as u32,
            };
            glyphs.push(RawGlyph {
                glyph_id: u32::from(ch),
                cluster,
                x_advance: self.char_advance(ch),
                y_advance: 0.0,
                x_offset: 0.0,
                y_offset: 0.0,
            });
            pos += ch.len_utf8();
        }
        if request.direction == Direction::RightToLeft {
            glyphs.reverse();
        }
        glyphs
    }
}

/// Resolves every style to a [`FixedFont`], except families marked missing.
#[derive(Debug, Clone)]
pub struct FixedFontProvider {
    default: Arc<FixedFont>,
    families: HashMap<String, Arc<FixedFont>>,
    missing: HashSet<String>,
}

impl FixedFontProvider {
    pub fn new(font: FixedFont) -> Self {
        Self {
            default: Arc::new(font),
            families: HashMap::new(),
            missing: HashSet::new(),
        }
    }

    /// Use `font` for styles whose first family is `family`.
    pub fn with_family(mut self, family: impl Into<String>, font: FixedFont) -> Self {
        self.families.insert(family.into(), Arc::new(font));
        self
    }

    /// Make styles whose first family is `family` unresolvable.
    pub fn without_family(mut self, family: impl Into<String>) -> Self {
        self.missing.insert(family.into());
        self
    }
}

impl Default for FixedFontProvider {
    fn default() -> Self {
        Self::new(FixedFont::new("Fixed", 0.5))
    }
}

impl FontProvider for FixedFontProvider {
    fn resolve(&self, style: &Style) -> Option<Arc<dyn FontInstance>> {
        let family = style.font_family.first().map(String::as_str).unwrap_or("");
        if self.missing.contains(family) {
            return None;
        }
        let font = self.families.get(family).unwrap_or(&self.default);
        Some(font.clone() as Arc<dyn FontInstance>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_glyph_per_char_with_byte_clusters() {
        let font = FixedFont::new("Fixed", 0.5);
        let glyphs = font.shape("aé b", &ShapeRequest::default());
        let clusters: Vec<u32> = glyphs.iter().map(|g| g.cluster).collect();
        assert_eq!(clusters, vec![0, 1, 3, 4]);
        assert!(glyphs.iter().all(|g| g.x_advance == 0.5));
    }

    #[test]
    fn ligature_merges_cluster() {
        let font = FixedFont::new("Fixed", 0.5).with_ligature("fi", 0.6);
        let glyphs = font.shape("fix", &ShapeRequest::default());
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].cluster, 0);
        assert_eq!(glyphs[0].x_advance, 0.6);
        assert_eq!(glyphs[1].cluster, 2);
    }

    #[test]
    fn rtl_comes_back_in_visual_order() {
        let font = FixedFont::new("Fixed", 0.5);
        let request = ShapeRequest {
            direction: Direction::RightToLeft,
            ..ShapeRequest::default()
        };
        let glyphs = font.shape("אבג", &request);
        let clusters: Vec<u32> = glyphs.iter().map(|g| g.cluster).collect();
        assert_eq!(clusters, vec![4, 2, 0]);
    }

    #[test]
    fn marks_share_base_cluster_with_zero_advance() {
        let font = FixedFont::new("Fixed", 0.5);
        let glyphs = font.shape("e\u{301}", &ShapeRequest::default());
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[1].cluster, 0);
        assert_eq!(glyphs[1].x_advance, 0.0);
    }

    #[test]
    fn provider_honours_missing_families() {
        let provider = FixedFontProvider::default().without_family("Nowhere");
        assert!(provider.resolve(&Style::new("Nowhere", 10.0)).is_none());
        let font = provider.resolve(&Style::new("Anything", 10.0)).unwrap();
        assert_eq!(font.family(), "Fixed");
    }

    #[test]
    fn whitespace_has_no_outline() {
        let font = FixedFont::new("Fixed", 0.5);
        assert!(font.glyph_outline(u32::from(' ')).is_none());
        let bounds = font.glyph_bounds(u32::from('a')).unwrap();
        assert!(bounds.max.x <= 0.5 && bounds.min.y < 0.0);
    }
}
