use std::sync::Arc;

use lyon_path::Path;
use lyon_path::math::point;
use swash::scale::ScaleContext;
use swash::zeno::{Command, PathData};
use swash::{FontRef, Metrics};

use crate::font::{FontError, FontInstance, FontMetrics, Result};
use crate::shaping::{RawGlyph, ShapeRequest, shape_with_harfrust};

/// Loaded font face backed by a font file (TTF/OTF).
///
/// This is a thin wrapper around `swash::FontRef` that owns the
/// underlying font data. Shaping goes through harfrust on the same bytes.
#[derive(Debug, Clone)]
pub struct FontFace {
    /// Full font data.
    data: Arc<[u8]>,
    /// Face index within a collection.
    index: u32,
    /// Offset to the table directory for this font.
    offset: u32,
    /// Cache key used internally by swash.
    key: swash::CacheKey,
    family: String,
    units_per_em: u16,
    /// Extracted font metrics, per em.
    metrics: FontMetrics,
    has_vertical_metrics: bool,
}

impl FontFace {
    /// Create a font face from raw bytes and a font index within the file.
    pub fn from_bytes(data: Arc<[u8]>, index: usize, family: impl Into<String>) -> Result<Self> {
        let font = FontRef::from_index(&data, index).ok_or(FontError::InvalidFont)?;
        let raw = font.metrics(&[]);
        let metrics = Self::metrics_from_swash(&raw);
        let (offset, key) = (font.offset, font.key);
        Ok(Self {
            index: index as u32,
            offset,
            key,
            family: family.into(),
            units_per_em: raw.units_per_em,
            metrics,
            has_vertical_metrics: raw.has_vertical_metrics,
            data,
        })
    }

    /// Create a font face from raw bytes owned by a `Vec<u8>`.
    pub fn from_vec(data: Vec<u8>, index: usize, family: impl Into<String>) -> Result<Self> {
        Self::from_bytes(Arc::from(data), index, family)
    }

    /// Create a font face from a font file on disk.
    pub fn from_path(
        path: impl AsRef<std::path::Path>,
        index: usize,
        family: impl Into<String>,
    ) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_vec(data, index, family)
    }

    /// Return a transient `FontRef` for interacting with swash APIs.
    fn as_swash_ref(&self) -> FontRef<'_> {
        FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        }
    }

    fn metrics_from_swash(raw: &Metrics) -> FontMetrics {
        let upem = if raw.units_per_em != 0 {
            f32::from(raw.units_per_em)
        } else {
            1.0
        };
        FontMetrics {
            ascent: raw.ascent / upem,
            descent: raw.descent / upem,
            x_height: raw.x_height / upem,
            em_size: 1.0,
        }
    }
}

impl FontInstance for FontFace {
    fn family(&self) -> &str {
        &self.family
    }

    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn advance(&self, glyph: u32, vertical: bool) -> f32 {
        let Ok(id) = u16::try_from(glyph) else {
            return 0.0;
        };
        let glyph_metrics = self.as_swash_ref().glyph_metrics(&[]).scale(1.0);
        if vertical {
            glyph_metrics.advance_height(id)
        } else {
            glyph_metrics.advance_width(id)
        }
    }

    fn glyph_outline(&self, glyph: u32) -> Option<Path> {
        let id = u16::try_from(glyph).ok()?;
        let mut context = ScaleContext::new();
        let font = self.as_swash_ref();
        let mut scaler = context.builder(font).size(1.0).build();
        let outline = scaler.scale_outline(id)?;

        // swash outlines are y-up; flip into layout space.
        let mut builder = Path::builder();
        let mut open = false;
        for command in outline.path().commands() {
            match command {
                Command::MoveTo(p) => {
                    if open {
                        builder.end(false);
                    }
                    builder.begin(point(p.x, -p.y));
                    open = true;
                }
                Command::LineTo(p) => {
                    builder.line_to(point(p.x, -p.y));
                }
                Command::QuadTo(c, p) => {
                    builder.quadratic_bezier_to(point(c.x, -c.y), point(p.x, -p.y));
                }
                Command::CurveTo(c1, c2, p) => {
                    builder.cubic_bezier_to(
                        point(c1.x, -c1.y),
                        point(c2.x, -c2.y),
                        point(p.x, -p.y),
                    );
                }
                Command::Close => {
                    if open {
                        builder.end(true);
                        open = false;
                    }
                }
            }
        }
        if open {
            builder.end(false);
        }
        Some(builder.build())
    }

    fn has_vertical_metrics(&self) -> bool {
        self.has_vertical_metrics
    }

    fn glyph_index(&self, ch: char) -> Option<u32> {
        let id = self.as_swash_ref().charmap().map(ch);
        (id != 0).then_some(u32::from(id))
    }

    fn shape(&self, text: &str, request: &ShapeRequest<'_>) -> Vec<RawGlyph> {
        shape_with_harfrust(&self.data, self.index, self.units_per_em, text, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_data() {
        let err = FontFace::from_vec(vec![0u8; 16], 0, "Broken").unwrap_err();
        assert!(matches!(err, FontError::InvalidFont));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = FontFace::from_path("/nonexistent/font.ttf", 0, "Missing").unwrap_err();
        assert!(matches!(err, FontError::Io(_)));
    }
}
