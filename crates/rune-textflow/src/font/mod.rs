pub mod face;
pub mod fixed;
pub mod loader;
pub mod metrics;

use core::fmt;
use std::sync::Arc;

use lyon_path::Path;
use lyon_path::math::{Box2D, point};

use crate::shaping::{RawGlyph, ShapeRequest};
use crate::style::Style;

pub use face::FontFace;
pub use fixed::{FixedFont, FixedFontProvider};
pub use loader::FontDbProvider;
pub use metrics::{BaselineKind, BaselineTable, FontMetrics};

/// A font resolved for one style, ready to measure and shape text.
///
/// All lengths are per em: callers multiply by the font size. Outlines and
/// ink boxes use a y-down coordinate system with the origin on the
/// alphabetic baseline.
pub trait FontInstance: fmt::Debug + Send + Sync {
    /// Family name, used by queries over the laid-out result.
    fn family(&self) -> &str;

    fn metrics(&self) -> FontMetrics;

    /// Advance of `glyph` along the horizontal or vertical axis.
    fn advance(&self, glyph: u32, vertical: bool) -> f32;

    fn baseline_table(&self) -> BaselineTable {
        BaselineTable::from_metrics(&self.metrics())
    }

    fn glyph_outline(&self, glyph: u32) -> Option<Path>;

    /// Ink box of `glyph`. The default uses the control box of its outline.
    fn glyph_bounds(&self, glyph: u32) -> Option<Box2D> {
        self.glyph_outline(glyph)
            .as_ref()
            .and_then(path_control_box)
    }

    fn has_vertical_metrics(&self) -> bool;

    /// Nominal glyph for a character, if the font maps it.
    fn glyph_index(&self, ch: char) -> Option<u32>;

    /// Shape `text` into glyphs.
    ///
    /// Clusters are byte offsets into `text`. Right-to-left requests may
    /// come back in visual order; the span builder restores logical order.
    fn shape(&self, text: &str, request: &ShapeRequest<'_>) -> Vec<RawGlyph>;
}

/// Resolves style records to font instances.
///
/// Providers are shared read-only between layout calls and must tolerate
/// concurrent lookups.
pub trait FontProvider: Send + Sync {
    fn resolve(&self, style: &Style) -> Option<Arc<dyn FontInstance>>;
}

/// Control-point bounding box of a path.
pub fn path_control_box(path: &Path) -> Option<Box2D> {
    use lyon_path::Event;

    let mut min = point(f32::MAX, f32::MAX);
    let mut max = point(f32::MIN, f32::MIN);
    let mut any = false;
    let mut add = |p: lyon_path::math::Point| {
        min = min.min(p);
        max = max.max(p);
        any = true;
    };
    for event in path.iter() {
        match event {
            Event::Begin { at } => add(at),
            Event::Line { to, .. } => add(to),
            Event::Quadratic { ctrl, to, .. } => {
                add(ctrl);
                add(to);
            }
            Event::Cubic {
                ctrl1, ctrl2, to, ..
            } => {
                add(ctrl1);
                add(ctrl2);
                add(to);
            }
            Event::End { .. } => {}
        }
    }
    any.then(|| Box2D::new(min, max))
}

/// Errors that can occur while loading fonts.
#[derive(Debug)]
pub enum FontError {
    Io(std::io::Error),
    InvalidFont,
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Io(err) => write!(f, "font I/O error: {err}"),
            FontError::InvalidFont => write!(f, "invalid font data"),
        }
    }
}

impl std::error::Error for FontError {}

impl From<std::io::Error> for FontError {
    fn from(err: std::io::Error) -> Self {
        FontError::Io(err)
    }
}

/// Convenient result alias for font-related operations.
pub type Result<T> = std::result::Result<T, FontError>;
