//! Scanline makers hand the line breaker the horizontal runs a line box
//! fits into.
//!
//! Coordinates here are line-space: `x` runs along the inline axis and `y`
//! along the block axis, whatever the writing mode.

use core::fmt;

use lyon_path::math::point;

use crate::font::FontMetrics;

use super::BlockProgression;
use super::shape::WrapShape;

/// One horizontal run a line can occupy. `y` is the top of the line box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanRun {
    pub x_start: f32,
    pub x_end: f32,
    pub y: f32,
}

impl ScanRun {
    pub fn width(&self) -> f32 {
        self.x_end - self.x_start
    }
}

pub trait ScanlineMaker: fmt::Debug {
    /// Runs where a line box of `line_height` fits at the current position.
    /// An empty result means the region is exhausted.
    fn make_scanline(&mut self, line_height: &FontMetrics) -> Vec<ScanRun>;

    /// Move below the line most recently handed out.
    fn complete_line(&mut self);

    fn y(&self) -> f32;

    /// Move the top of the next line to `y`.
    fn set_new_y(&mut self, y: f32);

    /// True when the current line can grow taller without new runs.
    fn can_extend_current_scanline(&self) -> bool;

    fn set_line_height(&mut self, line_height: &FontMetrics);

    /// False when lines have no end along the inline axis.
    fn is_constrained(&self) -> bool;
}

/// Lines of unbounded width starting at a fixed inline position.
#[derive(Debug, Clone)]
pub struct InfiniteScanlineMaker {
    x: f32,
    y: f32,
    current_line_height: FontMetrics,
}

impl InfiniteScanlineMaker {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            current_line_height: FontMetrics::default(),
        }
    }
}

impl ScanlineMaker for InfiniteScanlineMaker {
    fn make_scanline(&mut self, line_height: &FontMetrics) -> Vec<ScanRun> {
        self.current_line_height = *line_height;
        vec![ScanRun {
            x_start: self.x,
            x_end: f32::INFINITY,
            y: self.y,
        }]
    }

    fn complete_line(&mut self) {
        self.y += self.current_line_height.line_height();
    }

    fn y(&self) -> f32 {
        self.y
    }

    fn set_new_y(&mut self, y: f32) {
        self.y = y;
    }

    fn can_extend_current_scanline(&self) -> bool {
        true
    }

    fn set_line_height(&mut self, line_height: &FontMetrics) {
        self.current_line_height = *line_height;
    }

    fn is_constrained(&self) -> bool {
        false
    }
}

/// Runs inside a wrap shape, walked top to bottom.
#[derive(Debug, Clone)]
pub struct ShapeScanlineMaker {
    shape: WrapShape,
    top: f32,
    bottom: f32,
    y: f32,
    current_line_height: FontMetrics,
    epsilon: f32,
}

impl ShapeScanlineMaker {
    /// `shape` is in document coordinates; it is mapped into line space for
    /// `progression`.
    pub fn new(shape: &WrapShape, progression: BlockProgression, epsilon: f32) -> Self {
        let shape = shape.map_points(|p| {
            let (inline, block) = progression.from_doc(p.x, p.y);
            point(inline, block)
        });
        let (top, bottom) = shape
            .bounds()
            .map_or((0.0, 0.0), |b| (b.min.y, b.max.y));
        tracing::trace!(top, bottom, "scanline maker over shape");
        Self {
            shape,
            top,
            bottom,
            y: top,
            current_line_height: FontMetrics::default(),
            epsilon,
        }
    }

    fn step(&self, line_height: f32) -> f32 {
        (line_height * 0.25)
            .max((self.bottom - self.top) / 1024.0)
            .max(self.epsilon)
    }
}

impl ScanlineMaker for ShapeScanlineMaker {
    fn make_scanline(&mut self, line_height: &FontMetrics) -> Vec<ScanRun> {
        self.current_line_height = *line_height;
        let height = line_height.line_height().max(0.0);
        loop {
            if self.y + height > self.bottom + self.epsilon || self.y >= self.bottom {
                return Vec::new();
            }
            let runs: Vec<ScanRun> = self
                .shape
                .band_intervals(self.y, self.y + height)
                .into_iter()
                .filter(|(start, end)| end - start > self.epsilon)
                .map(|(x_start, x_end)| ScanRun {
                    x_start,
                    x_end,
                    y: self.y,
                })
                .collect();
            if !runs.is_empty() {
                return runs;
            }
            self.y += self.step(height);
        }
    }

    fn complete_line(&mut self) {
        self.y += self.current_line_height.line_height();
    }

    fn y(&self) -> f32 {
        self.y
    }

    fn set_new_y(&mut self, y: f32) {
        self.y = y;
    }

    fn can_extend_current_scanline(&self) -> bool {
        false
    }

    fn set_line_height(&mut self, line_height: &FontMetrics) {
        self.current_line_height = *line_height;
    }

    fn is_constrained(&self) -> bool {
        true
    }
}
