//! Cursor movement, caret geometry and hit testing over a finished layout.
//!
//! A cursor position `i` sits before character `i`; `characters.len()` is
//! the position after the last character.

use lyon_path::math::Point;

use super::BlockProgression;
use super::output::LayoutResult;
use crate::style::Direction;

/// Caret geometry in document space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorRect {
    /// Top end of the caret (the line's ascent side).
    pub x: f32,
    pub y: f32,
    /// Length of the caret, the line height.
    pub height: f32,
    /// Radians, clockwise from pointing straight down.
    pub rotation: f32,
}

impl CursorRect {
    /// Create a new cursor rectangle.
    pub fn new(x: f32, y: f32, height: f32, rotation: f32) -> Self {
        Self {
            x,
            y,
            height,
            rotation,
        }
    }
}

/// Result of a hit test operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTestResult {
    /// Cursor position nearest to the point.
    pub position: usize,
    /// Line index containing this position.
    pub line_index: usize,
}

impl HitTestResult {
    /// Create a new hit test result.
    pub fn new(position: usize, line_index: usize) -> Self {
        Self {
            position,
            line_index,
        }
    }
}

/// Hit test policy for handling points outside the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitTestPolicy {
    /// Clamp to the nearest valid position within the text.
    #[default]
    Clamp,
    /// Return None if the point is outside the text bounds.
    Strict,
}

impl LayoutResult {
    /// Progression shared by every span; the first one decides.
    pub fn block_progression(&self) -> BlockProgression {
        self.spans
            .first()
            .map_or(BlockProgression::TopToBottom, |s| s.block_progression)
    }

    /// Line a cursor position is displayed on.
    pub fn line_of_position(&self, position: usize) -> Option<usize> {
        if position < self.characters.len() {
            self.line_of_char(position)
        } else {
            self.lines.len().checked_sub(1)
        }
    }

    fn edges(&self, character: usize) -> (f32, f32) {
        let c = &self.characters[character];
        let span = &self.spans[c.in_span];
        let left = span.x_start + c.x;
        match span.direction {
            Direction::LeftToRight => (left, left + c.width),
            Direction::RightToLeft => (left + c.width, left),
        }
    }

    /// Inline position of the caret at `position` when shown on `line`.
    fn caret_inline(&self, position: usize, line: usize) -> f32 {
        let chars = self.line_chars(line);
        if chars.contains(&position) {
            self.edges(position).0
        } else if !chars.is_empty() {
            self.edges(chars.end - 1).1
        } else {
            self.chunks
                .iter()
                .find(|c| c.in_line == line)
                .map_or(0.0, |c| c.left_x)
        }
    }

    /// Cursor positions a caret can rest at on `line`.
    fn line_positions(&self, line: usize) -> Vec<usize> {
        let chars = self.line_chars(line);
        let mut positions: Vec<usize> = chars
            .clone()
            .filter(|&i| self.characters[i].attributes.is_cursor_position)
            .collect();
        let ends_in_white = chars
            .clone()
            .last()
            .is_some_and(|i| self.characters[i].attributes.is_white);
        if chars.end == self.characters.len() || !ends_in_white {
            positions.push(chars.end);
        }
        positions
    }

    fn nearest_on_line(&self, line: usize, inline: f32) -> usize {
        self.line_positions(line)
            .into_iter()
            .min_by(|&a, &b| {
                let da = (self.caret_inline(a, line) - inline).abs();
                let db = (self.caret_inline(b, line) - inline).abs();
                da.total_cmp(&db)
            })
            .unwrap_or_else(|| self.line_chars(line).start)
    }

    /// Caret for `position`, standing across its line.
    ///
    /// On path-fitted text the caret follows the glyph of the character it
    /// precedes.
    pub fn cursor_rect(&self, position: usize) -> Option<CursorRect> {
        if position > self.characters.len() {
            return None;
        }
        let line_index = self.line_of_position(position)?;
        let line = &self.lines[line_index];
        let progression = self.block_progression();
        let (bx, by) = progression.to_doc(0.0, 1.0);
        let rotation = (-bx).atan2(by);
        let height = line.line_height.line_height();

        let glyph = self
            .characters
            .get(position)
            .and_then(|c| c.in_glyph)
            .map(|g| &self.glyphs[g]);
        if let Some(glyph) = glyph.filter(|_| self.path_fitted) {
            let (sin, cos) = glyph.rotation.sin_cos();
            let (ux, uy) = progression.to_doc(0.0, -line.line_height.ascent);
            return Some(CursorRect::new(
                glyph.x + ux * cos - uy * sin,
                glyph.y + ux * sin + uy * cos,
                height,
                rotation + glyph.rotation,
            ));
        }

        let inline = self.caret_inline(position, line_index);
        let (x, y) = progression.to_doc(inline, line.top());
        Some(CursorRect::new(x, y, height, rotation))
    }

    /// Cursor position nearest to a document point.
    pub fn hit_test(&self, point: Point, policy: HitTestPolicy) -> Option<HitTestResult> {
        let (inline, block) = self.block_progression().from_doc(point.x, point.y);
        let visible = (0..self.lines.len()).filter(|&l| !self.lines[l].hidden);

        let inside = visible.clone().find(|&l| {
            let line = &self.lines[l];
            block >= line.top() && block <= line.bottom()
        });
        let line = match (inside, policy) {
            (Some(line), _) => line,
            (None, HitTestPolicy::Strict) => return None,
            (None, HitTestPolicy::Clamp) => visible.min_by(|&a, &b| {
                let da = distance_to_line(&self.lines[a], block);
                let db = distance_to_line(&self.lines[b], block);
                da.total_cmp(&db)
            })?,
        };

        if policy == HitTestPolicy::Strict {
            let chars = self.line_chars(line);
            let (min, max) = chars.fold((f32::MAX, f32::MIN), |(min, max), i| {
                let (a, b) = self.edges(i);
                (min.min(a.min(b)), max.max(a.max(b)))
            });
            if inline < min || inline > max {
                return None;
            }
        }
        Some(HitTestResult::new(self.nearest_on_line(line, inline), line))
    }
}

fn distance_to_line(line: &super::output::Line, block: f32) -> f32 {
    if block < line.top() {
        line.top() - block
    } else {
        (block - line.bottom()).max(0.0)
    }
}

/// A movable cursor over a layout.
///
/// Movement methods return whether the cursor moved.
#[derive(Debug, Clone)]
pub struct LayoutCursor<'a> {
    layout: &'a LayoutResult,
    position: usize,
    /// Inline position kept while moving between lines.
    x_coordinate: Option<f32>,
}

impl<'a> LayoutCursor<'a> {
    pub fn new(layout: &'a LayoutResult) -> Self {
        Self::at(layout, 0)
    }

    /// Cursor at `position`, clamped to the text.
    pub fn at(layout: &'a LayoutResult, position: usize) -> Self {
        Self {
            layout,
            position: position.min(layout.characters.len()),
            x_coordinate: None,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position == self.layout.characters.len()
    }

    pub fn rect(&self) -> Option<CursorRect> {
        self.layout.cursor_rect(self.position)
    }

    fn set(&mut self, position: usize) -> bool {
        self.x_coordinate = None;
        let moved = position != self.position;
        self.position = position;
        moved
    }

    fn seek_forward(&mut self, pred: impl Fn(&crate::unicode::CharAttributes) -> bool) -> bool {
        let chars = &self.layout.characters;
        let target = (self.position + 1..chars.len())
            .find(|&i| pred(&chars[i].attributes))
            .unwrap_or(chars.len());
        self.set(target)
    }

    fn seek_backward(&mut self, pred: impl Fn(&crate::unicode::CharAttributes) -> bool) -> bool {
        let chars = &self.layout.characters;
        let target = (0..self.position)
            .rev()
            .find(|&i| pred(&chars[i].attributes))
            .unwrap_or(0);
        self.set(target)
    }

    pub fn next_character(&mut self) -> bool {
        let end = self.layout.characters.len();
        self.set((self.position + 1).min(end))
    }

    pub fn prev_character(&mut self) -> bool {
        self.set(self.position.saturating_sub(1))
    }

    pub fn next_cursor_position(&mut self) -> bool {
        self.seek_forward(|a| a.is_cursor_position)
    }

    pub fn prev_cursor_position(&mut self) -> bool {
        self.seek_backward(|a| a.is_cursor_position)
    }

    pub fn next_start_of_word(&mut self) -> bool {
        self.seek_forward(|a| a.is_word_start)
    }

    pub fn prev_start_of_word(&mut self) -> bool {
        self.seek_backward(|a| a.is_word_start)
    }

    pub fn this_start_of_line(&mut self) -> bool {
        let Some(line) = self.layout.line_of_position(self.position) else {
            return false;
        };
        self.set(self.layout.line_chars(line).start)
    }

    /// Move to the end of the current line, before the whitespace a wrapped
    /// line ends in.
    pub fn this_end_of_line(&mut self) -> bool {
        let Some(line) = self.layout.line_of_position(self.position) else {
            return false;
        };
        let target = self
            .layout
            .line_positions(line)
            .last()
            .copied()
            .unwrap_or(self.position);
        self.set(target)
    }

    pub fn next_line(&mut self) -> bool {
        self.move_lines(1)
    }

    pub fn prev_line(&mut self) -> bool {
        self.move_lines(-1)
    }

    fn move_lines(&mut self, delta: isize) -> bool {
        let Some(line) = self.layout.line_of_position(self.position) else {
            return false;
        };
        let Some(target) = line
            .checked_add_signed(delta)
            .filter(|&l| l < self.layout.lines.len())
        else {
            return false;
        };
        let x = *self
            .x_coordinate
            .get_or_insert_with(|| self.layout.caret_inline(self.position, line));
        let position = self.layout.nearest_on_line(target, x);
        let moved = position != self.position;
        self.position = position;
        moved
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
    use crate::layout::{FlowLayout, WrapShape};
    use crate::style::{Style, WritingMode};

    fn laid_out(text: &str, style: Style, width: Option<f32>) -> LayoutResult {
        let mut input = FlowInput::new();
        input.append_text(TextSource::new(text, Arc::new(style)));
        if let Some(width) = width {
            input.append_wrap_shape(WrapShape::rect(0.0, 0.0, width, 100.0));
        }
        FlowLayout::new(&FixedFontProvider::default())
            .layout(&input)
            .unwrap()
    }

    /// "aaa bbb " on the first line, "ccc" on the second.
    fn two_lines() -> LayoutResult {
        laid_out("aaa bbb ccc", Style::new("Fixed", 10.0), Some(35.0))
    }

    #[test]
    fn character_steps_stop_at_the_ends() {
        let layout = two_lines();
        let mut cursor = LayoutCursor::new(&layout);
        assert!(!cursor.prev_character());
        assert!(cursor.next_character());
        assert_eq!(cursor.position(), 1);

        let mut cursor = LayoutCursor::at(&layout, 99);
        assert!(cursor.is_at_end());
        assert!(!cursor.next_character());
        assert!(cursor.prev_cursor_position());
        assert_eq!(cursor.position(), 10);
    }

    #[test]
    fn word_starts() {
        let layout = two_lines();
        let mut cursor = LayoutCursor::new(&layout);
        let mut seen = Vec::new();
        while cursor.next_start_of_word() {
            seen.push(cursor.position());
        }
        assert_eq!(seen, vec![4, 8, 11]);
        assert!(cursor.prev_start_of_word());
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn line_start_and_end() {
        let layout = two_lines();
        let mut cursor = LayoutCursor::at(&layout, 9);
        assert!(cursor.this_start_of_line());
        assert_eq!(cursor.position(), 8);
        assert!(cursor.this_end_of_line());
        assert_eq!(cursor.position(), 11);

        let mut cursor = LayoutCursor::at(&layout, 2);
        assert!(cursor.this_end_of_line());
        assert_eq!(cursor.position(), 7);
    }

    #[test]
    fn vertical_moves_keep_the_inline_position() {
        let layout = two_lines();
        let mut cursor = LayoutCursor::at(&layout, 2);
        assert!(cursor.next_line());
        assert_eq!(cursor.position(), 10);
        assert!(!cursor.next_line());
        assert!(cursor.prev_line());
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn caret_rects() {
        let layout = two_lines();
        let rect = layout.cursor_rect(9).unwrap();
        assert_eq!(rect, CursorRect::new(5.0, 10.0, 10.0, 0.0));
        assert_eq!(layout.cursor_rect(11).unwrap().x, 15.0);
        assert!(layout.cursor_rect(12).is_none());
    }

    #[test]
    fn rtl_caret_sits_on_the_right_edge() {
        let style = Style::new("Fixed", 10.0).with_direction(Direction::RightToLeft);
        let layout = laid_out("אבג", style, Some(100.0));
        assert_eq!(layout.cursor_rect(0).unwrap().x, 100.0);
        assert_eq!(layout.cursor_rect(3).unwrap().x, 85.0);
    }

    #[test]
    fn vertical_caret_is_turned() {
        let style = Style::new("Fixed", 10.0).with_writing_mode(WritingMode::VerticalRl);
        let layout = laid_out("ab", style, None);
        let rect = layout.cursor_rect(0).unwrap();
        assert!((rect.rotation - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn hit_testing() {
        let layout = two_lines();
        let hit = layout.hit_test(point(6.0, 15.0), HitTestPolicy::Clamp).unwrap();
        assert_eq!(hit, HitTestResult::new(9, 1));

        assert_eq!(
            layout.hit_test(point(500.0, 15.0), HitTestPolicy::Clamp),
            Some(HitTestResult::new(11, 1))
        );
        assert_eq!(layout.hit_test(point(500.0, 15.0), HitTestPolicy::Strict), None);

        assert_eq!(
            layout.hit_test(point(0.0, -50.0), HitTestPolicy::Clamp),
            Some(HitTestResult::new(0, 0))
        );
        assert_eq!(layout.hit_test(point(0.0, -50.0), HitTestPolicy::Strict), None);
    }

    #[test]
    fn empty_layout_has_no_caret() {
        let layout = LayoutResult::default();
        assert!(layout.cursor_rect(0).is_none());
        assert!(layout.hit_test(point(0.0, 0.0), HitTestPolicy::Clamp).is_none());
        let mut cursor = LayoutCursor::new(&layout);
        assert!(!cursor.next_line());
        assert!(!cursor.this_start_of_line());
    }

    #[test]
    fn hit_test_policy_default() {
        assert_eq!(HitTestPolicy::default(), HitTestPolicy::Clamp);
    }
}
