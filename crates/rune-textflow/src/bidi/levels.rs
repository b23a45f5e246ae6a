use unicode_bidi::{BidiInfo, LTR_LEVEL, Level, RTL_LEVEL};

use crate::style::Direction;

/// Base direction hint for paragraph analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseDirection {
    /// Detect paragraph base direction from text (first strong char).
    #[default]
    Auto,
    /// Force overall left-to-right base direction.
    Ltr,
    /// Force overall right-to-left base direction.
    Rtl,
}

impl BaseDirection {
    pub fn to_level(self) -> Option<Level> {
        match self {
            BaseDirection::Auto => None,
            BaseDirection::Ltr => Some(LTR_LEVEL),
            BaseDirection::Rtl => Some(RTL_LEVEL),
        }
    }
}

impl From<Option<Direction>> for BaseDirection {
    fn from(direction: Option<Direction>) -> Self {
        match direction {
            None => BaseDirection::Auto,
            Some(Direction::LeftToRight) => BaseDirection::Ltr,
            Some(Direction::RightToLeft) => BaseDirection::Rtl,
        }
    }
}

/// Embedding levels of one layout paragraph.
#[derive(Debug, Clone)]
pub struct ParagraphLevels {
    /// Base direction of the paragraph.
    pub direction: Direction,
    /// Embedding level for each byte of the text. Multi-byte characters
    /// repeat their level for each byte.
    pub levels: Vec<u8>,
}

/// Run the Unicode BiDi algorithm (UAX-9) over one layout paragraph.
///
/// The text may contain embedded newlines; the base direction of the
/// first UAX-9 paragraph decides the direction of the whole layout
/// paragraph.
pub fn paragraph_levels(text: &str, base_dir: BaseDirection) -> ParagraphLevels {
    let info = BidiInfo::new(text, base_dir.to_level());
    let base_level = info
        .paragraphs
        .first()
        .map(|para| para.level)
        .or_else(|| base_dir.to_level())
        .unwrap_or(LTR_LEVEL);
    ParagraphLevels {
        direction: if base_level.is_rtl() {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        },
        levels: info.levels.iter().map(Level::number).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_paragraph_direction_auto() {
        // Hebrew + Latin
        let para = paragraph_levels("אבג abc", BaseDirection::Auto);
        assert_eq!(para.direction, Direction::RightToLeft);
    }

    #[test]
    fn base_direction_override_ltr() {
        let para = paragraph_levels("אבג abc", BaseDirection::Ltr);
        assert_eq!(para.direction, Direction::LeftToRight);
    }

    #[test]
    fn levels_cover_all_bytes() {
        let text = "a אב";
        let para = paragraph_levels(text, BaseDirection::Auto);
        assert_eq!(para.levels.len(), text.len());
    }

    #[test]
    fn mixed_ltr_with_rtl_segment_has_distinct_levels() {
        let para = paragraph_levels("abc אבג def", BaseDirection::Auto);
        let mut unique = para.levels.clone();
        unique.sort();
        unique.dedup();
        assert!(unique.len() >= 2);
    }

    #[test]
    fn empty_text_uses_hint() {
        let para = paragraph_levels("", BaseDirection::Rtl);
        assert_eq!(para.direction, Direction::RightToLeft);
        assert!(para.levels.is_empty());
        let para = paragraph_levels("", BaseDirection::Auto);
        assert_eq!(para.direction, Direction::LeftToRight);
    }
}
