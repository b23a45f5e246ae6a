use unicode_linebreak::{BreakOpportunity, linebreaks};
use unicode_segmentation::UnicodeSegmentation;

/// Segmentation attributes of one character position.
///
/// Break and boundary flags describe the position *before* the character,
/// so a paragraph of `n` characters has `n + 1` entries; the last one
/// stands for the end of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharAttributes {
    /// A line may break before this character.
    pub is_line_break: bool,
    /// A line must break before this character.
    pub is_mandatory_break: bool,
    /// An emergency break is allowed before this character.
    pub is_char_break: bool,
    pub is_white: bool,
    /// A cursor may sit before this character (grapheme boundary).
    pub is_cursor_position: bool,
    pub is_word_start: bool,
    /// A word ends before this character.
    pub is_word_end: bool,
    pub is_sentence_start: bool,
    pub is_sentence_end: bool,
    /// Justification may stretch this character.
    pub is_expandable_space: bool,
    pub is_soft_hyphen: bool,
}

/// Compute per-character attributes for a paragraph of text.
///
/// Line breaking follows UAX-14 via `unicode-linebreak`; cursor positions,
/// words and sentences follow UAX-29 via `unicode-segmentation`. The
/// implicit break at the end of the text is an opportunity, never a
/// mandatory break.
pub fn compute_char_attributes(text: &str) -> Vec<CharAttributes> {
    let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let char_count = offsets.len();
    let mut attrs = vec![CharAttributes::default(); char_count + 1];

    // Byte offset -> char index; the end of text maps to `char_count`.
    let index_of = |byte: usize| -> Option<usize> {
        if byte == text.len() {
            Some(char_count)
        } else {
            offsets.binary_search(&byte).ok()
        }
    };

    for (i, ch) in text.chars().enumerate() {
        let attr = &mut attrs[i];
        attr.is_white = ch.is_whitespace();
        attr.is_expandable_space = matches!(ch, ' ' | '\t' | '\u{3000}');
        attr.is_soft_hyphen = ch == '\u{ad}';
    }

    for (byte, _) in text.grapheme_indices(true) {
        if let Some(i) = index_of(byte) {
            attrs[i].is_cursor_position = true;
            attrs[i].is_char_break = i > 0;
        }
    }
    attrs[char_count].is_cursor_position = true;
    attrs[char_count].is_char_break = char_count > 0;

    for (byte, opportunity) in linebreaks(text) {
        let Some(i) = index_of(byte) else {
            continue;
        };
        attrs[i].is_line_break = true;
        if i < char_count && opportunity == BreakOpportunity::Mandatory {
            attrs[i].is_mandatory_break = true;
        }
    }

    for (byte, segment) in text.split_word_bound_indices() {
        if !segment.chars().any(char::is_alphanumeric) {
            continue;
        }
        if let Some(start) = index_of(byte) {
            attrs[start].is_word_start = true;
        }
        if let Some(end) = index_of(byte + segment.len()) {
            attrs[end].is_word_end = true;
        }
    }

    for (byte, segment) in text.split_sentence_bound_indices() {
        if let Some(start) = index_of(byte) {
            attrs[start].is_sentence_start = true;
        }
        if let Some(end) = index_of(byte + segment.len()) {
            attrs[end].is_sentence_end = true;
        }
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_after_space() {
        let attrs = compute_char_attributes("ab cd");
        assert_eq!(attrs.len(), 6);
        // Break opportunity before 'c'.
        assert!(attrs[3].is_line_break);
        assert!(!attrs[1].is_line_break);
        assert!(attrs[2].is_white);
    }

    #[test]
    fn newline_forces_break_after_it() {
        let attrs = compute_char_attributes("a\nb");
        assert!(attrs[2].is_mandatory_break);
        assert!(!attrs[1].is_mandatory_break);
    }

    #[test]
    fn end_of_text_is_not_mandatory() {
        for text in ["a", "ab", "abc d", "x\ny"] {
            let attrs = compute_char_attributes(text);
            let last = attrs.last().unwrap();
            assert!(!last.is_mandatory_break, "{text:?}");
            assert!(last.is_line_break, "{text:?}");
            assert!(last.is_cursor_position);
        }
    }

    #[test]
    fn combining_mark_is_not_a_cursor_position() {
        let attrs = compute_char_attributes("a\u{301}b");
        assert!(attrs[0].is_cursor_position);
        assert!(!attrs[1].is_cursor_position);
        assert!(attrs[2].is_cursor_position);
        assert!(!attrs[1].is_char_break);
    }

    #[test]
    fn words_and_sentences() {
        let text = "Hello, world. Bye";
        let attrs = compute_char_attributes(text);
        assert!(attrs[0].is_word_start);
        assert!(attrs[5].is_word_end);
        assert!(attrs[7].is_word_start);
        assert!(attrs[0].is_sentence_start);
        assert!(attrs[14].is_sentence_start);
        assert!(attrs[text.chars().count()].is_word_end);
    }

    #[test]
    fn empty_text_has_one_entry() {
        let attrs = compute_char_attributes("");
        assert_eq!(attrs.len(), 1);
        assert!(attrs[0].is_cursor_position);
        assert!(!attrs[0].is_char_break);
    }
}
