//! Splits the input stream into paragraphs and each paragraph into items
//! of uniform font, direction and script.

use std::ops::Range;
use std::sync::Arc;

use unicode_script::Script;

use crate::bidi::{BaseDirection, paragraph_levels};
use crate::font::{FontInstance, FontProvider};
use crate::input::{ControlCode, InputItem};
use crate::style::{Alignment, Direction, Style, TextAlign};
use crate::unicode::{CharAttributes, compute_char_attributes, resolve_scripts};

/// Fonts resolved for every text source, deduplicated.
#[derive(Debug, Default)]
pub(crate) struct FontTable {
    pub fonts: Vec<Arc<dyn FontInstance>>,
    per_input: Vec<Option<usize>>,
}

impl FontTable {
    pub fn resolve(items: &[InputItem], provider: &dyn FontProvider) -> Self {
        let mut table = FontTable::default();
        for (index, item) in items.iter().enumerate() {
            let font = item.as_text().and_then(|source| {
                let Some(font) = provider.resolve(&source.style) else {
                    tracing::warn!(
                        input = index,
                        family = ?source.style.font_family,
                        "no font for text source, its text is skipped"
                    );
                    return None;
                };
                Some(table.intern(font))
            });
            table.per_input.push(font);
        }
        table
    }

    fn intern(&mut self, font: Arc<dyn FontInstance>) -> usize {
        let ptr = Arc::as_ptr(&font) as *const ();
        if let Some(i) = self
            .fonts
            .iter()
            .position(|f| Arc::as_ptr(f) as *const () == ptr)
        {
            return i;
        }
        self.fonts.push(font);
        self.fonts.len() - 1
    }

    pub fn font_of(&self, input: usize) -> Option<usize> {
        self.per_input.get(input).copied().flatten()
    }

    pub fn get(&self, index: usize) -> &Arc<dyn FontInstance> {
        &self.fonts[index]
    }
}

/// One input item's share of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceRange {
    pub input_index: usize,
    /// Character range in the paragraph text.
    pub chars: Range<usize>,
    /// Set for arbitrary gaps: width, ascent, descent.
    pub gap: Option<(f32, f32, f32)>,
}

/// A run of characters sharing font, embedding level and script.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Item {
    pub chars: Range<usize>,
    pub input_index: usize,
    pub font: Option<usize>,
    pub level: u8,
    pub script: Script,
}

impl Item {
    pub fn direction(&self) -> Direction {
        Direction::from_level(self.level)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ItemizedParagraph {
    pub text: String,
    pub chars: Vec<char>,
    /// Byte offset of every character plus the end of the text.
    pub char_offsets: Vec<usize>,
    /// `chars.len() + 1` entries.
    pub attributes: Vec<CharAttributes>,
    pub sources: Vec<SourceRange>,
    pub items: Vec<Item>,
    pub direction: Direction,
    pub alignment: Alignment,
    /// First input item after this paragraph.
    pub next_input: usize,
    /// The control code that ended the paragraph, if any.
    pub terminator: Option<ControlCode>,
}

impl ItemizedParagraph {
    pub fn byte_range(&self, chars: &Range<usize>) -> Range<usize> {
        self.char_offsets[chars.start]..self.char_offsets[chars.end]
    }
}

/// Gather the paragraph starting at input item `start`.
///
/// `after_break` marks a paragraph that follows a paragraph break; its
/// first character then carries a mandatory break.
pub(crate) fn itemize_paragraph(
    items: &[InputItem],
    start: usize,
    fonts: &FontTable,
    after_break: bool,
) -> ItemizedParagraph {
    let mut text = String::new();
    let mut sources = Vec::new();
    let mut char_count = 0;
    let mut first_style: Option<&Arc<Style>> = None;
    let mut terminator = None;
    let mut index = start;

    while index < items.len() {
        match &items[index] {
            InputItem::Text(source) => {
                let n = source.text.chars().count();
                first_style.get_or_insert(&source.style);
                text.push_str(&source.text);
                sources.push(SourceRange {
                    input_index: index,
                    chars: char_count..char_count + n,
                    gap: None,
                });
                char_count += n;
            }
            InputItem::Control(ControlCode::ArbitraryGap {
                width,
                ascent,
                descent,
            }) => sources.push(SourceRange {
                input_index: index,
                chars: char_count..char_count,
                gap: Some((*width, *ascent, *descent)),
            }),
            InputItem::Control(code) => {
                terminator = Some(*code);
                index += 1;
                break;
            }
        }
        index += 1;
    }

    let base = BaseDirection::from(first_style.and_then(|s| s.direction));
    let levels = paragraph_levels(&text, base);
    let scripts = resolve_scripts(&text);
    let mut attributes = compute_char_attributes(&text);
    if after_break && char_count > 0 {
        attributes[0].is_mandatory_break = true;
        attributes[0].is_line_break = true;
    }

    let mut char_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    char_offsets.push(text.len());
    let chars: Vec<char> = text.chars().collect();

    let mut runs: Vec<Item> = Vec::new();
    for source in &sources {
        let font = fonts.font_of(source.input_index);
        for c in source.chars.clone() {
            let level = levels.levels.get(char_offsets[c]).copied().unwrap_or(0);
            let script = scripts[c];
            match runs.last_mut() {
                Some(item)
                    if item.input_index == source.input_index
                        && item.level == level
                        && item.script == script
                        && item.chars.end == c =>
                {
                    item.chars.end = c + 1;
                }
                _ => runs.push(Item {
                    chars: c..c + 1,
                    input_index: source.input_index,
                    font,
                    level,
                    script,
                }),
            }
        }
    }

    let alignment = first_style
        .map_or(TextAlign::Start, |s| s.text_align)
        .resolve(levels.direction);
    tracing::trace!(
        chars = char_count,
        items = runs.len(),
        direction = ?levels.direction,
        "itemized paragraph"
    );

    ItemizedParagraph {
        text,
        chars,
        char_offsets,
        attributes,
        sources,
        items: runs,
        direction: levels.direction,
        alignment,
        next_input: index,
        terminator,
    }
}
