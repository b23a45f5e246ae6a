use std::sync::Arc;

use rune_textflow::{
    ControlCode, Direction, FixedFont, FixedFontProvider, FlowInput, FlowLayout, LayoutResult,
    Result, Style, TextAlign, TextSource, WrapShape, WritingMode,
};

const EPSILON: f32 = 1e-3;

fn style(size: f32) -> Style {
    Style::new("Fixed", size)
}

fn source(text: &str, style: Style) -> TextSource {
    TextSource::new(text, Arc::new(style))
}

fn layout(input: &FlowInput) -> Result<LayoutResult> {
    FlowLayout::new(&FixedFontProvider::default()).layout(input)
}

/// A spread of inputs the general properties are checked against.
fn corpus() -> Vec<FlowInput> {
    let mut inputs = Vec::new();

    let mut wrapped = FlowInput::new();
    wrapped.append_text(source(
        "The quick brown fox jumps over the lazy dog. Pack my box with five dozen liquor jugs.",
        style(10.0),
    ));
    wrapped.append_wrap_shape(WrapShape::rect(0.0, 0.0, 120.0, 400.0));
    inputs.push(wrapped);

    let mut mixed = FlowInput::new();
    mixed.append_text(source("abc שלום עולם def", style(10.0)));
    mixed.append_text(source(" more text here", style(14.0)));
    mixed.append_wrap_shape(WrapShape::rect(0.0, 0.0, 80.0, 400.0));
    inputs.push(mixed);

    let mut rtl = FlowInput::new();
    rtl.append_text(source(
        "אבג דהו זחט יכל",
        style(10.0).with_direction(Direction::RightToLeft),
    ));
    rtl.append_wrap_shape(WrapShape::rect(0.0, 0.0, 40.0, 400.0));
    inputs.push(rtl);

    let mut paragraphs = FlowInput::new();
    paragraphs.append_text(source("first para", style(10.0).with_align(TextAlign::Center)));
    paragraphs.append_control(ControlCode::ParagraphBreak);
    paragraphs.append_text(source("second para is long", style(10.0)));
    paragraphs.append_control(ControlCode::ArbitraryGap {
        width: 12.0,
        ascent: 6.0,
        descent: 2.0,
    });
    paragraphs.append_text(source("tail", style(10.0)));
    paragraphs.append_wrap_shape(WrapShape::rect(0.0, 0.0, 70.0, 400.0));
    inputs.push(paragraphs);

    let mut hyphens = FlowInput::new();
    hyphens.append_text(source("extra\u{ad}ordinary hyphen\u{ad}ation", style(10.0)));
    hyphens.append_wrap_shape(WrapShape::rect(0.0, 0.0, 45.0, 400.0));
    inputs.push(hyphens);

    let mut justified = FlowInput::new();
    justified.append_text(source(
        "one two three four five six seven",
        style(10.0).with_align(TextAlign::Justify),
    ));
    justified.append_wrap_shape(WrapShape::rect(0.0, 0.0, 60.0, 400.0));
    inputs.push(justified);

    let mut positioned = FlowInput::new();
    positioned.append_text(source("shifted", style(10.0)).with_dx([1.0, 2.0, 3.0]));
    positioned.append_text(source(" unconstrained", style(12.0)).with_dy([0.0, 4.0]));
    inputs.push(positioned);

    let mut vertical = FlowInput::new();
    vertical.append_text(source(
        "vertical text flows down",
        style(10.0).with_writing_mode(WritingMode::VerticalRl),
    ));
    vertical.append_wrap_shape(WrapShape::rect(-200.0, 0.0, 200.0, 60.0));
    inputs.push(vertical);

    inputs
}

#[test]
fn characters_stay_in_logical_order() -> Result<()> {
    for input in corpus() {
        let result = layout(&input)?;
        for pair in result.characters.windows(2) {
            let (a, b) = (pair[0].source, pair[1].source);
            assert!(
                (a.input_item, a.byte_offset) < (b.input_item, b.byte_offset),
                "{a:?} before {b:?} in {:?}",
                result.text()
            );
        }
        for pair in result.glyphs.windows(2) {
            assert!(pair[0].in_character <= pair[1].in_character);
        }
    }
    Ok(())
}

#[test]
fn every_character_is_covered_once() -> Result<()> {
    for input in corpus() {
        let result = layout(&input)?;
        let expected: usize = input
            .items
            .iter()
            .filter_map(|item| item.as_text())
            .map(|s| s.text.chars().count())
            .sum();
        assert_eq!(result.characters.len(), expected);
        for (i, c) in result.characters.iter().enumerate() {
            assert!(c.in_span < result.spans.len());
            if let Some(g) = c.in_glyph {
                assert_eq!(result.glyphs[g].in_character, i);
            }
            let refs = result.char_refs(i).expect("character has references");
            assert_eq!(refs.glyph, c.in_glyph);
        }
        for glyph in &result.glyphs {
            assert!(glyph.in_character < result.characters.len());
        }
    }
    Ok(())
}

#[test]
fn relayout_is_identical() -> Result<()> {
    for input in corpus() {
        assert_eq!(layout(&input)?, layout(&input)?);
    }
    Ok(())
}

#[test]
fn chunks_fit_their_scan_runs_unless_flagged() -> Result<()> {
    for input in corpus() {
        let result = layout(&input)?;
        for chunk in &result.chunks {
            let line = &result.lines[chunk.in_line];
            if input.shapes.is_empty() || line.hidden {
                continue;
            }
            assert!(
                chunk.text_width <= chunk.scanrun_width + EPSILON,
                "{chunk:?} overflows in {:?}",
                result.text()
            );
        }
    }
    Ok(())
}

#[test]
fn lines_only_move_down_within_a_shape() -> Result<()> {
    for input in corpus() {
        let result = layout(&input)?;
        for pair in result.lines.windows(2) {
            if pair[0].in_shape != pair[1].in_shape || pair[1].hidden {
                continue;
            }
            assert!(pair[1].baseline_y >= pair[0].baseline_y, "{pair:?}");
        }
    }
    Ok(())
}

#[test]
fn only_justified_chunks_stretch() -> Result<()> {
    let mut stretched = 0;
    for input in corpus() {
        let result = layout(&input)?;
        for chunk in &result.chunks {
            let paragraph = result.lines[chunk.in_line].in_paragraph;
            if result.paragraphs[paragraph].alignment != rune_textflow::Alignment::Full {
                assert_eq!(chunk.add_to_each_whitespace, 0.0);
            } else if chunk.add_to_each_whitespace > 0.0 {
                stretched += 1;
            }
        }
    }
    assert!(stretched > 0);
    Ok(())
}

#[test]
fn simple_wrap_breaks_before_fox() -> Result<()> {
    // 12px at half an em per character: "The quick brown " is 96px.
    let mut input = FlowInput::new();
    input.append_text(source("The quick brown fox jumps", style(12.0)));
    input.append_wrap_shape(WrapShape::rect(0.0, 0.0, 96.0, 100.0));
    let result = layout(&input)?;

    assert_eq!(result.line_count(), 2);
    assert_eq!(result.line_chars(0), 0..16);
    assert_eq!(result.characters[16].ch, 'f');
    assert!(result.characters[16].attributes.is_line_break);
    assert_eq!(result.chunks[0].text_width, 90.0);
    assert!(result.glyphs.iter().all(|g| g.glyph_id != u32::from('-')));
    assert!(!result.truncated);
    Ok(())
}

#[test]
fn line_filling_the_run_before_a_space_keeps_its_word() -> Result<()> {
    // "aaa bbb" is exactly 35px; the space after it must not push "bbb" down.
    let mut input = FlowInput::new();
    input.append_text(source("aaa bbb ccc", style(10.0)));
    input.append_wrap_shape(WrapShape::rect(0.0, 0.0, 35.0, 100.0));
    let result = layout(&input)?;

    assert_eq!(result.line_count(), 2);
    assert_eq!(result.line_chars(0), 0..8);
    assert_eq!(result.line_chars(1), 8..11);
    assert_eq!(result.chunks[0].text_width, 35.0);
    Ok(())
}

#[test]
fn newline_forces_a_second_line() -> Result<()> {
    for width in [40.0, 500.0] {
        let mut input = FlowInput::new();
        input.append_text(source("Line1\nLine2", style(10.0)));
        input.append_wrap_shape(WrapShape::rect(0.0, 0.0, width, 100.0));
        let result = layout(&input)?;
        assert_eq!(result.line_count(), 2, "width {width}");
        assert!(result.characters[6].attributes.is_mandatory_break);
        assert_eq!(result.line_of_char(5), Some(0));
        assert_eq!(result.line_of_char(6), Some(1));
    }
    Ok(())
}

#[test]
fn paragraph_break_starts_a_new_paragraph() -> Result<()> {
    let mut input = FlowInput::new();
    input.append_text(source("Line1", style(10.0)));
    input.append_control(ControlCode::ParagraphBreak);
    input.append_text(source("Line2", style(10.0)));
    let result = layout(&input)?;
    assert_eq!(result.paragraphs.len(), 2);
    assert_eq!(result.line_count(), 2);
    assert!(result.characters[5].attributes.is_mandatory_break);
    assert!(result.lines[1].baseline_y > result.lines[0].baseline_y);
    Ok(())
}

#[test]
fn unbreakable_run_falls_back_to_character_breaks() -> Result<()> {
    // 30px is narrower than four 10px line heights.
    let mut input = FlowInput::new();
    input.append_text(source(&"x".repeat(50), style(10.0)));
    input.append_wrap_shape(WrapShape::rect(0.0, 0.0, 30.0, 200.0));
    let result = layout(&input)?;

    assert!(!result.truncated);
    assert!(result.line_count() >= 9);
    assert_eq!(result.characters.len(), 50);
    for chunk in &result.chunks {
        assert!(chunk.text_width <= 30.0 + EPSILON);
        assert!(chunk.text_width > 0.0);
    }
    Ok(())
}

#[test]
fn rtl_ligature_keeps_logical_order() -> Result<()> {
    let provider = FixedFontProvider::new(FixedFont::new("Fixed", 0.5).with_ligature("בג", 0.8));
    let mut input = FlowInput::new();
    input.append_text(source("אבג", style(10.0)));
    let result = FlowLayout::new(&provider).layout(&input)?;

    assert_eq!(result.glyphs.len(), 2);
    assert_eq!(result.glyphs[0].in_character, 0);
    assert_eq!(result.glyphs[1].in_character, 1);
    assert_eq!(result.characters[2].in_glyph, None);
    // Logical order, visual positions right to left.
    assert!(result.glyphs[0].x > result.glyphs[1].x);
    Ok(())
}

#[test]
fn exhausted_shapes_stash_the_rest() -> Result<()> {
    // Room for two 10px lines; the text needs three at this width.
    let mut input = FlowInput::new();
    input.append_text(source("aaa bbb ccc", style(10.0)));
    input.append_wrap_shape(WrapShape::rect(0.0, 0.0, 20.0, 25.0));
    let result = layout(&input)?;

    assert!(result.truncated);
    assert_eq!(result.text(), "aaa bbb ccc");
    assert_eq!(result.line_count(), 3);
    assert!(!result.is_hidden_line(1));
    assert!(result.is_hidden_line(2));
    for i in result.line_chars(2) {
        let c = &result.characters[i];
        assert!(c.in_glyph.is_none_or(|g| result.glyphs[g].hidden));
    }
    Ok(())
}

#[test]
fn text_flows_into_the_next_shape() -> Result<()> {
    let mut input = FlowInput::new();
    input.append_text(source("aaa bbb ccc", style(10.0)));
    input.append_wrap_shape(WrapShape::rect(0.0, 0.0, 20.0, 12.0));
    input.append_wrap_shape(WrapShape::rect(100.0, 0.0, 20.0, 100.0));
    let result = layout(&input)?;

    assert!(!result.truncated);
    assert_eq!(result.lines[0].in_shape, 0);
    assert_eq!(result.lines[1].in_shape, 1);
    assert_eq!(result.chunks[1].left_x, 100.0);
    Ok(())
}

#[test]
fn missing_fonts_skip_their_text() -> Result<()> {
    let provider = FixedFontProvider::default().without_family("Gone");
    let mut input = FlowInput::new();
    input.append_text(source("kept ", style(10.0)));
    input.append_text(source("dropped", Style::new("Gone", 10.0)));
    let result = FlowLayout::new(&provider).layout(&input)?;
    assert_eq!(result.text(), "kept ");

    let mut input = FlowInput::new();
    input.append_text(source("dropped", Style::new("Gone", 10.0)));
    assert!(FlowLayout::new(&provider).layout(&input)?.is_empty());
    Ok(())
}
