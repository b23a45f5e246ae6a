use harfrust::{
    Direction as HbDirection,
    FontRef as HbFontRef,
    Language as HbLanguage,
    Script as HbScript,
    ShaperData,
    ShaperInstance,
    Tag as HbTag,
    UnicodeBuffer as HbUnicodeBuffer,
};
use unicode_script::Script;

use crate::style::Direction;

use super::{RawGlyph, ShapeRequest};

/// Shape `text` with harfrust (pure-Rust HarfBuzz port) using the font in
/// `font_data` at `index`.
///
/// Positions come back per em. Right-to-left runs are returned in the
/// visual order harfrust produces. Returns an empty vector when the font
/// data cannot be parsed.
pub fn shape_with_harfrust(
    font_data: &[u8],
    index: u32,
    units_per_em: u16,
    text: &str,
    request: &ShapeRequest<'_>,
) -> Vec<RawGlyph> {
    let Ok(font_ref) = HbFontRef::from_index(font_data, index) else {
        tracing::warn!(index, "harfrust could not parse font data");
        return Vec::new();
    };

    // Shaper configuration with default (no variations) instance.
    let data = ShaperData::new(&font_ref);
    let instance =
        ShaperInstance::from_variations(&font_ref, core::iter::empty::<harfrust::Variation>());
    let shaper = data
        .shaper(&font_ref)
        .instance(Some(&instance))
        .point_size(None)
        .build();

    let mut buffer = HbUnicodeBuffer::new();
    buffer.push_str(text);
    buffer.set_direction(match request.direction {
        Direction::LeftToRight => HbDirection::LeftToRight,
        Direction::RightToLeft => HbDirection::RightToLeft,
    });
    if let Some(script) = script_tag(request.script).and_then(HbScript::from_iso15924_tag) {
        buffer.set_script(script);
    }
    if let Some(language) = request
        .language
        .and_then(|lang| lang.parse::<HbLanguage>().ok())
    {
        buffer.set_language(language);
    }
    // Let harfrust fill in any remaining segment properties.
    buffer.guess_segment_properties();

    let glyph_buffer = shaper.shape(buffer, &[]);
    let infos = glyph_buffer.glyph_infos();
    let positions = glyph_buffer.glyph_positions();

    let scale = if units_per_em != 0 {
        1.0 / f32::from(units_per_em)
    } else {
        1.0
    };

    infos
        .iter()
        .zip(positions.iter())
        .map(|(info, pos)| RawGlyph {
            glyph_id: info.glyph_id,
            cluster: info.cluster,
            x_advance: pos.x_advance as f32 * scale,
            y_advance: pos.y_advance as f32 * scale,
            x_offset: pos.x_offset as f32 * scale,
            // harfrust offsets are y-up.
            y_offset: -(pos.y_offset as f32) * scale,
        })
        .collect()
}

/// ISO 15924 tag for a Unicode script, as harfrust expects it.
fn script_tag(script: Script) -> Option<HbTag> {
    let name = script.short_name().as_bytes();
    if name.len() != 4 {
        return None;
    }
    Some(HbTag::new(&[name[0], name[1], name[2], name[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tags_are_four_letters() {
        assert!(script_tag(Script::Latin).is_some());
        assert!(script_tag(Script::Hebrew).is_some());
        assert!(script_tag(Script::Arabic).is_some());
    }

    #[test]
    fn garbage_font_data_shapes_to_nothing() {
        let glyphs = shape_with_harfrust(b"not a font", 0, 1000, "abc", &ShapeRequest::default());
        assert!(glyphs.is_empty());
    }
}
