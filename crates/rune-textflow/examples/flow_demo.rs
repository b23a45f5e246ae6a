use std::sync::Arc;

use lyon_path::Path;
use lyon_path::math::{Transform, point};
use rune_textflow::{
    FixedFontProvider, FlowConfig, FlowInput, FlowLayout, FontDbProvider, FontProvider,
    HitTestPolicy, LayoutCursor, StartOffset, Style, TextAlign, TextSource, WrapShape,
};

fn main() {
    let config = FlowConfig::load();

    // Real fonts when the configured database has any, the synthetic font
    // otherwise.
    let fontdb = FontDbProvider::from_config(&config.fonts);
    let fixed = FixedFontProvider::default();
    let (provider, family): (&dyn FontProvider, &str) = if fontdb.database().len() > 0 {
        (&fontdb, "sans-serif")
    } else {
        (&fixed, "Fixed")
    };

    let style = Arc::new(Style::new(family, 16.0).with_align(TextAlign::Justify));
    let mut input = FlowInput::new();
    input.append_text(TextSource::new(
        "The quick brown fox jumps over the lazy dog. שלום עולם. \
         Text flows around shapes and breaks at the right places.",
        style,
    ));
    input.append_wrap_shape(WrapShape::rect(0.0, 0.0, 180.0, 60.0));
    input.append_wrap_shape(WrapShape::polygon(vec![
        point(220.0, 0.0),
        point(400.0, 0.0),
        point(310.0, 200.0),
    ]));

    let result = match FlowLayout::new(provider).with_config(config.layout.clone()).layout(&input) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("layout failed: {err}");
            return;
        }
    };

    println!("=== Text Flow Demo ===\n");
    println!("Lines: {} (truncated: {})", result.line_count(), result.truncated);
    for (index, line) in result.lines.iter().enumerate() {
        let chars = result.line_chars(index);
        let text: String = result.characters[chars.clone()].iter().map(|c| c.ch).collect();
        println!(
            "  line {index}: shape {} baseline {:>6.1} hidden {:<5} {text:?}",
            line.in_shape, line.baseline_y, line.hidden
        );
    }

    if let Some(bbox) = result.bounding_box(&Transform::identity(), false, None) {
        println!("\nInk bounds: {:?} .. {:?}", bbox.min, bbox.max);
    }

    println!("\n--- Cursor ---");
    let mut cursor = LayoutCursor::new(&result);
    while cursor.next_start_of_word() {
        if let Some(rect) = cursor.rect() {
            println!("  word start {:>3} at ({:.1}, {:.1})", cursor.position(), rect.x, rect.y);
        }
    }
    if let Some(hit) = result.hit_test(point(40.0, 30.0), HitTestPolicy::Clamp) {
        println!("  (40, 30) hits position {} on line {}", hit.position, hit.line_index);
    }

    println!("\n--- On a path ---");
    let mut single = FlowInput::new();
    single.append_text(TextSource::new("around the arc", Arc::new(Style::new(family, 14.0))));
    let flow = FlowLayout::new(provider).with_config(config.layout.clone());
    let Ok(mut arc) = flow.layout(&single) else {
        return;
    };
    let mut builder = Path::builder();
    builder.begin(point(0.0, 100.0));
    builder.quadratic_bezier_to(point(100.0, 0.0), point(200.0, 100.0));
    builder.end(false);
    let curve = builder.build();
    if flow.fit_to_path(&mut arc, &curve, StartOffset::Percent(10.0)).is_ok() {
        for glyph in arc.glyphs.iter().filter(|g| !g.hidden) {
            println!(
                "  {:?} at ({:.1}, {:.1}) turned {:.2} rad",
                arc.characters[glyph.in_character].ch, glyph.x, glyph.y, glyph.rotation
            );
        }
    }
}
