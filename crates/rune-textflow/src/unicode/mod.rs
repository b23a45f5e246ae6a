//! Unicode text segmentation helpers.
//!
//! - Per-character break/cursor/word attributes (UAX-14, UAX-29)
//! - Script resolution for itemization
//! - Character classes the layout treats specially (marks, vertical scripts)

pub mod attributes;

use unicode_script::{Script, UnicodeScript};

pub use attributes::{CharAttributes, compute_char_attributes};

/// Resolve the script of every character, letting Common and Inherited
/// characters take the script of the run they sit in.
pub fn resolve_scripts(text: &str) -> Vec<Script> {
    let mut scripts: Vec<Script> = text.chars().map(|c| c.script()).collect();
    let is_weak = |s: Script| matches!(s, Script::Common | Script::Inherited | Script::Unknown);

    let mut current = scripts.iter().copied().find(|s| !is_weak(*s));
    for script in scripts.iter_mut() {
        if is_weak(*script) {
            if let Some(strong) = current {
                *script = strong;
            }
        } else {
            current = Some(*script);
        }
    }
    scripts
}

/// True for combining marks that take no advance of their own.
pub fn is_nonspacing_mark(ch: char) -> bool {
    matches!(
        u32::from(ch),
        0x0300..=0x036F
            | 0x0483..=0x0489
            | 0x0591..=0x05BD
            | 0x05BF
            | 0x05C1..=0x05C2
            | 0x05C4..=0x05C5
            | 0x05C7
            | 0x0610..=0x061A
            | 0x064B..=0x065F
            | 0x0670
            | 0x06D6..=0x06DC
            | 0x0E31
            | 0x0E34..=0x0E3A
            | 0x0E47..=0x0E4E
            | 0x1AB0..=0x1AFF
            | 0x1DC0..=0x1DFF
            | 0x20D0..=0x20FF
            | 0x302A..=0x302D
            | 0x3099..=0x309A
            | 0xFE20..=0xFE2F
    )
}

/// True when a character stays upright in vertical text with mixed
/// orientation.
pub fn is_upright_in_vertical(ch: char) -> bool {
    if matches!(
        u32::from(ch),
        0x1100..=0x11FF | 0x2E80..=0x303F | 0x3190..=0x319F | 0xFE30..=0xFE4F | 0xFF00..=0xFFEF
    ) {
        return true;
    }
    matches!(
        ch.script(),
        Script::Han
            | Script::Hiragana
            | Script::Katakana
            | Script::Hangul
            | Script::Bopomofo
            | Script::Yi
    )
}
