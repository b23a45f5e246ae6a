/// Failures that abort a whole layout call.
///
/// Problems local to one run (missing font, text that overflows every
/// shape, clusters that fall off a path) never surface here; they degrade
/// the result instead.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LayoutError {
    #[error("glyph cluster at byte {cluster} does not start a character of span {span_text:?}")]
    ClusterMismatch { cluster: usize, span_text: String },
    #[error("glyph {glyph} of span {span} claims character {character} outside the span")]
    GlyphOutOfSpan {
        glyph: usize,
        span: usize,
        character: usize,
    },
    #[error("line at block position {position} has zero height and no content")]
    NoProgress { position: f32 },
    #[error("invalid length {0}")]
    InvalidLength(f32),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
