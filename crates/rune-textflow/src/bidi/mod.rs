//! Bidirectional (BiDi) text support built on `unicode-bidi`.
//!
//! The layout keeps characters in logical order; it only needs embedding
//! levels to split items by direction and the paragraph base direction.

pub mod levels;

pub use levels::{BaseDirection, ParagraphLevels, paragraph_levels};
