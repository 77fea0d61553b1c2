//! Text rendering interface
//!
//! Glyph outline extraction is an external concern: a [`GlyphSource`]
//! produces Bezier outlines for a run of text, the scene driver fills them
//! like any other path. Font file parsing and hinting live outside of this
//! crate.
use crate::{Path, Point, Scalar, Texture};
use std::fmt;

/// External source of glyph outlines
///
/// Implementations are expected to be cheap to query; the driver calls
/// [`GlyphSource::outline`] once per text span.
pub trait GlyphSource: fmt::Debug {
    /// Outline paths for the characters of `text`
    ///
    /// Glyphs are placed for the given font `size` starting at `origin`
    /// (the baseline position of the first glyph, y growing downward).
    /// Returns one path per glyph together with the position where a
    /// following run would continue.
    fn outline(&self, size: Scalar, origin: Point, text: &str) -> (Vec<Path>, Point);
}

/// Run of text with an optional texture override
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    /// Texture used for this span instead of the ambient one
    pub texture: Option<Texture>,
}

impl TextSpan {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            texture: None,
        }
    }

    pub fn with_texture(text: impl Into<String>, texture: Texture) -> Self {
        Self {
            text: text.into(),
            texture: Some(texture),
        }
    }
}

impl<S: Into<String>> From<S> for TextSpan {
    fn from(text: S) -> Self {
        Self::new(text)
    }
}
