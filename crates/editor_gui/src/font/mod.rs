//! # Fonts
//!
//! Font loading, atlas baking and style/size selection.
//!
//! Text faces are baked at a fixed table of pixel sizes; asking for any
//! other size picks the nearest baked one and scales it. An optional icon
//! font is merged into every text face so icon code points render inline.

use serde::{Deserialize, Serialize};
use bitflags::bitflags;

use crate::assets::ResourceError;
use crate::render::DeviceError;

mod atlas;
mod manager;
mod selector;

pub use atlas::{AtlasBuilder, BakedFont, FontAtlas, Glyph, GlyphBitmap, GlyphSource, LineMetrics, SyntheticGlyphs};
pub use manager::{AtlasUpload, FontManager};
pub use selector::{FontSelection, FontSelector};

/// Result type for font operations
pub type FontResult<T> = Result<T, FontError>;

/// Font loading and baking errors
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    /// Font file could not be loaded
    #[error("Font resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Font data could not be parsed
    #[error("Failed to parse font '{name}': {reason}")]
    Parse {
        /// Resource name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Merge mode was requested with nothing to merge into
    #[error("Cannot merge '{0}': no base font has been added")]
    NoBaseFont(String),

    /// Glyphs do not fit within the maximum atlas size
    #[error("Font atlas would exceed {width}x{height}")]
    AtlasTooLarge {
        /// Atlas width
        width: u32,
        /// Required height
        height: u32,
    },

    /// Atlas texture upload failed
    #[error("Font atlas upload failed: {0}")]
    Upload(#[from] DeviceError),

    /// Debug image could not be written
    #[error("Failed to write atlas image: {0}")]
    Image(#[from] image::ImageError),
}

bitflags! {
    /// Requested text style
    ///
    /// Styles combine by bitwise OR while nested; `ICON` wins over the
    /// other flags when resolving a face.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u8 {
        /// Bold weight
        const BOLD = 1 << 0;
        /// Italic slant
        const ITALIC = 1 << 1;
        /// Icon face
        const ICON = 1 << 2;
    }
}

impl FontStyle {
    /// Plain regular text
    pub const REGULAR: Self = Self::empty();
}

/// A baked face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FontVariant {
    /// Regular
    Regular,
    /// Bold
    Bold,
    /// Italic
    Italic,
    /// Bold and italic
    BoldItalic,
    /// Icon glyphs only
    Icon,
}

impl FontVariant {
    /// Face that renders a style
    pub fn from_style(style: FontStyle) -> Self {
        if style.contains(FontStyle::ICON) {
            return Self::Icon;
        }
        match (style.contains(FontStyle::BOLD), style.contains(FontStyle::ITALIC)) {
            (false, false) => Self::Regular,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (true, true) => Self::BoldItalic,
        }
    }

    /// Faces to try, in order, when this one was never baked
    pub fn fallbacks(self) -> &'static [FontVariant] {
        match self {
            Self::Regular => &[Self::Regular],
            Self::Bold => &[Self::Bold, Self::Regular],
            Self::Italic => &[Self::Italic, Self::Regular],
            Self::BoldItalic => &[Self::BoldItalic, Self::Bold, Self::Italic, Self::Regular],
            Self::Icon => &[Self::Icon, Self::Regular],
        }
    }
}

/// Index of a baked font within its atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_to_variant() {
        assert_eq!(FontVariant::from_style(FontStyle::REGULAR), FontVariant::Regular);
        assert_eq!(FontVariant::from_style(FontStyle::BOLD), FontVariant::Bold);
        assert_eq!(FontVariant::from_style(FontStyle::ITALIC), FontVariant::Italic);
        assert_eq!(FontVariant::from_style(FontStyle::BOLD | FontStyle::ITALIC), FontVariant::BoldItalic);
    }

    #[test]
    fn test_icon_overrides_other_flags() {
        let style = FontStyle::BOLD | FontStyle::ITALIC | FontStyle::ICON;
        assert_eq!(FontVariant::from_style(style), FontVariant::Icon);
    }

    #[test]
    fn test_every_fallback_chain_ends_at_regular() {
        for variant in [
            FontVariant::Regular,
            FontVariant::Bold,
            FontVariant::Italic,
            FontVariant::BoldItalic,
            FontVariant::Icon,
        ] {
            assert_eq!(variant.fallbacks().first(), Some(&variant));
            assert_eq!(variant.fallbacks().last(), Some(&FontVariant::Regular));
        }
    }
}
