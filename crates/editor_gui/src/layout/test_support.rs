//! Shared fixtures for layout tests

use std::sync::Arc;

use crate::config::{GuiConfig, IconRange};
use crate::font::{AtlasBuilder, FontSelector, FontVariant, SyntheticGlyphs};
use crate::toolkit::test_support::synthetic_atlas;

use super::LayoutContext;

/// Layout over the 16 px synthetic font
pub(crate) fn layout() -> LayoutContext {
    let mut selector = FontSelector::new();
    selector.insert(FontVariant::Regular, 16.0, crate::font::FontId(0));
    LayoutContext::new(synthetic_atlas(), selector, &GuiConfig::headless())
}

/// Layout with one regular synthetic face baked at each of `sizes`
pub(crate) fn layout_with_sizes(sizes: &[f32]) -> LayoutContext {
    let mut builder = AtlasBuilder::new(512);
    let mut selector = FontSelector::new();
    for &size in sizes {
        let id = builder.add_face("synthetic", FontVariant::Regular, Arc::new(SyntheticGlyphs), size, &[IconRange::new(0x20, 0x7e)]);
        selector.insert(FontVariant::Regular, size, id);
    }
    let atlas = Arc::new(builder.build().expect("synthetic atlas fits"));
    LayoutContext::new(atlas, selector, &GuiConfig::headless())
}
