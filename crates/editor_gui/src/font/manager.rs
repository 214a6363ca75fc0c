//! Font loading and atlas lifetime
//!
//! Owns parsed font files, the pending face list, the baked atlas and its
//! GPU texture. Rebuilding replaces the atlas wholesale; the caller decides
//! when the retired texture is safe to destroy.

use std::collections::HashMap;
use std::sync::Arc;

use fontdue::{Font, FontSettings};

use crate::assets::ResourceLoader;
use crate::config::{FontConfig, IconRange};
use crate::render::{GraphicsDevice, TextureDesc, TextureFormat, TextureHandle};

use super::{
    AtlasBuilder, FontAtlas, FontError, FontId, FontResult, FontSelection, FontSelector, FontStyle,
    FontVariant, GlyphSource,
};

/// Result of uploading a rebuilt atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasUpload {
    /// Texture now holding the atlas
    pub texture: TextureHandle,
    /// Previous atlas texture, to destroy once nothing references it
    pub retired: Option<TextureHandle>,
}

/// Loads faces, bakes the atlas and resolves styles to fonts
pub struct FontManager {
    config: FontConfig,
    sources: HashMap<String, Arc<Font>>,
    builder: AtlasBuilder,
    registered: Vec<(FontVariant, f32, FontId)>,
    selector: FontSelector,
    atlas: Arc<FontAtlas>,
    texture: Option<TextureHandle>,
}

impl FontManager {
    /// Manager with a placeholder atlas and no faces
    pub fn new(config: &FontConfig) -> Self {
        let mut selector = FontSelector::new();
        selector.insert(FontVariant::Regular, config.default_size, FontId(0));
        Self {
            config: config.clone(),
            sources: HashMap::new(),
            builder: AtlasBuilder::new(config.atlas_width).with_placeholder_size(config.default_size),
            registered: Vec::new(),
            selector,
            atlas: Arc::new(FontAtlas::placeholder(config.default_size)),
            texture: None,
        }
    }

    /// Parse a font file, reusing an earlier parse of the same resource
    pub fn load_source(&mut self, loader: &dyn ResourceLoader, file: &str) -> FontResult<Arc<Font>> {
        if let Some(font) = self.sources.get(file) {
            return Ok(Arc::clone(font));
        }
        let bytes = loader.load(file)?;
        let font = Font::from_bytes(bytes.as_ref(), FontSettings::default())
            .map_err(|reason| FontError::Parse { name: file.to_string(), reason: reason.to_string() })?;
        log::debug!("Parsed font '{}' ({} bytes)", file, bytes.len());

        let font = Arc::new(font);
        self.sources.insert(file.to_string(), Arc::clone(&font));
        Ok(font)
    }

    /// Add a base face from a font file
    pub fn add_font_base(
        &mut self,
        loader: &dyn ResourceLoader,
        variant: FontVariant,
        file: &str,
        size_px: f32,
    ) -> FontResult<FontId> {
        let source: Arc<dyn GlyphSource> = self.load_source(loader, file)?;
        Ok(self.add_source(file, variant, source, size_px))
    }

    /// Add a base face from any glyph source
    ///
    /// Icon faces bake every configured icon range, text faces the text ranges.
    pub fn add_source(
        &mut self,
        name: &str,
        variant: FontVariant,
        source: Arc<dyn GlyphSource>,
        size_px: f32,
    ) -> FontId {
        let ranges = if variant == FontVariant::Icon {
            self.config.icon_ranges()
        } else {
            self.config.text_ranges.clone()
        };
        self.add_source_ranges(name, variant, source, size_px, &ranges)
    }

    fn add_source_ranges(
        &mut self,
        name: &str,
        variant: FontVariant,
        source: Arc<dyn GlyphSource>,
        size_px: f32,
        ranges: &[IconRange],
    ) -> FontId {
        let id = self.builder.add_face(name, variant, source, size_px, ranges);
        self.registered.push((variant, size_px, id));
        id
    }

    /// Merge `ranges` of `file` into the last added face
    pub fn register_icon(
        &mut self,
        loader: &dyn ResourceLoader,
        file: &str,
        size_px: f32,
        ranges: &[IconRange],
    ) -> FontResult<()> {
        let source: Arc<dyn GlyphSource> = self.load_source(loader, file)?;
        self.merge_source(file, source, size_px, ranges)
    }

    /// Merge glyphs from any source into the last added face
    pub fn merge_source(
        &mut self,
        name: &str,
        source: Arc<dyn GlyphSource>,
        size_px: f32,
        ranges: &[IconRange],
    ) -> FontResult<()> {
        self.builder.merge_into_last(name, source, size_px, ranges)
    }

    /// Queue every configured face at every configured size
    ///
    /// Each text face gets every icon font merged in, in order. The first
    /// icon font is baked on its own as the icon face and the rest merge into
    /// it. Returns the number of faces queued.
    pub fn load_default_fonts(&mut self, loader: &dyn ResourceLoader) -> FontResult<usize> {
        let faces = self.config.faces.clone();
        let icons = self.config.icons.clone();
        let sizes = self.config.sizes.clone();
        let before = self.builder.face_count();

        for size in sizes {
            for face in &faces {
                self.add_font_base(loader, face.variant, &face.file, size)?;
                for icon in &icons {
                    self.register_icon(loader, &icon.file, size, &icon.ranges)?;
                }
            }
            if let Some((first, rest)) = icons.split_first() {
                let source: Arc<dyn GlyphSource> = self.load_source(loader, &first.file)?;
                self.add_source_ranges(&first.file, FontVariant::Icon, source, size, &first.ranges);
                for icon in rest {
                    self.register_icon(loader, &icon.file, size, &icon.ranges)?;
                }
            }
        }

        let queued = self.builder.face_count() - before;
        log::info!("Queued {} font faces ({} files parsed)", queued, self.sources.len());
        Ok(queued)
    }

    /// Forget every queued face; the next rebuild bakes only the placeholder
    pub fn clear(&mut self) {
        self.builder.clear();
        self.registered.clear();
    }

    /// Bake the queued faces and upload the atlas texture
    ///
    /// On failure the previous atlas and texture stay in place.
    pub fn rebuild_atlas(&mut self, device: &mut dyn GraphicsDevice) -> FontResult<AtlasUpload> {
        let atlas = self.builder.build()?;
        let (width, height) = atlas.dimensions();
        let desc = TextureDesc {
            label: "font-atlas".to_string(),
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
        };
        let texture = device.create_texture(&desc, atlas.pixels())?;

        self.selector.clear();
        if self.registered.is_empty() {
            self.selector.insert(FontVariant::Regular, self.config.default_size, FontId(0));
        }
        for &(variant, size, id) in &self.registered {
            self.selector.insert(variant, size, id);
        }

        self.atlas = Arc::new(atlas);
        let retired = self.texture.replace(texture);
        log::info!("Font atlas rebuilt as {:?} ({}x{})", texture, width, height);
        Ok(AtlasUpload { texture, retired })
    }

    /// The current atlas
    pub fn atlas(&self) -> &Arc<FontAtlas> {
        &self.atlas
    }

    /// Texture holding the current atlas, once uploaded
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Style and size resolution table for the current atlas
    pub fn selector(&self) -> &FontSelector {
        &self.selector
    }

    /// Resolve a style at a requested size
    pub fn select_font(&self, style: FontStyle, requested_px: f32) -> FontSelection {
        self.selector.select(style, requested_px)
    }

    /// Set the global zoom factor
    pub fn set_zoom(&mut self, zoom: f32) {
        self.selector.set_zoom(zoom);
    }

    /// Current zoom factor
    pub fn zoom(&self) -> f32 {
        self.selector.zoom()
    }

    /// Size requested when no explicit size is given
    pub fn default_size(&self) -> f32 {
        self.config.default_size
    }

    /// Number of distinct parsed font files
    pub fn parsed_files(&self) -> usize {
        self.sources.len()
    }

    /// Release the atlas texture
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) -> FontResult<()> {
        if let Some(texture) = self.texture.take() {
            device.destroy_texture(texture)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{EmbeddedResources, ResourceError};
    use crate::config::IconFont;
    use crate::font::SyntheticGlyphs;
    use crate::render::HeadlessDevice;
    use approx::assert_relative_eq;

    fn manager() -> FontManager {
        FontManager::new(&FontConfig::headless())
    }

    #[test]
    fn test_missing_font_file_is_a_resource_error() {
        let mut fonts = manager();
        let loader = EmbeddedResources::new();
        let result = fonts.add_font_base(&loader, FontVariant::Regular, "Missing.ttf", 16.0);

        assert!(matches!(result, Err(FontError::Resource(ResourceError::NotFound(_)))));
    }

    #[test]
    fn test_garbage_font_file_is_a_parse_error() {
        let mut fonts = manager();
        let mut loader = EmbeddedResources::new();
        loader.insert("Broken.ttf", vec![0u8; 32]);

        let result = fonts.add_font_base(&loader, FontVariant::Regular, "Broken.ttf", 16.0);
        assert!(matches!(result, Err(FontError::Parse { name, .. }) if name == "Broken.ttf"));
        assert_eq!(fonts.parsed_files(), 0);
    }

    #[test]
    fn test_rebuild_uploads_and_retires_previous_texture() {
        let mut fonts = manager();
        let mut device = HeadlessDevice::new();
        for size in [12.0, 16.0, 24.0, 32.0] {
            fonts.add_source("synthetic", FontVariant::Regular, Arc::new(SyntheticGlyphs), size);
        }

        let first = fonts.rebuild_atlas(&mut device).unwrap();
        assert!(first.retired.is_none());
        let (w, h) = fonts.atlas().dimensions();
        assert_eq!(device.texture(first.texture).unwrap().desc.width, w);
        assert_eq!(device.texture(first.texture).unwrap().desc.height, h);
        assert_eq!(fonts.atlas().fonts().len(), 4);

        let second = fonts.rebuild_atlas(&mut device).unwrap();
        assert_eq!(second.retired, Some(first.texture));
        assert_eq!(fonts.texture(), Some(second.texture));
    }

    #[test]
    fn test_selection_uses_rebuilt_table() {
        let mut fonts = manager();
        let mut device = HeadlessDevice::new();
        for size in [12.0, 16.0, 24.0, 32.0] {
            fonts.add_source("synthetic", FontVariant::Regular, Arc::new(SyntheticGlyphs), size);
        }
        fonts.rebuild_atlas(&mut device).unwrap();

        let selection = fonts.select_font(FontStyle::REGULAR, 20.0);
        assert_eq!(selection.font, FontId(1));
        assert_relative_eq!(selection.scale, 1.25);

        fonts.set_zoom(1.5);
        let zoomed = fonts.select_font(FontStyle::REGULAR, 16.0);
        assert_eq!(zoomed.font, FontId(2));
        assert_relative_eq!(zoomed.scale, 1.0);
    }

    #[test]
    fn test_empty_rebuild_keeps_placeholder_selection() {
        let mut fonts = manager();
        let mut device = HeadlessDevice::new();
        fonts.rebuild_atlas(&mut device).unwrap();

        assert_eq!(fonts.atlas().fonts().len(), 1);
        assert_eq!(fonts.select_font(FontStyle::BOLD, 16.0).font, FontId(0));
    }

    #[test]
    fn test_register_icon_needs_base_face() {
        let mut fonts = manager();
        let result = fonts.merge_source("icons", Arc::new(SyntheticGlyphs), 16.0, &[IconRange::new(0xf000, 0xf001)]);
        assert!(matches!(result, Err(FontError::NoBaseFont(_))));
    }

    #[test]
    fn test_icon_sources_with_disjoint_ranges_share_one_face() {
        let mut fonts = manager();
        let mut device = HeadlessDevice::new();
        fonts.add_source("synthetic", FontVariant::Regular, Arc::new(SyntheticGlyphs), 16.0);
        fonts.merge_source("forkawesome", Arc::new(SyntheticGlyphs), 16.0, &[IconRange::new(0xf000, 0xf003)]).unwrap();
        fonts.merge_source("material", Arc::new(SyntheticGlyphs), 16.0, &[IconRange::new(0xe000, 0xe001)]).unwrap();
        fonts.rebuild_atlas(&mut device).unwrap();

        assert_eq!(fonts.atlas().fonts().len(), 1);
        let font = fonts.atlas().font(FontId(0));
        for cp in [0xf000, 0xf003, 0xe000, 0xe001] {
            assert!(font.glyph(char::from_u32(cp).unwrap()).is_some(), "missing U+{:04X}", cp);
        }
        assert!(font.glyph('\u{f004}').is_none());
        assert!(font.glyph('\u{e002}').is_none());
        assert!(font.glyph('A').is_some());
    }

    #[test]
    fn test_register_icon_reports_missing_file() {
        let mut fonts = manager();
        fonts.add_source("synthetic", FontVariant::Regular, Arc::new(SyntheticGlyphs), 16.0);
        let result = fonts.register_icon(&EmbeddedResources::new(), "icons.ttf", 16.0, &[IconRange::new(0xf000, 0xf001)]);

        assert!(matches!(result, Err(FontError::Resource(ResourceError::NotFound(_)))));
    }

    #[test]
    fn test_icon_face_bakes_every_configured_range() {
        let config = FontConfig::headless()
            .with_icon(IconFont::new("a.ttf", vec![IconRange::new(0xf000, 0xf001)]))
            .with_icon(IconFont::new("b.ttf", vec![IconRange::new(0xe000, 0xe000)]));
        let mut fonts = FontManager::new(&config);
        let mut device = HeadlessDevice::new();
        fonts.add_source("icons", FontVariant::Icon, Arc::new(SyntheticGlyphs), 16.0);
        fonts.rebuild_atlas(&mut device).unwrap();

        assert_eq!(fonts.atlas().font(FontId(0)).glyph_count(), 3);
    }

    #[test]
    fn test_destroy_releases_texture() {
        let mut fonts = manager();
        let mut device = HeadlessDevice::new();
        fonts.rebuild_atlas(&mut device).unwrap();
        assert_eq!(device.live_textures(), 1);

        fonts.destroy(&mut device).unwrap();
        assert_eq!(device.live_textures(), 0);
        assert!(fonts.texture().is_none());
    }
}
