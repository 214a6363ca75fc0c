//! Glyph atlas baking
//!
//! Rasterizes every requested code point of every face into one RGBA8
//! texture. Coverage goes into the alpha channel over white, and a small
//! solid block is reserved so untextured shapes can sample pure white.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::IconRange;
use crate::foundation::math::Vec2;

use super::{FontError, FontId, FontResult, FontVariant};

/// Horizontal line metrics at one pixel size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Distance from baseline to the top of the tallest glyph
    pub ascent: f32,
    /// Distance from baseline to the bottom of the lowest glyph (negative)
    pub descent: f32,
    /// Extra spacing between lines
    pub line_gap: f32,
}

impl LineMetrics {
    /// Typical proportions for faces that report no metrics
    pub fn approximate(size_px: f32) -> Self {
        Self { ascent: size_px * 0.8, descent: -size_px * 0.2, line_gap: 0.0 }
    }
}

/// Coverage bitmap of one rasterized glyph
#[derive(Debug, Clone, Default)]
pub struct GlyphBitmap {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Left bearing
    pub xmin: f32,
    /// Bottom edge relative to the baseline, positive up
    pub ymin: f32,
    /// Pen advance
    pub advance: f32,
    /// Row-major coverage, `width * height` bytes
    pub coverage: Vec<u8>,
}

/// Anything that can rasterize glyphs
pub trait GlyphSource: Send + Sync {
    /// Line metrics at `size_px`
    fn line_metrics(&self, size_px: f32) -> LineMetrics;

    /// Whether the face defines `ch`
    fn has_glyph(&self, ch: char) -> bool;

    /// Rasterize `ch` at `size_px`
    fn rasterize(&self, ch: char, size_px: f32) -> GlyphBitmap;
}

impl GlyphSource for fontdue::Font {
    fn line_metrics(&self, size_px: f32) -> LineMetrics {
        fontdue::Font::horizontal_line_metrics(self, size_px).map_or_else(
            || LineMetrics::approximate(size_px),
            |m| LineMetrics { ascent: m.ascent, descent: m.descent, line_gap: m.line_gap },
        )
    }

    fn has_glyph(&self, ch: char) -> bool {
        self.lookup_glyph_index(ch) != 0
    }

    fn rasterize(&self, ch: char, size_px: f32) -> GlyphBitmap {
        let (metrics, coverage) = fontdue::Font::rasterize(self, ch, size_px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin as f32,
            ymin: metrics.ymin as f32,
            advance: metrics.advance_width,
            coverage,
        }
    }
}

/// Solid box glyphs for every printable code point
///
/// Lets headless tools and tests lay out text with realistic metrics when no
/// font file is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticGlyphs;

impl GlyphSource for SyntheticGlyphs {
    fn line_metrics(&self, size_px: f32) -> LineMetrics {
        LineMetrics::approximate(size_px)
    }

    fn has_glyph(&self, ch: char) -> bool {
        !ch.is_control()
    }

    fn rasterize(&self, ch: char, size_px: f32) -> GlyphBitmap {
        let advance = (size_px * 0.5).round();
        if ch.is_whitespace() {
            return GlyphBitmap { advance, ..GlyphBitmap::default() };
        }
        let width = (advance - 1.0).max(1.0) as usize;
        let height = (size_px * 0.7).round().max(1.0) as usize;
        GlyphBitmap {
            width,
            height,
            xmin: 0.0,
            ymin: 0.0,
            advance,
            coverage: vec![255; width * height],
        }
    }
}

/// A glyph placed in the atlas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Top-left texture coordinate
    pub uv_min: Vec2,
    /// Bottom-right texture coordinate
    pub uv_max: Vec2,
    /// Quad top-left relative to the pen at the top of the line
    pub offset: Vec2,
    /// Quad size in pixels
    pub size: Vec2,
    /// Pen advance
    pub advance: f32,
}

impl Glyph {
    /// Whether the glyph produces a quad
    pub fn is_visible(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }
}

/// One face baked at one pixel size
#[derive(Debug, Clone)]
pub struct BakedFont {
    /// Resource name of the face
    pub name: String,
    /// Style slot
    pub variant: FontVariant,
    /// Baked pixel size; also the line height
    pub size_px: f32,
    /// Baseline distance from the top of the line
    pub ascent: f32,
    /// Below-baseline extent (negative)
    pub descent: f32,
    glyphs: HashMap<char, Glyph>,
}

impl BakedFont {
    fn new(name: String, variant: FontVariant, size_px: f32, metrics: LineMetrics) -> Self {
        Self {
            name,
            variant,
            size_px,
            ascent: metrics.ascent.round(),
            descent: metrics.descent,
            glyphs: HashMap::new(),
        }
    }

    /// Glyph for `ch`, if baked
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Number of baked glyphs
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Line height in pixels
    pub fn line_height(&self) -> f32 {
        self.size_px
    }

    /// Pen advance for `ch`, falling back to `?` and then half an em
    pub fn advance(&self, ch: char) -> f32 {
        self.glyph(ch)
            .or_else(|| self.glyph('?'))
            .map_or(self.size_px * 0.5, |g| g.advance)
    }

    /// Unscaled size of a possibly multi-line string
    pub fn text_size(&self, text: &str) -> Vec2 {
        let mut width: f32 = 0.0;
        let mut lines = 0;
        for line in text.split('\n') {
            let line_width: f32 = line.chars().map(|ch| self.advance(ch)).sum();
            width = width.max(line_width);
            lines += 1;
        }
        Vec2::new(width, lines as f32 * self.line_height())
    }
}

/// Baked glyphs for every face plus the RGBA8 texture holding them
#[derive(Debug, Clone)]
pub struct FontAtlas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    fonts: Vec<BakedFont>,
    white_uv: Vec2,
}

impl FontAtlas {
    /// Atlas with a single glyphless regular font, used before fonts load
    pub fn placeholder(size_px: f32) -> Self {
        let mut builder = AtlasBuilder::new(256);
        builder.placeholder_size = size_px;
        // An empty builder only reserves the white block, which always fits.
        builder.build().unwrap_or_else(|_| Self::white_only(size_px))
    }

    fn white_only(size_px: f32) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
            fonts: vec![BakedFont::new(
                "placeholder".to_string(),
                FontVariant::Regular,
                size_px,
                LineMetrics::approximate(size_px),
            )],
            white_uv: Vec2::new(0.5, 0.5),
        }
    }

    /// Texture dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA8 texels, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Texture coordinate that samples solid white
    pub fn white_uv(&self) -> Vec2 {
        self.white_uv
    }

    /// All baked fonts, indexed by [`FontId`]
    pub fn fonts(&self) -> &[BakedFont] {
        &self.fonts
    }

    /// Baked font by id; unknown ids resolve to the first font
    pub fn font(&self, id: FontId) -> &BakedFont {
        self.fonts.get(id.0).unwrap_or(&self.fonts[0])
    }

    /// Write the atlas to a PNG for inspection
    pub fn save_debug_image(&self, path: impl AsRef<Path>) -> FontResult<()> {
        let path = path.as_ref();
        image::save_buffer(path, &self.pixels, self.width, self.height, image::ExtendedColorType::Rgba8)?;
        log::info!("Saved {}x{} font atlas to {}", self.width, self.height, path.display());
        Ok(())
    }
}

const PADDING: u32 = 1;
const WHITE_BLOCK: u32 = 2;
const MAX_ATLAS_HEIGHT: u32 = 8192;

/// Row-by-row rectangle packer
struct ShelfPacker {
    width: u32,
    x: u32,
    y: u32,
    shelf_height: u32,
}

impl ShelfPacker {
    fn new(width: u32) -> Self {
        Self { width, x: 0, y: 0, shelf_height: 0 }
    }

    fn place(&mut self, w: u32, h: u32) -> FontResult<(u32, u32)> {
        let padded_w = w + PADDING;
        let padded_h = h + PADDING;
        if padded_w > self.width {
            return Err(FontError::AtlasTooLarge { width: self.width, height: MAX_ATLAS_HEIGHT });
        }
        if self.x + padded_w > self.width {
            self.y += self.shelf_height;
            self.x = 0;
            self.shelf_height = 0;
        }
        let position = (self.x, self.y);
        self.x += padded_w;
        self.shelf_height = self.shelf_height.max(padded_h);
        if self.height() > MAX_ATLAS_HEIGHT {
            return Err(FontError::AtlasTooLarge { width: self.width, height: self.height() });
        }
        Ok(position)
    }

    fn height(&self) -> u32 {
        self.y + self.shelf_height
    }
}

struct MergedSource {
    name: String,
    source: Arc<dyn GlyphSource>,
    size_px: f32,
    ranges: Vec<IconRange>,
}

struct PendingFace {
    name: String,
    variant: FontVariant,
    size_px: f32,
    source: Arc<dyn GlyphSource>,
    ranges: Vec<IconRange>,
    merged: Vec<MergedSource>,
}

struct Rasterized {
    font: usize,
    ch: char,
    bitmap: GlyphBitmap,
    baseline: f32,
}

/// Collects faces and bakes them into a [`FontAtlas`]
pub struct AtlasBuilder {
    width: u32,
    placeholder_size: f32,
    faces: Vec<PendingFace>,
}

impl AtlasBuilder {
    /// Builder for an atlas `width` pixels wide
    pub fn new(width: u32) -> Self {
        Self { width, placeholder_size: 16.0, faces: Vec::new() }
    }

    /// Pixel size of the stand-in font baked when no faces are added
    pub fn with_placeholder_size(mut self, size_px: f32) -> Self {
        self.placeholder_size = size_px;
        self
    }

    /// Add a base face; returns the id the baked font will have
    pub fn add_face(
        &mut self,
        name: impl Into<String>,
        variant: FontVariant,
        source: Arc<dyn GlyphSource>,
        size_px: f32,
        ranges: &[IconRange],
    ) -> FontId {
        self.faces.push(PendingFace {
            name: name.into(),
            variant,
            size_px,
            source,
            ranges: ranges.to_vec(),
            merged: Vec::new(),
        });
        FontId(self.faces.len() - 1)
    }

    /// Merge glyphs from another face into the most recently added face
    ///
    /// Code points the base face already defines are kept from the base.
    pub fn merge_into_last(
        &mut self,
        name: impl Into<String>,
        source: Arc<dyn GlyphSource>,
        size_px: f32,
        ranges: &[IconRange],
    ) -> FontResult<()> {
        let name = name.into();
        let Some(face) = self.faces.last_mut() else {
            return Err(FontError::NoBaseFont(name));
        };
        face.merged.push(MergedSource { name, source, size_px, ranges: ranges.to_vec() });
        Ok(())
    }

    /// Number of base faces added
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Forget every face
    pub fn clear(&mut self) {
        self.faces.clear();
    }

    /// Rasterize and pack everything
    pub fn build(&self) -> FontResult<FontAtlas> {
        let mut fonts = Vec::with_capacity(self.faces.len().max(1));
        let mut rasterized = Vec::new();

        for (index, face) in self.faces.iter().enumerate() {
            let metrics = face.source.line_metrics(face.size_px);
            let font = BakedFont::new(face.name.clone(), face.variant, face.size_px, metrics);
            let baseline = font.ascent;
            let mut seen = std::collections::HashSet::new();

            for ch in code_points(&face.ranges) {
                if face.source.has_glyph(ch) && seen.insert(ch) {
                    let bitmap = face.source.rasterize(ch, face.size_px);
                    rasterized.push(Rasterized { font: index, ch, bitmap, baseline });
                }
            }
            for merged in &face.merged {
                let before = seen.len();
                for ch in code_points(&merged.ranges) {
                    if merged.source.has_glyph(ch) && seen.insert(ch) {
                        let bitmap = merged.source.rasterize(ch, merged.size_px);
                        rasterized.push(Rasterized { font: index, ch, bitmap, baseline });
                    }
                }
                log::debug!("Merged {} glyphs from '{}' into '{}'", seen.len() - before, merged.name, face.name);
            }
            fonts.push(font);
        }

        if fonts.is_empty() {
            fonts.push(BakedFont::new(
                "placeholder".to_string(),
                FontVariant::Regular,
                self.placeholder_size,
                LineMetrics::approximate(self.placeholder_size),
            ));
        }

        let mut packer = ShelfPacker::new(self.width);
        let white = packer.place(WHITE_BLOCK, WHITE_BLOCK)?;

        let mut order: Vec<usize> = (0..rasterized.len()).collect();
        order.sort_by(|&a, &b| rasterized[b].bitmap.height.cmp(&rasterized[a].bitmap.height));

        let mut positions = vec![None; rasterized.len()];
        for &i in &order {
            let bitmap = &rasterized[i].bitmap;
            if bitmap.width > 0 && bitmap.height > 0 {
                positions[i] = Some(packer.place(bitmap.width as u32, bitmap.height as u32)?);
            }
        }

        let height = packer.height().next_power_of_two();
        let (width_f, height_f) = (self.width as f32, height as f32);
        let mut coverage = vec![0u8; self.width as usize * height as usize];

        for y in 0..WHITE_BLOCK {
            for x in 0..WHITE_BLOCK {
                coverage[((white.1 + y) * self.width + white.0 + x) as usize] = 255;
            }
        }

        for (glyph, position) in rasterized.iter().zip(&positions) {
            let bitmap = &glyph.bitmap;
            let (uv_min, uv_max) = match position {
                Some((px, py)) => {
                    blit(&mut coverage, self.width, *px, *py, bitmap);
                    (
                        Vec2::new(*px as f32 / width_f, *py as f32 / height_f),
                        Vec2::new(
                            (*px as f32 + bitmap.width as f32) / width_f,
                            (*py as f32 + bitmap.height as f32) / height_f,
                        ),
                    )
                }
                None => (Vec2::zeros(), Vec2::zeros()),
            };
            let top = glyph.baseline - (bitmap.ymin + bitmap.height as f32);
            fonts[glyph.font].glyphs.insert(
                glyph.ch,
                Glyph {
                    uv_min,
                    uv_max,
                    offset: Vec2::new(bitmap.xmin, top),
                    size: Vec2::new(bitmap.width as f32, bitmap.height as f32),
                    advance: bitmap.advance,
                },
            );
        }

        let mut pixels = Vec::with_capacity(coverage.len() * 4);
        for alpha in coverage {
            pixels.extend_from_slice(&[255, 255, 255, alpha]);
        }

        let white_uv = Vec2::new(
            (white.0 as f32 + WHITE_BLOCK as f32 * 0.5) / width_f,
            (white.1 as f32 + WHITE_BLOCK as f32 * 0.5) / height_f,
        );

        log::info!(
            "Baked font atlas {}x{}: {} fonts, {} glyphs",
            self.width,
            height,
            fonts.len(),
            rasterized.len()
        );

        Ok(FontAtlas { width: self.width, height, pixels, fonts, white_uv })
    }
}

fn code_points(ranges: &[IconRange]) -> impl Iterator<Item = char> + '_ {
    ranges.iter().flat_map(|r| (r.start..=r.end).filter_map(char::from_u32))
}

fn blit(target: &mut [u8], stride: u32, x: u32, y: u32, bitmap: &GlyphBitmap) {
    for row in 0..bitmap.height {
        let src = &bitmap.coverage[row * bitmap.width..(row + 1) * bitmap.width];
        let start = ((y as usize + row) * stride as usize) + x as usize;
        target[start..start + bitmap.width].copy_from_slice(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Defines a single code point, drawn as a tall box
    struct OneGlyph(char);

    impl GlyphSource for OneGlyph {
        fn line_metrics(&self, size_px: f32) -> LineMetrics {
            LineMetrics::approximate(size_px)
        }

        fn has_glyph(&self, ch: char) -> bool {
            ch == self.0
        }

        fn rasterize(&self, _ch: char, size_px: f32) -> GlyphBitmap {
            let side = size_px as usize;
            GlyphBitmap {
                width: side,
                height: side,
                xmin: 0.0,
                ymin: -2.0,
                advance: size_px + 2.0,
                coverage: vec![128; side * side],
            }
        }
    }

    fn ascii() -> Vec<IconRange> {
        vec![IconRange::new(0x20, 0x7e)]
    }

    fn pixel(atlas: &FontAtlas, uv: Vec2) -> [u8; 4] {
        let (w, h) = atlas.dimensions();
        let x = (uv.x * w as f32) as usize;
        let y = (uv.y * h as f32) as usize;
        let i = (y * w as usize + x) * 4;
        [atlas.pixels()[i], atlas.pixels()[i + 1], atlas.pixels()[i + 2], atlas.pixels()[i + 3]]
    }

    #[test]
    fn test_white_block_samples_opaque_white() {
        let mut builder = AtlasBuilder::new(256);
        builder.add_face("synthetic", FontVariant::Regular, Arc::new(SyntheticGlyphs), 16.0, &ascii());
        let atlas = builder.build().unwrap();

        assert_eq!(pixel(&atlas, atlas.white_uv()), [255, 255, 255, 255]);
    }

    #[test]
    fn test_glyphs_are_packed_inside_atlas() {
        let mut builder = AtlasBuilder::new(256);
        builder.add_face("synthetic", FontVariant::Regular, Arc::new(SyntheticGlyphs), 24.0, &ascii());
        let atlas = builder.build().unwrap();
        let font = atlas.font(FontId(0));

        assert_eq!(font.glyph_count(), 95);
        let (w, h) = atlas.dimensions();
        assert!(h.is_power_of_two());
        assert_eq!(atlas.pixels().len(), (w * h * 4) as usize);
        for ch in ('!'..='~').filter(|c| !c.is_whitespace()) {
            let glyph = font.glyph(ch).unwrap();
            assert!(glyph.is_visible());
            assert!(glyph.uv_min.x >= 0.0 && glyph.uv_max.x <= 1.0);
            assert!(glyph.uv_min.y >= 0.0 && glyph.uv_max.y <= 1.0);
        }
        assert!(!font.glyph(' ').unwrap().is_visible());
    }

    #[test]
    fn test_glyph_offset_uses_baseline() {
        let mut builder = AtlasBuilder::new(256);
        builder.add_face("one", FontVariant::Regular, Arc::new(OneGlyph('A')), 10.0, &ascii());
        let atlas = builder.build().unwrap();
        let glyph = atlas.font(FontId(0)).glyph('A').unwrap();

        // ascent 8, glyph spans ymin -2 .. 8 above the baseline
        assert_relative_eq!(glyph.offset.y, 0.0);
        assert_relative_eq!(glyph.size.y, 10.0);
        assert_relative_eq!(glyph.advance, 12.0);
    }

    #[test]
    fn test_merge_adds_icons_without_overriding_base() {
        let mut builder = AtlasBuilder::new(256);
        builder.add_face("text", FontVariant::Regular, Arc::new(SyntheticGlyphs), 16.0, &ascii());
        builder
            .merge_into_last("icons", Arc::new(OneGlyph('\u{f015}')), 16.0, &[IconRange::new(0xf000, 0xf020)])
            .unwrap();
        builder
            .merge_into_last("override", Arc::new(OneGlyph('A')), 16.0, &ascii())
            .unwrap();
        let atlas = builder.build().unwrap();
        let font = atlas.font(FontId(0));

        assert!(font.glyph('\u{f015}').is_some());
        assert_relative_eq!(font.glyph('A').unwrap().advance, 8.0);
    }

    #[test]
    fn test_merge_requires_base_face() {
        let mut builder = AtlasBuilder::new(256);
        let result = builder.merge_into_last("icons", Arc::new(SyntheticGlyphs), 16.0, &ascii());
        assert!(matches!(result, Err(FontError::NoBaseFont(name)) if name == "icons"));
    }

    #[test]
    fn test_glyph_wider_than_atlas_fails() {
        let mut builder = AtlasBuilder::new(256);
        builder.add_face("huge", FontVariant::Regular, Arc::new(OneGlyph('A')), 300.0, &ascii());
        assert!(matches!(builder.build(), Err(FontError::AtlasTooLarge { .. })));
    }

    #[test]
    fn test_placeholder_has_one_glyphless_font() {
        let atlas = FontAtlas::placeholder(13.0);

        assert_eq!(atlas.fonts().len(), 1);
        let font = atlas.font(FontId(7));
        assert_eq!(font.glyph_count(), 0);
        assert_relative_eq!(font.size_px, 13.0);
        assert_relative_eq!(font.advance('x'), 6.5);
    }

    #[test]
    fn test_text_size_measures_widest_line() {
        let atlas = FontAtlas::placeholder(10.0);
        let size = atlas.font(FontId(0)).text_size("abcd\nab");

        assert_relative_eq!(size.x, 20.0);
        assert_relative_eq!(size.y, 20.0);
    }

    #[test]
    fn test_save_debug_image_writes_png() {
        let path = std::env::temp_dir().join(format!("editor_gui_atlas_{}.png", std::process::id()));
        let atlas = FontAtlas::placeholder(16.0);

        atlas.save_debug_image(&path).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), atlas.dimensions());
        std::fs::remove_file(&path).ok();
    }
}
