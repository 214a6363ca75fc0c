//! Style and size resolution against the baked size table

use std::collections::BTreeMap;

use super::{FontId, FontStyle, FontVariant};

/// Resolved font for a style and requested size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSelection {
    /// Baked font to draw with
    pub font: FontId,
    /// Face that was resolved
    pub variant: FontVariant,
    /// Pixel size the font was baked at
    pub baked_size: f32,
    /// Multiplier from the baked size to the displayed size
    pub scale: f32,
}

impl FontSelection {
    /// Displayed pixel size
    pub fn display_size(&self) -> f32 {
        self.baked_size * self.scale
    }
}

/// Maps (style, size) requests onto baked fonts
#[derive(Debug, Clone)]
pub struct FontSelector {
    table: BTreeMap<FontVariant, Vec<(f32, FontId)>>,
    zoom: f32,
}

impl Default for FontSelector {
    fn default() -> Self {
        Self { table: BTreeMap::new(), zoom: 1.0 }
    }
}

impl FontSelector {
    /// Empty selector at zoom 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a baked font
    pub fn insert(&mut self, variant: FontVariant, size_px: f32, font: FontId) {
        let sizes = self.table.entry(variant).or_default();
        sizes.push((size_px, font));
        sizes.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    /// Forget every baked font
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Whether any font is registered
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Baked sizes for a face, ascending
    pub fn sizes(&self, variant: FontVariant) -> Vec<f32> {
        self.table.get(&variant).map(|s| s.iter().map(|(size, _)| *size).collect()).unwrap_or_default()
    }

    /// Current zoom factor
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the global zoom factor; non-positive or non-finite values are ignored
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        } else {
            log::warn!("Ignoring invalid font zoom {}", zoom);
        }
    }

    /// Resolve the font that draws `style` at `requested_px` (before zoom)
    ///
    /// The baked size nearest to `requested_px * zoom` wins, the smaller one
    /// on a tie, and the returned scale makes up the difference.
    pub fn select(&self, style: FontStyle, requested_px: f32) -> FontSelection {
        let target = requested_px * self.zoom;
        let wanted = FontVariant::from_style(style);

        let found = wanted
            .fallbacks()
            .iter()
            .find_map(|variant| self.table.get(variant).filter(|s| !s.is_empty()).map(|s| (*variant, s)))
            .or_else(|| self.table.iter().find(|(_, s)| !s.is_empty()).map(|(v, s)| (*v, s)));

        let Some((variant, sizes)) = found else {
            return FontSelection { font: FontId(0), variant: wanted, baked_size: target, scale: 1.0 };
        };

        let mut best = sizes[0];
        for &(size, font) in &sizes[1..] {
            // Strictly closer only: ascending order keeps the smaller size on ties.
            if (size - target).abs() < (best.0 - target).abs() {
                best = (size, font);
            }
        }

        let (baked_size, font) = best;
        FontSelection { font, variant, baked_size, scale: target / baked_size }
    }
}
