//! # GUI Configuration
//!
//! Top-level configuration for the layout bridge: fonts, drag behaviour,
//! property-row layout and persistent settings. Every section has sensible
//! defaults, so a config file only needs to name what it changes.

use serde::{Serialize, Deserialize};

use super::{Config, ConfigError};
use crate::font::FontVariant;

/// Core behaviour: logging
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string() }
    }
}

/// Inclusive code point range merged from an icon font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRange {
    /// First code point
    pub start: u32,
    /// Last code point (inclusive)
    pub end: u32,
}

impl IconRange {
    /// Create a new range
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// One font face to bake at every precomputed size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFace {
    /// Style slot the face fills
    pub variant: FontVariant,
    /// Resource name of the font file
    pub file: String,
}

impl FontFace {
    /// Create a face entry
    pub fn new(variant: FontVariant, file: impl Into<String>) -> Self {
        Self { variant, file: file.into() }
    }
}

/// Icon font merged into every text face and baked as an icon face
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconFont {
    /// Resource name of the font file
    pub file: String,
    /// Code point ranges taken from this file
    pub ranges: Vec<IconRange>,
}

impl IconFont {
    /// Create an icon font entry
    pub fn new(file: impl Into<String>, ranges: Vec<IconRange>) -> Self {
        Self { file: file.into(), ranges }
    }
}

/// Font files and precomputed sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Text faces; an empty list bakes only the placeholder font
    pub faces: Vec<FontFace>,
    /// Icon fonts, merged in order; earlier files win on shared code points
    pub icons: Vec<IconFont>,
    /// Text code point ranges baked for every face
    pub text_ranges: Vec<IconRange>,
    /// Precomputed pixel sizes
    pub sizes: Vec<f32>,
    /// Size selected at startup
    pub default_size: f32,
    /// Atlas texture width in pixels (power of two)
    pub atlas_width: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            faces: vec![
                FontFace::new(FontVariant::Regular, "Roboto-Regular.ttf"),
                FontFace::new(FontVariant::Bold, "Roboto-Bold.ttf"),
                FontFace::new(FontVariant::Italic, "Roboto-Italic.ttf"),
                FontFace::new(FontVariant::BoldItalic, "Roboto-BoldItalic.ttf"),
            ],
            icons: vec![IconFont::new("forkawesome-webfont.ttf", vec![IconRange::new(0xf000, 0xf372)])],
            text_ranges: vec![IconRange::new(0x0020, 0x00ff)],
            sizes: vec![12.0, 16.0, 24.0, 32.0],
            default_size: 16.0,
            atlas_width: 1024,
        }
    }
}

impl FontConfig {
    /// No font files at all; layout runs on the placeholder font
    pub fn headless() -> Self {
        Self {
            faces: Vec::new(),
            icons: Vec::new(),
            ..Self::default()
        }
    }

    /// Replace the precomputed size table
    pub fn with_sizes(mut self, sizes: Vec<f32>) -> Self {
        self.sizes = sizes;
        self
    }

    /// Add an icon font after the configured ones
    pub fn with_icon(mut self, icon: IconFont) -> Self {
        self.icons.push(icon);
        self
    }

    /// Drop every icon font
    pub fn without_icons(mut self) -> Self {
        self.icons.clear();
        self
    }

    /// Every configured icon range, in merge order
    pub fn icon_ranges(&self) -> Vec<IconRange> {
        self.icons.iter().flat_map(|icon| icon.ranges.iter().copied()).collect()
    }

    /// Validate the font section
    pub fn validate(&self) -> Result<(), String> {
        if self.sizes.is_empty() {
            return Err("At least one precomputed font size is required".to_string());
        }
        if self.sizes.iter().any(|s| !(*s > 0.0)) {
            return Err("Font sizes must be positive".to_string());
        }
        if !(self.default_size > 0.0) {
            return Err("Default font size must be positive".to_string());
        }
        if !self.atlas_width.is_power_of_two() || self.atlas_width < 256 {
            return Err(format!("Atlas width {} must be a power of two >= 256", self.atlas_width));
        }
        let icon_ranges = self.icons.iter().flat_map(|icon| &icon.ranges);
        if icon_ranges.chain(&self.text_ranges).any(|r| r.start > r.end) {
            return Err("Glyph ranges must have start <= end".to_string());
        }
        if self.faces.iter().any(|f| f.variant == FontVariant::Icon) {
            return Err("The icon face is configured through `icons`, not `faces`".to_string());
        }
        Ok(())
    }
}

/// Drag-to-edit speeds for scalar tags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Value change per pixel of horizontal mouse movement
    pub speed: f32,
    /// Multiplier while the precise modifier (shift) is held
    pub precise_multiplier: f32,
    /// Multiplier while the fast modifier (ctrl) is held
    pub fast_multiplier: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            speed: 0.1,
            precise_multiplier: 0.1,
            fast_multiplier: 10.0,
        }
    }
}

/// Property-row geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Weight of the label column in property rows
    pub label_weight: f32,
    /// Weight of the value column in property rows
    pub value_weight: f32,
    /// Width of an axis tag in vector fields
    pub axis_tag_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            label_weight: 2.0,
            value_weight: 3.0,
            axis_tag_width: 18.0,
        }
    }
}

/// Settings file persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Settings file; `None` keeps everything in memory
    pub settings_path: Option<String>,
    /// Minimum seconds between toolkit-initiated saves
    pub save_interval_secs: f32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settings_path: Some("editor_gui.ini".to_string()),
            save_interval_secs: 5.0,
        }
    }
}

/// # Complete GUI Configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    /// Logging
    pub engine: EngineConfig,
    /// Fonts
    pub fonts: FontConfig,
    /// Drag speeds
    pub drag: DragConfig,
    /// Property-row layout
    pub layout: LayoutConfig,
    /// Settings persistence
    pub storage: StorageConfig,
}

impl GuiConfig {
    /// Configuration that keeps settings in memory only
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.storage.settings_path = None;
        config
    }

    /// In-memory settings and no font files; used by tests and headless tools
    pub fn headless() -> Self {
        Self::in_memory().with_fonts(FontConfig::headless())
    }

    /// Replace the font section
    pub fn with_fonts(mut self, fonts: FontConfig) -> Self {
        self.fonts = fonts;
        self
    }

    /// Use a settings file at `path`
    pub fn with_settings_path(mut self, path: impl Into<String>) -> Self {
        self.storage.settings_path = Some(path.into());
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fonts.validate().map_err(ConfigError::Invalid)?;

        if !(self.drag.speed > 0.0 && self.drag.precise_multiplier > 0.0 && self.drag.fast_multiplier > 0.0) {
            return Err(ConfigError::Invalid("Drag speed and multipliers must be positive".to_string()));
        }
        if self.layout.label_weight < 0.0 || self.layout.value_weight < 0.0 {
            return Err(ConfigError::Invalid("Property column weights cannot be negative".to_string()));
        }
        if self.storage.save_interval_secs < 0.0 {
            return Err(ConfigError::Invalid("Save interval cannot be negative".to_string()));
        }
        Ok(())
    }
}

impl Config for GuiConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GuiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            [fonts]
            sizes = [14.0, 18.0]

            [drag]
            fast_multiplier = 4.0
        "#;
        let config: GuiConfig = toml::from_str(text).unwrap();

        assert_eq!(config.fonts.sizes, vec![14.0, 18.0]);
        assert_eq!(config.fonts.faces[0].file, "Roboto-Regular.ttf");
        assert_eq!(config.drag.fast_multiplier, 4.0);
        assert_eq!(config.drag.precise_multiplier, 0.1);
        assert_eq!(config.layout.label_weight, 2.0);
    }

    #[test]
    fn test_ron_config_parses() {
        let text = "(engine: (log_level: \"debug\"), storage: (settings_path: None))";
        let config: GuiConfig = ron::from_str(text).unwrap();

        assert_eq!(config.engine.log_level, "debug");
        assert!(config.storage.settings_path.is_none());
    }

    #[test]
    fn test_validation_rejects_empty_sizes() {
        let config = GuiConfig::default().with_fonts(FontConfig::default().with_sizes(Vec::new()));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_faces_parse_from_toml() {
        let text = r#"
            [[fonts.faces]]
            variant = "Bold"
            file = "Inter-Bold.ttf"
        "#;
        let config: GuiConfig = toml::from_str(text).unwrap();

        assert_eq!(config.fonts.faces, vec![FontFace::new(FontVariant::Bold, "Inter-Bold.ttf")]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_headless_config_has_no_files() {
        let config = GuiConfig::headless();
        assert!(config.fonts.faces.is_empty());
        assert!(config.fonts.icons.is_empty());
        assert!(config.storage.settings_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_icon_fonts_parse_from_toml() {
        let text = r#"
            [[fonts.icons]]
            file = "forkawesome-webfont.ttf"
            ranges = [{ start = 0xf000, end = 0xf0ff }]

            [[fonts.icons]]
            file = "material-symbols.ttf"
            ranges = [{ start = 0xe000, end = 0xe0ff }, { start = 0xe800, end = 0xe8ff }]
        "#;
        let config: GuiConfig = toml::from_str(text).unwrap();

        assert_eq!(config.fonts.icons.len(), 2);
        assert_eq!(config.fonts.icons[1].file, "material-symbols.ttf");
        assert_eq!(config.fonts.icon_ranges().len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_inverted_icon_range() {
        let fonts = FontConfig::headless().with_icon(IconFont::new("icons.ttf", vec![IconRange::new(0xf0ff, 0xf000)]));
        let config = GuiConfig::default().with_fonts(fonts);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validation_rejects_odd_atlas_width() {
        let mut config = GuiConfig::default();
        config.fonts.atlas_width = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = GuiConfig::load_from_file("settings.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
