//! Render bridge
//!
//! [`Gui`] ties the layout engine to the device: it owns the fonts, the
//! texture registry, the draw-list renderer and the persistent storage, and
//! walks each frame through begin, layout, end and render.

use std::path::PathBuf;

use crate::assets::{ResourceError, ResourceLoader};
use crate::config::{ConfigError, GuiConfig, IconRange};
use crate::font::{FontError, FontManager, FontVariant};
use crate::input::InputSnapshot;
use crate::layout::LayoutContext;
use crate::render::{DeviceError, DrawListRenderer, FrameBuffer, GraphicsDevice, RenderError, RenderStats, TextureHandle};
use crate::storage::{read_settings_file, write_settings_file, PersistentStorage, StorageError, StorageType};
use crate::texture::{TextureBindingRegistry, TextureId};

/// Result type for bridge operations
pub type GuiResult<T> = Result<T, GuiError>;

/// Errors raised while creating or driving a [`Gui`]
#[derive(Debug, thiserror::Error)]
pub enum GuiError {
    /// Font loading or atlas baking failed
    #[error("Font error: {0}")]
    Font(#[from] FontError),

    /// Rendering failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// A device call outside rendering failed
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Settings file could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A resource could not be loaded
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Idle,
    Building,
    Ended,
}

/// Layout engine plus everything needed to put its output on screen
pub struct Gui {
    layout: LayoutContext,
    fonts: FontManager,
    registry: TextureBindingRegistry,
    renderer: DrawListRenderer,
    storage: PersistentStorage,
    settings_path: Option<PathBuf>,
    saved_settings: String,
    state: FrameState,
}

impl Gui {
    /// Create the renderer, bake the configured fonts and load saved settings
    pub fn new(device: &mut dyn GraphicsDevice, loader: &dyn ResourceLoader, config: &GuiConfig) -> GuiResult<Self> {
        config.validate()?;

        let mut fonts = FontManager::new(&config.fonts);
        fonts.load_default_fonts(loader)?;
        let upload = fonts.rebuild_atlas(device)?;

        let renderer = DrawListRenderer::new(device, loader)?;
        let mut registry = TextureBindingRegistry::new(renderer.texture_layout());
        registry.bind_font_atlas(device, upload.texture)?;

        let mut layout = LayoutContext::new(fonts.atlas().clone(), fonts.selector().clone(), config);
        let mut storage = PersistentStorage::new();
        let settings_path = config.storage.settings_path.as_ref().map(PathBuf::from);
        let saved_settings = match &settings_path {
            Some(path) => read_settings_file(path)?.unwrap_or_default(),
            None => String::new(),
        };
        if !saved_settings.is_empty() {
            let sections = layout.toolkit_mut().load_settings(&saved_settings);
            let entries = storage.load_from_settings(&saved_settings);
            log::info!("Loaded {} settings sections and {} stored values", sections, entries);
        }

        log::info!("GUI initialized");
        Ok(Self {
            layout,
            fonts,
            registry,
            renderer,
            storage,
            settings_path,
            saved_settings,
            state: FrameState::Idle,
        })
    }

    // ----- frame -----------------------------------------------------------

    /// Start a frame and hand out the layout context
    ///
    /// # Panics
    /// If a frame is being built, or the previous frame was ended but never rendered.
    pub fn begin_frame(&mut self, snapshot: &InputSnapshot) -> &mut LayoutContext {
        match self.state {
            FrameState::Building => panic!("begin_frame called while a frame is already active"),
            FrameState::Ended => panic!("begin_frame called before the previous frame was rendered"),
            FrameState::Idle => {}
        }
        self.state = FrameState::Building;
        self.layout.begin_frame(snapshot);
        &mut self.layout
    }

    /// Layout context of the frame being built
    pub fn layout(&mut self) -> &mut LayoutContext {
        &mut self.layout
    }

    /// Finish the frame and write settings when a save is due
    ///
    /// # Panics
    /// Without an active frame, or when the layout stacks are unbalanced.
    pub fn end_frame(&mut self) {
        assert!(self.state == FrameState::Building, "end_frame called without begin_frame");
        self.layout.end_frame();
        self.state = FrameState::Ended;

        if self.storage.take_dirty() {
            self.layout.toolkit_mut().request_settings_save();
        }
        if let Some(toolkit_text) = self.layout.toolkit_mut().take_settings_save() {
            let text = self.storage.inject(&toolkit_text);
            if let Some(path) = &self.settings_path {
                match write_settings_file(path, &text) {
                    Ok(()) => log::debug!("Saved settings to {}", path.display()),
                    Err(err) => log::warn!("Failed to save settings: {}", err),
                }
            }
            self.saved_settings = text;
        }
    }

    /// Render the ended frame into `target`
    ///
    /// # Panics
    /// If no frame was ended since the last render.
    pub fn render(&mut self, device: &mut dyn GraphicsDevice, target: &FrameBuffer) -> GuiResult<RenderStats> {
        assert!(self.state == FrameState::Ended, "render called without an ended frame");
        self.state = FrameState::Idle;
        let stats = self.renderer.render(device, self.layout.draw_data(), &self.registry, target)?;
        Ok(stats)
    }

    /// Whether a frame is between begin and render
    pub fn is_frame_open(&self) -> bool {
        self.state != FrameState::Idle
    }

    // ----- textures --------------------------------------------------------

    /// Toolkit id for `texture`, binding it on first use
    pub fn get_or_bind_texture(&mut self, device: &mut dyn GraphicsDevice, texture: TextureHandle) -> GuiResult<TextureId> {
        Ok(self.registry.get_or_bind(device, texture)?)
    }

    /// Release the binding of `texture`; returns whether one existed
    pub fn unbind_texture(&mut self, device: &mut dyn GraphicsDevice, texture: TextureHandle) -> GuiResult<bool> {
        Ok(self.registry.unbind(device, texture)?)
    }

    /// Whether `texture` currently has a toolkit id
    pub fn is_texture_bound(&self, texture: TextureHandle) -> bool {
        self.registry.is_bound(texture)
    }

    /// Texture registry
    pub fn textures(&self) -> &TextureBindingRegistry {
        &self.registry
    }

    // ----- storage ---------------------------------------------------------

    /// Store a value in the settings file's private section
    pub fn set_storage_data<T: StorageType>(&mut self, key: &str, value: T) {
        self.storage.set(key, value);
    }

    /// Stored value under `key`, or `default`
    pub fn get_storage_data<T: StorageType>(&self, key: &str, default: T) -> T {
        self.storage.get(key, default)
    }

    /// Persistent storage
    pub fn storage(&self) -> &PersistentStorage {
        &self.storage
    }

    /// Settings text as last written, storage section included
    pub fn saved_settings(&self) -> &str {
        &self.saved_settings
    }

    /// Save settings at the end of the next frame
    pub fn save_settings(&mut self) {
        self.layout.toolkit_mut().request_settings_save();
    }

    // ----- fonts -----------------------------------------------------------

    /// Queue a text face; takes effect on [`Self::rebuild_fonts`]
    pub fn add_font_base(&mut self, loader: &dyn ResourceLoader, variant: FontVariant, file: &str, size_px: f32) -> GuiResult<()> {
        self.fonts.add_font_base(loader, variant, file, size_px)?;
        Ok(())
    }

    /// Merge `ranges` of `file` into the last queued face
    pub fn register_icon(
        &mut self,
        loader: &dyn ResourceLoader,
        file: &str,
        size_px: f32,
        ranges: &[IconRange],
    ) -> GuiResult<()> {
        self.fonts.register_icon(loader, file, size_px, ranges)?;
        Ok(())
    }

    /// Bake the queued faces and switch the layout to the new atlas
    ///
    /// # Panics
    /// While a frame is open.
    pub fn rebuild_fonts(&mut self, device: &mut dyn GraphicsDevice) -> GuiResult<()> {
        assert!(!self.is_frame_open(), "fonts cannot be rebuilt while a frame is open");
        let upload = self.fonts.rebuild_atlas(device)?;
        self.registry.bind_font_atlas(device, upload.texture)?;
        if let Some(retired) = upload.retired {
            device.destroy_texture(retired)?;
        }
        self.layout.set_fonts(self.fonts.atlas().clone(), self.fonts.selector().clone());
        Ok(())
    }

    /// Font manager
    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    /// Scale all text by `zoom` without rebaking
    pub fn set_zoom(&mut self, zoom: f32) {
        self.fonts.set_zoom(zoom);
        self.layout.set_zoom(zoom);
    }

    /// Release every device object the bridge created
    pub fn shutdown(mut self, device: &mut dyn GraphicsDevice) -> GuiResult<()> {
        self.registry.dispose_all(device)?;
        self.renderer.destroy(device)?;
        self.fonts.destroy(device)?;
        log::info!("GUI shut down");
        Ok(())
    }
}
