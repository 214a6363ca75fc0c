//! # Editor GUI
//!
//! Immediate-mode layout engine and draw-list renderer for editor panels.
//!
//! ## Features
//!
//! - **Layout Stack Engine**: scopes, alignment, font styles and cached column layouts
//! - **Property Rows**: labelled float, vector, quaternion and color fields with drag editing
//! - **Draw-List Renderer**: turns a frame's draw lists into scissored indexed draws
//! - **Texture Registry**: lazily binds GPU textures to toolkit ids
//! - **Persistent Storage**: typed values saved alongside the toolkit's settings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use editor_gui::prelude::*;
//!
//! fn main() -> Result<(), GuiError> {
//!     let mut device = HeadlessDevice::new();
//!     let loader = EmbeddedResources::with_builtin_shaders();
//!     let mut gui = Gui::new(&mut device, &loader, &GuiConfig::headless())?;
//!
//!     let mut position = [0.0f32; 3];
//!     let ui = gui.begin_frame(&InputSnapshot::new(Vec2::new(1280.0, 720.0)));
//!     ui.vector_field("Position", &mut position);
//!     gui.end_frame();
//!     gui.render(&mut device, &FrameBuffer::main(1280, 720))?;
//!
//!     gui.shutdown(&mut device)
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod input;
pub mod font;
pub mod texture;
pub mod toolkit;
pub mod layout;
pub mod render;
pub mod storage;

mod gui;

pub use gui::{Gui, GuiError, GuiResult};

/// Common imports for panel code
pub mod prelude {
    pub use crate::{
        Gui, GuiError, GuiResult,
        assets::{EmbeddedResources, DirectoryLoader, ResourceLoader},
        config::{Config, GuiConfig},
        font::{FontStyle, FontVariant},
        foundation::math::{Rect, Vec2},
        input::{InputSnapshot, Key, Modifiers, MouseButton},
        layout::{Align, LayoutContext},
        render::{FrameBuffer, GraphicsDevice, HeadlessDevice, RenderStats, TextureHandle},
        texture::TextureId,
    };
}
