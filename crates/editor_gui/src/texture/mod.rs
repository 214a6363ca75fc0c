//! Texture identity for the toolkit
//!
//! The toolkit refers to textures by opaque [`TextureId`]s; the registry
//! maps those to the GPU resource sets the renderer binds.

mod registry;

pub use registry::TextureBindingRegistry;

/// Opaque texture identifier carried by draw commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureId(pub u64);

impl TextureId {
    /// No texture; resolves to the font atlas
    pub const NONE: Self = Self(0);

    /// The font atlas
    pub const FONT_ATLAS: Self = Self(1);

    /// First id handed out for user textures
    pub(crate) const FIRST_USER: u64 = 100;

    /// Whether this id was handed out for a user texture
    pub fn is_user(self) -> bool {
        self.0 >= Self::FIRST_USER
    }
}
