//! Texture binding registry
//!
//! Gives each application texture a stable [`TextureId`] and owns the
//! resource set that binds it. Ids are never reused: unbinding and binding
//! the same texture again hands out a fresh id.

use std::collections::HashMap;

use crate::render::{
    DeviceResult, GraphicsDevice, ResourceBinding, ResourceLayoutHandle, ResourceSetDesc, ResourceSetHandle,
    TextureHandle,
};

use super::TextureId;

#[derive(Debug, Clone, Copy)]
struct Binding {
    texture: TextureHandle,
    resource_set: ResourceSetHandle,
}

/// Maps textures to ids and ids to resource sets
#[derive(Debug)]
pub struct TextureBindingRegistry {
    layout: ResourceLayoutHandle,
    by_texture: HashMap<TextureHandle, TextureId>,
    by_id: HashMap<TextureId, Binding>,
    font_atlas: Option<Binding>,
    next_id: u64,
}

impl TextureBindingRegistry {
    /// Registry creating resource sets with `layout` (one texture slot)
    pub fn new(layout: ResourceLayoutHandle) -> Self {
        Self {
            layout,
            by_texture: HashMap::new(),
            by_id: HashMap::new(),
            font_atlas: None,
            next_id: TextureId::FIRST_USER,
        }
    }

    fn create_set(&self, device: &mut dyn GraphicsDevice, texture: TextureHandle, label: String) -> DeviceResult<ResourceSetHandle> {
        device.create_resource_set(&ResourceSetDesc {
            label,
            layout: self.layout,
            bindings: vec![ResourceBinding::Texture(texture)],
        })
    }

    /// Id for `texture`, creating its resource set on first use
    pub fn get_or_bind(&mut self, device: &mut dyn GraphicsDevice, texture: TextureHandle) -> DeviceResult<TextureId> {
        if let Some(id) = self.by_texture.get(&texture) {
            return Ok(*id);
        }

        let id = TextureId(self.next_id);
        let resource_set = self.create_set(device, texture, format!("gui-texture-{}", id.0))?;
        self.next_id += 1;

        self.by_texture.insert(texture, id);
        self.by_id.insert(id, Binding { texture, resource_set });
        log::debug!("Bound {:?} as {:?}", texture, id);
        Ok(id)
    }

    /// Release the binding for `texture`; returns whether it was bound
    pub fn unbind(&mut self, device: &mut dyn GraphicsDevice, texture: TextureHandle) -> DeviceResult<bool> {
        let Some(id) = self.by_texture.remove(&texture) else {
            return Ok(false);
        };
        if let Some(binding) = self.by_id.remove(&id) {
            device.destroy_resource_set(binding.resource_set)?;
        }
        log::debug!("Unbound {:?} ({:?})", texture, id);
        Ok(true)
    }

    /// Whether `texture` currently has an id
    pub fn is_bound(&self, texture: TextureHandle) -> bool {
        self.by_texture.contains_key(&texture)
    }

    /// Id of `texture`, if bound
    pub fn id_of(&self, texture: TextureHandle) -> Option<TextureId> {
        self.by_texture.get(&texture).copied()
    }

    /// Number of bound user textures
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no user texture is bound
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Replace the font atlas binding, destroying the previous resource set
    pub fn bind_font_atlas(&mut self, device: &mut dyn GraphicsDevice, texture: TextureHandle) -> DeviceResult<()> {
        let resource_set = self.create_set(device, texture, "gui-font-atlas".to_string())?;
        if let Some(old) = self.font_atlas.replace(Binding { texture, resource_set }) {
            device.destroy_resource_set(old.resource_set)?;
        }
        Ok(())
    }

    /// Texture currently bound as the font atlas
    pub fn font_atlas_texture(&self) -> Option<TextureHandle> {
        self.font_atlas.map(|b| b.texture)
    }

    /// Resource set a draw command with `id` should bind
    ///
    /// The font atlas id, [`TextureId::NONE`] and any id that is not bound
    /// all resolve to the font atlas set. `None` only before the atlas exists.
    pub fn resolve(&self, id: TextureId) -> Option<ResourceSetHandle> {
        self.by_id
            .get(&id)
            .or(self.font_atlas.as_ref())
            .map(|binding| binding.resource_set)
    }

    /// Destroy every resource set, the font atlas set included
    pub fn dispose_all(&mut self, device: &mut dyn GraphicsDevice) -> DeviceResult<()> {
        let count = self.by_id.len();
        for (_, binding) in self.by_id.drain() {
            device.destroy_resource_set(binding.resource_set)?;
        }
        self.by_texture.clear();
        if let Some(atlas) = self.font_atlas.take() {
            device.destroy_resource_set(atlas.resource_set)?;
        }
        log::debug!("Disposed {} texture bindings", count);
        Ok(())
    }
}
