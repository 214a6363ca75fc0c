//! Headless graphics device
//!
//! Keeps every resource in host memory and records submissions instead of
//! executing them. Used by the test suite and by tools that run the GUI
//! without a window.

use std::collections::HashMap;

use super::device::{
    BufferDesc, BufferHandle, CommandList, DeviceError, DeviceResult, FrameBuffer, GpuCommand,
    GraphicsDevice, PipelineDesc, PipelineHandle, ResourceBinding, ResourceLayoutDesc,
    ResourceLayoutHandle, ResourceSetDesc, ResourceSetHandle, SamplerDesc, SamplerHandle,
    ShaderDesc, ShaderHandle, ShaderStage, TextureDesc, TextureHandle,
};

/// A buffer held in host memory
#[derive(Debug, Clone)]
pub struct HostBuffer {
    /// Creation parameters
    pub desc: BufferDesc,
    /// Current contents
    pub data: Vec<u8>,
}

/// A texture held in host memory
#[derive(Debug, Clone)]
pub struct HostTexture {
    /// Creation parameters
    pub desc: TextureDesc,
    /// Uploaded texels
    pub pixels: Vec<u8>,
}

/// One recorded `submit` call
#[derive(Debug, Clone)]
pub struct Submission {
    /// Commands in order
    pub commands: CommandList,
    /// Framebuffer the commands targeted
    pub target: FrameBuffer,
}

/// Device that records instead of rendering
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_handle: u64,
    buffers: HashMap<u64, HostBuffer>,
    textures: HashMap<u64, HostTexture>,
    samplers: HashMap<u64, SamplerDesc>,
    shaders: HashMap<u64, ShaderStage>,
    layouts: HashMap<u64, ResourceLayoutDesc>,
    resource_sets: HashMap<u64, ResourceSetDesc>,
    pipelines: HashMap<u64, PipelineDesc>,
    submissions: Vec<Submission>,
    destroyed_resource_sets: Vec<ResourceSetHandle>,
}

impl HeadlessDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Buffer contents, if the handle is live
    pub fn buffer(&self, handle: BufferHandle) -> Option<&HostBuffer> {
        self.buffers.get(&handle.0)
    }

    /// Texture contents, if the handle is live
    pub fn texture(&self, handle: TextureHandle) -> Option<&HostTexture> {
        self.textures.get(&handle.0)
    }

    /// Resource set description, if the handle is live
    pub fn resource_set(&self, handle: ResourceSetHandle) -> Option<&ResourceSetDesc> {
        self.resource_sets.get(&handle.0)
    }

    /// Texture bound in a live resource set, if it has one
    pub fn texture_of_set(&self, handle: ResourceSetHandle) -> Option<TextureHandle> {
        self.resource_set(handle)?.bindings.iter().find_map(|b| match b {
            ResourceBinding::Texture(texture) => Some(*texture),
            _ => None,
        })
    }

    /// Number of live buffers
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of live textures
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Number of live resource sets
    pub fn live_resource_sets(&self) -> usize {
        self.resource_sets.len()
    }

    /// Number of live pipelines
    pub fn live_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    /// Total number of live resources of any kind
    pub fn live_resources(&self) -> usize {
        self.buffers.len()
            + self.textures.len()
            + self.samplers.len()
            + self.shaders.len()
            + self.layouts.len()
            + self.resource_sets.len()
            + self.pipelines.len()
    }

    /// Resource sets destroyed so far, in order
    pub fn destroyed_resource_sets(&self) -> &[ResourceSetHandle] {
        &self.destroyed_resource_sets
    }

    /// All recorded submissions
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// The most recent submission
    pub fn last_submission(&self) -> Option<&Submission> {
        self.submissions.last()
    }

    /// Forget recorded submissions
    pub fn clear_submissions(&mut self) {
        self.submissions.clear();
    }

    fn unknown(kind: &'static str, id: u64) -> DeviceError {
        DeviceError::UnknownHandle { kind, id }
    }

    fn validate(&self, commands: &CommandList) -> DeviceResult<()> {
        for command in commands.commands() {
            match command {
                GpuCommand::SetPipeline(p) if !self.pipelines.contains_key(&p.0) => {
                    return Err(Self::unknown("pipeline", p.0));
                }
                GpuCommand::SetVertexBuffer(b) | GpuCommand::SetIndexBuffer(b, _)
                    if !self.buffers.contains_key(&b.0) =>
                {
                    return Err(Self::unknown("buffer", b.0));
                }
                GpuCommand::SetResourceSet { set, .. } if !self.resource_sets.contains_key(&set.0) => {
                    return Err(Self::unknown("resource set", set.0));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(&mut self, desc: &BufferDesc) -> DeviceResult<BufferHandle> {
        let id = self.allocate();
        let data = vec![0; desc.size as usize];
        self.buffers.insert(id, HostBuffer { desc: desc.clone(), data });
        Ok(BufferHandle(id))
    }

    fn update_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> DeviceResult<()> {
        let host = self.buffers.get_mut(&buffer.0).ok_or_else(|| Self::unknown("buffer", buffer.0))?;
        let size = host.data.len() as u64;
        let len = data.len() as u64;
        if offset + len > size {
            return Err(DeviceError::OutOfBounds { offset, len, size });
        }
        let start = offset as usize;
        host.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) -> DeviceResult<()> {
        self.buffers.remove(&buffer.0).map(|_| ()).ok_or_else(|| Self::unknown("buffer", buffer.0))
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> DeviceResult<TextureHandle> {
        let expected = desc.byte_size();
        if pixels.len() != expected {
            return Err(DeviceError::TextureSizeMismatch { expected, actual: pixels.len() });
        }
        let id = self.allocate();
        self.textures.insert(id, HostTexture { desc: desc.clone(), pixels: pixels.to_vec() });
        Ok(TextureHandle(id))
    }

    fn destroy_texture(&mut self, texture: TextureHandle) -> DeviceResult<()> {
        self.textures.remove(&texture.0).map(|_| ()).ok_or_else(|| Self::unknown("texture", texture.0))
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> DeviceResult<SamplerHandle> {
        let id = self.allocate();
        self.samplers.insert(id, *desc);
        Ok(SamplerHandle(id))
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) -> DeviceResult<()> {
        self.samplers.remove(&sampler.0).map(|_| ()).ok_or_else(|| Self::unknown("sampler", sampler.0))
    }

    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> DeviceResult<ShaderHandle> {
        if desc.code.is_empty() {
            return Err(DeviceError::ShaderCompilation("empty shader module".to_string()));
        }
        let id = self.allocate();
        self.shaders.insert(id, desc.stage);
        Ok(ShaderHandle(id))
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) -> DeviceResult<()> {
        self.shaders.remove(&shader.0).map(|_| ()).ok_or_else(|| Self::unknown("shader", shader.0))
    }

    fn create_resource_layout(&mut self, desc: &ResourceLayoutDesc) -> DeviceResult<ResourceLayoutHandle> {
        let id = self.allocate();
        self.layouts.insert(id, desc.clone());
        Ok(ResourceLayoutHandle(id))
    }

    fn destroy_resource_layout(&mut self, layout: ResourceLayoutHandle) -> DeviceResult<()> {
        self.layouts
            .remove(&layout.0)
            .map(|_| ())
            .ok_or_else(|| Self::unknown("resource layout", layout.0))
    }

    fn create_resource_set(&mut self, desc: &ResourceSetDesc) -> DeviceResult<ResourceSetHandle> {
        let layout = self
            .layouts
            .get(&desc.layout.0)
            .ok_or_else(|| Self::unknown("resource layout", desc.layout.0))?;
        if layout.entries.len() != desc.bindings.len() {
            return Err(DeviceError::Backend(format!(
                "Resource set '{}' has {} bindings, layout '{}' expects {}",
                desc.label,
                desc.bindings.len(),
                layout.label,
                layout.entries.len()
            )));
        }
        for binding in &desc.bindings {
            match binding {
                ResourceBinding::Buffer(b) if !self.buffers.contains_key(&b.0) => {
                    return Err(Self::unknown("buffer", b.0));
                }
                ResourceBinding::Sampler(s) if !self.samplers.contains_key(&s.0) => {
                    return Err(Self::unknown("sampler", s.0));
                }
                ResourceBinding::Texture(t) if !self.textures.contains_key(&t.0) => {
                    return Err(Self::unknown("texture", t.0));
                }
                _ => {}
            }
        }
        let id = self.allocate();
        self.resource_sets.insert(id, desc.clone());
        Ok(ResourceSetHandle(id))
    }

    fn destroy_resource_set(&mut self, set: ResourceSetHandle) -> DeviceResult<()> {
        self.resource_sets.remove(&set.0).ok_or_else(|| Self::unknown("resource set", set.0))?;
        self.destroyed_resource_sets.push(set);
        Ok(())
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> DeviceResult<PipelineHandle> {
        for shader in [desc.vertex_shader, desc.fragment_shader] {
            if !self.shaders.contains_key(&shader.0) {
                return Err(Self::unknown("shader", shader.0));
            }
        }
        let id = self.allocate();
        self.pipelines.insert(id, desc.clone());
        Ok(PipelineHandle(id))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) -> DeviceResult<()> {
        self.pipelines.remove(&pipeline.0).map(|_| ()).ok_or_else(|| Self::unknown("pipeline", pipeline.0))
    }

    fn submit(&mut self, commands: &CommandList, target: &FrameBuffer) -> DeviceResult<()> {
        self.validate(commands)?;
        log::trace!("Headless submit: {} commands to framebuffer {}", commands.commands().len(), target.id);
        self.submissions.push(Submission { commands: commands.clone(), target: *target });
        Ok(())
    }
}
