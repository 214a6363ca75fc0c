//! Draw-list renderer
//!
//! Owns the pipeline, the projection uniform and the growable vertex and
//! index buffers. Each frame it flattens every draw list into one upload,
//! binds the global state once, then records one scissored indexed draw per
//! draw command.

use crate::assets::{ResourceLoader, GUI_FRAGMENT_SHADER, GUI_VERTEX_SHADER};
use crate::foundation::math::{orthographic_projection, Vec2};
use crate::texture::TextureBindingRegistry;
use crate::toolkit::{DrawCmd, DrawData};

use super::device::{
    BlendMode, BufferDesc, BufferHandle, BufferUsage, CommandList, CullMode, FrameBuffer, GraphicsDevice,
    IndexFormat, PipelineDesc, PipelineHandle, ResourceBinding, ResourceKind, ResourceLayoutDesc,
    ResourceLayoutEntry, ResourceLayoutHandle, ResourceSetDesc, ResourceSetHandle, SamplerDesc, SamplerFilter,
    SamplerHandle, ScissorRect, ShaderDesc, ShaderHandle, ShaderStage, Viewport,
};
use super::vertex::{GpuVertex, ProjectionUniform};
use super::{RenderError, RenderResult};

const INITIAL_VERTEX_CAPACITY: u64 = 5_000;
const INITIAL_INDEX_CAPACITY: u64 = 10_000;

/// Set index of the projection and sampler
const GLOBAL_SET: u32 = 0;
/// Set index of the per-command texture
const TEXTURE_SET: u32 = 1;

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Indexed draws recorded
    pub draw_calls: u32,
    /// Commands carrying a callback, skipped
    pub skipped_callbacks: u32,
    /// Commands whose scissor was empty
    pub culled_commands: u32,
    /// Vertices uploaded
    pub vertices: u32,
    /// Indices uploaded
    pub indices: u32,
    /// Buffers recreated to fit the frame
    pub buffer_resizes: u32,
}

#[derive(Debug)]
struct GrowableBuffer {
    handle: BufferHandle,
    capacity: u64,
    label: &'static str,
    usage: BufferUsage,
}

impl GrowableBuffer {
    fn new(device: &mut dyn GraphicsDevice, label: &'static str, usage: BufferUsage, capacity: u64) -> RenderResult<Self> {
        let handle = device.create_buffer(&BufferDesc { label, size: capacity, usage, dynamic: true })?;
        Ok(Self { handle, capacity, label, usage })
    }

    /// Make room for `needed` bytes; returns whether the buffer was recreated
    fn ensure(&mut self, device: &mut dyn GraphicsDevice, needed: u64) -> RenderResult<bool> {
        if needed <= self.capacity {
            return Ok(false);
        }
        let capacity = needed.max(self.capacity + self.capacity / 2);
        let handle = device.create_buffer(&BufferDesc { label: self.label, size: capacity, usage: self.usage, dynamic: true })?;
        device.destroy_buffer(self.handle)?;
        log::debug!("Grew {} from {} to {} bytes", self.label, self.capacity, capacity);
        self.handle = handle;
        self.capacity = capacity;
        Ok(true)
    }
}

/// Renders toolkit draw data through a [`GraphicsDevice`]
#[derive(Debug)]
pub struct DrawListRenderer {
    vertex_shader: ShaderHandle,
    fragment_shader: ShaderHandle,
    global_layout: ResourceLayoutHandle,
    texture_layout: ResourceLayoutHandle,
    pipeline: PipelineHandle,
    sampler: SamplerHandle,
    uniform_buffer: BufferHandle,
    global_set: ResourceSetHandle,
    vertex_buffer: GrowableBuffer,
    index_buffer: GrowableBuffer,
    vertices: Vec<GpuVertex>,
    indices: Vec<u16>,
    commands: CommandList,
    warned_callbacks: bool,
}

impl DrawListRenderer {
    /// Create every device object the renderer needs, loading shaders from `loader`
    pub fn new(device: &mut dyn GraphicsDevice, loader: &dyn ResourceLoader) -> RenderResult<Self> {
        let vertex_code = loader.load(GUI_VERTEX_SHADER)?;
        let fragment_code = loader.load(GUI_FRAGMENT_SHADER)?;

        let vertex_shader = device.create_shader(&ShaderDesc {
            stage: ShaderStage::Vertex,
            code: &vertex_code,
            entry_point: "main",
        })?;
        let fragment_shader = device.create_shader(&ShaderDesc {
            stage: ShaderStage::Fragment,
            code: &fragment_code,
            entry_point: "main",
        })?;

        let global_layout = device.create_resource_layout(&ResourceLayoutDesc {
            label: "gui-global",
            entries: vec![
                ResourceLayoutEntry { name: "Projection", kind: ResourceKind::UniformBuffer, stage: ShaderStage::Vertex },
                ResourceLayoutEntry { name: "gui_sampler", kind: ResourceKind::Sampler, stage: ShaderStage::Fragment },
            ],
        })?;
        let texture_layout = device.create_resource_layout(&ResourceLayoutDesc {
            label: "gui-texture",
            entries: vec![ResourceLayoutEntry {
                name: "gui_texture",
                kind: ResourceKind::Texture,
                stage: ShaderStage::Fragment,
            }],
        })?;

        let pipeline = device.create_pipeline(&PipelineDesc {
            label: "gui",
            vertex_shader,
            fragment_shader,
            vertex_stride: GpuVertex::STRIDE,
            vertex_attributes: GpuVertex::attributes(),
            resource_layouts: vec![global_layout, texture_layout],
            blend: BlendMode::AlphaBlend,
            cull: CullMode::None,
            depth_test: false,
            scissor_test: true,
        })?;

        let sampler = device.create_sampler(&SamplerDesc { filter: SamplerFilter::Linear, clamp: true })?;
        let uniform_buffer = device.create_buffer(&BufferDesc {
            label: "gui-projection",
            size: ProjectionUniform::SIZE,
            usage: BufferUsage::Uniform,
            dynamic: true,
        })?;
        let global_set = device.create_resource_set(&ResourceSetDesc {
            label: "gui-global".to_string(),
            layout: global_layout,
            bindings: vec![ResourceBinding::Buffer(uniform_buffer), ResourceBinding::Sampler(sampler)],
        })?;

        let vertex_buffer = GrowableBuffer::new(
            device,
            "gui-vertices",
            BufferUsage::Vertex,
            INITIAL_VERTEX_CAPACITY * u64::from(GpuVertex::STRIDE),
        )?;
        let index_buffer = GrowableBuffer::new(device, "gui-indices", BufferUsage::Index, INITIAL_INDEX_CAPACITY * 2)?;

        log::info!("Draw-list renderer created");
        Ok(Self {
            vertex_shader,
            fragment_shader,
            global_layout,
            texture_layout,
            pipeline,
            sampler,
            uniform_buffer,
            global_set,
            vertex_buffer,
            index_buffer,
            vertices: Vec::new(),
            indices: Vec::new(),
            commands: CommandList::new(),
            warned_callbacks: false,
        })
    }

    /// Layout texture resource sets must use
    pub fn texture_layout(&self) -> ResourceLayoutHandle {
        self.texture_layout
    }

    /// Commands recorded by the last [`Self::render`]
    pub fn last_commands(&self) -> &CommandList {
        &self.commands
    }

    /// Bytes currently reserved for vertices and indices
    pub fn buffer_capacity(&self) -> (u64, u64) {
        (self.vertex_buffer.capacity, self.index_buffer.capacity)
    }

    /// Record and submit `draw_data` into `target`
    ///
    /// Nothing is submitted for an empty frame or a zero-sized display.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        draw_data: &DrawData,
        registry: &TextureBindingRegistry,
        target: &FrameBuffer,
    ) -> RenderResult<RenderStats> {
        let mut stats = RenderStats::default();
        let scale = draw_data.framebuffer_scale;
        let fb_width = (draw_data.display_size.x * scale.x).min(target.width as f32);
        let fb_height = (draw_data.display_size.y * scale.y).min(target.height as f32);
        if fb_width <= 0.0 || fb_height <= 0.0 || draw_data.total_vtx_count() == 0 {
            self.commands.clear();
            return Ok(stats);
        }

        self.upload(device, draw_data, &mut stats)?;

        let commands = &mut self.commands;
        commands.clear();
        commands.set_pipeline(self.pipeline);
        commands.set_vertex_buffer(self.vertex_buffer.handle);
        commands.set_index_buffer(self.index_buffer.handle, IndexFormat::U16);
        commands.set_resource_set(GLOBAL_SET, self.global_set);
        commands.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            width: target.width as f32,
            height: target.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });

        let fb_size = Vec2::new(fb_width, fb_height);
        let mut bound_set = None;
        let mut global_vtx = 0u32;
        let mut global_idx = 0u32;
        for list in &draw_data.draw_lists {
            for cmd in list.commands() {
                if cmd.callback.is_some() {
                    if !self.warned_callbacks {
                        log::warn!("Draw callbacks are not supported by the draw-list renderer; skipping");
                        self.warned_callbacks = true;
                    }
                    stats.skipped_callbacks += 1;
                    continue;
                }
                let Some(scissor) = scissor_rect(cmd, draw_data.display_pos, scale, fb_size) else {
                    stats.culled_commands += 1;
                    continue;
                };
                let set = registry.resolve(cmd.texture_id).ok_or(RenderError::AtlasNotBound)?;
                if bound_set != Some(set) {
                    commands.set_resource_set(TEXTURE_SET, set);
                    bound_set = Some(set);
                }
                commands.set_scissor(scissor);
                commands.draw_indexed(cmd.elem_count, global_idx + cmd.idx_offset, (global_vtx + cmd.vtx_offset) as i32);
                stats.draw_calls += 1;
            }
            global_vtx += list.vertices().len() as u32;
            global_idx += list.indices().len() as u32;
        }

        device.submit(&self.commands, target)?;
        log::trace!(
            "GUI frame: {} draws, {} culled, {} vertices, {} indices",
            stats.draw_calls,
            stats.culled_commands,
            stats.vertices,
            stats.indices
        );
        Ok(stats)
    }

    fn upload(&mut self, device: &mut dyn GraphicsDevice, draw_data: &DrawData, stats: &mut RenderStats) -> RenderResult<()> {
        let projection = orthographic_projection(draw_data.display_pos, draw_data.display_size);
        let uniform = ProjectionUniform::new(&projection);
        device.update_buffer(self.uniform_buffer, 0, bytemuck::bytes_of(&uniform))?;

        self.vertices.clear();
        self.indices.clear();
        for list in &draw_data.draw_lists {
            self.vertices.extend(list.vertices().iter().map(GpuVertex::from));
            self.indices.extend_from_slice(list.indices());
        }
        stats.vertices = self.vertices.len() as u32;
        stats.indices = self.indices.len() as u32;
        // keep the index upload a multiple of 4 bytes
        if self.indices.len() % 2 == 1 {
            self.indices.push(0);
        }

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&self.indices);
        if self.vertex_buffer.ensure(device, vertex_bytes.len() as u64)? {
            stats.buffer_resizes += 1;
        }
        if self.index_buffer.ensure(device, index_bytes.len() as u64)? {
            stats.buffer_resizes += 1;
        }
        device.update_buffer(self.vertex_buffer.handle, 0, vertex_bytes)?;
        device.update_buffer(self.index_buffer.handle, 0, index_bytes)?;
        Ok(())
    }

    /// Destroy every device object
    pub fn destroy(self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        device.destroy_resource_set(self.global_set)?;
        device.destroy_buffer(self.vertex_buffer.handle)?;
        device.destroy_buffer(self.index_buffer.handle)?;
        device.destroy_buffer(self.uniform_buffer)?;
        device.destroy_sampler(self.sampler)?;
        device.destroy_pipeline(self.pipeline)?;
        device.destroy_resource_layout(self.texture_layout)?;
        device.destroy_resource_layout(self.global_layout)?;
        device.destroy_shader(self.fragment_shader)?;
        device.destroy_shader(self.vertex_shader)?;
        log::info!("Draw-list renderer destroyed");
        Ok(())
    }
}

/// Framebuffer-space scissor for `cmd`, `None` when nothing of it is visible
fn scissor_rect(cmd: &DrawCmd, display_pos: Vec2, scale: Vec2, fb_size: Vec2) -> Option<ScissorRect> {
    let min = (cmd.clip_rect.min - display_pos).component_mul(&scale);
    let max = (cmd.clip_rect.max - display_pos).component_mul(&scale);
    let min_x = min.x.max(0.0);
    let min_y = min.y.max(0.0);
    let max_x = max.x.min(fb_size.x);
    let max_y = max.y.min(fb_size.y);
    if max_x <= min_x || max_y <= min_y {
        return None;
    }
    let x = min_x as u32;
    let y = min_y as u32;
    let width = (max_x as u32).saturating_sub(x);
    let height = (max_y as u32).saturating_sub(y);
    (width > 0 && height > 0).then_some(ScissorRect { x, y, width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::EmbeddedResources;
    use crate::foundation::math::Rect;
    use crate::render::{GpuCommand, HeadlessDevice, TextureDesc, TextureFormat};
    use crate::texture::TextureId;
    use crate::toolkit::{DrawCallback, DrawList};

    const WHITE: u32 = 0xffff_ffff;

    struct Setup {
        device: HeadlessDevice,
        renderer: DrawListRenderer,
        registry: TextureBindingRegistry,
    }

    fn setup() -> Setup {
        let mut device = HeadlessDevice::new();
        let renderer = DrawListRenderer::new(&mut device, &EmbeddedResources::with_builtin_shaders()).unwrap();
        let mut registry = TextureBindingRegistry::new(renderer.texture_layout());
        let atlas = texture(&mut device);
        registry.bind_font_atlas(&mut device, atlas).unwrap();
        Setup { device, renderer, registry }
    }

    fn texture(device: &mut HeadlessDevice) -> crate::render::TextureHandle {
        let desc = TextureDesc { label: "t".into(), width: 1, height: 1, format: TextureFormat::Rgba8Unorm };
        device.create_texture(&desc, &[255; 4]).unwrap()
    }

    fn draw_data(lists: Vec<DrawList>) -> DrawData {
        DrawData {
            display_pos: Vec2::zeros(),
            display_size: Vec2::new(100.0, 100.0),
            framebuffer_scale: Vec2::new(2.0, 2.0),
            draw_lists: lists,
        }
    }

    fn list_with_clip(clip: Rect) -> DrawList {
        let mut list = DrawList::default();
        list.push_clip_rect(clip, false);
        list.add_rect_filled(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0), WHITE);
        list.pop_clip_rect();
        list.finish();
        list
    }

    fn scissors(commands: &CommandList) -> Vec<ScissorRect> {
        commands
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::SetScissor(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_scissor_is_scaled_and_clamped() {
        let mut s = setup();
        let data = draw_data(vec![list_with_clip(Rect::new(Vec2::new(-10.0, 25.0), Vec2::new(50.0, 400.0)))]);
        let stats = s.renderer.render(&mut s.device, &data, &s.registry, &FrameBuffer::main(200, 200)).unwrap();

        assert_eq!(stats.draw_calls, 1);
        assert_eq!(scissors(s.renderer.last_commands()), vec![ScissorRect { x: 0, y: 50, width: 100, height: 150 }]);
    }

    #[test]
    fn test_viewport_covers_whole_target() {
        let mut s = setup();
        let data = draw_data(vec![list_with_clip(Rect::new(Vec2::zeros(), Vec2::new(100.0, 100.0)))]);
        s.renderer.render(&mut s.device, &data, &s.registry, &FrameBuffer::main(300, 300)).unwrap();

        let viewports: Vec<_> = s
            .renderer
            .last_commands()
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::SetViewport(v) => Some((v.width, v.height)),
                _ => None,
            })
            .collect();
        assert_eq!(viewports, vec![(300.0, 300.0)]);
        // scissors still clamp to the scaled display, not the larger target
        assert_eq!(scissors(s.renderer.last_commands()), vec![ScissorRect { x: 0, y: 0, width: 200, height: 200 }]);
    }

    #[test]
    fn test_clip_outside_framebuffer_draws_nothing() {
        let mut s = setup();
        let data = draw_data(vec![list_with_clip(Rect::new(Vec2::new(150.0, 0.0), Vec2::new(300.0, 50.0)))]);
        let stats = s.renderer.render(&mut s.device, &data, &s.registry, &FrameBuffer::main(200, 200)).unwrap();

        assert_eq!(stats.draw_calls, 0);
        assert_eq!(stats.culled_commands, 1);
        assert_eq!(s.renderer.last_commands().draw_count(), 0);
    }

    #[test]
    fn test_callbacks_are_skipped() {
        let mut s = setup();
        let mut list = DrawList::default();
        list.push_clip_rect(Rect::new(Vec2::zeros(), Vec2::new(100.0, 100.0)), false);
        list.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0), WHITE);
        list.add_callback(DrawCallback::new(|_| panic!("callbacks must not run")));
        list.add_rect_filled(Vec2::new(5.0, 5.0), Vec2::new(9.0, 9.0), WHITE);
        list.pop_clip_rect();
        list.finish();

        let stats = s.renderer.render(&mut s.device, &draw_data(vec![list]), &s.registry, &FrameBuffer::main(200, 200)).unwrap();
        assert_eq!(stats.skipped_callbacks, 1);
        assert_eq!(stats.draw_calls, 2);
    }

    #[test]
    fn test_offsets_accumulate_across_lists() {
        let mut s = setup();
        let clip = Rect::new(Vec2::zeros(), Vec2::new(100.0, 100.0));
        let data = draw_data(vec![list_with_clip(clip), list_with_clip(clip)]);
        s.renderer.render(&mut s.device, &data, &s.registry, &FrameBuffer::main(200, 200)).unwrap();

        let draws: Vec<_> = s
            .renderer
            .last_commands()
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::DrawIndexed { index_count, first_index, vertex_offset } => {
                    Some((*index_count, *first_index, *vertex_offset))
                }
                _ => None,
            })
            .collect();
        assert_eq!(draws, vec![(6, 0, 0), (6, 6, 4)]);
        // the pipeline, buffers, global set and viewport are bound once
        let binds = s.renderer.last_commands().commands().iter().filter(|c| matches!(c, GpuCommand::SetPipeline(_))).count();
        assert_eq!(binds, 1);
        assert_eq!(s.device.submissions().len(), 1);
    }

    #[test]
    fn test_unbound_texture_falls_back_to_atlas() {
        let mut s = setup();
        let mut list = DrawList::default();
        list.push_clip_rect(Rect::new(Vec2::zeros(), Vec2::new(100.0, 100.0)), false);
        list.add_image(TextureId(4242), Vec2::zeros(), Vec2::new(8.0, 8.0), Vec2::zeros(), Vec2::new(1.0, 1.0), WHITE);
        list.pop_clip_rect();
        list.finish();

        s.renderer.render(&mut s.device, &draw_data(vec![list]), &s.registry, &FrameBuffer::main(200, 200)).unwrap();
        let atlas_set = s.registry.resolve(TextureId::FONT_ATLAS).unwrap();
        let texture_binds: Vec<_> = s
            .renderer
            .last_commands()
            .commands()
            .iter()
            .filter_map(|c| match c {
                GpuCommand::SetResourceSet { slot: TEXTURE_SET, set } => Some(*set),
                _ => None,
            })
            .collect();
        assert_eq!(texture_binds, vec![atlas_set]);
    }

    #[test]
    fn test_buffers_grow_to_fit() {
        let mut s = setup();
        let mut list = DrawList::default();
        list.push_clip_rect(Rect::new(Vec2::zeros(), Vec2::new(100.0, 100.0)), false);
        for i in 0..2_000 {
            let x = (i % 100) as f32;
            list.add_rect_filled(Vec2::new(x, 0.0), Vec2::new(x + 1.0, 1.0), WHITE);
        }
        list.pop_clip_rect();
        list.finish();

        let stats = s.renderer.render(&mut s.device, &draw_data(vec![list]), &s.registry, &FrameBuffer::main(200, 200)).unwrap();
        assert_eq!(stats.vertices, 8_000);
        assert_eq!(stats.buffer_resizes, 2);
        let (vertex_capacity, index_capacity) = s.renderer.buffer_capacity();
        assert!(vertex_capacity >= 8_000 * 32);
        assert!(index_capacity >= 12_000 * 2);
    }

    #[test]
    fn test_missing_atlas_is_an_error() {
        let mut device = HeadlessDevice::new();
        let mut renderer = DrawListRenderer::new(&mut device, &EmbeddedResources::with_builtin_shaders()).unwrap();
        let registry = TextureBindingRegistry::new(renderer.texture_layout());
        let data = draw_data(vec![list_with_clip(Rect::new(Vec2::zeros(), Vec2::new(100.0, 100.0)))]);

        let result = renderer.render(&mut device, &data, &registry, &FrameBuffer::main(200, 200));
        assert!(matches!(result, Err(RenderError::AtlasNotBound)));
    }

    #[test]
    fn test_destroy_releases_everything() {
        let mut device = HeadlessDevice::new();
        let renderer = DrawListRenderer::new(&mut device, &EmbeddedResources::with_builtin_shaders()).unwrap();
        assert!(device.live_resources() > 0);
        renderer.destroy(&mut device).unwrap();
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn test_missing_shader_fails_creation() {
        let mut device = HeadlessDevice::new();
        let result = DrawListRenderer::new(&mut device, &EmbeddedResources::new());
        assert!(matches!(result, Err(RenderError::Resource(_))));
    }
}
