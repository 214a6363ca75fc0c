//! Graphics device abstraction
//!
//! The traits and descriptors the draw-list renderer is written against.
//! A concrete backend (Vulkan, wgpu, a test recorder) implements
//! [`GraphicsDevice`]; nothing above this module names a graphics API.

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Device-level failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// A handle did not name a live resource
    #[error("Unknown {kind} handle {id}")]
    UnknownHandle {
        /// Resource kind ("buffer", "texture", ...)
        kind: &'static str,
        /// Raw handle value
        id: u64,
    },

    /// A write fell outside the buffer
    #[error("Write of {len} bytes at offset {offset} overflows buffer of {size} bytes")]
    OutOfBounds {
        /// Write offset
        offset: u64,
        /// Write length
        len: u64,
        /// Buffer size
        size: u64,
    },

    /// Pixel data did not match the texture description
    #[error("Texture data is {actual} bytes, expected {expected}")]
    TextureSizeMismatch {
        /// Expected byte count
        expected: usize,
        /// Received byte count
        actual: usize,
    },

    /// Shader bytecode was rejected
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

macro_rules! device_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
    };
}

device_handle!(
    /// Handle to a GPU buffer
    BufferHandle
);
device_handle!(
    /// Handle to a GPU texture
    TextureHandle
);
device_handle!(
    /// Handle to a texture sampler
    SamplerHandle
);
device_handle!(
    /// Handle to a compiled shader module
    ShaderHandle
);
device_handle!(
    /// Handle to a resource layout (descriptor set layout)
    ResourceLayoutHandle
);
device_handle!(
    /// Handle to a resource set (descriptor set)
    ResourceSetHandle
);
device_handle!(
    /// Handle to a graphics pipeline
    PipelineHandle
);

/// How a buffer is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex data
    Vertex,
    /// Index data
    Index,
    /// Uniform data
    Uniform,
}

/// Buffer creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    /// Debug label
    pub label: &'static str,
    /// Size in bytes
    pub size: u64,
    /// Binding type
    pub usage: BufferUsage,
    /// Updated every frame from the CPU
    pub dynamic: bool,
}

/// Texel formats the renderer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA, normalized
    Rgba8Unorm,
}

impl TextureFormat {
    /// Bytes per texel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8Unorm => 4,
        }
    }
}

/// Texture creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    /// Debug label
    pub label: String,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Texel format
    pub format: TextureFormat,
}

impl TextureDesc {
    /// Byte size of a fully populated texture
    pub fn byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Sampler filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerFilter {
    /// Nearest texel
    Point,
    /// Bilinear
    Linear,
}

/// Sampler creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    /// Min/mag filter
    pub filter: SamplerFilter,
    /// Clamp coordinates to the edge instead of wrapping
    pub clamp: bool,
}

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

/// Shader creation parameters
#[derive(Debug, Clone, Copy)]
pub struct ShaderDesc<'a> {
    /// Stage the module runs in
    pub stage: ShaderStage,
    /// Source or bytecode, as the backend expects it
    pub code: &'a [u8],
    /// Entry point
    pub entry_point: &'a str,
}

/// Kind of a resource slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Uniform buffer
    UniformBuffer,
    /// Sampler state
    Sampler,
    /// Sampled texture
    Texture,
}

/// One slot of a resource layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLayoutEntry {
    /// Name in the shader
    pub name: &'static str,
    /// Slot kind
    pub kind: ResourceKind,
    /// Stage that reads it
    pub stage: ShaderStage,
}

/// Resource layout creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLayoutDesc {
    /// Debug label
    pub label: &'static str,
    /// Slots, in binding order
    pub entries: Vec<ResourceLayoutEntry>,
}

/// A resource bound into a resource set slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceBinding {
    /// Uniform buffer
    Buffer(BufferHandle),
    /// Sampler
    Sampler(SamplerHandle),
    /// Texture view
    Texture(TextureHandle),
}

/// Resource set creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSetDesc {
    /// Debug label
    pub label: String,
    /// Layout this set conforms to
    pub layout: ResourceLayoutHandle,
    /// Bindings, in layout order
    pub bindings: Vec<ResourceBinding>,
}

/// Vertex attribute formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    /// Two 32-bit floats
    Float2,
    /// Four 32-bit floats
    Float4,
}

/// Vertex attribute description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Name in the shader
    pub name: &'static str,
    /// Format
    pub format: VertexFormat,
    /// Byte offset within the vertex
    pub offset: u32,
}

/// Blending mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Opaque
    Replace,
    /// `src * a + dst * (1 - a)`
    AlphaBlend,
}

/// Triangle culling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// Draw both faces
    None,
    /// Skip back faces
    Back,
}

/// Pipeline creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDesc {
    /// Debug label
    pub label: &'static str,
    /// Vertex stage
    pub vertex_shader: ShaderHandle,
    /// Fragment stage
    pub fragment_shader: ShaderHandle,
    /// Byte stride of one vertex
    pub vertex_stride: u32,
    /// Vertex attributes
    pub vertex_attributes: Vec<VertexAttribute>,
    /// Resource layouts, by set index
    pub resource_layouts: Vec<ResourceLayoutHandle>,
    /// Blending
    pub blend: BlendMode,
    /// Culling
    pub cull: CullMode,
    /// Depth testing
    pub depth_test: bool,
    /// Scissor testing
    pub scissor_test: bool,
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

/// Viewport transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge in pixels
    pub x: f32,
    /// Top edge in pixels
    pub y: f32,
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
    /// Near depth
    pub min_depth: f32,
    /// Far depth
    pub max_depth: f32,
}

/// Integer scissor rectangle in framebuffer pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

/// Render target for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Backend identifier of the target
    pub id: u64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl FrameBuffer {
    /// The default back buffer of the given size
    pub fn main(width: u32, height: u32) -> Self {
        Self { id: 0, width, height }
    }
}

/// One recorded GPU command
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    /// Bind a pipeline
    SetPipeline(PipelineHandle),
    /// Bind the vertex buffer
    SetVertexBuffer(BufferHandle),
    /// Bind the index buffer
    SetIndexBuffer(BufferHandle, IndexFormat),
    /// Bind a resource set to a set index
    SetResourceSet {
        /// Set index
        slot: u32,
        /// Set to bind
        set: ResourceSetHandle,
    },
    /// Set the viewport
    SetViewport(Viewport),
    /// Set the scissor
    SetScissor(ScissorRect),
    /// Indexed draw
    DrawIndexed {
        /// Index count
        index_count: u32,
        /// First index in the bound index buffer
        first_index: u32,
        /// Added to every index before fetching the vertex
        vertex_offset: i32,
    },
}

/// Ordered commands for one render pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<GpuCommand>,
}

impl CommandList {
    /// Create an empty command list
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all recorded commands, keeping capacity
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Bind a pipeline
    pub fn set_pipeline(&mut self, pipeline: PipelineHandle) {
        self.commands.push(GpuCommand::SetPipeline(pipeline));
    }

    /// Bind the vertex buffer
    pub fn set_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.commands.push(GpuCommand::SetVertexBuffer(buffer));
    }

    /// Bind the index buffer
    pub fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat) {
        self.commands.push(GpuCommand::SetIndexBuffer(buffer, format));
    }

    /// Bind a resource set
    pub fn set_resource_set(&mut self, slot: u32, set: ResourceSetHandle) {
        self.commands.push(GpuCommand::SetResourceSet { slot, set });
    }

    /// Set the viewport
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(GpuCommand::SetViewport(viewport));
    }

    /// Set the scissor rectangle
    pub fn set_scissor(&mut self, rect: ScissorRect) {
        self.commands.push(GpuCommand::SetScissor(rect));
    }

    /// Record an indexed draw
    pub fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) {
        self.commands.push(GpuCommand::DrawIndexed { index_count, first_index, vertex_offset });
    }

    /// Recorded commands in order
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Number of indexed draws recorded
    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| matches!(c, GpuCommand::DrawIndexed { .. })).count()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Graphics device the renderer draws through
///
/// Every `create_*` has a matching `destroy_*`; destroying an unknown or
/// already destroyed handle returns [`DeviceError::UnknownHandle`].
pub trait GraphicsDevice {
    /// Create a buffer
    fn create_buffer(&mut self, desc: &BufferDesc) -> DeviceResult<BufferHandle>;

    /// Write `data` into a buffer at `offset` bytes
    fn update_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> DeviceResult<()>;

    /// Destroy a buffer
    fn destroy_buffer(&mut self, buffer: BufferHandle) -> DeviceResult<()>;

    /// Create a texture and upload its full contents
    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> DeviceResult<TextureHandle>;

    /// Destroy a texture
    fn destroy_texture(&mut self, texture: TextureHandle) -> DeviceResult<()>;

    /// Create a sampler
    fn create_sampler(&mut self, desc: &SamplerDesc) -> DeviceResult<SamplerHandle>;

    /// Destroy a sampler
    fn destroy_sampler(&mut self, sampler: SamplerHandle) -> DeviceResult<()>;

    /// Compile a shader module
    fn create_shader(&mut self, desc: &ShaderDesc<'_>) -> DeviceResult<ShaderHandle>;

    /// Destroy a shader module
    fn destroy_shader(&mut self, shader: ShaderHandle) -> DeviceResult<()>;

    /// Create a resource layout
    fn create_resource_layout(&mut self, desc: &ResourceLayoutDesc) -> DeviceResult<ResourceLayoutHandle>;

    /// Destroy a resource layout
    fn destroy_resource_layout(&mut self, layout: ResourceLayoutHandle) -> DeviceResult<()>;

    /// Create a resource set
    fn create_resource_set(&mut self, desc: &ResourceSetDesc) -> DeviceResult<ResourceSetHandle>;

    /// Destroy a resource set
    fn destroy_resource_set(&mut self, set: ResourceSetHandle) -> DeviceResult<()>;

    /// Create a graphics pipeline
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> DeviceResult<PipelineHandle>;

    /// Destroy a graphics pipeline
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) -> DeviceResult<()>;

    /// Execute a command list against a framebuffer
    fn submit(&mut self, commands: &CommandList, target: &FrameBuffer) -> DeviceResult<()>;
}
