//! # Rendering
//!
//! The device abstraction, a headless device for tests and tools, and the
//! draw-list renderer that turns a frame's [`DrawData`](crate::toolkit::DrawData)
//! into GPU commands.
//!
//! ```text
//! DrawData → DrawListRenderer → CommandList → GraphicsDevice::submit
//!                  |
//!        TextureBindingRegistry (texture id → resource set)
//! ```

pub mod device;
pub mod headless;
pub mod renderer;
pub mod vertex;

pub use device::{
    BlendMode, BufferDesc, BufferHandle, BufferUsage, CommandList, CullMode, DeviceError, DeviceResult,
    FrameBuffer, GpuCommand, GraphicsDevice, IndexFormat, PipelineDesc, PipelineHandle, ResourceBinding,
    ResourceKind, ResourceLayoutDesc, ResourceLayoutEntry, ResourceLayoutHandle, ResourceSetDesc,
    ResourceSetHandle, SamplerDesc, SamplerFilter, SamplerHandle, ScissorRect, ShaderDesc, ShaderHandle,
    ShaderStage, TextureDesc, TextureFormat, TextureHandle, VertexAttribute, VertexFormat, Viewport,
};
pub use headless::{HeadlessDevice, HostBuffer, HostTexture, Submission};
pub use renderer::{DrawListRenderer, RenderStats};
pub use vertex::{GpuVertex, ProjectionUniform};

use crate::assets::ResourceError;

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while creating renderer objects or recording a frame
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The device rejected an operation
    #[error("Graphics device error: {0}")]
    Device(#[from] DeviceError),

    /// A shader could not be loaded
    #[error("Shader resource error: {0}")]
    Resource(#[from] ResourceError),

    /// A draw command needed the font atlas before one was bound
    #[error("Font atlas texture is not bound")]
    AtlasNotBound,
}
