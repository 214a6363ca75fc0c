//! GPU-side vertex and uniform layouts

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Mat4;
use crate::toolkit::{unpack_color, DrawVert};

use super::device::{VertexAttribute, VertexFormat};

/// Vertex as uploaded to the GPU
///
/// Must match `shaders/gui.vert`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    /// Position in display pixels
    pub position: [f32; 2],
    /// Texture coordinate
    pub uv: [f32; 2],
    /// Normalized RGBA
    pub color: [f32; 4],
}

impl GpuVertex {
    /// Byte stride
    pub const STRIDE: u32 = std::mem::size_of::<Self>() as u32;

    /// Attribute layout for pipeline creation
    pub fn attributes() -> Vec<VertexAttribute> {
        vec![
            VertexAttribute { name: "in_position", format: VertexFormat::Float2, offset: 0 },
            VertexAttribute { name: "in_uv", format: VertexFormat::Float2, offset: 8 },
            VertexAttribute { name: "in_color", format: VertexFormat::Float4, offset: 16 },
        ]
    }
}

impl From<&DrawVert> for GpuVertex {
    fn from(vertex: &DrawVert) -> Self {
        Self { position: vertex.pos, uv: vertex.uv, color: unpack_color(vertex.col) }
    }
}

/// Projection uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ProjectionUniform {
    /// Column-major projection matrix
    pub projection: [[f32; 4]; 4],
}

impl ProjectionUniform {
    /// Byte size of the block
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Wrap a projection matrix
    pub fn new(projection: &Mat4) -> Self {
        let mut columns = [[0.0; 4]; 4];
        for (column, out) in projection.column_iter().zip(columns.iter_mut()) {
            for (value, slot) in column.iter().zip(out.iter_mut()) {
                *slot = *value;
            }
        }
        Self { projection: columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{orthographic_projection, Vec2, Vec4};
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_stride() {
        assert_eq!(GpuVertex::STRIDE, 32);
        assert_eq!(ProjectionUniform::SIZE, 64);
    }

    #[test]
    fn test_color_is_unpacked() {
        let vertex = DrawVert { pos: [1.0, 2.0], uv: [0.5, 0.5], col: 0xff00_00ff };
        let gpu = GpuVertex::from(&vertex);
        assert_eq!(gpu.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(gpu.position, [1.0, 2.0]);
    }

    #[test]
    fn test_projection_maps_display_corners() {
        let projection = orthographic_projection(Vec2::new(0.0, 0.0), Vec2::new(800.0, 600.0));
        let uniform = ProjectionUniform::new(&projection);
        // column 3 holds the translation
        assert_relative_eq!(uniform.projection[3][0], -1.0);
        let corner = projection * Vec4::new(800.0, 600.0, 0.0, 1.0);
        assert_relative_eq!(corner.x, 1.0);
        assert_relative_eq!(corner.y, -1.0);
    }
}
