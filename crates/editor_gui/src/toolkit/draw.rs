//! Draw lists
//!
//! Widgets emit triangles into a [`DrawList`]; each [`DrawCmd`] covers a run
//! of indices sharing one clip rectangle and one texture. Indices are 16-bit
//! and relative to the command's vertex offset, so a list rolls over to a
//! new offset before any command addresses more than 65 536 vertices.

use std::fmt;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::font::BakedFont;
use crate::foundation::math::{Rect, Vec2};
use crate::texture::TextureId;

/// Toolkit vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawVert {
    /// Position in display pixels
    pub pos: [f32; 2],
    /// Texture coordinate
    pub uv: [f32; 2],
    /// Packed color, see [`super::style::rgba`]
    pub col: u32,
}

/// Application hook recorded in a draw list
#[derive(Clone)]
pub struct DrawCallback(Arc<dyn Fn(&DrawCmd) + Send + Sync>);

impl DrawCallback {
    /// Wrap a closure
    pub fn new(f: impl Fn(&DrawCmd) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Run the hook for `cmd`
    pub fn invoke(&self, cmd: &DrawCmd) {
        (self.0)(cmd);
    }
}

impl fmt::Debug for DrawCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DrawCallback(..)")
    }
}

/// One draw command
#[derive(Debug, Clone)]
pub struct DrawCmd {
    /// Clip rectangle in display pixels
    pub clip_rect: Rect,
    /// Texture sampled by the command's triangles
    pub texture_id: TextureId,
    /// First vertex the command's indices are relative to
    pub vtx_offset: u32,
    /// First index of the command
    pub idx_offset: u32,
    /// Number of indices
    pub elem_count: u32,
    /// Application hook in place of triangles
    pub callback: Option<DrawCallback>,
}

/// Slot left in a draw list for a rectangle sized later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectSlot {
    vtx: usize,
}

const MAX_VERTICES_PER_CMD: usize = u16::MAX as usize + 1;

/// Vertices, indices and commands for one window
#[derive(Debug, Clone)]
pub struct DrawList {
    cmds: Vec<DrawCmd>,
    vtx: Vec<DrawVert>,
    idx: Vec<u16>,
    clip_stack: Vec<Rect>,
    texture_stack: Vec<TextureId>,
    white_uv: Vec2,
}

impl Default for DrawList {
    fn default() -> Self {
        Self::new(Vec2::zeros())
    }
}

impl DrawList {
    /// Empty list sampling `white_uv` for untextured shapes
    pub fn new(white_uv: Vec2) -> Self {
        Self {
            cmds: Vec::new(),
            vtx: Vec::new(),
            idx: Vec::new(),
            clip_stack: Vec::new(),
            texture_stack: Vec::new(),
            white_uv,
        }
    }

    /// Reset for a new frame
    pub fn clear(&mut self, white_uv: Vec2) {
        self.cmds.clear();
        self.vtx.clear();
        self.idx.clear();
        self.clip_stack.clear();
        self.texture_stack.clear();
        self.white_uv = white_uv;
    }

    /// Commands in order
    pub fn commands(&self) -> &[DrawCmd] {
        &self.cmds
    }

    /// Vertex buffer
    pub fn vertices(&self) -> &[DrawVert] {
        &self.vtx
    }

    /// Index buffer
    pub fn indices(&self) -> &[u16] {
        &self.idx
    }

    /// Whether the list draws nothing
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty() && self.cmds.iter().all(|c| c.callback.is_none())
    }

    /// Current clip rectangle
    pub fn clip_rect(&self) -> Rect {
        self.clip_stack.last().copied().unwrap_or_else(Rect::unbounded)
    }

    /// Current texture
    pub fn texture_id(&self) -> TextureId {
        self.texture_stack.last().copied().unwrap_or(TextureId::FONT_ATLAS)
    }

    /// Push a clip rectangle, optionally intersected with the current one
    pub fn push_clip_rect(&mut self, rect: Rect, intersect_with_current: bool) {
        let rect = if intersect_with_current { rect.intersect(&self.clip_rect()) } else { rect };
        self.clip_stack.push(rect);
    }

    /// Pop the innermost clip rectangle
    pub fn pop_clip_rect(&mut self) {
        assert!(self.clip_stack.pop().is_some(), "pop_clip_rect without push_clip_rect");
    }

    /// Push a texture for subsequent shapes
    pub fn push_texture_id(&mut self, texture: TextureId) {
        self.texture_stack.push(texture);
    }

    /// Pop the innermost texture
    pub fn pop_texture_id(&mut self) {
        assert!(self.texture_stack.pop().is_some(), "pop_texture_id without push_texture_id");
    }

    /// Depth of the clip and texture stacks
    pub fn stack_depths(&self) -> (usize, usize) {
        (self.clip_stack.len(), self.texture_stack.len())
    }

    /// Make sure the last command accepts `vtx_count` more vertices under the current state
    fn prepare(&mut self, vtx_count: usize) {
        let clip_rect = self.clip_rect();
        let texture_id = self.texture_id();
        let vtx_len = self.vtx.len();
        let idx_len = self.idx.len() as u32;

        if let Some(last) = self.cmds.last_mut() {
            let fits = vtx_len - last.vtx_offset as usize + vtx_count <= MAX_VERTICES_PER_CMD;
            let same_state = last.clip_rect == clip_rect && last.texture_id == texture_id;
            if last.callback.is_none() && fits && same_state {
                return;
            }
            if last.callback.is_none() && last.elem_count == 0 {
                last.clip_rect = clip_rect;
                last.texture_id = texture_id;
                last.vtx_offset = vtx_len as u32;
                last.idx_offset = idx_len;
                return;
            }
        }

        self.cmds.push(DrawCmd {
            clip_rect,
            texture_id,
            vtx_offset: vtx_len as u32,
            idx_offset: idx_len,
            elem_count: 0,
            callback: None,
        });
    }

    fn base_index(&self) -> u16 {
        let offset = self.cmds.last().map_or(0, |c| c.vtx_offset as usize);
        (self.vtx.len() - offset) as u16
    }

    fn commit_indices(&mut self, count: usize) {
        if let Some(last) = self.cmds.last_mut() {
            last.elem_count += count as u32;
        }
    }

    fn push_quad(&mut self, corners: [Vec2; 4], uvs: [Vec2; 4], col: u32) {
        self.prepare(4);
        let base = self.base_index();
        for (pos, uv) in corners.iter().zip(uvs.iter()) {
            self.vtx.push(DrawVert { pos: [pos.x, pos.y], uv: [uv.x, uv.y], col });
        }
        self.idx.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        self.commit_indices(6);
    }

    /// Axis-aligned textured quad
    pub fn prim_rect_uv(&mut self, min: Vec2, max: Vec2, uv_min: Vec2, uv_max: Vec2, col: u32) {
        self.push_quad(
            [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
            [uv_min, Vec2::new(uv_max.x, uv_min.y), uv_max, Vec2::new(uv_min.x, uv_max.y)],
            col,
        );
    }

    /// Filled rectangle
    pub fn add_rect_filled(&mut self, min: Vec2, max: Vec2, col: u32) {
        if col >> 24 == 0 || max.x <= min.x || max.y <= min.y {
            return;
        }
        let uv = self.white_uv;
        self.prim_rect_uv(min, max, uv, uv, col);
    }

    /// Rectangle outline drawn inside the bounds
    pub fn add_rect(&mut self, min: Vec2, max: Vec2, col: u32, thickness: f32) {
        if col >> 24 == 0 {
            return;
        }
        let t = thickness.min((max.x - min.x) * 0.5).min((max.y - min.y) * 0.5);
        if t <= 0.0 {
            return;
        }
        self.add_rect_filled(min, Vec2::new(max.x, min.y + t), col);
        self.add_rect_filled(Vec2::new(min.x, max.y - t), max, col);
        self.add_rect_filled(Vec2::new(min.x, min.y + t), Vec2::new(min.x + t, max.y - t), col);
        self.add_rect_filled(Vec2::new(max.x - t, min.y + t), Vec2::new(max.x, max.y - t), col);
    }

    /// Line segment of the given thickness
    pub fn add_line(&mut self, a: Vec2, b: Vec2, col: u32, thickness: f32) {
        let delta = b - a;
        let length = delta.norm();
        if col >> 24 == 0 || length <= f32::EPSILON {
            return;
        }
        let normal = Vec2::new(-delta.y, delta.x) * (thickness * 0.5 / length);
        let uv = self.white_uv;
        self.push_quad([a + normal, b + normal, b - normal, a - normal], [uv; 4], col);
    }

    /// Filled triangle
    pub fn add_triangle_filled(&mut self, a: Vec2, b: Vec2, c: Vec2, col: u32) {
        if col >> 24 == 0 {
            return;
        }
        self.prepare(3);
        let base = self.base_index();
        let uv = [self.white_uv.x, self.white_uv.y];
        for p in [a, b, c] {
            self.vtx.push(DrawVert { pos: [p.x, p.y], uv, col });
        }
        self.idx.extend_from_slice(&[base, base + 1, base + 2]);
        self.commit_indices(3);
    }

    /// Textured rectangle sampling `texture`
    pub fn add_image(&mut self, texture: TextureId, min: Vec2, max: Vec2, uv_min: Vec2, uv_max: Vec2, col: u32) {
        self.push_texture_id(texture);
        self.prim_rect_uv(min, max, uv_min, uv_max, col);
        self.pop_texture_id();
    }

    /// Text drawn with `font` scaled by `scale`, pen starting at the top-left `pos`
    pub fn add_text(&mut self, font: &BakedFont, scale: f32, pos: Vec2, col: u32, text: &str) {
        if col >> 24 == 0 || text.is_empty() {
            return;
        }
        let line_height = font.line_height() * scale;
        let clip = self.clip_rect();
        let mut pen = pos;

        for ch in text.chars() {
            if ch == '\n' {
                pen.x = pos.x;
                pen.y += line_height;
                continue;
            }
            let Some(glyph) = font.glyph(ch) else {
                pen.x += font.advance(ch) * scale;
                continue;
            };
            if glyph.is_visible() {
                let min = pen + glyph.offset * scale;
                let max = min + glyph.size * scale;
                if max.x > clip.min.x && min.x < clip.max.x && max.y > clip.min.y && min.y < clip.max.y {
                    self.prim_rect_uv(min, max, glyph.uv_min, glyph.uv_max, col);
                }
            }
            pen.x += glyph.advance * scale;
        }
    }

    /// Record an application callback between the surrounding triangles
    pub fn add_callback(&mut self, callback: DrawCallback) {
        let clip_rect = self.clip_rect();
        let texture_id = self.texture_id();
        let vtx_offset = self.cmds.last().map_or(0, |c| c.vtx_offset);
        let idx_offset = self.idx.len() as u32;

        match self.cmds.last_mut() {
            Some(last) if last.elem_count == 0 && last.callback.is_none() => {
                last.callback = Some(callback);
            }
            _ => self.cmds.push(DrawCmd {
                clip_rect,
                texture_id,
                vtx_offset,
                idx_offset,
                elem_count: 0,
                callback: Some(callback),
            }),
        }
    }

    /// Reserve a rectangle whose bounds and color are filled in by [`Self::patch_rect`]
    pub fn reserve_rect(&mut self) -> RectSlot {
        let uv = self.white_uv;
        let vtx = self.vtx.len();
        self.push_quad([Vec2::zeros(); 4], [uv; 4], 0);
        RectSlot { vtx }
    }

    /// Fill in a reserved rectangle
    pub fn patch_rect(&mut self, slot: RectSlot, min: Vec2, max: Vec2, col: u32) {
        let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
        for (vertex, corner) in self.vtx[slot.vtx..slot.vtx + 4].iter_mut().zip(corners) {
            vertex.pos = [corner.x, corner.y];
            vertex.col = col;
        }
    }

    /// Drop trailing empty commands
    pub fn finish(&mut self) {
        while self.cmds.last().is_some_and(|c| c.elem_count == 0 && c.callback.is_none()) {
            self.cmds.pop();
        }
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Default)]
pub struct DrawData {
    /// Top-left of the display in layout space
    pub display_pos: Vec2,
    /// Display size in logical pixels
    pub display_size: Vec2,
    /// Physical pixels per logical pixel
    pub framebuffer_scale: Vec2,
    /// Lists in back-to-front order
    pub draw_lists: Vec<DrawList>,
}

impl DrawData {
    /// Vertices across all lists
    pub fn total_vtx_count(&self) -> usize {
        self.draw_lists.iter().map(|l| l.vertices().len()).sum()
    }

    /// Indices across all lists
    pub fn total_idx_count(&self) -> usize {
        self.draw_lists.iter().map(|l| l.indices().len()).sum()
    }

    /// Commands across all lists
    pub fn total_cmd_count(&self) -> usize {
        self.draw_lists.iter().map(|l| l.commands().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::style::rgba;

    const WHITE: u32 = 0xffff_ffff;

    fn list() -> DrawList {
        DrawList::new(Vec2::new(0.5, 0.5))
    }

    #[test]
    fn test_rects_share_one_command() {
        let mut dl = list();
        dl.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), WHITE);
        dl.add_rect_filled(Vec2::new(20.0, 0.0), Vec2::new(30.0, 10.0), WHITE);

        assert_eq!(dl.commands().len(), 1);
        assert_eq!(dl.commands()[0].elem_count, 12);
        assert_eq!(dl.vertices().len(), 8);
        assert_eq!(&dl.indices()[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn test_clip_change_starts_new_command() {
        let mut dl = list();
        dl.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), WHITE);
        dl.push_clip_rect(Rect::new(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0)), true);
        dl.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), WHITE);
        dl.pop_clip_rect();

        assert_eq!(dl.commands().len(), 2);
        assert_eq!(dl.commands()[1].idx_offset, 6);
        assert_eq!(dl.commands()[1].clip_rect.max, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_image_uses_its_texture() {
        let mut dl = list();
        dl.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), WHITE);
        dl.add_image(TextureId(100), Vec2::new(0.0, 0.0), Vec2::new(8.0, 8.0), Vec2::zeros(), Vec2::new(1.0, 1.0), WHITE);

        assert_eq!(dl.commands().len(), 2);
        assert_eq!(dl.commands()[0].texture_id, TextureId::FONT_ATLAS);
        assert_eq!(dl.commands()[1].texture_id, TextureId(100));
        assert_eq!(dl.texture_id(), TextureId::FONT_ATLAS);
    }

    #[test]
    fn test_vertex_offset_rolls_over() {
        let mut dl = list();
        // 16 385 quads need 65 540 vertices, four more than one command can address
        for i in 0..16_385 {
            let x = i as f32;
            dl.add_rect_filled(Vec2::new(x, 0.0), Vec2::new(x + 1.0, 1.0), WHITE);
        }

        assert_eq!(dl.commands().len(), 2);
        let second = &dl.commands()[1];
        assert_eq!(second.vtx_offset, 65_536);
        assert_eq!(second.elem_count, 6);
        assert_eq!(&dl.indices()[second.idx_offset as usize..], &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_callback_gets_its_own_command() {
        let mut dl = list();
        dl.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), WHITE);
        dl.add_callback(DrawCallback::new(|_| {}));
        dl.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), WHITE);
        dl.finish();

        let cmds = dl.commands();
        assert_eq!(cmds.len(), 3);
        assert!(cmds[1].callback.is_some());
        assert_eq!(cmds[1].elem_count, 0);
        assert_eq!(cmds[2].idx_offset, 6);
    }

    #[test]
    fn test_transparent_and_degenerate_shapes_are_skipped() {
        let mut dl = list();
        dl.add_rect_filled(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0), rgba(255, 255, 255, 0));
        dl.add_rect_filled(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0), WHITE);
        dl.add_line(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), WHITE, 1.0);
        dl.finish();

        assert!(dl.is_empty());
        assert!(dl.commands().is_empty());
    }

    #[test]
    fn test_patch_rect_fills_reserved_slot() {
        let mut dl = list();
        let slot = dl.reserve_rect();
        dl.add_rect_filled(Vec2::new(2.0, 2.0), Vec2::new(3.0, 3.0), WHITE);
        dl.patch_rect(slot, Vec2::new(0.0, 0.0), Vec2::new(50.0, 20.0), WHITE);

        assert_eq!(dl.vertices()[0].pos, [0.0, 0.0]);
        assert_eq!(dl.vertices()[2].pos, [50.0, 20.0]);
        assert_eq!(dl.vertices()[3].col, WHITE);
    }

    #[test]
    #[should_panic(expected = "pop_clip_rect without push_clip_rect")]
    fn test_unbalanced_clip_pop_panics() {
        list().pop_clip_rect();
    }
}
