//! # Layout Stack Engine
//!
//! [`LayoutContext`] wraps the toolkit [`Context`] with the per-frame stacks
//! editor panels describe their layout through: scopes, alignment, font
//! style, disabled state and declared columns. Every stack must be empty
//! again when the frame ends; an imbalance is a programming error and panics
//! naming the construct that was left open.
//!
//! ```text
//! begin_frame(input)
//!   begin_scope(entity) / property rows / columns ... / end_scope()
//! end_frame() -> &DrawData
//! ```

mod columns;
mod widgets;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use crate::config::{DragConfig, GuiConfig, LayoutConfig};
use crate::font::{FontAtlas, FontSelection, FontSelector, FontStyle};
use crate::foundation::math::Vec2;
use crate::input::{InputSnapshot, Modifiers};
use crate::toolkit::{Context, DrawData, DragParams};

pub use columns::{ColumnCache, ColumnKey, ColumnLayout};
pub use widgets::AXIS_COLORS;

use columns::ColumnFrame;

/// Horizontal placement of atomic widgets within the available width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    /// Left edge
    #[default]
    Front,
    /// Centered
    Center,
    /// Right edge
    Back,
}

impl Align {
    /// Offset from the left edge for an item `width` wide in `avail`
    pub fn offset(self, width: f32, avail: f32) -> f32 {
        let offset = match self {
            Align::Front => 0.0,
            Align::Center => (avail - width) * 0.5,
            Align::Back => avail - width,
        };
        offset.max(0.0).floor()
    }
}

/// Layout state for one GUI context
pub struct LayoutContext {
    pub(crate) ctx: Context,
    selector: FontSelector,
    base_font_size: f32,
    font_selection: FontSelection,
    pub(crate) drag: DragConfig,
    pub(crate) layout: LayoutConfig,
    frame_active: bool,
    scope_depth: usize,
    alignments: Vec<Align>,
    font_styles: Vec<FontStyle>,
    disabled_depth: usize,
    pending_indent: Option<f32>,
    column_frames: Vec<ColumnFrame>,
    column_cache: ColumnCache,
}

impl LayoutContext {
    /// Layout over `atlas`, resolving font styles with `selector`
    pub fn new(atlas: Arc<FontAtlas>, selector: FontSelector, config: &GuiConfig) -> Self {
        let base_font_size = config.fonts.default_size;
        let font_selection = selector.select(FontStyle::REGULAR, base_font_size);
        let mut ctx = Context::new(atlas, config.storage.save_interval_secs);
        ctx.set_font(font_selection.font, font_selection.scale);
        Self {
            ctx,
            selector,
            base_font_size,
            font_selection,
            drag: config.drag.clone(),
            layout: config.layout.clone(),
            frame_active: false,
            scope_depth: 0,
            alignments: Vec::new(),
            font_styles: Vec::new(),
            disabled_depth: 0,
            pending_indent: None,
            column_frames: Vec::new(),
            column_cache: ColumnCache::default(),
        }
    }

    /// Underlying toolkit context
    pub fn toolkit(&self) -> &Context {
        &self.ctx
    }

    /// Underlying toolkit context, for widgets this layer does not wrap
    pub fn toolkit_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    // ----- frame -----------------------------------------------------------

    /// Start a frame
    ///
    /// # Panics
    /// If a frame is already active.
    pub fn begin_frame(&mut self, snapshot: &InputSnapshot) {
        assert!(!self.frame_active, "begin_frame called while a frame is already active");
        self.frame_active = true;
        self.ctx.new_frame(snapshot);
        self.apply_font();
    }

    /// End the frame and return its draw data
    ///
    /// # Panics
    /// Without an active frame, or when any layout stack is unbalanced.
    pub fn end_frame(&mut self) -> &DrawData {
        assert!(self.frame_active, "end_frame called without begin_frame");
        assert!(self.alignments.is_empty(), "begin_alignment was never matched by end_alignment");
        assert_eq!(self.scope_depth, 0, "begin_scope was never matched by end_scope");
        assert!(self.font_styles.is_empty(), "begin_font was never matched by end_font");
        assert!(self.column_frames.is_empty(), "begin_columns was never matched by end_columns");
        assert_eq!(self.disabled_depth, 0, "begin_disabled was never matched by end_disabled");
        assert!(self.pending_indent.is_none(), "indent was never consumed by a property row");
        self.frame_active = false;
        self.ctx.end_frame()
    }

    /// Whether a frame is between `begin_frame` and `end_frame`
    pub fn is_frame_active(&self) -> bool {
        self.frame_active
    }

    /// Draw data of the last ended frame
    pub fn draw_data(&self) -> &DrawData {
        self.ctx.draw_data()
    }

    // ----- scopes ----------------------------------------------------------

    /// Disambiguate widget ids until the matching [`Self::end_scope`]
    pub fn begin_scope(&mut self, id: u64) {
        self.ctx.push_id_int(id);
        self.scope_depth += 1;
    }

    /// Close the innermost scope
    ///
    /// # Panics
    /// Without an open scope.
    pub fn end_scope(&mut self) {
        assert!(self.scope_depth > 0, "end_scope without begin_scope");
        self.scope_depth -= 1;
        self.ctx.pop_id();
    }

    /// Run `body` inside scope `id`
    pub fn with_scope<R>(&mut self, id: u64, body: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_scope(id);
        let result = body(self);
        self.end_scope();
        result
    }

    // ----- alignment -------------------------------------------------------

    /// Align atomic widgets until the matching [`Self::end_alignment`]
    pub fn begin_alignment(&mut self, align: Align) {
        self.alignments.push(align);
    }

    /// Restore the previous alignment
    ///
    /// # Panics
    /// Without an open alignment.
    pub fn end_alignment(&mut self) {
        assert!(self.alignments.pop().is_some(), "end_alignment without begin_alignment");
    }

    /// Run `body` with atomic widgets aligned by `align`
    pub fn with_alignment<R>(&mut self, align: Align, body: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_alignment(align);
        let result = body(self);
        self.end_alignment();
        result
    }

    /// Alignment applied to the next atomic widget
    pub fn alignment(&self) -> Align {
        self.alignments.last().copied().unwrap_or_default()
    }

    /// Move the cursor so an item `width` wide lands where the alignment wants it
    pub(crate) fn align_next(&mut self, width: f32) {
        let offset = self.alignment().offset(width, self.ctx.content_region_avail().x);
        if offset > 0.0 {
            let pos = self.ctx.cursor_screen_pos();
            self.ctx.set_cursor_screen_pos(Vec2::new(pos.x + offset, pos.y));
        }
    }

    // ----- fonts -----------------------------------------------------------

    /// Add `style` to the active text style until the matching [`Self::end_font`]
    pub fn begin_font(&mut self, style: FontStyle) {
        self.font_styles.push(style);
        self.apply_font();
    }

    /// Drop the innermost font style
    ///
    /// # Panics
    /// Without an open font style.
    pub fn end_font(&mut self) {
        assert!(self.font_styles.pop().is_some(), "end_font without begin_font");
        self.apply_font();
    }

    /// Run `body` with `style` added to the active text style
    pub fn with_font<R>(&mut self, style: FontStyle, body: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_font(style);
        let result = body(self);
        self.end_font();
        result
    }

    /// Union of every style on the font stack
    pub fn font_style(&self) -> FontStyle {
        self.font_styles.iter().fold(FontStyle::REGULAR, |acc, style| acc | *style)
    }

    /// Font the active style resolved to
    pub fn font_selection(&self) -> FontSelection {
        self.font_selection
    }

    fn apply_font(&mut self) {
        let selection = self.selector.select(self.font_style(), self.base_font_size);
        self.ctx.set_font(selection.font, selection.scale);
        self.font_selection = selection;
    }

    /// Replace the atlas and its size table after a rebuild
    ///
    /// # Panics
    /// While a frame is active.
    pub fn set_fonts(&mut self, atlas: Arc<FontAtlas>, selector: FontSelector) {
        assert!(!self.frame_active, "fonts cannot change while a frame is active");
        let zoom = self.selector.zoom();
        self.selector = selector;
        self.selector.set_zoom(zoom);
        self.ctx.set_font_atlas(atlas);
        self.apply_font();
    }

    /// Scale every font selection by `zoom` without rebaking
    pub fn set_zoom(&mut self, zoom: f32) {
        self.selector.set_zoom(zoom);
        self.apply_font();
    }

    /// Current font zoom
    pub fn zoom(&self) -> f32 {
        self.selector.zoom()
    }

    // ----- disabled --------------------------------------------------------

    /// Disable widgets until the matching [`Self::end_disabled`] when `disabled` is set
    pub fn begin_disabled(&mut self, disabled: bool) {
        self.ctx.begin_disabled(disabled);
        self.disabled_depth += 1;
    }

    /// Close the innermost disabled scope
    ///
    /// # Panics
    /// Without an open disabled scope.
    pub fn end_disabled(&mut self) {
        assert!(self.disabled_depth > 0, "end_disabled without begin_disabled");
        self.disabled_depth -= 1;
        self.ctx.end_disabled();
    }

    /// Run `body` with widgets disabled when `disabled` is set
    pub fn with_disabled<R>(&mut self, disabled: bool, body: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_disabled(disabled);
        let result = body(self);
        self.end_disabled();
        result
    }

    // ----- spacing ---------------------------------------------------------

    /// Vertical blank space of `px` pixels
    pub fn space(&mut self, px: f32) {
        self.ctx.add_vertical_space(px);
    }

    /// Indent the label of the next property row by `px`
    pub fn indent(&mut self, px: f32) {
        *self.pending_indent.get_or_insert(0.0) += px;
    }

    pub(crate) fn take_indent(&mut self) -> Option<f32> {
        self.pending_indent.take()
    }

    /// Keep the next widget on the current line
    pub fn same_line(&mut self) {
        self.ctx.same_line(None);
    }

    /// Horizontal rule across the available width
    pub fn separator(&mut self) {
        self.ctx.separator();
    }

    /// Drag parameters for axis tags, scaled by the held speed modifiers
    pub(crate) fn drag_params(&self) -> DragParams {
        let modifiers = self.ctx.io().modifiers;
        let mut speed = self.drag.speed;
        if modifiers.contains(Modifiers::SHIFT) {
            speed *= self.drag.precise_multiplier;
        }
        if modifiers.contains(Modifiers::CTRL) {
            speed *= self.drag.fast_multiplier;
        }
        DragParams::new(f64::from(speed))
    }
}
