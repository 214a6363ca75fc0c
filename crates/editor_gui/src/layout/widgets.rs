//! Panel-facing widgets
//!
//! Atomic widgets (labels, buttons, images) follow the alignment stack.
//! Field widgets are property rows: a label column and a value column whose
//! proportions come from [`LayoutConfig`](crate::config::LayoutConfig). Every
//! field takes its value by reference and returns whether it changed.

use nalgebra::UnitQuaternion;

use crate::foundation::math::Vec2;
use crate::input::MouseButton;
use crate::texture::TextureId;
use crate::toolkit::{rgba, DragParams};

use super::LayoutContext;

/// Tag colors for the x, y, z and w components
pub const AXIS_COLORS: [u32; 4] = [
    rgba(0xc8, 0x3c, 0x3c, 0xff),
    rgba(0x46, 0xa0, 0x46, 0xff),
    rgba(0x3c, 0x64, 0xc8, 0xff),
    rgba(0x80, 0x80, 0x80, 0xff),
];

const AXIS_TAGS: [&str; 4] = ["X", "Y", "Z", "W"];
const CHANNEL_TAGS: [&str; 4] = ["R", "G", "B", "A"];

/// Color channels move this much slower than other drag fields
const CHANNEL_SPEED_SCALE: f64 = 0.05;

const WHITE: u32 = rgba(0xff, 0xff, 0xff, 0xff);

impl LayoutContext {
    // ----- atomic --------------------------------------------------------------------

    /// Text label
    pub fn label(&mut self, text: &str) {
        let width = self.ctx.calc_text_size(text).x;
        self.align_next(width);
        self.ctx.label_text(text);
    }

    /// Push button; true on the frame it is released over
    pub fn button(&mut self, label: &str) -> bool {
        let width = self.ctx.calc_button_size(label).x;
        self.align_next(width);
        self.ctx.button(label)
    }

    /// Whole texture drawn at `size`
    pub fn image(&mut self, texture: TextureId, size: Vec2) {
        self.align_next(size.x);
        self.ctx.image(texture, size, Vec2::zeros(), Vec2::new(1.0, 1.0), WHITE);
    }

    // ----- property rows -------------------------------------------------------------

    /// Label column followed by a value column filled by `value`
    ///
    /// A pending [`indent`](Self::indent) shifts the label and is consumed here.
    #[track_caller]
    pub fn property<R>(&mut self, label: &str, value: impl FnOnce(&mut Self) -> R) -> R {
        let indent = self.take_indent();
        let (label_weight, value_weight) = (self.layout.label_weight, self.layout.value_weight);
        self.ctx.push_id_str(label);
        self.begin_columns(label_weight, false);
        if let Some(px) = indent {
            self.ctx.indent(px);
        }
        self.ctx.label_text(label);
        if let Some(px) = indent {
            self.ctx.unindent(px);
        }
        self.split_columns(value_weight);
        let result = value(self);
        self.end_columns();
        self.ctx.pop_id();
        result
    }

    /// Draggable float
    #[track_caller]
    pub fn float_field(&mut self, label: &str, value: &mut f32) -> bool {
        let params = self.drag_params();
        self.property(label, |ui| {
            let mut scalar = f64::from(*value);
            let changed = ui.ctx.drag_scalar("##value", &mut scalar, &params);
            if changed {
                *value = scalar as f32;
            }
            changed
        })
    }

    /// Draggable integer
    #[track_caller]
    pub fn int_field(&mut self, label: &str, value: &mut i32) -> bool {
        let params = self.drag_params();
        self.property(label, |ui| {
            let mut wide = i64::from(*value);
            let changed = ui.ctx.drag_int("##value", &mut wide, &params);
            if changed {
                *value = wide.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
            }
            changed
        })
    }

    /// Single-line text
    #[track_caller]
    pub fn text_field(&mut self, label: &str, value: &mut String) -> bool {
        self.property(label, |ui| ui.ctx.input_text("##value", value))
    }

    /// Boolean toggle
    #[track_caller]
    pub fn checkbox_field(&mut self, label: &str, value: &mut bool) -> bool {
        self.property(label, |ui| ui.ctx.checkbox("##value", value))
    }

    /// Choice of one of `items`
    #[track_caller]
    pub fn combo_field(&mut self, label: &str, current: &mut usize, items: &[&str]) -> bool {
        self.property(label, |ui| ui.ctx.combo("##value", current, items))
    }

    // ----- composite -----------------------------------------------------------------

    /// Vector with up to four components, one tagged drag field each
    ///
    /// # Panics
    /// If `N` is 0 or greater than 4.
    #[track_caller]
    pub fn vector_field<const N: usize>(&mut self, label: &str, values: &mut [f32; N]) -> bool {
        assert!((1..=4).contains(&N), "vector_field supports 1 to 4 components, got {}", N);
        let params = self.drag_params();
        let mut scalars = values.map(f64::from);
        let changed = self.property(label, |ui| ui.axis_row(&AXIS_TAGS[..N], &AXIS_COLORS[..N], &mut scalars, &params));
        if changed {
            *values = scalars.map(|v| v as f32);
        }
        changed
    }

    /// Rotation edited as roll, pitch and yaw in degrees
    #[track_caller]
    pub fn quaternion_field(&mut self, label: &str, rotation: &mut UnitQuaternion<f32>) -> bool {
        let (roll, pitch, yaw) = rotation.euler_angles();
        let mut degrees = [roll, pitch, yaw].map(|angle| f64::from(angle.to_degrees()));
        let params = self.drag_params();
        let changed = self.property(label, |ui| ui.axis_row(&AXIS_TAGS[..3], &AXIS_COLORS[..3], &mut degrees, &params));
        if changed {
            let [roll, pitch, yaw] = degrees.map(|d| (d as f32).to_radians());
            *rotation = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
        }
        changed
    }

    /// RGBA color with channels in `[0, 1]`
    #[track_caller]
    pub fn color_field(&mut self, label: &str, color: &mut [f32; 4]) -> bool {
        let base = self.drag_params();
        let params = DragParams::new(base.speed * CHANNEL_SPEED_SCALE).with_range(0.0, 1.0);
        let mut channels = color.map(f64::from);
        let changed = self.property(label, |ui| ui.axis_row(&CHANNEL_TAGS, &AXIS_COLORS, &mut channels, &params));
        if changed {
            *color = channels.map(|c| c as f32);
        }
        changed
    }

    /// Equal sub-columns, each a colored drag tag followed by a numeric field
    fn axis_row(&mut self, tags: &[&str], colors: &[u32], values: &mut [f64], params: &DragParams) -> bool {
        let tag_width = self.layout.axis_tag_width;
        let mut changed = false;
        self.begin_columns(1.0, false);
        for (axis, value) in values.iter_mut().enumerate() {
            if axis > 0 {
                self.split_columns(1.0);
            }
            self.ctx.push_id_int(axis as u64);
            changed |= self.ctx.drag_tag("##tag", tags[axis], tag_width, colors[axis], value, params);
            self.ctx.same_line(Some(0.0));
            changed |= self.ctx.drag_scalar("##value", value, params);
            self.ctx.pop_id();
        }
        self.end_columns();
        changed
    }

    // ----- structure -----------------------------------------------------------------

    /// Collapsible section header; true while open
    pub fn collapsing_header(&mut self, label: &str, default_open: bool) -> bool {
        self.ctx.collapsing_header(label, default_open)
    }

    /// Run `body` below a header while it is open
    pub fn header<R>(&mut self, label: &str, default_open: bool, body: impl FnOnce(&mut Self) -> R) -> Option<R> {
        self.collapsing_header(label, default_open).then(|| body(self))
    }

    // ----- popup menus ---------------------------------------------------------------

    /// Open popup `id` at the mouse
    pub fn open_popup(&mut self, id: &str) {
        self.ctx.open_popup(id);
    }

    /// Run `body` inside popup `id` while it is open
    pub fn popup<R>(&mut self, id: &str, body: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if !self.ctx.begin_popup(id) {
            return None;
        }
        let result = body(self);
        self.ctx.end_popup();
        Some(result)
    }

    /// Popup `id` opened by right-clicking the last widget
    pub fn context_menu<R>(&mut self, id: &str, body: impl FnOnce(&mut Self) -> R) -> Option<R> {
        self.ctx.open_popup_on_item_click(id, MouseButton::Right);
        self.popup(id, body)
    }

    /// Menu entry; true when chosen, which also closes the menu
    pub fn menu_item(&mut self, label: &str, shortcut: Option<&str>, enabled: bool) -> bool {
        self.ctx.menu_item(label, shortcut, false, enabled)
    }

    /// Menu entry with a check mark toggling `checked`
    pub fn menu_toggle(&mut self, label: &str, checked: &mut bool) -> bool {
        let chosen = self.ctx.menu_item(label, None, *checked, true);
        if chosen {
            *checked = !*checked;
        }
        chosen
    }

    /// Close the popup being built
    pub fn close_popup(&mut self) {
        self.ctx.close_current_popup();
    }
}
