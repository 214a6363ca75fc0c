//! Widgets
//!
//! Every widget reads its value in, reports whether the user changed it and
//! writes the new value back through the `&mut` it was given.

use crate::foundation::math::{Rect, Vec2};
use crate::input::MouseButton;
use crate::texture::TextureId;

use super::context::{Context, TextEvent};
use super::id::{display_label, WidgetId};
use super::style::{pack_color, scale_alpha, ColorRole};
use super::window::WindowFlags;

const MAX_DECIMALS: usize = 10;

/// How a numeric field responds to dragging and typing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragParams {
    /// Value change per pixel of horizontal mouse movement
    pub speed: f64,
    /// Lower bound
    pub min: Option<f64>,
    /// Upper bound
    pub max: Option<f64>,
    /// Digits after the decimal point, for display and rounding
    pub decimals: usize,
}

impl Default for DragParams {
    fn default() -> Self {
        Self { speed: 0.1, min: None, max: None, decimals: 3 }
    }
}

impl DragParams {
    /// Parameters with the given drag speed
    pub fn new(speed: f64) -> Self {
        Self { speed, ..Self::default() }
    }

    /// Clamp to `[min, max]`
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Display precision
    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals.min(MAX_DECIMALS);
        self
    }

    /// Apply the bounds to `value`
    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }

    fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.decimals.min(MAX_DECIMALS) as i32);
        (value * scale).round() / scale
    }

    /// Value as displayed
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals.min(MAX_DECIMALS), value)
    }
}

struct DragOutcome {
    changed: bool,
    hovered: bool,
    clicked_without_drag: bool,
}

impl Context {
    // ----- text ---------------------------------------------------------------

    /// Plain text
    pub fn text(&mut self, text: &str) {
        let col = self.color(ColorRole::Text);
        self.text_colored(col, text);
    }

    /// Text in the disabled color
    pub fn text_disabled(&mut self, text: &str) {
        let col = self.color(ColorRole::TextDisabled);
        self.text_colored(col, text);
    }

    /// Text in a packed color
    pub fn text_colored(&mut self, col: u32, text: &str) {
        let size = self.calc_text_size(text);
        let pos = self.cursor_screen_pos();
        self.item_size(size);
        if self.item_add(Rect::from_pos_size(pos, size), None) {
            self.draw_text(pos, col, display_label(text));
        }
    }

    /// Text vertically centered on a framed widget's line
    pub fn label_text(&mut self, text: &str) {
        let size = self.calc_text_size(text);
        let height = self.frame_height();
        let pos = self.cursor_screen_pos();
        self.item_size(Vec2::new(size.x, height));
        if self.item_add(Rect::from_pos_size(pos, Vec2::new(size.x, height)), None) {
            let col = self.color(ColorRole::Text);
            let text_pos = Vec2::new(pos.x, pos.y + self.style.frame_padding.y);
            self.draw_text(text_pos, col, display_label(text));
        }
    }

    // ----- buttons -------------------------------------------------------------

    /// Size a button for `label` would take
    pub fn calc_button_size(&self, label: &str) -> Vec2 {
        self.calc_text_size(label) + self.style.frame_padding * 2.0
    }

    /// Button sized to its label; true on the frame it is clicked
    pub fn button(&mut self, label: &str) -> bool {
        self.button_sized(label, Vec2::zeros())
    }

    /// Button of explicit size; zero fits the label, negative leaves room on the right
    pub fn button_sized(&mut self, label: &str, size: Vec2) -> bool {
        let id = self.get_id(label);
        let fit = self.calc_button_size(label);
        let avail = self.content_region_avail().x;
        let width = match size.x {
            w if w > 0.0 => w,
            w if w < 0.0 => (avail + w).max(1.0),
            _ => fit.x,
        };
        let height = if size.y > 0.0 { size.y } else { fit.y };
        let pos = self.cursor_screen_pos();
        let rect = Rect::from_pos_size(pos, Vec2::new(width, height));
        self.item_size(rect.size());
        let visible = self.item_add(rect, Some(id));

        let (pressed, hovered, held) = self.button_behavior(&rect, id, false);
        if visible {
            let role = match (hovered, held) {
                (true, true) => ColorRole::ButtonActive,
                (true, false) => ColorRole::ButtonHovered,
                _ => ColorRole::Button,
            };
            let bg = self.color(role);
            self.window_draw_list().add_rect_filled(rect.min, rect.max, bg);
            let text = self.calc_text_size(label);
            let text_pos = (rect.center() - text * 0.5).map(f32::round);
            let col = self.color(ColorRole::Text);
            self.draw_text(text_pos, col, display_label(label));
        }
        pressed
    }

    /// Checkbox toggling `value`; true when toggled
    pub fn checkbox(&mut self, label: &str, value: &mut bool) -> bool {
        let id = self.get_id(label);
        let side = self.frame_height();
        let visible_label = display_label(label);
        let text = self.calc_text_size(visible_label);
        let label_width = if visible_label.is_empty() { 0.0 } else { self.style.item_inner_spacing.x + text.x };
        let pos = self.cursor_screen_pos();
        let check_box = Rect::from_pos_size(pos, Vec2::new(side, side));
        let total = Rect::from_pos_size(pos, Vec2::new(side + label_width, side));
        self.item_size(total.size());
        let visible = self.item_add(total, Some(id));

        let (pressed, hovered, held) = self.button_behavior(&total, id, false);
        if pressed {
            *value = !*value;
        }
        if visible {
            let bg = self.color(frame_role(hovered, held));
            self.window_draw_list().add_rect_filled(check_box.min, check_box.max, bg);
            if *value {
                let inset = (side / 5.0).round().max(1.0);
                let mark = self.color(ColorRole::CheckMark);
                self.window_draw_list().add_rect_filled(
                    check_box.min + Vec2::new(inset, inset),
                    check_box.max - Vec2::new(inset, inset),
                    mark,
                );
            }
            if label_width > 0.0 {
                let col = self.color(ColorRole::Text);
                let text_pos = Vec2::new(check_box.max.x + self.style.item_inner_spacing.x, pos.y + self.style.frame_padding.y);
                self.draw_text(text_pos, col, visible_label);
            }
        }
        pressed
    }

    // ----- framed fields -----------------------------------------------------------

    /// Lay out a frame of the current item width plus its visible label
    fn add_framed_item(&mut self, label: &str, id: WidgetId) -> (Rect, bool) {
        let width = self.calc_item_width();
        let height = self.frame_height();
        let pos = self.cursor_screen_pos();
        let frame = Rect::from_pos_size(pos, Vec2::new(width, height));
        let visible_label = display_label(label);
        let mut total = frame;
        if !visible_label.is_empty() {
            total.max.x += self.style.item_inner_spacing.x + self.calc_text_size(visible_label).x;
        }
        self.item_size(total.size());
        let visible = self.item_add(frame, Some(id));
        if visible && !visible_label.is_empty() {
            let col = self.color(ColorRole::Text);
            let text_pos = Vec2::new(frame.max.x + self.style.item_inner_spacing.x, pos.y + self.style.frame_padding.y);
            self.draw_text(text_pos, col, visible_label);
        }
        (frame, visible)
    }

    fn render_frame_text(&mut self, frame: Rect, role: ColorRole, text: &str, centered: bool) {
        let bg = self.color(role);
        self.window_draw_list().add_rect_filled(frame.min, frame.max, bg);
        let size = self.calc_text_size(text);
        let x = if centered {
            frame.min.x + ((frame.width() - size.x) * 0.5).max(self.style.frame_padding.x)
        } else {
            frame.min.x + self.style.frame_padding.x
        };
        let pos = Vec2::new(x.round(), frame.min.y + self.style.frame_padding.y);
        let col = self.color(ColorRole::Text);
        let clip = frame.expand(-1.0);
        self.window_draw_list().push_clip_rect(clip, true);
        self.draw_text(pos, col, text);
        self.window_draw_list().pop_clip_rect();
    }

    /// Draw a text field, with its edit buffer and cursor while focused
    fn render_text_field(&mut self, frame: Rect, id: WidgetId, text: &str, centered: bool) {
        let Some(edit) = self.focus.as_ref().filter(|f| f.id == id) else {
            let role = if self.last_item.hovered { ColorRole::FrameBgHovered } else { ColorRole::FrameBg };
            self.render_frame_text(frame, role, text, centered);
            return;
        };
        let buffer = edit.text();
        let before_cursor: String = edit.buffer[..edit.cursor].iter().collect();
        let selected_all = edit.selected_all;

        let pad = self.style.frame_padding;
        let text_min = Vec2::new(frame.min.x + pad.x, frame.min.y + pad.y);
        let font_size = self.font_size();
        if selected_all && !buffer.is_empty() {
            let width = self.calc_text_size(&buffer).x;
            let highlight = scale_alpha(self.color(ColorRole::Focus), 0.6);
            let selection_max = Vec2::new(text_min.x + width, text_min.y + font_size);
            self.render_frame_text(frame, ColorRole::FrameBgActive, "", false);
            self.window_draw_list().add_rect_filled(text_min, selection_max, highlight);
        } else {
            self.render_frame_text(frame, ColorRole::FrameBgActive, "", false);
        }

        let col = self.color(ColorRole::Text);
        self.window_draw_list().push_clip_rect(frame.expand(-1.0), true);
        self.draw_text(text_min, col, &buffer);
        if !selected_all {
            let cursor_x = (text_min.x + self.current_font().text_size(&before_cursor).x * self.font_scale).round();
            self.window_draw_list().add_rect_filled(
                Vec2::new(cursor_x, text_min.y),
                Vec2::new(cursor_x + 1.0, text_min.y + font_size),
                col,
            );
        }
        self.window_draw_list().pop_clip_rect();
        let focus = self.color(ColorRole::Focus);
        self.window_draw_list().add_rect(frame.min, frame.max, focus, 1.0);
    }

    fn drag_behavior(&mut self, rect: &Rect, id: WidgetId, value: &mut f64, params: &DragParams) -> DragOutcome {
        let hovered = self.item_hoverable(rect, id);
        self.last_item.hovered = hovered;
        let mut outcome = DragOutcome { changed: false, hovered, clicked_without_drag: false };

        if hovered && self.io.is_clicked(MouseButton::Left) {
            self.set_active(id);
        }
        if self.active_id != Some(id) {
            return outcome;
        }
        self.active_id_alive = true;
        if self.io.is_down(MouseButton::Left) {
            let dx = f64::from(self.io.mouse_delta.x);
            if dx != 0.0 {
                self.active_drag_moved = true;
                let raw = *value + self.drag_remainder + dx * params.speed;
                let next = params.clamp(params.round(raw));
                self.drag_remainder = if next == params.round(raw) { raw - next } else { 0.0 };
                if next != *value {
                    *value = next;
                    outcome.changed = true;
                }
            }
        } else {
            outcome.clicked_without_drag = !self.active_drag_moved && hovered;
            self.clear_active();
        }
        outcome
    }

    fn scalar_text_field(&mut self, frame: Rect, id: WidgetId, value: &mut f64, params: &DragParams, visible: bool) -> bool {
        let current = params.format(*value);
        let event = self.text_behavior(&frame, id, &current, true);
        let mut changed = false;
        if let TextEvent::Committed(text) = &event {
            match text.trim().parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => {
                    let next = params.clamp(parsed);
                    changed = next != *value;
                    *value = next;
                }
                _ => log::debug!("Ignoring non-numeric input '{}'", text),
            }
        }
        if visible {
            let shown = params.format(*value);
            self.render_text_field(frame, id, &shown, true);
        }
        changed
    }

    /// Numeric field changed by dragging horizontally; a click without movement types a value
    pub fn drag_scalar(&mut self, label: &str, value: &mut f64, params: &DragParams) -> bool {
        let id = self.get_id(label);
        let (frame, visible) = self.add_framed_item(label, id);
        if self.focused_id() == Some(id) {
            return self.scalar_text_field(frame, id, value, params, visible);
        }

        let outcome = self.drag_behavior(&frame, id, value, params);
        if outcome.clicked_without_drag {
            let text = params.format(*value);
            self.request_focus(id, &text, true);
        }
        if visible {
            let role = if self.active_id == Some(id) {
                ColorRole::FrameBgActive
            } else if outcome.hovered {
                ColorRole::FrameBgHovered
            } else {
                ColorRole::FrameBg
            };
            let text = params.format(*value);
            self.render_frame_text(frame, role, &text, true);
        }
        outcome.changed
    }

    /// Integer variant of [`Self::drag_scalar`]
    pub fn drag_int(&mut self, label: &str, value: &mut i64, params: &DragParams) -> bool {
        let mut scalar = *value as f64;
        let changed = self.drag_scalar(label, &mut scalar, &params.with_decimals(0));
        if changed {
            *value = scalar.round() as i64;
        }
        changed
    }

    /// Numeric field edited by clicking and typing
    pub fn input_scalar(&mut self, label: &str, value: &mut f64, params: &DragParams) -> bool {
        let id = self.get_id(label);
        let (frame, visible) = self.add_framed_item(label, id);
        self.scalar_text_field(frame, id, value, params, visible)
    }

    /// Colored handle that changes `value` when dragged
    pub fn drag_tag(&mut self, label: &str, tag: &str, width: f32, col: u32, value: &mut f64, params: &DragParams) -> bool {
        let id = self.get_id(label);
        let pos = self.cursor_screen_pos();
        let rect = Rect::from_pos_size(pos, Vec2::new(width, self.frame_height()));
        self.item_size(rect.size());
        let visible = self.item_add(rect, Some(id));
        let outcome = self.drag_behavior(&rect, id, value, params);
        if visible {
            let active = self.active_id == Some(id);
            let bg = if self.is_disabled() { scale_alpha(col, self.style.disabled_alpha) } else { col };
            let bg = if outcome.hovered || active { bg } else { scale_alpha(bg, 0.85) };
            self.window_draw_list().add_rect_filled(rect.min, rect.max, bg);
            let text = self.calc_text_size(tag);
            let text_pos = (rect.center() - text * 0.5).map(f32::round);
            let text_col = self.color(ColorRole::Text);
            self.draw_text(text_pos, text_col, tag);
        }
        outcome.changed
    }

    /// Single-line text field; `buffer` follows every keystroke and Escape restores it
    pub fn input_text(&mut self, label: &str, buffer: &mut String) -> bool {
        let id = self.get_id(label);
        let (frame, visible) = self.add_framed_item(label, id);
        let changed = match self.text_behavior(&frame, id, buffer, false) {
            TextEvent::Edited(text) | TextEvent::Committed(text) | TextEvent::Cancelled(text) if *buffer != text => {
                *buffer = text;
                true
            }
            _ => false,
        };
        if visible {
            let shown = buffer.clone();
            self.render_text_field(frame, id, &shown, false);
        }
        changed
    }

    /// Solid color square; true when clicked
    pub fn color_swatch(&mut self, label: &str, color: [f32; 4], size: Vec2) -> bool {
        let id = self.get_id(label);
        let side = self.frame_height();
        let size = Vec2::new(if size.x > 0.0 { size.x } else { side }, if size.y > 0.0 { size.y } else { side });
        let pos = self.cursor_screen_pos();
        let rect = Rect::from_pos_size(pos, size);
        self.item_size(size);
        let visible = self.item_add(rect, Some(id));
        let (pressed, hovered, _) = self.button_behavior(&rect, id, false);
        if visible {
            let mut fill = pack_color(color);
            if self.is_disabled() {
                fill = scale_alpha(fill, self.style.disabled_alpha);
            }
            self.window_draw_list().add_rect_filled(rect.min, rect.max, fill);
            let border = self.color(if hovered { ColorRole::Focus } else { ColorRole::Border });
            self.window_draw_list().add_rect(rect.min, rect.max, border, 1.0);
        }
        pressed
    }

    // ----- selection ----------------------------------------------------------------

    /// Full-width row; true when clicked. Clicking one inside a popup closes the popup.
    pub fn selectable(&mut self, label: &str, selected: bool) -> bool {
        let id = self.get_id(label);
        let text = self.calc_text_size(label);
        let width = self.content_region_avail().x.max(text.x);
        let pos = self.cursor_screen_pos();
        let rect = Rect::from_pos_size(pos, Vec2::new(width, text.y));
        self.item_size(rect.size());
        let visible = self.item_add(rect, Some(id));
        let (pressed, hovered, held) = self.button_behavior(&rect, id, false);
        if visible {
            if hovered || held || selected {
                let bg = self.color(if hovered { ColorRole::HeaderHovered } else { ColorRole::Header });
                self.window_draw_list().add_rect_filled(rect.min, rect.max, bg);
            }
            let col = self.color(ColorRole::Text);
            self.draw_text(pos, col, display_label(label));
        }
        if pressed && self.current_window().flags.contains(WindowFlags::POPUP) {
            self.close_current_popup();
        }
        pressed
    }

    /// Menu entry with optional shortcut text and check mark
    pub fn menu_item(&mut self, label: &str, shortcut: Option<&str>, selected: bool, enabled: bool) -> bool {
        self.begin_disabled(!enabled);
        let id = self.get_id(label);
        let font_size = self.font_size();
        let spacing = self.style.item_spacing.x;
        let check_width = font_size + self.style.item_inner_spacing.x;
        let text = self.calc_text_size(label);
        let shortcut_width = shortcut.map_or(0.0, |s| self.calc_text_size(s).x + spacing * 2.0);
        let width = self.content_region_avail().x.max(check_width + text.x + shortcut_width);
        let pos = self.cursor_screen_pos();
        let rect = Rect::from_pos_size(pos, Vec2::new(width, text.y));
        self.item_size(rect.size());
        let visible = self.item_add(rect, Some(id));
        let (pressed, hovered, _) = self.button_behavior(&rect, id, false);

        if visible {
            if hovered {
                let bg = self.color(ColorRole::HeaderHovered);
                self.window_draw_list().add_rect_filled(rect.min, rect.max, bg);
            }
            if selected {
                let inset = (font_size * 0.3).round();
                let mark = self.color(ColorRole::CheckMark);
                self.window_draw_list().add_rect_filled(
                    pos + Vec2::new(inset, inset),
                    pos + Vec2::new(font_size - inset, font_size - inset),
                    mark,
                );
            }
            let col = self.color(ColorRole::Text);
            self.draw_text(Vec2::new(pos.x + check_width, pos.y), col, display_label(label));
            if let Some(shortcut) = shortcut {
                let x = rect.max.x - self.calc_text_size(shortcut).x - spacing;
                let dim = self.color(ColorRole::TextDisabled);
                self.draw_text(Vec2::new(x.round(), pos.y), dim, shortcut);
            }
        }
        if pressed && self.current_window().flags.contains(WindowFlags::POPUP) {
            self.close_current_popup();
        }
        self.end_disabled();
        pressed
    }

    /// Drop-down list choosing `current` from `items`; true when the choice changed
    pub fn combo(&mut self, label: &str, current: &mut usize, items: &[&str]) -> bool {
        let id = self.get_id(label);
        let popup_id = id.child_str("##combo");
        let (frame, visible) = self.add_framed_item(label, id);
        let (pressed, hovered, _) = self.button_behavior(&frame, id, true);
        let open = self.is_popup_id_open(popup_id);
        if pressed && !open && !self.popups_closed_by_click.contains(&popup_id) {
            self.open_popup_ex(popup_id, Vec2::new(frame.min.x, frame.max.y), frame.width());
        }

        if visible {
            let role = if open || hovered { ColorRole::FrameBgHovered } else { ColorRole::FrameBg };
            let preview = items.get(*current).copied().unwrap_or("");
            self.render_frame_text(frame, role, preview, false);
            let side = frame.height();
            let arrow_min = Vec2::new(frame.max.x - side, frame.min.y);
            let button = self.color(if hovered { ColorRole::ButtonHovered } else { ColorRole::Button });
            self.window_draw_list().add_rect_filled(arrow_min, frame.max, button);
            let col = self.color(ColorRole::Text);
            self.render_arrow(Rect::new(arrow_min, frame.max), true, col);
        }

        let mut changed = false;
        if self.begin_popup_ex(popup_id) {
            for (i, item) in items.iter().enumerate() {
                self.push_id_int(i as u64);
                if self.selectable(item, i == *current) {
                    changed |= *current != i;
                    *current = i;
                }
                self.pop_id();
            }
            self.end_popup();
        }
        changed
    }

    /// Triangle centered in `rect`, pointing down or right
    fn render_arrow(&mut self, rect: Rect, down: bool, col: u32) {
        let center = rect.center();
        let r = rect.height().min(rect.width()) * 0.25;
        let (a, b, c) = if down {
            (center + Vec2::new(-r, -r * 0.5), center + Vec2::new(r, -r * 0.5), center + Vec2::new(0.0, r * 0.75))
        } else {
            (center + Vec2::new(-r * 0.5, -r), center + Vec2::new(r * 0.75, 0.0), center + Vec2::new(-r * 0.5, r))
        };
        self.window_draw_list().add_triangle_filled(a, b, c, col);
    }

    // ----- structure ----------------------------------------------------------------

    /// Full-width header toggling open on click; the state persists in settings
    pub fn collapsing_header(&mut self, label: &str, default_open: bool) -> bool {
        let id = self.get_id(label);
        let mut open = self
            .bool_state
            .get(&id)
            .copied()
            .or_else(|| self.settings.header(id))
            .unwrap_or(default_open);
        let height = self.frame_height();
        let text = self.calc_text_size(label);
        let width = self.content_region_avail().x.max(text.x + height);
        let pos = self.cursor_screen_pos();
        let rect = Rect::from_pos_size(pos, Vec2::new(width, height));
        self.item_size(rect.size());
        let visible = self.item_add(rect, Some(id));
        let (pressed, hovered, _) = self.button_behavior(&rect, id, false);
        if pressed {
            open = !open;
            self.settings.set_header(id, open);
        }
        self.bool_state.insert(id, open);

        if visible {
            let bg = self.color(if hovered { ColorRole::HeaderHovered } else { ColorRole::Header });
            self.window_draw_list().add_rect_filled(rect.min, rect.max, bg);
            let col = self.color(ColorRole::Text);
            self.render_arrow(Rect::from_pos_size(pos, Vec2::new(height, height)), open, col);
            self.draw_text(Vec2::new(pos.x + height, pos.y + self.style.frame_padding.y), col, display_label(label));
        }
        open
    }

    /// Image sampling `texture`
    pub fn image(&mut self, texture: TextureId, size: Vec2, uv_min: Vec2, uv_max: Vec2, tint: u32) {
        let pos = self.cursor_screen_pos();
        let rect = Rect::from_pos_size(pos, size);
        self.item_size(size);
        if self.item_add(rect, None) {
            let tint = if self.is_disabled() { scale_alpha(tint, self.style.disabled_alpha) } else { tint };
            self.window_draw_list().add_image(texture, rect.min, rect.max, uv_min, uv_max, tint);
        }
    }

    /// Horizontal line across the work area
    pub fn separator(&mut self) {
        let window = self.current_window();
        let min_x = window.dc.line_start_x();
        let max_x = window.dc.work_max_x;
        let y = self.cursor_screen_pos().y.round();
        let rect = Rect::new(Vec2::new(min_x, y), Vec2::new(max_x, y + 1.0));
        self.item_size(Vec2::new(max_x - min_x, 1.0));
        if self.item_add(rect, None) {
            let col = self.color(ColorRole::Separator);
            self.window_draw_list().add_rect_filled(rect.min, rect.max, col);
        }
    }
}

fn frame_role(hovered: bool, held: bool) -> ColorRole {
    match (hovered, held) {
        (true, true) => ColorRole::FrameBgActive,
        (true, false) => ColorRole::FrameBgHovered,
        _ => ColorRole::FrameBg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputSnapshot, Key};
    use crate::toolkit::test_support::{click_frames, context, frame, run_frame};
    use approx::assert_relative_eq;

    fn inside() -> Vec2 {
        Vec2::new(12.0, 12.0)
    }

    fn at(pos: Vec2) -> InputSnapshot {
        frame().with_mouse(pos.x, pos.y)
    }

    #[test]
    fn test_button_fires_on_release() {
        let mut ctx = context();
        let mut presses = Vec::new();
        click_frames(&mut ctx, inside(), None, &mut |c: &mut Context| presses.push(c.button("OK")));

        assert_eq!(presses, vec![false, false, true]);
    }

    #[test]
    fn test_button_release_outside_does_not_fire() {
        let mut ctx = context();
        let mut presses = Vec::new();
        click_frames(&mut ctx, inside(), Some(Vec2::new(400.0, 400.0)), &mut |c: &mut Context| presses.push(c.button("OK")));

        assert!(presses.iter().all(|p| !p));
    }

    #[test]
    fn test_button_size_fits_label() {
        let mut ctx = context();
        ctx.new_frame(&frame());
        ctx.button("OK");
        let rect = ctx.last_item().rect;
        ctx.end_frame();

        // two 8 px glyphs and a 16 px line plus frame padding
        assert_eq!(rect.size(), Vec2::new(24.0, 22.0));
    }

    #[test]
    fn test_checkbox_toggles() {
        let mut ctx = context();
        let mut value = false;
        click_frames(&mut ctx, inside(), None, &mut |c: &mut Context| {
            c.checkbox("Visible", &mut value);
        });
        assert!(value);
    }

    #[test]
    fn test_disabled_button_ignores_clicks() {
        let mut ctx = context();
        let mut presses = Vec::new();
        click_frames(&mut ctx, inside(), None, &mut |c: &mut Context| {
            c.begin_disabled(true);
            presses.push(c.button("OK"));
            c.end_disabled();
        });
        assert!(presses.iter().all(|p| !p));
    }

    #[test]
    fn test_drag_scales_mouse_delta() {
        let mut ctx = context();
        let mut value = 1.0;
        let params = DragParams::new(0.5);
        click_frames(&mut ctx, Vec2::new(100.0, 15.0), Some(Vec2::new(110.0, 15.0)), &mut |c: &mut Context| {
            c.drag_scalar("##x", &mut value, &params);
        });

        assert_relative_eq!(value, 6.0);
        assert!(ctx.focused_id().is_none());
    }

    #[test]
    fn test_drag_respects_range() {
        let mut ctx = context();
        let mut value = 0.5;
        let params = DragParams::new(1.0).with_range(0.0, 1.0);
        click_frames(&mut ctx, Vec2::new(100.0, 15.0), Some(Vec2::new(300.0, 15.0)), &mut |c: &mut Context| {
            c.drag_scalar("##x", &mut value, &params);
        });

        assert_eq!(value, 1.0);
    }

    #[test]
    fn test_int_drag_accumulates_sub_unit_motion() {
        let mut ctx = context();
        let mut value = 0_i64;
        let params = DragParams::new(0.25);
        let mut draw = |c: &mut Context| {
            c.drag_int("##count", &mut value, &params);
        };
        let held = |x: f32| at(Vec2::new(x, 15.0)).with_button(MouseButton::Left, true);
        run_frame(&mut ctx, at(Vec2::new(100.0, 15.0)), &mut draw);
        run_frame(&mut ctx, held(100.0), &mut draw);
        for step in 1..=8 {
            run_frame(&mut ctx, held(100.0 + step as f32), &mut draw);
        }

        assert_eq!(value, 2);
    }

    #[test]
    fn test_click_without_drag_types_a_value() {
        let mut ctx = context();
        let mut value = 0.0;
        let params = DragParams::default();
        let mut draw = |c: &mut Context| {
            c.drag_scalar("##x", &mut value, &params);
        };
        click_frames(&mut ctx, Vec2::new(100.0, 15.0), None, &mut draw);
        run_frame(&mut ctx, frame().with_text("2.5"), &mut draw);
        run_frame(&mut ctx, frame().with_key_press(Key::Enter), &mut draw);

        assert_relative_eq!(value, 2.5);
        assert!(ctx.focused_id().is_none());
    }

    #[test]
    fn test_input_text_edits_live_and_escape_restores() {
        let mut ctx = context();
        let mut name = String::from("cube");
        let mut seen = Vec::new();
        let mut draw = |c: &mut Context| {
            c.input_text("##name", &mut name);
            seen.push(name.clone());
        };
        click_frames(&mut ctx, Vec2::new(100.0, 15.0), None, &mut draw);
        run_frame(&mut ctx, frame().with_text("s"), &mut draw);
        run_frame(&mut ctx, frame().with_key_press(Key::Escape), &mut draw);

        assert_eq!(seen[3], "cubes");
        assert_eq!(name, "cube");
    }

    #[test]
    fn test_input_text_commits_on_click_outside() {
        let mut ctx = context();
        let mut name = String::from("a");
        let mut draw = |c: &mut Context| {
            c.input_text("##name", &mut name);
        };
        click_frames(&mut ctx, Vec2::new(100.0, 15.0), None, &mut draw);
        run_frame(&mut ctx, frame().with_key_press(Key::Backspace).with_text("bc"), &mut draw);
        run_frame(&mut ctx, at(Vec2::new(600.0, 600.0)).with_button(MouseButton::Left, true), &mut draw);

        assert_eq!(name, "bc");
        assert!(ctx.focused_id().is_none());
    }

    #[test]
    fn test_combo_selects_item() {
        let mut ctx = context();
        let mut mode = 0;
        let mut changes = 0;
        let mut draw = |c: &mut Context| {
            if c.combo("##mode", &mut mode, &["Lit", "Unlit", "Wire"]) {
                changes += 1;
            }
        };
        click_frames(&mut ctx, Vec2::new(100.0, 15.0), None, &mut draw);
        assert_eq!(ctx.open_popup_count(), 1);

        // rows start below the frame at y = 30 + 8 padding, 20 px apart
        click_frames(&mut ctx, Vec2::new(100.0, 65.0), None, &mut draw);

        assert_eq!(mode, 1);
        assert_eq!(changes, 1);
        assert_eq!(ctx.open_popup_count(), 0);
    }

    #[test]
    fn test_combo_click_on_frame_closes_open_list() {
        let mut ctx = context();
        let mut mode = 0;
        let mut draw = |c: &mut Context| {
            c.combo("##mode", &mut mode, &["Lit", "Unlit"]);
        };
        click_frames(&mut ctx, Vec2::new(100.0, 15.0), None, &mut draw);
        click_frames(&mut ctx, Vec2::new(100.0, 15.0), None, &mut draw);

        assert_eq!(ctx.open_popup_count(), 0);
        assert_eq!(mode, 0);
    }

    #[test]
    fn test_collapsing_header_persists() {
        let mut ctx = context();
        let mut states = Vec::new();
        click_frames(&mut ctx, inside(), None, &mut |c: &mut Context| states.push(c.collapsing_header("Transform", false)));

        assert_eq!(states, vec![false, false, true]);
        let id = WidgetId::ROOT.child_str("##Root").child_str("Transform");
        assert!(ctx.settings_text().contains(&format!("[Header][{:016x}]\nOpen=1", id.0)));

        let mut reloaded = context();
        reloaded.load_settings(&ctx.settings_text());
        reloaded.new_frame(&frame());
        assert!(reloaded.collapsing_header("Transform", false));
        reloaded.end_frame();
    }

    #[test]
    fn test_image_uses_texture_command() {
        let mut ctx = context();
        ctx.new_frame(&frame());
        ctx.image(TextureId(100), Vec2::new(32.0, 32.0), Vec2::zeros(), Vec2::new(1.0, 1.0), u32::MAX);
        let data = ctx.end_frame();

        let cmds = data.draw_lists[0].commands();
        assert!(cmds.iter().any(|c| c.texture_id == TextureId(100) && c.elem_count == 6));
    }

    #[test]
    fn test_format_uses_decimals() {
        assert_eq!(DragParams::default().format(1.0), "1.000");
        assert_eq!(DragParams::default().with_decimals(1).format(2.26), "2.3");
    }
}
