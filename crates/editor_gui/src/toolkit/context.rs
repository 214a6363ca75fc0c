//! Toolkit context: frame lifecycle, windows, ids, interaction and cursor flow

use std::collections::HashMap;
use std::sync::Arc;

use crate::font::{BakedFont, FontAtlas, FontId};
use crate::foundation::math::{Rect, Vec2};
use crate::input::{InputSnapshot, Key, MouseButton};

use super::draw::DrawData;
use super::id::{display_label, WidgetId};
use super::io::Io;
use super::settings::{Settings, WindowSettings};
use super::style::{scale_alpha, ColorRole, Style};
use super::window::{Window, WindowFlags};

const ROOT_WINDOW: &str = "##Root";
const WHEEL_LINES: f32 = 3.0;

/// Text being edited in a focused input field
#[derive(Debug, Clone)]
pub(crate) struct TextEdit {
    pub(crate) id: WidgetId,
    pub(crate) buffer: Vec<char>,
    pub(crate) cursor: usize,
    pub(crate) initial: String,
    /// The first edit replaces the whole buffer
    pub(crate) selected_all: bool,
}

impl TextEdit {
    fn new(id: WidgetId, text: &str, select_all: bool) -> Self {
        let buffer: Vec<char> = text.chars().collect();
        Self { id, cursor: buffer.len(), buffer, initial: text.to_string(), selected_all: select_all }
    }

    pub(crate) fn text(&self) -> String {
        self.buffer.iter().collect()
    }
}

/// Outcome of feeding one frame of input to a text field
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TextEvent {
    /// Not focused, or focused without changes
    Idle,
    /// Buffer changed
    Edited(String),
    /// Enter, Tab or a click elsewhere
    Committed(String),
    /// Escape; carries the text the field had when focused
    Cancelled(String),
}

#[derive(Debug, Clone)]
pub(crate) struct OpenPopup {
    pub(crate) id: WidgetId,
    pub(crate) anchor: Vec2,
    pub(crate) min_width: f32,
    pub(crate) window: Option<usize>,
    pub(crate) opened_frame: u64,
}

/// Last submitted item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastItem {
    /// Item id, if interactive
    pub id: Option<WidgetId>,
    /// Screen rectangle
    pub rect: Rect,
    /// Whether the mouse hovers it
    pub hovered: bool,
}

impl Default for LastItem {
    fn default() -> Self {
        Self { id: None, rect: Rect::new(Vec2::zeros(), Vec2::zeros()), hovered: false }
    }
}

/// Immediate-mode toolkit state for one display
pub struct Context {
    pub(crate) io: Io,
    pub(crate) style: Style,
    pub(crate) atlas: Arc<FontAtlas>,
    pub(crate) font: FontId,
    pub(crate) font_scale: f32,
    pub(crate) frame_count: u64,
    pub(crate) frame_active: bool,
    pub(crate) windows: Vec<Window>,
    pub(crate) window_order: Vec<usize>,
    pub(crate) window_stack: Vec<usize>,
    pub(crate) hovered_window: Option<usize>,
    pub(crate) hovered_id: Option<WidgetId>,
    pub(crate) active_id: Option<WidgetId>,
    pub(crate) active_id_alive: bool,
    pub(crate) active_drag_moved: bool,
    pub(crate) focus: Option<TextEdit>,
    pub(crate) focus_alive: bool,
    pub(crate) focus_request: Option<(WidgetId, String, bool)>,
    pub(crate) drag_remainder: f64,
    pub(crate) open_popups: Vec<OpenPopup>,
    pub(crate) popups_closed_by_click: Vec<WidgetId>,
    pub(crate) disabled_stack: Vec<bool>,
    pub(crate) bool_state: HashMap<WidgetId, bool>,
    pub(crate) settings: Settings,
    pub(crate) last_item: LastItem,
    draw_data: DrawData,
}

impl Context {
    /// Context drawing text with `atlas`; settings save at most every `save_interval` seconds
    pub fn new(atlas: Arc<FontAtlas>, save_interval: f32) -> Self {
        Self {
            io: Io::default(),
            style: Style::default(),
            atlas,
            font: FontId(0),
            font_scale: 1.0,
            frame_count: 0,
            frame_active: false,
            windows: Vec::new(),
            window_order: Vec::new(),
            window_stack: Vec::new(),
            hovered_window: None,
            hovered_id: None,
            active_id: None,
            active_id_alive: false,
            active_drag_moved: false,
            focus: None,
            focus_alive: false,
            focus_request: None,
            drag_remainder: 0.0,
            open_popups: Vec::new(),
            popups_closed_by_click: Vec::new(),
            disabled_stack: Vec::new(),
            bool_state: HashMap::new(),
            settings: Settings::new(save_interval),
            last_item: LastItem::default(),
            draw_data: DrawData::default(),
        }
    }

    // ----- frame lifecycle -------------------------------------------------

    /// Start a frame from an input snapshot
    ///
    /// # Panics
    /// If a frame is already active.
    pub fn new_frame(&mut self, snapshot: &InputSnapshot) {
        assert!(!self.frame_active, "new_frame called while a toolkit frame is already active");
        self.frame_active = true;
        self.frame_count += 1;
        self.io.update(snapshot);
        self.hovered_id = None;
        self.last_item = LastItem::default();

        if self.active_id.is_some() && !self.active_id_alive {
            self.active_id = None;
        }
        self.active_id_alive = false;

        if let Some((id, text, select_all)) = self.focus_request.take() {
            self.focus = Some(TextEdit::new(id, &text, select_all));
            self.focus_alive = true;
        }
        if !self.focus_alive {
            self.focus = None;
        }
        self.focus_alive = false;

        let display = self.io.display_size;
        let root = self.find_or_create_window(ROOT_WINDOW, WindowFlags::ROOT, Vec2::zeros(), display);
        self.windows[root].pos = Vec2::zeros();
        self.windows[root].size = display;
        self.begin_window_ex(ROOT_WINDOW, WindowFlags::ROOT, Vec2::zeros(), display);

        self.update_hovered_window();
        self.close_popups_on_click();
        self.raise_clicked_window();
        self.apply_wheel();
    }

    fn update_hovered_window(&mut self) {
        let frame = self.frame_count;
        self.hovered_window = self.io.mouse_pos.and_then(|mouse| {
            let popups = self.open_popups.iter().rev().filter_map(|p| p.window);
            let regular = self.window_order.iter().rev().copied();
            popups.chain(regular).find(|&w| {
                let window = &self.windows[w];
                window.active_since(frame) && window.rect().contains(mouse)
            })
        });
    }

    fn close_popups_on_click(&mut self) {
        self.popups_closed_by_click.clear();
        let clicked = self.io.mouse_clicked.iter().any(|c| *c);
        if clicked && !self.open_popups.is_empty() {
            let keep = self
                .open_popups
                .iter()
                .rposition(|p| p.window.is_some() && p.window == self.hovered_window)
                .map_or(0, |i| i + 1);
            for popup in self.open_popups.drain(keep..) {
                self.popups_closed_by_click.push(popup.id);
            }
        }
        if self.io.key_pressed(Key::Escape) && self.focus.is_none() {
            self.open_popups.pop();
        }
    }

    fn raise_clicked_window(&mut self) {
        if !self.io.is_clicked(MouseButton::Left) {
            return;
        }
        if let Some(w) = self.hovered_window {
            if self.windows[w].flags.intersects(WindowFlags::NO_BRING_TO_FRONT | WindowFlags::POPUP) {
                return;
            }
            if let Some(i) = self.window_order.iter().position(|&o| o == w) {
                self.window_order.remove(i);
                self.window_order.push(w);
            }
        }
    }

    fn apply_wheel(&mut self) {
        let wheel = self.io.mouse_wheel.y;
        if wheel == 0.0 {
            return;
        }
        let step = WHEEL_LINES * self.font_size();
        let padding = self.style.window_padding.y;
        if let Some(w) = self.hovered_window {
            let window = &mut self.windows[w];
            if !window.flags.contains(WindowFlags::NO_SCROLL) {
                let max = window.max_scroll(padding);
                window.scroll_y = (window.scroll_y - wheel * step).clamp(0.0, max);
            }
        }
    }

    /// Finish the frame and assemble its draw data
    ///
    /// # Panics
    /// If no frame is active, or a window, id scope, disabled scope or column
    /// set opened this frame is still open.
    pub fn end_frame(&mut self) -> &DrawData {
        assert!(self.frame_active, "end_frame called without an active toolkit frame");
        assert!(
            self.window_stack.len() == 1,
            "begin_window('{}') was never matched by end_window",
            self.window_stack.last().map_or("", |&w| self.windows[w].name.as_str())
        );
        assert!(self.disabled_stack.is_empty(), "begin_disabled was never matched by end_disabled");
        self.end_window();

        let frame = self.frame_count;
        let windows = &self.windows;
        self.open_popups
            .retain(|p| p.opened_frame == frame || p.window.is_some_and(|w| windows[w].last_frame_active == frame));

        self.settings.update(self.io.delta_time);

        let mut lists = Vec::new();
        let popup_windows: Vec<usize> = self.open_popups.iter().filter_map(|p| p.window).collect();
        for &w in self.window_order.iter().chain(popup_windows.iter()) {
            let window = &mut self.windows[w];
            if window.last_frame_active == frame {
                window.draw_list.finish();
                lists.push(std::mem::take(&mut window.draw_list));
            }
        }

        self.draw_data = DrawData {
            display_pos: Vec2::zeros(),
            display_size: self.io.display_size,
            framebuffer_scale: self.io.framebuffer_scale,
            draw_lists: lists,
        };
        self.frame_active = false;
        &self.draw_data
    }

    /// Draw data of the last completed frame
    pub fn draw_data(&self) -> &DrawData {
        &self.draw_data
    }

    /// Whether a frame is between `new_frame` and `end_frame`
    pub fn is_frame_active(&self) -> bool {
        self.frame_active
    }

    /// Frames started so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Input for the current frame
    pub fn io(&self) -> &Io {
        &self.io
    }

    /// Style in use
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Mutable style
    pub fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    // ----- fonts ------------------------------------------------------------

    /// Replace the font atlas
    pub fn set_font_atlas(&mut self, atlas: Arc<FontAtlas>) {
        self.atlas = atlas;
    }

    /// The font atlas in use
    pub fn font_atlas(&self) -> &Arc<FontAtlas> {
        &self.atlas
    }

    /// Select the font and scale for subsequent text
    pub fn set_font(&mut self, font: FontId, scale: f32) {
        self.font = font;
        self.font_scale = scale;
    }

    /// Current font and scale
    pub fn font(&self) -> (FontId, f32) {
        (self.font, self.font_scale)
    }

    /// Current baked font
    pub fn current_font(&self) -> &BakedFont {
        self.atlas.font(self.font)
    }

    /// Current line height in pixels
    pub fn font_size(&self) -> f32 {
        self.current_font().line_height() * self.font_scale
    }

    /// Height of framed widgets
    pub fn frame_height(&self) -> f32 {
        self.font_size() + self.style.frame_padding.y * 2.0
    }

    /// Size of the visible part of `text` in the current font
    pub fn calc_text_size(&self, text: &str) -> Vec2 {
        let visible = display_label(text);
        if visible.is_empty() {
            return Vec2::new(0.0, self.font_size());
        }
        self.current_font().text_size(visible) * self.font_scale
    }

    // ----- windows ----------------------------------------------------------

    /// Begin a movable window with a title bar
    ///
    /// `pos` and `size` apply only when the window is first created and has
    /// no saved placement.
    pub fn begin_window(&mut self, name: &str, pos: Vec2, size: Vec2) -> bool {
        self.begin_window_ex(name, WindowFlags::empty(), pos, size)
    }

    /// Begin a window with explicit flags
    pub fn begin_window_ex(&mut self, name: &str, flags: WindowFlags, pos: Vec2, size: Vec2) -> bool {
        assert!(self.frame_active, "begin_window('{}') called outside a frame", name);
        let index = self.find_or_create_window(name, flags, pos, size);
        assert!(
            !self.window_stack.contains(&index) && self.windows[index].last_frame_active != self.frame_count,
            "window '{}' was begun twice in one frame",
            name
        );
        self.window_stack.push(index);
        self.windows[index].last_frame_active = self.frame_count;

        let title_height = if flags.contains(WindowFlags::NO_TITLE_BAR) { 0.0 } else { self.frame_height() };
        self.handle_window_move(index, title_height);

        let white_uv = self.atlas.white_uv();
        let padding = self.style.window_padding;
        let border = self.style.window_border;
        let bg_role = if flags.contains(WindowFlags::POPUP) { ColorRole::PopupBg } else { ColorRole::WindowBg };
        let bg = self.style.color(bg_role);
        let title_bg = self.style.color(ColorRole::TitleBg);
        let border_col = self.style.color(ColorRole::Border);
        let text_col = self.style.color(ColorRole::Text);
        let display = Rect::from_pos_size(Vec2::zeros(), self.io.display_size);

        let window = &mut self.windows[index];
        window.flags = flags;
        window.title_bar_height = title_height;
        window.draw_list.clear(white_uv);
        window.columns.clear();
        window.item_widths.clear();
        window.next_item_width = None;
        window.background = None;

        if flags.contains(WindowFlags::AUTO_RESIZE) {
            window.size = window.content_size + padding * 2.0;
            window.size.x = window.size.x.max(window.min_width);
            window.pos.x = window.pos.x.min(display.max.x - window.size.x).max(0.0);
            window.pos.y = window.pos.y.min(display.max.y - window.size.y).max(0.0);
        }

        let rect = window.rect();
        if flags.contains(WindowFlags::POPUP) {
            window.background = Some(window.draw_list.reserve_rect());
        } else if !flags.contains(WindowFlags::NO_BACKGROUND) {
            window.draw_list.add_rect_filled(rect.min, rect.max, bg);
            if border > 0.0 {
                window.draw_list.add_rect(rect.min, rect.max, border_col, border);
            }
        }
        if title_height > 0.0 {
            let bar = window.title_bar_rect();
            window.draw_list.add_rect_filled(bar.min, bar.max, title_bg);
        }

        window.clip_rect = if flags.contains(WindowFlags::AUTO_RESIZE) {
            display
        } else {
            window.inner_rect().intersect(&display)
        };
        window.draw_list.push_clip_rect(window.clip_rect, false);

        let content_min = Vec2::new(rect.min.x + padding.x, rect.min.y + title_height + padding.y - window.scroll_y);
        window.dc = super::window::LayoutCursor {
            pos: content_min,
            base_x: content_min.x,
            indent: 0.0,
            work_max_x: if flags.contains(WindowFlags::AUTO_RESIZE) {
                content_min.x + (window.size.x - padding.x * 2.0).max(0.0)
            } else {
                rect.max.x - padding.x
            },
            prev_line_end: content_min,
            curr_line_height: 0.0,
            prev_line_height: 0.0,
            max: content_min,
            content_min,
        };

        if title_height > 0.0 {
            let title = display_label(name).to_string();
            let text_pos = Vec2::new(rect.min.x + padding.x, rect.min.y + self.style.frame_padding.y);
            let bar = self.windows[index].title_bar_rect();
            let font = self.atlas.font(self.font);
            let list = &mut self.windows[index].draw_list;
            list.push_clip_rect(bar, false);
            list.add_text(font, self.font_scale, text_pos, text_col, &title);
            list.pop_clip_rect();
        }
        true
    }

    pub(crate) fn find_or_create_window(&mut self, name: &str, flags: WindowFlags, pos: Vec2, size: Vec2) -> usize {
        if let Some(index) = self.windows.iter().position(|w| w.name == name) {
            return index;
        }
        let saved = if flags.contains(WindowFlags::NO_SAVED_SETTINGS) { None } else { self.settings.window(name) };
        let (pos, size) = saved.map_or((pos, size), |s| (s.pos, s.size));
        let size = if size.x <= 0.0 || size.y <= 0.0 { self.style.default_window_size } else { size };

        let index = self.windows.len();
        self.windows.push(Window::new(name, flags, pos, size));
        if !flags.contains(WindowFlags::POPUP) {
            self.window_order.push(index);
        }
        if !flags.contains(WindowFlags::NO_SAVED_SETTINGS) && saved.is_none() {
            self.settings.set_window(name, WindowSettings { pos, size });
        }
        log::debug!("Created window '{}'", name);
        index
    }

    fn handle_window_move(&mut self, index: usize, title_height: f32) {
        let window = &self.windows[index];
        if window.flags.contains(WindowFlags::NO_MOVE) || title_height <= 0.0 {
            return;
        }
        let move_id = window.id.child_str("#MOVE");
        let bar = Rect::from_pos_size(window.pos, Vec2::new(window.size.x, title_height));
        let hovered = self.hovered_window == Some(index)
            && self.io.mouse_in(&bar)
            && self.active_id.map_or(true, |a| a == move_id);

        if hovered && self.io.is_clicked(MouseButton::Left) {
            self.set_active(move_id);
        }
        if self.active_id == Some(move_id) {
            self.active_id_alive = true;
            if self.io.is_down(MouseButton::Left) {
                let delta = self.io.mouse_delta;
                if delta != Vec2::zeros() {
                    let window = &mut self.windows[index];
                    window.pos += delta;
                    let placement = WindowSettings { pos: window.pos, size: window.size };
                    let name = window.name.clone();
                    self.settings.set_window(&name, placement);
                }
            } else {
                self.clear_active();
            }
        }
    }

    /// End the innermost window
    ///
    /// # Panics
    /// If only the root window is open, or the window still has open id
    /// scopes, columns or item widths.
    pub fn end_window(&mut self) {
        let is_root_end = self.window_stack.len() == 1;
        let Some(&index) = self.window_stack.last() else {
            panic!("end_window called without begin_window");
        };
        if is_root_end {
            assert!(self.windows[index].name == ROOT_WINDOW, "end_window called without begin_window");
        }
        let popup_bg = self.style.color(ColorRole::PopupBg);
        let border_col = self.style.color(ColorRole::Border);
        let border = self.style.window_border;
        let window = &mut self.windows[index];
        assert!(window.columns.is_empty(), "columns in window '{}' were never ended", window.name);
        assert!(window.ids.depth() == 0, "push_id in window '{}' was never matched by pop_id", window.name);
        assert!(window.item_widths.is_empty(), "push_item_width in window '{}' was never popped", window.name);

        window.draw_list.pop_clip_rect();
        window.content_size = (window.dc.max - window.dc.content_min).map(|v| v.max(0.0));
        if window.flags.contains(WindowFlags::AUTO_RESIZE) {
            let padding = self.style.window_padding;
            window.size = window.content_size + padding * 2.0;
            window.size.x = window.size.x.max(window.min_width);
        }
        let max_scroll = window.max_scroll(self.style.window_padding.y);
        window.scroll_y = window.scroll_y.min(max_scroll);
        if let Some(slot) = window.background.take() {
            let rect = window.rect();
            window.draw_list.patch_rect(slot, rect.min, rect.max, popup_bg);
            if border > 0.0 {
                window.draw_list.add_rect(rect.min, rect.max, border_col, border);
            }
        }
        self.window_stack.pop();
    }

    pub(crate) fn current_window_index(&self) -> usize {
        match self.window_stack.last() {
            Some(&index) => index,
            None => panic!("no window is open; widgets must be submitted between new_frame and end_frame"),
        }
    }

    pub(crate) fn current_window(&self) -> &Window {
        &self.windows[self.current_window_index()]
    }

    pub(crate) fn current_window_mut(&mut self) -> &mut Window {
        let index = self.current_window_index();
        &mut self.windows[index]
    }

    /// Window by name, if it exists
    pub fn window(&self, name: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.name == name)
    }

    /// Name of the innermost open window
    pub fn current_window_name(&self) -> &str {
        &self.current_window().name
    }

    /// Whether the mouse is over the innermost open window
    pub fn is_window_hovered(&self) -> bool {
        self.hovered_window == Some(self.current_window_index())
    }

    // ----- ids --------------------------------------------------------------

    /// Push a string id scope
    pub fn push_id_str(&mut self, label: &str) {
        self.current_window_mut().ids.push_str(label);
    }

    /// Push an integer id scope
    pub fn push_id_int(&mut self, value: u64) {
        self.current_window_mut().ids.push_int(value);
    }

    /// Pop an id scope
    ///
    /// # Panics
    /// If the current window has no pushed scope.
    pub fn pop_id(&mut self) {
        let popped = self.current_window_mut().ids.pop();
        assert!(popped, "pop_id without push_id");
    }

    /// Id of `label` in the current scope
    pub fn get_id(&self, label: &str) -> WidgetId {
        self.current_window().ids.id(label)
    }

    /// Pushed id scopes in the current window
    pub fn id_depth(&self) -> usize {
        self.current_window().ids.depth()
    }

    // ----- interaction ------------------------------------------------------

    pub(crate) fn set_active(&mut self, id: WidgetId) {
        self.active_id = Some(id);
        self.active_id_alive = true;
        self.active_drag_moved = false;
        self.drag_remainder = 0.0;
    }

    pub(crate) fn clear_active(&mut self) {
        self.active_id = None;
        self.active_drag_moved = false;
    }

    /// Widget being interacted with
    pub fn active_id(&self) -> Option<WidgetId> {
        self.active_id
    }

    /// Widget under the mouse this frame
    pub fn hovered_id(&self) -> Option<WidgetId> {
        self.hovered_id
    }

    /// Whether widgets are currently disabled
    pub fn is_disabled(&self) -> bool {
        self.disabled_stack.iter().any(|d| *d)
    }

    /// Begin a scope whose widgets are dimmed and ignore input when `disabled`
    pub fn begin_disabled(&mut self, disabled: bool) {
        self.disabled_stack.push(disabled);
    }

    /// End a disabled scope
    ///
    /// # Panics
    /// Without a matching `begin_disabled`.
    pub fn end_disabled(&mut self) {
        assert!(self.disabled_stack.pop().is_some(), "end_disabled without begin_disabled");
    }

    /// Style color with disabled dimming applied
    pub fn color(&self, role: ColorRole) -> u32 {
        let color = self.style.color(role);
        if self.is_disabled() {
            scale_alpha(color, self.style.disabled_alpha)
        } else {
            color
        }
    }

    /// Whether `rect` can be hovered by widget `id` right now
    pub(crate) fn item_hoverable(&mut self, rect: &Rect, id: WidgetId) -> bool {
        if self.is_disabled() || !self.is_window_hovered() {
            return false;
        }
        let clip = self.current_window().clip_rect;
        if !self.io.mouse_in(&rect.intersect(&clip)) {
            return false;
        }
        if self.active_id.is_some_and(|active| active != id) {
            return false;
        }
        self.hovered_id = Some(id);
        true
    }

    /// Click behaviour shared by buttons: `(pressed, hovered, held)`
    ///
    /// Presses register on release over the item, or on the initial click
    /// when `press_on_click` is set.
    pub(crate) fn button_behavior(&mut self, rect: &Rect, id: WidgetId, press_on_click: bool) -> (bool, bool, bool) {
        let hovered = self.item_hoverable(rect, id);
        let mut pressed = false;
        let mut held = false;

        if hovered && self.io.is_clicked(MouseButton::Left) {
            if press_on_click {
                pressed = true;
            } else {
                self.set_active(id);
            }
        }
        if self.active_id == Some(id) {
            self.active_id_alive = true;
            if self.io.is_down(MouseButton::Left) {
                held = true;
            } else {
                pressed = hovered;
                self.clear_active();
            }
        }
        self.last_item.hovered = hovered;
        (pressed, hovered, held)
    }

    /// Request keyboard focus for field `id` starting from `text`, applied next frame
    pub(crate) fn request_focus(&mut self, id: WidgetId, text: &str, select_all: bool) {
        self.focus_request = Some((id, text.to_string(), select_all));
    }

    /// Feed keyboard input to the text field `id` occupying `rect`
    ///
    /// A click focuses the field from the next frame on.
    pub(crate) fn text_behavior(&mut self, rect: &Rect, id: WidgetId, current: &str, select_all: bool) -> TextEvent {
        let hovered = self.item_hoverable(rect, id);
        self.last_item.hovered = hovered;
        let focused = self.focus.as_ref().is_some_and(|f| f.id == id);

        if !focused {
            if hovered && self.io.is_clicked(MouseButton::Left) {
                self.request_focus(id, current, select_all);
            }
            return TextEvent::Idle;
        }

        self.focus_alive = true;
        let clicked_outside = self.io.mouse_clicked.iter().any(|c| *c) && !self.io.mouse_in(rect);
        let keys = self.io.keys_pressed.clone();
        let typed = self.io.text.clone();
        let Some(edit) = self.focus.as_mut() else {
            return TextEvent::Idle;
        };

        let mut changed = false;
        for key in keys {
            match key {
                Key::Escape => {
                    let initial = std::mem::take(&mut edit.initial);
                    self.focus = None;
                    return TextEvent::Cancelled(initial);
                }
                Key::Enter | Key::Tab => {
                    let text = edit.text();
                    self.focus = None;
                    return TextEvent::Committed(text);
                }
                Key::Backspace | Key::Delete if edit.selected_all => {
                    edit.buffer.clear();
                    edit.cursor = 0;
                    edit.selected_all = false;
                    changed = true;
                }
                Key::Left | Key::Right | Key::Home | Key::End => {
                    edit.selected_all = false;
                    edit.cursor = match key {
                        Key::Left => edit.cursor.saturating_sub(1),
                        Key::Right => (edit.cursor + 1).min(edit.buffer.len()),
                        Key::Home => 0,
                        _ => edit.buffer.len(),
                    };
                }
                Key::Backspace if edit.cursor > 0 => {
                    edit.cursor -= 1;
                    edit.buffer.remove(edit.cursor);
                    changed = true;
                }
                Key::Delete if edit.cursor < edit.buffer.len() => {
                    edit.buffer.remove(edit.cursor);
                    changed = true;
                }
                _ => {}
            }
        }
        for ch in typed {
            if edit.selected_all {
                edit.buffer.clear();
                edit.cursor = 0;
                edit.selected_all = false;
            }
            edit.buffer.insert(edit.cursor, ch);
            edit.cursor += 1;
            changed = true;
        }

        if clicked_outside {
            let text = edit.text();
            self.focus = None;
            return TextEvent::Committed(text);
        }
        if changed {
            TextEvent::Edited(edit.text())
        } else {
            TextEvent::Idle
        }
    }

    /// Field id with keyboard focus
    pub fn focused_id(&self) -> Option<WidgetId> {
        self.focus.as_ref().map(|f| f.id)
    }

    // ----- cursor flow ------------------------------------------------------

    /// Advance the cursor past an item of `size`
    pub fn item_size(&mut self, size: Vec2) {
        let spacing = self.style.item_spacing.y;
        let dc = &mut self.current_window_mut().dc;
        let line_height = dc.curr_line_height.max(size.y);
        dc.prev_line_end = Vec2::new(dc.pos.x + size.x, dc.pos.y);
        dc.max.x = dc.max.x.max(dc.pos.x + size.x);
        dc.max.y = dc.max.y.max(dc.pos.y + line_height);
        dc.pos.x = dc.line_start_x();
        dc.pos.y += line_height + spacing;
        dc.prev_line_height = line_height;
        dc.curr_line_height = 0.0;
    }

    /// Register an item; returns whether it is visible
    pub fn item_add(&mut self, rect: Rect, id: Option<WidgetId>) -> bool {
        self.last_item = LastItem { id, rect, hovered: false };
        let clip = self.current_window().clip_rect;
        rect.overlaps(&clip)
    }

    /// Continue on the line of the previous item
    pub fn same_line(&mut self, spacing: Option<f32>) {
        let spacing = spacing.unwrap_or(self.style.item_spacing.x);
        let dc = &mut self.current_window_mut().dc;
        dc.pos = Vec2::new(dc.prev_line_end.x + spacing, dc.prev_line_end.y);
        dc.curr_line_height = dc.prev_line_height;
    }

    /// Insert an empty line
    pub fn new_line(&mut self) {
        let height = self.font_size();
        self.item_size(Vec2::new(0.0, height));
    }

    /// Reserve blank space
    pub fn dummy(&mut self, size: Vec2) {
        let pos = self.cursor_screen_pos();
        self.item_add(Rect::from_pos_size(pos, size), None);
        self.item_size(size);
    }

    /// Move the cursor down without adding item spacing
    pub fn add_vertical_space(&mut self, height: f32) {
        let dc = &mut self.current_window_mut().dc;
        dc.pos.y += height;
        dc.max.y = dc.max.y.max(dc.pos.y);
    }

    /// Indent following lines
    pub fn indent(&mut self, width: f32) {
        let dc = &mut self.current_window_mut().dc;
        dc.indent += width;
        dc.pos.x = dc.line_start_x();
    }

    /// Undo an [`Self::indent`]
    pub fn unindent(&mut self, width: f32) {
        let dc = &mut self.current_window_mut().dc;
        dc.indent -= width;
        dc.pos.x = dc.line_start_x();
    }

    /// Cursor in screen space
    pub fn cursor_screen_pos(&self) -> Vec2 {
        self.current_window().dc.pos
    }

    /// Move the cursor in screen space
    pub fn set_cursor_screen_pos(&mut self, pos: Vec2) {
        let dc = &mut self.current_window_mut().dc;
        dc.pos = pos;
        dc.max.x = dc.max.x.max(pos.x);
        dc.max.y = dc.max.y.max(pos.y);
    }

    /// Cursor relative to the window's top-left corner
    pub fn cursor_pos(&self) -> Vec2 {
        let window = self.current_window();
        window.dc.pos - window.pos
    }

    /// Set the cursor x relative to the window's top-left corner
    pub fn set_cursor_x(&mut self, x: f32) {
        let window = self.current_window_mut();
        window.dc.pos.x = window.pos.x + x;
    }

    /// Space from the cursor to the right edge of the work area and the window bottom
    pub fn content_region_avail(&self) -> Vec2 {
        let window = self.current_window();
        let bottom = window.rect().max.y - self.style.window_padding.y;
        Vec2::new((window.dc.work_max_x - window.dc.pos.x).max(0.0), (bottom - window.dc.pos.y).max(0.0))
    }

    /// Item width for the next framed widget
    pub fn set_next_item_width(&mut self, width: f32) {
        self.current_window_mut().next_item_width = Some(width);
    }

    /// Push an item width; negative values leave that much room on the right
    pub fn push_item_width(&mut self, width: f32) {
        self.current_window_mut().item_widths.push(width);
    }

    /// Pop an item width
    ///
    /// # Panics
    /// Without a matching push.
    pub fn pop_item_width(&mut self) {
        assert!(self.current_window_mut().item_widths.pop().is_some(), "pop_item_width without push_item_width");
    }

    /// Width the next framed widget takes, consuming any next-item width
    pub fn calc_item_width(&mut self) -> f32 {
        let avail = self.content_region_avail().x;
        let window = self.current_window_mut();
        let requested = window.next_item_width.take().or_else(|| window.item_widths.last().copied());
        match requested {
            Some(w) if w > 0.0 => w,
            Some(w) => (avail + w).max(1.0),
            None => avail.max(1.0),
        }
    }

    /// Last submitted item
    pub fn last_item(&self) -> LastItem {
        self.last_item
    }

    /// Whether the mouse hovers the last item
    pub fn is_item_hovered(&self) -> bool {
        self.last_item.hovered
            || (!self.is_disabled() && self.is_window_hovered() && self.io.mouse_in(&self.last_item.rect))
    }

    /// Whether the last item is being held
    pub fn is_item_active(&self) -> bool {
        self.last_item.id.is_some() && self.last_item.id == self.active_id
    }

    // ----- drawing helpers ----------------------------------------------------

    pub(crate) fn draw_text(&mut self, pos: Vec2, col: u32, text: &str) {
        let index = self.current_window_index();
        let font = self.atlas.font(self.font);
        self.windows[index].draw_list.add_text(font, self.font_scale, pos, col, text);
    }

    /// Draw list of the innermost open window
    pub fn window_draw_list(&mut self) -> &mut super::draw::DrawList {
        &mut self.current_window_mut().draw_list
    }

    // ----- settings -----------------------------------------------------------

    /// Apply toolkit sections from settings text
    pub fn load_settings(&mut self, text: &str) -> usize {
        self.settings.load(text)
    }

    /// Toolkit sections as settings text
    pub fn settings_text(&self) -> String {
        self.settings.serialize()
    }

    /// Ask for a settings save at the end of this frame
    pub fn request_settings_save(&mut self) {
        self.settings.request_save();
    }

    /// Settings text to write, if a save is due
    pub fn take_settings_save(&mut self) -> Option<String> {
        self.settings.take_save_request().then(|| self.settings.serialize())
    }

    /// Whether settings have unsaved changes
    pub fn settings_dirty(&self) -> bool {
        self.settings.is_dirty()
    }
}
