//! Popups: auto-sized windows drawn above everything else
//!
//! Popups form a stack. Opening a popup from inside another keeps the outer
//! one open; opening one from a regular window replaces the whole stack. A
//! click outside the topmost popup closes it (and everything above the popup
//! that was hit), as does Escape.

use crate::foundation::math::Vec2;
use crate::input::MouseButton;

use super::context::{Context, OpenPopup};
use super::id::WidgetId;
use super::window::WindowFlags;

impl Context {
    /// Open the popup `str_id` at the mouse position
    pub fn open_popup(&mut self, str_id: &str) {
        let id = self.get_id(str_id);
        let anchor = self.io.mouse_pos.unwrap_or_else(|| self.last_item.rect.min);
        self.open_popup_ex(id, anchor, 0.0);
    }

    /// Open popup `id` with its top-left corner at `anchor`
    pub(crate) fn open_popup_ex(&mut self, id: WidgetId, anchor: Vec2, min_width: f32) {
        let depth = self.current_popup_depth();
        if self.open_popups.get(depth).is_some_and(|p| p.id == id) {
            return;
        }
        self.open_popups.truncate(depth);
        self.open_popups.push(OpenPopup { id, anchor, min_width, window: None, opened_frame: self.frame_count });
        log::trace!("Opened popup {:?} at depth {}", id, depth);
    }

    /// Open `str_id` when the last item is released with `button`
    pub fn open_popup_on_item_click(&mut self, str_id: &str, button: MouseButton) -> bool {
        if self.io.is_released(button) && self.is_item_hovered() {
            self.open_popup(str_id);
            return true;
        }
        false
    }

    /// Context menu for the last item: opens on right click, then begins the popup
    pub fn begin_popup_context_item(&mut self, str_id: &str) -> bool {
        self.open_popup_on_item_click(str_id, MouseButton::Right);
        self.begin_popup(str_id)
    }

    /// Begin popup `str_id` if it is open; call [`Self::end_popup`] only when this returns true
    pub fn begin_popup(&mut self, str_id: &str) -> bool {
        let id = self.get_id(str_id);
        self.begin_popup_ex(id)
    }

    pub(crate) fn begin_popup_ex(&mut self, id: WidgetId) -> bool {
        let Some(slot) = self.open_popups.iter().position(|p| p.id == id) else {
            return false;
        };
        let name = format!("##Popup_{:016x}", id.0);
        let (anchor, min_width) = (self.open_popups[slot].anchor, self.open_popups[slot].min_width);
        self.begin_popup_window(&name, anchor, min_width);
        let index = self.current_window_index();
        self.open_popups[slot].window = Some(index);
        true
    }

    fn begin_popup_window(&mut self, name: &str, anchor: Vec2, min_width: f32) {
        let index = self.find_or_create_window(name, WindowFlags::POPUP_WINDOW, anchor, Vec2::zeros());
        self.windows[index].pos = anchor;
        self.windows[index].min_width = min_width;
        self.begin_window_ex(name, WindowFlags::POPUP_WINDOW, anchor, Vec2::zeros());
    }

    /// End a popup begun with [`Self::begin_popup`]
    ///
    /// # Panics
    /// If the innermost window is not a popup.
    pub fn end_popup(&mut self) {
        assert!(self.current_window().flags.contains(WindowFlags::POPUP), "end_popup without begin_popup");
        self.end_window();
    }

    /// Close the innermost popup being built and every popup above it
    pub fn close_current_popup(&mut self) {
        let index = self.current_window_index();
        if let Some(slot) = self.open_popups.iter().position(|p| p.window == Some(index)) {
            self.open_popups.truncate(slot);
        }
    }

    /// Whether popup `str_id` is open
    pub fn is_popup_open(&self, str_id: &str) -> bool {
        let id = self.get_id(str_id);
        self.open_popups.iter().any(|p| p.id == id)
    }

    pub(crate) fn is_popup_id_open(&self, id: WidgetId) -> bool {
        self.open_popups.iter().any(|p| p.id == id)
    }

    /// Open popups
    pub fn open_popup_count(&self) -> usize {
        self.open_popups.len()
    }

    /// Popups enclosing the window being built
    fn current_popup_depth(&self) -> usize {
        let index = self.current_window_index();
        self.open_popups.iter().position(|p| p.window == Some(index)).map_or(0, |slot| slot + 1)
    }
}
