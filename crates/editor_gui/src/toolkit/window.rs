//! Windows and the layout cursor

use bitflags::bitflags;

use crate::foundation::math::{Rect, Vec2};

use super::columns::ColumnsState;
use super::draw::{DrawList, RectSlot};
use super::id::{IdStack, WidgetId};

bitflags! {
    /// Window behaviour
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u16 {
        /// No title bar
        const NO_TITLE_BAR = 1 << 0;
        /// No background fill or border
        const NO_BACKGROUND = 1 << 1;
        /// Cannot be dragged
        const NO_MOVE = 1 << 2;
        /// Position and size are not persisted
        const NO_SAVED_SETTINGS = 1 << 3;
        /// Clicking does not raise the window
        const NO_BRING_TO_FRONT = 1 << 4;
        /// Size follows the contents
        const AUTO_RESIZE = 1 << 5;
        /// Drawn above all regular windows
        const POPUP = 1 << 6;
        /// Ignores the mouse wheel
        const NO_SCROLL = 1 << 7;
    }
}

impl WindowFlags {
    /// The full-display window every frame starts in
    pub const ROOT: Self = Self::NO_TITLE_BAR
        .union(Self::NO_BACKGROUND)
        .union(Self::NO_MOVE)
        .union(Self::NO_SAVED_SETTINGS)
        .union(Self::NO_BRING_TO_FRONT);

    /// Flags of popup windows
    pub const POPUP_WINDOW: Self = Self::POPUP
        .union(Self::NO_TITLE_BAR)
        .union(Self::NO_MOVE)
        .union(Self::NO_SAVED_SETTINGS)
        .union(Self::AUTO_RESIZE)
        .union(Self::NO_SCROLL);
}

/// Where the next item goes
#[derive(Debug, Clone, Default)]
pub struct LayoutCursor {
    /// Top-left of the next item, screen space
    pub pos: Vec2,
    /// Left edge lines return to before indentation
    pub base_x: f32,
    /// Indentation added to `base_x`
    pub indent: f32,
    /// Right edge of the work area
    pub work_max_x: f32,
    /// End of the previous item, for `same_line`
    pub prev_line_end: Vec2,
    /// Height of the line being filled
    pub curr_line_height: f32,
    /// Height of the previous line
    pub prev_line_height: f32,
    /// Bottom-right extent of everything placed
    pub max: Vec2,
    /// First cursor position of the frame
    pub content_min: Vec2,
}

impl LayoutCursor {
    /// X coordinate new lines start at
    pub fn line_start_x(&self) -> f32 {
        self.base_x + self.indent
    }
}

/// Per-window state, kept across frames
#[derive(Debug)]
pub struct Window {
    pub(crate) name: String,
    pub(crate) id: WidgetId,
    pub(crate) flags: WindowFlags,
    pub(crate) pos: Vec2,
    pub(crate) size: Vec2,
    pub(crate) content_size: Vec2,
    pub(crate) scroll_y: f32,
    pub(crate) min_width: f32,
    pub(crate) draw_list: DrawList,
    pub(crate) ids: IdStack,
    pub(crate) dc: LayoutCursor,
    pub(crate) columns: Vec<ColumnsState>,
    pub(crate) item_widths: Vec<f32>,
    pub(crate) next_item_width: Option<f32>,
    pub(crate) last_frame_active: u64,
    pub(crate) background: Option<RectSlot>,
    pub(crate) clip_rect: Rect,
    pub(crate) title_bar_height: f32,
}

impl Window {
    pub(crate) fn new(name: &str, flags: WindowFlags, pos: Vec2, size: Vec2) -> Self {
        let id = WidgetId::ROOT.child_str(name);
        Self {
            name: name.to_string(),
            id,
            flags,
            pos,
            size,
            content_size: Vec2::zeros(),
            scroll_y: 0.0,
            min_width: 0.0,
            draw_list: DrawList::default(),
            ids: IdStack::new(id),
            dc: LayoutCursor::default(),
            columns: Vec::new(),
            item_widths: Vec::new(),
            next_item_width: None,
            last_frame_active: 0,
            background: None,
            clip_rect: Rect::unbounded(),
            title_bar_height: 0.0,
        }
    }

    /// Window name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-left corner
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    /// Outer size
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Outer rectangle
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Title bar rectangle (empty without a title bar)
    pub fn title_bar_rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, Vec2::new(self.size.x, self.title_bar_height))
    }

    /// Area below the title bar
    pub fn inner_rect(&self) -> Rect {
        Rect::new(Vec2::new(self.pos.x, self.pos.y + self.title_bar_height), self.pos + self.size)
    }

    /// Contents measured during the last completed frame
    pub fn content_size(&self) -> Vec2 {
        self.content_size
    }

    /// Vertical scroll offset
    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Whether the window was submitted during `frame`, or the frame before
    pub(crate) fn active_since(&self, frame: u64) -> bool {
        self.last_frame_active + 1 >= frame
    }

    pub(crate) fn max_scroll(&self, padding_y: f32) -> f32 {
        let visible = self.inner_rect().height() - padding_y * 2.0;
        (self.content_size.y - visible).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_rect_excludes_title_bar() {
        let mut window = Window::new("Inspector", WindowFlags::empty(), Vec2::new(10.0, 20.0), Vec2::new(200.0, 300.0));
        window.title_bar_height = 22.0;

        assert_eq!(window.inner_rect().min, Vec2::new(10.0, 42.0));
        assert_eq!(window.inner_rect().max, Vec2::new(210.0, 320.0));
        assert_eq!(window.title_bar_rect().height(), 22.0);
    }

    #[test]
    fn test_max_scroll_is_never_negative() {
        let mut window = Window::new("w", WindowFlags::empty(), Vec2::zeros(), Vec2::new(100.0, 100.0));
        window.content_size = Vec2::new(50.0, 40.0);
        assert_eq!(window.max_scroll(8.0), 0.0);

        window.content_size = Vec2::new(50.0, 184.0);
        assert_eq!(window.max_scroll(8.0), 100.0);
    }

    #[test]
    fn test_root_flags() {
        assert!(WindowFlags::ROOT.contains(WindowFlags::NO_MOVE | WindowFlags::NO_BACKGROUND));
        assert!(!WindowFlags::ROOT.contains(WindowFlags::POPUP));
        assert!(WindowFlags::POPUP_WINDOW.contains(WindowFlags::AUTO_RESIZE));
    }
}
