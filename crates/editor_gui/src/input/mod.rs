//! Per-frame input snapshot
//!
//! The windowing backend fills an [`InputSnapshot`] once per frame; the
//! toolkit never talks to the window directly.

use bitflags::bitflags;

use crate::foundation::math::Vec2;

bitflags! {
    /// Keyboard modifier state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Shift; the "precise" drag modifier
        const SHIFT = 1 << 0;
        /// Control; the "fast" drag modifier
        const CTRL = 1 << 1;
        /// Alt
        const ALT = 1 << 2;
        /// Super / command
        const SUPER = 1 << 3;
    }
}

/// Mouse button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

impl MouseButton {
    /// Index into per-button arrays
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Middle => 2,
        }
    }
}

/// Number of tracked mouse buttons
pub const MOUSE_BUTTON_COUNT: usize = 3;

/// Keys the toolkit reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Tab
    Tab,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Home
    Home,
    /// End
    End,
    /// Delete
    Delete,
    /// Backspace
    Backspace,
    /// Enter / return
    Enter,
    /// Escape
    Escape,
}

/// Key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key
    pub key: Key,
    /// Pressed (true) or released (false)
    pub pressed: bool,
    /// Modifiers held when the event fired
    pub modifiers: Modifiers,
}

/// Everything the toolkit needs from the window for one frame
#[derive(Debug, Clone)]
pub struct InputSnapshot {
    /// Seconds since the previous frame
    pub delta_time: f32,
    /// Window size in logical pixels
    pub display_size: Vec2,
    /// Physical pixels per logical pixel (HiDPI)
    pub framebuffer_scale: Vec2,
    /// Mouse position in logical pixels, `None` when outside the window
    pub mouse_pos: Option<Vec2>,
    /// Mouse buttons currently held, indexed by [`MouseButton::index`]
    pub mouse_down: [bool; MOUSE_BUTTON_COUNT],
    /// Wheel movement this frame (x horizontal, y vertical)
    pub mouse_wheel: Vec2,
    /// Modifiers currently held
    pub modifiers: Modifiers,
    /// Key events since the previous frame
    pub key_events: Vec<KeyEvent>,
    /// Text characters typed since the previous frame
    pub text: Vec<char>,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            delta_time: 1.0 / 60.0,
            display_size: Vec2::new(1280.0, 720.0),
            framebuffer_scale: Vec2::new(1.0, 1.0),
            mouse_pos: None,
            mouse_down: [false; MOUSE_BUTTON_COUNT],
            mouse_wheel: Vec2::zeros(),
            modifiers: Modifiers::empty(),
            key_events: Vec::new(),
            text: Vec::new(),
        }
    }
}

impl InputSnapshot {
    /// Snapshot for a window of the given logical size
    pub fn new(display_size: Vec2) -> Self {
        Self { display_size, ..Self::default() }
    }

    /// Set the mouse position
    pub fn with_mouse(mut self, x: f32, y: f32) -> Self {
        self.mouse_pos = Some(Vec2::new(x, y));
        self
    }

    /// Set a mouse button state
    pub fn with_button(mut self, button: MouseButton, down: bool) -> Self {
        self.mouse_down[button.index()] = down;
        self
    }

    /// Set held modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Record a key press
    pub fn with_key_press(mut self, key: Key) -> Self {
        self.key_events.push(KeyEvent { key, pressed: true, modifiers: self.modifiers });
        self
    }

    /// Record typed text
    pub fn with_text(mut self, text: &str) -> Self {
        self.text.extend(text.chars());
        self
    }

    /// Set the framebuffer scale
    pub fn with_framebuffer_scale(mut self, scale: Vec2) -> Self {
        self.framebuffer_scale = scale;
        self
    }

    /// Framebuffer size in physical pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        (
            (self.display_size.x * self.framebuffer_scale.x).round().max(0.0) as u32,
            (self.display_size.y * self.framebuffer_scale.y).round().max(0.0) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framebuffer_size_applies_scale() {
        let snapshot = InputSnapshot::new(Vec2::new(800.0, 600.0))
            .with_framebuffer_scale(Vec2::new(2.0, 2.0));
        assert_eq!(snapshot.framebuffer_size(), (1600, 1200));
    }

    #[test]
    fn test_key_press_captures_modifiers() {
        let snapshot = InputSnapshot::default()
            .with_modifiers(Modifiers::CTRL)
            .with_key_press(Key::Enter);

        assert_eq!(snapshot.key_events.len(), 1);
        assert!(snapshot.key_events[0].modifiers.contains(Modifiers::CTRL));
    }
}
