//! Per-frame input state derived from snapshots

use crate::foundation::math::Vec2;
use crate::foundation::time::clamp_delta;
use crate::input::{InputSnapshot, Key, Modifiers, MouseButton, MOUSE_BUTTON_COUNT};

/// Input as widgets see it during one frame
#[derive(Debug, Clone)]
pub struct Io {
    /// Clamped seconds since the previous frame
    pub delta_time: f32,
    /// Display size in logical pixels
    pub display_size: Vec2,
    /// Physical pixels per logical pixel
    pub framebuffer_scale: Vec2,
    /// Mouse position, `None` when outside the window
    pub mouse_pos: Option<Vec2>,
    /// Movement since the previous frame; zero when either position is unknown
    pub mouse_delta: Vec2,
    /// Wheel movement
    pub mouse_wheel: Vec2,
    /// Buttons held
    pub mouse_down: [bool; MOUSE_BUTTON_COUNT],
    /// Buttons that went down this frame
    pub mouse_clicked: [bool; MOUSE_BUTTON_COUNT],
    /// Buttons that went up this frame
    pub mouse_released: [bool; MOUSE_BUTTON_COUNT],
    /// Where each button last went down
    pub mouse_clicked_pos: [Vec2; MOUSE_BUTTON_COUNT],
    /// Modifiers held
    pub modifiers: Modifiers,
    /// Keys pressed this frame, in order
    pub keys_pressed: Vec<Key>,
    /// Characters typed this frame
    pub text: Vec<char>,
}

impl Default for Io {
    fn default() -> Self {
        Self {
            delta_time: 1.0 / 60.0,
            display_size: Vec2::new(1280.0, 720.0),
            framebuffer_scale: Vec2::new(1.0, 1.0),
            mouse_pos: None,
            mouse_delta: Vec2::zeros(),
            mouse_wheel: Vec2::zeros(),
            mouse_down: [false; MOUSE_BUTTON_COUNT],
            mouse_clicked: [false; MOUSE_BUTTON_COUNT],
            mouse_released: [false; MOUSE_BUTTON_COUNT],
            mouse_clicked_pos: [Vec2::zeros(); MOUSE_BUTTON_COUNT],
            modifiers: Modifiers::empty(),
            keys_pressed: Vec::new(),
            text: Vec::new(),
        }
    }
}

impl Io {
    /// Advance to the next frame's snapshot
    pub fn update(&mut self, snapshot: &InputSnapshot) {
        self.delta_time = clamp_delta(snapshot.delta_time);
        self.display_size = snapshot.display_size;
        self.framebuffer_scale = snapshot.framebuffer_scale;

        self.mouse_delta = match (self.mouse_pos, snapshot.mouse_pos) {
            (Some(previous), Some(current)) => current - previous,
            _ => Vec2::zeros(),
        };
        self.mouse_pos = snapshot.mouse_pos;
        self.mouse_wheel = snapshot.mouse_wheel;

        for i in 0..MOUSE_BUTTON_COUNT {
            let was_down = self.mouse_down[i];
            let down = snapshot.mouse_down[i];
            self.mouse_clicked[i] = down && !was_down;
            self.mouse_released[i] = !down && was_down;
            self.mouse_down[i] = down;
            if self.mouse_clicked[i] {
                self.mouse_clicked_pos[i] = self.mouse_pos.unwrap_or_else(Vec2::zeros);
            }
        }

        self.modifiers = snapshot.modifiers;
        self.keys_pressed.clear();
        self.keys_pressed.extend(snapshot.key_events.iter().filter(|e| e.pressed).map(|e| e.key));
        self.text.clear();
        self.text.extend(snapshot.text.iter().filter(|c| !c.is_control()));
    }

    /// Whether `button` is held
    pub fn is_down(&self, button: MouseButton) -> bool {
        self.mouse_down[button.index()]
    }

    /// Whether `button` went down this frame
    pub fn is_clicked(&self, button: MouseButton) -> bool {
        self.mouse_clicked[button.index()]
    }

    /// Whether `button` went up this frame
    pub fn is_released(&self, button: MouseButton) -> bool {
        self.mouse_released[button.index()]
    }

    /// Whether `key` was pressed this frame
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Whether the mouse lies inside `rect`
    pub fn mouse_in(&self, rect: &crate::foundation::math::Rect) -> bool {
        self.mouse_pos.is_some_and(|p| rect.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;

    #[test]
    fn test_click_and_release_edges() {
        let mut io = Io::default();
        let up = InputSnapshot::default().with_mouse(10.0, 10.0);
        let down = up.clone().with_button(MouseButton::Left, true);

        io.update(&up);
        io.update(&down);
        assert!(io.is_clicked(MouseButton::Left));
        assert_eq!(io.mouse_clicked_pos[0], Vec2::new(10.0, 10.0));

        io.update(&down);
        assert!(!io.is_clicked(MouseButton::Left));
        assert!(io.is_down(MouseButton::Left));

        io.update(&up);
        assert!(io.is_released(MouseButton::Left));
    }

    #[test]
    fn test_mouse_delta_needs_both_positions() {
        let mut io = Io::default();
        io.update(&InputSnapshot::default().with_mouse(5.0, 5.0));
        assert_eq!(io.mouse_delta, Vec2::zeros());

        io.update(&InputSnapshot::default().with_mouse(12.0, 3.0));
        assert_eq!(io.mouse_delta, Vec2::new(7.0, -2.0));

        io.update(&InputSnapshot::default());
        assert_eq!(io.mouse_delta, Vec2::zeros());
    }

    #[test]
    fn test_keys_and_text_reset_each_frame() {
        let mut io = Io::default();
        io.update(&InputSnapshot::default().with_key_press(Key::Enter).with_text("a\u{8}b"));
        assert!(io.key_pressed(Key::Enter));
        assert_eq!(io.text, vec!['a', 'b']);

        io.update(&InputSnapshot::default());
        assert!(!io.key_pressed(Key::Enter));
        assert!(io.text.is_empty());
    }
}
