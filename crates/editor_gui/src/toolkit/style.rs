//! Colors and metrics
//!
//! Colors are packed into a `u32` with red in the low byte, so a vertex
//! color reads `0xAABBGGRR` in hex.

use crate::foundation::math::Vec2;

/// Pack 8-bit channels
pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

/// Pack normalized channels, clamping each to `[0, 1]`
pub fn pack_color(color: [f32; 4]) -> u32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    rgba(channel(color[0]), channel(color[1]), channel(color[2]), channel(color[3]))
}

/// Unpack into normalized channels
pub fn unpack_color(packed: u32) -> [f32; 4] {
    let channel = |shift: u32| ((packed >> shift) & 0xff) as f32 / 255.0;
    [channel(0), channel(8), channel(16), channel(24)]
}

/// Multiply the alpha channel
pub fn scale_alpha(packed: u32, factor: f32) -> u32 {
    let alpha = ((packed >> 24) as f32 * factor.clamp(0.0, 1.0)).round() as u32;
    (packed & 0x00ff_ffff) | (alpha << 24)
}

/// Named colors used by the widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    /// Regular text
    Text,
    /// Disabled text before alpha dimming
    TextDisabled,
    /// Window background
    WindowBg,
    /// Popup background
    PopupBg,
    /// Window and popup borders
    Border,
    /// Widget frame background
    FrameBg,
    /// Frame under the mouse
    FrameBgHovered,
    /// Frame being interacted with
    FrameBgActive,
    /// Title bar
    TitleBg,
    /// Button
    Button,
    /// Button under the mouse
    ButtonHovered,
    /// Button held
    ButtonActive,
    /// Collapsing header
    Header,
    /// Header or selectable under the mouse
    HeaderHovered,
    /// Checkbox mark and text cursor
    CheckMark,
    /// Column borders and separators
    Separator,
    /// Text selection and input focus outline
    Focus,
}

const COLOR_ROLES: usize = 17;

/// Widget colors and spacing
#[derive(Debug, Clone)]
pub struct Style {
    colors: [u32; COLOR_ROLES],
    /// Padding between a window edge and its contents
    pub window_padding: Vec2,
    /// Padding inside framed widgets
    pub frame_padding: Vec2,
    /// Gap between consecutive items
    pub item_spacing: Vec2,
    /// Gap between a widget and its inline label
    pub item_inner_spacing: Vec2,
    /// Default indentation step
    pub indent_spacing: f32,
    /// Window border width; 0 disables borders
    pub window_border: f32,
    /// Alpha multiplier inside disabled scopes
    pub disabled_alpha: f32,
    /// Default size of new windows
    pub default_window_size: Vec2,
}

impl Default for Style {
    fn default() -> Self {
        let mut colors = [0; COLOR_ROLES];
        let mut set = |role: ColorRole, color: u32| colors[role as usize] = color;
        set(ColorRole::Text, rgba(230, 230, 230, 255));
        set(ColorRole::TextDisabled, rgba(128, 128, 128, 255));
        set(ColorRole::WindowBg, rgba(36, 36, 38, 240));
        set(ColorRole::PopupBg, rgba(28, 28, 30, 250));
        set(ColorRole::Border, rgba(80, 80, 88, 160));
        set(ColorRole::FrameBg, rgba(55, 55, 60, 255));
        set(ColorRole::FrameBgHovered, rgba(70, 70, 78, 255));
        set(ColorRole::FrameBgActive, rgba(85, 85, 95, 255));
        set(ColorRole::TitleBg, rgba(24, 24, 26, 255));
        set(ColorRole::Button, rgba(62, 62, 70, 255));
        set(ColorRole::ButtonHovered, rgba(80, 80, 92, 255));
        set(ColorRole::ButtonActive, rgba(96, 96, 110, 255));
        set(ColorRole::Header, rgba(48, 48, 54, 255));
        set(ColorRole::HeaderHovered, rgba(66, 66, 76, 255));
        set(ColorRole::CheckMark, rgba(110, 170, 255, 255));
        set(ColorRole::Separator, rgba(90, 90, 98, 200));
        set(ColorRole::Focus, rgba(66, 130, 230, 200));
        Self {
            colors,
            window_padding: Vec2::new(8.0, 8.0),
            frame_padding: Vec2::new(4.0, 3.0),
            item_spacing: Vec2::new(8.0, 4.0),
            item_inner_spacing: Vec2::new(4.0, 4.0),
            indent_spacing: 21.0,
            window_border: 1.0,
            disabled_alpha: 0.5,
            default_window_size: Vec2::new(360.0, 420.0),
        }
    }
}

impl Style {
    /// Color for a role
    pub fn color(&self, role: ColorRole) -> u32 {
        self.colors[role as usize]
    }

    /// Override the color for a role
    pub fn set_color(&mut self, role: ColorRole, color: u32) {
        self.colors[role as usize] = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_red_is_low_byte() {
        assert_eq!(rgba(0xff, 0, 0, 0), 0x0000_00ff);
        assert_eq!(rgba(0, 0, 0, 0xff), 0xff00_0000);
    }

    #[test]
    fn test_unpack_normalizes() {
        let [r, g, b, a] = unpack_color(rgba(255, 0, 51, 255));
        assert_relative_eq!(r, 1.0);
        assert_relative_eq!(g, 0.0);
        assert_relative_eq!(b, 0.2);
        assert_relative_eq!(a, 1.0);
    }

    #[test]
    fn test_pack_clamps_out_of_range() {
        assert_eq!(pack_color([2.0, -1.0, 0.5, 1.0]), rgba(255, 0, 128, 255));
    }

    #[test]
    fn test_scale_alpha_keeps_rgb() {
        let dimmed = scale_alpha(rgba(10, 20, 30, 200), 0.5);
        assert_eq!(dimmed, rgba(10, 20, 30, 100));
    }
}
