//! Settings text
//!
//! Ini-style sections headed `[Kind][Name]` with `key=value` lines. The
//! toolkit owns the `Window` and `Header` kinds; any other section is left
//! out when it writes the file back.

use std::collections::BTreeMap;

use crate::foundation::math::Vec2;

use super::id::WidgetId;

/// One `[Kind][Name]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    /// Handler kind
    pub kind: String,
    /// Entry name within the kind
    pub name: String,
    /// `key=value` lines in file order
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    /// Empty section
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self { kind: kind.into(), name: name.into(), entries: Vec::new() }
    }

    /// Value of the first `key` line
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Whether this section has the given header
    pub fn is(&self, kind: &str, name: &str) -> bool {
        self.kind == kind && self.name == name
    }
}

/// Split settings text into sections
///
/// Lines before the first header, blank lines and `;` comments are ignored.
pub fn parse_ini(text: &str) -> Vec<IniSection> {
    let mut sections: Vec<IniSection> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let inner = &trimmed[1..trimmed.len() - 1];
            let (kind, name) = inner.split_once("][").unwrap_or((inner, ""));
            sections.push(IniSection::new(kind, name));
            continue;
        }
        if let (Some(section), Some((key, value))) = (sections.last_mut(), line.split_once('=')) {
            section.entries.push((key.trim().to_string(), value.to_string()));
        }
    }
    sections
}

/// Render sections back to text
pub fn write_ini(sections: &[IniSection]) -> String {
    let mut out = String::new();
    for section in sections {
        out.push('[');
        out.push_str(&section.kind);
        out.push_str("][");
        out.push_str(&section.name);
        out.push_str("]\n");
        for (key, value) in &section.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Saved placement of a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSettings {
    /// Top-left corner
    pub pos: Vec2,
    /// Outer size
    pub size: Vec2,
}

fn parse_pair(value: &str) -> Option<Vec2> {
    let (x, y) = value.split_once(',')?;
    Some(Vec2::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Toolkit-owned persistent state and its save schedule
#[derive(Debug, Clone)]
pub struct Settings {
    windows: BTreeMap<String, WindowSettings>,
    headers: BTreeMap<WidgetId, bool>,
    save_interval: f32,
    dirty_timer: Option<f32>,
    save_pending: bool,
}

impl Settings {
    /// Empty settings saving at most every `save_interval` seconds
    pub fn new(save_interval: f32) -> Self {
        Self {
            windows: BTreeMap::new(),
            headers: BTreeMap::new(),
            save_interval,
            dirty_timer: None,
            save_pending: false,
        }
    }

    /// Read the toolkit's sections from settings text; returns how many were applied
    pub fn load(&mut self, text: &str) -> usize {
        let mut applied = 0;
        for section in parse_ini(text) {
            match section.kind.as_str() {
                "Window" => {
                    let pos = section.get("Pos").and_then(parse_pair);
                    let size = section.get("Size").and_then(parse_pair);
                    if let (Some(pos), Some(size)) = (pos, size) {
                        self.windows.insert(section.name.clone(), WindowSettings { pos, size });
                        applied += 1;
                    }
                }
                "Header" => {
                    let id = u64::from_str_radix(&section.name, 16).ok();
                    let open = section.get("Open").map(|v| v.trim() == "1");
                    if let (Some(id), Some(open)) = (id, open) {
                        self.headers.insert(WidgetId(id), open);
                        applied += 1;
                    }
                }
                _ => {}
            }
        }
        log::debug!("Applied {} toolkit settings sections", applied);
        applied
    }

    /// Toolkit sections as settings text
    pub fn serialize(&self) -> String {
        let mut sections = Vec::with_capacity(self.windows.len() + self.headers.len());
        for (name, window) in &self.windows {
            let mut section = IniSection::new("Window", name.clone());
            section.entries.push(("Pos".into(), format!("{},{}", window.pos.x, window.pos.y)));
            section.entries.push(("Size".into(), format!("{},{}", window.size.x, window.size.y)));
            sections.push(section);
        }
        for (id, open) in &self.headers {
            let mut section = IniSection::new("Header", format!("{:016x}", id.0));
            section.entries.push(("Open".into(), if *open { "1" } else { "0" }.into()));
            sections.push(section);
        }
        write_ini(&sections)
    }

    /// Saved placement of a window
    pub fn window(&self, name: &str) -> Option<WindowSettings> {
        self.windows.get(name).copied()
    }

    /// Record a window placement; marks settings dirty when it changed
    pub fn set_window(&mut self, name: &str, settings: WindowSettings) {
        if self.windows.get(name) != Some(&settings) {
            self.windows.insert(name.to_string(), settings);
            self.mark_dirty();
        }
    }

    /// Saved open state of a header
    pub fn header(&self, id: WidgetId) -> Option<bool> {
        self.headers.get(&id).copied()
    }

    /// Record a header's open state; marks settings dirty when it changed
    pub fn set_header(&mut self, id: WidgetId, open: bool) {
        if self.headers.insert(id, open) != Some(open) {
            self.mark_dirty();
        }
    }

    /// Schedule a save after the save interval, unless one is already scheduled
    pub fn mark_dirty(&mut self) {
        if self.dirty_timer.is_none() {
            self.dirty_timer = Some(self.save_interval);
        }
    }

    /// Whether a save is scheduled or pending
    pub fn is_dirty(&self) -> bool {
        self.dirty_timer.is_some() || self.save_pending
    }

    /// Request a save at the end of the current frame
    pub fn request_save(&mut self) {
        self.dirty_timer = None;
        self.save_pending = true;
    }

    /// Count down the save timer
    pub fn update(&mut self, delta_time: f32) {
        if let Some(timer) = self.dirty_timer.as_mut() {
            *timer -= delta_time;
            if *timer <= 0.0 {
                self.dirty_timer = None;
                self.save_pending = true;
            }
        }
    }

    /// Take a pending save request
    pub fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[Window][Inspector]
Pos=40,60
Size=300,400

[Header][00000000000000ff]
Open=1

[EditorGui][Storage]
zoom=f:1.5
";

    #[test]
    fn test_parse_sections() {
        let sections = parse_ini(SAMPLE);

        assert_eq!(sections.len(), 3);
        assert!(sections[0].is("Window", "Inspector"));
        assert_eq!(sections[0].get("Size"), Some("300,400"));
        assert!(sections[2].is("EditorGui", "Storage"));
        assert_eq!(sections[2].get("zoom"), Some("f:1.5"));
    }

    #[test]
    fn test_value_keeps_everything_after_first_equals() {
        let sections = parse_ini("[A][B]\nkey=s:x=y\n");
        assert_eq!(sections[0].get("key"), Some("s:x=y"));
    }

    #[test]
    fn test_load_ignores_foreign_sections() {
        let mut settings = Settings::new(5.0);
        assert_eq!(settings.load(SAMPLE), 2);

        let window = settings.window("Inspector").unwrap();
        assert_eq!(window.pos, Vec2::new(40.0, 60.0));
        assert_eq!(settings.header(WidgetId(0xff)), Some(true));
        assert!(!settings.serialize().contains("EditorGui"));
    }

    #[test]
    fn test_serialize_round_trips() {
        let mut settings = Settings::new(5.0);
        settings.load(SAMPLE);
        let mut reloaded = Settings::new(5.0);
        reloaded.load(&settings.serialize());

        assert_eq!(reloaded.window("Inspector"), settings.window("Inspector"));
        assert_eq!(reloaded.header(WidgetId(0xff)), Some(true));
    }

    #[test]
    fn test_save_is_rate_limited() {
        let mut settings = Settings::new(1.0);
        settings.set_header(WidgetId(1), true);
        settings.update(0.5);
        assert!(!settings.take_save_request());

        settings.set_header(WidgetId(2), true);
        settings.update(0.6);
        assert!(settings.take_save_request());
        assert!(!settings.take_save_request());
        assert!(!settings.is_dirty());
    }

    #[test]
    fn test_unchanged_state_does_not_dirty() {
        let mut settings = Settings::new(1.0);
        settings.set_header(WidgetId(1), false);
        settings.update(2.0);
        settings.take_save_request();

        settings.set_header(WidgetId(1), false);
        assert!(!settings.is_dirty());
    }
}
