//! # Persistent Storage
//!
//! Small typed key/value pairs that panels keep between sessions. They live
//! in the toolkit's settings file under a private `[EditorGui][Storage]`
//! section, one `key=t:value` line per entry where `t` is the type tag:
//!
//! ```text
//! [EditorGui][Storage]
//! browser.zoom=f:1.25
//! browser.columns=i:4
//! hierarchy.show_hidden=b:1
//! last_scene=s:levels/intro.scene
//! ```
//!
//! The toolkit only writes its own sections, so the storage section is
//! re-injected into every settings text it produces before the text is saved.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::toolkit::{parse_ini, write_ini, IniSection};

/// Section kind of the storage block
pub const STORAGE_KIND: &str = "EditorGui";
/// Section name of the storage block
pub const STORAGE_NAME: &str = "Storage";

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the settings file failed
    #[error("settings file {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A stored line has no valid type tag or value
    #[error("malformed storage value for '{key}': {value}")]
    Malformed {
        /// Entry key
        key: String,
        /// Raw text after `=`
        value: String,
    },
}

/// One stored value
#[derive(Debug, Clone, PartialEq)]
pub enum StorageValue {
    /// `f:` floating point
    Float(f64),
    /// `i:` signed integer
    Int(i64),
    /// `b:` boolean as `1` or `0`
    Bool(bool),
    /// `s:` string with `\\`, `\n` and `\r` escaped
    String(String),
}

impl StorageValue {
    /// Encoded form written after `=`
    pub fn encode(&self) -> String {
        match self {
            Self::Float(v) => format!("f:{}", v),
            Self::Int(v) => format!("i:{}", v),
            Self::Bool(v) => format!("b:{}", u8::from(*v)),
            Self::String(v) => format!("s:{}", escape(v)),
        }
    }

    /// Parse an encoded value; `key` is only used for the error
    pub fn decode(key: &str, raw: &str) -> StorageResult<Self> {
        let malformed = || StorageError::Malformed { key: key.to_string(), value: raw.to_string() };
        let (tag, body) = raw.split_once(':').ok_or_else(malformed)?;
        match tag {
            "f" => body.trim().parse().map(Self::Float).map_err(|_| malformed()),
            "i" => body.trim().parse().map(Self::Int).map_err(|_| malformed()),
            "b" => match body.trim() {
                "1" => Ok(Self::Bool(true)),
                "0" => Ok(Self::Bool(false)),
                _ => Err(malformed()),
            },
            "s" => unescape(body).map(Self::String).ok_or_else(malformed),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for StorageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            _ => return None,
        }
    }
    Some(out)
}

/// Types that can be stored
pub trait StorageType: Sized {
    /// Wrap in a [`StorageValue`]
    fn into_value(self) -> StorageValue;
    /// Extract from a [`StorageValue`] of the matching type
    fn from_value(value: &StorageValue) -> Option<Self>;
}

impl StorageType for f64 {
    fn into_value(self) -> StorageValue {
        StorageValue::Float(self)
    }

    fn from_value(value: &StorageValue) -> Option<Self> {
        match value {
            StorageValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl StorageType for f32 {
    fn into_value(self) -> StorageValue {
        StorageValue::Float(f64::from(self))
    }

    fn from_value(value: &StorageValue) -> Option<Self> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl StorageType for i64 {
    fn into_value(self) -> StorageValue {
        StorageValue::Int(self)
    }

    fn from_value(value: &StorageValue) -> Option<Self> {
        match value {
            StorageValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl StorageType for i32 {
    fn into_value(self) -> StorageValue {
        StorageValue::Int(i64::from(self))
    }

    fn from_value(value: &StorageValue) -> Option<Self> {
        i64::from_value(value).and_then(|v| i32::try_from(v).ok())
    }
}

impl StorageType for u32 {
    fn into_value(self) -> StorageValue {
        StorageValue::Int(i64::from(self))
    }

    fn from_value(value: &StorageValue) -> Option<Self> {
        i64::from_value(value).and_then(|v| u32::try_from(v).ok())
    }
}

impl StorageType for bool {
    fn into_value(self) -> StorageValue {
        StorageValue::Bool(self)
    }

    fn from_value(value: &StorageValue) -> Option<Self> {
        match value {
            StorageValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl StorageType for String {
    fn into_value(self) -> StorageValue {
        StorageValue::String(self)
    }

    fn from_value(value: &StorageValue) -> Option<Self> {
        match value {
            StorageValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Typed key/value store persisted inside the settings file
#[derive(Debug, Clone, Default)]
pub struct PersistentStorage {
    values: BTreeMap<String, StorageValue>,
    dirty: bool,
}

impl PersistentStorage {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`
    ///
    /// # Panics
    /// If `key` is empty or contains `=`, `[` at the start, or a line break,
    /// none of which survive the settings format.
    pub fn set<T: StorageType>(&mut self, key: &str, value: T) {
        assert!(is_valid_key(key), "invalid storage key '{}'", key.escape_debug());
        let value = value.into_value();
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_string(), value);
            self.dirty = true;
        }
    }

    /// Value under `key`, or `default` when missing or stored as another type
    pub fn get<T: StorageType>(&self, key: &str, default: T) -> T {
        match self.values.get(key) {
            Some(value) => T::from_value(value).unwrap_or_else(|| {
                log::debug!("Storage key '{}' holds {}, returning default", key, value);
                default
            }),
            None => default,
        }
    }

    /// Raw value under `key`
    pub fn value(&self, key: &str) -> Option<&StorageValue> {
        self.values.get(key)
    }

    /// Remove `key`; returns whether it existed
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.values.remove(key).is_some();
        self.dirty |= removed;
        removed
    }

    /// Whether `key` is stored
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether entries changed since the last [`Self::take_dirty`]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and clear the changed flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Load entries from the storage section of settings text
    ///
    /// Malformed lines are skipped with a warning. Returns how many entries loaded.
    pub fn load_from_settings(&mut self, text: &str) -> usize {
        let mut loaded = 0;
        for section in parse_ini(text).into_iter().filter(|s| s.is(STORAGE_KIND, STORAGE_NAME)) {
            for (key, raw) in section.entries {
                match StorageValue::decode(&key, &raw) {
                    Ok(value) => {
                        self.values.insert(key, value);
                        loaded += 1;
                    }
                    Err(err) => log::warn!("Skipping stored entry: {}", err),
                }
            }
        }
        log::debug!("Loaded {} storage entries", loaded);
        loaded
    }

    /// The storage section as settings text, empty when there is nothing stored
    pub fn section_text(&self) -> String {
        if self.values.is_empty() {
            return String::new();
        }
        let mut section = IniSection::new(STORAGE_KIND, STORAGE_NAME);
        section.entries = self.values.iter().map(|(k, v)| (k.clone(), v.encode())).collect();
        write_ini(&[section])
    }

    /// Settings text with any existing storage section replaced by the current one
    pub fn inject(&self, settings: &str) -> String {
        let mut out = strip_section(settings);
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(&self.section_text());
        out
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('[') && !key.contains(['=', '\n', '\r'])
}

/// Remove the storage section from settings text, keeping everything else verbatim
pub fn strip_section(settings: &str) -> String {
    let mut out = String::with_capacity(settings.len());
    let mut skipping = false;
    for line in settings.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            skipping = trimmed == format!("[{}][{}]", STORAGE_KIND, STORAGE_NAME);
        }
        if !skipping {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Read a settings file; a missing file reads as `None`
pub fn read_settings_file(path: impl AsRef<Path>) -> StorageResult<Option<String>> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StorageError::Io { path: path.to_path_buf(), source }),
    }
}

/// Write a settings file, creating parent directories as needed
pub fn write_settings_file(path: impl AsRef<Path>, text: &str) -> StorageResult<()> {
    let path = path.as_ref();
    let io_err = |source| StorageError::Io { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, text).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_typed_get_and_set() {
        let mut storage = PersistentStorage::new();
        storage.set("zoom", 1.25_f32);
        storage.set("columns", 4_i32);
        storage.set("hidden", true);
        storage.set("scene", String::from("intro"));

        assert_relative_eq!(storage.get("zoom", 1.0_f32), 1.25);
        assert_eq!(storage.get("columns", 0_i32), 4);
        assert!(storage.get("hidden", false));
        assert_eq!(storage.get("scene", String::new()), "intro");
    }

    #[test]
    fn test_missing_or_mismatched_returns_default() {
        let mut storage = PersistentStorage::new();
        storage.set("columns", 4_i64);

        assert_eq!(storage.get("absent", 7_i64), 7);
        assert!(storage.get("columns", true));
    }

    #[test]
    fn test_encoding_tags() {
        assert_eq!(StorageValue::Float(0.5).encode(), "f:0.5");
        assert_eq!(StorageValue::Int(-3).encode(), "i:-3");
        assert_eq!(StorageValue::Bool(false).encode(), "b:0");
        assert_eq!(StorageValue::String("a\\b\nc".into()).encode(), "s:a\\\\b\\nc");
    }

    #[test]
    fn test_string_with_separators_survives_settings_text() {
        let mut storage = PersistentStorage::new();
        storage.set("path", String::from("C:\\scenes\nx=y"));
        let text = storage.inject("");

        let mut reloaded = PersistentStorage::new();
        assert_eq!(reloaded.load_from_settings(&text), 1);
        assert_eq!(reloaded.get("path", String::new()), "C:\\scenes\nx=y");
    }

    #[test]
    fn test_inject_replaces_previous_section() {
        let mut storage = PersistentStorage::new();
        storage.set("zoom", 2.0_f64);
        let toolkit = "[Window][Inspector]\nPos=1,2\nSize=3,4\n\n[EditorGui][Storage]\nzoom=f:1\n\n";
        let text = storage.inject(toolkit);

        assert_eq!(text.matches("[EditorGui][Storage]").count(), 1);
        assert!(text.starts_with("[Window][Inspector]\nPos=1,2"));
        assert!(text.contains("zoom=f:2"));
        assert!(!text.contains("zoom=f:1\n"));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let text = "[EditorGui][Storage]\ngood=i:3\nbad=q:1\nworse=b:maybe\n";
        let mut storage = PersistentStorage::new();

        assert_eq!(storage.load_from_settings(text), 1);
        assert_eq!(storage.get("good", 0_i64), 3);
        assert!(!storage.contains("bad"));
    }

    #[test]
    fn test_dirty_only_on_change() {
        let mut storage = PersistentStorage::new();
        storage.set("a", 1_i64);
        assert!(storage.take_dirty());
        storage.set("a", 1_i64);
        assert!(!storage.is_dirty());
    }

    #[test]
    #[should_panic(expected = "invalid storage key")]
    fn test_key_with_equals_panics() {
        PersistentStorage::new().set("a=b", 1_i64);
    }

    #[test]
    fn test_settings_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("editor_gui_storage_{}", std::process::id()));
        let path = dir.join("nested").join("editor_gui.ini");
        assert!(read_settings_file(&path).unwrap().is_none());

        write_settings_file(&path, "[EditorGui][Storage]\nk=b:1\n").unwrap();
        let text = read_settings_file(&path).unwrap().unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(text.contains("k=b:1"));
    }
}
