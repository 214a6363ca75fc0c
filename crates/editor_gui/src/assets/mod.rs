//! Embedded resource loading
//!
//! Fonts and shaders are looked up by short name. A missing resource is an
//! error at load time; there is no runtime fallback for a font or shader.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Name of the built-in GUI vertex shader
pub const GUI_VERTEX_SHADER: &str = "gui-vertex";

/// Name of the built-in GUI fragment shader
pub const GUI_FRAGMENT_SHADER: &str = "gui-fragment";

const GUI_VERTEX_SOURCE: &[u8] = include_bytes!("../../shaders/gui.vert");
const GUI_FRAGMENT_SOURCE: &[u8] = include_bytes!("../../shaders/gui.frag");

/// Result type for resource lookups
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors raised while looking up resources
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// No resource registered under the name
    #[error("Embedded resource '{0}' not found")]
    NotFound(String),

    /// Reading the backing file failed
    #[error("Failed to read resource '{name}': {source}")]
    Io {
        /// Resource name
        name: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Byte-buffer lookup by short name
pub trait ResourceLoader {
    /// Fetch the bytes registered under `name`
    fn load(&self, name: &str) -> ResourceResult<Arc<[u8]>>;
}

/// In-memory resource table
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<String, Arc<[u8]>>,
}

impl EmbeddedResources {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding the built-in GUI shaders
    pub fn with_builtin_shaders() -> Self {
        let mut resources = Self::new();
        resources.insert(GUI_VERTEX_SHADER, GUI_VERTEX_SOURCE);
        resources.insert(GUI_FRAGMENT_SHADER, GUI_FRAGMENT_SOURCE);
        resources
    }

    /// Register (or replace) a resource
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let name = name.into();
        let bytes: Vec<u8> = bytes.into();
        log::debug!("Registered embedded resource '{}' ({} bytes)", name, bytes.len());
        self.entries.insert(name, Arc::from(bytes));
    }

    /// Whether a resource is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceLoader for EmbeddedResources {
    fn load(&self, name: &str) -> ResourceResult<Arc<[u8]>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(name.to_string()))
    }
}

/// Loads resources from files under a root directory
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    /// Create a loader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for DirectoryLoader {
    fn load(&self, name: &str) -> ResourceResult<Arc<[u8]>> {
        let path = self.root.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => {
                log::debug!("Loaded resource '{}' from {}", name, path.display());
                Ok(Arc::from(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ResourceError::NotFound(name.to_string())),
            Err(source) => Err(ResourceError::Io { name: name.to_string(), source }),
        }
    }
}

/// Tries each loader in turn and returns the first hit
pub struct ChainedLoader {
    loaders: Vec<Box<dyn ResourceLoader>>,
}

impl ChainedLoader {
    /// Create a chain from loaders in priority order
    pub fn new(loaders: Vec<Box<dyn ResourceLoader>>) -> Self {
        Self { loaders }
    }
}

impl ResourceLoader for ChainedLoader {
    fn load(&self, name: &str) -> ResourceResult<Arc<[u8]>> {
        for loader in &self.loaders {
            match loader.load(name) {
                Err(ResourceError::NotFound(_)) => continue,
                other => return other,
            }
        }
        Err(ResourceError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_shaders_present() {
        let resources = EmbeddedResources::with_builtin_shaders();
        let vertex = resources.load(GUI_VERTEX_SHADER).unwrap();
        let fragment = resources.load(GUI_FRAGMENT_SHADER).unwrap();

        assert!(std::str::from_utf8(&vertex).unwrap().contains("main"));
        assert!(!fragment.is_empty());
    }

    #[test]
    fn test_missing_resource_is_error() {
        let resources = EmbeddedResources::new();
        assert!(matches!(resources.load("nope.ttf"), Err(ResourceError::NotFound(name)) if name == "nope.ttf"));
    }

    #[test]
    fn test_directory_loader_missing_file() {
        let loader = DirectoryLoader::new("/definitely/not/a/real/dir");
        assert!(matches!(loader.load("font.ttf"), Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn test_chained_loader_falls_through() {
        let mut second = EmbeddedResources::new();
        second.insert("icons.ttf", vec![1u8, 2, 3]);
        let chain = ChainedLoader::new(vec![
            Box::new(EmbeddedResources::new()),
            Box::new(second),
        ]);

        assert_eq!(&*chain.load("icons.ttf").unwrap(), &[1u8, 2, 3]);
        assert!(chain.load("other").is_err());
    }
}
