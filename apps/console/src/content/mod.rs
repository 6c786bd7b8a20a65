//! Module content stored as `<module_id>.json` files in one directory.

use drill_core::{default_drill, parse_module, ContentError, ModuleContent};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Finds and loads drill modules from a content directory.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    dir: PathBuf,
}

impl ContentLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ids of the modules found in the directory, sorted. An unreadable
    /// directory lists nothing.
    pub fn available_modules(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot list content directory {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            })
            .collect();
        ids.sort();
        ids
    }

    pub fn load(&self, module_id: &str) -> Result<ModuleContent, ContentError> {
        if module_id.is_empty() || module_id.contains(['/', '\\']) || module_id.starts_with('.') {
            return Err(ContentError::Unavailable {
                module_id: module_id.to_string(),
                reason: "not a valid module id".to_string(),
            });
        }

        let path = self.dir.join(format!("{}.json", module_id));
        let json = fs::read_to_string(&path).map_err(|e| ContentError::Unavailable {
            module_id: module_id.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        let content = parse_module(module_id, &json)?;
        debug!("loaded module {} with {} items", module_id, content.len());
        Ok(content)
    }

    /// Load a module, substituting the built-in drill when it cannot be used.
    /// The substitute keeps its own module id, so nothing is recorded against
    /// `module_id`.
    pub fn load_or_default(&self, module_id: &str) -> ModuleContent {
        match self.load(module_id) {
            Ok(content) => content,
            Err(e) => {
                warn!("{}; using the default drill instead", e);
                default_drill()
            }
        }
    }
}
