//! Importer registry
//!
//! Explicit, constructed-once mapping from file extension to importer.
//! Duplicate registration is non-fatal: it logs a warning and the last
//! registration wins.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glint_shader::runtime::Shader;

use crate::importer::{AssetImporter, ImportError};

#[derive(Default)]
pub struct ImporterRegistry {
    importers: HashMap<String, Arc<dyn AssetImporter>>,
}

impl ImporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an importer for every extension it claims. An already
    /// claimed extension is overwritten with a warning.
    pub fn register(&mut self, importer: Arc<dyn AssetImporter>) {
        for extension in importer.extensions() {
            let key = extension.to_ascii_lowercase();
            if self.importers.contains_key(&key) {
                log::warn!("importer for .{key} already registered, replacing it");
            }
            self.importers.insert(key, importer.clone());
        }
    }

    /// Drop every registration and register the given importers in
    /// order.
    pub fn rebuild(&mut self, importers: impl IntoIterator<Item = Arc<dyn AssetImporter>>) {
        self.importers.clear();
        for importer in importers {
            self.register(importer);
        }
    }

    pub fn importer_for(&self, path: &Path) -> Option<&Arc<dyn AssetImporter>> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        self.importers.get(&extension)
    }

    /// Dispatch on the file extension.
    pub fn import(&self, path: &Path) -> Result<Shader, ImportError> {
        match self.importer_for(path) {
            Some(importer) => importer.import(path),
            None => Err(ImportError::UnsupportedExtension(path.to_path_buf())),
        }
    }

    pub fn len(&self) -> usize {
        self.importers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.importers.is_empty()
    }
}
