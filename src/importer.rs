//! Shader file importer
//!
//! Turns a `.shader` file on disk into a runtime `Shader`: read,
//! preprocess (includes resolved against the defaults directory, then
//! the file's own directory), parse, then wire one variant compiler per
//! pass. Preprocess diagnostics are non-fatal; a parse failure aborts
//! the import with no partial shader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glint_compile::{CrossCompiler, DeviceCaps, PassVariantCompiler};
use glint_shader::diagnostics::Diagnostics;
use glint_shader::model::GraphicsBackend;
use glint_shader::parser::{ShaderParseError, parse_shader};
use glint_shader::preprocessor::Preprocessor;
use glint_shader::runtime::{PassDescription, Shader, ShaderPass};

use crate::config::ProjectConfig;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read shader file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse shader file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ShaderParseError,
    },

    #[error("no importer registered for {0:?}")]
    UnsupportedExtension(PathBuf),
}

/// Imports one asset kind, selected by file extension.
pub trait AssetImporter: Send + Sync {
    /// Extensions this importer claims, lowercase, without the dot.
    fn extensions(&self) -> &[&'static str];

    fn import(&self, path: &Path) -> Result<Shader, ImportError>;
}

/// Importer for `.shader` definition files.
pub struct ShaderImporter {
    defaults_dir: PathBuf,
    include_extension: String,
    backends: Vec<GraphicsBackend>,
    device: DeviceCaps,
    cross: Arc<dyn CrossCompiler>,
    sink: Arc<dyn Diagnostics>,
}

impl ShaderImporter {
    pub fn new(
        defaults_dir: impl Into<PathBuf>,
        include_extension: impl Into<String>,
        backends: Vec<GraphicsBackend>,
        device: DeviceCaps,
        cross: Arc<dyn CrossCompiler>,
        sink: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            defaults_dir: defaults_dir.into(),
            include_extension: include_extension.into(),
            backends,
            device,
            cross,
            sink,
        }
    }

    pub fn from_config(
        config: &ProjectConfig,
        cross: Arc<dyn CrossCompiler>,
        sink: Arc<dyn Diagnostics>,
    ) -> Self {
        Self::new(
            config.defaults_dir.clone(),
            config.include_extension.clone(),
            config.backends.clone(),
            config.device_caps(),
            cross,
            sink,
        )
    }
}

impl AssetImporter for ShaderImporter {
    fn extensions(&self) -> &[&'static str] {
        &["shader"]
    }

    fn import(&self, path: &Path) -> Result<Shader, ImportError> {
        let text = fs::read_to_string(path).map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let preprocessor = Preprocessor::new(&self.defaults_dir, &self.include_extension);
        let processed = preprocessor.preprocess(&text, file_dir, self.sink.as_ref());

        let parsed = parse_shader(&processed).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "Parsed shader \"{}\" with {} passes from {path:?}",
            parsed.name,
            parsed.passes.len()
        );

        let global_source = parsed.global.as_ref().and_then(|g| g.source.clone());

        let passes = parsed
            .passes
            .into_iter()
            .map(|pass| {
                let description = PassDescription {
                    tags: pass.tags,
                    blend: pass.blend,
                    cull: pass.cull,
                    depth: pass.depth,
                    keywords: pass.keywords,
                };
                let compiler = PassVariantCompiler::new(
                    pass.inputs,
                    pass.resources,
                    global_source.clone(),
                    self.device.clone(),
                    self.backends.clone(),
                    self.cross.clone(),
                    self.sink.clone(),
                );
                ShaderPass::new(pass.name, pass.sources, description, Box::new(compiler))
            })
            .collect();

        Ok(Shader::new(parsed.name, parsed.properties, passes))
    }
}
