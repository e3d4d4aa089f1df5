//! Project configuration for shader imports
//!
//! Loaded from a `glint.toml` at the project root. Every field has a
//! default so a missing or partial file still yields a working setup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use glint_compile::DeviceCaps;
use glint_shader::GraphicsBackend;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "glint.toml";

/// Device section: capabilities of the graphics device variants are
/// compiled for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Whether the device uses a zero-to-one NDC depth range.
    pub depth_range_zero_to_one: bool,
    /// Preprocessor defines injected into every stage compile.
    pub specializations: Vec<(String, String)>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            depth_range_zero_to_one: true,
            specializations: Vec::new(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory searched first when resolving `#include` directives.
    pub defaults_dir: PathBuf,

    /// Extension appended to include names.
    pub include_extension: String,

    /// Backends every variant is compiled for.
    pub backends: Vec<GraphicsBackend>,

    /// Device capabilities.
    pub device: DeviceConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            defaults_dir: PathBuf::from("Defaults"),
            include_extension: ".glsl".to_string(),
            backends: GraphicsBackend::ALL.to_vec(),
            device: DeviceConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;
        Ok(config)
    }

    /// Load `glint.toml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        if !path.exists() {
            log::info!("{CONFIG_FILE_NAME} not found, using default configuration");
            return Ok(Self::default());
        }
        let config = Self::load_from(&path)?;
        log::info!("Loaded configuration from {path:?}");
        Ok(config)
    }

    pub fn device_caps(&self) -> DeviceCaps {
        DeviceCaps {
            depth_range_zero_to_one: self.device.depth_range_zero_to_one,
            specializations: self.device.specializations.clone(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0:?}: {1}")]
    ReadError(PathBuf, std::io::Error),

    #[error("failed to parse {0:?}: {1}")]
    ParseError(PathBuf, toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.defaults_dir, PathBuf::from("Defaults"));
        assert_eq!(config.include_extension, ".glsl");
        assert_eq!(config.backends.len(), 5);
        assert!(config.device.depth_range_zero_to_one);
    }

    #[test]
    fn test_partial_config() {
        let partial = r#"
            include_extension = ".glsli"

            [device]
            depth_range_zero_to_one = false
        "#;
        let config: ProjectConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.include_extension, ".glsli");
        assert!(!config.device.depth_range_zero_to_one);
        // Other fields keep their defaults
        assert_eq!(config.backends.len(), 5);
    }

    #[test]
    fn test_backend_list_roundtrip() {
        let source = r#"backends = ["vulkan", "metal"]"#;
        let config: ProjectConfig = toml::from_str(source).unwrap();
        assert_eq!(
            config.backends,
            vec![GraphicsBackend::Vulkan, GraphicsBackend::Metal]
        );

        let serialized = toml::to_string(&config).unwrap();
        let parsed: ProjectConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.backends, config.backends);
    }
}
