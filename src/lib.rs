//! glint - shader definition import pipeline
//!
//! Wires the text pipeline (`glint-shader`) and the backend compilers
//! (`glint-compile`) into a file importer: project configuration, the
//! `.shader` importer, and the extension-dispatching registry.

pub mod config;
pub mod importer;
pub mod registry;

pub use config::{CONFIG_FILE_NAME, ConfigError, DeviceConfig, ProjectConfig};
pub use importer::{AssetImporter, ImportError, ShaderImporter};
pub use registry::ImporterRegistry;
