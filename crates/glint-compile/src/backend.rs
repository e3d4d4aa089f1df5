//! Device capabilities and per-backend cross-compile options

use serde::{Deserialize, Serialize};

/// Capability set of the active graphics device, queried once at
/// startup by the embedding application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCaps {
    /// Whether the device natively uses a zero-to-one NDC depth range.
    /// OpenGL-family backends on devices that do not need a clip-space
    /// Z adjustment during cross-compilation.
    pub depth_range_zero_to_one: bool,
    /// Device-specific preprocessor specializations injected into every
    /// stage compile, e.g. feature level defines.
    pub specializations: Vec<(String, String)>,
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self {
            depth_range_zero_to_one: true,
            specializations: Vec::new(),
        }
    }
}

/// Options for one cross-compile invocation, built per backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossCompileOptions {
    /// Reconcile differing NDC depth conventions for OpenGL-family
    /// targets.
    pub fix_clip_space_z: bool,
    /// Mesh data and projections already account for origin
    /// convention, so this stays off.
    pub invert_vertex_output_y: bool,
    /// Preprocessor defines: device specializations plus the active
    /// variant keywords.
    pub defines: Vec<(String, String)>,
}
