//! glint-compile - backend cross-compilation for shader variants
//!
//! This crate provides:
//! - Device capability and cross-compile option types
//! - The `CrossCompiler` seam with a naga-backed implementation
//! - The per-pass `PassVariantCompiler` used by the runtime cache

pub mod backend;
pub mod cross;
pub mod variant;

pub use backend::{CrossCompileOptions, DeviceCaps};
pub use cross::{CrossCompileError, CrossCompiler, NagaCompiler};
pub use variant::{PassVariantCompiler, derive_vertex_layout};
