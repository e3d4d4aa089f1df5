//! glint-shader - shader definition language and model
//!
//! This crate provides:
//! - Include expansion and comment stripping for `.shader` text
//! - The shader definition language parser
//! - The parsed and runtime shader models with lazy variant caching

pub mod diagnostics;
pub mod keyword;
pub mod model;
pub mod parser;
pub mod preprocessor;
pub mod runtime;

pub use diagnostics::{Diagnostics, LogSink, RecordingSink, Severity};
pub use keyword::KeywordState;
pub use model::{
    BackendProgram, BlendDescription, BlendFactor, BlendOp, ComparisonKind, CompiledStage,
    CullMode, DepthDescription, GraphicsBackend, MeshSemantic, ParsedGlobalState, ParsedPass,
    ParsedShader, Property, PropertyKind, PropertyValue, ResourceGroup, ShaderResource,
    ShaderSource, ShaderStageKind, StencilDescription, StencilOp, VertexFormat,
    VertexLayoutElement,
};
pub use parser::{ShaderParseError, parse_shader};
pub use preprocessor::{Preprocessor, strip_comments};
pub use runtime::{PassDescription, Shader, ShaderPass, ShaderVariant, VariantCompiler};
