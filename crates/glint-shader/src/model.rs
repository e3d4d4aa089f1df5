//! Data model for parsed and compiled shaders
//!
//! Parsed types (`ParsedShader`, `ParsedPass`, `ParsedGlobalState`) are
//! transient: built once per import and discarded after the runtime
//! `Shader` is assembled. Compiled types (`BackendProgram`,
//! `CompiledStage`) are immutable once produced.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// GPU pipeline stage a source fragment belongs to.
///
/// Sources are tagged with their stage rather than identified by
/// position in a list, so reordering can never swap vertex and
/// fragment programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStageKind::Vertex => write!(f, "vertex"),
            ShaderStageKind::Fragment => write!(f, "fragment"),
        }
    }
}

/// One stage's source text, owned by the pass that declared it.
///
/// Mutable only during preprocessing and global-source injection;
/// treated as immutable once the pass is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderSource {
    pub stage: ShaderStageKind,
    pub source: String,
}

impl ShaderSource {
    pub fn new(stage: ShaderStageKind, source: impl Into<String>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

/// Target graphics API family requiring its own compiled shader form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsBackend {
    Vulkan,
    OpenGl,
    OpenGlEs,
    Direct3D11,
    Metal,
}

impl GraphicsBackend {
    /// All backends an import targets by default.
    pub const ALL: [GraphicsBackend; 5] = [
        GraphicsBackend::Vulkan,
        GraphicsBackend::OpenGl,
        GraphicsBackend::OpenGlEs,
        GraphicsBackend::Direct3D11,
        GraphicsBackend::Metal,
    ];

    /// OpenGL-family backends share NDC depth-range quirks that the
    /// cross-compiler has to reconcile.
    pub fn is_opengl_family(self) -> bool {
        matches!(self, GraphicsBackend::OpenGl | GraphicsBackend::OpenGlEs)
    }
}

impl fmt::Display for GraphicsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphicsBackend::Vulkan => "Vulkan",
            GraphicsBackend::OpenGl => "OpenGL",
            GraphicsBackend::OpenGlEs => "OpenGLES",
            GraphicsBackend::Direct3D11 => "Direct3D11",
            GraphicsBackend::Metal => "Metal",
        };
        write!(f, "{name}")
    }
}

/// Blend factor applied to source or destination color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blend equation operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Structured blend state for one pass. The same factors apply to the
/// color and alpha pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlendDescription {
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub op: BlendOp,
}

impl Default for BlendDescription {
    /// Opaque override blend: replace the destination outright.
    fn default() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::Zero,
            op: BlendOp::Add,
        }
    }
}

/// Face culling mode. `Cull Off` in source maps to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

/// Depth/stencil comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonKind {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Operation applied to a stencil-buffer value after a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StencilOp {
    #[default]
    Keep,
    Zero,
    Replace,
    Invert,
    IncrementClamp,
    DecrementClamp,
    IncrementWrap,
    DecrementWrap,
}

/// Stencil test state for one pass, applied to front and back faces
/// alike. Disabled unless the pass declares a `Stencil` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StencilDescription {
    pub enabled: bool,
    pub comparison: ComparisonKind,
    /// Applied when both stencil and depth tests pass.
    pub pass_op: StencilOp,
    /// Applied when the stencil test fails.
    pub fail_op: StencilOp,
    /// Applied when the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOp,
    pub reference: u32,
}

impl Default for StencilDescription {
    fn default() -> Self {
        Self {
            enabled: false,
            comparison: ComparisonKind::Always,
            pass_op: StencilOp::Keep,
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            reference: 0,
        }
    }
}

/// Depth/stencil state for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthDescription {
    pub test: ComparisonKind,
    pub write: bool,
    pub stencil: StencilDescription,
}

impl Default for DepthDescription {
    /// Depth-only less-equal with stencil off, the engine-wide default.
    fn default() -> Self {
        Self {
            test: ComparisonKind::LessEqual,
            write: true,
            stencil: StencilDescription::default(),
        }
    }
}

/// Mesh vertex attribute semantic consumed by a vertex stage.
///
/// Declaration order in the `Inputs` block is the attribute binding
/// order the vertex shader expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshSemantic {
    Position,
    Normal,
    Tangent,
    Color,
    UV0,
    UV1,
    BoneIndices,
    BoneWeights,
}

impl MeshSemantic {
    pub fn format(self) -> VertexFormat {
        match self {
            MeshSemantic::Position | MeshSemantic::Normal | MeshSemantic::Tangent => {
                VertexFormat::Float32x3
            }
            MeshSemantic::Color | MeshSemantic::BoneWeights => VertexFormat::Float32x4,
            MeshSemantic::UV0 | MeshSemantic::UV1 => VertexFormat::Float32x2,
            MeshSemantic::BoneIndices => VertexFormat::Uint32x4,
        }
    }
}

/// Attribute data format in a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32x4,
}

impl VertexFormat {
    /// Size of one attribute in bytes.
    pub fn size(self) -> u32 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 | VertexFormat::Uint32x4 => 16,
        }
    }
}

/// One entry of a variant's derived vertex-input layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexLayoutElement {
    pub semantic: MeshSemantic,
    /// Shader attribute location, assigned in declaration order.
    pub location: u32,
    pub format: VertexFormat,
    /// Byte offset within an interleaved vertex.
    pub offset: u32,
}

/// Named resource descriptor inside a binding group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderResource {
    Texture(String),
    Sampler(String),
    Buffer(String),
}

impl ShaderResource {
    pub fn name(&self) -> &str {
        match self {
            ShaderResource::Texture(name)
            | ShaderResource::Sampler(name)
            | ShaderResource::Buffer(name) => name,
        }
    }
}

/// One ordered binding group; group index is declaration order.
pub type ResourceGroup = Vec<ShaderResource>;

/// Type of an exposed material property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Color,
    Texture2D,
}

/// Default value of a material property, as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Number(f64),
    Vector(Vec<f64>),
    Text(String),
}

/// Exposed material property: name, editor label, type and default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub display_name: String,
    pub kind: PropertyKind,
    pub default: Option<PropertyValue>,
}

/// Shader-wide state: tags plus a source fragment injected into every
/// variant compile. At most one per shader file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedGlobalState {
    pub tags: BTreeMap<String, String>,
    pub source: Option<String>,
}

/// One parsed pass: fixed-function state, declared inputs/resources
/// and the two stage source fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPass {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub blend: BlendDescription,
    pub cull: CullMode,
    pub depth: DepthDescription,
    /// Independently togglable feature keywords, 2^k theoretical variants.
    pub keywords: Vec<String>,
    pub inputs: Vec<MeshSemantic>,
    pub resources: Vec<ResourceGroup>,
    pub sources: Vec<ShaderSource>,
}

impl ParsedPass {
    /// Source fragment for the given stage.
    pub fn source(&self, stage: ShaderStageKind) -> Option<&ShaderSource> {
        self.sources.iter().find(|s| s.stage == stage)
    }
}

/// Full parse result for one shader file.
///
/// Invariants (enforced by the parser): pass names unique, property
/// names unique, every pass has exactly one vertex and one fragment
/// source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedShader {
    pub name: String,
    pub properties: Vec<Property>,
    pub passes: Vec<ParsedPass>,
    pub global: Option<ParsedGlobalState>,
}

/// One backend-native compiled stage: bytecode for binary targets
/// (SPIR-V), UTF-8 source for textual ones (GLSL/HLSL/MSL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledStage {
    pub stage: ShaderStageKind,
    pub entry_point: String,
    pub bytes: Vec<u8>,
}

/// Vertex+fragment pair compiled for one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendProgram {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
}
