//! Cross-compiler seam and naga-backed implementation
//!
//! The pipeline never translates shader IR itself; it prepares inputs
//! for a `CrossCompiler` and consumes its outputs. `NagaCompiler` is
//! the production implementation: GLSL 450 front-end, validation, then
//! one backend-native writer per target.

use thiserror::Error;

use glint_shader::model::{BackendProgram, CompiledStage, GraphicsBackend, ShaderStageKind};

use crate::backend::CrossCompileOptions;

#[derive(Debug, Error)]
pub enum CrossCompileError {
    #[error("{stage} stage failed to parse: {message}")]
    Frontend {
        stage: ShaderStageKind,
        message: String,
    },

    #[error("{stage} stage failed validation: {message}")]
    Validation {
        stage: ShaderStageKind,
        message: String,
    },

    #[error("{backend} rejected {stage} stage: {message}")]
    Backend {
        backend: GraphicsBackend,
        stage: ShaderStageKind,
        message: String,
    },
}

/// Translates one vertex+fragment source pair into a backend-native
/// program.
pub trait CrossCompiler: Send + Sync {
    fn compile(
        &self,
        vertex: &str,
        fragment: &str,
        options: &CrossCompileOptions,
        backend: GraphicsBackend,
    ) -> Result<BackendProgram, CrossCompileError>;
}

/// Cross-compiler built on naga writers.
///
/// Outputs per backend: SPIR-V words for Vulkan, GLSL 330 for OpenGL,
/// GLSL ES 300 for OpenGLES, HLSL for Direct3D11, MSL for Metal.
/// Textual outputs are stored as UTF-8 bytes.
#[derive(Debug, Default)]
pub struct NagaCompiler;

impl NagaCompiler {
    pub fn new() -> Self {
        Self
    }

    fn compile_stage(
        &self,
        source: &str,
        stage: ShaderStageKind,
        options: &CrossCompileOptions,
        backend: GraphicsBackend,
    ) -> Result<CompiledStage, CrossCompileError> {
        let naga_stage = match stage {
            ShaderStageKind::Vertex => naga::ShaderStage::Vertex,
            ShaderStageKind::Fragment => naga::ShaderStage::Fragment,
        };

        let mut defines = naga::FastHashMap::default();
        for (key, value) in &options.defines {
            defines.insert(key.clone(), value.clone());
        }

        let mut frontend = naga::front::glsl::Frontend::default();
        let module = frontend
            .parse(
                &naga::front::glsl::Options {
                    stage: naga_stage,
                    defines,
                },
                source,
            )
            .map_err(|e| CrossCompileError::Frontend {
                stage,
                message: e.emit_to_string(source),
            })?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        let info = validator
            .validate(&module)
            .map_err(|e| CrossCompileError::Validation {
                stage,
                message: e.emit_to_string(source),
            })?;

        let bytes = match backend {
            GraphicsBackend::Vulkan => write_spirv(&module, &info, naga_stage, backend, stage)?,
            GraphicsBackend::OpenGl | GraphicsBackend::OpenGlEs => {
                write_glsl(&module, &info, naga_stage, backend, stage, options)?
            }
            GraphicsBackend::Direct3D11 => write_hlsl(&module, &info, backend, stage)?,
            GraphicsBackend::Metal => write_msl(&module, &info, backend, stage)?,
        };

        Ok(CompiledStage {
            stage,
            entry_point: "main".to_string(),
            bytes,
        })
    }
}

impl CrossCompiler for NagaCompiler {
    fn compile(
        &self,
        vertex: &str,
        fragment: &str,
        options: &CrossCompileOptions,
        backend: GraphicsBackend,
    ) -> Result<BackendProgram, CrossCompileError> {
        let vertex = self.compile_stage(vertex, ShaderStageKind::Vertex, options, backend)?;
        let fragment = self.compile_stage(fragment, ShaderStageKind::Fragment, options, backend)?;
        Ok(BackendProgram { vertex, fragment })
    }
}

fn write_spirv(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
    naga_stage: naga::ShaderStage,
    backend: GraphicsBackend,
    stage: ShaderStageKind,
) -> Result<Vec<u8>, CrossCompileError> {
    let pipeline_options = naga::back::spv::PipelineOptions {
        shader_stage: naga_stage,
        entry_point: "main".to_string(),
    };
    let words = naga::back::spv::write_vec(
        module,
        info,
        &naga::back::spv::Options::default(),
        Some(&pipeline_options),
    )
    .map_err(|e| CrossCompileError::Backend {
        backend,
        stage,
        message: e.to_string(),
    })?;
    Ok(words.iter().flat_map(|w| w.to_le_bytes()).collect())
}

fn write_glsl(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
    naga_stage: naga::ShaderStage,
    backend: GraphicsBackend,
    stage: ShaderStageKind,
    options: &CrossCompileOptions,
) -> Result<Vec<u8>, CrossCompileError> {
    let version = match backend {
        GraphicsBackend::OpenGl => naga::back::glsl::Version::Desktop(330),
        _ => naga::back::glsl::Version::Embedded {
            version: 300,
            is_webgl: false,
        },
    };

    let mut writer_flags = naga::back::glsl::WriterFlags::empty();
    if options.fix_clip_space_z {
        writer_flags |= naga::back::glsl::WriterFlags::ADJUST_COORDINATE_SPACE;
    }

    let glsl_options = naga::back::glsl::Options {
        version,
        writer_flags,
        ..Default::default()
    };
    let pipeline_options = naga::back::glsl::PipelineOptions {
        shader_stage: naga_stage,
        entry_point: "main".to_string(),
        multiview: None,
    };

    let mut output = String::new();
    let map_err = |e: naga::back::glsl::Error| CrossCompileError::Backend {
        backend,
        stage,
        message: e.to_string(),
    };
    let mut writer = naga::back::glsl::Writer::new(
        &mut output,
        module,
        info,
        &glsl_options,
        &pipeline_options,
        naga::proc::BoundsCheckPolicies::default(),
    )
    .map_err(map_err)?;
    writer.write().map_err(map_err)?;
    Ok(output.into_bytes())
}

fn write_hlsl(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
    backend: GraphicsBackend,
    stage: ShaderStageKind,
) -> Result<Vec<u8>, CrossCompileError> {
    let mut output = String::new();
    let hlsl_options = naga::back::hlsl::Options::default();
    let pipeline_options = naga::back::hlsl::PipelineOptions::default();
    let mut writer = naga::back::hlsl::Writer::new(&mut output, &hlsl_options, &pipeline_options);
    writer
        .write(module, info, None)
        .map_err(|e| CrossCompileError::Backend {
            backend,
            stage,
            message: e.to_string(),
        })?;
    Ok(output.into_bytes())
}

fn write_msl(
    module: &naga::Module,
    info: &naga::valid::ModuleInfo,
    backend: GraphicsBackend,
    stage: ShaderStageKind,
) -> Result<Vec<u8>, CrossCompileError> {
    let (output, _) = naga::back::msl::write_string(
        module,
        info,
        &naga::back::msl::Options::default(),
        &naga::back::msl::PipelineOptions::default(),
    )
    .map_err(|e| CrossCompileError::Backend {
        backend,
        stage,
        message: e.to_string(),
    })?;
    Ok(output.into_bytes())
}
