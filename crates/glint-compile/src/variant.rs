//! Per-pass variant compilation
//!
//! Invoked lazily by the runtime pass cache, at most once per distinct
//! keyword state. Assembles the final stage sources (version header,
//! optional shader-wide global fragment, pass source), cross-compiles
//! them once per target backend, and derives the vertex-input layout
//! from the pass's declared mesh semantics.

use std::sync::Arc;

use glint_shader::diagnostics::{Diagnostics, Severity};
use glint_shader::keyword::KeywordState;
use glint_shader::model::{
    GraphicsBackend, MeshSemantic, ResourceGroup, ShaderSource, ShaderStageKind,
    VertexLayoutElement,
};
use glint_shader::runtime::{ShaderVariant, VariantCompiler};

use crate::backend::{CrossCompileOptions, DeviceCaps};
use crate::cross::CrossCompiler;

/// Fixed shading-language version header prepended to every stage.
const VERSION_HEADER: &str = "#version 450\n";

/// Compiles variants for one pass of an imported shader.
pub struct PassVariantCompiler {
    inputs: Vec<MeshSemantic>,
    resources: Vec<ResourceGroup>,
    /// Shader-wide source fragment injected into both stages, once per
    /// compile call.
    global: Option<String>,
    device: DeviceCaps,
    backends: Vec<GraphicsBackend>,
    cross: Arc<dyn CrossCompiler>,
    sink: Arc<dyn Diagnostics>,
}

impl PassVariantCompiler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inputs: Vec<MeshSemantic>,
        resources: Vec<ResourceGroup>,
        global: Option<String>,
        device: DeviceCaps,
        backends: Vec<GraphicsBackend>,
        cross: Arc<dyn CrossCompiler>,
        sink: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            inputs,
            resources,
            global,
            device,
            backends,
            cross,
            sink,
        }
    }

    /// Version header, then the global fragment, then the pass source.
    /// Textual concatenation into one compilation unit.
    fn assemble(&self, stage_source: &str) -> String {
        let mut text = String::from(VERSION_HEADER);
        if let Some(global) = &self.global {
            text.push_str(global);
            text.push('\n');
        }
        text.push_str(stage_source);
        text
    }

    fn options_for(&self, backend: GraphicsBackend, keywords: &KeywordState) -> CrossCompileOptions {
        let mut defines = self.device.specializations.clone();
        defines.extend(keywords.iter().map(|k| (k.to_string(), "1".to_string())));
        CrossCompileOptions {
            fix_clip_space_z: backend.is_opengl_family() && !self.device.depth_range_zero_to_one,
            invert_vertex_output_y: false,
            defines,
        }
    }

    fn stage_source<'a>(&self, sources: &'a [ShaderSource], stage: ShaderStageKind) -> &'a str {
        match sources.iter().find(|s| s.stage == stage) {
            Some(source) => &source.source,
            None => {
                // The parser guarantees both stages; an empty source
                // will fail per backend and be reported there.
                self.sink.report(
                    Severity::Error,
                    &format!("variant compile invoked without a {stage} source"),
                );
                ""
            }
        }
    }
}

impl VariantCompiler for PassVariantCompiler {
    fn compile_variant(&self, sources: &[ShaderSource], keywords: &KeywordState) -> ShaderVariant {
        let vertex = self.assemble(self.stage_source(sources, ShaderStageKind::Vertex));
        let fragment = self.assemble(self.stage_source(sources, ShaderStageKind::Fragment));

        let mut variant = ShaderVariant {
            keywords: keywords.clone(),
            programs: Default::default(),
            vertex_layout: derive_vertex_layout(&self.inputs),
            resources: self.resources.clone(),
        };

        for &backend in &self.backends {
            let options = self.options_for(backend, keywords);
            match self.cross.compile(&vertex, &fragment, &options, backend) {
                Ok(program) => {
                    variant.programs.insert(backend, program);
                }
                // A failed backend leaves a gap; the remaining
                // backends still compile.
                Err(e) => self.sink.report(
                    Severity::Warning,
                    &format!("variant [{keywords}] dropped {backend}: {e}"),
                ),
            }
        }

        variant
    }
}

/// One layout entry per declared semantic, in declared order, with
/// locations and interleaved byte offsets assigned sequentially.
pub fn derive_vertex_layout(inputs: &[MeshSemantic]) -> Vec<VertexLayoutElement> {
    let mut offset = 0u32;
    inputs
        .iter()
        .enumerate()
        .map(|(index, &semantic)| {
            let format = semantic.format();
            let element = VertexLayoutElement {
                semantic,
                location: index as u32,
                format,
                offset,
            };
            offset += format.size();
            element
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_shader::diagnostics::RecordingSink;
    use glint_shader::model::{BackendProgram, CompiledStage, VertexFormat};
    use std::sync::Mutex;

    use crate::cross::CrossCompileError;

    /// Stub cross-compiler recording every invocation; fails for the
    /// configured backends.
    #[derive(Default)]
    struct StubCross {
        fail_backends: Vec<GraphicsBackend>,
        calls: Mutex<Vec<(String, String, CrossCompileOptions, GraphicsBackend)>>,
    }

    impl CrossCompiler for StubCross {
        fn compile(
            &self,
            vertex: &str,
            fragment: &str,
            options: &CrossCompileOptions,
            backend: GraphicsBackend,
        ) -> Result<BackendProgram, CrossCompileError> {
            self.calls.lock().unwrap().push((
                vertex.to_string(),
                fragment.to_string(),
                options.clone(),
                backend,
            ));
            if self.fail_backends.contains(&backend) {
                return Err(CrossCompileError::Backend {
                    backend,
                    stage: ShaderStageKind::Vertex,
                    message: "stub failure".into(),
                });
            }
            let stage = |stage| CompiledStage {
                stage,
                entry_point: "main".into(),
                bytes: vec![0u8; 4],
            };
            Ok(BackendProgram {
                vertex: stage(ShaderStageKind::Vertex),
                fragment: stage(ShaderStageKind::Fragment),
            })
        }
    }

    fn sources() -> Vec<ShaderSource> {
        vec![
            ShaderSource::new(ShaderStageKind::Vertex, "void main() { VERT }"),
            ShaderSource::new(ShaderStageKind::Fragment, "void main() { FRAG }"),
        ]
    }

    fn compiler(
        cross: Arc<StubCross>,
        sink: Arc<RecordingSink>,
        global: Option<String>,
        backends: Vec<GraphicsBackend>,
        device: DeviceCaps,
    ) -> PassVariantCompiler {
        PassVariantCompiler::new(
            vec![MeshSemantic::Position, MeshSemantic::Normal],
            vec![vec![]],
            global,
            device,
            backends,
            cross,
            sink,
        )
    }

    #[test]
    fn test_backend_failure_leaves_gap_without_aborting() {
        let cross = Arc::new(StubCross {
            fail_backends: vec![GraphicsBackend::Metal],
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::new());
        let compiler = compiler(
            cross,
            sink.clone(),
            None,
            vec![GraphicsBackend::Vulkan, GraphicsBackend::Metal],
            DeviceCaps::default(),
        );

        let variant = compiler.compile_variant(&sources(), &KeywordState::empty());

        assert!(variant.supports(GraphicsBackend::Vulkan));
        assert!(!variant.supports(GraphicsBackend::Metal));
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, Severity::Warning);
        assert!(entries[0].1.contains("Metal"));
    }

    #[test]
    fn test_global_fragment_injected_once_after_version_header() {
        let cross = Arc::new(StubCross::default());
        let sink = Arc::new(RecordingSink::new());
        let compiler = compiler(
            cross.clone(),
            sink,
            Some("uniform mat4 mvp;".to_string()),
            vec![GraphicsBackend::Vulkan, GraphicsBackend::OpenGl],
            DeviceCaps::default(),
        );

        compiler.compile_variant(&sources(), &KeywordState::empty());

        let calls = cross.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        for (vertex, fragment, _, _) in calls.iter() {
            assert!(vertex.starts_with("#version 450\nuniform mat4 mvp;\n"));
            assert!(fragment.starts_with("#version 450\nuniform mat4 mvp;\n"));
            assert_eq!(vertex.matches("uniform mat4 mvp;").count(), 1);
        }
    }

    #[test]
    fn test_clip_space_fix_only_for_opengl_family_on_non_zero_to_one_devices() {
        let cross = Arc::new(StubCross::default());
        let sink = Arc::new(RecordingSink::new());
        let device = DeviceCaps {
            depth_range_zero_to_one: false,
            specializations: Vec::new(),
        };
        let compiler = compiler(
            cross.clone(),
            sink,
            None,
            GraphicsBackend::ALL.to_vec(),
            device,
        );

        compiler.compile_variant(&sources(), &KeywordState::empty());

        let calls = cross.calls.lock().unwrap();
        for (_, _, options, backend) in calls.iter() {
            assert_eq!(options.fix_clip_space_z, backend.is_opengl_family());
            assert!(!options.invert_vertex_output_y);
        }
    }

    #[test]
    fn test_no_clip_space_fix_on_zero_to_one_devices() {
        let cross = Arc::new(StubCross::default());
        let sink = Arc::new(RecordingSink::new());
        let compiler = compiler(
            cross.clone(),
            sink,
            None,
            GraphicsBackend::ALL.to_vec(),
            DeviceCaps::default(),
        );

        compiler.compile_variant(&sources(), &KeywordState::empty());

        for (_, _, options, _) in cross.calls.lock().unwrap().iter() {
            assert!(!options.fix_clip_space_z);
        }
    }

    #[test]
    fn test_keywords_and_specializations_become_defines() {
        let cross = Arc::new(StubCross::default());
        let sink = Arc::new(RecordingSink::new());
        let device = DeviceCaps {
            depth_range_zero_to_one: true,
            specializations: vec![("MAX_LIGHTS".to_string(), "4".to_string())],
        };
        let compiler = compiler(
            cross.clone(),
            sink,
            None,
            vec![GraphicsBackend::Vulkan],
            device,
        );

        let keywords: KeywordState = ["FOG"].into_iter().collect();
        compiler.compile_variant(&sources(), &keywords);

        let calls = cross.calls.lock().unwrap();
        let defines = &calls[0].2.defines;
        assert!(defines.contains(&("MAX_LIGHTS".to_string(), "4".to_string())));
        assert!(defines.contains(&("FOG".to_string(), "1".to_string())));
    }

    #[test]
    fn test_vertex_layout_follows_declaration_order() {
        let layout = derive_vertex_layout(&[MeshSemantic::Position, MeshSemantic::Normal]);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout[0].semantic, MeshSemantic::Position);
        assert_eq!(layout[0].location, 0);
        assert_eq!(layout[0].offset, 0);
        assert_eq!(layout[1].semantic, MeshSemantic::Normal);
        assert_eq!(layout[1].location, 1);
        assert_eq!(layout[1].offset, 12);
    }

    #[test]
    fn test_vertex_layout_offsets_are_interleaved() {
        let layout = derive_vertex_layout(&[
            MeshSemantic::Position,
            MeshSemantic::UV0,
            MeshSemantic::BoneIndices,
        ]);
        assert_eq!(layout[1].format, VertexFormat::Float32x2);
        assert_eq!(layout[1].offset, 12);
        assert_eq!(layout[2].format, VertexFormat::Uint32x4);
        assert_eq!(layout[2].offset, 20);
    }

    #[test]
    fn test_resources_carried_through_unchanged() {
        use glint_shader::model::ShaderResource;
        let cross = Arc::new(StubCross::default());
        let sink = Arc::new(RecordingSink::new());
        let resources = vec![
            vec![ShaderResource::Buffer("ObjectUniforms".into())],
            vec![ShaderResource::Texture("_MainTex".into())],
        ];
        let compiler = PassVariantCompiler::new(
            Vec::new(),
            resources.clone(),
            None,
            DeviceCaps::default(),
            vec![GraphicsBackend::Vulkan],
            cross,
            sink,
        );

        let variant = compiler.compile_variant(&sources(), &KeywordState::empty());
        assert_eq!(variant.resources, resources);
    }
}
