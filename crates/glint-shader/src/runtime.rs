//! Runtime shader model
//!
//! The immutable representation consumed by the renderer: a `Shader`
//! owns named properties and an ordered list of `ShaderPass`es; each
//! pass owns compiled `ShaderVariant`s keyed by keyword state and
//! populated lazily through a supplied compiler. Ownership is strictly
//! tree-shaped: Shader -> Pass -> Variant -> bytecode.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::keyword::KeywordState;
use crate::model::{
    BackendProgram, BlendDescription, CullMode, DepthDescription, GraphicsBackend, Property,
    ResourceGroup, ShaderSource, VertexLayoutElement,
};

/// Compiles one variant of a pass for a given keyword combination.
///
/// Implementations report per-backend failures through their own
/// diagnostics channel and leave the failing backend out of the
/// returned variant's program map; the signature itself is infallible.
pub trait VariantCompiler: Send + Sync {
    fn compile_variant(&self, sources: &[ShaderSource], keywords: &KeywordState) -> ShaderVariant;
}

/// One fully compiled instance of a pass for a specific keyword set.
/// Immutable once produced, safe for unsynchronized concurrent reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderVariant {
    pub keywords: KeywordState,
    /// Compiled vertex+fragment pair per backend. A backend whose
    /// cross-compilation failed is simply absent.
    pub programs: BTreeMap<GraphicsBackend, BackendProgram>,
    pub vertex_layout: Vec<VertexLayoutElement>,
    pub resources: Vec<ResourceGroup>,
}

impl ShaderVariant {
    pub fn program(&self, backend: GraphicsBackend) -> Option<&BackendProgram> {
        self.programs.get(&backend)
    }

    pub fn supports(&self, backend: GraphicsBackend) -> bool {
        self.programs.contains_key(&backend)
    }
}

/// Fixed-function state and metadata of a pass, shared by all its
/// variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassDescription {
    pub tags: BTreeMap<String, String>,
    pub blend: BlendDescription,
    pub cull: CullMode,
    pub depth: DepthDescription,
    /// Keywords this pass declares as togglable.
    pub keywords: Vec<String>,
}

/// One render pass of a runtime shader, owning its variant cache.
pub struct ShaderPass {
    name: String,
    description: PassDescription,
    sources: Vec<ShaderSource>,
    compiler: Box<dyn VariantCompiler>,
    /// Guarded across the whole compile so concurrent requesters for
    /// the same uncompiled keyword state block until the first caller
    /// finishes; at-most-once compilation per state.
    cache: Mutex<HashMap<KeywordState, Arc<ShaderVariant>>>,
}

impl ShaderPass {
    pub fn new(
        name: impl Into<String>,
        sources: Vec<ShaderSource>,
        description: PassDescription,
        compiler: Box<dyn VariantCompiler>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            sources,
            compiler,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &PassDescription {
        &self.description
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.description.tags.get(key).map(|v| v.as_str())
    }

    /// Sole runtime entry point: returns the cached variant for the
    /// keyword state, compiling it on first request.
    pub fn get_variant(&self, keywords: &KeywordState) -> Arc<ShaderVariant> {
        let mut cache = self.cache.lock().unwrap();
        if let Some(variant) = cache.get(keywords) {
            return variant.clone();
        }
        let variant = Arc::new(self.compiler.compile_variant(&self.sources, keywords));
        cache.insert(keywords.clone(), variant.clone());
        variant
    }

    /// Number of variants compiled so far. Bounded by the keyword
    /// combinations actually requested, not the theoretical power set.
    pub fn compiled_variant_count(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}

impl std::fmt::Debug for ShaderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderPass")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("compiled_variants", &self.compiled_variant_count())
            .finish()
    }
}

/// Top of the runtime model: name, material properties and passes.
#[derive(Debug)]
pub struct Shader {
    name: String,
    properties: Vec<Property>,
    passes: Vec<ShaderPass>,
}

impl Shader {
    pub fn new(name: impl Into<String>, properties: Vec<Property>, passes: Vec<ShaderPass>) -> Self {
        Self {
            name: name.into(),
            properties,
            passes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn passes(&self) -> &[ShaderPass] {
        &self.passes
    }

    pub fn pass(&self, name: &str) -> Option<&ShaderPass> {
        self.passes.iter().find(|p| p.name() == name)
    }

    pub fn pass_index(&self, name: &str) -> Option<usize> {
        self.passes.iter().position(|p| p.name() == name)
    }

    /// Passes whose tag map contains the given key/value pair, used by
    /// render pipelines to select passes for a stage.
    pub fn passes_with_tag<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> impl Iterator<Item = &'a ShaderPass> {
        self.passes
            .iter()
            .filter(move |p| p.tag(key) == Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShaderStageKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Call-counting stub compiler for cache behavior tests.
    struct CountingCompiler {
        calls: Arc<AtomicUsize>,
    }

    impl VariantCompiler for CountingCompiler {
        fn compile_variant(
            &self,
            _sources: &[ShaderSource],
            keywords: &KeywordState,
        ) -> ShaderVariant {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ShaderVariant {
                keywords: keywords.clone(),
                programs: BTreeMap::new(),
                vertex_layout: Vec::new(),
                resources: Vec::new(),
            }
        }
    }

    fn test_pass(calls: Arc<AtomicUsize>) -> ShaderPass {
        ShaderPass::new(
            "Main",
            vec![
                ShaderSource::new(ShaderStageKind::Vertex, "void main() {}"),
                ShaderSource::new(ShaderStageKind::Fragment, "void main() {}"),
            ],
            PassDescription::default(),
            Box::new(CountingCompiler { calls }),
        )
    }

    #[test]
    fn test_same_keyword_state_compiles_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pass = test_pass(calls.clone());

        let keywords: KeywordState = ["FOG"].into_iter().collect();
        let first = pass.get_variant(&keywords);
        let second = pass.get_variant(&keywords);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_keyword_order_returns_same_variant_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pass = test_pass(calls.clone());

        let k1: KeywordState = ["FOG", "SHADOWS"].into_iter().collect();
        let k2: KeywordState = ["SHADOWS", "FOG"].into_iter().collect();

        let v1 = pass.get_variant(&k1);
        let v2 = pass.get_variant(&k2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&v1, &v2));
    }

    #[test]
    fn test_concurrent_requesters_block_on_first_compile() {
        use std::time::Duration;

        /// Slow compiler so concurrent requests overlap the compile
        /// window instead of racing past it.
        struct SlowCompiler {
            calls: Arc<AtomicUsize>,
        }

        impl VariantCompiler for SlowCompiler {
            fn compile_variant(
                &self,
                _sources: &[ShaderSource],
                keywords: &KeywordState,
            ) -> ShaderVariant {
                self.calls.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
                ShaderVariant {
                    keywords: keywords.clone(),
                    programs: BTreeMap::new(),
                    vertex_layout: Vec::new(),
                    resources: Vec::new(),
                }
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let pass = Arc::new(ShaderPass::new(
            "Main",
            Vec::new(),
            PassDescription::default(),
            Box::new(SlowCompiler {
                calls: calls.clone(),
            }),
        ));

        let keywords: KeywordState = ["FOG"].into_iter().collect();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pass = pass.clone();
                let keywords = keywords.clone();
                std::thread::spawn(move || pass.get_variant(&keywords))
            })
            .collect();
        let variants: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pass.compiled_variant_count(), 1);
        for variant in &variants[1..] {
            assert!(Arc::ptr_eq(&variants[0], variant));
        }
    }

    #[test]
    fn test_distinct_keyword_states_compile_separately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pass = test_pass(calls.clone());

        pass.get_variant(&KeywordState::empty());
        pass.get_variant(&["FOG"].into_iter().collect());
        pass.get_variant(&["FOG", "SHADOWS"].into_iter().collect());

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(pass.compiled_variant_count(), 3);
    }

    #[test]
    fn test_pass_lookup_by_name_and_tag() {
        let make_pass = |name: &str, tags: &[(&str, &str)]| {
            let description = PassDescription {
                tags: tags
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            };
            ShaderPass::new(
                name,
                Vec::new(),
                description,
                Box::new(CountingCompiler {
                    calls: Arc::new(AtomicUsize::new(0)),
                }),
            )
        };

        let shader = Shader::new(
            "Test",
            Vec::new(),
            vec![
                make_pass("Shadow", &[("LightMode", "ShadowCaster")]),
                make_pass("Forward", &[("LightMode", "Opaque")]),
            ],
        );

        assert_eq!(shader.pass_index("Forward"), Some(1));
        assert!(shader.pass("Missing").is_none());
        let selected: Vec<_> = shader
            .passes_with_tag("LightMode", "Opaque")
            .map(|p| p.name())
            .collect();
        assert_eq!(selected, vec!["Forward"]);
    }
}
