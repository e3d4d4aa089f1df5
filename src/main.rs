use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use glint::{ImporterRegistry, ProjectConfig, ShaderImporter};
use glint_compile::NagaCompiler;
use glint_shader::diagnostics::LogSink;
use glint_shader::keyword::KeywordState;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        bail!("usage: glint <file.shader> [keyword...]");
    }
    let path = PathBuf::from(&args[0]);
    let keywords: KeywordState = args[1..].iter().cloned().collect();

    let config = ProjectConfig::load()?;

    let mut registry = ImporterRegistry::new();
    registry.register(Arc::new(ShaderImporter::from_config(
        &config,
        Arc::new(NagaCompiler::new()),
        Arc::new(LogSink),
    )));

    let shader = registry
        .import(&path)
        .with_context(|| format!("importing {path:?}"))?;

    println!("Shader \"{}\"", shader.name());
    if !shader.properties().is_empty() {
        println!("  {} properties", shader.properties().len());
    }

    for pass in shader.passes() {
        let variant = pass.get_variant(&keywords);
        println!("  Pass \"{}\" [{}]", pass.name(), variant.keywords);
        for (backend, program) in &variant.programs {
            println!(
                "    {backend}: vertex {} bytes, fragment {} bytes",
                program.vertex.bytes.len(),
                program.fragment.bytes.len()
            );
        }
        for element in &variant.vertex_layout {
            println!(
                "    input {:?} @ location {} offset {}",
                element.semantic, element.location, element.offset
            );
        }
    }

    Ok(())
}
