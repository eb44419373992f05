use std::{collections::BTreeMap, fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};

use super::{
    compilation::{Compilation, CompilationParams, ModuleSummary, ModuleWarning},
    factory::NormalModuleFactory,
    hooks::SyncHook,
    options::BuildOptions,
    resolver::Resolver,
    runtime::render_bundle,
};

/// An extension of the build. Plugins only ever talk to the compiler through
/// its hooks.
pub trait Plugin {
    fn name(&self) -> &'static str;

    fn apply(&self, compiler: &mut Compiler) -> Result<()>;
}

/// Files about to be written, keyed by name relative to the output path.
#[derive(Debug, Default)]
pub struct Assets {
    pub output_path: PathBuf,
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct CompilerHooks {
    pub normal_module_factory: SyncHook<NormalModuleFactory>,
    pub compilation: SyncHook<Compilation>,
    /// Before assets are written to disk.
    pub emit: SyncHook<Assets>,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildOutput {
    pub modules: Vec<ModuleSummary>,
    pub warnings: Vec<ModuleWarning>,
    pub assets: Vec<PathBuf>,
}

pub struct Compiler {
    pub options: Arc<BuildOptions>,
    pub hooks: CompilerHooks,
    plugin_names: Vec<&'static str>,
}

impl Compiler {
    /// Create a compiler and apply `plugins` in order.
    pub fn new(options: BuildOptions, plugins: Vec<Box<dyn Plugin>>) -> Result<Self> {
        let mut compiler = Self {
            options: Arc::new(options),
            hooks: CompilerHooks::default(),
            plugin_names: Vec::new(),
        };
        for plugin in plugins {
            plugin
                .apply(&mut compiler)
                .with_context(|| format!("Failed to apply plugin '{}'", plugin.name()))?;
            compiler.plugin_names.push(plugin.name());
        }
        Ok(compiler)
    }

    pub fn plugin_names(&self) -> &[&'static str] {
        &self.plugin_names
    }

    /// Build, render and emit the bundle.
    pub fn run(&self) -> Result<BuildOutput> {
        let compilation = self.compile()?;
        let modules = compilation.code_generation()?;

        let mut assets = Assets {
            output_path: self.options.output.path.clone(),
            files: BTreeMap::new(),
        };
        assets
            .files
            .insert(self.options.output.filename.clone(), render_bundle(&modules));

        self.hooks.emit.call(&mut assets)?;
        let written = emit_assets(&assets)?;

        Ok(BuildOutput {
            modules: compilation.module_summaries(),
            warnings: compilation.warnings,
            assets: written,
        })
    }

    /// Run the make phase only.
    pub fn compile(&self) -> Result<Compilation> {
        let resolver = Resolver::new(
            self.options.resolve.modules.clone(),
            self.options.resolve.extensions.clone(),
        );
        let mut factory = NormalModuleFactory::new(resolver);
        self.hooks.normal_module_factory.call(&mut factory)?;

        let params = CompilationParams {
            normal_module_factory: Arc::new(factory),
        };
        let mut compilation = Compilation::new(self.options.clone(), params);
        self.hooks.compilation.call(&mut compilation)?;

        compilation.build()?;
        Ok(compilation)
    }
}

fn emit_assets(assets: &Assets) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&assets.output_path).with_context(|| {
        format!(
            "Failed to create output directory {}",
            assets.output_path.display()
        )
    })?;

    let mut written = Vec::with_capacity(assets.files.len());
    for (name, content) in &assets.files {
        let path = assets.output_path.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write asset {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
