use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;

use super::{
    dependency::{InjectedModuleDependency, InjectedModuleTemplate},
    writer::ModuleWriter,
};
use crate::{
    bundler::{Compiler, Plugin, plugins::NormalModuleReplacementPlugin},
    synthesis::Synthesize,
};

const PLUGIN_NAME: &str = "GlobalizePlugin";

pub const DEFAULT_TARGET: &str = r"src(/|\\)index\.js";
pub const DEFAULT_REQUEST: &str = r"(^|[/\\])globalize$";
pub const DEFAULT_RUNTIME_REQUEST: &str = "globalize/dist/globalize-runtime";

/// Compiles formatters when the target module is built and injects a require
/// of the generated module at the top of it.
///
/// Also redirects requests for the full library to its runtime-only build,
/// since template compilation only happens here, at build time.
pub struct GlobalizePlugin {
    target: Regex,
    replacement: NormalModuleReplacementPlugin,
    synthesizer: Arc<dyn Synthesize>,
    writer: Arc<dyn ModuleWriter>,
    variable: Option<String>,
}

impl GlobalizePlugin {
    pub fn new(synthesizer: Arc<dyn Synthesize>, writer: Arc<dyn ModuleWriter>) -> Result<Self> {
        Ok(Self {
            target: Regex::new(DEFAULT_TARGET)?,
            replacement: NormalModuleReplacementPlugin::from_pattern(
                DEFAULT_REQUEST,
                DEFAULT_RUNTIME_REQUEST,
            )?,
            synthesizer,
            writer,
            variable: None,
        })
    }

    /// Resource pattern of the module that receives the generated formatters.
    pub fn with_target(mut self, target: Regex) -> Self {
        self.target = target;
        self
    }

    pub fn with_replacement(mut self, replacement: NormalModuleReplacementPlugin) -> Self {
        self.replacement = replacement;
        self
    }

    pub fn with_variable(mut self, variable: Option<String>) -> Self {
        self.variable = variable;
        self
    }
}

impl Plugin for GlobalizePlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        self.replacement.apply(compiler)?;

        let target = self.target.clone();
        let synthesizer = self.synthesizer.clone();
        let writer = self.writer.clone();
        let variable = self.variable.clone();

        compiler.hooks.compilation.tap(PLUGIN_NAME, move |compilation| {
            compilation
                .dependency_factories
                .set::<InjectedModuleDependency>(compilation.params.normal_module_factory.clone());
            compilation
                .dependency_templates
                .set::<InjectedModuleDependency>(Arc::new(InjectedModuleTemplate));

            let target = target.clone();
            let synthesizer = synthesizer.clone();
            let writer = writer.clone();
            let variable = variable.clone();
            compilation
                .hooks
                .succeed_module
                .tap(PLUGIN_NAME, move |module| {
                    if !target.is_match(&module.resource_str()) {
                        return Ok(());
                    }

                    let source = synthesizer
                        .synthesize()
                        .context("Failed to compile Globalize formatters")?;
                    let path = writer.write(&source)?;

                    let mut dep = InjectedModuleDependency::new(path.to_string_lossy());
                    if let Some(variable) = &variable {
                        dep = dep.with_variable(variable.clone());
                    }
                    module.add_dependency(Box::new(dep));
                    Ok(())
                });
            Ok(())
        });
        Ok(())
    }
}
